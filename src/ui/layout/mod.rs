//! Layout management system

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Below this width the sidebar moves under the ring view
const COMPACT_WIDTH: u16 = 80;

/// Computed layout rects for all panels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedLayout {
    pub header: Rect,
    pub footer: Rect,
    pub ring_view: Rect,
    pub system_panel: Rect,
    pub disk_panel: Rect,
    pub snapshot_panel: Option<Rect>,
    pub overlay_area: Rect,
}

pub struct LayoutManager;

impl LayoutManager {
    /// Compute all panel rects for the terminal area
    pub fn compute(area: Rect) -> ComputedLayout {
        if area.width < COMPACT_WIDTH {
            Self::compact_layout(area)
        } else {
            Self::standard_layout(area)
        }
    }

    fn frame(area: Rect) -> (Rect, Rect, Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(10),   // Body
                Constraint::Length(1), // Footer
            ])
            .split(area);
        (chunks[0], chunks[1], chunks[2])
    }

    fn standard_layout(area: Rect) -> ComputedLayout {
        let (header, body, footer) = Self::frame(area);

        // Body: ring view | sidebar
        let body_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
            .split(body);

        let sidebar = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(7), // System metrics
                Constraint::Min(6),    // Volumes
                Constraint::Length(8), // Snapshots
            ])
            .split(body_chunks[1]);

        ComputedLayout {
            header,
            footer,
            ring_view: body_chunks[0],
            system_panel: sidebar[0],
            disk_panel: sidebar[1],
            snapshot_panel: Some(sidebar[2]),
            overlay_area: Self::centered_rect(60, 70, area),
        }
    }

    fn compact_layout(area: Rect) -> ComputedLayout {
        let (header, body, footer) = Self::frame(area);

        let body_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(8),
                Constraint::Length(7),
                Constraint::Length(6),
            ])
            .split(body);

        ComputedLayout {
            header,
            footer,
            ring_view: body_chunks[0],
            system_panel: body_chunks[1],
            disk_panel: body_chunks[2],
            snapshot_panel: None,
            overlay_area: Self::centered_rect(80, 80, area),
        }
    }

    /// Create a centered rect with given percentage width/height
    pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(area);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}
