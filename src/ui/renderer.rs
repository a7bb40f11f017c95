//! Main UI renderer

use ratatui::{
    layout::Rect,
    style::Style,
    text::Span,
    widgets::{Block, Paragraph},
    Frame,
};

use crate::core::state::{AppMode, AppState, NotificationLevel};
use crate::ui::layout::LayoutManager;
use crate::ui::widgets::*;
use crate::viz::raster::FrameBuffer;

pub struct Renderer;

impl Renderer {
    pub fn render(frame: &mut Frame, state: &AppState, scene: &FrameBuffer) {
        let area = frame.area();
        let theme = &state.theme;

        // Clear background
        frame.render_widget(
            Block::default().style(Style::default().bg(theme.colors.bg_primary)),
            area,
        );

        let layout = LayoutManager::compute(area);

        frame.render_widget(Header::new(state, theme), layout.header);
        frame.render_widget(Footer::new(state, theme), layout.footer);

        frame.render_widget(RingView::new(scene, theme), layout.ring_view);
        frame.render_widget(MetricsPanel::new(state, theme), layout.system_panel);
        frame.render_widget(DiskPanel::new(state, theme), layout.disk_panel);
        if let Some(snapshot_area) = layout.snapshot_panel {
            frame.render_widget(SnapshotPanel::new(state, theme), snapshot_area);
        }

        if state.mode == AppMode::Help {
            frame.render_widget(HelpOverlay::new(theme), layout.overlay_area);
        }

        Self::render_notifications(frame, state);
    }

    fn render_notifications(frame: &mut Frame, state: &AppState) {
        let theme = &state.theme;
        let area = frame.area();

        // Show notifications in top-right corner
        let mut y = 2;
        for notification in state.notifications.iter().rev().take(3) {
            if y >= area.height {
                break;
            }
            let (icon, style) = match notification.level {
                NotificationLevel::Info => ("ℹ", theme.styles.notification_info),
                NotificationLevel::Success => ("✓", theme.styles.notification_success),
                NotificationLevel::Warning => ("⚠", theme.styles.notification_warning),
                NotificationLevel::Error => ("✗", theme.styles.notification_error),
            };

            let msg = format!(" {} {} ", icon, notification.message);
            let width = (msg.chars().count() as u16).min(48).min(area.width);
            let x = area.width.saturating_sub(width + 2);

            frame.render_widget(
                Paragraph::new(Span::styled(msg, style))
                    .style(Style::default().bg(theme.colors.bg_tertiary)),
                Rect {
                    x,
                    y,
                    width,
                    height: 1,
                },
            );

            y += 2;
        }
    }
}
