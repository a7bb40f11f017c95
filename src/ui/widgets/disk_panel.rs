//! Volume list, one line per ring

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::core::state::AppState;
use crate::integrations::format_bytes;
use crate::ui::theme::Theme;
use crate::ui::widgets::metrics_panel::bar;
use crate::ui::widgets::ring_view::to_tui;
use crate::viz::color::color_for;

pub struct DiskPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> DiskPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for DiskPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let disks = self
            .state
            .report
            .as_ref()
            .map(|r| r.disks.as_slice())
            .unwrap_or_default();

        let block = Block::default()
            .title(Span::styled(
                format!(" VOLUMES ({}) ", disks.len()),
                self.theme.styles.panel_title,
            ))
            .borders(Borders::ALL)
            .border_style(self.theme.styles.panel_border)
            .style(Style::default().bg(self.theme.colors.bg_primary));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 {
            return;
        }

        if disks.is_empty() {
            buf.set_span(
                inner.x,
                inner.y,
                &Span::styled("No volumes found.", self.theme.styles.muted),
                inner.width,
            );
            return;
        }

        let rows_per_disk = if inner.height as usize >= disks.len() * 2 { 2 } else { 1 };
        for (index, disk) in disks.iter().enumerate() {
            let y = inner.y + (index * rows_per_disk) as u16;
            if y >= inner.y + inner.height {
                break;
            }

            let swatch = Style::default().fg(to_tui(color_for(disk.percent, index)));
            let line = Line::from(vec![
                Span::styled("■ ", swatch),
                Span::styled(format!("{:<14} ", disk.mountpoint), self.theme.styles.list_item),
                Span::styled(bar(disk.percent), swatch),
                Span::styled(format!(" {:>5.1}%", disk.percent), self.theme.styles.list_item),
            ]);
            buf.set_line(inner.x, y, &line, inner.width);

            if rows_per_disk == 2 {
                let detail = format!(
                    "  {} · {} · {} / {}",
                    disk.filesystem_type,
                    disk.device,
                    format_bytes(disk.used_bytes),
                    format_bytes(disk.total_bytes)
                );
                buf.set_span(
                    inner.x,
                    y + 1,
                    &Span::styled(detail, self.theme.styles.muted),
                    inner.width,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{sample_report, test_state};
    use crate::viz::rings::reading;

    fn render(state: &AppState, height: u16) -> String {
        let area = Rect::new(0, 0, 60, height);
        let mut buf = Buffer::empty(area);
        DiskPanel::new(state, &state.theme).render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn empty_report_says_so() {
        let mut state = test_state();
        state.apply_report(sample_report(5.0));
        assert!(render(&state, 6).contains("No volumes found."));
    }

    #[test]
    fn lists_each_volume() {
        let mut state = test_state();
        let mut report = sample_report(5.0);
        report.disks = vec![reading(20.0), reading(80.0)];
        report.disks[1].mountpoint = "/data".to_string();
        state.apply_report(report);

        let text = render(&state, 8);
        assert!(text.contains("VOLUMES (2)"));
        assert!(text.contains("/data"));
        assert!(text.contains("80.0%"));
        assert!(text.contains("ext4"));
    }
}
