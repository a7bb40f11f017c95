//! Header widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::core::state::{AppState, RefreshStatus};
use crate::ui::theme::Theme;

pub struct Header<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn status_span(&self) -> Span<'static> {
        let styles = &self.theme.styles;
        let (icon, style) = match &self.state.status {
            RefreshStatus::Live => ("●", styles.status_live),
            RefreshStatus::Refreshing | RefreshStatus::SavingSnapshot => ("◌", styles.status_busy),
            RefreshStatus::Error(_) => ("✗", styles.status_error),
            RefreshStatus::Idle => ("○", styles.muted),
        };
        Span::styled(format!("{icon} {}", self.state.status), style)
    }
}

impl<'a> Widget for Header<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, self.theme.styles.header);
        let separator = || Span::styled(" │ ", Style::default().fg(self.theme.colors.fg_muted));

        let mut spans = vec![Span::styled(
            " ◎ VISUALDISK",
            Style::default()
                .fg(self.theme.colors.accent_primary)
                .add_modifier(Modifier::BOLD),
        )];

        match &self.state.report {
            Some(report) => {
                spans.push(separator());
                spans.push(Span::styled(
                    report.hostname.clone(),
                    Style::default().fg(self.theme.colors.fg_primary),
                ));
                spans.push(separator());
                spans.push(Span::styled(
                    report.platform.clone(),
                    Style::default().fg(self.theme.colors.fg_secondary),
                ));
            }
            None => {
                spans.push(separator());
                spans.push(Span::styled("Loading…", self.theme.styles.muted));
            }
        }
        spans.push(separator());
        spans.push(Span::styled(
            self.state.source_label.clone(),
            Style::default().fg(self.theme.colors.info),
        ));

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);

        // Right side: last update, auto flag, status
        let mut right = Vec::new();
        if let Some(updated) = self.state.report.as_ref().and_then(|r| r.updated_at()) {
            right.push(Span::styled(
                format!("updated {} ", updated.format("%H:%M:%S")),
                self.theme.styles.muted,
            ));
        }
        if self.state.auto_refresh {
            right.push(Span::styled("[auto] ", self.theme.styles.keybind_key));
        }
        right.push(self.status_span());
        right.push(Span::raw(" "));

        let right = Line::from(right);
        let width = (right.width() as u16).min(area.width);
        let x = area.x + area.width.saturating_sub(width);
        buf.set_line(x, area.y, &right, width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{sample_report, test_state};

    fn rendered(state: &AppState) -> String {
        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);
        Header::new(state, &state.theme).render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn shows_host_and_status() {
        let mut state = test_state();
        state.apply_report(sample_report(10.0));
        state.auto_refresh = true;

        let line = rendered(&state);
        assert!(line.contains("atlas"));
        assert!(line.contains("Linux"));
        assert!(line.contains("[auto]"));
        assert!(line.contains("live"));
    }

    #[test]
    fn shows_error_text() {
        let mut state = test_state();
        state.status = RefreshStatus::Error("backend unreachable".to_string());
        assert!(rendered(&state).contains("backend unreachable"));
    }
}
