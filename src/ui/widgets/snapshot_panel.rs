//! Recent snapshots

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::core::state::AppState;
use crate::ui::theme::Theme;

pub struct SnapshotPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> SnapshotPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for SnapshotPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(Span::styled(" SNAPSHOTS ", self.theme.styles.panel_title))
            .borders(Borders::ALL)
            .border_style(self.theme.styles.panel_border)
            .style(Style::default().bg(self.theme.colors.bg_primary));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 {
            return;
        }

        if self.state.snapshots.is_empty() {
            buf.set_span(
                inner.x,
                inner.y,
                &Span::styled("No snapshots saved.", self.theme.styles.muted),
                inner.width,
            );
            return;
        }

        for (row, snapshot) in self
            .state
            .snapshots
            .iter()
            .take(inner.height as usize)
            .enumerate()
        {
            let when = snapshot
                .created_local()
                .map(|t| t.format("%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| snapshot.created_at.clone());

            let line = Line::from(vec![
                Span::styled(format!("#{:<4} ", snapshot.id), self.theme.styles.keybind_key),
                Span::styled(format!("{when}  "), self.theme.styles.muted),
                Span::styled(
                    format!(
                        "CPU {:>5.1}%  RAM {:>5.1}%",
                        snapshot.cpu_percent, snapshot.memory.percent
                    ),
                    self.theme.styles.list_item,
                ),
            ]);
            buf.set_line(inner.x, inner.y + row as u16, &line, inner.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::test_state;
    use crate::integrations::api::{MemoryUsage, SnapshotSummary};

    fn render(state: &AppState) -> String {
        let area = Rect::new(0, 0, 60, 6);
        let mut buf = Buffer::empty(area);
        SnapshotPanel::new(state, &state.theme).render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn empty_history_says_so() {
        assert!(render(&test_state()).contains("No snapshots saved."));
    }

    #[test]
    fn lists_snapshots() {
        let mut state = test_state();
        state.snapshots = vec![SnapshotSummary {
            id: 17,
            created_at: "2024-03-01T12:00:00".to_string(),
            hostname: None,
            cpu_percent: 33.3,
            memory: MemoryUsage {
                percent: 61.0,
                ..MemoryUsage::default()
            },
        }];

        let text = render(&state);
        assert!(text.contains("#17"));
        assert!(text.contains("33.3%"));
        assert!(text.contains("61.0%"));
    }
}
