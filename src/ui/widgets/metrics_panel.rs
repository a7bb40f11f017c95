//! System metrics panel

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::core::state::AppState;
use crate::integrations::api::MemoryUsage;
use crate::integrations::format_bytes;
use crate::ui::theme::Theme;

const BAR_WIDTH: usize = 12;

pub struct MetricsPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> MetricsPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn usage_line(&self, label: &str, usage: &MemoryUsage, text: Style) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("{label} "), text),
            Span::styled(bar(usage.percent), self.theme.styles.gauge),
            Span::styled(
                format!(
                    " {:>5.1}%  {} / {}",
                    usage.percent,
                    format_bytes(usage.used),
                    format_bytes(usage.total)
                ),
                text,
            ),
        ])
    }
}

/// Block bar for a percentage, clamped to the bar width
pub(crate) fn bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(filled) + &"░".repeat(BAR_WIDTH - filled)
}

fn sparkline(history: impl DoubleEndedIterator<Item = f32>, width: usize) -> String {
    const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    let mut recent: Vec<char> = history
        .rev()
        .take(width)
        .map(|v| BARS[((v.clamp(0.0, 100.0) * 7.0 / 100.0) as usize).min(7)])
        .collect();
    recent.reverse();
    recent.into_iter().collect()
}

impl<'a> Widget for MetricsPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(Span::styled(" SYSTEM ", self.theme.styles.panel_title))
            .borders(Borders::ALL)
            .border_style(self.theme.styles.panel_border)
            .style(Style::default().bg(self.theme.colors.bg_primary));

        let inner = block.inner(area);
        block.render(area, buf);

        let Some(report) = &self.state.report else {
            if inner.height >= 1 {
                buf.set_span(
                    inner.x,
                    inner.y,
                    &Span::styled("Waiting for data…", self.theme.styles.muted),
                    inner.width,
                );
            }
            return;
        };
        let text = Style::default().fg(self.theme.colors.fg_secondary);

        // CPU line with sparkline
        if inner.height >= 1 {
            let label = format!("CPU {:>5.1}% ", report.cpu_percent);
            buf.set_span(inner.x, inner.y, &Span::styled(&label, text), inner.width);

            let spark_width = inner.width.saturating_sub(label.chars().count() as u16) as usize;
            if spark_width > 0 {
                let line = sparkline(self.state.cpu_history.iter().copied(), spark_width);
                buf.set_span(
                    inner.x + label.chars().count() as u16,
                    inner.y,
                    &Span::styled(line, self.theme.styles.sparkline),
                    spark_width as u16,
                );
            }
        }

        if inner.height >= 3 {
            let mem = self.usage_line("MEM ", &report.memory, text);
            buf.set_line(inner.x, inner.y + 2, &mem, inner.width);
        }

        if inner.height >= 4 {
            let swap = self.usage_line("SWAP", &report.swap, text);
            buf.set_line(inner.x, inner.y + 3, &swap, inner.width);
        }

        if inner.height >= 5 {
            if let Some(boot) = report
                .boot_time
                .and_then(|t| chrono::DateTime::from_timestamp(t, 0))
            {
                let boot = boot.with_timezone(&chrono::Local);
                let line = format!("Up since {}", boot.format("%Y-%m-%d %H:%M"));
                buf.set_span(
                    inner.x,
                    inner.y + 4,
                    &Span::styled(line, self.theme.styles.muted),
                    inner.width,
                );
            }
        }
    }
}
