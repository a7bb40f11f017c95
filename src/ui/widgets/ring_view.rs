//! Ring scene widget
//!
//! Paints the scene framebuffer with braille dots. Each terminal cell covers a 2×4 block of
//! framebuffer pixels, so the viewport handed to the scene is the inner area scaled by that.

use palette::Srgb;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::{
        canvas::{Canvas, Points},
        Block, Borders, Widget,
    },
};
use std::collections::BTreeMap;

use crate::ui::theme::Theme;
use crate::viz::color;
use crate::viz::raster::FrameBuffer;

const DOTS_X: u32 = 2;
const DOTS_Y: u32 = 4;

/// Scene color to terminal color
pub fn to_tui(color: color::Color) -> Color {
    let rgb: Srgb<u8> = color.into_format();
    Color::Rgb(rgb.red, rgb.green, rgb.blue)
}

pub struct RingView<'a> {
    framebuffer: &'a FrameBuffer,
    theme: &'a Theme,
}

impl<'a> RingView<'a> {
    pub fn new(framebuffer: &'a FrameBuffer, theme: &'a Theme) -> Self {
        Self { framebuffer, theme }
    }

    fn block(theme: &Theme) -> Block<'static> {
        Block::default()
            .title(Span::styled(" VOLUME RINGS ", theme.styles.panel_title))
            .borders(Borders::ALL)
            .border_style(theme.styles.panel_border)
            .style(Style::default().bg(theme.colors.scene_bg))
    }

    /// Framebuffer size in pixels for a widget drawn into `area`.
    pub fn viewport_for(area: Rect) -> (u32, u32) {
        let inner = Block::default().borders(Borders::ALL).inner(area);
        (inner.width as u32 * DOTS_X, inner.height as u32 * DOTS_Y)
    }

    /// Pixels grouped by color, in canvas coordinates (y up). Groups come out in a fixed
    /// color order so shared braille cells always end up with the same color.
    fn point_groups(&self) -> Vec<(Color, Vec<(f64, f64)>)> {
        let height = self.framebuffer.height();
        let mut groups: BTreeMap<(u8, u8, u8), Vec<(f64, f64)>> = BTreeMap::new();

        for (x, y, pixel) in self.framebuffer.iter() {
            let rgb: Srgb<u8> = pixel.into_format();
            groups
                .entry((rgb.red, rgb.green, rgb.blue))
                .or_default()
                .push((x as f64, (height - 1 - y) as f64));
        }

        groups
            .into_iter()
            .map(|((r, g, b), points)| (Color::Rgb(r, g, b), points))
            .collect()
    }
}

impl<'a> Widget for RingView<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Self::block(self.theme);
        if self.framebuffer.is_empty() {
            block.render(area, buf);
            return;
        }

        let groups = self.point_groups();
        let width = self.framebuffer.width().saturating_sub(1).max(1) as f64;
        let height = self.framebuffer.height().saturating_sub(1).max(1) as f64;

        Canvas::default()
            .block(block)
            .marker(Marker::Braille)
            .background_color(self.theme.colors.scene_bg)
            .x_bounds([0.0, width])
            .y_bounds([0.0, height])
            .paint(|ctx| {
                for (color, coords) in &groups {
                    ctx.draw(&Points {
                        coords,
                        color: *color,
                    });
                }
            })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::LinSrgb;

    #[test]
    fn viewport_is_inner_area_in_dots() {
        assert_eq!(RingView::viewport_for(Rect::new(0, 0, 42, 22)), (80, 80));
        assert_eq!(RingView::viewport_for(Rect::new(0, 0, 1, 1)), (0, 0));
    }

    #[test]
    fn converts_scene_colors() {
        let hot = color::rgb(color::HOT);
        assert_eq!(to_tui(hot), Color::Rgb(0xff, 0x3b, 0x3b));
    }

    #[test]
    fn shared_cells_resolve_to_the_same_color() {
        let area = Rect::new(0, 0, 6, 4);
        let (w, h) = RingView::viewport_for(area);
        let mut framebuffer = FrameBuffer::new(w, h);
        // Two dots of different colors inside the first braille cell
        framebuffer.plot(0, 0, 0.5, LinSrgb::new(0.0, 0.0, 1.0));
        framebuffer.plot(1, 0, 0.5, LinSrgb::new(1.0, 0.0, 0.0));

        let theme = Theme::default();
        let draw = || {
            let mut buf = Buffer::empty(area);
            RingView::new(&framebuffer, &theme).render(area, &mut buf);
            buf[(1, 1)].fg
        };

        let first = draw();
        assert_eq!(first, Color::Rgb(255, 0, 0));
        for _ in 0..10 {
            assert_eq!(draw(), first);
        }
    }

    #[test]
    fn paints_covered_pixels_as_braille() {
        let area = Rect::new(0, 0, 12, 6);
        let (w, h) = RingView::viewport_for(area);
        let mut framebuffer = FrameBuffer::new(w, h);
        framebuffer.plot(0, 0, 0.5, LinSrgb::new(1.0, 0.0, 0.0));
        framebuffer.plot(w - 1, h - 1, 0.5, LinSrgb::new(0.0, 1.0, 0.0));

        let theme = Theme::default();
        let mut buf = Buffer::empty(area);
        RingView::new(&framebuffer, &theme).render(area, &mut buf);

        let top_left = buf[(1, 1)].clone();
        let bottom_right = buf[(10, 4)].clone();
        assert_ne!(top_left.symbol(), " ");
        assert_ne!(bottom_right.symbol(), " ");
        assert_eq!(top_left.fg, Color::Rgb(255, 0, 0));
        assert_eq!(bottom_right.fg, Color::Rgb(0, 255, 0));
    }
}
