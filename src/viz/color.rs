//! Percentage-driven ring colors

use palette::{LinSrgb, Mix, Srgb};

/// Working color type for the scene. Stored gamma-encoded, blended in linear space.
pub type Color = Srgb<f32>;

/// Cyclic base hues, one per volume index.
pub const BASE_PALETTE: [Srgb<u8>; 5] = [
    Srgb::new(0x29, 0xf3, 0xc3),
    Srgb::new(0x6a, 0xa9, 0xff),
    Srgb::new(0xff, 0x78, 0x4f),
    Srgb::new(0xf8, 0xd6, 0x6d),
    Srgb::new(0x8a, 0x7d, 0xff),
];

/// Color a ring converges to at full utilization.
pub const HOT: Srgb<u8> = Srgb::new(0xff, 0x3b, 0x3b);

/// Neutral color of the full-circle track behind each usage arc.
pub const TRACK: Srgb<u8> = Srgb::new(0x1b, 0x24, 0x36);

/// Accent color of the thin rail under each track.
pub const RAIL: Srgb<u8> = Srgb::new(0x0f, 0x16, 0x26);

/// Clamp a utilization reading into `[0, 100]`. NaN counts as idle.
pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

/// Convert one of the 8-bit constants into the scene color type.
pub fn rgb(color: Srgb<u8>) -> Color {
    color.into_format()
}

/// Blend the palette hue for `palette_index` towards [`HOT`] by `percent`.
///
/// 0% yields the palette color, 100% yields the hot color. Out of range input is clamped.
pub fn color_for(percent: f64, palette_index: usize) -> Color {
    let base = rgb(BASE_PALETTE[palette_index % BASE_PALETTE.len()]);
    let weight = (clamp_percent(percent) / 100.0) as f32;

    let base: LinSrgb = base.into_linear();
    let hot: LinSrgb = rgb(HOT).into_linear();
    Srgb::from_linear(base.mix(hot, weight))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_u8(color: Color) -> Srgb<u8> {
        color.into_format()
    }

    #[test]
    fn zero_percent_is_palette_color() {
        for index in 0..12 {
            assert_eq!(
                to_u8(color_for(0.0, index)),
                BASE_PALETTE[index % BASE_PALETTE.len()]
            );
        }
    }

    #[test]
    fn full_percent_is_hot_color() {
        for index in 0..12 {
            assert_eq!(to_u8(color_for(100.0, index)), HOT);
        }
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        assert_eq!(to_u8(color_for(-25.0, 1)), BASE_PALETTE[1]);
        assert_eq!(to_u8(color_for(250.0, 1)), HOT);
        assert_eq!(to_u8(color_for(f64::NAN, 3)), BASE_PALETTE[3]);
        assert_eq!(to_u8(color_for(f64::INFINITY, 3)), HOT);
    }

    fn assert_near(actual: Color, expected: (u8, u8, u8)) {
        let actual = to_u8(actual);
        let channels = [
            (actual.red, expected.0),
            (actual.green, expected.1),
            (actual.blue, expected.2),
        ];
        for (got, want) in channels {
            assert!(got.abs_diff(want) <= 1, "{actual:?} vs {expected:?}");
        }
    }

    #[test]
    fn blends_in_linear_light() {
        // #29f3c3 towards #ff3b3b, mixed after decoding the sRGB transfer curve
        assert_near(color_for(50.0, 0), (189, 182, 148));
        assert_near(color_for(25.0, 0), (141, 216, 173));
        assert_near(color_for(50.0, 5), (189, 182, 148));
        assert_near(color_for(50.0, 1), (199, 129, 191));
    }

    #[test]
    fn midpoint_lies_between_endpoints() {
        let mid = color_for(50.0, 1);
        let base = rgb(BASE_PALETTE[1]);
        let hot = rgb(HOT);

        for (m, (b, h)) in [mid.red, mid.green, mid.blue]
            .into_iter()
            .zip([base.red, base.green, base.blue].into_iter().zip([hot.red, hot.green, hot.blue]))
        {
            assert!(m >= b.min(h) - 1e-4 && m <= b.max(h) + 1e-4);
        }
        assert_ne!(to_u8(mid), BASE_PALETTE[1]);
        assert_ne!(to_u8(mid), HOT);
    }
}
