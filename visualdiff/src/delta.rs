//! Perceptual color distance in YIQ space.
//!
//! Implements the metric from "Measuring perceived color difference using
//! YIQ NTSC transmission color space in mobile applications" by
//! Y. Kotsarenko and F. Ramos, the distance used by the pixelmatch family
//! of screenshot-diffing tools.

use rgb::RGBA8;

/// Maximum possible squared YIQ distance between two 8-bit colors.
pub(crate) const MAX_YIQ_DELTA: f64 = 35215.0;

/// Squared YIQ distance between two pixels.
///
/// Semi-transparent pixels are blended against a white background before
/// comparison. The sign encodes direction: negative when the second pixel
/// is darker than the first. With `y_only` set, only the brightness
/// component is returned (used by the anti-aliasing detector).
pub(crate) fn color_delta(p1: RGBA8, p2: RGBA8, y_only: bool) -> f64 {
    if p1 == p2 {
        return 0.0;
    }

    let (r1, g1, b1) = blended(p1);
    let (r2, g2, b2) = blended(p2);

    let y1 = rgb2y(r1, g1, b1);
    let y2 = rgb2y(r2, g2, b2);
    let y = y1 - y2;

    if y_only {
        return y;
    }

    let i = rgb2i(r1, g1, b1) - rgb2i(r2, g2, b2);
    let q = rgb2q(r1, g1, b1) - rgb2q(r2, g2, b2);

    let delta = 0.5053 * y * y + 0.299 * i * i + 0.1957 * q * q;

    // sign marks whether the pixel darkened or lightened
    if y1 > y2 {
        -delta
    } else {
        delta
    }
}

fn blended(p: RGBA8) -> (f64, f64, f64) {
    let r = f64::from(p.r);
    let g = f64::from(p.g);
    let b = f64::from(p.b);
    if p.a == 255 {
        return (r, g, b);
    }
    let a = f64::from(p.a) / 255.0;
    (blend(r, a), blend(g, a), blend(b, a))
}

/// Blends a channel with a white background at the given opacity.
pub(crate) fn blend(c: f64, a: f64) -> f64 {
    255.0 + (c - 255.0) * a
}

pub(crate) fn rgb2y(r: f64, g: f64, b: f64) -> f64 {
    r * 0.29889531 + g * 0.58662247 + b * 0.11448223
}

fn rgb2i(r: f64, g: f64, b: f64) -> f64 {
    r * 0.59597799 - g * 0.27417610 - b * 0.32180189
}

fn rgb2q(r: f64, g: f64, b: f64) -> f64 {
    r * 0.21147017 - g * 0.52261711 + b * 0.31114694
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_pixels_have_zero_delta() {
        let p = RGBA8::new(12, 200, 77, 255);
        assert_eq!(color_delta(p, p, false), 0.0);
        assert_eq!(color_delta(p, p, true), 0.0);
    }

    #[test]
    fn black_vs_white_is_near_maximum() {
        let black = RGBA8::new(0, 0, 0, 255);
        let white = RGBA8::new(255, 255, 255, 255);
        let delta = color_delta(black, white, false);
        assert!(delta > 30_000.0, "got {delta}");
        assert!(delta <= MAX_YIQ_DELTA);
    }

    #[test]
    fn sign_encodes_lightening_direction() {
        let dark = RGBA8::new(10, 10, 10, 255);
        let light = RGBA8::new(240, 240, 240, 255);
        // second pixel brighter: positive; second pixel darker: negative
        assert!(color_delta(dark, light, false) > 0.0);
        assert!(color_delta(light, dark, false) < 0.0);
    }

    #[test]
    fn transparent_pixels_blend_to_white() {
        let clear = RGBA8::new(0, 0, 0, 0);
        let white = RGBA8::new(255, 255, 255, 255);
        assert_eq!(color_delta(clear, white, false), 0.0);
    }

    #[test]
    fn y_only_returns_brightness_difference() {
        let black = RGBA8::new(0, 0, 0, 255);
        let white = RGBA8::new(255, 255, 255, 255);
        let y = color_delta(black, white, true);
        assert!((y + 255.0).abs() < 1e-6, "got {y}");
    }
}
