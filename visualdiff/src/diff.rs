//! The pixel-matching pass.
//!
//! This is the pixelmatch algorithm: every pixel position is classified as
//! matching or mismatching by its YIQ color distance, mismatches are
//! painted into a diff canvas, and the total count is returned. Dimension
//! validation happens in the public entry points; this module assumes
//! same-sized inputs.

use imgref::{Img, ImgRef, ImgVec};
use rgb::RGBA8;

use crate::antialias::is_antialiased;
use crate::delta::{blend, color_delta, rgb2y, MAX_YIQ_DELTA};
use crate::raster::{px, rows_equal};
use crate::DiffParams;

/// Internal result of the matching pass.
pub(crate) struct PassOutput {
    pub mismatched: u64,
    pub canvas: Option<ImgVec<RGBA8>>,
}

pub(crate) fn match_pass(
    a: ImgRef<'_, RGBA8>,
    b: ImgRef<'_, RGBA8>,
    params: &DiffParams,
    render: bool,
) -> PassOutput {
    let width = a.width();
    let height = a.height();

    let mut canvas = if render {
        Some(vec![RGBA8::new(0, 0, 0, 0); width * height])
    } else {
        None
    };

    // fast path: byte-identical inputs need no per-pixel classification
    if rows_equal(a, b) {
        if let Some(buf) = canvas.as_mut() {
            if !params.diff_mask() {
                for y in 0..height {
                    for x in 0..width {
                        buf[y * width + x] = gray_pixel(px(a, x, y), params.alpha());
                    }
                }
            }
        }
        return PassOutput {
            mismatched: 0,
            canvas: canvas.map(|buf| Img::new(buf, width, height)),
        };
    }

    let max_delta = MAX_YIQ_DELTA * params.threshold() * params.threshold();
    let mut mismatched = 0u64;

    for y in 0..height {
        for x in 0..width {
            let delta = color_delta(px(a, x, y), px(b, x, y), false);

            if delta.abs() > max_delta {
                if !params.include_aa()
                    && (is_antialiased(a, x, y, b) || is_antialiased(b, x, y, a))
                {
                    // anti-aliasing artifact: painted in its own color but
                    // not counted, and left out of a plain mask
                    if let Some(buf) = canvas.as_mut() {
                        if !params.diff_mask() {
                            buf[y * width + x] = params.aa_color();
                        }
                    }
                } else {
                    mismatched += 1;
                    if let Some(buf) = canvas.as_mut() {
                        let color = if delta < 0.0 {
                            params.diff_color_alt().unwrap_or(params.diff_color())
                        } else {
                            params.diff_color()
                        };
                        buf[y * width + x] = color;
                    }
                }
            } else if let Some(buf) = canvas.as_mut() {
                if !params.diff_mask() {
                    buf[y * width + x] = gray_pixel(px(a, x, y), params.alpha());
                }
            }
        }
    }

    PassOutput {
        mismatched,
        canvas: canvas.map(|buf| Img::new(buf, width, height)),
    }
}

/// Faded grayscale rendition of a source pixel, the background of overlay
/// renderings.
fn gray_pixel(p: RGBA8, alpha: f64) -> RGBA8 {
    let y = rgb2y(f64::from(p.r), f64::from(p.g), f64::from(p.b));
    let v = blend(y, alpha * f64::from(p.a) / 255.0) as u8;
    RGBA8::new(v, v, v, 255)
}
