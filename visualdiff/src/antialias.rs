//! Anti-aliased pixel detection.
//!
//! Based on the "Anti-aliased Pixel and Intensity Slope Detector" paper by
//! V. Vysniauskas, 2009: a pixel is likely anti-aliasing when it sits on a
//! brightness slope (has both darker and brighter neighbors) and the
//! extreme neighbors belong to a flat region in both images.

use imgref::ImgRef;
use rgb::RGBA8;

use crate::delta::color_delta;
use crate::raster::px;

pub(crate) fn is_antialiased(
    img1: ImgRef<'_, RGBA8>,
    x: usize,
    y: usize,
    img2: ImgRef<'_, RGBA8>,
) -> bool {
    let width = img1.width();
    let height = img1.height();

    let x0 = x.saturating_sub(1);
    let y0 = y.saturating_sub(1);
    let x1 = (x + 1).min(width - 1);
    let y1 = (y + 1).min(height - 1);

    // border pixels have one neighbor fewer
    let mut zeroes: u8 = u8::from(x == 0 || y == 0 || x == width - 1 || y == height - 1);

    let mut min = 0.0f64;
    let mut max = 0.0f64;
    let mut min_pos = (0, 0);
    let mut max_pos = (0, 0);

    let center = px(img1, x, y);

    for ay in y0..=y1 {
        for ax in x0..=x1 {
            if ax == x && ay == y {
                continue;
            }

            // brightness delta between the center pixel and this neighbor
            let delta = color_delta(center, px(img1, ax, ay), true);

            if delta == 0.0 {
                zeroes += 1;
                // more than two equal siblings rules out anti-aliasing
                if zeroes > 2 {
                    return false;
                }
            } else if delta < min {
                min = delta;
                min_pos = (ax, ay);
            } else if delta > max {
                max = delta;
                max_pos = (ax, ay);
            }
        }
    }

    // a slope needs neighbors on both sides of the center brightness
    if min == 0.0 || max == 0.0 {
        return false;
    }

    // the darkest or brightest neighbor must sit in a flat region of both
    // images for the center to count as anti-aliasing
    (has_many_siblings(img1, min_pos.0, min_pos.1) && has_many_siblings(img2, min_pos.0, min_pos.1))
        || (has_many_siblings(img1, max_pos.0, max_pos.1)
            && has_many_siblings(img2, max_pos.0, max_pos.1))
}

/// True when the pixel has 3+ adjacent pixels of exactly its color.
fn has_many_siblings(img: ImgRef<'_, RGBA8>, x: usize, y: usize) -> bool {
    let width = img.width();
    let height = img.height();

    let x0 = x.saturating_sub(1);
    let y0 = y.saturating_sub(1);
    let x1 = (x + 1).min(width - 1);
    let y1 = (y + 1).min(height - 1);

    let mut zeroes: u8 = u8::from(x == 0 || y == 0 || x == width - 1 || y == height - 1);

    let center = px(img, x, y);

    for ay in y0..=y1 {
        for ax in x0..=x1 {
            if ax == x && ay == y {
                continue;
            }
            if center == px(img, ax, ay) {
                zeroes += 1;
            }
            if zeroes > 2 {
                return true;
            }
        }
    }

    false
}
