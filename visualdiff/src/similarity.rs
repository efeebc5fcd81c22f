//! RMS-based similarity ratio.
//!
//! A coarse global metric for the test paths that want a normalized score
//! instead of a pixel count: it quantifies aggregate difference magnitude
//! but does not localize where the images diverge.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

/// Normalized similarity between two images, in `[0.0, 1.0]`.
///
/// When dimensions differ, the second image is resized to the first's
/// dimensions with Lanczos3 before comparing — a deliberate approximation
/// that compares resized content, not original pixels. Both images are
/// reduced to RGB; a histogram of per-channel absolute differences is
/// built and its root mean square, normalized over width × height × 3
/// samples, is mapped to `1 - rms / 255`.
///
/// `1.0` means pixel-identical after any resize; lower values mean greater
/// divergence.
pub fn similarity_ratio(a: &DynamicImage, b: &DynamicImage) -> f64 {
    let a_rgb = a.to_rgb8();
    let (width, height) = a_rgb.dimensions();

    let b_rgb = if b.width() == width && b.height() == height {
        b.to_rgb8()
    } else {
        b.resize_exact(width, height, FilterType::Lanczos3).to_rgb8()
    };

    let samples = u64::from(width) * u64::from(height) * 3;
    if samples == 0 {
        return 1.0;
    }

    // histogram of per-channel absolute differences
    let mut histogram = [0u64; 256];
    for (pa, pb) in a_rgb.pixels().zip(b_rgb.pixels()) {
        for c in 0..3 {
            let d = i16::from(pa[c]) - i16::from(pb[c]);
            histogram[usize::from(d.unsigned_abs())] += 1;
        }
    }

    let sum_squares: f64 = histogram
        .iter()
        .enumerate()
        .map(|(value, &count)| (value * value) as f64 * count as f64)
        .sum();
    let rms = (sum_squares / samples as f64).sqrt();

    (1.0 - rms / 255.0).clamp(0.0, 1.0)
}
