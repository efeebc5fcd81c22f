//! Flat-color highlight rendering.
//!
//! A byte-for-byte visual aid for the similarity path: positions whose
//! summed RGB difference exceeds a fixed threshold are painted a flat
//! highlight color on an otherwise blank canvas. Not used for pass/fail
//! decisions.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

use crate::VisualDiffError;

/// Painted at positions whose difference exceeds [`HIGHLIGHT_THRESHOLD`].
pub const HIGHLIGHT_COLOR: Rgba<u8> = Rgba([255, 0, 255, 255]);

/// Minimum summed per-channel RGB difference before a position is painted.
pub const HIGHLIGHT_THRESHOLD: u32 = 30;

/// Blank canvas with differing positions painted [`HIGHLIGHT_COLOR`].
///
/// The canvas takes the first image's dimensions; the second image is
/// resized to fit before differencing, matching the similarity path it
/// accompanies.
pub fn highlight_mask(a: &DynamicImage, b: &DynamicImage) -> RgbaImage {
    let a_rgb = a.to_rgb8();
    let (width, height) = a_rgb.dimensions();

    let b_rgb = if b.width() == width && b.height() == height {
        b.to_rgb8()
    } else {
        b.resize_exact(width, height, FilterType::Lanczos3).to_rgb8()
    };

    let mut mask = RgbaImage::new(width, height);
    for (x, y, pa) in a_rgb.enumerate_pixels() {
        let pb = b_rgb.get_pixel(x, y);
        let total: u32 = (0..3).map(|c| u32::from(pa[c].abs_diff(pb[c]))).sum();
        if total > HIGHLIGHT_THRESHOLD {
            mask.put_pixel(x, y, HIGHLIGHT_COLOR);
        }
    }
    mask
}

/// Renders the highlight mask and persists it, returning the output path.
///
/// # Errors
/// Returns [`VisualDiffError::Encode`] when the destination extension maps
/// to no known format or the encoder fails.
pub fn render_highlight(
    a: &DynamicImage,
    b: &DynamicImage,
    out: &Path,
) -> Result<PathBuf, VisualDiffError> {
    let format = image::ImageFormat::from_path(out).map_err(|source| VisualDiffError::Encode {
        path: out.to_path_buf(),
        source,
    })?;

    highlight_mask(a, b)
        .save_with_format(out, format)
        .map_err(|source| VisualDiffError::Encode {
            path: out.to_path_buf(),
            source,
        })?;

    Ok(out.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn differing_patch_is_painted_and_rest_untouched() {
        let a = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 20, Rgb([100, 100, 100])));

        let mut modified = RgbImage::from_pixel(20, 20, Rgb([100, 100, 100]));
        // 50-pixel patch, well past the threshold
        for y in 0..5 {
            for x in 0..10 {
                modified.put_pixel(x, y, Rgb([200, 200, 200]));
            }
        }
        let b = DynamicImage::ImageRgb8(modified);

        let mask = highlight_mask(&a, &b);
        let painted = mask.pixels().filter(|&&p| p == HIGHLIGHT_COLOR).count();
        let blank = mask.pixels().filter(|&&p| p == Rgba([0, 0, 0, 0])).count();
        assert_eq!(painted, 50);
        assert_eq!(blank, 400 - 50);
    }

    #[test]
    fn sub_threshold_difference_is_left_blank() {
        let a = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([100, 100, 100])));
        let b = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([105, 105, 105])));
        // summed difference of 15 stays under the threshold
        let mask = highlight_mask(&a, &b);
        assert!(mask.pixels().all(|&p| p == Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn mask_takes_first_image_dimensions() {
        let a = DynamicImage::ImageRgb8(RgbImage::from_pixel(30, 10, Rgb([0, 0, 0])));
        let b = DynamicImage::ImageRgb8(RgbImage::from_pixel(7, 7, Rgb([0, 0, 0])));
        let mask = highlight_mask(&a, &b);
        assert_eq!(mask.dimensions(), (30, 10));
    }
}
