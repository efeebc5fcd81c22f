//! # visualdiff
//!
//! Pixel-level comparison of screenshots for visual regression testing.
//!
//! Two independent metrics are exposed, used by different callers with
//! entirely different tolerance policies:
//!
//! - [`pixel_diff`] / [`compare`]: a pixelmatch-style matching pass that
//!   classifies every pixel position by perceptual YIQ color distance,
//!   paints mismatches into a diff canvas, and returns the mismatch count.
//!   Anti-aliased edge pixels are counted by default.
//! - [`similarity_ratio`]: a coarse RMS metric producing a normalized
//!   `[0, 1]` score, `1.0` meaning identical. [`render_highlight`] renders
//!   its diagnostic companion mask.
//!
//! Callers own the tolerance policy: the library reports numbers and
//! writes artifacts, it never decides pass/fail.
//!
//! ## Example
//!
//! ```rust
//! use visualdiff::{pixel_diff, DiffParams, Img, RGBA8};
//!
//! let width = 8;
//! let height = 8;
//! let pixels = vec![RGBA8::new(40, 40, 40, 255); width * height];
//! let img = Img::new(pixels, width, height);
//!
//! let result = pixel_diff(img.as_ref(), img.as_ref(), &DiffParams::default()).unwrap();
//! assert_eq!(result.mismatched, 0);
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]

mod antialias;
mod delta;
mod diff;
mod io;
mod raster;
mod render;
mod similarity;

use std::path::{Path, PathBuf};

pub use io::{load_rgba, save_rgba, ImageSource};
pub use raster::rgba_from_dynamic;
pub use render::{highlight_mask, render_highlight, HIGHLIGHT_COLOR, HIGHLIGHT_THRESHOLD};
pub use similarity::similarity_ratio;

// Re-export the pixel types used by the core API.
pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb::RGBA8;

/// Error type for visualdiff operations.
#[derive(Debug)]
#[non_exhaustive]
pub enum VisualDiffError {
    /// A source image could not be read or decoded.
    Decode {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying decoder error.
        source: image::ImageError,
    },
    /// An artifact could not be encoded or written.
    Encode {
        /// Destination path.
        path: PathBuf,
        /// Underlying encoder error.
        source: image::ImageError,
    },
    /// Bitmap dimensions don't allow a pixel-by-pixel comparison.
    DimensionMismatch {
        /// First image width.
        w1: usize,
        /// First image height.
        h1: usize,
        /// Second image width.
        w2: usize,
        /// Second image height.
        h2: usize,
    },
}

impl std::fmt::Display for VisualDiffError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode { path, source } => {
                write!(f, "failed to decode '{}': {source}", path.display())
            }
            Self::Encode { path, source } => {
                write!(f, "failed to write '{}': {source}", path.display())
            }
            Self::DimensionMismatch { w1, h1, w2, h2 } => {
                write!(f, "image dimensions don't match: {w1}x{h1} vs {w2}x{h2}")
            }
        }
    }
}

impl std::error::Error for VisualDiffError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode { source, .. } | Self::Encode { source, .. } => Some(source),
            Self::DimensionMismatch { .. } => None,
        }
    }
}

/// Matching-pass parameters.
///
/// Use the builder pattern to construct:
/// ```rust
/// use visualdiff::DiffParams;
///
/// let params = DiffParams::new()
///     .with_threshold(0.05)      // more sensitive color distance
///     .with_include_aa(false)    // exclude anti-aliased pixels
///     .with_render_diff(true);   // materialize the diff canvas in memory
/// ```
#[derive(Debug, Clone)]
pub struct DiffParams {
    threshold: f64,
    include_aa: bool,
    alpha: f64,
    aa_color: RGBA8,
    diff_color: RGBA8,
    diff_color_alt: Option<RGBA8>,
    diff_mask: bool,
    render_diff: bool,
}

impl Default for DiffParams {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            include_aa: true,
            alpha: 0.1,
            aa_color: RGBA8::new(255, 255, 0, 255),
            diff_color: RGBA8::new(255, 0, 0, 255),
            diff_color_alt: None,
            diff_mask: true,
            render_diff: false,
        }
    }
}

impl DiffParams {
    /// Creates a new `DiffParams` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the color-distance threshold (0 to 1); smaller is more
    /// sensitive.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets whether anti-aliased pixels count as mismatches.
    ///
    /// Defaults to `true`: softened edge pixels are included in the
    /// mismatch accounting. With `false`, detected anti-aliasing is
    /// painted in [`Self::aa_color`] and excluded from the count.
    #[must_use]
    pub fn with_include_aa(mut self, include_aa: bool) -> Self {
        self.include_aa = include_aa;
        self
    }

    /// Sets the opacity of the source image in overlay renderings.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the color for detected anti-aliased pixels.
    #[must_use]
    pub fn with_aa_color(mut self, aa_color: RGBA8) -> Self {
        self.aa_color = aa_color;
        self
    }

    /// Sets the marker color for mismatched pixels.
    #[must_use]
    pub fn with_diff_color(mut self, diff_color: RGBA8) -> Self {
        self.diff_color = diff_color;
        self
    }

    /// Sets an alternate marker for pixels that darkened rather than
    /// lightened.
    #[must_use]
    pub fn with_diff_color_alt(mut self, diff_color_alt: Option<RGBA8>) -> Self {
        self.diff_color_alt = diff_color_alt;
        self
    }

    /// Sets whether the canvas is a plain transparent mask (`true`,
    /// default) or an overlay over a grayed copy of the first image.
    #[must_use]
    pub fn with_diff_mask(mut self, diff_mask: bool) -> Self {
        self.diff_mask = diff_mask;
        self
    }

    /// Sets whether [`pixel_diff`] materializes the diff canvas.
    ///
    /// Defaults to `false`, which is faster when only the count matters.
    /// File-level comparison via [`compare`] always renders.
    #[must_use]
    pub fn with_render_diff(mut self, render_diff: bool) -> Self {
        self.render_diff = render_diff;
        self
    }

    /// Returns the color-distance threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns whether anti-aliased pixels count as mismatches.
    #[must_use]
    pub fn include_aa(&self) -> bool {
        self.include_aa
    }

    /// Returns the overlay background opacity.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Returns the anti-aliasing marker color.
    #[must_use]
    pub fn aa_color(&self) -> RGBA8 {
        self.aa_color
    }

    /// Returns the mismatch marker color.
    #[must_use]
    pub fn diff_color(&self) -> RGBA8 {
        self.diff_color
    }

    /// Returns the alternate marker color, if any.
    #[must_use]
    pub fn diff_color_alt(&self) -> Option<RGBA8> {
        self.diff_color_alt
    }

    /// Returns whether the canvas is a plain mask.
    #[must_use]
    pub fn diff_mask(&self) -> bool {
        self.diff_mask
    }

    /// Returns whether [`pixel_diff`] materializes the diff canvas.
    #[must_use]
    pub fn render_diff(&self) -> bool {
        self.render_diff
    }
}

/// Outcome of an in-memory matching pass.
#[derive(Debug, Clone)]
pub struct DiffResult {
    /// Number of pixel positions classified as mismatched.
    pub mismatched: u64,
    /// Diff canvas (only present if `render_diff` was set).
    pub diff: Option<ImgVec<RGBA8>>,
}

/// Outcome of a file-level comparison.
///
/// The incompatible-dimensions case is a distinct variant rather than an
/// error so a test suite can record the failure and keep running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    /// The matching pass ran to completion; the count may legitimately be
    /// zero.
    Completed {
        /// Number of mismatched pixel positions.
        mismatched: u64,
    },
    /// The two images cannot be compared pixel-by-pixel. No diff artifact
    /// is written in this case.
    Incompatible {
        /// First image width.
        w1: usize,
        /// First image height.
        h1: usize,
        /// Second image width.
        w2: usize,
        /// Second image height.
        h2: usize,
    },
}

impl Comparison {
    /// Historical scalar mapping: `0` for a perfect match, the real count
    /// for a completed pass, and `1` as the incompatible-dimensions
    /// sentinel.
    ///
    /// Earlier tooling overloaded the integer range this way; it is kept
    /// for consumers scripted against that contract. Prefer matching on
    /// the variants, and never read a returned `1` as a literal pixel
    /// count.
    #[must_use]
    pub fn legacy_count(&self) -> u64 {
        match self {
            Self::Completed { mismatched } => *mismatched,
            Self::Incompatible { .. } => 1,
        }
    }

    /// True when the pass completed with zero mismatches.
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Completed { mismatched: 0 })
    }
}

/// Compares two in-memory bitmaps and returns the mismatch count.
///
/// # Errors
/// Returns [`VisualDiffError::DimensionMismatch`] when the bitmaps differ
/// in size; in-memory callers are expected to hold same-sized captures.
pub fn pixel_diff(
    img1: ImgRef<'_, RGBA8>,
    img2: ImgRef<'_, RGBA8>,
    params: &DiffParams,
) -> Result<DiffResult, VisualDiffError> {
    let (w1, h1) = (img1.width(), img1.height());
    let (w2, h2) = (img2.width(), img2.height());
    if w1 != w2 || h1 != h2 {
        return Err(VisualDiffError::DimensionMismatch { w1, h1, w2, h2 });
    }

    let out = diff::match_pass(img1, img2, params, params.render_diff());
    Ok(DiffResult {
        mismatched: out.mismatched,
        diff: out.canvas,
    })
}

/// Compares two image sources and persists a diff artifact.
///
/// The diff canvas always takes the first ("expected") image's dimensions.
/// When the two images differ in size no artifact is written: one
/// diagnostic is logged and [`Comparison::Incompatible`] is returned so
/// the surrounding suite keeps running. Each call decodes its inputs
/// fresh; nothing is cached or shared across calls.
///
/// # Errors
/// Decode and persistence failures propagate unmodified — a missing
/// baseline or an unwritable destination is a setup problem the caller
/// must address. There is no retry logic; comparisons are deterministic
/// functions of their inputs.
pub fn compare(
    expected: ImageSource<'_>,
    actual: ImageSource<'_>,
    diff_path: &Path,
    params: &DiffParams,
) -> Result<Comparison, VisualDiffError> {
    let expected = expected.decode()?;
    let actual = actual.decode()?;
    let a = expected.as_ref();
    let b = actual.as_ref();

    let (w1, h1) = (a.width(), a.height());
    let (w2, h2) = (b.width(), b.height());
    if w1 != w2 || h1 != h2 {
        log::warn!("cannot compare pixel-by-pixel: {w1}x{h1} vs {w2}x{h2}; no diff written");
        return Ok(Comparison::Incompatible { w1, h1, w2, h2 });
    }

    let out = diff::match_pass(a, b, params, true);
    if let Some(canvas) = &out.canvas {
        io::save_rgba(canvas.as_ref(), diff_path)?;
    }

    Ok(Comparison::Completed {
        mismatched: out.mismatched,
    })
}

/// Path-taking convenience wrapper around [`compare`].
///
/// # Errors
/// Same conditions as [`compare`].
pub fn compare_files(
    expected: &Path,
    actual: &Path,
    diff_path: &Path,
    params: &DiffParams,
) -> Result<Comparison, VisualDiffError> {
    compare(
        ImageSource::Path(expected),
        ImageSource::Path(actual),
        diff_path,
        params,
    )
}
