//! Image decode and diff-artifact persistence.
//!
//! The output encoding is resolved explicitly from the destination path's
//! extension into [`image::ImageFormat`]; an unrecognized extension is a
//! persistence error rather than a silent fallback.

use std::path::Path;

use imgref::{ImgRef, ImgVec};
use rgb::{ComponentBytes, RGBA8};

use crate::raster::rgba_from_dynamic;
use crate::VisualDiffError;

/// One side of a comparison: a file to decode, or a bitmap the caller has
/// already decoded (a capture layer handing over raw screenshots, for
/// example).
#[derive(Debug, Clone, Copy)]
pub enum ImageSource<'a> {
    /// Decode the image at this path.
    Path(&'a Path),
    /// Use an already-decoded RGBA bitmap.
    Bitmap(ImgRef<'a, RGBA8>),
}

impl<'a> From<&'a Path> for ImageSource<'a> {
    fn from(path: &'a Path) -> Self {
        ImageSource::Path(path)
    }
}

impl<'a> From<ImgRef<'a, RGBA8>> for ImageSource<'a> {
    fn from(img: ImgRef<'a, RGBA8>) -> Self {
        ImageSource::Bitmap(img)
    }
}

impl<'a> ImageSource<'a> {
    pub(crate) fn decode(self) -> Result<Decoded<'a>, VisualDiffError> {
        match self {
            ImageSource::Path(path) => load_rgba(path).map(Decoded::Owned),
            ImageSource::Bitmap(img) => Ok(Decoded::Borrowed(img)),
        }
    }
}

pub(crate) enum Decoded<'a> {
    Owned(ImgVec<RGBA8>),
    Borrowed(ImgRef<'a, RGBA8>),
}

impl Decoded<'_> {
    pub(crate) fn as_ref(&self) -> ImgRef<'_, RGBA8> {
        match self {
            Decoded::Owned(img) => img.as_ref(),
            Decoded::Borrowed(img) => *img,
        }
    }
}

/// Decodes an image file into an RGBA bitmap.
///
/// # Errors
/// Returns [`VisualDiffError::Decode`] when the file is missing, unreadable,
/// or not a recognized image format.
pub fn load_rgba(path: &Path) -> Result<ImgVec<RGBA8>, VisualDiffError> {
    let decoded = image::open(path).map_err(|source| VisualDiffError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(rgba_from_dynamic(&decoded))
}

/// Persists an RGBA bitmap, resolving the encoding from the path extension.
///
/// # Errors
/// Returns [`VisualDiffError::Encode`] when the extension maps to no known
/// format or the encoder fails (bad destination, disk error).
pub fn save_rgba(img: ImgRef<'_, RGBA8>, path: &Path) -> Result<(), VisualDiffError> {
    let format = image::ImageFormat::from_path(path).map_err(|source| VisualDiffError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    let width = img.width();
    let height = img.height();

    // flatten to a contiguous byte buffer, dropping any stride padding
    let mut bytes = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let row = &img.buf()[y * img.stride()..y * img.stride() + width];
        bytes.extend_from_slice(row.as_bytes());
    }

    image::save_buffer_with_format(
        path,
        &bytes,
        width as u32,
        height as u32,
        image::ExtendedColorType::Rgba8,
        format,
    )
    .map_err(|source| VisualDiffError::Encode {
        path: path.to_path_buf(),
        source,
    })
}
