//! Small helpers over imgref pixel buffers.

use imgref::{Img, ImgRef, ImgVec};
use rgb::RGBA8;

/// Pixel at `(x, y)`, honoring the buffer stride.
#[inline]
pub(crate) fn px(img: ImgRef<'_, RGBA8>, x: usize, y: usize) -> RGBA8 {
    img.buf()[y * img.stride() + x]
}

/// Row-wise equality for same-sized bitmaps whose strides may differ.
pub(crate) fn rows_equal(a: ImgRef<'_, RGBA8>, b: ImgRef<'_, RGBA8>) -> bool {
    debug_assert_eq!((a.width(), a.height()), (b.width(), b.height()));
    (0..a.height()).all(|y| {
        let ra = &a.buf()[y * a.stride()..y * a.stride() + a.width()];
        let rb = &b.buf()[y * b.stride()..y * b.stride() + b.width()];
        ra == rb
    })
}

/// Copies a decoded [`image::DynamicImage`] into an RGBA bitmap suitable
/// for the matching pass.
pub fn rgba_from_dynamic(img: &image::DynamicImage) -> ImgVec<RGBA8> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let pixels = rgba
        .pixels()
        .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]))
        .collect();
    Img::new(pixels, width as usize, height as usize)
}
