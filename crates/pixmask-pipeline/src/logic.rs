//! Per-channel boolean combination of buffers.
//!
//! On masks `min` is logical AND and `max` is logical OR; on gray or color
//! buffers they act channel by channel. Alpha is always 255 in the output.

use crate::buffer::{ALPHA, BLUE, GREEN, PixelBuffer, RED};
use crate::parallel;
use crate::types::ImagingError;

/// Per-channel minimum of `a` and `b`.
///
/// # Errors
///
/// Returns [`ImagingError::DimensionMismatch`] if the buffers differ in size.
pub fn and(a: &PixelBuffer, b: &PixelBuffer) -> Result<PixelBuffer, ImagingError> {
    combine(a, b, u8::min)
}

/// Per-channel maximum of `a` and `b`.
///
/// # Errors
///
/// Returns [`ImagingError::DimensionMismatch`] if the buffers differ in size.
pub fn or(a: &PixelBuffer, b: &PixelBuffer) -> Result<PixelBuffer, ImagingError> {
    combine(a, b, u8::max)
}

/// Per-channel complement `255 - v`.
#[must_use = "returns the inverted buffer"]
pub fn not(src: &PixelBuffer) -> PixelBuffer {
    parallel::map_pixels(src, |s, d| {
        d[BLUE] = !s[BLUE];
        d[GREEN] = !s[GREEN];
        d[RED] = !s[RED];
        d[ALPHA] = 255;
    })
}

/// In-place variant of [`not`].
pub fn not_in_place(buf: &mut PixelBuffer) {
    parallel::map_pixels_in_place(buf, |px| {
        px[BLUE] = !px[BLUE];
        px[GREEN] = !px[GREEN];
        px[RED] = !px[RED];
        px[ALPHA] = 255;
    });
}

fn combine(
    a: &PixelBuffer,
    b: &PixelBuffer,
    op: fn(u8, u8) -> u8,
) -> Result<PixelBuffer, ImagingError> {
    a.ensure_same_size(b)?;
    Ok(parallel::zip_pixels(a, b, |pa, pb, d| {
        d[BLUE] = op(pa[BLUE], pb[BLUE]);
        d[GREEN] = op(pa[GREEN], pb[GREEN]);
        d[RED] = op(pa[RED], pb[RED]);
        d[ALPHA] = 255;
    }))
}
