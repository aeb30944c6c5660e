//! Overlay drawing: solid point markers and rectangle outlines.
//!
//! The two primitives treat the boundary differently. [`paint_square`]
//! clips silently, so a marker near an edge is simply cut off.
//! [`draw_box_outline`] requires the whole rectangle to be inside the buffer
//! and rejects it up front otherwise, leaving the buffer untouched.

use crate::buffer::{CHANNELS, PixelBuffer};
use crate::types::{ImagingError, Point, Rgb, Size};

/// Paint the box `[cx - w/2, cx + w/2] x [cy - h/2, cy + h/2]` with `color`.
///
/// Half-extents use integer division, so a size of `(1, 1)` paints exactly
/// one pixel and `(4, 4)` paints a 5x5 block. Pixels outside the buffer are
/// skipped. A zero extent paints nothing.
#[must_use = "returns the painted buffer"]
pub fn paint_square(src: &PixelBuffer, color: Rgb, center: Point, size: Size) -> PixelBuffer {
    let mut out = src.clone();
    paint_square_in_place(&mut out, color, center, size);
    out
}

/// In-place variant of [`paint_square`].
pub fn paint_square_in_place(buf: &mut PixelBuffer, color: Rgb, center: Point, size: Size) {
    if size.is_empty() || buf.is_empty() {
        return;
    }
    let half_w = i64::from(size.width / 2);
    let half_h = i64::from(size.height / 2);
    let (cx, cy) = (i64::from(center.x), i64::from(center.y));

    let x0 = (cx - half_w).max(0);
    let y0 = (cy - half_h).max(0);
    let x1 = (cx + half_w).min(i64::from(buf.width()) - 1);
    let y1 = (cy + half_h).min(i64::from(buf.height()) - 1);
    if x0 > x1 || y0 > y1 {
        return;
    }

    let pixel = color.to_bgra();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (x0, y0, x1, y1) = (x0 as u32, y0 as u32, x1 as u32, y1 as u32);
    for y in y0..=y1 {
        let start = buf.index(x0, y);
        let end = buf.index(x1, y) + CHANNELS;
        for px in buf.as_bytes_mut()[start..end].chunks_exact_mut(CHANNELS) {
            px.copy_from_slice(&pixel);
        }
    }
}

/// Draw the one-pixel outline of the `size` rectangle anchored at `top_left`.
///
/// # Errors
///
/// Returns [`ImagingError::OutOfRange`] naming the first corner that falls
/// outside the buffer.
pub fn draw_box_outline(
    src: &PixelBuffer,
    color: Rgb,
    top_left: Point,
    size: Size,
) -> Result<PixelBuffer, ImagingError> {
    let mut out = src.clone();
    draw_box_outline_in_place(&mut out, color, top_left, size)?;
    Ok(out)
}

/// In-place variant of [`draw_box_outline`]. Nothing is written on error.
///
/// # Errors
///
/// See [`draw_box_outline`].
pub fn draw_box_outline_in_place(
    buf: &mut PixelBuffer,
    color: Rgb,
    top_left: Point,
    size: Size,
) -> Result<(), ImagingError> {
    if size.is_empty() {
        return Ok(());
    }
    let x0 = i64::from(top_left.x);
    let y0 = i64::from(top_left.y);
    let x1 = x0 + i64::from(size.width) - 1;
    let y1 = y0 + i64::from(size.height) - 1;
    buf.checked_index(x0, y0)?;
    buf.checked_index(x1, y1)?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (x0, y0, x1, y1) = (x0 as u32, y0 as u32, x1 as u32, y1 as u32);
    let pixel = color.to_bgra();
    let width = buf.width() as usize;
    let data = buf.as_bytes_mut();
    let mut put = |x: u32, y: u32| {
        let o = CHANNELS * (width * y as usize + x as usize);
        data[o..o + CHANNELS].copy_from_slice(&pixel);
    };
    for x in x0..=x1 {
        put(x, y0);
        put(x, y1);
    }
    for y in y0..=y1 {
        put(x0, y);
        put(x1, y);
    }
    Ok(())
}
