//! Rectangular sub-buffer extraction.

use crate::buffer::{CHANNELS, PixelBuffer, byte_len};
use crate::types::{ImagingError, Point, Size};

/// Copy the `size` window anchored at `top_left` into a new buffer.
///
/// An empty `size` yields an empty buffer as long as `top_left` itself is in
/// bounds.
///
/// # Errors
///
/// Returns [`ImagingError::OutOfRange`] if the anchor or the window's far
/// corner lies outside `src`.
pub fn crop(src: &PixelBuffer, top_left: Point, size: Size) -> Result<PixelBuffer, ImagingError> {
    let x0 = i64::from(top_left.x);
    let y0 = i64::from(top_left.y);
    src.checked_index(x0, y0)?;
    if size.is_empty() {
        return Ok(PixelBuffer::new(size.width, size.height));
    }
    src.checked_index(x0 + i64::from(size.width) - 1, y0 + i64::from(size.height) - 1)?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (x0, y0) = (x0 as u32, y0 as u32);
    let mut out = Vec::with_capacity(byte_len(size.width, size.height).unwrap_or_default());
    for y in y0..y0 + size.height {
        let start = src.index(x0, y);
        let end = src.index(x0 + size.width - 1, y) + CHANNELS;
        out.extend_from_slice(&src.as_bytes()[start..end]);
    }
    PixelBuffer::from_raw(size.width, size.height, out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn coords() -> PixelBuffer {
        PixelBuffer::from_fn(6, 5, |x, y| [x as u8, y as u8, 0, 255])
    }

    #[test]
    fn copies_the_window() {
        let out = crop(&coords(), Point::new(2, 1), Size::new(3, 2)).unwrap();
        assert_eq!(out.size(), Size::new(3, 2));
        assert_eq!(out.get_pixel(0, 0).unwrap(), [2, 1, 0, 255]);
        assert_eq!(out.get_pixel(2, 1).unwrap(), [4, 2, 0, 255]);
    }

    #[test]
    fn full_window_is_identity() {
        let src = coords();
        assert_eq!(crop(&src, Point::new(0, 0), src.size()).unwrap(), src);
    }

    #[test]
    fn window_past_edge_is_rejected() {
        let err = crop(&coords(), Point::new(4, 0), Size::new(3, 1)).unwrap_err();
        assert!(matches!(err, ImagingError::OutOfRange { x: 6, y: 0, .. }));
        assert!(crop(&coords(), Point::new(-1, 0), Size::new(1, 1)).is_err());
    }

    #[test]
    fn empty_window() {
        let out = crop(&coords(), Point::new(1, 1), Size::new(0, 4)).unwrap();
        assert!(out.is_empty());
    }
}
