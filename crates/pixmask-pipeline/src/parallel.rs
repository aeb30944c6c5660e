//! Row-parallel iteration helpers.
//!
//! Element-wise transforms write disjoint output rows while reading only
//! immutable input, so every row can be processed on the rayon pool
//! without synchronization.

use rayon::prelude::*;

use crate::buffer::{CHANNELS, PixelBuffer};

/// Produce a new buffer by mapping each source pixel to an output pixel.
pub fn map_pixels(src: &PixelBuffer, f: impl Fn(&[u8], &mut [u8]) + Send + Sync) -> PixelBuffer {
    let mut dst = PixelBuffer::new(src.width(), src.height());
    if src.is_empty() {
        return dst;
    }
    let stride = src.row_stride();
    src.as_bytes()
        .par_chunks_exact(stride)
        .zip(dst.as_bytes_mut().par_chunks_exact_mut(stride))
        .for_each(|(src_row, dst_row)| {
            src_row
                .chunks_exact(CHANNELS)
                .zip(dst_row.chunks_exact_mut(CHANNELS))
                .for_each(|(s, d)| f(s, d));
        });
    dst
}

/// Rewrite each pixel of `buf` in place.
pub fn map_pixels_in_place(buf: &mut PixelBuffer, f: impl Fn(&mut [u8]) + Send + Sync) {
    if buf.is_empty() {
        return;
    }
    let stride = buf.row_stride();
    buf.as_bytes_mut()
        .par_chunks_exact_mut(stride)
        .for_each(|row| row.chunks_exact_mut(CHANNELS).for_each(&f));
}

/// Combine two same-sized buffers pixel by pixel into a new buffer.
///
/// The caller has already checked that `a` and `b` share dimensions.
pub fn zip_pixels(
    a: &PixelBuffer,
    b: &PixelBuffer,
    f: impl Fn(&[u8], &[u8], &mut [u8]) + Send + Sync,
) -> PixelBuffer {
    let mut dst = PixelBuffer::new(a.width(), a.height());
    if a.is_empty() {
        return dst;
    }
    let stride = a.row_stride();
    a.as_bytes()
        .par_chunks_exact(stride)
        .zip(b.as_bytes().par_chunks_exact(stride))
        .zip(dst.as_bytes_mut().par_chunks_exact_mut(stride))
        .for_each(|((a_row, b_row), dst_row)| {
            for ((pa, pb), d) in a_row
                .chunks_exact(CHANNELS)
                .zip(b_row.chunks_exact(CHANNELS))
                .zip(dst_row.chunks_exact_mut(CHANNELS))
            {
                f(pa, pb, d);
            }
        });
    dst
}

/// Fill a new buffer row by row; `f` receives the row index and the row's bytes.
///
/// Used by neighborhood operations that gather from arbitrary source rows.
pub fn fill_rows(width: u32, height: u32, f: impl Fn(u32, &mut [u8]) + Send + Sync) -> PixelBuffer {
    let mut dst = PixelBuffer::new(width, height);
    if dst.is_empty() {
        return dst;
    }
    let stride = dst.row_stride();
    dst.as_bytes_mut()
        .par_chunks_exact_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            #[allow(clippy::cast_possible_truncation)]
            f(y as u32, row);
        });
    dst
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_pixels_visits_every_pixel() {
        let src = PixelBuffer::from_fn(7, 5, |x, y| [x as u8, y as u8, 0, 0]);
        let dst = map_pixels(&src, |s, d| {
            d[0] = s[0] + 1;
            d[1] = s[1];
            d[3] = 255;
        });
        for (s, d) in src.pixels().zip(dst.pixels()) {
            assert_eq!(d[0], s[0] + 1);
            assert_eq!(d[1], s[1]);
            assert_eq!(d[3], 255);
        }
    }

    #[test]
    fn helpers_accept_empty_buffers() {
        let empty = PixelBuffer::new(0, 3);
        assert!(map_pixels(&empty, |_, _| {}).is_empty());
        assert!(zip_pixels(&empty, &empty, |_, _, _| {}).is_empty());
        assert!(fill_rows(0, 3, |_, _| {}).is_empty());
        let mut e = empty;
        map_pixels_in_place(&mut e, |_| {});
    }

    #[test]
    fn fill_rows_passes_row_index() {
        let buf = fill_rows(2, 4, |y, row| {
            for px in row.chunks_exact_mut(CHANNELS) {
                px[0] = y as u8;
            }
        });
        for y in 0..4u32 {
            let o = buf.index(1, y);
            assert_eq!(buf.as_bytes()[o], y as u8);
        }
    }
}
