//! Whole-mask measurements: foreground/background area and centroid.
//!
//! These read only the blue byte, which on a mask carries the same value as
//! green and red. A pixel is white when that byte is 255 and black when it
//! is 0; anything in between counts as neither.

use crate::buffer::{BLUE, PixelBuffer};
use crate::types::Point;

/// Number of white pixels.
#[must_use]
pub fn white_area(mask: &PixelBuffer) -> u64 {
    count_level(mask, 255)
}

/// Number of black pixels.
#[must_use]
pub fn black_area(mask: &PixelBuffer) -> u64 {
    count_level(mask, 0)
}

/// Integer mean position of the white pixels, or `None` if there are none.
#[must_use]
pub fn white_centroid(mask: &PixelBuffer) -> Option<Point> {
    centroid_of_level(mask, 255)
}

/// Integer mean position of the black pixels, or `None` if there are none.
#[must_use]
pub fn black_centroid(mask: &PixelBuffer) -> Option<Point> {
    centroid_of_level(mask, 0)
}

fn count_level(mask: &PixelBuffer, level: u8) -> u64 {
    mask.pixels().filter(|p| p[BLUE] == level).count() as u64
}

fn centroid_of_level(mask: &PixelBuffer, level: u8) -> Option<Point> {
    let width = mask.width() as usize;
    if width == 0 {
        return None;
    }
    let (mut sum_x, mut sum_y, mut n) = (0u64, 0u64, 0u64);
    for (i, _) in mask.pixels().enumerate().filter(|(_, p)| p[BLUE] == level) {
        sum_x += (i % width) as u64;
        sum_y += (i / width) as u64;
        n += 1;
    }
    if n == 0 {
        return None;
    }
    // Means are bounded by the buffer's u32 extents.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let (cx, cy) = ((sum_x / n) as i32, (sum_y / n) as i32);
    Some(Point::new(cx, cy))
}
