//! The canonical flat BGRA pixel buffer.
//!
//! Every transform in this crate consumes and produces a [`PixelBuffer`]:
//! `width * height` pixels, four bytes each, stored row-major. Within a
//! pixel whose base offset is `o = 4 * (width * y + x)`:
//!
//! | offset | channel |
//! |--------|---------|
//! | `o+0`  | blue    |
//! | `o+1`  | green   |
//! | `o+2`  | red     |
//! | `o+3`  | alpha   |

use serde::{Deserialize, Serialize};

use crate::types::{ImagingError, Point, Rgb, Size};

/// Bytes per pixel.
pub const CHANNELS: usize = 4;
/// Offset of the blue byte within a pixel.
pub const BLUE: usize = 0;
/// Offset of the green byte within a pixel.
pub const GREEN: usize = 1;
/// Offset of the red byte within a pixel.
pub const RED: usize = 2;
/// Offset of the alpha byte within a pixel.
pub const ALPHA: usize = 3;

/// Opaque black, the default content of a fresh buffer.
pub const BLACK_PIXEL: [u8; 4] = [0, 0, 0, 255];
/// Opaque white.
pub const WHITE_PIXEL: [u8; 4] = [255, 255, 255, 255];

/// An owned BGRA pixel buffer whose length always equals `width * height * 4`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBuffer", into = "RawBuffer")]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// Serde proxy so deserialization goes through [`PixelBuffer::from_raw`].
#[derive(Clone, Serialize, Deserialize)]
struct RawBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl TryFrom<RawBuffer> for PixelBuffer {
    type Error = ImagingError;

    fn try_from(raw: RawBuffer) -> Result<Self, Self::Error> {
        Self::from_raw(raw.width, raw.height, raw.data)
    }
}

impl From<PixelBuffer> for RawBuffer {
    fn from(buffer: PixelBuffer) -> Self {
        Self {
            width: buffer.width,
            height: buffer.height,
            data: buffer.data,
        }
    }
}

/// Byte length of a `width x height` BGRA buffer, or `None` on overflow.
#[must_use]
pub fn byte_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(CHANNELS)
}

impl PixelBuffer {
    /// Create an opaque black buffer.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgb::BLACK)
    }

    /// Create a buffer with every pixel set to `color` (alpha 255).
    #[must_use]
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        let pixel = color.to_bgra();
        let count = width as usize * height as usize;
        let mut data = Vec::with_capacity(count * CHANNELS);
        for _ in 0..count {
            data.extend_from_slice(&pixel);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap existing BGRA bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::BufferLength`] if `data.len()` is not exactly
    /// `width * height * 4`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ImagingError> {
        let expected = byte_len(width, height).ok_or_else(|| {
            ImagingError::InvalidParameter(format!("{width}x{height} buffer is too large"))
        })?;
        if data.len() != expected {
            return Err(ImagingError::BufferLength {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a buffer by evaluating `f` at every coordinate.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions as a [`Size`].
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Returns `true` if the buffer holds no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of bytes in one row.
    #[must_use]
    pub const fn row_stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// The raw BGRA bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The raw BGRA bytes, mutably. The length cannot change through a slice.
    #[must_use]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the buffer and return its bytes.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Byte offset of pixel `(x, y)`.
    ///
    /// Pure arithmetic: the caller guarantees `x < width` and `y < height`.
    /// Use [`checked_index`](Self::checked_index) when that is not known.
    #[must_use]
    pub const fn index(&self, x: u32, y: u32) -> usize {
        CHANNELS * (self.width as usize * y as usize + x as usize)
    }

    /// Byte offset of pixel `(x, y)`, rejecting coordinates outside the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::OutOfRange`] if `x` is not in `[0, width)` or
    /// `y` is not in `[0, height)`.
    pub fn checked_index(&self, x: i64, y: i64) -> Result<usize, ImagingError> {
        if !self.contains(x, y) {
            return Err(ImagingError::OutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (x, y) = (x as u32, y as u32);
        Ok(self.index(x, y))
    }

    /// Returns `true` if `(x, y)` lies inside the buffer.
    #[must_use]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        (0..i64::from(self.width)).contains(&x) && (0..i64::from(self.height)).contains(&y)
    }

    /// Returns `true` if `point` lies inside the buffer.
    #[must_use]
    pub fn contains_point(&self, point: Point) -> bool {
        self.contains(i64::from(point.x), i64::from(point.y))
    }

    /// Read all four bytes of pixel `(x, y)` as `[b, g, r, a]`.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::OutOfRange`] for coordinates outside the buffer.
    pub fn get_pixel(&self, x: i64, y: i64) -> Result<[u8; 4], ImagingError> {
        let o = self.checked_index(x, y)?;
        Ok([
            self.data[o + BLUE],
            self.data[o + GREEN],
            self.data[o + RED],
            self.data[o + ALPHA],
        ])
    }

    /// Write all four bytes of pixel `(x, y)` from `[b, g, r, a]`.
    ///
    /// Either the whole pixel is written or, on error, nothing is.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::OutOfRange`] for coordinates outside the buffer.
    pub fn set_pixel(&mut self, x: i64, y: i64, bgra: [u8; 4]) -> Result<(), ImagingError> {
        let o = self.checked_index(x, y)?;
        self.data[o..o + CHANNELS].copy_from_slice(&bgra);
        Ok(())
    }

    /// Read the three color channels of pixel `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::OutOfRange`] for coordinates outside the buffer.
    pub fn get_rgb(&self, x: i64, y: i64) -> Result<Rgb, ImagingError> {
        let [b, g, r, _] = self.get_pixel(x, y)?;
        Ok(Rgb::new(r, g, b))
    }

    /// Write the three color channels of pixel `(x, y)`, leaving alpha alone.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::OutOfRange`] for coordinates outside the buffer.
    pub fn set_rgb(&mut self, x: i64, y: i64, color: Rgb) -> Result<(), ImagingError> {
        let o = self.checked_index(x, y)?;
        self.data[o + BLUE] = color.b;
        self.data[o + GREEN] = color.g;
        self.data[o + RED] = color.r;
        Ok(())
    }

    /// Iterate over pixels as 4-byte BGRA slices in raster order.
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.data.chunks_exact(CHANNELS)
    }

    /// Fail unless `other` has the same dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::DimensionMismatch`] when the sizes differ.
    pub fn ensure_same_size(&self, other: &Self) -> Result<(), ImagingError> {
        if self.size() == other.size() {
            Ok(())
        } else {
            Err(ImagingError::DimensionMismatch {
                left: self.size(),
                right: other.size(),
            })
        }
    }

    /// Set the alpha byte of every pixel to 255.
    pub fn fill_alpha(&mut self) {
        for px in self.data.chunks_exact_mut(CHANNELS) {
            px[ALPHA] = 255;
        }
    }
}
