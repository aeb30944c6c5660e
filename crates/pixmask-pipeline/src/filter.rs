//! 3x3 neighborhood filters over a gray buffer.
//!
//! Filters read the blue byte of each pixel (a gray buffer carries the same
//! value in all three color channels) and write the clamped result into
//! blue, green and red. The one-pixel border has no full neighborhood and is
//! copied from the source. Alpha is 255 everywhere.

use serde::{Deserialize, Serialize};

use crate::buffer::{ALPHA, BLUE, CHANNELS, GREEN, PixelBuffer, RED};
use crate::parallel;
use crate::types::ImagingError;

/// An immutable 3x3 integer kernel with a normalizing divisor.
///
/// `taps[row][col]`, where row 0 is the line above the center pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernel {
    pub taps: [[i32; 3]; 3],
    pub divisor: i32,
}

impl Kernel {
    /// Box blur.
    pub const AVERAGE: Self = Self {
        taps: [[1, 1, 1], [1, 1, 1], [1, 1, 1]],
        divisor: 9,
    };

    /// Binomial blur.
    pub const GAUSSIAN: Self = Self {
        taps: [[1, 2, 1], [2, 4, 2], [1, 2, 1]],
        divisor: 16,
    };

    /// Four-neighbor Laplacian.
    pub const LAPLACIAN: Self = Self {
        taps: [[0, 1, 0], [1, -4, 1], [0, 1, 0]],
        divisor: 1,
    };

    pub const PREWITT_X: Self = Self {
        taps: [[-1, 0, 1], [-1, 0, 1], [-1, 0, 1]],
        divisor: 1,
    };

    pub const PREWITT_Y: Self = Self {
        taps: [[-1, -1, -1], [0, 0, 0], [1, 1, 1]],
        divisor: 1,
    };

    pub const SOBEL_X: Self = Self {
        taps: [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]],
        divisor: 1,
    };

    pub const SOBEL_Y: Self = Self {
        taps: [[-1, -2, -1], [0, 0, 0], [1, 2, 1]],
        divisor: 1,
    };

    fn apply(&self, window: &[[i32; 3]; 3]) -> f64 {
        let mut sum = 0i32;
        for (taps, values) in self.taps.iter().zip(window) {
            for (t, v) in taps.iter().zip(values) {
                sum += t * v;
            }
        }
        f64::from(sum) / f64::from(self.divisor)
    }
}

/// Named kernels selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    Average,
    Gaussian,
    Laplacian,
}

impl FilterKind {
    /// The kernel this name stands for.
    #[must_use]
    pub const fn kernel(self) -> Kernel {
        match self {
            Self::Average => Kernel::AVERAGE,
            Self::Gaussian => Kernel::GAUSSIAN,
            Self::Laplacian => Kernel::LAPLACIAN,
        }
    }
}

/// Edge operators for [`gradient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradientOperator {
    Prewitt,
    Sobel,
}

impl GradientOperator {
    const fn kernels(self) -> (Kernel, Kernel) {
        match self {
            Self::Prewitt => (Kernel::PREWITT_X, Kernel::PREWITT_Y),
            Self::Sobel => (Kernel::SOBEL_X, Kernel::SOBEL_Y),
        }
    }
}

/// Convolve with `kernel` and scale by `weight`.
///
/// # Errors
///
/// Returns [`ImagingError::InvalidParameter`] if `weight` is not finite or
/// the kernel divisor is zero.
pub fn convolve(
    src: &PixelBuffer,
    kernel: &Kernel,
    weight: f64,
) -> Result<PixelBuffer, ImagingError> {
    if kernel.divisor == 0 {
        return Err(ImagingError::InvalidParameter(
            "kernel divisor must be non-zero".into(),
        ));
    }
    check_weight(weight)?;
    Ok(filter_3x3(src, |window| kernel.apply(window) * weight))
}

/// Gradient magnitude `(|gx| + |gy|) * weight`.
///
/// # Errors
///
/// Returns [`ImagingError::InvalidParameter`] if `weight` is not finite.
pub fn gradient(
    src: &PixelBuffer,
    operator: GradientOperator,
    weight: f64,
) -> Result<PixelBuffer, ImagingError> {
    check_weight(weight)?;
    let (kx, ky) = operator.kernels();
    Ok(filter_3x3(src, |window| {
        (kx.apply(window).abs() + ky.apply(window).abs()) * weight
    }))
}

fn check_weight(weight: f64) -> Result<(), ImagingError> {
    if weight.is_finite() {
        Ok(())
    } else {
        Err(ImagingError::InvalidParameter(format!(
            "filter weight must be finite, got {weight}"
        )))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_byte(v: f64) -> u8 {
    v.clamp(0.0, 255.0) as u8
}

fn filter_3x3(src: &PixelBuffer, f: impl Fn(&[[i32; 3]; 3]) -> f64 + Send + Sync) -> PixelBuffer {
    let (width, height) = (src.width(), src.height());
    let bytes = src.as_bytes();
    let stride = src.row_stride();
    let at = |x: u32, y: u32| i32::from(bytes[src.index(x, y) + BLUE]);

    parallel::fill_rows(width, height, |y, row| {
        let src_row = &bytes[y as usize * stride..(y as usize + 1) * stride];
        row.copy_from_slice(src_row);
        if y > 0 && y + 1 < height && width >= 3 {
            for x in 1..width - 1 {
                let window = [
                    [at(x - 1, y - 1), at(x, y - 1), at(x + 1, y - 1)],
                    [at(x - 1, y), at(x, y), at(x + 1, y)],
                    [at(x - 1, y + 1), at(x, y + 1), at(x + 1, y + 1)],
                ];
                let v = to_byte(f(&window));
                let o = x as usize * CHANNELS;
                row[o + BLUE] = v;
                row[o + GREEN] = v;
                row[o + RED] = v;
            }
        }
        for px in row.chunks_exact_mut(CHANNELS) {
            px[ALPHA] = 255;
        }
    })
}
