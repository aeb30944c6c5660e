//! Binary erosion and dilation.
//!
//! Both operations read the original mask and write a copy, so every
//! decision within one call sees the pre-operation state. The blue byte is
//! the tested channel:
//!
//! - **Erode** spreads black (0) from every black pixel into its
//!   neighborhood, shrinking the white foreground.
//! - **Dilate** spreads white (255) from every white pixel into its
//!   neighborhood, growing the foreground.
//!
//! Neighborhoods are symmetric, so "pixel `p` receives the state from some
//! neighbor" is the same as "some neighbor of `p` carries the state". The
//! implementation gathers per output row, which lets rows run in parallel.

use serde::{Deserialize, Serialize};

use crate::buffer::{ALPHA, BLUE, CHANNELS, GREEN, PixelBuffer, RED};
use crate::parallel;
use crate::types::ImagingError;

/// Shape of the structuring element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Neighborhood {
    /// The four edge-sharing neighbors (radius 1).
    #[default]
    Cross,
    /// Every pixel within Chebyshev distance `radius`, i.e. a
    /// `(2 * radius + 1)` square window.
    Square { radius: u32 },
}

impl TryFrom<u8> for Neighborhood {
    type Error = ImagingError;

    /// Accepts the neighbor counts `4` (cross) and `8` (3x3 square).
    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            4 => Ok(Self::Cross),
            8 => Ok(Self::Square { radius: 1 }),
            other => Err(ImagingError::InvalidParameter(format!(
                "neighborhood must be 4 or 8, got {other}"
            ))),
        }
    }
}

/// Which morphological operation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MorphOp {
    /// Shrink the foreground.
    Erode,
    /// Grow the foreground.
    Dilate,
}

impl MorphOp {
    /// The blue-channel value this operation propagates.
    const fn level(self) -> u8 {
        match self {
            Self::Erode => 0,
            Self::Dilate => 255,
        }
    }
}

/// One step of a morphology chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphologyStep {
    /// Operation to apply.
    pub op: MorphOp,
    /// Structuring element.
    #[serde(default)]
    pub neighborhood: Neighborhood,
}

impl MorphologyStep {
    /// An erosion step.
    #[must_use]
    pub const fn erode(neighborhood: Neighborhood) -> Self {
        Self {
            op: MorphOp::Erode,
            neighborhood,
        }
    }

    /// A dilation step.
    #[must_use]
    pub const fn dilate(neighborhood: Neighborhood) -> Self {
        Self {
            op: MorphOp::Dilate,
            neighborhood,
        }
    }
}

/// Erode a binary mask.
#[must_use = "returns the eroded mask"]
pub fn erode(src: &PixelBuffer, neighborhood: Neighborhood) -> PixelBuffer {
    apply(src, MorphOp::Erode, neighborhood)
}

/// Dilate a binary mask.
#[must_use = "returns the dilated mask"]
pub fn dilate(src: &PixelBuffer, neighborhood: Neighborhood) -> PixelBuffer {
    apply(src, MorphOp::Dilate, neighborhood)
}

/// Replace `buf` with its erosion. A scratch buffer is still allocated.
pub fn erode_in_place(buf: &mut PixelBuffer, neighborhood: Neighborhood) {
    *buf = erode(buf, neighborhood);
}

/// Replace `buf` with its dilation. A scratch buffer is still allocated.
pub fn dilate_in_place(buf: &mut PixelBuffer, neighborhood: Neighborhood) {
    *buf = dilate(buf, neighborhood);
}

/// Run a chain of steps in order.
#[must_use = "returns the transformed mask"]
pub fn apply_steps(src: &PixelBuffer, steps: &[MorphologyStep]) -> PixelBuffer {
    let mut current = src.clone();
    for step in steps {
        current = apply(&current, step.op, step.neighborhood);
        log::trace!("morphology step {step:?} applied");
    }
    current
}

/// Apply one morphological operation.
#[must_use = "returns the transformed mask"]
pub fn apply(src: &PixelBuffer, op: MorphOp, neighborhood: Neighborhood) -> PixelBuffer {
    let width = src.width();
    let height = src.height();
    let level = op.level();
    let bytes = src.as_bytes();

    parallel::fill_rows(width, height, |y, row| {
        for x in 0..width {
            let o = CHANNELS * x as usize;
            let s = src.index(x, y);
            let src_px = &bytes[s..s + CHANNELS];
            let hit = match neighborhood {
                Neighborhood::Cross => cross_hit(src, x, y, level),
                Neighborhood::Square { radius } => square_hit(src, x, y, radius, level),
            };
            let px = &mut row[o..o + CHANNELS];
            if hit {
                px[BLUE] = level;
                px[GREEN] = level;
                px[RED] = level;
            } else {
                px[BLUE] = src_px[BLUE];
                px[GREEN] = src_px[GREEN];
                px[RED] = src_px[RED];
            }
            px[ALPHA] = 255;
        }
    })
}

fn blue_at(src: &PixelBuffer, x: u32, y: u32) -> u8 {
    src.as_bytes()[src.index(x, y) + BLUE]
}

/// Whether any edge neighbor of `(x, y)` carries `level`.
fn cross_hit(src: &PixelBuffer, x: u32, y: u32, level: u8) -> bool {
    (x >= 1 && blue_at(src, x - 1, y) == level)
        || (x + 1 < src.width() && blue_at(src, x + 1, y) == level)
        || (y >= 1 && blue_at(src, x, y - 1) == level)
        || (y + 1 < src.height() && blue_at(src, x, y + 1) == level)
}

/// Whether any pixel in the clipped square window around `(x, y)` carries `level`.
fn square_hit(src: &PixelBuffer, x: u32, y: u32, radius: u32, level: u8) -> bool {
    let x0 = x.saturating_sub(radius);
    let x1 = x.saturating_add(radius).min(src.width() - 1);
    let y0 = y.saturating_sub(radius);
    let y1 = y.saturating_add(radius).min(src.height() - 1);
    (y0..=y1).any(|ly| (x0..=x1).any(|lx| blue_at(src, lx, ly) == level))
}
