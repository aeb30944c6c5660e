//! Shared types for the pixmask processing core.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::binarize::{Polarity, Threshold};
use crate::buffer::PixelBuffer;
use crate::grayscale::GrayscaleMethod;
use crate::label::{Component, Connectivity, Labeling};
use crate::morphology::MorphologyStep;

/// A 2D integer point in pixel coordinates.
///
/// Signed so that overlay centers may sit partially off-canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: i32,
    /// Vertical position (pixels from top edge).
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An extent in pixels. Components are unsigned, so a `Size` is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels covered (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns `true` if either extent is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Three 8-bit color channels, used for thresholds and paint colors.
///
/// Never stored in a buffer directly; buffers hold BGRA bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const RED: Self = Self::new(255, 0, 0);
    pub const GREEN: Self = Self::new(0, 255, 0);
    pub const BLUE: Self = Self::new(0, 0, 255);

    /// Create a color from red, green and blue values.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// The same value in all three channels.
    #[must_use]
    pub const fn gray(v: u8) -> Self {
        Self::new(v, v, v)
    }

    /// The color as an opaque BGRA pixel.
    #[must_use]
    pub const fn to_bgra(self) -> [u8; 4] {
        [self.b, self.g, self.r, 255]
    }
}

/// Configuration for the grayscale -> binarize -> morphology -> label chain.
///
/// Every field falls back to its default when missing from serialized
/// input, so a JSON config only needs the fields it changes. The
/// `DEFAULT_*` constants are the values [`Default`] uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// How color is reduced to gray before thresholding.
    pub grayscale: GrayscaleMethod,

    /// Per-channel band tested against the gray buffer.
    pub threshold: Threshold,

    /// Whether pixels inside `threshold` become foreground (white) or
    /// background (black).
    pub polarity: Polarity,

    /// Erode/dilate steps applied in order to the binary mask. Empty means
    /// the mask is labeled as binarized.
    pub morphology: Vec<MorphologyStep>,

    /// Neighborhood used to join foreground pixels into components.
    pub connectivity: Connectivity,
}

impl PipelineConfig {
    pub const DEFAULT_GRAYSCALE: GrayscaleMethod = GrayscaleMethod::Bt601;
    pub const DEFAULT_THRESHOLD: Threshold = Threshold::gray(127);
    pub const DEFAULT_POLARITY: Polarity = Polarity::InsideWhite;
    pub const DEFAULT_CONNECTIVITY: Connectivity = Connectivity::Eight;

    /// Check parameters that the type system does not.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::InvalidParameter`] if the threshold band is
    /// empty on any channel.
    pub fn validate(&self) -> Result<(), ImagingError> {
        self.threshold.validate()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            grayscale: Self::DEFAULT_GRAYSCALE,
            threshold: Self::DEFAULT_THRESHOLD,
            polarity: Self::DEFAULT_POLARITY,
            morphology: Vec::new(),
            connectivity: Self::DEFAULT_CONNECTIVITY,
        }
    }
}

/// Result of running the full chain, without intermediate buffers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    /// Labeled components in id order.
    pub components: Vec<Component>,

    /// Dimensions of the source buffer.
    pub dimensions: Size,
}

/// Result of running the chain with every intermediate buffer kept.
#[derive(Debug, Clone)]
pub struct StagedResult {
    /// The buffer the pipeline started from.
    pub original: PixelBuffer,
    /// Stage 1: gray buffer.
    pub grayscale: PixelBuffer,
    /// Stage 2: thresholded mask.
    pub binary: PixelBuffer,
    /// Stage 3: mask after morphology (equal to `binary` with no steps).
    pub morphed: PixelBuffer,
    /// Stage 4: label map and components of `morphed`.
    pub labeling: Labeling,
}

impl StagedResult {
    /// Dimensions shared by every buffer in the result.
    #[must_use]
    pub const fn dimensions(&self) -> Size {
        self.original.size()
    }

    /// Drop the buffers, keeping components and dimensions.
    #[must_use]
    pub fn into_process_result(self) -> ProcessResult {
        let dimensions = self.dimensions();
        ProcessResult {
            components: self.labeling.into_components(),
            dimensions,
        }
    }
}

/// Errors raised by the imaging core.
///
/// All variants are local and recoverable by the caller. Validation always
/// happens before any output is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ImagingError {
    /// A coordinate lies outside `[0, width) x [0, height)`.
    #[error("coordinate ({x}, {y}) is outside the {width}x{height} buffer")]
    OutOfRange {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },

    /// Declared dimensions do not match the byte length of the data.
    #[error("a {width}x{height} buffer needs {expected} bytes, got {actual}")]
    BufferLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// Two buffers that must share dimensions do not.
    #[error("buffer dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: Size, right: Size },

    /// A selector or parameter holds an unsupported value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The input is too small for the operation to mean anything.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn size_pixel_count_does_not_overflow_u32() {
        let s = Size::new(100_000, 100_000);
        assert_eq!(s.pixel_count(), 10_000_000_000);
    }

    #[test]
    fn size_is_empty() {
        assert!(Size::new(0, 5).is_empty());
        assert!(Size::new(5, 0).is_empty());
        assert!(!Size::new(1, 1).is_empty());
    }

    #[test]
    fn rgb_to_bgra_orders_blue_first() {
        assert_eq!(Rgb::new(1, 2, 3).to_bgra(), [3, 2, 1, 255]);
        assert_eq!(Rgb::RED.to_bgra(), [0, 0, 255, 255]);
    }

    #[test]
    fn error_out_of_range_display() {
        let err = ImagingError::OutOfRange {
            x: -1,
            y: 3,
            width: 4,
            height: 4,
        };
        assert_eq!(
            err.to_string(),
            "coordinate (-1, 3) is outside the 4x4 buffer"
        );
    }

    #[test]
    fn error_dimension_mismatch_display() {
        let err = ImagingError::DimensionMismatch {
            left: Size::new(2, 3),
            right: Size::new(3, 2),
        };
        assert_eq!(err.to_string(), "buffer dimensions differ: 2x3 vs 3x2");
    }

    #[test]
    fn error_serde_round_trip() {
        let err = ImagingError::BufferLength {
            width: 2,
            height: 2,
            expected: 16,
            actual: 15,
        };
        let json = serde_json::to_string(&err).unwrap();
        let back: ImagingError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }

    #[test]
    fn config_defaults_match_constants() {
        let config = PipelineConfig::default();
        assert_eq!(config.grayscale, PipelineConfig::DEFAULT_GRAYSCALE);
        assert_eq!(config.threshold, Threshold::default());
        assert_eq!(config.polarity, Polarity::InsideWhite);
        assert!(config.morphology.is_empty());
        assert_eq!(config.connectivity, Connectivity::Eight);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"polarity": "InsideBlack", "connectivity": "Four"}"#).unwrap();
        assert_eq!(config.polarity, Polarity::InsideBlack);
        assert_eq!(config.connectivity, Connectivity::Four);
        assert_eq!(config.grayscale, PipelineConfig::DEFAULT_GRAYSCALE);
        assert_eq!(config.threshold, PipelineConfig::DEFAULT_THRESHOLD);
    }

    #[test]
    fn config_serde_round_trip() {
        let config = PipelineConfig {
            grayscale: GrayscaleMethod::Max,
            threshold: Threshold::banded(Rgb::new(10, 20, 30), Rgb::new(200, 210, 220)).unwrap(),
            polarity: Polarity::InsideBlack,
            morphology: vec![
                MorphologyStep::erode(crate::morphology::Neighborhood::Cross),
                MorphologyStep::dilate(crate::morphology::Neighborhood::Square { radius: 2 }),
            ],
            connectivity: Connectivity::Four,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn config_validate_rejects_empty_band() {
        let config = PipelineConfig {
            threshold: Threshold {
                min: Rgb::gray(200),
                max: Rgb::gray(100),
            },
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ImagingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn point_display() {
        assert_eq!(Point::new(-2, 7).to_string(), "(-2, 7)");
    }
}
