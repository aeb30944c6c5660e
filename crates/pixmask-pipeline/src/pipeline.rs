//! Incremental pipeline: advance stage by stage, inspecting each
//! intermediate buffer before continuing.
//!
//! Unlike [`crate::process_staged`], which runs the whole chain in one
//! call, [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use pixmask_pipeline::{ImagingError, PixelBuffer, Pipeline, PipelineConfig};
//! # fn run(buffer: PixelBuffer) -> Result<(), ImagingError> {
//! let staged = Pipeline::new(buffer, PipelineConfig::default())
//!     .grayscale()
//!     .binarize()?
//!     .morphology()
//!     .label()?
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next state (or a
//! `Result` for fallible stages), carrying every earlier buffer along.
//!
//! # Memory
//!
//! By the final stage four full-size buffers plus a `u32` label map are
//! held at once. Callers that only want the components should use
//! [`crate::process`], which drops the buffers as it goes.

use crate::binarize;
use crate::buffer::PixelBuffer;
use crate::diagnostics::{StageMetrics, count_foreground};
use crate::draw;
use crate::grayscale;
use crate::label::{self, Labeling};
use crate::morphology;
use crate::types::{ImagingError, PipelineConfig, Point, Rgb, Size, StagedResult};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing.
#[must_use = "pipeline stages are consumed by advancing; call .grayscale() to continue"]
pub struct Pending {
    config: PipelineConfig,
    original: PixelBuffer,
}

impl Pending {
    /// The source buffer.
    #[must_use]
    pub const fn original(&self) -> &PixelBuffer {
        &self.original
    }

    /// Reduce to gray and advance to [`Grayscaled`].
    pub fn grayscale(self) -> Grayscaled {
        let gray = grayscale::grayscale(&self.original, self.config.grayscale);
        log::debug!(
            "grayscale {:?} on {}",
            self.config.grayscale,
            self.original.size()
        );
        Grayscaled {
            config: self.config,
            original: self.original,
            gray,
        }
    }
}

// ───────────────────────── Stage 1: Grayscaled ───────────────────────

/// Pipeline state after grayscale reduction.
#[must_use = "pipeline stages are consumed by advancing; call .binarize() to continue"]
pub struct Grayscaled {
    config: PipelineConfig,
    original: PixelBuffer,
    gray: PixelBuffer,
}

impl Grayscaled {
    /// The gray buffer.
    #[must_use]
    pub const fn gray(&self) -> &PixelBuffer {
        &self.gray
    }

    /// Metrics for this stage.
    #[must_use]
    pub const fn metrics(&self) -> StageMetrics {
        StageMetrics::Grayscale {
            method: self.config.grayscale,
            width: self.gray.width(),
            height: self.gray.height(),
        }
    }

    /// Threshold the gray buffer and advance to [`Binarized`].
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::InvalidParameter`] if the configured
    /// threshold band is empty on any channel.
    pub fn binarize(self) -> Result<Binarized, ImagingError> {
        let binary = binarize::binarize(&self.gray, &self.config.threshold, self.config.polarity)?;
        let foreground = count_foreground(&binary);
        log::debug!(
            "binarized with {:?}: {foreground} foreground pixels",
            self.config.polarity
        );
        Ok(Binarized {
            config: self.config,
            original: self.original,
            gray: self.gray,
            binary,
            foreground,
        })
    }
}

// ───────────────────────── Stage 2: Binarized ────────────────────────

/// Pipeline state after thresholding.
#[must_use = "pipeline stages are consumed by advancing; call .morphology() to continue"]
pub struct Binarized {
    config: PipelineConfig,
    original: PixelBuffer,
    gray: PixelBuffer,
    binary: PixelBuffer,
    foreground: u64,
}

impl Binarized {
    /// The thresholded mask.
    #[must_use]
    pub const fn binary(&self) -> &PixelBuffer {
        &self.binary
    }

    /// Metrics for this stage.
    #[must_use]
    pub const fn metrics(&self) -> StageMetrics {
        StageMetrics::Binarize {
            polarity: self.config.polarity,
            foreground_pixel_count: self.foreground,
            total_pixel_count: self.binary.size().pixel_count(),
        }
    }

    /// Run the configured erode/dilate steps and advance to [`Morphed`].
    pub fn morphology(self) -> Morphed {
        let morphed = morphology::apply_steps(&self.binary, &self.config.morphology);
        let foreground_after = count_foreground(&morphed);
        log::debug!(
            "morphology: {} steps, foreground {} -> {foreground_after}",
            self.config.morphology.len(),
            self.foreground,
        );
        Morphed {
            config: self.config,
            original: self.original,
            gray: self.gray,
            binary: self.binary,
            morphed,
            foreground_before: self.foreground,
            foreground_after,
        }
    }
}

// ───────────────────────── Stage 3: Morphed ──────────────────────────

/// Pipeline state after morphology.
#[must_use = "pipeline stages are consumed by advancing; call .label() to continue"]
pub struct Morphed {
    config: PipelineConfig,
    original: PixelBuffer,
    gray: PixelBuffer,
    binary: PixelBuffer,
    morphed: PixelBuffer,
    foreground_before: u64,
    foreground_after: u64,
}

impl Morphed {
    /// The mask after every morphology step.
    #[must_use]
    pub const fn morphed(&self) -> &PixelBuffer {
        &self.morphed
    }

    /// Metrics for this stage.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Morphology {
            steps: self.config.morphology.len(),
            foreground_before: self.foreground_before,
            foreground_after: self.foreground_after,
        }
    }

    /// Label connected components and advance to [`Labeled`].
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::DegenerateInput`] if the mask has no pixels.
    pub fn label(self) -> Result<Labeled, ImagingError> {
        let labeling = label::label_components(&self.morphed, self.config.connectivity)?;
        Ok(Labeled {
            config: self.config,
            original: self.original,
            gray: self.gray,
            binary: self.binary,
            morphed: self.morphed,
            labeling,
        })
    }
}

// ───────────────────────── Stage 4: Labeled ──────────────────────────

/// Final pipeline state.
#[must_use = "call .into_result() to extract the StagedResult"]
pub struct Labeled {
    config: PipelineConfig,
    original: PixelBuffer,
    gray: PixelBuffer,
    binary: PixelBuffer,
    morphed: PixelBuffer,
    labeling: Labeling,
}

impl Labeled {
    /// The labeling of the morphed mask.
    #[must_use]
    pub const fn labeling(&self) -> &Labeling {
        &self.labeling
    }

    /// Metrics for this stage.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Labeling {
            connectivity: self.config.connectivity,
            component_count: self.labeling.len(),
            largest_area: self.labeling.largest().map_or(0, |c| c.area),
        }
    }

    /// Consume the pipeline and return every intermediate.
    #[must_use]
    pub fn into_result(self) -> StagedResult {
        StagedResult {
            original: self.original,
            grayscale: self.gray,
            binary: self.binary,
            morphed: self.morphed,
            labeling: self.labeling,
        }
    }
}

/// Entry point for the staged API.
pub struct Pipeline;

impl Pipeline {
    /// Store `buffer` and `config` without processing anything.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(buffer: PixelBuffer, config: PipelineConfig) -> Pending {
        Pending {
            config,
            original: buffer,
        }
    }
}

/// Side length of the centroid marker drawn by [`annotate`].
pub const MARKER_SIZE: u32 = 3;

/// Draw each component's bounding box outline in `box_color` and a small
/// square at its centroid in `marker_color`, on a copy of `buffer`.
///
/// # Errors
///
/// Returns [`ImagingError::DimensionMismatch`] if `buffer` is not the size
/// the labeling was computed at.
pub fn annotate(
    buffer: &PixelBuffer,
    labeling: &Labeling,
    box_color: Rgb,
    marker_color: Rgb,
) -> Result<PixelBuffer, ImagingError> {
    let expected = Size::new(labeling.width(), labeling.height());
    if buffer.size() != expected {
        return Err(ImagingError::DimensionMismatch {
            left: buffer.size(),
            right: expected,
        });
    }
    let mut out = buffer.clone();
    for component in labeling.components() {
        draw::draw_box_outline_in_place(&mut out, box_color, component.top_left, component.size)?;
    }
    for component in labeling.components() {
        draw::paint_square_in_place(
            &mut out,
            marker_color,
            component.centroid,
            Size::new(MARKER_SIZE, MARKER_SIZE),
        );
    }
    Ok(out)
}

/// Centroid of every component, in id order.
#[must_use]
pub fn centroids(labeling: &Labeling) -> Vec<Point> {
    labeling.components().iter().map(|c| c.centroid).collect()
}
