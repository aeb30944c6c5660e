//! pixmask-pipeline: pixel-buffer processing core (sans-IO).
//!
//! Turns a BGRA [`PixelBuffer`] into labeled connected components through:
//! grayscale -> binarize -> erode/dilate -> two-pass labeling.
//!
//! Boolean combination, overlay drawing, cropping, whole-mask measures and
//! 3x3 filters are available as standalone operations. Every transform
//! returns a new buffer; `_in_place` variants exist where they save an
//! allocation.
//!
//! This crate has **no I/O dependencies**. Decoding files and converting
//! to and from displayable images lives in `pixmask-io`.

pub mod binarize;
pub mod buffer;
pub mod crop;
pub mod diagnostics;
pub mod draw;
pub mod filter;
pub mod grayscale;
pub mod label;
pub mod logic;
pub mod measure;
pub mod morphology;
pub mod parallel;
pub mod pipeline;
pub mod types;

pub use binarize::{Polarity, Threshold};
pub use buffer::PixelBuffer;
pub use diagnostics::PipelineDiagnostics;
pub use grayscale::GrayscaleMethod;
pub use label::{Component, Connectivity, Labeling};
pub use morphology::{MorphOp, MorphologyStep, Neighborhood};
pub use pipeline::{Pipeline, annotate};
pub use types::{ImagingError, PipelineConfig, Point, ProcessResult, Rgb, Size, StagedResult};

use diagnostics::{PipelineSummary, StageDiagnostics};

/// Run the full chain and keep only the components.
///
/// # Pipeline steps
///
/// 1. Grayscale reduction with `config.grayscale`
/// 2. Threshold against `config.threshold` with `config.polarity`
/// 3. Each of `config.morphology` in order
/// 4. Connected-component labeling with `config.connectivity`
///
/// # Errors
///
/// Returns [`ImagingError::InvalidParameter`] for an empty threshold band.
/// Returns [`ImagingError::DegenerateInput`] if `buffer` has no pixels.
pub fn process(buffer: &PixelBuffer, config: &PipelineConfig) -> Result<ProcessResult, ImagingError> {
    let gray = grayscale::grayscale(buffer, config.grayscale);
    let binary = binarize::binarize(&gray, &config.threshold, config.polarity)?;
    drop(gray);
    let morphed = morphology::apply_steps(&binary, &config.morphology);
    drop(binary);
    let labeling = label::label_components(&morphed, config.connectivity)?;
    Ok(ProcessResult {
        components: labeling.into_components(),
        dimensions: buffer.size(),
    })
}

/// Run the full chain keeping every intermediate, with per-stage diagnostics.
///
/// # Errors
///
/// Same as [`process`].
pub fn process_staged(
    buffer: PixelBuffer,
    config: &PipelineConfig,
) -> Result<(StagedResult, PipelineDiagnostics), ImagingError> {
    let start = web_time::Instant::now();
    let size = buffer.size();

    let t = web_time::Instant::now();
    let stage = Pipeline::new(buffer, config.clone()).grayscale();
    let grayscale = StageDiagnostics {
        duration: t.elapsed(),
        metrics: stage.metrics(),
    };

    let t = web_time::Instant::now();
    let stage = stage.binarize()?;
    let binarize = StageDiagnostics {
        duration: t.elapsed(),
        metrics: stage.metrics(),
    };

    let t = web_time::Instant::now();
    let stage = stage.morphology();
    let morphology = StageDiagnostics {
        duration: t.elapsed(),
        metrics: stage.metrics(),
    };

    let t = web_time::Instant::now();
    let stage = stage.label()?;
    let labeling = StageDiagnostics {
        duration: t.elapsed(),
        metrics: stage.metrics(),
    };

    let summary = PipelineSummary {
        image_width: size.width,
        image_height: size.height,
        pixel_count: size.pixel_count(),
        component_count: stage.labeling().len(),
        largest_component_area: stage.labeling().largest().map_or(0, |c| c.area),
    };
    let diagnostics = PipelineDiagnostics {
        grayscale,
        binarize,
        morphology,
        labeling,
        total_duration: start.elapsed(),
        summary,
    };
    log::debug!(
        "processed {size}: {} components in {:?}",
        diagnostics.summary.component_count,
        diagnostics.total_duration
    );
    Ok((stage.into_result(), diagnostics))
}
