//! Pipeline diagnostics: timing and counts for each stage.
//!
//! Every call to [`process_staged`](crate::process_staged) collects these
//! alongside the staged buffers. Timestamps come from the `web-time` crate
//! (`performance.now()` on WASM, `std::time::Instant` elsewhere).
//!
//! Durations are serialized as fractional seconds (`f64`) since
//! `std::time::Duration` does not implement serde traits.

use std::fmt::Write as _;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::binarize::Polarity;
use crate::buffer::{BLUE, PixelBuffer};
use crate::grayscale::GrayscaleMethod;
use crate::label::Connectivity;

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|e| serde::de::Error::custom(format!("bad duration {secs}: {e}")))
    }
}

/// Timing and counts from one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: grayscale reduction.
    pub grayscale: StageDiagnostics,
    /// Stage 2: thresholding.
    pub binarize: StageDiagnostics,
    /// Stage 3: erode/dilate chain (timed even when it has no steps).
    pub morphology: StageDiagnostics,
    /// Stage 4: component labeling.
    pub labeling: StageDiagnostics,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Whole-run counts.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock time spent in the stage.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageMetrics {
    Grayscale {
        method: GrayscaleMethod,
        width: u32,
        height: u32,
    },
    Binarize {
        polarity: Polarity,
        /// White pixels in the mask.
        foreground_pixel_count: u64,
        total_pixel_count: u64,
    },
    Morphology {
        /// Number of erode/dilate steps applied.
        steps: usize,
        foreground_before: u64,
        foreground_after: u64,
    },
    Labeling {
        connectivity: Connectivity,
        component_count: usize,
        /// Area of the largest component, 0 when there are none.
        largest_area: u64,
    },
}

/// High-level summary for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub image_width: u32,
    pub image_height: u32,
    pub pixel_count: u64,
    pub component_count: usize,
    pub largest_component_area: u64,
}

impl PipelineDiagnostics {
    /// Every stage with its display name, in execution order.
    #[must_use]
    pub const fn stages(&self) -> [(&'static str, &StageDiagnostics); 4] {
        [
            ("Grayscale", &self.grayscale),
            ("Binarize", &self.binarize),
            ("Morphology", &self.morphology),
            ("Labeling", &self.labeling),
        ]
    }

    /// Render a fixed-width table of stage timings and metrics.
    #[must_use]
    pub fn report(&self) -> String {
        let total_ms = millis(self.total_duration);
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "pixmask run: {}x{}, {} pixels",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count
        );
        let _ = writeln!(out, "{:<12} {:>10} {:>7}  metrics", "stage", "ms", "share");
        let _ = writeln!(out, "{}", "-".repeat(72));
        for (name, stage) in self.stages() {
            let ms = millis(stage.duration);
            let share = if total_ms > 0.0 { ms / total_ms * 100.0 } else { 0.0 };
            let _ = writeln!(
                out,
                "{name:<12} {ms:>10.3} {share:>6.1}%  {}",
                format_metrics(&stage.metrics)
            );
        }
        let _ = writeln!(out, "{:<12} {total_ms:>10.3}", "total");
        let _ = write!(
            out,
            "Components: {}, largest area {}",
            self.summary.component_count, self.summary.largest_component_area
        );
        out
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Grayscale {
            method,
            width,
            height,
        } => format!("{method:?} {width}x{height}"),
        StageMetrics::Binarize {
            polarity,
            foreground_pixel_count,
            total_pixel_count,
        } => format!(
            "{polarity:?} foreground={foreground_pixel_count} ({:.1}%)",
            percent(*foreground_pixel_count, *total_pixel_count),
        ),
        StageMetrics::Morphology {
            steps,
            foreground_before,
            foreground_after,
        } => format!("{steps} steps, foreground {foreground_before}->{foreground_after}"),
        StageMetrics::Labeling {
            connectivity,
            component_count,
            largest_area,
        } => format!("{connectivity:?} {component_count} components (largest={largest_area})"),
    }
}

/// Count foreground pixels (non-zero blue byte) in a mask.
pub(crate) fn count_foreground(mask: &PixelBuffer) -> u64 {
    mask.pixels().map(|p| u64::from(u8::from(p[BLUE] != 0))).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Rgb;

    fn sample() -> PipelineDiagnostics {
        PipelineDiagnostics {
            grayscale: StageDiagnostics {
                duration: Duration::from_millis(4),
                metrics: StageMetrics::Grayscale {
                    method: GrayscaleMethod::Bt601,
                    width: 100,
                    height: 50,
                },
            },
            binarize: StageDiagnostics {
                duration: Duration::from_millis(3),
                metrics: StageMetrics::Binarize {
                    polarity: Polarity::InsideWhite,
                    foreground_pixel_count: 1250,
                    total_pixel_count: 5000,
                },
            },
            morphology: StageDiagnostics {
                duration: Duration::from_millis(2),
                metrics: StageMetrics::Morphology {
                    steps: 2,
                    foreground_before: 1250,
                    foreground_after: 1100,
                },
            },
            labeling: StageDiagnostics {
                duration: Duration::from_millis(1),
                metrics: StageMetrics::Labeling {
                    connectivity: Connectivity::Eight,
                    component_count: 3,
                    largest_area: 900,
                },
            },
            total_duration: Duration::from_millis(10),
            summary: PipelineSummary {
                image_width: 100,
                image_height: 50,
                pixel_count: 5000,
                component_count: 3,
                largest_component_area: 900,
            },
        }
    }

    #[test]
    fn millis_of_duration() {
        let ms = millis(Duration::from_millis(1234));
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn count_foreground_works() {
        let mut mask = PixelBuffer::new(10, 10);
        for x in 0..5 {
            mask.set_rgb(x, 0, Rgb::WHITE).unwrap();
        }
        mask.set_rgb(0, 9, Rgb::gray(1)).unwrap();
        assert_eq!(count_foreground(&mask), 6);
    }

    #[test]
    fn report_lists_every_stage() {
        let report = sample().report();
        assert!(report.starts_with("pixmask run: 100x50, 5000 pixels"));
        for stage in ["Grayscale", "Binarize", "Morphology", "Labeling"] {
            assert!(report.contains(stage), "missing {stage}");
        }
        assert!(report.contains("foreground=1250 (25.0%)"));
        assert!(report.contains("1250->1100"));
        assert!(report.contains("Components: 3, largest area 900"));
    }

    #[test]
    fn durations_serialize_as_seconds() {
        let json = serde_json::to_value(sample()).unwrap();
        let total = json["total_duration"].as_f64().unwrap();
        assert!((total - 0.010).abs() < 1e-9);

        let back: PipelineDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.total_duration, Duration::from_millis(10));
        assert_eq!(back.summary, sample().summary);
    }

    #[test]
    fn negative_duration_is_rejected() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["total_duration"] = serde_json::json!(-1.0);
        assert!(serde_json::from_value::<PipelineDiagnostics>(json).is_err());
    }
}
