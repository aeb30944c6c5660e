//! pixmask-bench: CLI tool for threshold and morphology experimentation.
//!
//! Runs the pixel pipeline on an image file with configurable parameters,
//! printing per-stage diagnostics and the labeled components. Useful for:
//!
//! - Tuning the threshold band and polarity for a kind of scan
//! - Comparing erode/dilate chains and neighborhood sizes
//! - Checking how connectivity changes the component count
//! - Measuring per-stage durations
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin pixmask-bench -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use pixmask_io::{Monitor, SnapshotMonitor};
use pixmask_pipeline::{
    Component, MorphologyStep, Neighborhood, PipelineConfig, PipelineDiagnostics, Rgb,
    StagedResult, Threshold,
};
use serde::Serialize;

/// Threshold, morphology and labeling diagnostics for pixmask.
///
/// Loads an image, binarizes it against a color band, runs an optional
/// erode/dilate chain and labels the connected foreground regions.
#[derive(Parser)]
#[command(name = "pixmask-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Grayscale reduction method.
    #[arg(long, value_enum, default_value_t = Gray::Bt601)]
    grayscale: Gray,

    /// Upper bound of the threshold band, as `r,g,b` or a single gray level.
    #[arg(long, value_parser = parse_rgb, default_value = "127")]
    max: Rgb,

    /// Lower bound of the threshold band, as `r,g,b` or a single gray level.
    #[arg(long, value_parser = parse_rgb, default_value = "0")]
    min: Rgb,

    /// Which side of the band becomes foreground.
    #[arg(long, value_enum, default_value_t = Side::InsideWhite)]
    polarity: Side,

    /// Number of erosion steps (run before any dilation).
    #[arg(long, default_value_t = 0)]
    erode: usize,

    /// Number of dilation steps.
    #[arg(long, default_value_t = 0)]
    dilate: usize,

    /// Square neighborhood radius for erode/dilate. Omit for the 4-neighbor cross.
    #[arg(long)]
    radius: Option<u32>,

    /// Labeling connectivity (4 or 8).
    #[arg(long, default_value_t = 8, value_parser = clap::builder::RangedU64ValueParser::<u8>::new().range(4..=8))]
    connectivity: u8,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Write the input with component boxes and centroids drawn on it.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Write every intermediate stage as a numbered PNG into this directory.
    #[arg(long)]
    snapshots: Option<PathBuf>,

    /// Output diagnostics and components as JSON instead of a report.
    #[arg(long)]
    json: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Grayscale method selection.
#[derive(Clone, Copy, ValueEnum)]
enum Gray {
    /// Plain mean of R, G and B.
    Average,
    /// ITU-R BT.601 luma.
    Bt601,
    /// ITU-R BT.709 luma.
    Bt709,
    /// R/4 + G/2 + B/4.
    Quarter,
    /// Brightest channel.
    Max,
    /// Darkest channel.
    Min,
}

/// Polarity selection.
#[derive(Clone, Copy, ValueEnum)]
enum Side {
    /// Pixels inside the band become white foreground.
    InsideWhite,
    /// Pixels outside the band become white foreground.
    InsideBlack,
}

/// Parse `r,g,b` or a single gray level.
fn parse_rgb(s: &str) -> Result<Rgb, String> {
    let channels = s
        .split(',')
        .map(|part| part.trim().parse::<u8>().map_err(|e| format!("{part:?}: {e}")))
        .collect::<Result<Vec<u8>, String>>()?;
    match channels.as_slice() {
        [v] => Ok(Rgb::gray(*v)),
        [r, g, b] => Ok(Rgb::new(*r, *g, *b)),
        _ => Err(format!("expected `r,g,b` or one value, got {s:?}")),
    }
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.  Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    let config: PipelineConfig = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        let neighborhood = cli
            .radius
            .map_or(Neighborhood::Cross, |radius| Neighborhood::Square { radius });
        let morphology = std::iter::repeat_n(MorphologyStep::erode(neighborhood), cli.erode)
            .chain(std::iter::repeat_n(MorphologyStep::dilate(neighborhood), cli.dilate))
            .collect();
        PipelineConfig {
            grayscale: match cli.grayscale {
                Gray::Average => pixmask_pipeline::GrayscaleMethod::Average,
                Gray::Bt601 => pixmask_pipeline::GrayscaleMethod::Bt601,
                Gray::Bt709 => pixmask_pipeline::GrayscaleMethod::Bt709,
                Gray::Quarter => pixmask_pipeline::GrayscaleMethod::WeightedQuarter,
                Gray::Max => pixmask_pipeline::GrayscaleMethod::Max,
                Gray::Min => pixmask_pipeline::GrayscaleMethod::Min,
            },
            threshold: Threshold {
                min: cli.min,
                max: cli.max,
            },
            polarity: match cli.polarity {
                Side::InsideWhite => pixmask_pipeline::Polarity::InsideWhite,
                Side::InsideBlack => pixmask_pipeline::Polarity::InsideBlack,
            },
            morphology,
            connectivity: pixmask_pipeline::Connectivity::try_from(cli.connectivity)
                .map_err(|e| format!("Error in --connectivity: {e}"))?,
        }
    };
    config.validate().map_err(|e| format!("Invalid config: {e}"))?;
    Ok(config)
}

/// What `--json` prints for one run.
#[derive(Serialize)]
struct JsonRun<'a> {
    diagnostics: &'a PipelineDiagnostics,
    components: &'a [Component],
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let buffer = match pixmask_io::load(&cli.image_path) {
        Ok(buffer) => buffer,
        Err(e) => {
            eprintln!("Error loading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!("Image: {} ({})", cli.image_path.display(), buffer.size());
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        let (staged, diagnostics) = match pixmask_pipeline::process_staged(buffer.clone(), &config) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        };

        if cli.json {
            let out = JsonRun {
                diagnostics: &diagnostics,
                components: staged.labeling.components(),
            };
            match serde_json::to_string_pretty(&out) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing diagnostics: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            println!("{}", diagnostics.report());
            print_components(staged.labeling.components());
        }

        // Side outputs on the first run only.
        if run == 0 {
            if let Some(ref path) = cli.overlay
                && let Err(msg) = write_overlay(&staged, path)
            {
                eprintln!("{msg}");
                return ExitCode::FAILURE;
            }
            if let Some(ref dir) = cli.snapshots
                && let Err(msg) = write_snapshots(&staged, dir)
            {
                eprintln!("{msg}");
                return ExitCode::FAILURE;
            }
        }

        all_diagnostics.push(diagnostics);

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

fn print_components(components: &[Component]) {
    println!();
    println!(
        "{:>4}  {:>11}  {:>11}  {:>8}  {:>11}",
        "id", "top-left", "size", "area", "centroid"
    );
    println!("{}", "-".repeat(53));
    for c in components {
        println!(
            "{:>4}  {:>11}  {:>11}  {:>8}  {:>11}",
            c.id,
            format!("({},{})", c.top_left.x, c.top_left.y),
            c.size.to_string(),
            c.area,
            format!("({},{})", c.centroid.x, c.centroid.y),
        );
    }
}

fn write_overlay(staged: &StagedResult, path: &Path) -> Result<(), String> {
    let overlay = pixmask_pipeline::annotate(&staged.original, &staged.labeling, Rgb::RED, Rgb::GREEN)
        .map_err(|e| format!("Error drawing overlay: {e}"))?;
    pixmask_io::save(&overlay, path)
        .map_err(|e| format!("Error writing overlay to {}: {e}", path.display()))?;
    eprintln!("Overlay written to {}", path.display());
    Ok(())
}

fn write_snapshots(staged: &StagedResult, dir: &Path) -> Result<(), String> {
    let mut monitor = SnapshotMonitor::new(dir)
        .map_err(|e| format!("Error creating {}: {e}", dir.display()))?;
    let stages = [
        ("original", &staged.original),
        ("grayscale", &staged.grayscale),
        ("binary", &staged.binary),
        ("morphed", &staged.morphed),
    ];
    for (name, buffer) in stages {
        pixmask_io::encode(buffer)
            .and_then(|image| monitor.show_stage(name, &image))
            .map_err(|e| format!("Error writing {name} snapshot: {e}"))?;
    }
    log::info!("{} snapshots in {}", monitor.written().len(), dir.display());
    eprintln!("Snapshots written to {}", dir.display());
    Ok(())
}

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    let Some(first) = all_diagnostics.first() else {
        return;
    };
    let runs = all_diagnostics.len() as f64;

    let totals: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();
    let min = totals.iter().copied().fold(f64::INFINITY, f64::min);
    let max = totals.iter().copied().fold(0.0, f64::max);
    let mean = totals.iter().sum::<f64>() / runs;

    println!();
    println!("{} runs: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms", all_diagnostics.len());
    println!("{:<12} {:>10}", "stage", "mean ms");
    for (index, (name, _)) in first.stages().iter().enumerate() {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| d.stages()[index].1.duration.as_secs_f64() * 1000.0)
            .sum::<f64>()
            / runs;
        println!("{name:<12} {stage_mean:>10.3}");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pixmask-bench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_pipeline_defaults() {
        let config = config_from_cli(&cli(&["in.png"])).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn flags_build_a_config() {
        let config = config_from_cli(&cli(&[
            "in.png",
            "--grayscale",
            "min",
            "--min",
            "10,20,30",
            "--max",
            "200",
            "--polarity",
            "inside-black",
            "--erode",
            "1",
            "--dilate",
            "2",
            "--radius",
            "3",
            "--connectivity",
            "4",
        ]))
        .unwrap();
        assert_eq!(config.grayscale, pixmask_pipeline::GrayscaleMethod::Min);
        assert_eq!(config.threshold.min, Rgb::new(10, 20, 30));
        assert_eq!(config.threshold.max, Rgb::gray(200));
        assert_eq!(config.polarity, pixmask_pipeline::Polarity::InsideBlack);
        let square = Neighborhood::Square { radius: 3 };
        assert_eq!(
            config.morphology,
            vec![
                MorphologyStep::erode(square),
                MorphologyStep::dilate(square),
                MorphologyStep::dilate(square),
            ]
        );
        assert_eq!(config.connectivity, pixmask_pipeline::Connectivity::Four);
    }

    #[test]
    fn odd_connectivity_is_rejected() {
        assert!(config_from_cli(&cli(&["in.png", "--connectivity", "6"])).is_err());
    }

    #[test]
    fn empty_band_is_rejected() {
        assert!(config_from_cli(&cli(&["in.png", "--min", "200", "--max", "100"])).is_err());
    }

    #[test]
    fn config_json_overrides_flags() {
        let config = config_from_cli(&cli(&[
            "in.png",
            "--erode",
            "3",
            "--config-json",
            r#"{"connectivity":"Four"}"#,
        ]))
        .unwrap();
        assert!(config.morphology.is_empty());
        assert_eq!(config.connectivity, pixmask_pipeline::Connectivity::Four);
    }

    #[test]
    fn rgb_parsing() {
        assert_eq!(parse_rgb("1, 2, 3").unwrap(), Rgb::new(1, 2, 3));
        assert_eq!(parse_rgb("9").unwrap(), Rgb::gray(9));
        assert!(parse_rgb("1,2").is_err());
        assert!(parse_rgb("300").is_err());
    }
}
