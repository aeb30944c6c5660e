//! End-to-end: encoded image bytes in, labeled components and an annotated
//! overlay out.

#![allow(clippy::unwrap_used)]

use image::{ImageEncoder, Rgba, RgbaImage};
use pixmask_io::{Monitor, SnapshotMonitor, encode, encode_png, load, load_from_memory, save};
use pixmask_pipeline::{
    Connectivity, GrayscaleMethod, MorphologyStep, Neighborhood, PipelineConfig, Point, Polarity,
    Rgb, Size, Threshold, annotate, process, process_staged,
};

/// A scanned-form lookalike: off-white paper, two dark marks and a pale red
/// stamp that only a banded threshold picks out.
fn form() -> RgbaImage {
    RgbaImage::from_fn(32, 24, |x, y| {
        if (4..10).contains(&x) && (4..8).contains(&y) {
            Rgba([20, 20, 30, 255])
        } else if (20..28).contains(&x) && (14..20).contains(&y) {
            Rgba([35, 25, 25, 255])
        } else if (14..18).contains(&x) && (2..6).contains(&y) {
            Rgba([230, 150, 150, 255])
        } else {
            Rgba([240, 238, 230, 255])
        }
    })
}

fn png_bytes(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut bytes)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
    bytes
}

#[test]
fn dark_marks_from_png_bytes() {
    let buffer = load_from_memory(&png_bytes(&form())).unwrap();
    assert_eq!(buffer.size(), Size::new(32, 24));

    let result = process(&buffer, &PipelineConfig::default()).unwrap();
    assert_eq!(result.components.len(), 2);

    let first = &result.components[0];
    assert_eq!(first.top_left, Point::new(4, 4));
    assert_eq!(first.size, Size::new(6, 4));
    assert_eq!(first.area, 24);

    let second = &result.components[1];
    assert_eq!(second.top_left, Point::new(20, 14));
    assert_eq!(second.area, 48);
}

#[test]
fn banded_threshold_isolates_the_stamp() {
    let buffer = load_from_memory(&png_bytes(&form())).unwrap();
    let config = PipelineConfig {
        grayscale: GrayscaleMethod::Min,
        threshold: Threshold::banded(Rgb::gray(120), Rgb::gray(180)).unwrap(),
        ..PipelineConfig::default()
    };
    let result = process(&buffer, &config).unwrap();
    assert_eq!(result.components.len(), 1);
    assert_eq!(result.components[0].top_left, Point::new(14, 2));
    assert_eq!(result.components[0].area, 16);
}

#[test]
fn inverted_polarity_sees_the_paper() {
    let buffer = load_from_memory(&png_bytes(&form())).unwrap();
    let config = PipelineConfig {
        polarity: Polarity::InsideBlack,
        connectivity: Connectivity::Four,
        ..PipelineConfig::default()
    };
    let result = process(&buffer, &config).unwrap();
    // paper and stamp merge; the stamp's BT.601 luma is above 127
    assert_eq!(result.components.len(), 1);
    assert_eq!(result.components[0].area, 32 * 24 - 24 - 48);
}

#[test]
fn annotated_overlay_survives_a_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("form.png");
    form().save(&input).unwrap();

    let buffer = load(&input).unwrap();
    let config = PipelineConfig {
        morphology: vec![
            MorphologyStep::erode(Neighborhood::Cross),
            MorphologyStep::dilate(Neighborhood::Cross),
        ],
        ..PipelineConfig::default()
    };
    let (staged, diagnostics) = process_staged(buffer, &config).unwrap();
    assert_eq!(diagnostics.summary.component_count, staged.labeling.len());

    let overlay = annotate(&staged.original, &staged.labeling, Rgb::RED, Rgb::GREEN).unwrap();
    let output = dir.path().join("overlay.png");
    save(&overlay, &output).unwrap();

    let back = image::open(&output).unwrap().to_rgba8();
    for component in staged.labeling.components() {
        let corner = back.get_pixel(
            u32::try_from(component.top_left.x).unwrap(),
            u32::try_from(component.top_left.y).unwrap(),
        );
        assert_eq!(corner.0, [255, 0, 0, 255]);
        let centre = back.get_pixel(
            u32::try_from(component.centroid.x).unwrap(),
            u32::try_from(component.centroid.y).unwrap(),
        );
        assert_eq!(centre.0, [0, 255, 0, 255]);
    }
}

#[test]
fn snapshot_every_stage() {
    let dir = tempfile::tempdir().unwrap();
    let mut monitor = SnapshotMonitor::new(dir.path()).unwrap();

    let buffer = load_from_memory(&png_bytes(&form())).unwrap();
    let (staged, _) = process_staged(buffer, &PipelineConfig::default()).unwrap();
    for (stage, image) in [
        ("original", &staged.original),
        ("grayscale", &staged.grayscale),
        ("binary", &staged.binary),
        ("morphed", &staged.morphed),
    ] {
        monitor.show_stage(stage, &encode(image).unwrap()).unwrap();
    }

    assert_eq!(monitor.written().len(), 4);
    let binary = image::open(&monitor.written()[2]).unwrap().to_rgba8();
    assert_eq!(binary.get_pixel(5, 5).0, [255, 255, 255, 255]);
    assert_eq!(binary.get_pixel(0, 0).0, [0, 0, 0, 255]);
}

#[test]
fn png_encoding_matches_source_pixels() {
    let buffer = load_from_memory(&png_bytes(&form())).unwrap();
    let again = load_from_memory(&encode_png(&buffer).unwrap()).unwrap();
    assert_eq!(again, buffer);
    assert_eq!(encode(&buffer).unwrap(), form());
}
