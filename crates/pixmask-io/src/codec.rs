//! Conversion between `image::RgbaImage` and BGRA [`PixelBuffer`]s.
//!
//! The two layouts differ only in the order of the red and blue bytes, so
//! both directions are one copy plus an in-place swap.

use std::path::Path;

use image::{ImageEncoder, RgbaImage};
use pixmask_pipeline::{ImagingError, PixelBuffer};

use crate::IoError;

/// Convert an RGBA image into a BGRA buffer.
///
/// # Errors
///
/// Returns [`IoError::Swizzle`] if the image data is not whole pixels, or
/// [`IoError::Imaging`] if its length disagrees with its dimensions.
pub fn decode(image: &RgbaImage) -> Result<PixelBuffer, IoError> {
    let (width, height) = image.dimensions();
    let mut data = image.as_raw().clone();
    garb::bytes::rgba_to_bgra_inplace(&mut data)
        .map_err(|_| IoError::Swizzle(format!("{} bytes is not whole RGBA pixels", data.len())))?;
    Ok(PixelBuffer::from_raw(width, height, data)?)
}

/// Convert a BGRA buffer into an RGBA image.
///
/// # Errors
///
/// Returns [`IoError::Swizzle`] if the buffer is not whole pixels.
pub fn encode(buffer: &PixelBuffer) -> Result<RgbaImage, IoError> {
    let mut data = buffer.as_bytes().to_vec();
    garb::bytes::bgra_to_rgba_inplace(&mut data)
        .map_err(|_| IoError::Swizzle(format!("{} bytes is not whole BGRA pixels", data.len())))?;
    let actual = data.len();
    RgbaImage::from_raw(buffer.width(), buffer.height(), data).ok_or_else(|| {
        IoError::Imaging(ImagingError::BufferLength {
            width: buffer.width(),
            height: buffer.height(),
            expected: buffer.as_bytes().len(),
            actual,
        })
    })
}

/// Decode image file bytes (PNG, JPEG, BMP, WebP) into a buffer.
///
/// # Errors
///
/// Returns [`IoError::EmptyInput`] if `bytes` is empty.
/// Returns [`IoError::Image`] if the format is unrecognized or the data is
/// corrupt.
pub fn load_from_memory(bytes: &[u8]) -> Result<PixelBuffer, IoError> {
    if bytes.is_empty() {
        return Err(IoError::EmptyInput);
    }
    let image = image::load_from_memory(bytes)?.to_rgba8();
    log::debug!("decoded {}x{} image from {} bytes", image.width(), image.height(), bytes.len());
    decode(&image)
}

/// Read and decode an image file.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the file cannot be read, otherwise as
/// [`load_from_memory`].
pub fn load(path: impl AsRef<Path>) -> Result<PixelBuffer, IoError> {
    let bytes = std::fs::read(path.as_ref())?;
    load_from_memory(&bytes)
}

/// Encode a buffer as PNG bytes.
///
/// # Errors
///
/// Returns [`IoError::Image`] if PNG encoding fails.
pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>, IoError> {
    let image = encode(buffer)?;
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(png_bytes)
}

/// Write a buffer to `path`, choosing the format from the extension.
///
/// # Errors
///
/// Returns [`IoError::Image`] for an unsupported extension or a write
/// failure.
pub fn save(buffer: &PixelBuffer, path: impl AsRef<Path>) -> Result<(), IoError> {
    let path = path.as_ref();
    encode(buffer)?.save(path)?;
    log::debug!("wrote {}x{} buffer to {}", buffer.width(), buffer.height(), path.display());
    Ok(())
}
