//! pixmask-io: decoding, encoding and display for pixmask buffers.
//!
//! The processing core works on BGRA [`PixelBuffer`]s and never touches
//! files or codecs. This crate is the boundary: it turns images the
//! `image` crate can read (PNG, JPEG, BMP, WebP) into buffers and back,
//! swapping red and blue with `garb`, and defines the [`Monitor`] trait
//! that display surfaces implement.

pub mod codec;
pub mod monitor;

pub use codec::{decode, encode, encode_png, load, load_from_memory, save};
pub use monitor::{Monitor, SnapshotMonitor};
pub use pixmask_pipeline::PixelBuffer;

use pixmask_pipeline::ImagingError;

/// Errors raised at the IO boundary.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// The `image` crate failed to decode or encode.
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    /// Reading or writing a file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The processing core rejected the data.
    #[error(transparent)]
    Imaging(#[from] ImagingError),

    /// Channel swizzling was handed a slice that is not whole pixels.
    #[error("pixel swizzle failed: {0}")]
    Swizzle(String),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,
}
