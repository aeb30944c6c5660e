//! Display boundary.
//!
//! A [`Monitor`] is anything that can present a decoded image: a window, a
//! terminal preview, or a directory of files. The processing core never
//! calls a monitor itself; front ends push encoded buffers into one.

use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::IoError;

/// A surface that shows one image at a time.
pub trait Monitor {
    /// Present `image`, replacing whatever was shown before.
    ///
    /// # Errors
    ///
    /// Returns an [`IoError`] if the surface cannot present the image.
    fn show(&mut self, image: &RgbaImage) -> Result<(), IoError>;

    /// Present `image` tagged with the pipeline stage it came from.
    ///
    /// # Errors
    ///
    /// As [`Monitor::show`].
    fn show_stage(&mut self, stage: &str, image: &RgbaImage) -> Result<(), IoError> {
        let _ = stage;
        self.show(image)
    }

    /// Remove the current image.
    fn clear(&mut self);
}

/// A [`Monitor`] that writes every shown image as a numbered PNG.
///
/// Files are named `NN.png`, or `NN-stage.png` through
/// [`Monitor::show_stage`]. Clearing forgets the current frame but keeps
/// files already written.
#[derive(Debug)]
pub struct SnapshotMonitor {
    dir: PathBuf,
    written: Vec<PathBuf>,
    current: Option<PathBuf>,
}

impl SnapshotMonitor {
    /// Write snapshots into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Io`] if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, IoError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            written: Vec::new(),
            current: None,
        })
    }

    /// The snapshot directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every file written so far, in order.
    #[must_use]
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// The file currently shown, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    fn write(&mut self, name: &str, image: &RgbaImage) -> Result<(), IoError> {
        let path = self.dir.join(name);
        image.save(&path)?;
        log::info!("snapshot {}", path.display());
        self.written.push(path.clone());
        self.current = Some(path);
        Ok(())
    }
}

impl Monitor for SnapshotMonitor {
    fn show(&mut self, image: &RgbaImage) -> Result<(), IoError> {
        let name = format!("{:02}.png", self.written.len());
        self.write(&name, image)
    }

    fn show_stage(&mut self, stage: &str, image: &RgbaImage) -> Result<(), IoError> {
        let slug: String = stage
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect();
        let name = format!("{:02}-{slug}.png", self.written.len());
        self.write(&name, image)
    }

    fn clear(&mut self) {
        self.current = None;
    }
}
