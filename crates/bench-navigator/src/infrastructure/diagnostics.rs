//! BMP snapshots of the device screen.

use std::fs;
use std::path::PathBuf;

use bench_core::Frame;
use image::ImageFormat;

use crate::application::navigate::{SnapshotError, SnapshotStore};

/// Writes frames as `<dir>/<name>.bmp`, optionally upscaled for reading on a
/// desktop monitor.
pub struct BmpSnapshotStore {
    dir: PathBuf,
    scale: u32,
}

impl BmpSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            scale: 1,
        }
    }

    /// Nearest-neighbour scale factor applied before writing.
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale.max(1);
        self
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

impl SnapshotStore for BmpSnapshotStore {
    fn save(&self, name: &str, frame: &Frame) -> Result<PathBuf, SnapshotError> {
        fs::create_dir_all(&self.dir).map_err(|source| SnapshotError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;
        let file = if name.ends_with(".bmp") {
            name.to_string()
        } else {
            format!("{name}.bmp")
        };
        let path = self.dir.join(file);
        frame
            .upscaled(self.scale)
            .save_with_format(&path, ImageFormat::Bmp)
            .map_err(|source| SnapshotError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}
