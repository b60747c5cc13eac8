//! Loads reference bitmaps from disk.
//!
//! Every readable image file in the directory becomes one template named
//! after its file stem, so `browser_Run in app.png` is the template
//! `browser_Run in app`.  Images are converted to grayscale on load.  Files
//! the `image` crate cannot read (by extension) are skipped with a warning;
//! a file that claims an image extension but fails to decode is an error.

use std::fs;
use std::path::{Path, PathBuf};

use bench_core::{Template, TemplateLibrary};
use image::ImageFormat;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum TemplateLoadError {
    #[error("cannot read template directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode template {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Loads every image in `dir` (not recursive) into a library.
pub fn load_template_dir(dir: &Path) -> Result<TemplateLibrary, TemplateLoadError> {
    let read_dir_error = |source| TemplateLoadError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut templates = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_error)? {
        let path = entry.map_err(read_dir_error)?.path();
        if !path.is_file() {
            continue;
        }
        let readable = ImageFormat::from_path(&path)
            .map(|format| format.reading_enabled())
            .unwrap_or(false);
        if !readable {
            warn!(path = %path.display(), "skipping non-image file");
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            warn!(path = %path.display(), "skipping file with non-UTF-8 name");
            continue;
        };
        let name = name.to_string();
        let image = image::open(&path)
            .map_err(|source| TemplateLoadError::Decode {
                path: path.clone(),
                source,
            })?
            .to_luma8();
        templates.push(Template::new(name, image));
    }

    let library: TemplateLibrary = templates.into_iter().collect();
    info!(dir = %dir.display(), count = library.len(), "templates loaded");
    Ok(library)
}
