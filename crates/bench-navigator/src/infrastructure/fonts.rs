//! TrueType text rasterisation with `fontdue`.
//!
//! Each [`FontFace`] the device uses is mapped to a font file and a pixel
//! size.  Glyph coverage is thresholded at 50 % so the output is strictly
//! two-level, like the device's own display.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use bench_core::frame::{INK, PAPER};
use bench_core::recognition::{FontFace, TextRenderer};
use fontdue::{Font, FontSettings};
use image::{GrayImage, Luma};
use thiserror::Error;
use tracing::debug;

/// Coverage at or above this level becomes ink.
const COVERAGE_THRESHOLD: u8 = 128;

#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("cannot read font file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse font for {face:?}: {reason}")]
    Parse { face: FontFace, reason: &'static str },
}

struct LoadedFace {
    font: Font,
    size: f32,
}

impl LoadedFace {
    /// Baseline offset and total line height in pixels.
    fn line(&self) -> (f32, u32) {
        match self.font.horizontal_line_metrics(self.size) {
            Some(m) => (m.ascent, (m.ascent - m.descent).ceil() as u32),
            None => (self.size, self.size.ceil() as u32),
        }
    }
}

/// `TextRenderer` backed by TrueType/OpenType fonts.
#[derive(Default)]
pub struct FontdueRenderer {
    faces: HashMap<FontFace, LoadedFace>,
}

impl FontdueRenderer {
    /// A renderer with no faces; every `rasterize` returns `None`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `face` from raw font bytes at `size` pixels.
    pub fn add_face_bytes(&mut self, face: FontFace, bytes: &[u8], size: f32) -> Result<(), FontLoadError> {
        let settings = FontSettings {
            scale: size,
            ..FontSettings::default()
        };
        let font = Font::from_bytes(bytes, settings)
            .map_err(|reason| FontLoadError::Parse { face, reason })?;
        self.faces.insert(face, LoadedFace { font, size });
        debug!(?face, size, "font face loaded");
        Ok(())
    }

    /// Loads `face` from a font file at `size` pixels.
    pub fn add_face_file(&mut self, face: FontFace, path: &Path, size: f32) -> Result<(), FontLoadError> {
        let bytes = fs::read(path).map_err(|source| FontLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.add_face_bytes(face, &bytes, size)
    }

    pub fn has_face(&self, face: FontFace) -> bool {
        self.faces.contains_key(&face)
    }
}

impl TextRenderer for FontdueRenderer {
    fn rasterize(&self, text: &str, face: FontFace) -> Option<GrayImage> {
        let loaded = self.faces.get(&face)?;
        let (ascent, height) = loaded.line();

        let glyphs: Vec<_> = text
            .chars()
            .map(|c| loaded.font.rasterize(c, loaded.size))
            .collect();
        let width = glyphs
            .iter()
            .map(|(metrics, _)| metrics.advance_width)
            .sum::<f32>()
            .ceil() as u32;
        if width == 0 || height == 0 {
            return None;
        }

        let mut image = GrayImage::from_pixel(width, height, Luma([PAPER]));
        let mut pen = 0.0f32;
        for (metrics, coverage) in &glyphs {
            let glyph_x = (pen + metrics.xmin as f32).round() as i64;
            let glyph_y = (ascent - metrics.height as f32 - metrics.ymin as f32).round() as i64;
            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    if coverage[row * metrics.width + col] < COVERAGE_THRESHOLD {
                        continue;
                    }
                    let x = glyph_x + col as i64;
                    let y = glyph_y + row as i64;
                    if (0..width as i64).contains(&x) && (0..height as i64).contains(&y) {
                        image.put_pixel(x as u32, y as u32, Luma([INK]));
                    }
                }
            }
            pen += metrics.advance_width;
        }
        Some(image)
    }
}
