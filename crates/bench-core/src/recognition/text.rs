//! Text-rendered templates.
//!
//! Many menu entries have no stored bitmap; the navigator renders the entry's
//! label on the fly and matches that instead.  The device draws text with
//! different fonts and polarities on different screens (a highlighted list
//! row is white on black, a header is black on white), so a label is rendered
//! in several [`TextVariant`]s and any of them counts as a hit.
//!
//! Rasterisation itself lives behind [`TextRenderer`] so this crate stays
//! free of font files.

use image::{imageops, GrayImage};

use crate::recognition::template::{Template, TemplateLibrary};

/// Trailing padding appended to every label before rendering.
///
/// List rows on the device leave a gap after the text; matching it keeps a
/// short label from matching inside a longer one.
const LABEL_PADDING: &str = "  ";

/// Font roles used by the device firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    /// Bold face used for headers and most list rows.
    Primary,
    /// Small face used in secondary lists.
    Secondary,
    /// Monospace face of the on-screen keyboard.
    Keyboard,
    /// Large monospace digits.
    BigNumbers,
}

impl FontFace {
    /// Blank rows above the glyphs that the device clips off.
    pub fn top_trim(self) -> u32 {
        match self {
            FontFace::Primary => 3,
            _ => 2,
        }
    }
}

/// Rasterises text in one of the device's font faces.
///
/// Implementations return ink `0` on paper `255`, tightly sized to the text
/// (including trailing spaces), or `None` if the face is unavailable.
pub trait TextRenderer: Send + Sync {
    fn rasterize(&self, text: &str, face: FontFace) -> Option<GrayImage>;
}

/// One font/polarity combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextVariant {
    pub face: FontFace,
    /// White text on black, as in a highlighted row.
    pub inverted: bool,
}

impl TextVariant {
    pub const fn new(face: FontFace, inverted: bool) -> Self {
        Self { face, inverted }
    }

    /// The variants tried when looking for a label on screen.
    pub const ALL: [TextVariant; 4] = [
        TextVariant::new(FontFace::Primary, false),
        TextVariant::new(FontFace::Secondary, true),
        TextVariant::new(FontFace::BigNumbers, true),
        TextVariant::new(FontFace::Keyboard, true),
    ];

    /// Renders `phrase` in this variant, or `None` if the face is missing or
    /// the trimmed bitmap would be empty.
    pub fn render(&self, renderer: &dyn TextRenderer, phrase: &str) -> Option<GrayImage> {
        let padded = format!("{phrase}{LABEL_PADDING}");
        let raw = renderer.rasterize(&padded, self.face)?;
        let trim = self.face.top_trim();
        if raw.width() == 0 || raw.height() <= trim {
            return None;
        }
        let mut image =
            imageops::crop_imm(&raw, 0, trim, raw.width(), raw.height() - trim).to_image();
        if self.inverted {
            imageops::invert(&mut image);
        }
        Some(image)
    }
}

/// Renders `phrase` in every variant of [`TextVariant::ALL`].
///
/// Templates are named `gen0`, `gen1`, ... after the variant's position, and
/// variants whose face the renderer lacks are skipped.
pub fn synthesize_variants(renderer: &dyn TextRenderer, phrase: &str) -> TemplateLibrary {
    TextVariant::ALL
        .iter()
        .enumerate()
        .filter_map(|(i, variant)| {
            variant
                .render(renderer, phrase)
                .map(|image| Template::new(format!("gen{i}"), image))
        })
        .collect()
}

/// Builds a library with one template per phrase, named by the phrase.
pub fn library_from_phrases<'a>(
    renderer: &dyn TextRenderer,
    phrases: impl IntoIterator<Item = &'a str>,
    variant: TextVariant,
) -> TemplateLibrary {
    phrases
        .into_iter()
        .filter_map(|phrase| {
            variant
                .render(renderer, phrase)
                .map(|image| Template::new(phrase, image))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{INK, PAPER};
    use image::Luma;
    use std::sync::Mutex;

    /// Renders each character as a 4×8 block with one ink pixel per row so the
    /// output is textured; records every request.
    #[derive(Default)]
    struct BlockRenderer {
        missing: Option<FontFace>,
        requests: Mutex<Vec<(String, FontFace)>>,
    }

    impl TextRenderer for BlockRenderer {
        fn rasterize(&self, text: &str, face: FontFace) -> Option<GrayImage> {
            self.requests.lock().unwrap().push((text.to_string(), face));
            if self.missing == Some(face) {
                return None;
            }
            let width = 4 * text.chars().count() as u32;
            let mut img = GrayImage::from_pixel(width, 8, Luma([PAPER]));
            for (i, c) in text.chars().enumerate() {
                if c != ' ' {
                    for y in 0..8 {
                        img.put_pixel(i as u32 * 4 + y % 4, y, Luma([INK]));
                    }
                }
            }
            Some(img)
        }
    }

    #[test]
    fn test_variants_pad_label_and_name_by_position() {
        // Arrange
        let renderer = BlockRenderer::default();

        // Act
        let lib = synthesize_variants(&renderer, "Settings");

        // Assert
        assert_eq!(lib.names().collect::<Vec<_>>(), vec!["gen0", "gen1", "gen2", "gen3"]);
        let requests = renderer.requests.lock().unwrap();
        assert!(requests.iter().all(|(text, _)| text == "Settings  "));
    }

    #[test]
    fn test_primary_face_trims_three_rows_others_two() {
        let renderer = BlockRenderer::default();

        let lib = synthesize_variants(&renderer, "ab");

        assert_eq!(lib.get("gen0").map(Template::height), Some(5));
        assert_eq!(lib.get("gen1").map(Template::height), Some(6));
        assert_eq!(lib.get("gen0").map(Template::width), Some(16));
    }

    #[test]
    fn test_inverted_variant_swaps_polarity() {
        let renderer = BlockRenderer::default();

        let lib = synthesize_variants(&renderer, "a");

        // Trailing padding is paper in normal polarity and ink when inverted.
        let normal = lib.get("gen0").unwrap().image();
        let inverted = lib.get("gen1").unwrap().image();
        assert_eq!(normal.get_pixel(11, 0).0[0], PAPER);
        assert_eq!(inverted.get_pixel(11, 0).0[0], INK);
    }

    #[test]
    fn test_missing_face_is_skipped() {
        let renderer = BlockRenderer {
            missing: Some(FontFace::BigNumbers),
            ..Default::default()
        };

        let lib = synthesize_variants(&renderer, "x");

        assert_eq!(lib.len(), 3);
        assert!(!lib.contains("gen2"));
    }

    #[test]
    fn test_library_from_phrases_names_templates_by_phrase() {
        let renderer = BlockRenderer::default();

        let lib = library_from_phrases(
            &renderer,
            ["Bluetooth", "System"],
            TextVariant::new(FontFace::Primary, false),
        );

        assert_eq!(lib.names().collect::<Vec<_>>(), vec!["Bluetooth", "System"]);
    }
}
