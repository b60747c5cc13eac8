//! Normalised cross-correlation template matching.
//!
//! For a template `T` (`w × h`) and a search window `I`, the score at offset
//! `(x, y)` is the zero-mean normalised correlation
//!
//! ```text
//!            Σ T'(i,j) · I'(x+i, y+j)
//! R(x,y) = ─────────────────────────────────     T' = T − mean(T)
//!          √( Σ T'(i,j)² · Σ I'(x+i, y+j)² )      I' = I − mean(window)
//! ```
//!
//! which lies in `[-1, 1]`.  Window sums come from integral images, so each
//! offset costs one pass over the template.  A template with no variance
//! scores `1` everywhere; a flat window under a textured template scores `0`.

use image::{imageops, GrayImage};
use tracing::trace;

use crate::frame::{Frame, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::recognition::template::{Template, TemplateLibrary};

/// Variance below this is treated as zero.
const FLAT_EPSILON: f64 = 1e-9;

/// A rectangular search region in frame coordinates.
///
/// Half-open on both axes: rows `top..bottom`, columns `left..right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl Region {
    /// The whole display.
    pub const FULL: Region = Region {
        top: 0,
        bottom: SCREEN_HEIGHT,
        left: 0,
        right: SCREEN_WIDTH,
    };

    pub const fn new(top: u32, bottom: u32, left: u32, right: u32) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// Clips the region to the display bounds.
    pub fn clamped(self) -> Region {
        let bottom = self.bottom.min(SCREEN_HEIGHT);
        let right = self.right.min(SCREEN_WIDTH);
        Region {
            top: self.top.min(bottom),
            bottom,
            left: self.left.min(right),
            right,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Returns `true` if a `width × height` template fits inside the region.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        width > 0 && height > 0 && width <= self.width() && height <= self.height()
    }
}

impl Default for Region {
    fn default() -> Self {
        Region::FULL
    }
}

/// A template found in a frame above the confidence threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionMatch {
    /// Name of the matched template.
    pub name: String,
    /// Top-left corner `(x, y)` in frame coordinates.
    pub top_left: (u32, u32),
    /// Bottom-right corner `(x, y)` in frame coordinates (exclusive).
    pub bottom_right: (u32, u32),
    /// Correlation score of the best location.
    pub score: f64,
}

/// Returns the match that leads the screen: topmost, then leftmost, then by
/// name.
///
/// Recognition results carry no order of their own; callers that need "the"
/// current entry use this to pick one deterministically.
pub fn leading_match(matches: &[RecognitionMatch]) -> Option<&RecognitionMatch> {
    matches.iter().min_by(|a, b| {
        (a.top_left.1, a.top_left.0, a.name.as_str()).cmp(&(
            b.top_left.1,
            b.top_left.0,
            b.name.as_str(),
        ))
    })
}

/// Threshold-gated recogniser.
///
/// Stateless: the same library, frame and region always yield the same
/// matches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recognizer {
    threshold: f64,
}

impl Recognizer {
    /// Creates a recogniser that accepts scores strictly above `threshold`.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Scores every template that fits in `region` and returns those whose
    /// best score strictly exceeds the threshold.
    ///
    /// Any number of templates may match the same frame.  The returned order
    /// follows library iteration and carries no meaning.
    pub fn recognize(
        &self,
        library: &TemplateLibrary,
        frame: &Frame,
        region: Region,
    ) -> Vec<RecognitionMatch> {
        let region = region.clamped();
        if region.width() == 0 || region.height() == 0 {
            return Vec::new();
        }
        let window = imageops::crop_imm(
            frame.image(),
            region.left,
            region.top,
            region.width(),
            region.height(),
        )
        .to_image();

        let mut found = Vec::new();
        for template in library.iter() {
            if !region.fits(template.width(), template.height()) {
                continue;
            }
            let (score, (x, y)) = best_match(&window, template);
            trace!(template = template.name(), score, x, y, "template scored");
            if score > self.threshold {
                let left = x + region.left;
                let top = y + region.top;
                found.push(RecognitionMatch {
                    name: template.name().to_string(),
                    top_left: (left, top),
                    bottom_right: (left + template.width(), top + template.height()),
                    score,
                });
            }
        }
        found
    }
}

/// Summed-area table with one extra leading row and column of zeros.
struct Integral {
    stride: usize,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl Integral {
    fn new(image: &GrayImage) -> Self {
        let (w, h) = (image.width() as usize, image.height() as usize);
        let stride = w + 1;
        let mut sum = vec![0.0; stride * (h + 1)];
        let mut sum_sq = vec![0.0; stride * (h + 1)];
        for y in 0..h {
            let mut row = 0.0;
            let mut row_sq = 0.0;
            for x in 0..w {
                let v = f64::from(image.get_pixel(x as u32, y as u32).0[0]);
                row += v;
                row_sq += v * v;
                sum[(y + 1) * stride + x + 1] = sum[y * stride + x + 1] + row;
                sum_sq[(y + 1) * stride + x + 1] = sum_sq[y * stride + x + 1] + row_sq;
            }
        }
        Self {
            stride,
            sum,
            sum_sq,
        }
    }

    /// Sum and sum of squares over `w × h` at `(x, y)`.
    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        let s = self.stride;
        let at = |table: &[f64]| {
            table[(y + h) * s + x + w] - table[y * s + x + w] - table[(y + h) * s + x]
                + table[y * s + x]
        };
        (at(&self.sum), at(&self.sum_sq))
    }
}

/// Returns the global maximum score and its `(x, y)` offset inside `window`.
///
/// Ties resolve to the first location in row-major order.  The template must
/// fit inside the window.
pub fn best_match(window: &GrayImage, template: &Template) -> (f64, (u32, u32)) {
    let tpl = template.image();
    let (tw, th) = (tpl.width() as usize, tpl.height() as usize);
    let (ww, wh) = (window.width() as usize, window.height() as usize);
    let n = (tw * th) as f64;

    let raw: Vec<f64> = tpl.pixels().map(|p| f64::from(p.0[0])).collect();
    let mean = raw.iter().sum::<f64>() / n;
    let centred: Vec<f64> = raw.iter().map(|v| v - mean).collect();
    let tpl_energy: f64 = centred.iter().map(|v| v * v).sum();

    if tpl_energy < FLAT_EPSILON {
        return (1.0, (0, 0));
    }

    let integral = Integral::new(window);
    let pixels: Vec<f64> = window.pixels().map(|p| f64::from(p.0[0])).collect();

    let mut best = f64::NEG_INFINITY;
    let mut best_at = (0u32, 0u32);
    for y in 0..=(wh - th) {
        for x in 0..=(ww - tw) {
            let (sum, sum_sq) = integral.window(x, y, tw, th);
            let win_energy = sum_sq - sum * sum / n;
            let score = if win_energy < FLAT_EPSILON {
                0.0
            } else {
                let mut cross = 0.0;
                for j in 0..th {
                    let row = (y + j) * ww + x;
                    let trow = j * tw;
                    for i in 0..tw {
                        cross += centred[trow + i] * pixels[row + i];
                    }
                }
                (cross / (tpl_energy * win_energy).sqrt()).clamp(-1.0, 1.0)
            };
            if score > best {
                best = score;
                best_at = (x as u32, y as u32);
            }
        }
    }
    (best, best_at)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{INK, PAPER};
    use image::Luma;

    /// A 6×5 glyph with an asymmetric pattern so it cannot self-match elsewhere.
    fn glyph() -> GrayImage {
        let rows = ["#....#", "##..#.", "#.#...", "#..##.", "######"];
        let mut img = GrayImage::from_pixel(6, 5, Luma([PAPER]));
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    img.put_pixel(x as u32, y as u32, Luma([INK]));
                }
            }
        }
        img
    }

    fn frame_with_glyph_at(x0: u32, y0: u32) -> Frame {
        let mut image = GrayImage::from_pixel(SCREEN_WIDTH, SCREEN_HEIGHT, Luma([PAPER]));
        image::imageops::replace(&mut image, &glyph(), i64::from(x0), i64::from(y0));
        Frame::from_image(image).unwrap()
    }

    fn library_of(templates: Vec<Template>) -> TemplateLibrary {
        templates.into_iter().collect()
    }

    #[test]
    fn test_embedded_template_is_found_with_exact_bounding_box() {
        // Arrange
        let frame = frame_with_glyph_at(37, 21);
        let lib = library_of(vec![Template::new("glyph", glyph())]);

        // Act
        let found = Recognizer::new(0.99).recognize(&lib, &frame, Region::FULL);

        // Assert
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "glyph");
        assert_eq!(found[0].top_left, (37, 21));
        assert_eq!(found[0].bottom_right, (43, 26));
        assert!((found[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_above_maximum_never_matches() {
        let frame = frame_with_glyph_at(10, 10);
        let lib = library_of(vec![Template::new("glyph", glyph())]);

        let found = Recognizer::new(1.01).recognize(&lib, &frame, Region::FULL);

        assert!(found.is_empty());
    }

    #[test]
    fn test_score_must_strictly_exceed_threshold() {
        // A perfect match scores exactly 1.0, which is not > 1.0.
        let frame = frame_with_glyph_at(0, 0);
        let lib = library_of(vec![Template::new("glyph", glyph())]);

        let found = Recognizer::new(1.0).recognize(&lib, &frame, Region::FULL);

        assert!(found.is_empty());
    }

    #[test]
    fn test_region_restricts_search_and_offsets_coordinates() {
        // Arrange – glyph in the lower half, search only the upper half
        let frame = frame_with_glyph_at(50, 40);
        let lib = library_of(vec![Template::new("glyph", glyph())]);
        let recognizer = Recognizer::new(0.9);

        // Act
        let upper = recognizer.recognize(&lib, &frame, Region::new(0, 32, 0, 128));
        let lower = recognizer.recognize(&lib, &frame, Region::new(32, 64, 40, 128));

        // Assert
        assert!(upper.iter().all(|m| m.score < 0.99));
        let hit = lower.iter().find(|m| m.score > 0.99).expect("glyph in lower half");
        assert_eq!(hit.top_left, (50, 40));
    }

    #[test]
    fn test_template_larger_than_region_is_skipped() {
        let frame = frame_with_glyph_at(0, 0);
        let lib = library_of(vec![Template::new("glyph", glyph())]);

        let found = Recognizer::new(-2.0).recognize(&lib, &frame, Region::new(0, 4, 0, 128));

        assert!(found.is_empty(), "5-row template must not be tried in a 4-row region");
    }

    #[test]
    fn test_multiple_templates_can_match_the_same_frame() {
        // Arrange – two different glyphs on screen at once
        let mut image = GrayImage::from_pixel(SCREEN_WIDTH, SCREEN_HEIGHT, Luma([PAPER]));
        let g = glyph();
        let flipped = image::imageops::flip_vertical(&g);
        image::imageops::replace(&mut image, &g, 5, 5);
        image::imageops::replace(&mut image, &flipped, 90, 40);
        let frame = Frame::from_image(image).unwrap();
        let lib = library_of(vec![
            Template::new("a", g),
            Template::new("b", flipped),
        ]);

        // Act
        let found = Recognizer::new(0.99).recognize(&lib, &frame, Region::FULL);

        // Assert
        let mut names: Vec<&str> = found.iter().map(|m| m.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_flat_window_scores_zero_against_textured_template() {
        let window = GrayImage::from_pixel(20, 20, Luma([PAPER]));
        let (score, _) = best_match(&window, &Template::new("glyph", glyph()));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_flat_template_scores_one_at_origin() {
        let window = frame_with_glyph_at(3, 3).image().clone();
        let flat = Template::new("flat", GrayImage::from_pixel(4, 4, Luma([PAPER])));

        let (score, at) = best_match(&window, &flat);

        assert_eq!(score, 1.0);
        assert_eq!(at, (0, 0));
    }

    #[test]
    fn test_inverted_template_scores_minus_one() {
        let frame = frame_with_glyph_at(0, 0);
        let mut inverted = glyph();
        image::imageops::invert(&mut inverted);
        let window = image::imageops::crop_imm(frame.image(), 0, 0, 6, 5).to_image();

        let (score, _) = best_match(&window, &Template::new("neg", inverted));

        assert!((score + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_library_returns_no_matches_on_blank_frame() {
        let found = Recognizer::new(0.99).recognize(&TemplateLibrary::new(), &Frame::blank(), Region::FULL);
        assert!(found.is_empty());
    }

    #[test]
    fn test_leading_match_prefers_topmost_then_leftmost() {
        let m = |name: &str, x: u32, y: u32| RecognitionMatch {
            name: name.to_string(),
            top_left: (x, y),
            bottom_right: (x + 1, y + 1),
            score: 1.0,
        };
        let matches = vec![m("low", 0, 30), m("right", 60, 10), m("left", 5, 10)];

        assert_eq!(leading_match(&matches).map(|m| m.name.as_str()), Some("left"));
        assert!(leading_match(&[]).is_none());
    }

    #[test]
    fn test_region_clamps_to_display() {
        let r = Region::new(10, 500, 120, 900).clamped();
        assert_eq!(r, Region::new(10, 64, 120, 128));
        assert_eq!(r.width(), 8);
    }
}
