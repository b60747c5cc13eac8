//! Integration tests for the decode → recognise pipeline.
//!
//! These feed packed framebuffers through `decode_frame` exactly as the
//! device would send them, then run the recogniser over the result.

use bench_core::frame::{FRAME_BYTES, INK, PAPER, SCREEN_HEIGHT, SCREEN_WIDTH};
use bench_core::{decode_frame, leading_match, Frame, Recognizer, Region, Template, TemplateLibrary};
use image::{imageops, GrayImage, Luma};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// An icon with a unique diagonal pattern per `seed`.
fn icon(seed: u32) -> GrayImage {
    GrayImage::from_fn(10, 8, |x, y| {
        if (x + 2 * y + seed) % 4 == 0 || (x == seed % 10 && y == 0) {
            Luma([INK])
        } else {
            Luma([PAPER])
        }
    })
}

fn screen_with(icons: &[(&GrayImage, u32, u32)]) -> Frame {
    let mut image = GrayImage::from_pixel(SCREEN_WIDTH, SCREEN_HEIGHT, Luma([PAPER]));
    for (img, x, y) in icons {
        imageops::replace(&mut image, *img, i64::from(*x), i64::from(*y));
    }
    Frame::from_image(image).expect("display-sized image")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn test_blank_framebuffer_matches_nothing_in_empty_library() {
    // Arrange
    let frame = decode_frame(&vec![0u8; FRAME_BYTES]).expect("valid length");

    // Act
    let found = Recognizer::new(0.99).recognize(&TemplateLibrary::new(), &frame, Region::FULL);

    // Assert
    assert!(frame.is_uniform());
    assert!(found.is_empty());
}

#[test]
fn test_packed_screen_is_recognised_after_decoding() {
    // Arrange – two icons on a synthetic screen, sent through the wire format
    let home = icon(1);
    let exit = icon(3);
    let screen = screen_with(&[(&home, 4, 40), (&exit, 90, 6)]);
    let library: TemplateLibrary = vec![
        Template::new("SDcardIcon", home.clone()),
        Template::new("ExitLeft", exit.clone()),
    ]
    .into_iter()
    .collect();

    // Act
    let decoded = decode_frame(&screen.to_packed()).expect("valid length");
    let found = Recognizer::new(0.99).recognize(&library, &decoded, Region::FULL);

    // Assert
    let mut names: Vec<&str> = found.iter().map(|m| m.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["ExitLeft", "SDcardIcon"]);
    let leading = leading_match(&found).expect("two matches");
    assert_eq!(leading.name, "ExitLeft");
    assert_eq!(leading.top_left, (90, 6));
    assert_eq!(leading.bottom_right, (100, 14));
}

#[test]
fn test_header_region_ignores_icons_below_it() {
    let home = icon(1);
    let screen = screen_with(&[(&home, 4, 40)]);
    let library: TemplateLibrary = std::iter::once(Template::new("SDcardIcon", home)).collect();

    let header = Recognizer::new(0.99).recognize(&library, &screen, Region::new(0, 16, 0, 128));

    assert!(header.is_empty());
}
