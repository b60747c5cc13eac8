//! Framebuffer decoding for the device's 128×64 monochrome display.
//!
//! The device streams its screen as `128 * 64 / 8 = 1024` bytes.  Each byte
//! holds eight vertically stacked pixels (least-significant bit on top), and
//! bytes run left to right across one 8-pixel-tall "page" before moving down
//! to the next page:
//!
//! ```text
//! byte index = page * 128 + x        pixel (x, page * 8 + bit) = (byte >> bit) & 1
//! ```
//!
//! [`decode_frame`] unpacks the bytes into a column grid, rotates it 90°
//! clockwise, mirrors it horizontally so it matches the physical display,
//! then inverts polarity: lit pixels become dark ([`INK`]) on a light
//! background ([`PAPER`]).  Template bitmaps are captured under the same
//! convention, so frames and templates compare directly.

use image::{imageops, imageops::FilterType, GrayImage, Luma};
use thiserror::Error;

/// Display width in pixels.
pub const SCREEN_WIDTH: u32 = 128;

/// Display height in pixels.
pub const SCREEN_HEIGHT: u32 = 64;

/// Size of one packed framebuffer in bytes.
pub const FRAME_BYTES: usize = (SCREEN_WIDTH * SCREEN_HEIGHT / 8) as usize;

/// Gray level of a lit (drawn) pixel after decoding.
pub const INK: u8 = 0;

/// Gray level of an unlit (background) pixel after decoding.
pub const PAPER: u8 = 255;

/// Pixels of one page column stacked in a single byte.
const PAGE_HEIGHT: u32 = 8;

/// Errors produced while building a [`Frame`].
#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    /// The raw buffer does not hold exactly one framebuffer.
    #[error("framebuffer has {actual} bytes, expected {expected}")]
    WrongLength { expected: usize, actual: usize },

    /// An image handed to [`Frame::from_image`] is not display-sized.
    #[error("frame image is {width}x{height}, expected 128x64")]
    WrongDimensions { width: u32, height: u32 },
}

/// One decoded snapshot of the device display.
///
/// Always `SCREEN_WIDTH × SCREEN_HEIGHT`, one grayscale byte per pixel,
/// [`INK`] for drawn pixels and [`PAPER`] for background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    image: GrayImage,
}

impl Default for Frame {
    fn default() -> Self {
        Self::blank()
    }
}

impl Frame {
    /// A frame with every pixel unlit.
    pub fn blank() -> Self {
        Self {
            image: GrayImage::from_pixel(SCREEN_WIDTH, SCREEN_HEIGHT, Luma([PAPER])),
        }
    }

    /// Wraps an already-oriented grayscale image.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::WrongDimensions`] unless the image is 128×64.
    pub fn from_image(image: GrayImage) -> Result<Self, FrameError> {
        if image.width() != SCREEN_WIDTH || image.height() != SCREEN_HEIGHT {
            return Err(FrameError::WrongDimensions {
                width: image.width(),
                height: image.height(),
            });
        }
        Ok(Self { image })
    }

    /// Borrows the underlying grayscale image.
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Returns `true` when the pixel at `(x, y)` is drawn.
    ///
    /// Coordinates outside the display read as unlit.
    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return false;
        }
        self.image.get_pixel(x, y).0[0] < 128
    }

    /// Returns `true` when every pixel has the same value.
    pub fn is_uniform(&self) -> bool {
        let mut pixels = self.image.pixels();
        match pixels.next() {
            Some(first) => pixels.all(|p| p == first),
            None => true,
        }
    }

    /// Packs the frame back into the device's framebuffer layout.
    ///
    /// This is the exact inverse of [`decode_frame`] for frames that only
    /// contain [`INK`] and [`PAPER`]; bench simulators use it to feed
    /// synthetic screens through the real decoding path.
    pub fn to_packed(&self) -> Vec<u8> {
        let mut packed = vec![0u8; FRAME_BYTES];
        for (index, byte) in packed.iter_mut().enumerate() {
            let page = index as u32 / SCREEN_WIDTH;
            let x = index as u32 % SCREEN_WIDTH;
            for bit in 0..PAGE_HEIGHT {
                if self.is_ink(x, page * PAGE_HEIGHT + bit) {
                    *byte |= 1 << bit;
                }
            }
        }
        packed
    }

    /// Returns a nearest-neighbour upscaled copy for operator snapshots.
    ///
    /// A scale of `0` is treated as `1`.
    pub fn upscaled(&self, scale: u32) -> GrayImage {
        let scale = scale.max(1);
        imageops::resize(
            &self.image,
            SCREEN_WIDTH * scale,
            SCREEN_HEIGHT * scale,
            FilterType::Nearest,
        )
    }
}

/// Decodes one packed framebuffer into an oriented [`Frame`].
///
/// Pure function of its input: identical buffers always produce identical
/// frames.
///
/// # Errors
///
/// Returns [`FrameError::WrongLength`] unless `data` is exactly
/// [`FRAME_BYTES`] long.
pub fn decode_frame(data: &[u8]) -> Result<Frame, FrameError> {
    if data.len() != FRAME_BYTES {
        return Err(FrameError::WrongLength {
            expected: FRAME_BYTES,
            actual: data.len(),
        });
    }

    // Column grid: one row per device column, one column per pixel of height.
    let mut columns = GrayImage::new(SCREEN_HEIGHT, SCREEN_WIDTH);
    for (index, byte) in data.iter().enumerate() {
        let page = index as u32 / SCREEN_WIDTH;
        let x = index as u32 % SCREEN_WIDTH;
        for bit in 0..PAGE_HEIGHT {
            let lit = (byte >> bit) & 1 == 1;
            let level = if lit { 255 } else { 0 };
            columns.put_pixel(page * PAGE_HEIGHT + bit, x, Luma([level]));
        }
    }

    let rotated = imageops::rotate90(&columns);
    let mut oriented = imageops::flip_horizontal(&rotated);
    imageops::invert(&mut oriented);

    Ok(Frame { image: oriented })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with(bits: &[(usize, u8)]) -> Vec<u8> {
        let mut data = vec![0u8; FRAME_BYTES];
        for &(index, bit) in bits {
            data[index] |= 1 << bit;
        }
        data
    }

    #[test]
    fn test_decode_all_zero_buffer_yields_uniform_blank_frame() {
        // Arrange
        let data = vec![0u8; FRAME_BYTES];

        // Act
        let frame = decode_frame(&data).unwrap();

        // Assert
        assert!(frame.is_uniform());
        assert_eq!(frame, Frame::blank());
        assert_eq!(frame.image().get_pixel(0, 0).0[0], PAPER);
    }

    #[test]
    fn test_decode_all_ones_buffer_yields_fully_drawn_frame() {
        let frame = decode_frame(&vec![0xFF; FRAME_BYTES]).unwrap();

        assert!(frame.is_uniform());
        assert_eq!(frame.image().get_pixel(127, 63).0[0], INK);
    }

    #[test]
    fn test_decode_bit_zero_of_first_byte_is_top_left_pixel() {
        // Arrange
        let data = buffer_with(&[(0, 0)]);

        // Act
        let frame = decode_frame(&data).unwrap();

        // Assert
        assert!(frame.is_ink(0, 0));
        assert!(!frame.is_ink(1, 0));
        assert!(!frame.is_ink(0, 1));
    }

    #[test]
    fn test_decode_high_bit_maps_to_bottom_of_page_column() {
        let frame = decode_frame(&buffer_with(&[(0, 7)])).unwrap();

        assert!(frame.is_ink(0, 7));
        assert!(!frame.is_ink(0, 0));
    }

    #[test]
    fn test_decode_consecutive_bytes_advance_horizontally() {
        let frame = decode_frame(&buffer_with(&[(1, 0), (127, 3)])).unwrap();

        assert!(frame.is_ink(1, 0));
        assert!(frame.is_ink(127, 3));
    }

    #[test]
    fn test_decode_next_page_starts_eight_rows_down() {
        // Byte 128 is the first byte of page 1, i.e. rows 8..16 at x = 0.
        let frame = decode_frame(&buffer_with(&[(128, 0), (7 * 128 + 5, 7)])).unwrap();

        assert!(frame.is_ink(0, 8));
        assert!(frame.is_ink(5, 63));
    }

    #[test]
    fn test_decode_is_deterministic_for_identical_buffers() {
        let data: Vec<u8> = (0..FRAME_BYTES).map(|i| (i * 37 % 251) as u8).collect();

        let a = decode_frame(&data).unwrap();
        let b = decode_frame(&data).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        // Act
        let result = decode_frame(&[0u8; 16]);

        // Assert
        assert_eq!(
            result,
            Err(FrameError::WrongLength {
                expected: FRAME_BYTES,
                actual: 16
            })
        );
    }

    #[test]
    fn test_packed_frame_decodes_to_the_same_layout() {
        // Arrange – an L-shaped glyph near the middle of the screen
        let mut image = GrayImage::from_pixel(SCREEN_WIDTH, SCREEN_HEIGHT, Luma([PAPER]));
        for y in 20..30 {
            image.put_pixel(40, y, Luma([INK]));
        }
        for x in 40..50 {
            image.put_pixel(x, 29, Luma([INK]));
        }
        let frame = Frame::from_image(image).unwrap();

        // Act
        let decoded = decode_frame(&frame.to_packed()).unwrap();

        // Assert
        assert_eq!(decoded, frame);
        assert!(decoded.is_ink(40, 20));
        assert!(decoded.is_ink(49, 29));
        assert!(!decoded.is_ink(41, 20));
    }

    #[test]
    fn test_from_image_rejects_wrong_dimensions() {
        let result = Frame::from_image(GrayImage::new(64, 128));

        assert_eq!(
            result,
            Err(FrameError::WrongDimensions {
                width: 64,
                height: 128
            })
        );
    }

    #[test]
    fn test_upscaled_multiplies_dimensions_and_keeps_pixels() {
        let frame = decode_frame(&buffer_with(&[(0, 0)])).unwrap();

        let big = frame.upscaled(4);

        assert_eq!(big.dimensions(), (512, 256));
        assert_eq!(big.get_pixel(3, 3).0[0], INK);
        assert_eq!(big.get_pixel(4, 0).0[0], PAPER);
    }
}
