//! On-screen keyboards of the device and the router that types on them.
//!
//! The device has no physical keys beyond its six buttons, so text is entered
//! by walking a cursor over an on-screen grid and confirming each character.
//!
//! # For beginners: how typing works
//!
//! ```text
//!   q w e r t y u i o p 0 1 2 3
//!   a s d f g h j k l · ⌫ 4 5 6      · = dead cell (part of a wide key)
//!   z x c v b n m _ · · ⏎ 7 8 9
//! ```
//!
//! To type `"a"` with the cursor on `⏎` the router presses UP once (landing
//! on `⌫`), then LEFT until it reaches `a`, confirms, then walks back to `⏎`
//! and confirms again to submit.  Uppercase letters are confirmed with a long
//! press because the layout has no shift key.
//!
//! - **`layout`** – [`KeyboardLayout`]: the grid, its dead cells and the
//!   cursor start position.
//! - **`router`** – [`route_text`]: text → [`KeyStroke`]s.

pub mod layout;
pub mod router;

pub use layout::{Cell, KeyboardLayout};
pub use router::{route_between, route_text};

use thiserror::Error;

/// Errors produced while routing text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyboardError {
    /// The character has no key on this layout.
    #[error("character {0:?} is not on the {1} keyboard")]
    UnsupportedCharacter(char, &'static str),
}

/// One cursor action on the on-screen keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyStroke {
    Up,
    Down,
    Left,
    Right,
    /// Short OK press on the highlighted key.
    Confirm,
    /// Long OK press; enters the uppercase form of a letter.
    LongConfirm,
}

impl KeyStroke {
    /// Returns `true` for the four cursor moves.
    pub fn is_move(self) -> bool {
        !matches!(self, KeyStroke::Confirm | KeyStroke::LongConfirm)
    }
}
