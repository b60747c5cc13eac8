//! # bench-core
//!
//! Shared library for the screen test bench containing the framebuffer
//! decoder, the template recognition engine, the virtual-keyboard router and
//! the line protocols spoken by the bench peripherals.
//!
//! This crate is used by both the navigator (device-facing) and the rig
//! (peripheral-facing) crates.  It has zero dependencies on serial ports,
//! device transports, or async runtimes.
//!
//! # Architecture overview
//!
//! The bench drives an embedded device with a small monochrome display.  It
//! reads the device's screen back, works out which screen is showing by
//! comparing it against reference bitmaps, and presses the device's buttons
//! to move through menus.  This crate holds the parts of that loop that are
//! pure computation:
//!
//! - **`frame`** – Turns the raw 1-bit packed framebuffer into a 128×64
//!   grayscale [`Frame`] in physical screen orientation.
//!
//! - **`recognition`** – Named reference bitmaps ([`Template`],
//!   [`TemplateLibrary`]) and the normalised cross-correlation matcher
//!   ([`Recognizer`]) that finds them inside a region of a frame.
//!
//! - **`keyboard`** – The device's on-screen keyboards as grids with unusable
//!   cells, and the router that turns text into cursor moves.
//!
//! - **`input`** – The button/phase vocabulary understood by the device.
//!
//! - **`protocol`** – ASCII line commands for the gantry and the relay board.

pub mod frame;
pub mod input;
pub mod keyboard;
pub mod protocol;
pub mod recognition;

pub use frame::{decode_frame, Frame, FrameError};
pub use input::{ConfigurationError, InputEvent, InputKey, InputPhase, PressDuration};
pub use keyboard::{route_text, Cell, KeyStroke, KeyboardError, KeyboardLayout};
pub use protocol::{GantryCommand, GantryReply, ProtocolError, RelayCommand};
pub use recognition::{
    leading_match, RecognitionMatch, Recognizer, Region, Template, TemplateLibrary,
};
