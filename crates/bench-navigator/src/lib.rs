//! bench-navigator library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/` and
//! the rig binary share the same module tree.
//!
//! # What does the navigator do? (for beginners)
//!
//! The device under test has a 128×64 monochrome screen and six buttons.  A
//! test cannot call into the device's menus directly; it has to look at the
//! screen and press buttons, just like a person would.  The navigator does
//! exactly that:
//!
//! 1. Pulls raw framebuffers from the device link and decodes them into
//!    [`bench_core::Frame`]s.
//! 2. Matches the frame against a library of reference bitmaps to work out
//!    which screen (or which highlighted menu entry) is showing.
//! 3. Presses buttons until the wanted screen shows up, with every loop
//!    bounded by a deadline so a confused device never hangs a test run.
//! 4. Types text on the device's on-screen keyboards.
//! 5. Brings a freshly connected device into a known state (Bluetooth and
//!    debug mode on).

/// Application layer: navigation, typing and bring-up use cases.
pub mod application;

/// Infrastructure layer: device link double, template and font loading,
/// frame snapshots.
pub mod infrastructure;
