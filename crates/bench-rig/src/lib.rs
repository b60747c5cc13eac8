//! bench-rig library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/` and
//! the `bench-rig` binary share the same module tree.
//!
//! # What is on the bench? (for beginners)
//!
//! Besides the devices under test, the bench has three serial peripherals:
//!
//! - a **gantry**, a two-axis motion stage that carries a device over the
//!   credential readers,
//! - one or more **readers** (NFC, EM/HID, Indala) that print a line for
//!   every credential they see,
//! - a **relay board** that selects which reader and which key are wired up.
//!
//! This crate drives all three, and provides the operator CLI.

pub mod application;
pub mod infrastructure;
