//! Application layer use cases for the bench peripherals.
//!
//! # Sub-modules
//!
//! - **`peripheral`** – the [`peripheral::SerialLine`] seam and the error
//!   types shared by every peripheral.
//! - **`gantry`** – homing and verified moves of the motion stage, plus the
//!   shared [`gantry::GantryHandle`] that serialises access to it.
//! - **`reader`** – one credential reader parked at a fixed place under the
//!   gantry.
//! - **`relay`** – reader/key selection on the relay board.

pub mod gantry;
pub mod peripheral;
pub mod reader;
pub mod relay;
