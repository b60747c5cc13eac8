//! Application layer use cases for the navigator.
//!
//! # What use cases does the navigator have?
//!
//! - **`navigate`** – [`navigate::Navigator`]: the per-device session that
//!   captures frames, recognises screen states and presses buttons to reach
//!   a target.  Menu enumeration, return-to-home and the file-browser
//!   sequences live here too.  The device transport is injected as a
//!   [`navigate::DeviceLink`] trait object.
//!
//! - **`type_text`** – Types text on the device's on-screen keyboards by
//!   routing it with `bench_core::keyboard` and pressing the resulting keys.
//!
//! - **`bring_up`** – The settings sequence that every freshly connected
//!   device goes through, parameterised by the device's role on the bench.

pub mod bring_up;
pub mod navigate;
pub mod type_text;
