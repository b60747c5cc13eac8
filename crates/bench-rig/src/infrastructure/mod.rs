//! Infrastructure layer for the bench rig.
//!
//! Contains OS-facing adapters: serial ports and the TOML configuration
//! file.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `bench_core`, but MUST NOT be imported by the `application` layer.

pub mod serial;
pub mod storage;
