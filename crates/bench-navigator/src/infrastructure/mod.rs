//! Infrastructure layer for the navigator.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `bench_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`device`** – A scripted in-memory device that implements
//!   `DeviceLink`.  Screens are frames, buttons move between them.  Used by
//!   tests and by bench dry runs.
//!
//! - **`templates`** – Loads a directory of reference bitmaps into a
//!   `TemplateLibrary`.
//!
//! - **`fonts`** – `fontdue`-backed `TextRenderer` for on-the-fly text
//!   templates.
//!
//! - **`diagnostics`** – Writes frames to disk as BMP snapshots.

pub mod device;
pub mod diagnostics;
pub mod fonts;
pub mod templates;
