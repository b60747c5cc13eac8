//! Template recognition: named reference bitmaps and the matcher that finds
//! them in a frame.
//!
//! - **`template`** – [`Template`] and the immutable, name-ordered
//!   [`TemplateLibrary`].
//! - **`matcher`** – [`Recognizer`]: zero-mean normalised cross-correlation
//!   of every fitting template against a [`Region`] of the frame.
//! - **`text`** – Synthesises templates from text when a screen state has no
//!   stored bitmap.

pub mod matcher;
pub mod template;
pub mod text;

pub use matcher::{best_match, leading_match, RecognitionMatch, Recognizer, Region};
pub use template::{Template, TemplateLibrary};
pub use text::{library_from_phrases, synthesize_variants, FontFace, TextRenderer, TextVariant};
