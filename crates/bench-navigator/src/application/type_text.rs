//! Use case: type a string on the device's on-screen keyboard.
//!
//! The keyboard has no text input of its own: the cursor is moved with the
//! direction buttons and each character is entered with OK (or a long OK
//! for upper case on the alphanumeric layout).  The route is planned up
//! front by [`bench_core::route_text`], so an unsupported character fails
//! before anything is pressed.

use bench_core::{route_text, KeyStroke, KeyboardLayout};
use tracing::info;

use crate::application::navigate::{NavigationError, Navigator};

/// One of the device's on-screen keyboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualKeyboard {
    layout: KeyboardLayout,
}

impl VirtualKeyboard {
    pub fn new(layout: KeyboardLayout) -> Self {
        Self { layout }
    }

    pub fn alphanumeric() -> Self {
        Self::new(KeyboardLayout::ALPHANUMERIC)
    }

    pub fn hexadecimal() -> Self {
        Self::new(KeyboardLayout::HEXADECIMAL)
    }

    pub fn layout(&self) -> &KeyboardLayout {
        &self.layout
    }

    /// Enters `text` and submits it with the keyboard's Enter key.
    ///
    /// Assumes the keyboard has just opened with the cursor on its start
    /// key.
    ///
    /// # Errors
    ///
    /// [`NavigationError::Keyboard`] if `text` holds a character the layout
    /// lacks; nothing is pressed in that case.
    pub async fn type_text(&self, nav: &Navigator, text: &str) -> Result<(), NavigationError> {
        let strokes = route_text(&self.layout, text)?;
        info!(
            parent: nav.span(),
            keyboard = self.layout.name(),
            text,
            presses = strokes.len(),
            "typing text"
        );
        for stroke in strokes {
            press_stroke(nav, stroke).await?;
        }
        Ok(())
    }
}

async fn press_stroke(nav: &Navigator, stroke: KeyStroke) -> Result<(), NavigationError> {
    match stroke {
        KeyStroke::Up => nav.press_up().await,
        KeyStroke::Down => nav.press_down().await,
        KeyStroke::Left => nav.press_left().await,
        KeyStroke::Right => nav.press_right().await,
        KeyStroke::Confirm => nav.press_ok().await,
        KeyStroke::LongConfirm => nav.press_long_ok().await,
    }
}
