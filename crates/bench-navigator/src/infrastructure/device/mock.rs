//! Scripted in-memory device for tests and dry runs.
//!
//! # Why a scripted device?
//!
//! The real device needs a USB connection, firmware and a person to reset it
//! when a test goes wrong.  `MockDevice` models just enough of it to exercise
//! the navigator: a set of named screens (each a [`Frame`]) and a table of
//! button transitions between them.  Frames are packed with
//! [`Frame::to_packed`], so the navigator's real decoding path runs.
//!
//! # Usage in tests
//!
//! ```ignore
//! let device = Arc::new(
//!     MockDevice::new("home")
//!         .with_screen("home", &home_frame)
//!         .with_screen("menu", &menu_frame)
//!         .with_transition("home", InputKey::Ok, "menu"),
//! );
//! let mut nav = Navigator::new(device.clone(), templates, config, Span::none());
//!
//! nav.press_ok().await?;
//! assert_eq!(device.current_screen(), "menu");
//! ```
//!
//! Transitions fire on the hold phase (`SHORT` or `LONG`) of a press.  A
//! button with no transition from the current screen leaves it unchanged.
//!
//! # `should_fail` flag
//!
//! Set `should_fail = true` to make every call return a link error.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bench_core::{Frame, InputEvent, InputKey, InputPhase};

use crate::application::navigate::{DeviceLink, LinkError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A device whose screens and button behaviour are scripted up front.
#[derive(Default)]
pub struct MockDevice {
    screens: HashMap<String, Vec<u8>>,
    transitions: HashMap<(String, InputKey), String>,
    current: Mutex<String>,
    streaming: Mutex<bool>,
    /// Every input event received, in order.
    pub inputs: Mutex<Vec<InputEvent>>,
    /// When `true`, every call fails with a link error.
    pub should_fail: bool,
}

impl MockDevice {
    /// Creates a device showing `initial`.
    pub fn new(initial: &str) -> Self {
        Self {
            current: Mutex::new(initial.to_string()),
            ..Default::default()
        }
    }

    /// Adds (or replaces) a named screen.
    pub fn with_screen(mut self, name: &str, frame: &Frame) -> Self {
        self.screens.insert(name.to_string(), frame.to_packed());
        self
    }

    /// Pressing `key` on screen `from` shows screen `to`.
    pub fn with_transition(mut self, from: &str, key: InputKey, to: &str) -> Self {
        self.transitions
            .insert((from.to_string(), key), to.to_string());
        self
    }

    /// Links `screens` into a cycle: `forward` moves to the next screen,
    /// `backward` to the previous one, both wrapping around.
    pub fn with_cycle(mut self, screens: &[&str], forward: InputKey, backward: InputKey) -> Self {
        let n = screens.len();
        for (i, from) in screens.iter().enumerate() {
            self = self
                .with_transition(from, forward, screens[(i + 1) % n])
                .with_transition(from, backward, screens[(i + n - 1) % n]);
        }
        self
    }

    /// Name of the screen currently showing.
    pub fn current_screen(&self) -> String {
        lock(&self.current).clone()
    }

    /// Keys of every completed press, in order.
    pub fn presses(&self) -> Vec<InputKey> {
        lock(&self.inputs)
            .iter()
            .filter(|e| matches!(e.phase, InputPhase::Short | InputPhase::Long))
            .map(|e| e.key)
            .collect()
    }

    /// Number of completed presses of `key`.
    pub fn press_count(&self, key: InputKey) -> usize {
        self.presses().into_iter().filter(|&k| k == key).count()
    }
}

#[async_trait]
impl DeviceLink for MockDevice {
    async fn start_screen_stream(&self) -> Result<(), LinkError> {
        if self.should_fail {
            return Err(LinkError::Closed);
        }
        *lock(&self.streaming) = true;
        Ok(())
    }

    async fn next_frame(&self) -> Result<Vec<u8>, LinkError> {
        if self.should_fail {
            return Err(LinkError::Closed);
        }
        if !*lock(&self.streaming) {
            return Err(LinkError::StreamNotStarted);
        }
        let current = self.current_screen();
        self.screens
            .get(&current)
            .cloned()
            .ok_or_else(|| LinkError::Transport(format!("no frame scripted for screen {current:?}")))
    }

    async fn send_input(&self, event: InputEvent) -> Result<(), LinkError> {
        if self.should_fail {
            return Err(LinkError::Transport("mock failure".into()));
        }
        lock(&self.inputs).push(event);
        if matches!(event.phase, InputPhase::Short | InputPhase::Long) {
            let mut current = lock(&self.current);
            if let Some(next) = self.transitions.get(&(current.clone(), event.key)) {
                *current = next.clone();
            }
        }
        Ok(())
    }
}
