//! Button vocabulary of the device under test.
//!
//! The device has six buttons.  A complete button press is delivered as a
//! sequence of [`InputEvent`]s: `Press`, then `Short` or `Long`, then
//! `Release`.  [`PressDuration::phases`] produces that sequence.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Programmer-misuse fault raised by the low-level press primitive.
///
/// Always fatal: it means a test passed a button or duration name that the
/// device does not have.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("invalid button name: {0:?}")]
    InvalidButton(String),
    #[error("invalid press duration: {0:?}")]
    InvalidDuration(String),
}

/// A physical button on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKey {
    Up,
    Down,
    Left,
    Right,
    Ok,
    Back,
}

impl InputKey {
    /// Wire name of the button.
    pub fn as_str(self) -> &'static str {
        match self {
            InputKey::Up => "UP",
            InputKey::Down => "DOWN",
            InputKey::Left => "LEFT",
            InputKey::Right => "RIGHT",
            InputKey::Ok => "OK",
            InputKey::Back => "BACK",
        }
    }
}

impl fmt::Display for InputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputKey {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UP" => Ok(InputKey::Up),
            "DOWN" => Ok(InputKey::Down),
            "LEFT" => Ok(InputKey::Left),
            "RIGHT" => Ok(InputKey::Right),
            "OK" => Ok(InputKey::Ok),
            "BACK" => Ok(InputKey::Back),
            other => Err(ConfigurationError::InvalidButton(other.to_string())),
        }
    }
}

/// Phase of a button event as understood by the device input service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputPhase {
    Press,
    Short,
    Long,
    Release,
}

impl InputPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            InputPhase::Press => "PRESS",
            InputPhase::Short => "SHORT",
            InputPhase::Long => "LONG",
            InputPhase::Release => "RELEASE",
        }
    }
}

/// A discrete input event sent to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputEvent {
    pub key: InputKey,
    pub phase: InputPhase,
}

impl InputEvent {
    pub fn new(key: InputKey, phase: InputPhase) -> Self {
        Self { key, phase }
    }
}

/// How long a button is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PressDuration {
    #[default]
    Short,
    Long,
}

impl PressDuration {
    /// The three events that make up one complete press of `key`.
    pub fn phases(self, key: InputKey) -> [InputEvent; 3] {
        let hold = match self {
            PressDuration::Short => InputPhase::Short,
            PressDuration::Long => InputPhase::Long,
        };
        [
            InputEvent::new(key, InputPhase::Press),
            InputEvent::new(key, hold),
            InputEvent::new(key, InputPhase::Release),
        ]
    }
}

impl FromStr for PressDuration {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SHORT" => Ok(PressDuration::Short),
            "LONG" => Ok(PressDuration::Long),
            other => Err(ConfigurationError::InvalidDuration(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_press_expands_to_press_short_release() {
        let events = PressDuration::Short.phases(InputKey::Down);

        assert_eq!(
            events.map(|e| e.phase),
            [InputPhase::Press, InputPhase::Short, InputPhase::Release]
        );
        assert!(events.iter().all(|e| e.key == InputKey::Down));
    }

    #[test]
    fn test_long_press_uses_long_phase() {
        let events = PressDuration::Long.phases(InputKey::Ok);

        assert_eq!(events[1], InputEvent::new(InputKey::Ok, InputPhase::Long));
    }

    #[test]
    fn test_button_names_parse_to_keys() {
        for key in [
            InputKey::Up,
            InputKey::Down,
            InputKey::Left,
            InputKey::Right,
            InputKey::Ok,
            InputKey::Back,
        ] {
            assert_eq!(key.as_str().parse::<InputKey>(), Ok(key));
        }
    }

    #[test]
    fn test_unknown_button_is_configuration_error() {
        assert_eq!(
            "MENU".parse::<InputKey>(),
            Err(ConfigurationError::InvalidButton("MENU".to_string()))
        );
    }

    #[test]
    fn test_unknown_duration_is_configuration_error() {
        assert_eq!(
            "MEDIUM".parse::<PressDuration>(),
            Err(ConfigurationError::InvalidDuration("MEDIUM".to_string()))
        );
    }
}
