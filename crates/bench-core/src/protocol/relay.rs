//! Relay selector command line: `R<reader>K<key>`.
//!
//! The board has no partial-update form, so every command carries both
//! indices.  It sends nothing back.

use std::fmt;
use std::str::FromStr;

use super::ProtocolError;

/// Selects which reader and which key are electrically connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RelayCommand {
    pub reader: u8,
    pub key: u8,
}

impl RelayCommand {
    /// Both indices zero: everything disconnected.
    pub const RESET: RelayCommand = RelayCommand { reader: 0, key: 0 };

    pub const fn new(reader: u8, key: u8) -> Self {
        Self { reader, key }
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RelayCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}K{}", self.reader, self.key)
    }
}

impl FromStr for RelayCommand {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ProtocolError::Empty);
        }
        let body = line
            .strip_prefix('R')
            .ok_or_else(|| ProtocolError::UnknownCommand(line.to_string()))?;
        let (reader, key) = body.split_once('K').ok_or(ProtocolError::MissingField {
            command: "relay",
            field: 'K',
        })?;
        let number = |field: char, value: &str| {
            value.parse::<u8>().map_err(|_| ProtocolError::InvalidNumber {
                field,
                value: value.to_string(),
            })
        };
        Ok(RelayCommand {
            reader: number('R', reader)?,
            key: number('K', key)?,
        })
    }
}
