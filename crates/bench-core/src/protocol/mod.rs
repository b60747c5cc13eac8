//! ASCII line protocols spoken by the bench peripherals.
//!
//! Every command is one line of ASCII terminated by `\n`.  The types here
//! only encode and decode lines; writing them to a serial port and polling
//! for replies is the rig crate's job.
//!
//! - **`gantry`** – GRBL-style motion commands ([`GantryCommand`]) and reply
//!   classification ([`GantryReply`]).
//! - **`relay`** – The reader/key selector command ([`RelayCommand`]).

pub mod gantry;
pub mod relay;

pub use gantry::{GantryCommand, GantryReply};
pub use relay::RelayCommand;

use thiserror::Error;

/// Terminator appended to every command line.
pub const LINE_TERMINATOR: char = '\n';

/// Errors produced while parsing a command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty command line")]
    Empty,

    #[error("unrecognised command: {0:?}")]
    UnknownCommand(String),

    #[error("{command} command is missing its {field} field")]
    MissingField { command: &'static str, field: char },

    #[error("invalid {field} value: {value:?}")]
    InvalidNumber { field: char, value: String },
}
