//! Gantry (2-axis stage) command lines.
//!
//! | Command | Line |
//! |---------|------|
//! | Home | `$H` |
//! | Jog | `$J=X<x> Y<y> F<feed>` |
//! | Status query | `?` |
//!
//! The controller answers a home with a line containing `ok` once homing has
//! finished, and a status query with a report containing `Idle` once motion
//! has stopped.

use std::fmt;
use std::str::FromStr;

use super::ProtocolError;

/// Substring that acknowledges a completed home cycle.
pub const ACK_MARKER: &str = "ok";

/// Substring of a status report once the stage has stopped.
pub const IDLE_MARKER: &str = "Idle";

/// One command to the motion controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GantryCommand {
    Home,
    /// Move to machine coordinates `(x, y)` at `feed` units per minute.
    Jog { x: f64, y: f64, feed: u32 },
    StatusQuery,
}

impl GantryCommand {
    /// The command line without its terminator.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GantryCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GantryCommand::Home => f.write_str("$H"),
            GantryCommand::Jog { x, y, feed } => write!(f, "$J=X{x} Y{y} F{feed}"),
            GantryCommand::StatusQuery => f.write_str("?"),
        }
    }
}

fn field<T: FromStr>(
    words: &[&str],
    name: char,
    command: &'static str,
) -> Result<T, ProtocolError> {
    let raw = words
        .iter()
        .find_map(|w| w.strip_prefix(name))
        .ok_or(ProtocolError::MissingField {
            command,
            field: name,
        })?;
    raw.parse().map_err(|_| ProtocolError::InvalidNumber {
        field: name,
        value: raw.to_string(),
    })
}

impl FromStr for GantryCommand {
    type Err = ProtocolError;

    /// Parses a command line.  Spaces around the `=` of a jog are tolerated.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        match line {
            "" => Err(ProtocolError::Empty),
            "$H" => Ok(GantryCommand::Home),
            "?" => Ok(GantryCommand::StatusQuery),
            _ => {
                let body = line
                    .strip_prefix("$J")
                    .and_then(|rest| rest.trim_start().strip_prefix('='))
                    .ok_or_else(|| ProtocolError::UnknownCommand(line.to_string()))?;
                let words: Vec<&str> = body.split_whitespace().collect();
                Ok(GantryCommand::Jog {
                    x: field(&words, 'X', "jog")?,
                    y: field(&words, 'Y', "jog")?,
                    feed: field(&words, 'F', "jog")?,
                })
            }
        }
    }
}

/// What a line read back from the motion controller means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GantryReply {
    /// Status report of a stopped stage.
    Idle,
    /// Acknowledgement (`ok`).
    Ack,
    /// Anything else: a busy status report, an alarm, a banner.
    Other(String),
}

impl GantryReply {
    pub fn classify(line: &str) -> Self {
        if line.contains(IDLE_MARKER) {
            GantryReply::Idle
        } else if line.contains(ACK_MARKER) {
            GantryReply::Ack
        } else {
            GantryReply::Other(line.trim_end().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_commands() {
        assert_eq!(GantryCommand::Home.encode(), "$H");
        assert_eq!(GantryCommand::StatusQuery.encode(), "?");
        assert_eq!(
            GantryCommand::Jog {
                x: 25.0,
                y: -10.5,
                feed: 15000
            }
            .encode(),
            "$J=X25 Y-10.5 F15000"
        );
    }

    #[test]
    fn test_parse_jog_with_spaced_equals() {
        let cmd: GantryCommand = "$J = X-25 Y10 F3000\n".parse().unwrap();

        assert_eq!(
            cmd,
            GantryCommand::Jog {
                x: -25.0,
                y: 10.0,
                feed: 3000
            }
        );
    }

    #[test]
    fn test_parse_jog_missing_feed_is_error() {
        assert_eq!(
            "$J=X1 Y2".parse::<GantryCommand>(),
            Err(ProtocolError::MissingField {
                command: "jog",
                field: 'F'
            })
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!("".parse::<GantryCommand>(), Err(ProtocolError::Empty));
        assert!(matches!(
            "$X".parse::<GantryCommand>(),
            Err(ProtocolError::UnknownCommand(_))
        ));
        assert!(matches!(
            "$J=Xabc Y1 F1".parse::<GantryCommand>(),
            Err(ProtocolError::InvalidNumber { field: 'X', .. })
        ));
    }

    #[test]
    fn test_classify_replies() {
        assert_eq!(GantryReply::classify("ok\r\n"), GantryReply::Ack);
        assert_eq!(
            GantryReply::classify("<Idle|MPos:0.000,0.000,0.000|FS:0,0>"),
            GantryReply::Idle
        );
        assert_eq!(
            GantryReply::classify("<Jog|MPos:1.000,0.000,0.000>\r\n"),
            GantryReply::Other("<Jog|MPos:1.000,0.000,0.000>".to_string())
        );
    }
}
