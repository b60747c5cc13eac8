//! Scripted serial line for tests and dry runs.
//!
//! `ScriptedLine` plays the peripheral side of a conversation: writing a
//! command queues the next scripted reply batch for that command, and
//! `read_line` hands those lines back in order.  It never waits; an empty
//! input buffer reads as "nothing arrived in time".
//!
//! The script lives behind an `Arc`, so a test keeps a clone to inspect
//! what was written after handing the line to a controller:
//!
//! ```ignore
//! let line = ScriptedLine::new().with_reply("$H", &["ok"]);
//! let probe = line.clone();
//! let mut gantry = GantryController::new(Box::new(line), 900.0, 900.0);
//! gantry.home(Duration::from_secs(1)).await?;
//! assert_eq!(probe.written(), vec!["$H"]);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::application::peripheral::{SerialError, SerialLine};

/// One thing the controller did to the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    Wrote(String),
    Cleared,
}

#[derive(Default)]
struct Script {
    incoming: VecDeque<String>,
    replies: HashMap<String, VecDeque<Vec<String>>>,
    events: Vec<LineEvent>,
    should_fail: bool,
}

#[derive(Clone, Default)]
pub struct ScriptedLine {
    script: Arc<Mutex<Script>>,
}

impl ScriptedLine {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues `lines` as the reply to the next unanswered write of
    /// `command`.  Batches for the same command are used in order.
    pub fn with_reply(self, command: &str, lines: &[&str]) -> Self {
        self.script()
            .replies
            .entry(command.to_string())
            .or_default()
            .push_back(lines.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Makes `line` readable now, as if the peripheral sent it unprompted.
    pub fn push_incoming(&self, line: &str) {
        self.script().incoming.push_back(line.to_string());
    }

    /// Makes every later call fail with [`SerialError::Closed`].
    pub fn fail(&self) {
        self.script().should_fail = true;
    }

    pub fn events(&self) -> Vec<LineEvent> {
        self.script().events.clone()
    }

    /// Every line written, in order.
    pub fn written(&self) -> Vec<String> {
        self.script()
            .events
            .iter()
            .filter_map(|e| match e {
                LineEvent::Wrote(line) => Some(line.clone()),
                LineEvent::Cleared => None,
            })
            .collect()
    }

    /// Lines received but not yet read.
    pub fn pending(&self) -> usize {
        self.script().incoming.len()
    }
}

#[async_trait]
impl SerialLine for ScriptedLine {
    async fn write_line(&mut self, line: &str) -> Result<(), SerialError> {
        let mut script = self.script();
        if script.should_fail {
            return Err(SerialError::Closed);
        }
        script.events.push(LineEvent::Wrote(line.to_string()));
        let reply = script
            .replies
            .get_mut(line)
            .and_then(|batches| batches.pop_front());
        if let Some(lines) = reply {
            script.incoming.extend(lines);
        }
        Ok(())
    }

    async fn read_line(&mut self, _timeout: Duration) -> Result<Option<String>, SerialError> {
        let mut script = self.script();
        if script.should_fail {
            return Err(SerialError::Closed);
        }
        Ok(script.incoming.pop_front())
    }

    async fn clear_input(&mut self) -> Result<(), SerialError> {
        let mut script = self.script();
        if script.should_fail {
            return Err(SerialError::Closed);
        }
        script.incoming.clear();
        script.events.push(LineEvent::Cleared);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reply_batches_are_used_in_order() {
        // Arrange
        let mut line = ScriptedLine::new()
            .with_reply("?", &["<Run|MPos:1,1,0>"])
            .with_reply("?", &["<Idle|MPos:2,2,0>"]);

        // Act
        line.write_line("?").await.unwrap();
        let first = line.read_line(Duration::ZERO).await.unwrap();
        line.write_line("?").await.unwrap();
        let second = line.read_line(Duration::ZERO).await.unwrap();
        line.write_line("?").await.unwrap();
        let third = line.read_line(Duration::ZERO).await.unwrap();

        // Assert
        assert_eq!(first.as_deref(), Some("<Run|MPos:1,1,0>"));
        assert_eq!(second.as_deref(), Some("<Idle|MPos:2,2,0>"));
        assert_eq!(third, None);
    }

    #[tokio::test]
    async fn test_clear_discards_pending_lines() {
        let mut line = ScriptedLine::new();
        line.push_incoming("stale");

        line.clear_input().await.unwrap();

        assert_eq!(line.pending(), 0);
        assert_eq!(line.events(), vec![LineEvent::Cleared]);
    }

    #[tokio::test]
    async fn test_failing_line_reports_closed() {
        let mut line = ScriptedLine::new();
        line.fail();

        assert!(matches!(
            line.write_line("R0K0").await,
            Err(SerialError::Closed)
        ));
        assert!(line.written().is_empty());
    }
}
