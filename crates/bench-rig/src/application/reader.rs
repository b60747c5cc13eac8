//! Use case: one credential reader parked under the gantry.
//!
//! A reader prints a line whenever it sees a credential; nothing is ever
//! sent to it.  The slot keeps at most one captured line.  `update` replaces
//! it with the next line received, and `clear` drops it together with
//! anything still in the input buffer, so a caller that wants a fresh
//! capture clears first.

use std::time::Duration;

use tracing::{debug, info, instrument};

use super::gantry::GantryHandle;
use super::peripheral::{PeripheralError, SerialLine};

/// Feed rate for moves between reader slots.
pub const SLOT_FEED: u32 = 15000;

const READ_TIMEOUT: Duration = Duration::from_millis(100);
const MOVE_TIMEOUT: Duration = Duration::from_secs(60);

pub struct ReaderSlot {
    name: String,
    place: (f64, f64),
    line: Box<dyn SerialLine>,
    gantry: GantryHandle,
    read_timeout: Duration,
    move_timeout: Duration,
    captured: Option<String>,
}

impl ReaderSlot {
    /// A reader at bench coordinates `(x, y)`, reached through `gantry`.
    pub fn new(name: &str, x: f64, y: f64, line: Box<dyn SerialLine>, gantry: GantryHandle) -> Self {
        Self {
            name: name.to_string(),
            place: (x, y),
            line,
            gantry,
            read_timeout: READ_TIMEOUT,
            move_timeout: MOVE_TIMEOUT,
            captured: None,
        }
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_move_timeout(mut self, timeout: Duration) -> Self {
        self.move_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn place(&self) -> (f64, f64) {
        self.place
    }

    /// Moves the gantry over this reader.  Waits for the gantry if another
    /// slot is using it.
    #[instrument(skip(self), fields(slot = %self.name))]
    pub async fn go_to_place(&self) -> Result<(), PeripheralError> {
        let (x, y) = self.place;
        let mut gantry = self.gantry.lock().await;
        debug!("gantry acquired");
        gantry.swim_to(x, y, SLOT_FEED, self.move_timeout).await
    }

    /// Reads once; returns `true` if a non-empty line was captured.
    pub async fn update(&mut self) -> Result<bool, PeripheralError> {
        match self.line.read_line(self.read_timeout).await? {
            Some(line) if !line.trim().is_empty() => {
                info!(slot = %self.name, %line, "credential read");
                self.captured = Some(line);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Drops the captured line and any unread input.
    pub async fn clear(&mut self) -> Result<(), PeripheralError> {
        self.line.clear_input().await?;
        self.captured = None;
        Ok(())
    }

    /// The captured line, if any.
    pub fn get(&self) -> Option<&str> {
        self.captured.as_deref()
    }

    pub fn is_available(&self) -> bool {
        self.captured.is_some()
    }
}
