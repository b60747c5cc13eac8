//! Use case: move the gantry and wait until the move has really finished.
//!
//! # Request, poll, acknowledge (for beginners)
//!
//! The motion controller answers a command long before the stage stops
//! moving.  Completion has to be polled:
//!
//! ```text
//!   home:    "$H" ──► read lines ... until one contains "ok"
//!
//!   swim_to: "$J=X.. Y.. F.." ──► pause ──► ┌─ clear input
//!                                           ├─ "?"
//!                                           ├─ read status line
//!                                           └─ "Idle"? ── no ──► pause, repeat
//! ```
//!
//! Both loops carry a deadline.  Expiry means the stage is in an unknown
//! position and is reported as an error; nothing is rolled back.
//!
//! # Coordinates
//!
//! Callers use bench coordinates.  The controller's machine coordinates run
//! the other way from the far corner, so every target goes through
//! [`GantryController::transform`] first.
//!
//! # One mover at a time
//!
//! There is a single stage.  Everything that moves it goes through a
//! [`GantryHandle`], and a mover holds the lock for the whole
//! move-and-verify exchange.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bench_core::{GantryCommand, GantryReply};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

use super::peripheral::{PeripheralError, SerialLine};

/// Shared, exclusive access to the one gantry on the bench.
pub type GantryHandle = Arc<Mutex<GantryController>>;

/// Default travel of both axes.
pub const DEFAULT_TRAVEL: f64 = 900.0;

/// Default feed rate for operator moves.
pub const DEFAULT_FEED: u32 = 3000;

/// Pause between status polls.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How long one status read may wait.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

pub struct GantryController {
    line: Box<dyn SerialLine>,
    size_x: f64,
    size_y: f64,
    poll_interval: Duration,
    read_timeout: Duration,
}

impl GantryController {
    pub fn new(line: Box<dyn SerialLine>, size_x: f64, size_y: f64) -> Self {
        Self {
            line,
            size_x,
            size_y,
            poll_interval: POLL_INTERVAL,
            read_timeout: READ_TIMEOUT,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Wraps the controller for sharing between reader slots.
    pub fn into_handle(self) -> GantryHandle {
        Arc::new(Mutex::new(self))
    }

    /// Bench coordinates to machine coordinates.
    pub fn transform(&self, x: f64, y: f64) -> (f64, f64) {
        (-x - self.size_x, -y - self.size_y)
    }

    /// Runs the homing cycle and waits for its acknowledgement.
    ///
    /// # Errors
    ///
    /// [`PeripheralError::HomingTimedOut`] when no `ok` arrives within
    /// `timeout`.
    #[instrument(skip(self))]
    pub async fn home(&mut self, timeout: Duration) -> Result<(), PeripheralError> {
        info!("homing gantry");
        // An `ok` left over from an earlier command is not the homing ack.
        self.line.clear_input().await?;
        self.line.write_line(&GantryCommand::Home.encode()).await?;

        let start = Instant::now();
        loop {
            if let Some(line) = self.line.read_line(self.read_timeout).await? {
                match GantryReply::classify(&line) {
                    GantryReply::Ack => {
                        info!("gantry homed");
                        return Ok(());
                    }
                    _ => debug!(%line, "waiting for homing"),
                }
            }
            if start.elapsed() >= timeout {
                error!("homing not acknowledged");
                return Err(PeripheralError::HomingTimedOut { timeout });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Moves to bench coordinates `(x, y)` and waits until the stage
    /// reports idle.
    ///
    /// # Errors
    ///
    /// [`PeripheralError::MotionTimedOut`] when the stage is not idle within
    /// `timeout`.
    #[instrument(skip(self))]
    pub async fn swim_to(
        &mut self,
        x: f64,
        y: f64,
        feed: u32,
        timeout: Duration,
    ) -> Result<(), PeripheralError> {
        let (mx, my) = self.transform(x, y);
        let jog = GantryCommand::Jog { x: mx, y: my, feed };
        info!(command = %jog, "moving gantry");
        self.line.write_line(&jog.encode()).await?;

        let start = Instant::now();
        loop {
            tokio::time::sleep(self.poll_interval).await;
            self.line.clear_input().await?;
            self.line
                .write_line(&GantryCommand::StatusQuery.encode())
                .await?;
            if let Some(line) = self.line.read_line(self.read_timeout).await? {
                if GantryReply::classify(&line) == GantryReply::Idle {
                    info!("gantry in place");
                    return Ok(());
                }
                debug!(status = %line, "gantry moving");
            }
            if start.elapsed() >= timeout {
                error!("gantry did not settle");
                return Err(PeripheralError::MotionTimedOut { x, y, timeout });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::peripheral::SerialError;
    use crate::infrastructure::serial::{LineEvent, ScriptedLine};

    fn gantry(line: &ScriptedLine) -> GantryController {
        GantryController::new(Box::new(line.clone()), 900.0, 900.0)
            .with_poll_interval(Duration::from_millis(1))
    }

    #[test]
    fn test_transform_mirrors_about_the_far_corner() {
        let line = ScriptedLine::new();
        let gantry = GantryController::new(Box::new(line), 900.0, 450.0);

        for (x, y) in [(0.0, 0.0), (-925.0, -890.0), (12.5, -3.25), (1e6, -1e6)] {
            assert_eq!(gantry.transform(x, y), (-x - 900.0, -y - 450.0));
        }
    }

    #[tokio::test]
    async fn test_home_waits_for_ok_past_banner_lines() {
        // Arrange
        let line = ScriptedLine::new().with_reply("$H", &["Grbl 1.1h ['$' for help]", "[MSG:Homing]", "ok"]);
        let mut gantry = gantry(&line);

        // Act
        gantry.home(Duration::from_secs(1)).await.unwrap();

        // Assert
        assert_eq!(line.written(), vec!["$H"]);
        assert_eq!(line.pending(), 0);
    }

    #[tokio::test]
    async fn test_home_without_ack_times_out() {
        let line = ScriptedLine::new().with_reply("$H", &["ALARM:9"]);
        let mut gantry = gantry(&line);

        let result = gantry.home(Duration::from_millis(30)).await;

        assert!(matches!(result, Err(PeripheralError::HomingTimedOut { .. })));
    }

    #[tokio::test]
    async fn test_home_ignores_ack_received_before_homing() {
        // Arrange
        let line = ScriptedLine::new();
        line.push_incoming("ok");
        let mut gantry = gantry(&line);

        // Act
        let result = gantry.home(Duration::from_millis(30)).await;

        // Assert
        assert!(matches!(result, Err(PeripheralError::HomingTimedOut { .. })));
        assert_eq!(
            line.events(),
            vec![LineEvent::Cleared, LineEvent::Wrote("$H".to_string())]
        );
    }

    #[tokio::test]
    async fn test_swim_to_sends_transformed_jog_then_polls_until_idle() {
        // Arrange
        let line = ScriptedLine::new()
            .with_reply("?", &["<Jog|MPos:-10.000,-20.000,0.000>"])
            .with_reply("?", &["<Idle|MPos:25.000,-10.000,0.000>"]);
        let mut gantry = gantry(&line);

        // Act
        gantry
            .swim_to(-925.0, -890.0, 15000, Duration::from_secs(1))
            .await
            .unwrap();

        // Assert
        assert_eq!(
            line.events(),
            vec![
                LineEvent::Wrote("$J=X25 Y-10 F15000".into()),
                LineEvent::Cleared,
                LineEvent::Wrote("?".into()),
                LineEvent::Cleared,
                LineEvent::Wrote("?".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_swim_to_never_idle_times_out() {
        let line = ScriptedLine::new();
        let mut gantry = gantry(&line);

        let result = gantry
            .swim_to(0.0, 0.0, 3000, Duration::from_millis(20))
            .await;

        assert!(matches!(
            result,
            Err(PeripheralError::MotionTimedOut { x, y, .. }) if x == 0.0 && y == 0.0
        ));
    }

    #[tokio::test]
    async fn test_serial_failure_is_propagated() {
        let line = ScriptedLine::new();
        line.fail();
        let mut gantry = gantry(&line);

        let result = gantry.home(Duration::from_secs(1)).await;

        assert!(matches!(
            result,
            Err(PeripheralError::Serial(SerialError::Closed))
        ));
    }
}
