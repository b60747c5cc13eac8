//! The serial-line seam shared by every bench peripheral.
//!
//! The gantry, the credential readers and the relay board all speak ASCII
//! lines over a serial port.  Use cases only need three things from a port,
//! so they depend on the [`SerialLine`] trait rather than on `serialport`
//! directly.  Infrastructure provides a real-port adapter, a tokio stream
//! adapter and a scripted double.
//!
//! Every call is awaited before the next is issued; a line is never
//! pipelined.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a [`SerialLine`] implementation.
#[derive(Debug, Error)]
pub enum SerialError {
    #[error("cannot open serial port {port}: {reason}")]
    Open { port: String, reason: String },

    #[error("serial line closed")]
    Closed,

    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the gantry, reader and relay use cases.
#[derive(Debug, Error)]
pub enum PeripheralError {
    #[error(transparent)]
    Serial(#[from] SerialError),

    /// `home` never saw the acknowledgement.  The stage position is unknown.
    #[error("gantry did not acknowledge homing within {timeout:?}")]
    HomingTimedOut { timeout: Duration },

    /// The stage never reported idle; it may still be moving.
    #[error("gantry did not report idle within {timeout:?} after moving to ({x}, {y})")]
    MotionTimedOut { x: f64, y: f64, timeout: Duration },
}

/// A line-oriented serial connection.
#[async_trait]
pub trait SerialLine: Send + Sync {
    /// Writes `line` followed by the line terminator.
    async fn write_line(&mut self, line: &str) -> Result<(), SerialError>;

    /// Waits up to `timeout` for one complete line, returned without its
    /// terminator.  `Ok(None)` when no line arrived in time; a partial line
    /// stays buffered for the next call.
    async fn read_line(&mut self, timeout: Duration) -> Result<Option<String>, SerialError>;

    /// Discards everything received but not yet read.
    async fn clear_input(&mut self) -> Result<(), SerialError>;
}
