//! `SerialLine` over a real serial port.
//!
//! `serialport` is a blocking API, so every operation runs on tokio's
//! blocking pool.  The port is opened with a short read timeout and
//! `read_line` keeps reading until a full line arrives or its own deadline
//! passes.

use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bench_core::protocol::LINE_TERMINATOR;
use serialport::{ClearBuffer, SerialPort};
use tracing::debug;

use crate::application::peripheral::{SerialError, SerialLine};

/// Read timeout of a single blocking `read` call.
const READ_SLICE: Duration = Duration::from_millis(20);

struct PortState {
    port: Box<dyn SerialPort>,
    pending: Vec<u8>,
}

impl PortState {
    fn take_line(&mut self) -> Option<String> {
        let end = self
            .pending
            .iter()
            .position(|&b| b == LINE_TERMINATOR as u8)?;
        let raw: Vec<u8> = self.pending.drain(..=end).collect();
        Some(
            String::from_utf8_lossy(&raw)
                .trim_end_matches(['\r', '\n'])
                .to_string(),
        )
    }
}

/// An open serial port, 8N1, no flow control.
pub struct PortLine {
    name: String,
    state: Arc<Mutex<PortState>>,
}

impl PortLine {
    /// Opens `path` at `baud`.
    pub fn open(path: &str, baud: u32) -> Result<Self, SerialError> {
        let port = serialport::new(path, baud)
            .timeout(READ_SLICE)
            .open()
            .map_err(|e| SerialError::Open {
                port: path.to_string(),
                reason: e.to_string(),
            })?;
        debug!(port = path, baud, "serial port opened");
        Ok(Self {
            name: path.to_string(),
            state: Arc::new(Mutex::new(PortState {
                port,
                pending: Vec::new(),
            })),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs `op` against the port on the blocking pool.
    async fn blocking<T, F>(&self, op: F) -> Result<T, SerialError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PortState) -> Result<T, SerialError> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        tokio::task::spawn_blocking(move || {
            let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
            op(&mut guard)
        })
        .await
        .map_err(|e| SerialError::Io(std::io::Error::other(e)))?
    }
}

#[async_trait]
impl SerialLine for PortLine {
    async fn write_line(&mut self, line: &str) -> Result<(), SerialError> {
        let mut bytes = line.as_bytes().to_vec();
        bytes.push(LINE_TERMINATOR as u8);
        self.blocking(move |state| {
            state.port.write_all(&bytes)?;
            state.port.flush()?;
            Ok(())
        })
        .await
    }

    async fn read_line(&mut self, timeout: Duration) -> Result<Option<String>, SerialError> {
        self.blocking(move |state| {
            let deadline = Instant::now() + timeout;
            let mut chunk = [0u8; 256];
            loop {
                if let Some(line) = state.take_line() {
                    return Ok(Some(line));
                }
                if Instant::now() >= deadline {
                    return Ok(None);
                }
                match state.port.read(&mut chunk) {
                    Ok(0) => {}
                    Ok(n) => state.pending.extend_from_slice(&chunk[..n]),
                    Err(e) if e.kind() == ErrorKind::TimedOut => {}
                    Err(e) => return Err(e.into()),
                }
            }
        })
        .await
    }

    async fn clear_input(&mut self) -> Result<(), SerialError> {
        self.blocking(|state| {
            state.pending.clear();
            state
                .port
                .clear(ClearBuffer::Input)
                .map_err(|e| SerialError::Io(e.into()))
        })
        .await
    }
}
