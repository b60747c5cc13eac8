//! `SerialLine` over any tokio byte stream.
//!
//! Useful for TCP serial bridges (`ser2net`) and for tests with
//! `tokio::io::duplex`.  Reads go through an internal buffer so a line split
//! across reads, or cut by a timeout, is never lost.

use std::time::Duration;

use async_trait::async_trait;
use bench_core::protocol::LINE_TERMINATOR;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

use crate::application::peripheral::{SerialError, SerialLine};

const CHUNK: usize = 256;

pub struct StreamLine<S> {
    stream: S,
    pending: Vec<u8>,
}

impl<S> StreamLine<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            pending: Vec::new(),
        }
    }

    /// Removes and decodes the first complete line in the buffer.
    fn take_line(&mut self) -> Option<String> {
        let end = self
            .pending
            .iter()
            .position(|&b| b == LINE_TERMINATOR as u8)?;
        let raw: Vec<u8> = self.pending.drain(..=end).collect();
        Some(decode_line(&raw))
    }
}

/// Lossy UTF-8 without the trailing `\n` or `\r\n`.
fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\r', '\n'])
        .to_string()
}

#[async_trait]
impl<S> SerialLine for StreamLine<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + Sync,
{
    async fn write_line(&mut self, line: &str) -> Result<(), SerialError> {
        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(LINE_TERMINATOR as u8);
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self, timeout: Duration) -> Result<Option<String>, SerialError> {
        let deadline = Instant::now() + timeout;
        let mut chunk = [0u8; CHUNK];
        loop {
            if let Some(line) = self.take_line() {
                return Ok(Some(line));
            }
            match tokio::time::timeout_at(deadline, self.stream.read(&mut chunk)).await {
                Err(_elapsed) => return Ok(None),
                Ok(Ok(0)) if self.pending.is_empty() => return Err(SerialError::Closed),
                Ok(Ok(0)) => {
                    let rest = std::mem::take(&mut self.pending);
                    return Ok(Some(decode_line(&rest)));
                }
                Ok(Ok(n)) => self.pending.extend_from_slice(&chunk[..n]),
                Ok(Err(e)) => return Err(e.into()),
            }
        }
    }

    async fn clear_input(&mut self) -> Result<(), SerialError> {
        self.pending.clear();
        let mut chunk = [0u8; CHUNK];
        // A zero timeout still polls the read once, so this drains exactly
        // what has already arrived.
        loop {
            match tokio::time::timeout(Duration::ZERO, self.stream.read(&mut chunk)).await {
                Ok(Ok(0)) | Err(_) => return Ok(()),
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_write_line_appends_terminator() {
        // Arrange
        let (near, mut far) = duplex(64);
        let mut line = StreamLine::new(near);

        // Act
        line.write_line("$H").await.unwrap();

        // Assert
        let mut buf = [0u8; 3];
        far.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"$H\n");
    }

    #[tokio::test]
    async fn test_read_line_joins_split_writes_and_strips_crlf() {
        let (near, mut far) = duplex(64);
        let mut line = StreamLine::new(near);

        far.write_all(b"<Idle|MP").await.unwrap();
        far.write_all(b"os:0,0,0>\r\nok\n").await.unwrap();

        let first = line.read_line(Duration::from_secs(1)).await.unwrap();
        let second = line.read_line(Duration::from_secs(1)).await.unwrap();

        assert_eq!(first.as_deref(), Some("<Idle|MPos:0,0,0>"));
        assert_eq!(second.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_read_line_times_out_and_keeps_partial_line() {
        let (near, mut far) = duplex(64);
        let mut line = StreamLine::new(near);
        far.write_all(b"EM4100 ").await.unwrap();

        let nothing = line.read_line(Duration::from_millis(20)).await.unwrap();
        far.write_all(b"0123456789\n").await.unwrap();
        let later = line.read_line(Duration::from_secs(1)).await.unwrap();

        assert_eq!(nothing, None);
        assert_eq!(later.as_deref(), Some("EM4100 0123456789"));
    }

    #[tokio::test]
    async fn test_clear_input_drops_received_bytes() {
        let (near, mut far) = duplex(64);
        let mut line = StreamLine::new(near);
        far.write_all(b"stale line\nstale partial").await.unwrap();

        line.clear_input().await.unwrap();
        far.write_all(b"fresh\n").await.unwrap();

        assert_eq!(
            line.read_line(Duration::from_secs(1)).await.unwrap().as_deref(),
            Some("fresh")
        );
    }

    #[tokio::test]
    async fn test_closed_stream_is_reported() {
        let (near, far) = duplex(64);
        let mut line = StreamLine::new(near);
        drop(far);

        assert!(matches!(
            line.read_line(Duration::from_secs(1)).await,
            Err(SerialError::Closed)
        ));
    }
}
