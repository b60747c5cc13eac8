//! Use case: select which reader and which key are wired up.
//!
//! The relay board only understands complete `(reader, key)` pairs, so the
//! selector remembers the last pair it sent and fills in the half a caller
//! did not change.  The remembered pair is only updated once the write has
//! gone through.

use bench_core::RelayCommand;
use tracing::info;

use super::peripheral::{PeripheralError, SerialLine};

pub struct RelaySelector {
    line: Box<dyn SerialLine>,
    current: RelayCommand,
}

impl RelaySelector {
    /// Takes over the board and disconnects everything.
    pub async fn connect(line: Box<dyn SerialLine>) -> Result<Self, PeripheralError> {
        let mut selector = Self {
            line,
            current: RelayCommand::RESET,
        };
        selector.reset().await?;
        Ok(selector)
    }

    async fn send(&mut self, command: RelayCommand) -> Result<(), PeripheralError> {
        self.line.write_line(&command.encode()).await?;
        self.current = command;
        info!(reader = command.reader, key = command.key, "relay set");
        Ok(())
    }

    pub async fn set_reader(&mut self, reader: u8) -> Result<(), PeripheralError> {
        self.send(RelayCommand::new(reader, self.current.key)).await
    }

    pub async fn set_key(&mut self, key: u8) -> Result<(), PeripheralError> {
        self.send(RelayCommand::new(self.current.reader, key)).await
    }

    /// Sends both indices at once.
    pub async fn select(&mut self, reader: u8, key: u8) -> Result<(), PeripheralError> {
        self.send(RelayCommand::new(reader, key)).await
    }

    /// Sends `R0K0`, whatever the current state.
    pub async fn reset(&mut self) -> Result<(), PeripheralError> {
        self.send(RelayCommand::RESET).await
    }

    pub fn get_reader(&self) -> u8 {
        self.current.reader
    }

    pub fn get_key(&self) -> u8 {
        self.current.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::serial::ScriptedLine;

    #[tokio::test]
    async fn test_connect_resets_the_board() {
        let line = ScriptedLine::new();

        let relay = RelaySelector::connect(Box::new(line.clone())).await.unwrap();

        assert_eq!(line.written(), vec!["R0K0"]);
        assert_eq!((relay.get_reader(), relay.get_key()), (0, 0));
    }

    #[tokio::test]
    async fn test_each_half_update_sends_the_full_pair() {
        // Arrange
        let line = ScriptedLine::new();
        let mut relay = RelaySelector::connect(Box::new(line.clone())).await.unwrap();

        // Act
        relay.set_reader(3).await.unwrap();
        relay.set_key(5).await.unwrap();
        relay.set_reader(1).await.unwrap();

        // Assert
        assert_eq!(line.written(), vec!["R0K0", "R3K0", "R3K5", "R1K5"]);
        assert_eq!((relay.get_reader(), relay.get_key()), (1, 5));
    }

    #[tokio::test]
    async fn test_reset_always_sends_zero_pair() {
        let line = ScriptedLine::new();
        let mut relay = RelaySelector::connect(Box::new(line.clone())).await.unwrap();
        relay.set_reader(3).await.unwrap();
        relay.set_key(5).await.unwrap();

        relay.reset().await.unwrap();
        relay.reset().await.unwrap();

        let written = line.written();
        assert_eq!(&written[written.len() - 2..], ["R0K0", "R0K0"]);
        assert_eq!((relay.get_reader(), relay.get_key()), (0, 0));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_state() {
        let line = ScriptedLine::new();
        let mut relay = RelaySelector::connect(Box::new(line.clone())).await.unwrap();
        relay.select(2, 4).await.unwrap();
        line.fail();

        assert!(relay.set_key(7).await.is_err());
        assert_eq!((relay.get_reader(), relay.get_key()), (2, 4));
    }
}
