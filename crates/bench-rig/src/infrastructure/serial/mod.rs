//! `SerialLine` implementations.
//!
//! - **`port`** – a real serial port through `serialport`.
//! - **`stream`** – any tokio `AsyncRead + AsyncWrite` stream (TCP serial
//!   bridges, in-memory duplex pipes).
//! - **`mock`** – a scripted peripheral for tests and dry runs.

pub mod mock;
pub mod port;
pub mod stream;

pub use mock::{LineEvent, ScriptedLine};
pub use port::PortLine;
pub use stream::StreamLine;
