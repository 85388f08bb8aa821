//! Transport layer for the CR35 driver
//!
//! The device speaks its protocol over a plain TCP stream. The driver
//! only ever sees the [`Transport`] trait, so tests can substitute a
//! scripted implementation.

pub mod error;
pub mod tcp;

pub use error::{Error, Result};
pub use tcp::TcpTransport;

use async_trait::async_trait;
use bytes::Bytes;

/// Byte-oriented duplex link to the device.
#[async_trait]
pub trait Transport: Send {
    /// Establish the connection.
    async fn connect(&mut self) -> Result<()>;

    /// Close the connection, gracefully where possible.
    async fn disconnect(&mut self) -> Result<()>;

    /// Whether the link is currently up.
    fn is_connected(&self) -> bool;

    /// Write raw bytes.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Await the next chunk of incoming bytes (never empty).
    ///
    /// Returns [`Error::ConnectionClosed`] once the peer shuts the stream
    /// down.
    async fn recv(&mut self) -> Result<Bytes>;

    /// Remote address for log lines.
    fn remote_addr(&self) -> String;
}
