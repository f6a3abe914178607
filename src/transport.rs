//! Transport provider seam.
//!
//! A [`Connector`] opens a byte-stream [`Transport`] to a meter. The session
//! layer only ever sends a complete message and then blocks in
//! [`Transport::recv`] until bytes arrive; it never sets per-message
//! deadlines, so the receive timeout is whatever the transport enforces.

use std::time::Duration;

#[cfg(feature = "transport-tcp")]
pub mod tcp;

/// Trait representing the underlying byte transport for DLMS/COSEM communication.
///
/// Implementations handle the low-level details of sending and receiving bytes.
pub trait Transport: core::fmt::Debug {
    /// The error type returned by transport operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends a complete message to the remote device.
    fn send(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives data from the remote device.
    ///
    /// Blocks until at least one byte is available and returns the number of
    /// bytes written into `buffer`. `Ok(0)` means the peer closed the
    /// connection.
    fn recv(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error>;

    /// Closes the connection. The default implementation does nothing and
    /// relies on `Drop`.
    fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Opens transports.
pub trait Connector {
    type Transport: Transport;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Connects to `host:port`, giving up after `timeout`.
    fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<Self::Transport, Self::Error>;
}
