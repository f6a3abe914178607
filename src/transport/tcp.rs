//! Synchronous TCP transport.
//!
//! The default DLMS/COSEM TCP port is **4059** as specified in IEC 62056-47.
//! Streams are opened with a connect timeout and carry the same value as
//! their read and write timeout. Nagle's algorithm (`TCP_NODELAY`) is
//! disabled for lower latency.
//!
//! # Examples
//!
//! ```no_run
//! use dlms_meter::transport::{Connector, Transport};
//! use dlms_meter::transport::tcp::TcpConnector;
//! use std::time::Duration;
//!
//! # fn example() -> std::io::Result<()> {
//! let mut transport = TcpConnector.connect("192.168.1.100", 4059, Duration::from_secs(5))?;
//! transport.send(&[0x00, 0x01])?;
//! # Ok(())
//! # }
//! ```

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::{Connector, Transport};

/// Default DLMS/COSEM TCP port (IEC 62056-47).
pub const DEFAULT_DLMS_TCP_PORT: u16 = 4059;

#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Connects to the first reachable address `addr` resolves to.
    pub fn connect_timeout<A: ToSocketAddrs>(addr: A, timeout: Duration) -> io::Result<Self> {
        let mut last_err = None;
        for socket_addr in addr.to_socket_addrs()? {
            match TcpStream::connect_timeout(&socket_addr, timeout) {
                Ok(stream) => return Self::from_stream(stream, timeout),
                Err(err) => {
                    log::debug!("connect to {} failed: {}", socket_addr, err);
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "address resolved to no socket addresses")
        }))
    }

    fn from_stream(stream: TcpStream, timeout: Duration) -> io::Result<Self> {
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }

    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_read_timeout(timeout)
    }

    pub fn peer_addr(&self) -> io::Result<std::net::SocketAddr> {
        self.stream.peer_addr()
    }
}

impl Transport for TcpTransport {
    type Error = io::Error;

    fn send(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.stream.write_all(data)?;
        self.stream.flush()
    }

    fn recv(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        self.stream.read(buffer)
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        match self.stream.shutdown(Shutdown::Both) {
            // The peer may already have torn the connection down.
            Err(err) if err.kind() == io::ErrorKind::NotConnected => Ok(()),
            result => result,
        }
    }
}

/// Opens [`TcpTransport`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Transport = TcpTransport;
    type Error = io::Error;

    fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<Self::Transport, Self::Error> {
        TcpTransport::connect_timeout((host, port), timeout)
    }
}
