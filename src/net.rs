//! Modbus TCP links over [`std::net::TcpStream`].

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::{config::DEFAULT_PORT, transport::Connector};

/// A [`std::io::Error`] exposed as an [`embedded_io::Error`].
///
/// Sessions are generic over `embedded_io` links, so the TCP link needs its socket errors in that form. Only the
/// kinds a socket connect, read or write can report are kept apart, the rest are `Other`.
#[derive(Debug)]
pub struct IoError(pub io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        use embedded_io::ErrorKind as Kind;
        match self.0.kind() {
            io::ErrorKind::ConnectionRefused => Kind::ConnectionRefused,
            io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe => Kind::ConnectionReset,
            io::ErrorKind::ConnectionAborted => Kind::ConnectionAborted,
            io::ErrorKind::NotConnected => Kind::NotConnected,
            io::ErrorKind::AddrNotAvailable => Kind::AddrNotAvailable,
            // Socket timeouts surface as WouldBlock on some platforms.
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Kind::TimedOut,
            io::ErrorKind::Interrupted => Kind::Interrupted,
            // Unresolvable host.
            io::ErrorKind::NotFound | io::ErrorKind::InvalidInput => Kind::InvalidInput,
            _ => Kind::Other,
        }
    }
}

impl From<io::Error> for IoError {
    fn from(err: io::Error) -> Self {
        IoError(err)
    }
}

/// One open TCP connection to the device.
pub struct TcpLink(TcpStream);

impl embedded_io::ErrorType for TcpLink {
    type Error = IoError;
}

impl embedded_io::Read for TcpLink {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::Write for TcpLink {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        io::Write::flush(&mut self.0).map_err(IoError)
    }
}

/// Opens [`TcpLink`]s to `host:port`.
///
/// The host is resolved on every connect, so a client can be constructed before the device is reachable.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    host: String,
    port: u16,
    timeout: Option<Duration>,
}

impl TcpConnector {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: None,
        }
    }

    /// Connector for the standard Modbus TCP port.
    pub fn with_default_port(host: impl Into<String>) -> Self {
        Self::new(host, DEFAULT_PORT)
    }

    /// Apply a connect, read and write timeout. `None` blocks indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn open_stream(&self) -> io::Result<TcpStream> {
        let Some(timeout) = self.timeout else {
            return TcpStream::connect((self.host.as_str(), self.port));
        };

        let mut last_err = None;
        for addr in (self.host.as_str(), self.port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
        }))
    }
}

impl Connector for TcpConnector {
    type Error = IoError;
    type Link = TcpLink;

    fn connect(&mut self) -> Result<TcpLink, IoError> {
        let stream = self.open_stream()?;
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;
        stream.set_nodelay(true)?;
        debug!(host = %self.host, port = self.port, "connected");
        Ok(TcpLink(stream))
    }
}
