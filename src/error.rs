//! Our error types for SigenStor Modbus communications.

use strum_macros::Display;
use thiserror::Error;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// The raw Modbus operation that was being attempted when a [`Error::Transport`] was raised.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    #[strum(to_string = "read holding registers")]
    ReadHoldingRegisters,
    #[strum(to_string = "write single register")]
    WriteSingleRegister,
}

/// Custom error type for SigenStor communications.
///
/// `I` is the error type of the link the sessions run over, e.g. [`crate::net::IoError`] for TCP.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    /// The link to the device could not be opened.
    #[error("Could not connect session for unit {unit_id}")]
    Connection {
        unit_id: u8,
        #[source]
        fault: I,
    },
    /// A raw read or write was attempted but did not complete successfully.
    #[error("{op} failed on unit {unit_id} at address {address} (count {count}): {fault}")]
    Transport {
        op: Operation,
        unit_id: u8,
        address: u16,
        count: u16,
        #[source]
        fault: Fault<I>,
    },
}

impl<I: embedded_io::Error> Error<I> {
    /// Return the underlying fault if this was a failed read/write.
    pub fn fault(&self) -> Option<&Fault<I>> {
        match self {
            Error::Transport { fault, .. } => Some(fault),
            Error::Connection { .. } => None,
        }
    }
}

/// What went wrong during a single request/response exchange.
#[derive(Error, Debug)]
pub enum Fault<I: embedded_io::Error> {
    #[error("Link I/O error")]
    Io(#[source] I),
    #[error("Link closed before a complete response was received")]
    UnexpectedEof,
    #[error("Modbus protocol error: {0}")]
    Modbus(rmodbus::ErrorKind),
    #[error("Expected {expected} registers, response contained {actual}")]
    ResponseLength { expected: usize, actual: usize },
    #[error("Response frame length {0} is not a valid Modbus TCP frame length")]
    FrameLength(usize),
    #[error("Invalid response received")]
    InvalidResponse,
    #[error("Frame buffer error")]
    BufferError,
}

impl<I: embedded_io::Error> From<rmodbus::ErrorKind> for Fault<I> {
    fn from(err: rmodbus::ErrorKind) -> Self {
        Fault::Modbus(err)
    }
}

impl<I: embedded_io::Error> From<embedded_io::ReadExactError<I>> for Fault<I> {
    fn from(err: embedded_io::ReadExactError<I>) -> Self {
        match err {
            embedded_io::ReadExactError::UnexpectedEof => Fault::UnexpectedEof,
            embedded_io::ReadExactError::Other(e) => Fault::Io(e),
        }
    }
}

/// Errors raised while loading a [`crate::config::ClientConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("Could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
