//! The boundary between register decoding and the wire.
//!
//! A [`Connector`] opens links, anything implementing [`embedded_io::Read`] & [`embedded_io::Write`]. A
//! [`ModbusTransport`] is bound to one unit id and provides the two raw operations the register map is built on.

use crate::error::Result;

/// Opens links to the device.
///
/// Sessions call [`Connector::connect`] whenever they need a fresh link, which depending on the
/// [`SessionMode`](crate::config::SessionMode) is either once or for every operation.
pub trait Connector {
    type Error: embedded_io::Error;
    type Link: embedded_io::Read + embedded_io::Write + embedded_io::ErrorType<Error = Self::Error>;

    fn connect(&mut self) -> core::result::Result<Self::Link, Self::Error>;
}

/// Raw register access for a single Modbus unit.
pub trait ModbusTransport {
    type Error: embedded_io::Error;

    /// Modbus unit identifier this transport addresses.
    fn unit_id(&self) -> u8;

    /// Read exactly `N` consecutive holding registers starting at `address`.
    ///
    /// A response with any other number of registers is an error.
    fn read_holding_registers<const N: usize>(&mut self, address: u16) -> Result<[u16; N], Self::Error>;

    /// Write a single holding register.
    fn write_single_register(&mut self, address: u16, value: u16) -> Result<(), Self::Error>;
}
