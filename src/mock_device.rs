//! We use this mocking module in unit tests to emulate a SigenStor answering Modbus TCP frames.
//!
//! One [`MockDevice`] holds the register contents for every unit id. Any number of [`MockLink`]s opened
//! through a [`MockConnector`] talk to the same device, the way both client sessions share one TCP endpoint.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use crate::transport::Connector;

#[derive(Error, Debug)]
pub enum MockError {
    /// Simulated refused connection.
    #[error("Connection refused")]
    ConnectionRefused,
    /// Generic simulated error for testing.
    #[error("Simulated error")]
    SimulatedError,
}

impl embedded_io::Error for MockError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockError::ConnectionRefused => embedded_io::ErrorKind::ConnectionRefused,
            MockError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

/// A write seen by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedWrite {
    pub unit_id: u8,
    pub address: u16,
    pub value: u16,
}

#[derive(Default)]
pub struct MockDevice {
    /// Register contents keyed by (unit id, address). Missing registers read as 0.
    registers: HashMap<(u8, u16), u16>,
    /// Every complete request frame received, in order.
    requests: Vec<Vec<u8>>,
    writes: Vec<RecordedWrite>,
    connects: usize,
    refuse_connections: bool,
    fail_reads: bool,
    /// Answer any request at this address with this exception code.
    exception: Option<(u16, u8)>,
    /// Return only this many registers from any read.
    truncate_reads: Option<usize>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_register(&mut self, unit_id: u8, address: u16, value: u16) -> &mut Self {
        self.registers.insert((unit_id, address), value);
        self
    }

    pub fn set_registers(&mut self, unit_id: u8, start: u16, values: &[u16]) -> &mut Self {
        for (offset, value) in values.iter().enumerate() {
            self.registers.insert((unit_id, start + offset as u16), *value);
        }
        self
    }

    pub fn register(&self, unit_id: u8, address: u16) -> u16 {
        self.registers.get(&(unit_id, address)).copied().unwrap_or(0)
    }

    pub fn requests(&self) -> &[Vec<u8>] {
        &self.requests
    }

    pub fn writes(&self) -> &[RecordedWrite] {
        &self.writes
    }

    pub fn connects(&self) -> usize {
        self.connects
    }

    /// Configure whether new connections should be refused.
    pub fn set_refuse_connections(&mut self, refuse: bool) {
        self.refuse_connections = refuse;
    }

    /// Configure whether reads from any link should fail with an error.
    pub fn set_read_error(&mut self, should_error: bool) {
        self.fail_reads = should_error;
    }

    pub fn set_exception(&mut self, address: u16, code: u8) {
        self.exception = Some((address, code));
    }

    pub fn set_truncate_reads(&mut self, registers: Option<usize>) {
        self.truncate_reads = registers;
    }

    /// Build the response frame for one complete request frame.
    fn respond(&mut self, request: &[u8]) -> Vec<u8> {
        self.requests.push(request.to_vec());

        let unit_id = request[6];
        let function = request[7];
        let address = u16::from_be_bytes([request[8], request[9]]);
        let operand = u16::from_be_bytes([request[10], request[11]]);

        let pdu = match (self.exception, function) {
            (Some((exc_address, code)), _) if exc_address == address => vec![function | 0x80, code],
            (_, 0x03) => {
                let mut count = operand as usize;
                if let Some(limit) = self.truncate_reads {
                    count = count.min(limit);
                }
                let mut pdu = vec![0x03, (count * 2) as u8];
                for offset in 0..count as u16 {
                    pdu.extend_from_slice(&self.register(unit_id, address + offset).to_be_bytes());
                }
                pdu
            }
            (_, 0x06) => {
                self.registers.insert((unit_id, address), operand);
                self.writes.push(RecordedWrite {
                    unit_id,
                    address,
                    value: operand,
                });
                // A successful write single register response echoes the request.
                request[7..12].to_vec()
            }
            // Illegal function.
            _ => vec![function | 0x80, 0x01],
        };

        let length = (pdu.len() + 1) as u16;
        let mut frame = Vec::with_capacity(7 + pdu.len());
        // Transaction id echoed, protocol id 0.
        frame.extend_from_slice(&request[0..2]);
        frame.extend_from_slice(&[0x00, 0x00]);
        frame.extend_from_slice(&length.to_be_bytes());
        frame.push(unit_id);
        frame.extend_from_slice(&pdu);
        frame
    }
}

/// Our mock type used to emulate one TCP connection to the device.
pub struct MockLink {
    device: Rc<RefCell<MockDevice>>,
    /// Request bytes received but not yet forming a complete frame.
    pending: Vec<u8>,
    /// Response bytes waiting to be read.
    response: Vec<u8>,
    read_position: usize,
}

impl embedded_io::ErrorType for MockLink {
    type Error = MockError;
}

impl embedded_io::Write for MockLink {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.pending.extend_from_slice(buf);

        // Process every complete frame we have.
        while self.pending.len() >= 6 {
            let frame_len = 6 + u16::from_be_bytes([self.pending[4], self.pending[5]]) as usize;
            if self.pending.len() < frame_len {
                break;
            }
            let request: Vec<u8> = self.pending.drain(..frame_len).collect();
            let response = self.device.borrow_mut().respond(&request);
            self.response.extend_from_slice(&response);
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io::Read for MockLink {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.device.borrow().fail_reads {
            return Err(MockError::SimulatedError);
        }

        // Nothing left reads as a closed connection.
        let available = &self.response[self.read_position..];
        let bytes_to_read = core::cmp::min(buf.len(), available.len());
        buf[..bytes_to_read].copy_from_slice(&available[..bytes_to_read]);
        self.read_position += bytes_to_read;
        Ok(bytes_to_read)
    }
}

#[derive(Clone)]
pub struct MockConnector {
    device: Rc<RefCell<MockDevice>>,
}

impl MockConnector {
    pub fn new(device: &Rc<RefCell<MockDevice>>) -> Self {
        Self {
            device: Rc::clone(device),
        }
    }
}

impl Connector for MockConnector {
    type Error = MockError;
    type Link = MockLink;

    fn connect(&mut self) -> Result<MockLink, MockError> {
        let mut device = self.device.borrow_mut();
        if device.refuse_connections {
            return Err(MockError::ConnectionRefused);
        }
        device.connects += 1;
        Ok(MockLink {
            device: Rc::clone(&self.device),
            pending: Vec::new(),
            response: Vec::new(),
            read_position: 0,
        })
    }
}

/// Shared device plus a connector to it.
pub fn mock() -> (Rc<RefCell<MockDevice>>, MockConnector) {
    let device = Rc::new(RefCell::new(MockDevice::new()));
    let connector = MockConnector::new(&device);
    (device, connector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Read, Write};

    #[test]
    fn test_read_request_is_answered() {
        let (device, mut connector) = mock();
        device.borrow_mut().set_registers(247, 30005, &[0x1234, 0x5678]);

        let mut link = connector.connect().unwrap();
        // tid 7, protocol 0, length 6, unit 247, read holding 30005 count 2
        let request = [0x00, 0x07, 0x00, 0x00, 0x00, 0x06, 0xF7, 0x03, 0x75, 0x35, 0x00, 0x02];
        link.write_all(&request).unwrap();

        let mut response = [0u8; 13];
        link.read_exact(&mut response).unwrap();
        assert_eq!(
            response,
            [0x00, 0x07, 0x00, 0x00, 0x00, 0x07, 0xF7, 0x03, 0x04, 0x12, 0x34, 0x56, 0x78]
        );
        assert_eq!(device.borrow().requests(), [request.to_vec()]);
    }

    #[test]
    fn test_partial_writes_are_buffered() {
        let (device, mut connector) = mock();
        let mut link = connector.connect().unwrap();
        let request = [0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0xF7, 0x06, 0x9C, 0x5D, 0x00, 0x01];

        link.write_all(&request[..5]).unwrap();
        assert!(device.borrow().requests().is_empty());
        link.write_all(&request[5..]).unwrap();

        let mut response = [0u8; 12];
        link.read_exact(&mut response).unwrap();
        assert_eq!(response, request);
        assert_eq!(
            device.borrow().writes(),
            [RecordedWrite {
                unit_id: 247,
                address: 40029,
                value: 1
            }]
        );
        assert_eq!(device.borrow().register(247, 40029), 1);
    }

    #[test]
    fn test_units_are_separate() {
        let (device, mut connector) = mock();
        device.borrow_mut().set_register(1, 30601, 553);

        let mut link = connector.connect().unwrap();
        let request = [0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0xF7, 0x03, 0x77, 0x89, 0x00, 0x01];
        link.write_all(&request).unwrap();

        let mut response = [0u8; 11];
        link.read_exact(&mut response).unwrap();
        // Unit 247 has nothing at 30601.
        assert_eq!(&response[9..], &[0x00, 0x00]);
    }

    #[test]
    fn test_exception_response() {
        let (device, mut connector) = mock();
        device.borrow_mut().set_exception(30003, 0x02);

        let mut link = connector.connect().unwrap();
        let request = [0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0xF7, 0x03, 0x75, 0x33, 0x00, 0x01];
        link.write_all(&request).unwrap();

        let mut response = [0u8; 9];
        link.read_exact(&mut response).unwrap();
        assert_eq!(response, [0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0xF7, 0x83, 0x02]);
    }

    #[test]
    fn test_read_error_simulation() {
        let (device, mut connector) = mock();
        device.borrow_mut().set_read_error(true);

        let mut link = connector.connect().unwrap();
        let mut buffer = [0u8; 4];
        assert!(matches!(link.read(&mut buffer), Err(MockError::SimulatedError)));
    }

    #[test]
    fn test_refused_connection() {
        let (device, mut connector) = mock();
        device.borrow_mut().set_refuse_connections(true);
        assert!(matches!(connector.connect(), Err(MockError::ConnectionRefused)));
        assert_eq!(device.borrow().connects(), 0);
    }

    #[test]
    fn test_errors_are_std_errors() {
        fn kind_and_message<E: embedded_io::Error>(err: E) -> (embedded_io::ErrorKind, String) {
            (err.kind(), err.to_string())
        }
        let (kind, message) = kind_and_message(MockError::ConnectionRefused);
        assert!(matches!(kind, embedded_io::ErrorKind::ConnectionRefused));
        assert_eq!(message, "Connection refused");
        let (kind, message) = kind_and_message(MockError::SimulatedError);
        assert!(matches!(kind, embedded_io::ErrorKind::Other));
        assert_eq!(message, "Simulated error");
    }

    #[test]
    fn test_exhausted_reads_return_zero() {
        let (_device, mut connector) = mock();
        let mut link = connector.connect().unwrap();
        let mut buffer = [0u8; 4];
        assert_eq!(link.read(&mut buffer).unwrap(), 0);
    }
}
