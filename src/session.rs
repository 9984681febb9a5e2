//! A Modbus TCP session bound to one unit identifier.
//!
//! Frames are built and parsed with rmodbus. The session only adds MBAP-length-driven framing on top of a byte
//! link and the open/close policy selected by [`SessionMode`].

use embedded_io::{Read, Write};
use heapless::Vec;
use rmodbus::{ModbusProto, client::ModbusRequest};
use tracing::{debug, trace, warn};

use crate::{
    config::SessionMode,
    error::{Error, Fault, Operation, Result},
    transport::{Connector, ModbusTransport},
};

/// Largest Modbus TCP frame: 7 byte MBAP header and a 253 byte PDU.
pub const MAX_FRAME_LEN: usize = 260;

/// Most holding registers a single read may return.
pub const MAX_READ_REGISTERS: usize = 125;

/// Transaction id, protocol id and length field. The unit id that follows is counted by the length field.
const MBAP_PREFIX_LEN: usize = 6;

type Frame = Vec<u8, MAX_FRAME_LEN>;

pub struct Session<C: Connector> {
    connector: C,
    unit_id: u8,
    mode: SessionMode,
    /// Only ever populated in [`SessionMode::Persistent`].
    link: Option<C::Link>,
}

impl<C: Connector> Session<C> {
    pub fn new(connector: C, unit_id: u8, mode: SessionMode) -> Self {
        Self {
            connector,
            unit_id,
            mode,
            link: None,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Whether a persistent link is currently held open.
    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    /// Check the device can be reached.
    ///
    /// A persistent session keeps the link open afterwards, a per-call session closes it again.
    pub fn probe(&mut self) -> Result<(), C::Error> {
        let link = self.take_link()?;
        if self.mode == SessionMode::Persistent {
            self.link = Some(link);
        }
        Ok(())
    }

    /// Drop any open link. The next operation reconnects.
    pub fn close(&mut self) {
        if self.link.take().is_some() {
            debug!(unit_id = self.unit_id, "closed modbus link");
        }
    }

    fn take_link(&mut self) -> Result<C::Link, C::Error> {
        if let Some(link) = self.link.take() {
            return Ok(link);
        }
        debug!(unit_id = self.unit_id, "opening modbus link");
        self.connector.connect().map_err(|fault| Error::Connection {
            unit_id: self.unit_id,
            fault,
        })
    }

    /// Send one request frame and return the complete response frame.
    fn transact(
        &mut self,
        request: &[u8],
        fail: impl Fn(Fault<C::Error>) -> Error<C::Error>,
    ) -> Result<Frame, C::Error> {
        let mut link = self.take_link()?;
        trace!(unit_id = self.unit_id, request = ?request, "sending frame");
        match exchange(&mut link, request) {
            Ok(response) => {
                trace!(unit_id = self.unit_id, response = ?response.as_slice(), "received frame");
                if self.mode == SessionMode::Persistent {
                    self.link = Some(link);
                }
                Ok(response)
            }
            Err(fault) => {
                // The stream may hold a partial frame, so the link is never reused.
                warn!(unit_id = self.unit_id, "modbus exchange failed, dropping link: {fault}");
                Err(fail(fault))
            }
        }
    }
}

/// Write a request and read back exactly one frame, sized by its MBAP length field.
fn exchange<L: Read + Write>(link: &mut L, request: &[u8]) -> core::result::Result<Frame, Fault<L::Error>> {
    link.write_all(request).map_err(Fault::Io)?;
    link.flush().map_err(Fault::Io)?;

    let mut prefix = [0u8; MBAP_PREFIX_LEN];
    link.read_exact(&mut prefix)?;
    let remaining = u16::from_be_bytes([prefix[4], prefix[5]]) as usize;
    let frame_len = MBAP_PREFIX_LEN + remaining;
    // At least unit id, function code and one more byte.
    if remaining < 3 || frame_len > MAX_FRAME_LEN {
        return Err(Fault::FrameLength(frame_len));
    }

    let mut frame = Frame::new();
    frame.extend_from_slice(&prefix).map_err(|_| Fault::BufferError)?;
    frame.resize(frame_len, 0).map_err(|_| Fault::BufferError)?;
    link.read_exact(&mut frame[MBAP_PREFIX_LEN..])?;
    Ok(frame)
}

impl<C: Connector> ModbusTransport for Session<C> {
    type Error = C::Error;

    fn unit_id(&self) -> u8 {
        self.unit_id
    }

    fn read_holding_registers<const N: usize>(&mut self, address: u16) -> Result<[u16; N], C::Error> {
        let unit_id = self.unit_id;
        let count = N as u16;
        let fail = move |fault: Fault<C::Error>| Error::Transport {
            op: Operation::ReadHoldingRegisters,
            unit_id,
            address,
            count,
            fault,
        };
        debug!(unit_id, address, count, "reading holding registers");

        let mut req = ModbusRequest::new(unit_id, ModbusProto::TcpUdp);
        let mut request = Frame::new();
        req.generate_get_holdings(address, count, &mut request)
            .map_err(|e| fail(e.into()))?;

        let response = self.transact(&request, fail)?;

        let mut words: Vec<u16, MAX_READ_REGISTERS> = Vec::new();
        req.parse_u16(&response, &mut words)
            .map_err(|e| fail(e.into()))?;

        <[u16; N]>::try_from(words.as_slice()).map_err(|_| {
            fail(Fault::ResponseLength {
                expected: N,
                actual: words.len(),
            })
        })
    }

    fn write_single_register(&mut self, address: u16, value: u16) -> Result<(), C::Error> {
        let unit_id = self.unit_id;
        let fail = move |fault: Fault<C::Error>| Error::Transport {
            op: Operation::WriteSingleRegister,
            unit_id,
            address,
            count: 1,
            fault,
        };
        debug!(unit_id, address, value, "writing single register");

        let mut req = ModbusRequest::new(unit_id, ModbusProto::TcpUdp);
        let mut request = Frame::new();
        req.generate_set_holding(address, value, &mut request)
            .map_err(|e| fail(e.into()))?;

        let response = self.transact(&request, fail)?;

        req.parse_ok(&response).map_err(|e| fail(e.into()))?;
        // A successful write is echoed back unchanged.
        if response.as_slice() != request.as_slice() {
            return Err(fail(Fault::InvalidResponse));
        }
        Ok(())
    }
}
