//! This crate provides an interface for reading telemetry from, and controlling, Sigenergy SigenStor
//! hybrid inverter / battery systems.
//!
//! It uses Modbus TCP under the hood. A SigenStor answers on one TCP endpoint (port 502 by default) for two
//! Modbus unit ids:
//! * `1` - The inverter. PV strings, battery state of charge, model information.
//! * `247` - The plant EMS. Grid and battery power flow, operating mode, remote EMS control.
//!
//! Each quantity is its own method on [`client::SigenStorClient`], returning a value with its unit in the type:
//!
//! ```no_run
//! use sigenstor_modbus::{client::SigenStorClient, config::DEFAULT_PORT};
//!
//! let mut client = SigenStorClient::connect("192.168.1.50", DEFAULT_PORT)?;
//! println!("Battery: {}", client.read_battery_soc()?);
//! println!("PV: {}", client.read_total_pv_power()?);
//! # Ok::<(), sigenstor_modbus::error::Error<sigenstor_modbus::net::IoError>>(())
//! ```
//!
//! Remote EMS control only takes effect once enabled on the device, and the Modbus TCP server must be enabled
//! in the installer settings.

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod net;
pub mod registers;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(test)]
mod mock_device;
