//! This module is used to define the registers on the SigenStor.
//!
//! Addresses are as listed in the Sigenergy Modbus protocol document. The same TCP endpoint serves two
//! logical devices, distinguished by the Modbus unit identifier, see [`UnitId`].

use strum_macros::EnumIter;

use crate::types::PvString;

/// Modbus unit identifiers exposed by a SigenStor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
#[repr(u8)]
pub enum UnitId {
    /// The hybrid inverter itself. PV strings, battery SOC, model information.
    Inverter = 1,
    /// The plant level EMS. Grid, battery power flow and operating mode.
    Plant = 247,
}

impl From<UnitId> for u8 {
    fn from(value: UnitId) -> Self {
        value as u8
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter)]
#[repr(u16)]
pub enum SigenRegister {
    /// __R__ - EMS work mode currently selected.
    ///
    /// See [`OperatingMode`](crate::types::OperatingMode).
    OperatingMode = 30003,
    /// __R__ - Grid sensor status.
    /// * `0` - Not connected.
    /// * `1` - Connected.
    GridSensorStatus = 30004,
    /// __R__ - Grid sensor active power, two registers.
    ///
    /// The difference of the two words is in watts, positive when exporting to the grid.
    GridActivePower = 30005,
    /// __R__ - On/off grid status.
    /// * `0` - On grid.
    GridStatus = 30009,
    /// __R__ - Battery charge/discharge power, two registers.
    ///
    /// The difference of the two words is in watts, positive when charging.
    BatteryPower = 30037,
    /// __R__ - Model type, fifteen registers. Only the first word is interpreted.
    ModelType = 30500,
    /// __R__ - Battery state of charge in deci-percent. E.g. 55.3% => `553`.
    BatterySoc = 30601,
    /// __R__ - PV string 1 voltage.
    Pv1Voltage = 31027,
    /// __R__ - PV string 1 current.
    Pv1Current = 31028,
    /// __R__ - PV string 2 voltage.
    Pv2Voltage = 31029,
    /// __R__ - PV string 2 current.
    Pv2Current = 31030,
    /// __R__ - PV string 3 voltage.
    Pv3Voltage = 31031,
    /// __R__ - PV string 3 current.
    Pv3Current = 31032,
    /// __R__ - PV string 4 voltage.
    Pv4Voltage = 31033,
    /// __R__ - PV string 4 current.
    Pv4Current = 31034,
    /// __R/W__ - Remote EMS enable.
    /// * `0` - Disabled.
    /// * `1` - Enabled.
    RemoteEmsEnable = 40029,
    /// __R/W__ - Remote EMS control mode.
    ///
    /// See [`RemoteEmsControlMode`](crate::types::RemoteEmsControlMode).
    RemoteEmsControlMode = 40031,
}

impl SigenRegister {
    /// The unit identifier this register is served on.
    pub const fn unit(self) -> UnitId {
        use SigenRegister as R;
        match self {
            R::ModelType
            | R::BatterySoc
            | R::Pv1Voltage
            | R::Pv1Current
            | R::Pv2Voltage
            | R::Pv2Current
            | R::Pv3Voltage
            | R::Pv3Current
            | R::Pv4Voltage
            | R::Pv4Current => UnitId::Inverter,
            _ => UnitId::Plant,
        }
    }

    /// Number of consecutive registers read for this quantity.
    pub const fn count(self) -> u16 {
        match self {
            Self::GridActivePower | Self::BatteryPower => 2,
            Self::ModelType => 15,
            _ => 1,
        }
    }

    pub const fn address(self) -> u16 {
        self as u16
    }

    /// The two registers whose product is the power of a PV string, voltage first.
    pub const fn pv_string(string: PvString) -> (Self, Self) {
        match string {
            PvString::One => (Self::Pv1Voltage, Self::Pv1Current),
            PvString::Two => (Self::Pv2Voltage, Self::Pv2Current),
            PvString::Three => (Self::Pv3Voltage, Self::Pv3Current),
            PvString::Four => (Self::Pv4Voltage, Self::Pv4Current),
        }
    }
}

impl From<SigenRegister> for u16 {
    fn from(value: SigenRegister) -> Self {
        value as u16
    }
}
