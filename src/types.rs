//! This module contains types relevant to the SigenStor Modbus data types.

use core::fmt;

use serde::Serialize;
use strum_macros::{Display, EnumIter, FromRepr};

/// EMS work mode as reported by the plant.
///
/// Any code not in the known table decodes to [`OperatingMode::Unknown`], never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperatingMode {
    MaxSelfConsumption,
    AiMode,
    TimeOfUse,
    RemoteEms,
    /// Raw code with no known meaning.
    Unknown(u16),
}

impl OperatingMode {
    const TABLE: [(u16, OperatingMode); 4] = [
        (0, OperatingMode::MaxSelfConsumption),
        (1, OperatingMode::AiMode),
        (2, OperatingMode::TimeOfUse),
        (7, OperatingMode::RemoteEms),
    ];

    /// Short description, as shown in the Sigenergy documentation.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::MaxSelfConsumption => "Max Self Consumption",
            Self::AiMode => "AI Mode",
            Self::TimeOfUse => "TOU",
            Self::RemoteEms => "Remote EMS Mode",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl From<u16> for OperatingMode {
    fn from(value: u16) -> Self {
        Self::TABLE
            .iter()
            .find(|(code, _)| *code == value)
            .map(|(_, mode)| *mode)
            .unwrap_or(Self::Unknown(value))
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Control modes accepted by the remote EMS control mode register.
///
/// Only takes effect while remote EMS mode is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, FromRepr, Display)]
#[repr(u16)]
pub enum RemoteEmsControlMode {
    #[strum(to_string = "PCS remote control")]
    PcsRemoteControl = 0,
    #[strum(to_string = "Standby")]
    Standby = 1,
    #[strum(to_string = "Maximum self consumption")]
    MaximumSelfConsumption = 2,
    /// Charge the battery, taking power from the grid first.
    #[strum(to_string = "Command charging (grid first)")]
    CommandChargingGridFirst = 3,
    /// Charge the battery, taking power from PV first.
    #[strum(to_string = "Command charging (PV first)")]
    CommandChargingPvFirst = 4,
    /// Discharge, outputting PV power first.
    #[strum(to_string = "Command discharging (PV first)")]
    CommandDischargingPvFirst = 5,
    /// Discharge, outputting battery power first.
    #[strum(to_string = "Command discharging (battery first)")]
    CommandDischargingBatteryFirst = 6,
}

impl From<RemoteEmsControlMode> for u16 {
    fn from(value: RemoteEmsControlMode) -> Self {
        value as u16
    }
}

impl TryFrom<u16> for RemoteEmsControlMode {
    type Error = ();
    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::from_repr(value).ok_or(())
    }
}

/// One of the four independently measured PV strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum PvString {
    One,
    Two,
    Three,
    Four,
}

impl PvString {
    /// 1-based string number.
    pub const fn number(self) -> u16 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
        }
    }
}

/// Power in kilowatts.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct Kilowatts(pub f64);

impl Kilowatts {
    pub const ZERO: Self = Self(0.0);

    pub const fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Kilowatts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} kW", self.0)
    }
}

/// A percentage, 0 - 100.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct Percent(pub f64);

impl Percent {
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} %", self.0)
    }
}

/// A signed power reading split into two non-negative directions.
///
/// At most one of the two is ever non-zero. For the grid, `outgoing` is export and `incoming` import.
/// For the battery, `outgoing` is charging (power going into the battery) and `incoming` discharging.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PowerFlow {
    pub outgoing: Kilowatts,
    pub incoming: Kilowatts,
}
