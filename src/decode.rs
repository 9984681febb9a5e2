//! Conversions from raw register words to physical quantities.
//!
//! Everything here is pure so the register maths can be tested without a device.

use crate::types::{Kilowatts, OperatingMode, Percent, PowerFlow};

/// Readings at or above this are reported by a PV string that is not physically connected.
///
/// Chosen empirically, not defined by the protocol. A filtered string reads the same as one producing 0 kW.
pub const PV_STRING_PLAUSIBLE_LIMIT_KW: f64 = 50.0;

/// Round to two decimal places.
///
/// Rounds the exact binary value, so 0.015 (stored as 0.01499..) gives 0.01. Scaling by 100 first would
/// turn it into an exact 1.5 and round up.
pub fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Combine a register pair into a signed watt value, `regs[0] - regs[1]`.
#[inline]
pub const fn signed_difference(regs: [u16; 2]) -> i32 {
    regs[0] as i32 - regs[1] as i32
}

/// Split a signed watt value into its two non-negative directions, in kilowatts.
///
/// Positive values are `outgoing`, negative values are `incoming`.
pub fn split_flow(signed_watts: i32) -> PowerFlow {
    let kw = signed_watts as f64 / 1000.0;
    if signed_watts > 0 {
        PowerFlow {
            outgoing: Kilowatts(kw),
            incoming: Kilowatts::ZERO,
        }
    } else if signed_watts < 0 {
        PowerFlow {
            outgoing: Kilowatts::ZERO,
            incoming: Kilowatts(-kw),
        }
    } else {
        PowerFlow::default()
    }
}

/// Grid power flow from the pair at `GridActivePower`. Positive difference is export.
pub fn grid_flow(regs: [u16; 2]) -> PowerFlow {
    split_flow(signed_difference(regs))
}

/// Battery power flow from the pair at `BatteryPower`, rounded to 2 decimals. Positive difference is charging.
pub fn battery_flow(regs: [u16; 2]) -> PowerFlow {
    let flow = split_flow(signed_difference(regs));
    PowerFlow {
        outgoing: Kilowatts(round2(flow.outgoing.0)),
        incoming: Kilowatts(round2(flow.incoming.0)),
    }
}

/// Power of a single PV string from its two register words.
///
/// Returns `None` when the product is implausibly large, see [`PV_STRING_PLAUSIBLE_LIMIT_KW`].
pub fn pv_string_power_checked(first: u16, second: u16) -> Option<Kilowatts> {
    let kw = first as f64 * second as f64 / 1_000_000.0;
    if kw >= PV_STRING_PLAUSIBLE_LIMIT_KW {
        None
    } else {
        Some(Kilowatts(round2(kw)))
    }
}

/// Power of a single PV string, filtered to 0 kW when implausible.
pub fn pv_string_power(first: u16, second: u16) -> Kilowatts {
    pv_string_power_checked(first, second).unwrap_or(Kilowatts::ZERO)
}

/// Sum of already filtered string powers, rounded to 2 decimals.
pub fn total_pv_power(strings: impl IntoIterator<Item = Kilowatts>) -> Kilowatts {
    Kilowatts(round2(strings.into_iter().map(Kilowatts::value).sum()))
}

pub fn battery_soc(raw: u16) -> Percent {
    Percent(raw as f64 / 10.0)
}

pub fn grid_sensor_connected(raw: u16) -> bool {
    raw == 1
}

pub fn on_grid(raw: u16) -> bool {
    raw == 0
}

pub fn operating_mode(raw: u16) -> OperatingMode {
    OperatingMode::from(raw)
}
