//! Multimeter range selection.
//!
//! The device has no command to pick a range directly. Besides the coarse
//! mV/V and mA/A input relays it can only step to the next range, so a
//! manual range is reached by stepping and reading back until the reported
//! range matches.

use tracing::{debug, error, warn};

use crate::mode::MeasurementMode;
use crate::proto::{
    command::{Command, MeterScale},
    transport::Transport,
    Error, Result,
};
use crate::timing::{AUTO_RANGE_SETTLE, MAX_RANGE_CYCLES, RANGE_CYCLE_SETTLE, RELAY_SETTLE};

pub const AUTO: &str = "AUTO";

/// Only range of modes without range selection.
pub const NOT_APPLICABLE: &str = "N/A";

const MILLI: &str = "200m";

const DC_VOLTAGE_RANGES: &[&str] = &[AUTO, MILLI, "2", "20", "200", "1000"];
const AC_VOLTAGE_RANGES: &[&str] = &[AUTO, MILLI, "2", "20", "200", "750"];
const CURRENT_RANGES: &[&str] = &[MILLI, "10"];
const RESISTANCE_RANGES: &[&str] = &[AUTO, "200", "2k", "20k", "200k", "2M", "20M", "100M"];
const NO_RANGES: &[&str] = &[NOT_APPLICABLE];

/// Range labels available in `mode`, in the order the device steps through
/// them.
pub fn ranges(mode: MeasurementMode) -> &'static [&'static str] {
    match mode {
        MeasurementMode::DcVoltage => DC_VOLTAGE_RANGES,
        MeasurementMode::AcVoltage => AC_VOLTAGE_RANGES,
        MeasurementMode::DcCurrent | MeasurementMode::AcCurrent => CURRENT_RANGES,
        MeasurementMode::Resistance => RESISTANCE_RANGES,
        MeasurementMode::Capacitance | MeasurementMode::Continuity | MeasurementMode::Diode => {
            NO_RANGES
        }
    }
}

/// `"20V"` -> `"20"`, `"2kΩ"` -> `"2k"`
pub fn strip_unit(reply: &str) -> &str {
    let reply = reply.trim();
    match reply.char_indices().last() {
        Some((idx, _)) => &reply[..idx],
        None => reply,
    }
}

/// The active range as a label of [`ranges`].
pub async fn read_range(transport: &mut Transport) -> Result<String> {
    let reply = transport.query_line(Command::GetMeterRange).await?;
    Ok(strip_unit(&reply).to_string())
}

/// Step through the ranges until the device reports `target`. Gives up after
/// [`MAX_RANGE_CYCLES`] steps and leaves the device on whatever range the last
/// step selected.
pub async fn cycle_until(transport: &mut Transport, target: &str) -> Result<bool> {
    let mut cycles = 0;
    loop {
        let current = read_range(transport).await?;
        if current == target {
            debug!("range {} reached after {} cycles", target, cycles);
            return Ok(true);
        }
        if cycles == MAX_RANGE_CYCLES {
            break;
        }
        transport
            .send_settled(Command::CycleMeterRange, RANGE_CYCLE_SETTLE)
            .await?;
        cycles += 1;
    }
    warn!(
        "Range {} not reached after {} cycles, giving up",
        target, MAX_RANGE_CYCLES
    );
    Ok(false)
}

/// Select range `label` in `mode`.
///
/// Returns `Ok(false)` if stepping never reached the range. Labels not
/// available in `mode` are rejected before any command is sent.
pub async fn select(transport: &mut Transport, mode: MeasurementMode, label: &str) -> Result<bool> {
    if !ranges(mode).contains(&label) {
        error!("Range {:?} is not available in {} mode", label, mode);
        return Err(Error::InvalidRange {
            range: label.to_string(),
            mode,
        });
    }

    if label == AUTO {
        if mode.is_voltage() {
            transport
                .send_settled(Command::SetMeterScale(MeterScale::Volt), RELAY_SETTLE)
                .await?;
        }
        transport
            .send_settled(Command::EnableAutoRange, AUTO_RANGE_SETTLE)
            .await?;
        return Ok(true);
    }

    match mode {
        MeasurementMode::DcVoltage | MeasurementMode::AcVoltage => {
            if label == MILLI {
                transport
                    .send_settled(Command::SetMeterScale(MeterScale::MilliVolt), RELAY_SETTLE)
                    .await?;
                Ok(true)
            } else {
                transport
                    .send_settled(Command::SetMeterScale(MeterScale::Volt), RELAY_SETTLE)
                    .await?;
                cycle_until(transport, label).await
            }
        }
        MeasurementMode::DcCurrent | MeasurementMode::AcCurrent => {
            let scale = if label == MILLI {
                MeterScale::MilliAmp
            } else {
                MeterScale::Amp
            };
            transport
                .send_settled(Command::SetMeterScale(scale), RELAY_SETTLE)
                .await?;
            Ok(true)
        }
        MeasurementMode::Resistance => cycle_until(transport, label).await,
        MeasurementMode::Capacitance | MeasurementMode::Continuity | MeasurementMode::Diode => {
            Ok(true)
        }
    }
}
