use async_trait::async_trait;
use std::fmt;
use tracing::{debug, warn};

use crate::cache::Fetch;
use crate::capability::MeasurementType;
use crate::proto::{command::Command, transport::Transport, Error, Result};
use crate::timing::MODE_SETTLE;

/// Multimeter functions of the HDS200.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementMode {
    AcVoltage,
    DcVoltage,
    DcCurrent,
    AcCurrent,
    Resistance,
    Capacitance,
    Continuity,
    Diode,
}

impl MeasurementMode {
    pub const ALL: [MeasurementMode; 8] = [
        MeasurementMode::AcVoltage,
        MeasurementMode::DcVoltage,
        MeasurementMode::DcCurrent,
        MeasurementMode::AcCurrent,
        MeasurementMode::Resistance,
        MeasurementMode::Capacitance,
        MeasurementMode::Continuity,
        MeasurementMode::Diode,
    ];

    pub fn is_voltage(&self) -> bool {
        matches!(self, MeasurementMode::AcVoltage | MeasurementMode::DcVoltage)
    }

    pub fn is_current(&self) -> bool {
        matches!(self, MeasurementMode::AcCurrent | MeasurementMode::DcCurrent)
    }
}

impl fmt::Display for MeasurementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", MeasurementType::from(*self))
    }
}

impl From<MeasurementMode> for MeasurementType {
    fn from(mode: MeasurementMode) -> Self {
        match mode {
            MeasurementMode::AcVoltage => MeasurementType::AcRmsVoltage,
            MeasurementMode::DcVoltage => MeasurementType::DcVoltage,
            MeasurementMode::DcCurrent => MeasurementType::DcCurrent,
            MeasurementMode::AcCurrent => MeasurementType::AcCurrent,
            MeasurementMode::Resistance => MeasurementType::Resistance,
            MeasurementMode::Capacitance => MeasurementType::Capacitance,
            MeasurementMode::Continuity => MeasurementType::Continuity,
            MeasurementMode::Diode => MeasurementType::Diode,
        }
    }
}

impl TryFrom<MeasurementType> for MeasurementMode {
    type Error = Error;

    fn try_from(value: MeasurementType) -> Result<Self> {
        match value {
            MeasurementType::AcRmsVoltage => Ok(MeasurementMode::AcVoltage),
            MeasurementType::DcVoltage => Ok(MeasurementMode::DcVoltage),
            MeasurementType::DcCurrent => Ok(MeasurementMode::DcCurrent),
            MeasurementType::AcCurrent => Ok(MeasurementMode::AcCurrent),
            MeasurementType::Resistance => Ok(MeasurementMode::Resistance),
            MeasurementType::Capacitance => Ok(MeasurementMode::Capacitance),
            MeasurementType::Continuity => Ok(MeasurementMode::Continuity),
            MeasurementType::Diode => Ok(MeasurementMode::Diode),
            other => Err(Error::Unsupported(format!("{} measurement", other))),
        }
    }
}

/// Outcome of reading the mode back from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeResolution {
    Resolved(MeasurementMode),
    /// None of the mode queries returned a known token.
    Unresolved,
}

impl ModeResolution {
    /// The resolved mode, DC voltage if the device gave no usable answer.
    pub fn mode(&self) -> MeasurementMode {
        match self {
            ModeResolution::Resolved(mode) => *mode,
            ModeResolution::Unresolved => MeasurementMode::DcVoltage,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ModeResolution::Resolved(_))
    }
}

fn classify_conf(reply: &str) -> Option<MeasurementMode> {
    match reply.trim() {
        "RS" => Some(MeasurementMode::Continuity),
        "R" => Some(MeasurementMode::Resistance),
        "C" => Some(MeasurementMode::Capacitance),
        "DIODE" => Some(MeasurementMode::Diode),
        _ => None,
    }
}

fn classify_voltage(reply: &str) -> Option<MeasurementMode> {
    match reply.trim() {
        "DCV" => Some(MeasurementMode::DcVoltage),
        "ACV" => Some(MeasurementMode::AcVoltage),
        _ => None,
    }
}

fn classify_current(reply: &str) -> Option<MeasurementMode> {
    match reply.trim() {
        "DCA" => Some(MeasurementMode::DcCurrent),
        "ACA" => Some(MeasurementMode::AcCurrent),
        _ => None,
    }
}

/// Reads the active mode with up to three queries. Each query only knows
/// about a subset of the modes, so they are asked in a fixed order until one
/// of them gives a known answer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ModeResolver;

impl ModeResolver {
    pub async fn resolve(transport: &mut Transport) -> Result<ModeResolution> {
        let conf = transport.query_line(Command::GetMeterConf).await?;
        if let Some(mode) = classify_conf(&conf) {
            return Ok(ModeResolution::Resolved(mode));
        }

        let volt = transport.query_line(Command::GetMeterVoltageConf).await?;
        if let Some(mode) = classify_voltage(&volt) {
            return Ok(ModeResolution::Resolved(mode));
        }

        let curr = transport.query_line(Command::GetMeterCurrentConf).await?;
        if let Some(mode) = classify_current(&curr) {
            return Ok(ModeResolution::Resolved(mode));
        }

        warn!(
            "Unable to determine meter mode (replies {:?}, {:?}, {:?}), assuming {}",
            conf,
            volt,
            curr,
            MeasurementMode::DcVoltage
        );
        Ok(ModeResolution::Unresolved)
    }

    /// Switch the meter to `mode` and wait until the device has applied it.
    pub async fn select(transport: &mut Transport, mode: MeasurementMode) -> Result<()> {
        debug!("selecting meter mode {}", mode);
        transport
            .send_settled(Command::SetMeterMode(mode), MODE_SETTLE)
            .await
    }
}

#[async_trait]
impl Fetch for ModeResolver {
    type Value = ModeResolution;

    async fn fetch(&self, transport: &mut Transport) -> Result<ModeResolution> {
        Self::resolve(transport).await
    }
}
