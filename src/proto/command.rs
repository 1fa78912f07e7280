use std::fmt;

use crate::capability::{Coupling, ScopeChannel};
use crate::mode::MeasurementMode;

/// Coarse input selector of the meter. Voltage has a mV and a V relay,
/// current has separate mA and A inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterScale {
    MilliVolt,
    Volt,
    MilliAmp,
    Amp,
}

impl MeterScale {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeterScale::MilliVolt => "mV",
            MeterScale::Volt => "V",
            MeterScale::MilliAmp => "mA",
            MeterScale::Amp => "A",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeAttenuation {
    X1,
    X10,
    X100,
    X1000,
}

impl ProbeAttenuation {
    pub fn factor(&self) -> f64 {
        match self {
            ProbeAttenuation::X1 => 1.0,
            ProbeAttenuation::X10 => 10.0,
            ProbeAttenuation::X100 => 100.0,
            ProbeAttenuation::X1000 => 1000.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeAttenuation::X1 => "1X",
            ProbeAttenuation::X10 => "10X",
            ProbeAttenuation::X100 => "100X",
            ProbeAttenuation::X1000 => "1000X",
        }
    }

    pub fn from_reply(reply: &str) -> Option<Self> {
        match reply {
            "1X" => Some(ProbeAttenuation::X1),
            "10X" => Some(ProbeAttenuation::X10),
            "100X" => Some(ProbeAttenuation::X100),
            "1000X" => Some(ProbeAttenuation::X1000),
            _ => None,
        }
    }

    pub fn from_factor(factor: f64) -> Option<Self> {
        [
            ProbeAttenuation::X1,
            ProbeAttenuation::X10,
            ProbeAttenuation::X100,
            ProbeAttenuation::X1000,
        ]
        .into_iter()
        .find(|p| p.factor() == factor)
    }
}

/// Acquisition memory depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryDepth {
    K4,
    K8,
}

impl MemoryDepth {
    pub fn samples(&self) -> u64 {
        match self {
            MemoryDepth::K4 => 4000,
            MemoryDepth::K8 => 8000,
        }
    }
}

/// Waveform shapes the built-in generator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwgShape {
    Sine,
    Square,
    Ramp,
    Pulse,
    StairDown,
    StairUp,
    StairUpDown,
}

impl AwgShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            AwgShape::Sine => "SINE",
            AwgShape::Square => "SQU",
            AwgShape::Ramp => "RAMP",
            AwgShape::Pulse => "PULS",
            AwgShape::StairDown => "StairDn",
            AwgShape::StairUp => "StairUp",
            AwgShape::StairUpDown => "StairUD",
        }
    }
}

/// What the device sends back for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    None,
    Line,
    Block,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Identify,
    // Multimeter
    SetMeterMode(MeasurementMode),
    GetMeterConf,
    GetMeterVoltageConf,
    GetMeterCurrentConf,
    GetMeterRange,
    CycleMeterRange,
    SetMeterScale(MeterScale),
    EnableAutoRange,
    GetMeterValue,
    // Oscilloscope channels
    GetChannelDisplay(ScopeChannel),
    SetChannelDisplay(ScopeChannel, bool),
    GetChannelCoupling(ScopeChannel),
    SetChannelCoupling(ScopeChannel, Coupling),
    GetChannelProbe(ScopeChannel),
    SetChannelProbe(ScopeChannel, ProbeAttenuation),
    // Acquisition
    GetMemoryDepth,
    SetMemoryDepth(MemoryDepth),
    GetScreenHeader,
    GetScreenWaveform(ScopeChannel),
    // Function generator
    SetAwgOutput(bool),
    SetAwgAmplitude(f32),
    SetAwgOffset(f32),
    SetAwgFrequency(f32),
    SetAwgDutyCycle(f32),
    SetAwgShape(AwgShape),
}

impl Command {
    pub fn reply(&self) -> Reply {
        match self {
            Command::Identify
            | Command::GetMeterConf
            | Command::GetMeterVoltageConf
            | Command::GetMeterCurrentConf
            | Command::GetMeterRange
            | Command::GetMeterValue
            | Command::GetChannelDisplay(_)
            | Command::GetChannelCoupling(_)
            | Command::GetChannelProbe(_)
            | Command::GetMemoryDepth => Reply::Line,
            Command::GetScreenHeader | Command::GetScreenWaveform(_) => Reply::Block,
            _ => Reply::None,
        }
    }
}

fn on_off(state: bool) -> &'static str {
    if state {
        "ON"
    } else {
        "OFF"
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Identify => f.write_str("*IDN?"),
            Command::SetMeterMode(mode) => match mode {
                MeasurementMode::AcVoltage => f.write_str(":DMM:CONF:VOLT AC"),
                MeasurementMode::DcVoltage => f.write_str(":DMM:CONF:VOLT DC"),
                MeasurementMode::DcCurrent => f.write_str(":DMM:CONF:CURR DC"),
                MeasurementMode::AcCurrent => f.write_str(":DMM:CONF:CURR AC"),
                MeasurementMode::Resistance => f.write_str(":DMM:CONF RES"),
                MeasurementMode::Capacitance => f.write_str(":DMM:CONF CAP"),
                MeasurementMode::Continuity => f.write_str(":DMM:CONF CONT"),
                MeasurementMode::Diode => f.write_str(":DMM:CONF DIOD"),
            },
            Command::GetMeterConf => f.write_str(":DMM:CONF?"),
            Command::GetMeterVoltageConf => f.write_str(":DMM:CONF:VOLT?"),
            Command::GetMeterCurrentConf => f.write_str(":DMM:CONF:CURR?"),
            Command::GetMeterRange => f.write_str(":DMM:RANGE?"),
            Command::CycleMeterRange => f.write_str(":DMM:RANGE ON"),
            Command::SetMeterScale(scale) => write!(f, ":DMM:RANGE {}", scale.as_str()),
            Command::EnableAutoRange => f.write_str(":DMM:AUTO ON"),
            Command::GetMeterValue => f.write_str(":DMM:MEAS?"),
            Command::GetChannelDisplay(ch) => write!(f, ":CH{}:DISP?", ch.number()),
            Command::SetChannelDisplay(ch, state) => {
                write!(f, ":CH{}:DISP {}", ch.number(), on_off(*state))
            }
            Command::GetChannelCoupling(ch) => write!(f, ":CH{}:COUP?", ch.number()),
            Command::SetChannelCoupling(ch, coupling) => {
                let token = match coupling {
                    Coupling::Dc1M => "DC",
                    Coupling::Ac1M => "AC",
                    Coupling::Gnd => "GND",
                };
                write!(f, ":CH{}:COUP {}", ch.number(), token)
            }
            Command::GetChannelProbe(ch) => write!(f, ":CH{}:PROB?", ch.number()),
            Command::SetChannelProbe(ch, probe) => {
                write!(f, ":CH{}:PROB {}", ch.number(), probe.as_str())
            }
            Command::GetMemoryDepth => f.write_str(":ACQ:DEPM?"),
            Command::SetMemoryDepth(depth) => match depth {
                MemoryDepth::K4 => f.write_str(":ACQ:DEPM 4K"),
                MemoryDepth::K8 => f.write_str(":ACQ:DEPM 8K"),
            },
            Command::GetScreenHeader => f.write_str(":DAT:WAV:SCR:HEAD?"),
            Command::GetScreenWaveform(ch) => write!(f, ":DAT:WAV:SCR:CH{}?", ch.number()),
            Command::SetAwgOutput(state) => write!(f, ":CHAN {}", on_off(*state)),
            Command::SetAwgAmplitude(volts) => write!(f, ":FUNC:AMP {}", volts),
            Command::SetAwgOffset(volts) => write!(f, ":FUNC:OFF {}", volts),
            Command::SetAwgFrequency(hz) => write!(f, ":FUNC:FREQ {}", hz),
            Command::SetAwgDutyCycle(duty) => write!(f, ":FUNC:DTY {}", duty),
            Command::SetAwgShape(shape) => write!(f, ":FUNC {}", shape.as_str()),
        }
    }
}
