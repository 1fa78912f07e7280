//! Instrument capabilities.
//!
//! The HDS200 is three instruments in one box. Each role is a separate trait
//! so code that only needs a meter does not have to know about the scope:
//!
//! - [`Multimeter`]: measurement mode, ranges and readings
//! - [`Oscilloscope`]: channel setup, trigger arming and waveform acquisition
//! - [`FunctionGenerator`]: the optional arbitrary waveform generator
//!
//! All methods take `&mut self`; the command channel is strictly serial.

use async_trait::async_trait;
use std::fmt;

use crate::proto::Result;
use crate::waveform::PendingWaveforms;

/// Measurement types a generic multimeter interface can ask for. Not every
/// meter supports every type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementType {
    DcVoltage,
    AcRmsVoltage,
    AcPlusDcVoltage,
    DcCurrent,
    AcCurrent,
    Resistance,
    Capacitance,
    Continuity,
    Diode,
    Frequency,
    DutyCycle,
    Temperature,
}

impl fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasurementType::DcVoltage => f.write_str("DC voltage"),
            MeasurementType::AcRmsVoltage => f.write_str("AC RMS voltage"),
            MeasurementType::AcPlusDcVoltage => f.write_str("AC+DC voltage"),
            MeasurementType::DcCurrent => f.write_str("DC current"),
            MeasurementType::AcCurrent => f.write_str("AC current"),
            MeasurementType::Resistance => f.write_str("Resistance"),
            MeasurementType::Capacitance => f.write_str("Capacitance"),
            MeasurementType::Continuity => f.write_str("Continuity"),
            MeasurementType::Diode => f.write_str("Diode"),
            MeasurementType::Frequency => f.write_str("Frequency"),
            MeasurementType::DutyCycle => f.write_str("Duty cycle"),
            MeasurementType::Temperature => f.write_str("Temperature"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScopeChannel {
    Ch1,
    Ch2,
}

impl ScopeChannel {
    pub fn number(&self) -> u8 {
        match self {
            ScopeChannel::Ch1 => 1,
            ScopeChannel::Ch2 => 2,
        }
    }
}

impl fmt::Display for ScopeChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CH{}", self.number())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coupling {
    Ac1M,
    Dc1M,
    Gnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    Triggered,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveShape {
    Sine,
    Square,
    Triangle,
    Pulse,
    StaircaseDown,
    StaircaseUp,
    StaircaseUpDown,
    Sinc,
    Noise,
    Dc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentType {
    Multimeter,
    Oscilloscope,
    FunctionGenerator,
}

#[async_trait]
pub trait Multimeter: Send {
    fn measurement_types(&self) -> Vec<MeasurementType>;

    async fn meter_mode(&mut self) -> Result<MeasurementType>;

    /// Unsupported types are rejected without touching the device.
    async fn set_meter_mode(&mut self, mode: MeasurementType) -> Result<()>;

    /// Range labels of the active mode, in device order.
    async fn meter_ranges(&mut self) -> Result<Vec<&'static str>>;

    async fn meter_range(&mut self) -> Result<String>;

    /// `Ok(false)` if the device never reported the requested range.
    async fn set_meter_range(&mut self, range: &str) -> Result<bool>;

    async fn meter_auto_range(&mut self) -> Result<bool>;

    async fn set_meter_auto_range(&mut self, enable: bool) -> Result<()>;

    async fn meter_value(&mut self) -> Result<f64>;
}

#[async_trait]
pub trait Oscilloscope: Send {
    async fn is_channel_enabled(&mut self, channel: ScopeChannel) -> Result<bool>;

    async fn enable_channel(&mut self, channel: ScopeChannel) -> Result<()>;

    async fn disable_channel(&mut self, channel: ScopeChannel) -> Result<()>;

    fn available_couplings(&self, channel: ScopeChannel) -> Vec<Coupling>;

    async fn channel_coupling(&mut self, channel: ScopeChannel) -> Result<Coupling>;

    async fn set_channel_coupling(&mut self, channel: ScopeChannel, coupling: Coupling)
        -> Result<()>;

    async fn channel_attenuation(&mut self, channel: ScopeChannel) -> Result<f64>;

    async fn set_channel_attenuation(&mut self, channel: ScopeChannel, factor: f64) -> Result<()>;

    fn poll_trigger(&self) -> TriggerMode;

    fn is_trigger_armed(&self) -> bool;

    /// Fetch and queue one waveform set. Returns `false` when disarmed.
    async fn acquire_data(&mut self) -> Result<bool>;

    fn start(&mut self);

    fn start_single_trigger(&mut self);

    fn stop(&mut self);

    fn force_trigger(&mut self);

    fn sample_depths(&self) -> Vec<u64>;

    async fn sample_depth(&mut self) -> Result<u64>;

    async fn set_sample_depth(&mut self, depth: u64) -> Result<()>;

    /// Consumer side handle of the acquired waveform queue.
    fn pending_waveforms(&self) -> PendingWaveforms;
}

#[async_trait]
pub trait FunctionGenerator: Send {
    fn available_shapes(&self) -> Vec<WaveShape>;

    fn function_active(&self) -> Result<bool>;

    async fn set_function_active(&mut self, on: bool) -> Result<()>;

    fn function_amplitude(&self) -> Result<f32>;

    async fn set_function_amplitude(&mut self, volts: f32) -> Result<()>;

    fn function_offset(&self) -> Result<f32>;

    async fn set_function_offset(&mut self, volts: f32) -> Result<()>;

    fn function_frequency(&self) -> Result<f32>;

    async fn set_function_frequency(&mut self, hz: f32) -> Result<()>;

    fn function_duty_cycle(&self) -> Result<f32>;

    async fn set_function_duty_cycle(&mut self, duty: f32) -> Result<()>;

    fn function_shape(&self) -> Result<WaveShape>;

    async fn set_function_shape(&mut self, shape: WaveShape) -> Result<()>;
}
