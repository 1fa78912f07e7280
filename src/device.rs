use async_trait::async_trait;
use tracing::{debug, warn};

use crate::acquisition::AcquisitionEngine;
use crate::cache::{Fetch, LazyCache};
use crate::capability::{
    Coupling, FunctionGenerator, InstrumentType, MeasurementType, Multimeter, Oscilloscope,
    ScopeChannel, TriggerMode, WaveShape,
};
use crate::mode::{MeasurementMode, ModeResolution, ModeResolver};
use crate::proto::{
    command::{AwgShape, Command, MemoryDepth, ProbeAttenuation},
    response::Ident,
    transport::Transport,
    Error, Result,
};
use crate::range::{self, AUTO};
use crate::timing::RATE_LIMIT;
use crate::waveform::PendingWaveforms;

/// Channels of the instrument, in the order they are exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Meter,
    Scope(ScopeChannel),
    FunctionGenerator,
}

impl Channel {
    pub fn name(&self) -> &'static str {
        match self {
            Channel::Meter => "VIN",
            Channel::Scope(ScopeChannel::Ch1) => "CH1",
            Channel::Scope(ScopeChannel::Ch2) => "CH2",
            Channel::FunctionGenerator => "AWG",
        }
    }

    pub fn instrument_type(&self) -> InstrumentType {
        match self {
            Channel::Meter => InstrumentType::Multimeter,
            Channel::Scope(_) => InstrumentType::Oscilloscope,
            Channel::FunctionGenerator => InstrumentType::FunctionGenerator,
        }
    }
}

/// Generator settings. The device can not report them back, so the last
/// values written are the only source of truth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AwgSettings {
    pub enabled: bool,
    pub amplitude: f32,
    pub offset: f32,
    pub frequency: f32,
    pub duty_cycle: f32,
    pub shape: AwgShape,
}

impl Default for AwgSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            amplitude: 0.5,
            offset: 0.0,
            frequency: 1000.0,
            duty_cycle: 0.5,
            shape: AwgShape::Sine,
        }
    }
}

fn awg_shape(shape: WaveShape) -> Option<AwgShape> {
    match shape {
        WaveShape::Sine => Some(AwgShape::Sine),
        WaveShape::Square => Some(AwgShape::Square),
        WaveShape::Triangle => Some(AwgShape::Ramp),
        WaveShape::Pulse => Some(AwgShape::Pulse),
        WaveShape::StaircaseDown => Some(AwgShape::StairDown),
        WaveShape::StaircaseUp => Some(AwgShape::StairUp),
        WaveShape::StaircaseUpDown => Some(AwgShape::StairUpDown),
        WaveShape::Sinc | WaveShape::Noise | WaveShape::Dc => None,
    }
}

fn wave_shape(shape: AwgShape) -> WaveShape {
    match shape {
        AwgShape::Sine => WaveShape::Sine,
        AwgShape::Square => WaveShape::Square,
        AwgShape::Ramp => WaveShape::Triangle,
        AwgShape::Pulse => WaveShape::Pulse,
        AwgShape::StairDown => WaveShape::StaircaseDown,
        AwgShape::StairUp => WaveShape::StaircaseUp,
        AwgShape::StairUpDown => WaveShape::StaircaseUpDown,
    }
}

/// `"4K"` -> `4000`
fn parse_depth(reply: &str) -> Option<u64> {
    let digits: String = reply
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse::<u64>().ok()?.checked_mul(1000)
}

/// Reads the acquisition memory depth in samples.
#[derive(Debug, Default, Clone, Copy)]
pub struct DepthReader;

#[async_trait]
impl Fetch for DepthReader {
    type Value = u64;

    async fn fetch(&self, transport: &mut Transport) -> Result<u64> {
        let reply = transport.query_line(Command::GetMemoryDepth).await?;
        parse_depth(&reply)
            .ok_or_else(|| Error::InvalidReply(format!("memory depth {:?}", reply)))
    }
}

fn unsupported<T>(what: impl Into<String>) -> Result<T> {
    let what = what.into();
    warn!("Unsupported operation: {}", what);
    Err(Error::Unsupported(what))
}

/// OWON HDS200 series handheld: multimeter, two channel oscilloscope and,
/// on `S` models, a function generator.
pub struct Hds200 {
    transport: Transport,
    ident: Ident,
    mode: LazyCache<ModeResolver>,
    depth: LazyCache<DepthReader>,
    auto_range: bool,
    acquisition: AcquisitionEngine,
    awg: Option<AwgSettings>,
}

impl Hds200 {
    pub async fn open(com: impl AsRef<str>, baudrate: u32) -> Result<Self> {
        Self::new(Transport::open(com, baudrate)?).await
    }

    /// Identify the device on `transport` and set up the driver state.
    pub async fn new(mut transport: Transport) -> Result<Self> {
        transport.enable_rate_limiting(RATE_LIMIT);

        let reply = transport.query_line(Command::Identify).await?;
        let ident = Ident::try_from(reply.as_str())?;
        debug!(
            "connected to {} {} (serial {}, firmware {})",
            ident.vendor, ident.model, ident.serial, ident.firmware
        );
        let awg = ident.has_awg().then(AwgSettings::default);

        Ok(Self {
            transport,
            ident,
            mode: LazyCache::new(ModeResolver),
            depth: LazyCache::new(DepthReader),
            auto_range: false,
            acquisition: AcquisitionEngine::new(),
            awg,
        })
    }

    pub fn ident(&self) -> &Ident {
        &self.ident
    }

    pub fn has_awg(&self) -> bool {
        self.awg.is_some()
    }

    pub fn channels(&self) -> Vec<Channel> {
        let mut channels = vec![
            Channel::Meter,
            Channel::Scope(ScopeChannel::Ch1),
            Channel::Scope(ScopeChannel::Ch2),
        ];
        if self.has_awg() {
            channels.push(Channel::FunctionGenerator);
        }
        channels
    }

    pub fn instrument_types(&self) -> Vec<InstrumentType> {
        self.channels()
            .iter()
            .map(Channel::instrument_type)
            .fold(Vec::new(), |mut types, t| {
                if !types.contains(&t) {
                    types.push(t);
                }
                types
            })
    }

    /// With the cache disabled every mode read goes to the device.
    pub fn set_mode_cache_enabled(&mut self, enabled: bool) {
        self.mode.set_enabled(enabled);
    }

    /// Like [`Multimeter::meter_mode`], but tells a real DC voltage reading
    /// apart from the fallback for unrecognized replies.
    pub async fn meter_mode_resolution(&mut self) -> Result<ModeResolution> {
        self.mode.get(&mut self.transport).await
    }

    async fn active_mode(&mut self) -> Result<MeasurementMode> {
        Ok(self.meter_mode_resolution().await?.mode())
    }

    fn awg(&self) -> Result<&AwgSettings> {
        match &self.awg {
            Some(awg) => Ok(awg),
            None => unsupported(format!("{} has no function generator", self.ident.model)),
        }
    }

    fn awg_mut(&mut self) -> Result<&mut AwgSettings> {
        match self.awg {
            Some(ref mut awg) => Ok(awg),
            None => unsupported(format!("{} has no function generator", self.ident.model)),
        }
    }
}

#[async_trait]
impl Multimeter for Hds200 {
    fn measurement_types(&self) -> Vec<MeasurementType> {
        MeasurementMode::ALL.iter().map(|m| (*m).into()).collect()
    }

    async fn meter_mode(&mut self) -> Result<MeasurementType> {
        Ok(self.active_mode().await?.into())
    }

    async fn set_meter_mode(&mut self, mode: MeasurementType) -> Result<()> {
        let mode = match MeasurementMode::try_from(mode) {
            Ok(mode) => mode,
            Err(err) => {
                warn!("Unsupported meter mode: {}", mode);
                return Err(err);
            }
        };
        ModeResolver::select(&mut self.transport, mode).await?;
        self.mode.set(ModeResolution::Resolved(mode));
        self.auto_range = false;
        Ok(())
    }

    async fn meter_ranges(&mut self) -> Result<Vec<&'static str>> {
        Ok(range::ranges(self.active_mode().await?).to_vec())
    }

    async fn meter_range(&mut self) -> Result<String> {
        range::read_range(&mut self.transport).await
    }

    async fn set_meter_range(&mut self, label: &str) -> Result<bool> {
        let mode = self.active_mode().await?;
        let result = range::select(&mut self.transport, mode, label).await;
        match result {
            Err(Error::InvalidRange { .. }) => {}
            Ok(true) if label == AUTO => self.auto_range = true,
            // A failed selection may already have left auto range.
            _ => self.auto_range = false,
        }
        result
    }

    async fn meter_auto_range(&mut self) -> Result<bool> {
        Ok(self.auto_range)
    }

    async fn set_meter_auto_range(&mut self, enable: bool) -> Result<()> {
        // Auto range ends by selecting a manual range.
        if enable {
            self.set_meter_range(AUTO).await?;
        }
        Ok(())
    }

    async fn meter_value(&mut self) -> Result<f64> {
        let reply = self.transport.query_line(Command::GetMeterValue).await?;
        reply
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::InvalidReply(format!("measurement {:?}", reply)))
    }
}

#[async_trait]
impl Oscilloscope for Hds200 {
    async fn is_channel_enabled(&mut self, channel: ScopeChannel) -> Result<bool> {
        let reply = self
            .transport
            .query_line(Command::GetChannelDisplay(channel))
            .await?;
        Ok(reply.trim() == "ON")
    }

    async fn enable_channel(&mut self, channel: ScopeChannel) -> Result<()> {
        self.transport
            .send(Command::SetChannelDisplay(channel, true))
            .await
    }

    async fn disable_channel(&mut self, channel: ScopeChannel) -> Result<()> {
        self.transport
            .send(Command::SetChannelDisplay(channel, false))
            .await
    }

    fn available_couplings(&self, _channel: ScopeChannel) -> Vec<Coupling> {
        vec![Coupling::Ac1M, Coupling::Dc1M, Coupling::Gnd]
    }

    async fn channel_coupling(&mut self, channel: ScopeChannel) -> Result<Coupling> {
        let reply = self
            .transport
            .query_line(Command::GetChannelCoupling(channel))
            .await?;
        Ok(match reply.trim() {
            "DC" => Coupling::Dc1M,
            "AC" => Coupling::Ac1M,
            _ => Coupling::Gnd,
        })
    }

    async fn set_channel_coupling(
        &mut self,
        channel: ScopeChannel,
        coupling: Coupling,
    ) -> Result<()> {
        self.transport
            .send(Command::SetChannelCoupling(channel, coupling))
            .await
    }

    async fn channel_attenuation(&mut self, channel: ScopeChannel) -> Result<f64> {
        let reply = self
            .transport
            .query_line(Command::GetChannelProbe(channel))
            .await?;
        ProbeAttenuation::from_reply(reply.trim())
            .map(|p| p.factor())
            .ok_or_else(|| Error::InvalidReply(format!("probe attenuation {:?}", reply)))
    }

    async fn set_channel_attenuation(&mut self, channel: ScopeChannel, factor: f64) -> Result<()> {
        match ProbeAttenuation::from_factor(factor) {
            Some(probe) => {
                self.transport
                    .send(Command::SetChannelProbe(channel, probe))
                    .await
            }
            None => unsupported(format!("probe attenuation {}x", factor)),
        }
    }

    fn poll_trigger(&self) -> TriggerMode {
        self.acquisition.poll_trigger()
    }

    fn is_trigger_armed(&self) -> bool {
        self.acquisition.state().is_armed()
    }

    async fn acquire_data(&mut self) -> Result<bool> {
        self.acquisition.acquire(&mut self.transport).await
    }

    fn start(&mut self) {
        self.acquisition.start();
    }

    fn start_single_trigger(&mut self) {
        self.acquisition.start_single_trigger();
    }

    fn stop(&mut self) {
        self.acquisition.stop();
    }

    fn force_trigger(&mut self) {
        self.acquisition.force_trigger();
    }

    fn sample_depths(&self) -> Vec<u64> {
        vec![MemoryDepth::K4.samples(), MemoryDepth::K8.samples()]
    }

    async fn sample_depth(&mut self) -> Result<u64> {
        self.depth.get(&mut self.transport).await
    }

    async fn set_sample_depth(&mut self, depth: u64) -> Result<()> {
        let depth = if depth == MemoryDepth::K8.samples() {
            MemoryDepth::K8
        } else {
            MemoryDepth::K4
        };
        self.transport.send(Command::SetMemoryDepth(depth)).await?;
        self.depth.set(depth.samples());
        Ok(())
    }

    fn pending_waveforms(&self) -> PendingWaveforms {
        self.acquisition.pending()
    }
}

#[async_trait]
impl FunctionGenerator for Hds200 {
    fn available_shapes(&self) -> Vec<WaveShape> {
        if !self.has_awg() {
            return Vec::new();
        }
        vec![
            WaveShape::Sine,
            WaveShape::Square,
            WaveShape::Triangle,
            WaveShape::Pulse,
            WaveShape::StaircaseDown,
            WaveShape::StaircaseUp,
            WaveShape::StaircaseUpDown,
        ]
    }

    fn function_active(&self) -> Result<bool> {
        Ok(self.awg()?.enabled)
    }

    async fn set_function_active(&mut self, on: bool) -> Result<()> {
        self.awg()?;
        self.transport.send(Command::SetAwgOutput(on)).await?;
        self.awg_mut()?.enabled = on;
        Ok(())
    }

    fn function_amplitude(&self) -> Result<f32> {
        Ok(self.awg()?.amplitude)
    }

    async fn set_function_amplitude(&mut self, volts: f32) -> Result<()> {
        self.awg()?;
        self.transport.send(Command::SetAwgAmplitude(volts)).await?;
        self.awg_mut()?.amplitude = volts;
        Ok(())
    }

    fn function_offset(&self) -> Result<f32> {
        Ok(self.awg()?.offset)
    }

    async fn set_function_offset(&mut self, volts: f32) -> Result<()> {
        self.awg()?;
        self.transport.send(Command::SetAwgOffset(volts)).await?;
        self.awg_mut()?.offset = volts;
        Ok(())
    }

    fn function_frequency(&self) -> Result<f32> {
        Ok(self.awg()?.frequency)
    }

    async fn set_function_frequency(&mut self, hz: f32) -> Result<()> {
        self.awg()?;
        self.transport.send(Command::SetAwgFrequency(hz)).await?;
        self.awg_mut()?.frequency = hz;
        Ok(())
    }

    fn function_duty_cycle(&self) -> Result<f32> {
        let awg = self.awg()?;
        Ok(if awg.shape == AwgShape::Pulse {
            awg.duty_cycle
        } else {
            0.0
        })
    }

    /// The duty cycle only exists for pulses. For other shapes it is stored
    /// and takes effect once the shape is switched to pulse and set again.
    async fn set_function_duty_cycle(&mut self, duty: f32) -> Result<()> {
        let awg = self.awg_mut()?;
        awg.duty_cycle = duty;
        if awg.shape == AwgShape::Pulse {
            self.transport.send(Command::SetAwgDutyCycle(duty)).await?;
        }
        Ok(())
    }

    fn function_shape(&self) -> Result<WaveShape> {
        Ok(wave_shape(self.awg()?.shape))
    }

    async fn set_function_shape(&mut self, shape: WaveShape) -> Result<()> {
        self.awg()?;
        let Some(device_shape) = awg_shape(shape) else {
            return unsupported(format!("waveform shape {:?}", shape));
        };
        self.transport.send(Command::SetAwgShape(device_shape)).await?;
        self.awg_mut()?.shape = device_shape;
        Ok(())
    }
}
