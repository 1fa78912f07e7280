use chrono::Utc;
use tracing::{debug, warn};

use crate::capability::{ScopeChannel, TriggerMode};
use crate::proto::{command::Command, conv::split_timestamp, transport::Transport, Result};
use crate::waveform::{PendingWaveforms, ScreenHeader, WaveformRecord, WaveformScale, WaveformSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerState {
    #[default]
    Disarmed,
    Armed,
    /// Disarms after the next acquisition.
    ArmedOneShot,
}

impl TriggerState {
    pub fn is_armed(&self) -> bool {
        !matches!(self, TriggerState::Disarmed)
    }
}

/// Trigger bookkeeping and the acquisition path from screen data to queued
/// waveform sets.
///
/// The device is free running; arming only decides whether a poll fetches
/// the current screen.
#[derive(Debug, Default)]
pub struct AcquisitionEngine {
    state: TriggerState,
    pending: PendingWaveforms,
}

impl AcquisitionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn start(&mut self) {
        self.state = TriggerState::Armed;
    }

    pub fn start_single_trigger(&mut self) {
        self.state = TriggerState::ArmedOneShot;
    }

    pub fn force_trigger(&mut self) {
        self.state = TriggerState::ArmedOneShot;
    }

    pub fn stop(&mut self) {
        self.state = TriggerState::Disarmed;
    }

    pub fn poll_trigger(&self) -> TriggerMode {
        if self.state.is_armed() {
            TriggerMode::Triggered
        } else {
            TriggerMode::Stop
        }
    }

    pub fn pending(&self) -> PendingWaveforms {
        self.pending.clone()
    }

    async fn read_scale(transport: &mut Transport) -> Result<WaveformScale> {
        let data = transport.query_block(Command::GetScreenHeader).await?;
        match ScreenHeader::parse(&data) {
            Ok(header) => Ok(WaveformScale::from(&header)),
            Err(err) => {
                warn!("Unable to parse screen header ({}), using defaults", err);
                Ok(WaveformScale::default())
            }
        }
    }

    /// Fetch the current screen and queue it as one waveform set.
    ///
    /// Returns `false` without talking to the device while disarmed.
    pub async fn acquire(&mut self, transport: &mut Transport) -> Result<bool> {
        if !self.state.is_armed() {
            return Ok(false);
        }

        let scale = Self::read_scale(transport).await?;
        let channel = ScopeChannel::Ch1;
        let data = transport
            .query_block(Command::GetScreenWaveform(channel))
            .await?;
        let samples = scale.decode(&data)?;

        let (start_secs, start_fs) = split_timestamp(&Utc::now());
        debug!(
            "acquired {} samples on {}, interval {} fs",
            samples.len(),
            channel,
            scale.interval_fs
        );

        self.pending.push(WaveformSet {
            records: vec![WaveformRecord {
                channel,
                samples,
                interval_fs: scale.interval_fs,
                start_secs,
                start_fs,
                trigger_phase_fs: 0,
            }],
        });

        if self.state == TriggerState::ArmedOneShot {
            self.state = TriggerState::Disarmed;
        }
        Ok(true)
    }
}
