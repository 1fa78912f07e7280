use byteorder::{LittleEndian, ReadBytesExt};
use bytes::Buf;
use serde::Deserialize;
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::capability::ScopeChannel;
use crate::proto::conv::{parse_si, FS_PER_SECOND};

pub(crate) const SAMPLE_LEN: usize = 2;

/// Sample rate assumed if the screen header does not tell.
pub const DEFAULT_SAMPLE_RATE: i64 = 50_000;

/// Full scale of a raw sample. The device does not report its vertical
/// scaling, so raw values are mapped onto a fixed 0.5 V envelope until
/// the scale and offset are read from the channel setup.
pub const VOLTS_FULL_SCALE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct WaveformRecord {
    pub channel: ScopeChannel,
    pub samples: Vec<f32>,
    /// Time between two samples in femtoseconds.
    pub interval_fs: i64,
    /// Wall clock time of the first sample, whole unix seconds.
    pub start_secs: i64,
    /// Sub-second part of the start time in femtoseconds.
    pub start_fs: i64,
    pub trigger_phase_fs: i64,
}

/// All records of one acquisition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveformSet {
    pub records: Vec<WaveformRecord>,
}

impl WaveformSet {
    pub fn get(&self, channel: ScopeChannel) -> Option<&WaveformRecord> {
        self.records.iter().find(|r| r.channel == channel)
    }
}

/// A JSON value the device sends either as a number or as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Number(f64),
    Text(String),
}

impl HeaderValue {
    fn as_f64(&self, unit: &str) -> Option<f64> {
        match self {
            HeaderValue::Number(n) => Some(*n),
            HeaderValue::Text(s) => parse_si(s, unit),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct SampleInfo {
    pub datalen: Option<HeaderValue>,
    pub samplerate: Option<HeaderValue>,
    pub depmem: Option<HeaderValue>,
}

/// Reply to `:DAT:WAV:SCR:HEAD?`. Only the fields used for decoding are
/// modelled, everything else is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct ScreenHeader {
    pub sample: Option<SampleInfo>,
}

impl ScreenHeader {
    pub fn parse(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }

    /// Samples per second.
    pub fn sample_rate(&self) -> Option<f64> {
        self.sample
            .as_ref()?
            .samplerate
            .as_ref()?
            .as_f64("S/s")
            .filter(|rate| *rate > 0.0)
    }

    /// Samples on screen, at most the acquisition memory depth if the
    /// header does not say.
    pub fn data_len(&self) -> Option<usize> {
        let sample = self.sample.as_ref()?;
        sample
            .datalen
            .as_ref()
            .or(sample.depmem.as_ref())?
            .as_f64("")
            .filter(|len| *len >= 0.0)
            .map(|len| len as usize)
    }
}

/// How raw samples of one block are turned into a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformScale {
    pub interval_fs: i64,
    pub max_samples: Option<usize>,
    pub volts_per_count: f32,
}

impl Default for WaveformScale {
    fn default() -> Self {
        Self {
            interval_fs: FS_PER_SECOND / DEFAULT_SAMPLE_RATE,
            max_samples: None,
            volts_per_count: VOLTS_FULL_SCALE / 65535.0,
        }
    }
}

impl From<&ScreenHeader> for WaveformScale {
    fn from(header: &ScreenHeader) -> Self {
        let mut scale = Self::default();
        if let Some(rate) = header.sample_rate() {
            scale.interval_fs = (FS_PER_SECOND as f64 / rate).round() as i64;
        }
        scale.max_samples = header.data_len();
        scale
    }
}

impl WaveformScale {
    /// Decode little endian 16 bit samples. A trailing odd byte is ignored.
    pub fn decode(&self, data: &[u8]) -> std::io::Result<Vec<f32>> {
        let mut count = data.len() / SAMPLE_LEN;
        if let Some(max) = self.max_samples {
            count = count.min(max);
        }

        let mut cur = Cursor::new(data);
        let mut samples = Vec::with_capacity(count);
        while samples.len() < count && cur.remaining() >= SAMPLE_LEN {
            let raw = cur.read_i16::<LittleEndian>()?;
            samples.push(f32::from(raw) * self.volts_per_count);
        }
        Ok(samples)
    }
}

/// Waveform sets waiting for the consumer, oldest first. Cloning gives
/// another handle to the same queue.
#[derive(Debug, Clone, Default)]
pub struct PendingWaveforms {
    queue: Arc<Mutex<VecDeque<WaveformSet>>>,
}

impl PendingWaveforms {
    fn lock(&self) -> MutexGuard<'_, VecDeque<WaveformSet>> {
        // A panicking consumer must not take the queue down with it.
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, set: WaveformSet) {
        self.lock().push_back(set);
    }

    pub fn pop(&self) -> Option<WaveformSet> {
        self.lock().pop_front()
    }

    pub fn drain(&self) -> Vec<WaveformSet> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
