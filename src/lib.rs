//!
//! This library drives the OWON HDS200 series handheld instruments: a
//! multimeter, a two channel oscilloscope and, on `S` models, an arbitrary
//! waveform generator behind one SCPI serial port.
//!
//! <br>
//!
//! # Details
//!
//! - The device is connected by USB and shows up as a serial port.
//!
//! - Each instrument role is a trait in [`capability`], all of them are
//!   implemented by [`Hds200`].
//!
//! - Basic setup and connection
//!
//!   ```no_run
//!   use hds200ctrl::{Hds200, Multimeter, MeasurementType, DEFAULT_BAUDRATE, DEFAULT_TTY};
//!   #[tokio::main]
//!   async fn main() -> hds200ctrl::Result<()> {
//!       let mut device = Hds200::open(DEFAULT_TTY, DEFAULT_BAUDRATE).await?;
//!       eprintln!("Connected to: {}\n", device.ident().model);
//!       device.set_meter_mode(MeasurementType::DcVoltage).await?;
//!       device.set_meter_range("20").await?;
//!       eprintln!("{} V", device.meter_value().await?);
//!       Ok(())
//!   }
//!   ```
//!
//! - Device state changes are slow. Most setters wait for the device to
//!   settle before they return, see [`timing`].
//!
//! # Supported devices
//!
//!  * OWON HDS242, HDS272
//!  * OWON HDS2102S, HDS2202S (with function generator)
//!

pub mod acquisition;
pub mod cache;
pub mod capability;
pub mod device;
pub mod mode;
pub mod proto;
pub mod range;
pub mod timing;
pub mod waveform;

pub use capability::{
    Coupling, FunctionGenerator, InstrumentType, MeasurementType, Multimeter, Oscilloscope,
    ScopeChannel, TriggerMode, WaveShape,
};
pub use device::Hds200;
pub use mode::{MeasurementMode, ModeResolution};
pub use proto::{Error, Result};
pub use waveform::{PendingWaveforms, WaveformRecord, WaveformSet};

#[cfg(unix)]
pub const DEFAULT_TTY: &str = "/dev/ttyUSB0";
#[cfg(windows)]
pub const DEFAULT_TTY: &str = "COM1";

/// Default Baudrate of the HDS200 USB serial port.
pub const DEFAULT_BAUDRATE: u32 = 115200;
