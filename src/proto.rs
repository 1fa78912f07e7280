use self::response::Response;
use crate::mode::MeasurementMode;

pub mod codec;
pub mod command;
pub mod conv;
pub mod response;
pub mod transport;

#[cfg(test)]
pub(crate) mod fake;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {:?}", _0)]
    Io(#[from] std::io::Error),

    #[error("Serial I/O error: {:?}", _0)]
    Serial(#[from] tokio_serial::Error),

    #[error("Connection was closed")]
    Abort,
    #[error("Unexpected response: {:?}", _0)]
    Unexpected(Response),
    #[error("Invalid reply from device: {0}")]
    InvalidReply(String),
    #[error("Not supported by device: {0}")]
    Unsupported(String),
    #[error("Range {range:?} is not available in {mode} mode")]
    InvalidRange {
        range: String,
        mode: MeasurementMode,
    },
}

impl From<Response> for Error {
    fn from(value: Response) -> Self {
        Self::Unexpected(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
