use bytes::Bytes;
use std::{io, str};

/// A decoded device reply. Plain queries answer with a single text line,
/// waveform queries with an IEEE 488.2 definite-length block.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Line(String),
    Block(Bytes),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub vendor: String,
    pub model: String,
    pub serial: String,
    pub firmware: String,
}

impl Ident {
    /// Models with an `S` suffix carry the function generator.
    pub fn has_awg(&self) -> bool {
        self.model.ends_with('S')
    }
}

impl TryFrom<&str> for Ident {
    type Error = io::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let values: Vec<&str> = value.split(',').map(str::trim).collect();
        if values.len() == 4 {
            Ok(Self {
                vendor: String::from(values[0]),
                model: String::from(values[1]),
                serial: String::from(values[2]),
                firmware: String::from(values[3]),
            })
        } else {
            Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid data for *IDN? response: {}", value),
            ))
        }
    }
}
