//! Sensor data payload decoding.
//!
//! The sensor data characteristic returns a fixed positional layout:
//!
//! | byte | meaning                                  |
//! |------|------------------------------------------|
//! | 0    | whole degrees subtracted from the sum    |
//! | 1    | whole degrees                            |
//! | 2    | tenths of a degree                       |
//! | 3    | unused                                   |
//! | 4    | humidity, whole percent                  |
//! | 5    | humidity, tenths of a percent            |
//!
//! so that `temperature = -b0 + b1 + b2 / 10` and `humidity = b4 + b5 / 10`.

use bytes::Bytes;

use crate::error::{Error, Result};

/// Minimum number of bytes in a sensor data payload.
pub const READING_LEN: usize = 6;

/// Decode the temperature in °C from a raw payload.
///
/// Returns `None` for an empty payload, or one too short to hold the
/// temperature bytes.
///
/// # Example
///
/// ```
/// use jinou_ble::data::decode_temperature;
///
/// let t = decode_temperature(&[0x02, 0x19, 0x03, 0x00, 0x37, 0x02]).unwrap();
/// assert!((t - 23.3).abs() < 1e-9);
/// assert_eq!(decode_temperature(&[]), None);
/// ```
pub fn decode_temperature(raw: &[u8]) -> Option<f64> {
    match raw {
        [offset, whole, tenths, ..] => {
            Some(f64::from(*whole) - f64::from(*offset) + f64::from(*tenths) / 10.0)
        }
        _ => None,
    }
}

/// Decode the relative humidity in % from a raw payload.
///
/// Returns `None` for an empty payload, or one shorter than [`READING_LEN`].
pub fn decode_humidity(raw: &[u8]) -> Option<f64> {
    match raw {
        [_, _, _, _, whole, tenths, ..] => Some(f64::from(*whole) + f64::from(*tenths) / 10.0),
        _ => None,
    }
}

/// One payload read from the sensor data characteristic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    raw: Bytes,
}

impl Reading {
    /// Wrap a raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] if the payload is shorter than
    /// [`READING_LEN`] bytes.
    pub fn new(raw: impl Into<Bytes>) -> Result<Self> {
        let raw = raw.into();

        if raw.len() < READING_LEN {
            return Err(Error::InvalidData {
                context: format!(
                    "sensor payload is {} bytes, expected at least {}",
                    raw.len(),
                    READING_LEN
                ),
            });
        }

        Ok(Self { raw })
    }

    /// Temperature in °C.
    pub fn temperature(&self) -> f64 {
        // Length is checked on construction.
        decode_temperature(&self.raw).unwrap_or_default()
    }

    /// Relative humidity in %.
    pub fn humidity(&self) -> f64 {
        decode_humidity(&self.raw).unwrap_or_default()
    }

    /// The raw payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }
}

/// Cached reading state of the temperature sensor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReadingState {
    /// No successful poll yet.
    #[default]
    Unpolled,
    /// The most recent successful reading.
    Polled(Reading),
}

impl ReadingState {
    /// The current reading, if any.
    pub fn reading(&self) -> Option<&Reading> {
        match self {
            Self::Unpolled => None,
            Self::Polled(reading) => Some(reading),
        }
    }

    /// Check if a reading has been obtained.
    pub fn is_polled(&self) -> bool {
        matches!(self, Self::Polled(_))
    }

    /// Temperature of the current reading.
    pub fn temperature(&self) -> Option<f64> {
        self.reading().map(Reading::temperature)
    }

    /// Humidity of the current reading.
    pub fn humidity(&self) -> Option<f64> {
        self.reading().map(Reading::humidity)
    }
}
