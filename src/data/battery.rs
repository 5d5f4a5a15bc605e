//! Battery level decoding.

use crate::error::{Error, Result};

/// Battery charge as reported by the Battery Level characteristic.
///
/// The raw byte is taken as-is, so values above 100 are passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatteryLevel(pub u8);

impl BatteryLevel {
    /// Decode a Battery Level payload, which must be exactly one byte.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        match raw {
            [level] => Ok(decode_battery(*level)),
            _ => Err(Error::InvalidData {
                context: format!("battery payload is {} bytes, expected 1", raw.len()),
            }),
        }
    }

    /// The level in percent.
    pub fn percent(&self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for BatteryLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Decode a single battery byte.
#[inline]
pub fn decode_battery(raw: u8) -> BatteryLevel {
    BatteryLevel(raw)
}
