//! Data structures for sensor data.
//!
//! Pure decoding of the raw characteristic payloads into temperature,
//! humidity and battery values.

pub mod battery;
pub mod reading;

pub use battery::{decode_battery, BatteryLevel};
pub use reading::{decode_humidity, decode_temperature, Reading, ReadingState, READING_LEN};
