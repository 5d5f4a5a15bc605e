// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # jinou-ble
//!
//! Polls a Jinou JO-BEC07-2 Bluetooth Low Energy temperature/humidity sensor
//! and exposes its readings as two host-framework entities.
//!
//! ## Features
//!
//! - **Setup**: Connect by address and subscribe the sensor data and battery
//!   characteristics, all-or-nothing
//! - **Polling**: One call reads and decodes a fresh sample
//! - **Entities**: A temperature entity (°C, with battery level attribute) and
//!   a humidity entity (%) derived from the same reading
//! - **Pluggable transport**: Everything above [`GattTransport`] runs without
//!   a radio
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jinou_ble::{setup_platform_with_bluetooth, Entity, Result, SensorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SensorConfig::new("AA:BB:CC:DD:EE:FF").with_name("Greenhouse");
//!     let device = setup_platform_with_bluetooth(&config).await?;
//!
//!     device.poll().await?;
//!
//!     for entity in device.entities() {
//!         match entity.state() {
//!             Some(value) => println!("{}: {:.1}{}", entity.name(), value, entity.unit_of_measurement()),
//!             None => println!("{}: unknown", entity.name()),
//!         }
//!     }
//!
//!     device.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Peripheral MAC addresses are hidden; configure the platform peripheral id
//! instead. Requires Bluetooth permission.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for configuration and data types

// Public modules
pub mod ble;
pub mod config;
pub mod data;
pub mod error;
pub mod platform;
pub mod sensor;

// Re-exports for convenience
pub use config::{SensorConfig, SensorIdentity};
pub use error::{Error, Result};
pub use platform::{setup_platform, setup_platform_with_bluetooth, JinouDevice};
pub use sensor::{Entity, EntityAttributes, HumiditySensor, TemperatureSensor};

// Re-export commonly used types from submodules
pub use ble::{BtleplugTransport, ConnectionState, GattTransport, PeripheralReader};
pub use data::{
    decode_battery, decode_humidity, decode_temperature, BatteryLevel, Reading, ReadingState,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that key types are exported
        let _ = std::any::TypeId::of::<JinouDevice>();
        let _ = std::any::TypeId::of::<TemperatureSensor>();
        let _ = std::any::TypeId::of::<HumiditySensor>();
        let _ = std::any::TypeId::of::<PeripheralReader>();
        let _ = std::any::TypeId::of::<Error>();
        let _ = std::any::TypeId::of::<Reading>();
        let _ = std::any::TypeId::of::<BatteryLevel>();
    }

    #[test]
    fn test_decoding_reexports() {
        let raw = [0x02, 0x19, 0x03, 0x00, 0x37, 0x02];
        assert!((decode_temperature(&raw).unwrap() - 23.3).abs() < 0.001);
        assert!((decode_humidity(&raw).unwrap() - 55.2).abs() < 0.001);
        assert_eq!(decode_battery(100), BatteryLevel(100));
    }
}
