//! BLE communication module.
//!
//! This module provides the Bluetooth Low Energy plumbing for locating,
//! connecting to and reading from a Jinou sensor.

pub mod characteristics;
pub mod connection;
pub mod peripheral;
pub mod reader;
pub mod scanner;
pub mod transport;
pub mod uuids;

pub use characteristics::{Channel, CharacteristicHandle, NOTIFICATION_ENABLE};
pub use connection::{ConnectionHandle, ConnectionState};
pub use peripheral::BtleplugTransport;
pub use reader::PeripheralReader;
pub use scanner::BleScanner;
pub use transport::{CharacteristicRef, GattTransport};
pub use uuids::*;
