//! BLE Service, Characteristic and Descriptor UUIDs.
//!
//! The Jinou sensor advertises 16-bit UUIDs, expanded here onto the
//! Bluetooth base UUID `0000xxxx-0000-1000-8000-00805f9b34fb`.

use uuid::Uuid;

// Sensor Data Service (Jinou Custom)
/// Jinou sensor data service UUID (`0xAA20`).
pub const SENSOR_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_aa20_0000_1000_8000_00805f9b34fb);
/// Jinou sensor data characteristic UUID (`0xAA21`, Read, Notify).
pub const SENSOR_DATA_UUID: Uuid = Uuid::from_u128(0x0000_aa21_0000_1000_8000_00805f9b34fb);

// Battery Service (Standard BLE)
/// Standard BLE Battery Service UUID.
pub const BATTERY_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_180f_0000_1000_8000_00805f9b34fb);
/// Battery Level characteristic UUID.
pub const BATTERY_LEVEL_UUID: Uuid = Uuid::from_u128(0x0000_2a19_0000_1000_8000_00805f9b34fb);

/// Client Characteristic Configuration descriptor UUID.
pub const CLIENT_CHARACTERISTIC_CONFIG_UUID: Uuid =
    Uuid::from_u128(0x0000_2902_0000_1000_8000_00805f9b34fb);

/// Expand a 16-bit assigned number onto the Bluetooth base UUID.
pub const fn uuid_from_u16(short: u16) -> Uuid {
    Uuid::from_u128(0x0000_0000_0000_1000_8000_00805f9b34fb | ((short as u128) << 96))
}
