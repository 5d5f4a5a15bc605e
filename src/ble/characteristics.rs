//! GATT characteristic handles.
//!
//! A [`CharacteristicHandle`] is what subscription hands back: a resolved
//! characteristic with notifications enabled on it.

use uuid::Uuid;

use crate::ble::transport::CharacteristicRef;
use crate::ble::uuids::*;

/// Value written to the Client Characteristic Configuration descriptor to
/// enable notifications.
pub const NOTIFICATION_ENABLE: [u8; 2] = [0x01, 0x00];

/// The two characteristics the sensor integration subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Temperature/humidity payload (`0xAA20` / `0xAA21`).
    SensorData,
    /// Battery level (`0x180F` / `0x2A19`).
    BatteryLevel,
}

impl Channel {
    /// Service UUID of this channel.
    pub fn service_uuid(&self) -> Uuid {
        match self {
            Self::SensorData => SENSOR_SERVICE_UUID,
            Self::BatteryLevel => BATTERY_SERVICE_UUID,
        }
    }

    /// Characteristic UUID of this channel.
    pub fn characteristic_uuid(&self) -> Uuid {
        match self {
            Self::SensorData => SENSOR_DATA_UUID,
            Self::BatteryLevel => BATTERY_LEVEL_UUID,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SensorData => write!(f, "sensor data"),
            Self::BatteryLevel => write!(f, "battery level"),
        }
    }
}

/// A subscribed characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharacteristicHandle {
    characteristic: CharacteristicRef,
}

impl CharacteristicHandle {
    pub(crate) fn new(characteristic: CharacteristicRef) -> Self {
        Self { characteristic }
    }

    /// The resolved characteristic.
    pub fn characteristic(&self) -> CharacteristicRef {
        self.characteristic
    }

    /// Characteristic UUID.
    pub fn uuid(&self) -> Uuid {
        self.characteristic.uuid
    }

    /// Owning service UUID.
    pub fn service_uuid(&self) -> Uuid {
        self.characteristic.service_uuid
    }
}
