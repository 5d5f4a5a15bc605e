//! Entities exposed to the host framework.
//!
//! [`TemperatureSensor`] owns the cached reading and performs the poll.
//! [`HumiditySensor`] never polls; it derives its state from the temperature
//! sensor's reading through a non-owning reference.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::ble::characteristics::CharacteristicHandle;
use crate::ble::reader::PeripheralReader;
use crate::config::SensorIdentity;
use crate::data::{BatteryLevel, Reading, ReadingState};
use crate::error::Result;

/// Unit of the temperature entity.
pub const TEMP_CELSIUS: &str = "°C";
/// Unit of the humidity entity.
pub const PERCENTAGE: &str = "%";
/// Attribute key carrying the battery level.
pub const ATTR_BATTERY_LEVEL: &str = "battery_level";

/// Extra state attributes of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityAttributes {
    /// Battery level in percent, once known.
    pub battery_level: Option<u8>,
}

impl EntityAttributes {
    /// Attributes as key/value pairs, skipping absent values.
    pub fn entries(&self) -> Vec<(&'static str, u8)> {
        self.battery_level
            .map(|level| vec![(ATTR_BATTERY_LEVEL, level)])
            .unwrap_or_default()
    }
}

/// A read-only sensor object as the host framework sees it.
pub trait Entity: Send + Sync {
    /// Display name.
    fn name(&self) -> &str;

    /// Current state, `None` while unknown.
    fn state(&self) -> Option<f64>;

    /// Unit of [`state`](Entity::state).
    fn unit_of_measurement(&self) -> &'static str;

    /// Extra state attributes.
    fn attributes(&self) -> EntityAttributes {
        EntityAttributes::default()
    }

    /// Whether the host should call the poll hook for this entity.
    fn should_poll(&self) -> bool {
        false
    }
}

/// State cached between polls.
#[derive(Debug, Default)]
struct CachedState {
    reading: ReadingState,
    battery: Option<BatteryLevel>,
    last_updated: Option<DateTime<Utc>>,
}

/// The primary entity: polls the sensor and reports temperature.
pub struct TemperatureSensor {
    /// Address and name.
    identity: SensorIdentity,
    /// Reader for the shared connection.
    reader: Arc<PeripheralReader>,
    /// Sensor data characteristic.
    data: CharacteristicHandle,
    /// Battery level characteristic.
    battery: CharacteristicHandle,
    /// Last successful poll.
    state: RwLock<CachedState>,
}

impl TemperatureSensor {
    /// Create the entity over already subscribed characteristics.
    pub fn new(
        identity: SensorIdentity,
        reader: Arc<PeripheralReader>,
        data: CharacteristicHandle,
        battery: CharacteristicHandle,
    ) -> Self {
        Self {
            identity,
            reader,
            data,
            battery,
            state: RwLock::new(CachedState::default()),
        }
    }

    /// Poll the sensor once.
    ///
    /// Reads the data characteristic, then the battery characteristic, and
    /// commits both together. On any error the previous state is kept and the
    /// error is returned to the caller.
    ///
    /// An empty data payload is not an error: both entities become absent
    /// until a later poll returns data.
    pub async fn update(&self) -> Result<()> {
        debug!("Polling data for {}", self.identity.name());

        let raw = self.reader.read_raw(&self.data).await?;
        let reading = if raw.is_empty() {
            ReadingState::Unpolled
        } else {
            ReadingState::Polled(Reading::new(raw)?)
        };

        let raw_battery = self.reader.read_raw(&self.battery).await?;
        let battery = BatteryLevel::from_bytes(&raw_battery)?;

        debug!(
            "Data collected: {:02X?}, battery {}",
            reading.reading().map(Reading::as_bytes).unwrap_or_default(),
            battery
        );

        let mut state = self.state.write();
        state.reading = reading;
        state.battery = Some(battery);
        state.last_updated = Some(Utc::now());

        Ok(())
    }

    /// The cached reading state.
    pub fn reading(&self) -> ReadingState {
        self.state.read().reading.clone()
    }

    /// Current temperature in °C.
    pub fn temperature(&self) -> Option<f64> {
        self.state.read().reading.temperature()
    }

    /// Current humidity in %, from the same reading.
    pub fn humidity(&self) -> Option<f64> {
        self.state.read().reading.humidity()
    }

    /// Battery level from the last successful poll.
    pub fn battery_level(&self) -> Option<BatteryLevel> {
        self.state.read().battery
    }

    /// Time of the last successful poll.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.state.read().last_updated
    }

    /// Address and name of the sensor.
    pub fn identity(&self) -> &SensorIdentity {
        &self.identity
    }
}

impl Entity for TemperatureSensor {
    fn name(&self) -> &str {
        self.identity.name()
    }

    fn state(&self) -> Option<f64> {
        self.temperature()
    }

    fn unit_of_measurement(&self) -> &'static str {
        TEMP_CELSIUS
    }

    fn attributes(&self) -> EntityAttributes {
        EntityAttributes {
            battery_level: self.battery_level().map(|b| b.percent()),
        }
    }

    fn should_poll(&self) -> bool {
        true
    }
}

impl std::fmt::Debug for TemperatureSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemperatureSensor")
            .field("identity", &self.identity)
            .field("temperature", &self.temperature())
            .field("battery_level", &self.battery_level())
            .finish()
    }
}

/// Exposes only the humidity of a [`TemperatureSensor`]'s reading.
#[derive(Debug, Clone)]
pub struct HumiditySensor {
    name: String,
    source: Weak<TemperatureSensor>,
}

impl HumiditySensor {
    /// Create a humidity entity reading from `source`.
    pub fn new(source: &Arc<TemperatureSensor>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: Arc::downgrade(source),
        }
    }
}

impl Entity for HumiditySensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> Option<f64> {
        self.source.upgrade().and_then(|sensor| sensor.humidity())
    }

    fn unit_of_measurement(&self) -> &'static str {
        PERCENTAGE
    }
}
