//! Platform setup.
//!
//! Turns a [`SensorConfig`] into a connected [`JinouDevice`] holding the
//! temperature and humidity entities. Setup is all-or-nothing: if any step
//! fails the link is torn down and no entities are handed out.

use std::sync::Arc;
use tracing::{info, warn};

use crate::ble::characteristics::{Channel, CharacteristicHandle};
use crate::ble::connection::ConnectionHandle;
use crate::ble::peripheral::BtleplugTransport;
use crate::ble::reader::PeripheralReader;
use crate::ble::transport::GattTransport;
use crate::config::SensorConfig;
use crate::error::{Error, Result};
use crate::sensor::{Entity, HumiditySensor, TemperatureSensor};

/// A set-up sensor: the shared reader plus its two entities.
#[derive(Debug)]
pub struct JinouDevice {
    reader: Arc<PeripheralReader>,
    temperature: Arc<TemperatureSensor>,
    humidity: HumiditySensor,
}

impl JinouDevice {
    /// The temperature entity (owns the cached reading).
    pub fn temperature(&self) -> &Arc<TemperatureSensor> {
        &self.temperature
    }

    /// The humidity entity.
    pub fn humidity(&self) -> &HumiditySensor {
        &self.humidity
    }

    /// Both entities, temperature first.
    pub fn entities(&self) -> Vec<&dyn Entity> {
        let temperature: &dyn Entity = self.temperature.as_ref();
        vec![temperature, &self.humidity]
    }

    /// Poll hook: read and decode one sample.
    ///
    /// Errors are returned unchanged; the entities keep their previous state.
    pub async fn poll(&self) -> Result<()> {
        self.temperature.update().await
    }

    /// The reader holding the connection.
    pub fn reader(&self) -> &Arc<PeripheralReader> {
        &self.reader
    }

    /// Disconnect from the sensor.
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down {}", self.temperature.identity().address());
        self.reader.disconnect().await
    }
}

/// Set up a sensor over `transport`.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] for a rejected configuration, and
/// [`Error::Setup`] wrapping the cause if connecting or subscribing fails.
pub async fn setup_platform(
    config: &SensorConfig,
    transport: Arc<dyn GattTransport>,
) -> Result<JinouDevice> {
    config.validate()?;

    let identity = config.identity();
    let reader = Arc::new(PeripheralReader::new(transport).with_read_timeout(config.read_timeout()));

    info!("Jinou: connecting to {}", identity.address());

    let handle = reader
        .connect(identity.address())
        .await
        .map_err(|e| e.into_setup(identity.address()))?;

    let (data, battery) = match subscribe_channels(&reader, &handle).await {
        Ok(handles) => handles,
        Err(e) => {
            if let Err(disconnect_err) = reader.disconnect().await {
                warn!(
                    "Failed to disconnect after setup error on {}: {}",
                    identity.address(),
                    disconnect_err
                );
            }
            return Err(e.into_setup(identity.address()));
        }
    };

    let temperature = Arc::new(TemperatureSensor::new(
        identity.clone(),
        reader.clone(),
        data,
        battery,
    ));
    let humidity = HumiditySensor::new(&temperature, identity.name());

    info!("Jinou: {} ready", identity.address());

    Ok(JinouDevice {
        reader,
        temperature,
        humidity,
    })
}

/// Set up a sensor over the platform Bluetooth stack.
pub async fn setup_platform_with_bluetooth(config: &SensorConfig) -> Result<JinouDevice> {
    config.validate()?;

    let transport = BtleplugTransport::new()
        .await
        .map_err(|e| e.into_setup(&config.address))?
        .with_scan_timeout(config.scan_timeout());

    setup_platform(config, Arc::new(transport)).await
}

/// Subscribe the sensor data channel, then the battery channel.
async fn subscribe_channels(
    reader: &PeripheralReader,
    handle: &ConnectionHandle,
) -> Result<(CharacteristicHandle, CharacteristicHandle)> {
    let data = subscribe_channel(reader, handle, Channel::SensorData).await?;
    let battery = subscribe_channel(reader, handle, Channel::BatteryLevel).await?;
    Ok((data, battery))
}

async fn subscribe_channel(
    reader: &PeripheralReader,
    handle: &ConnectionHandle,
    channel: Channel,
) -> Result<CharacteristicHandle> {
    reader
        .subscribe(handle, channel.service_uuid(), channel.characteristic_uuid())
        .await
        .map_err(|e| {
            warn!("Failed to subscribe to {} channel: {}", channel, e);
            e
        })
}

impl From<JinouDevice> for (Arc<TemperatureSensor>, HumiditySensor) {
    fn from(device: JinouDevice) -> Self {
        (device.temperature, device.humidity)
    }
}
