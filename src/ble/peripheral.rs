//! `btleplug`-backed GATT transport.

use async_trait::async_trait;
use btleplug::api::{Characteristic, Descriptor, Peripheral as _};
use btleplug::platform::Peripheral;
use parking_lot::RwLock;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::ble::scanner::BleScanner;
use crate::ble::transport::{CharacteristicRef, GattTransport};
use crate::ble::uuids::CLIENT_CHARACTERISTIC_CONFIG_UUID;
use crate::config::DEFAULT_SCAN_TIMEOUT;
use crate::error::{Error, Result};

/// GATT transport over the platform Bluetooth stack.
pub struct BtleplugTransport {
    /// Scanner used to locate the device before connecting.
    scanner: BleScanner,
    /// How long to scan for the device.
    scan_timeout: Duration,
    /// The connected peripheral, once `connect` succeeded.
    peripheral: RwLock<Option<Peripheral>>,
}

impl BtleplugTransport {
    /// Create a transport on the first available Bluetooth adapter.
    pub async fn new() -> Result<Self> {
        Ok(Self::with_scanner(BleScanner::new().await?))
    }

    /// Create a transport on an existing scanner.
    pub fn with_scanner(scanner: BleScanner) -> Self {
        Self {
            scanner,
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            peripheral: RwLock::new(None),
        }
    }

    /// Set how long `connect` scans for the device.
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// The connected peripheral. The lock is released before returning.
    fn peripheral(&self) -> Result<Peripheral> {
        self.peripheral.read().clone().ok_or(Error::NotConnected)
    }

    /// Look up the platform characteristic behind a [`CharacteristicRef`].
    fn characteristic(&self, characteristic: CharacteristicRef) -> Result<(Peripheral, Characteristic)> {
        let peripheral = self.peripheral()?;

        let found = peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == characteristic.uuid && c.service_uuid == characteristic.service_uuid)
            .ok_or_else(|| Error::CharacteristicNotFound {
                uuid: characteristic.uuid.to_string(),
            })?;

        Ok((peripheral, found))
    }
}

/// Pick the descriptor notifications are enabled through.
///
/// Prefers the Client Characteristic Configuration descriptor and falls back
/// to the first one the device lists.
pub(crate) fn configuration_descriptor(characteristic: &Characteristic) -> Option<Descriptor> {
    characteristic
        .descriptors
        .iter()
        .find(|d| d.uuid == CLIENT_CHARACTERISTIC_CONFIG_UUID)
        .or_else(|| characteristic.descriptors.iter().next())
        .cloned()
}

/// Drop a half-established link when a step after `connect` failed.
///
/// `disconnect` only runs on error; its own failure is logged and the
/// original error is returned.
async fn release_on_error<T, D>(result: Result<T>, disconnect: D) -> Result<T>
where
    D: Future<Output = btleplug::Result<()>>,
{
    if result.is_err() {
        if let Err(e) = disconnect.await {
            warn!("Failed to release link after connect error: {}", e);
        }
    }
    result
}

#[async_trait]
impl GattTransport for BtleplugTransport {
    async fn connect(&self, address: &str) -> Result<()> {
        let peripheral = self
            .scanner
            .find_peripheral(address, self.scan_timeout)
            .await?;

        if !peripheral.is_connected().await.unwrap_or(false) {
            peripheral
                .connect()
                .await
                .map_err(|e| Error::ConnectionFailed {
                    reason: e.to_string(),
                })?;
        } else {
            info!("Peripheral already connected at BLE level");
        }

        let discovered = peripheral
            .discover_services()
            .await
            .map_err(Error::Bluetooth);
        release_on_error(discovered, peripheral.disconnect()).await?;

        debug!(
            "Discovered {} services on {}",
            peripheral.services().len(),
            address
        );

        *self.peripheral.write() = Some(peripheral);

        Ok(())
    }

    async fn find_characteristic(
        &self,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<CharacteristicRef> {
        let peripheral = self.peripheral()?;

        let found = peripheral
            .services()
            .into_iter()
            .find(|s| s.uuid == service)
            .ok_or_else(|| Error::ServiceNotFound {
                uuid: service.to_string(),
            })?;

        for c in &found.characteristics {
            trace!("Service {} has characteristic {}", service, c.uuid);
        }

        found
            .characteristics
            .iter()
            .find(|c| c.uuid == characteristic)
            .map(|c| CharacteristicRef::new(c.service_uuid, c.uuid))
            .ok_or_else(|| Error::CharacteristicNotFound {
                uuid: characteristic.to_string(),
            })
    }

    async fn write_descriptor(&self, characteristic: CharacteristicRef, data: &[u8]) -> Result<()> {
        let (peripheral, found) = self.characteristic(characteristic)?;

        let descriptor =
            configuration_descriptor(&found).ok_or_else(|| Error::DescriptorNotFound {
                uuid: characteristic.uuid.to_string(),
            })?;

        peripheral
            .write_descriptor(&descriptor, data)
            .await
            .map_err(Error::Bluetooth)?;

        trace!("Wrote {} bytes to descriptor {}", data.len(), descriptor.uuid);

        Ok(())
    }

    async fn read(&self, characteristic: CharacteristicRef) -> Result<Vec<u8>> {
        let (peripheral, found) = self.characteristic(characteristic)?;

        if !peripheral.is_connected().await.unwrap_or(false) {
            return Err(Error::ConnectionLost);
        }

        peripheral.read(&found).await.map_err(Error::Bluetooth)
    }

    async fn disconnect(&self) -> Result<()> {
        let peripheral = self.peripheral.write().take();

        match peripheral {
            Some(peripheral) => peripheral.disconnect().await.map_err(Error::Bluetooth),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::uuids::*;
    use btleplug::api::CharPropFlags;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn characteristic_with(descriptors: &[Uuid]) -> Characteristic {
        Characteristic {
            uuid: SENSOR_DATA_UUID,
            service_uuid: SENSOR_SERVICE_UUID,
            properties: CharPropFlags::READ | CharPropFlags::NOTIFY,
            descriptors: descriptors
                .iter()
                .map(|uuid| Descriptor {
                    uuid: *uuid,
                    service_uuid: SENSOR_SERVICE_UUID,
                    characteristic_uuid: SENSOR_DATA_UUID,
                })
                .collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn test_configuration_descriptor_prefers_cccd() {
        let other = uuid_from_u16(0x2901);
        let c = characteristic_with(&[other, CLIENT_CHARACTERISTIC_CONFIG_UUID]);
        let d = configuration_descriptor(&c).unwrap();
        assert_eq!(d.uuid, CLIENT_CHARACTERISTIC_CONFIG_UUID);
    }

    #[test]
    fn test_configuration_descriptor_falls_back_to_first() {
        let other = uuid_from_u16(0x2901);
        let c = characteristic_with(&[other]);
        let d = configuration_descriptor(&c).unwrap();
        assert_eq!(d.uuid, other);
    }

    #[test]
    fn test_configuration_descriptor_missing() {
        let c = characteristic_with(&[]);
        assert!(configuration_descriptor(&c).is_none());
    }

    #[tokio::test]
    async fn test_release_on_error_disconnects_failed_link() {
        let released = AtomicBool::new(false);

        let result: Result<()> = release_on_error(Err(Error::ConnectionLost), async {
            released.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(Error::ConnectionLost)));
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_release_on_error_keeps_original_error() {
        let result: Result<()> = release_on_error(Err(Error::ConnectionLost), async {
            Err(btleplug::Error::NotConnected)
        })
        .await;

        assert!(matches!(result, Err(Error::ConnectionLost)));
    }

    #[tokio::test]
    async fn test_release_on_error_leaves_healthy_link() {
        let released = AtomicBool::new(false);

        let result = release_on_error(Ok(3), async {
            released.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert!(!released.load(Ordering::SeqCst));
    }
}
