//! BLE scanning functionality.
//!
//! Locates the configured sensor by address before a connection is made.

use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::stream::StreamExt;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};

/// Normalize an address for comparison: separators dropped, lowercase.
fn normalize_address(address: &str) -> String {
    address
        .chars()
        .filter(|c| !matches!(c, ':' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Check whether a peripheral address (or platform id) matches the wanted one.
pub fn address_matches(candidate: &str, wanted: &str) -> bool {
    let wanted = normalize_address(wanted);
    !wanted.is_empty() && normalize_address(candidate) == wanted
}

/// BLE scanner for finding a sensor by address.
pub struct BleScanner {
    /// The BLE adapter to use for scanning.
    adapter: Adapter,
}

impl BleScanner {
    /// Create a new BLE scanner on the first available adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new() -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self { adapter })
    }

    /// Scan until a peripheral matching `address` is seen or `timeout` elapses.
    pub async fn find_peripheral(&self, address: &str, timeout: Duration) -> Result<Peripheral> {
        // The adapter may already know the device from an earlier scan.
        if let Some(peripheral) = self.known_peripheral(address).await? {
            return Ok(peripheral);
        }

        info!("Scanning for {} (timeout {:?})", address, timeout);

        let mut events = self.adapter.events().await.map_err(Error::Bluetooth)?;

        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(Error::Bluetooth)?;

        let found = tokio::time::timeout(timeout, async {
            while let Some(event) = events.next().await {
                let id = match event {
                    CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
                    _ => continue,
                };

                match self.matching_peripheral(&id, address).await {
                    Some(peripheral) => return Some(peripheral),
                    None => trace!("Ignoring device {:?}", id),
                }
            }
            None
        })
        .await
        .ok()
        .flatten();

        if let Err(e) = self.adapter.stop_scan().await {
            warn!("Failed to stop scan: {}", e);
        }

        found.ok_or_else(|| Error::DeviceNotFound {
            address: address.to_string(),
        })
    }

    /// Look for `address` among peripherals the adapter already knows about.
    async fn known_peripheral(&self, address: &str) -> Result<Option<Peripheral>> {
        let peripherals = self.adapter.peripherals().await.map_err(Error::Bluetooth)?;

        Ok(peripherals
            .into_iter()
            .find(|p| Self::peripheral_matches(p, address)))
    }

    /// Resolve a discovered id and return it if it is the wanted device.
    async fn matching_peripheral(&self, id: &PeripheralId, address: &str) -> Option<Peripheral> {
        let peripheral = match self.adapter.peripheral(id).await {
            Ok(p) => p,
            Err(e) => {
                trace!("Failed to get peripheral: {}", e);
                return None;
            }
        };

        if Self::peripheral_matches(&peripheral, address) {
            debug!("Found {} as {:?}", address, id);
            Some(peripheral)
        } else {
            None
        }
    }

    /// macOS hides MAC addresses, so the platform id is accepted too.
    fn peripheral_matches(peripheral: &Peripheral, address: &str) -> bool {
        address_matches(&peripheral.address().to_string(), address)
            || address_matches(&peripheral.id().to_string(), address)
    }
}
