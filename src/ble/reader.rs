//! Peripheral reader.
//!
//! Opens the link to a sensor, subscribes its characteristics and performs
//! raw reads on them. All radio work goes through the injected
//! [`GattTransport`].

use bytes::Bytes;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::ble::characteristics::{CharacteristicHandle, NOTIFICATION_ENABLE};
use crate::ble::connection::{ConnectionHandle, ConnectionState};
use crate::ble::scanner::address_matches;
use crate::ble::transport::GattTransport;
use crate::error::{Error, Result};

/// Reads raw characteristic values from a single sensor.
pub struct PeripheralReader {
    /// The transport to talk through.
    transport: Arc<dyn GattTransport>,
    /// Current connection state.
    state: RwLock<ConnectionState>,
    /// Address of the connected device.
    address: RwLock<Option<String>>,
    /// Optional upper bound on a single characteristic read.
    read_timeout: Option<Duration>,
}

impl PeripheralReader {
    /// Create a new reader over `transport`. Reads never time out.
    pub fn new(transport: Arc<dyn GattTransport>) -> Self {
        Self {
            transport,
            state: RwLock::new(ConnectionState::Disconnected),
            address: RwLock::new(None),
            read_timeout: None,
        }
    }

    /// Bound every characteristic read by `timeout`.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Connect to the device at `address`.
    ///
    /// There is no retry: a failed attempt leaves the reader disconnected.
    /// While connected, only the same device may be connected again.
    pub async fn connect(&self, address: &str) -> Result<ConnectionHandle> {
        let current_state = self.state();

        if current_state.is_transitioning() {
            return Err(Error::ConnectionFailed {
                reason: "Connection already in progress".to_string(),
            });
        }

        if current_state.is_connected() {
            let connected = self.address.read().clone().unwrap_or_default();
            if !address_matches(&connected, address) {
                return Err(Error::ConnectionFailed {
                    reason: format!("Already connected to {}", connected),
                });
            }
            debug!("Already connected to {}", address);
            return Ok(ConnectionHandle::new(address));
        }

        info!("Connecting to {}", address);
        self.set_state(ConnectionState::Connecting);

        match self.transport.connect(address).await {
            Ok(()) => {
                info!("Connected to {}", address);
                *self.address.write() = Some(address.to_string());
                self.set_state(ConnectionState::Connected);
                Ok(ConnectionHandle::new(address))
            }
            Err(e) => {
                warn!("Connection to {} failed: {}", address, e);
                self.set_state(ConnectionState::Disconnected);
                Err(e)
            }
        }
    }

    /// Resolve a characteristic and enable notifications on it.
    pub async fn subscribe(
        &self,
        handle: &ConnectionHandle,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<CharacteristicHandle> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }

        debug!(
            "Subscribing to characteristic {} in service {} on {}",
            characteristic,
            service,
            handle.address()
        );

        let resolved = self
            .transport
            .find_characteristic(service, characteristic)
            .await?;

        self.transport
            .write_descriptor(resolved, &NOTIFICATION_ENABLE)
            .await?;

        debug!("Notifications enabled on {}", resolved);

        Ok(CharacteristicHandle::new(resolved))
    }

    /// Read the current value of a subscribed characteristic.
    pub async fn read_raw(&self, characteristic: &CharacteristicHandle) -> Result<Bytes> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }

        let read = self.transport.read(characteristic.characteristic());

        let data = match self.read_timeout {
            Some(timeout) => tokio::time::timeout(timeout, read)
                .await
                .map_err(|_| Error::Timeout)??,
            None => read.await?,
        };

        trace!(
            "Read {} bytes from characteristic {}",
            data.len(),
            characteristic.uuid()
        );

        Ok(Bytes::from(data))
    }

    /// Disconnect from the sensor.
    pub async fn disconnect(&self) -> Result<()> {
        let current_state = self.state();

        if matches!(
            current_state,
            ConnectionState::Disconnected | ConnectionState::Disconnecting
        ) {
            return Ok(());
        }

        self.set_state(ConnectionState::Disconnecting);

        let result = self.transport.disconnect().await;
        self.address.write().take();
        self.set_state(ConnectionState::Disconnected);

        match &result {
            Ok(()) => info!("Disconnected"),
            Err(e) => warn!("Failed to disconnect cleanly: {}", e),
        }

        result
    }

    /// Update the connection state.
    fn set_state(&self, new_state: ConnectionState) {
        let old_state = std::mem::replace(&mut *self.state.write(), new_state);

        if old_state != new_state {
            debug!("Connection state changed: {} -> {}", old_state, new_state);
        }
    }
}

impl std::fmt::Debug for PeripheralReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeripheralReader")
            .field("state", &self.state())
            .field("address", &*self.address.read())
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::transport::{CharacteristicRef, MockGattTransport};
    use crate::ble::uuids::*;
    use async_trait::async_trait;
    use tokio_test::{assert_err, assert_ok};

    const ADDRESS: &str = "AA:BB:CC:DD:EE:FF";

    /// Connects fine, but reads never complete.
    struct StalledTransport;

    #[async_trait]
    impl GattTransport for StalledTransport {
        async fn connect(&self, _address: &str) -> Result<()> {
            Ok(())
        }

        async fn find_characteristic(
            &self,
            service: Uuid,
            characteristic: Uuid,
        ) -> Result<CharacteristicRef> {
            Ok(CharacteristicRef::new(service, characteristic))
        }

        async fn write_descriptor(&self, _characteristic: CharacteristicRef, _data: &[u8]) -> Result<()> {
            Ok(())
        }

        async fn read(&self, _characteristic: CharacteristicRef) -> Result<Vec<u8>> {
            std::future::pending().await
        }

        async fn disconnect(&self) -> Result<()> {
            Ok(())
        }
    }

    fn connected_mock() -> MockGattTransport {
        let mut transport = MockGattTransport::new();
        transport
            .expect_connect()
            .withf(|address| address == ADDRESS)
            .times(1)
            .returning(|_| Ok(()));
        transport
    }

    #[tokio::test]
    async fn test_connect_sets_state() {
        let reader = PeripheralReader::new(Arc::new(connected_mock()));
        assert_eq!(reader.state(), ConnectionState::Disconnected);

        let handle = assert_ok!(reader.connect(ADDRESS).await);
        assert_eq!(handle.address(), ADDRESS);
        assert!(reader.is_connected());

        // Second connect is a no-op on the transport.
        assert_ok!(reader.connect(ADDRESS).await);
        assert_ok!(reader.connect("aa-bb-cc-dd-ee-ff").await);
    }

    #[tokio::test]
    async fn test_connect_rejects_other_device_while_connected() {
        let reader = PeripheralReader::new(Arc::new(connected_mock()));
        reader.connect(ADDRESS).await.unwrap();

        let err = assert_err!(reader.connect("11:22:33:44:55:66").await);
        assert!(matches!(err, Error::ConnectionFailed { .. }));
        assert!(reader.is_connected());
    }

    #[tokio::test]
    async fn test_connect_failure_leaves_disconnected() {
        let mut transport = MockGattTransport::new();
        transport.expect_connect().returning(|address| {
            Err(Error::DeviceNotFound {
                address: address.to_string(),
            })
        });

        let reader = PeripheralReader::new(Arc::new(transport));
        let err = assert_err!(reader.connect(ADDRESS).await);
        assert!(matches!(err, Error::DeviceNotFound { .. }));
        assert_eq!(reader.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_subscribe_writes_enable_code() {
        let mut transport = connected_mock();
        transport
            .expect_find_characteristic()
            .withf(|service, characteristic| {
                *service == SENSOR_SERVICE_UUID && *characteristic == SENSOR_DATA_UUID
            })
            .returning(|service, characteristic| Ok(CharacteristicRef::new(service, characteristic)));
        transport
            .expect_write_descriptor()
            .withf(|characteristic, data| {
                characteristic.uuid == SENSOR_DATA_UUID && data == &NOTIFICATION_ENABLE[..]
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let reader = PeripheralReader::new(Arc::new(transport));
        let handle = reader.connect(ADDRESS).await.unwrap();
        let characteristic = assert_ok!(
            reader
                .subscribe(&handle, SENSOR_SERVICE_UUID, SENSOR_DATA_UUID)
                .await
        );

        assert_eq!(characteristic.uuid(), SENSOR_DATA_UUID);
        assert_eq!(characteristic.service_uuid(), SENSOR_SERVICE_UUID);
    }

    #[tokio::test]
    async fn test_subscribe_missing_characteristic() {
        let mut transport = connected_mock();
        transport
            .expect_find_characteristic()
            .returning(|_, characteristic| {
                Err(Error::CharacteristicNotFound {
                    uuid: characteristic.to_string(),
                })
            });
        transport.expect_write_descriptor().never();

        let reader = PeripheralReader::new(Arc::new(transport));
        let handle = reader.connect(ADDRESS).await.unwrap();
        let err = assert_err!(
            reader
                .subscribe(&handle, SENSOR_SERVICE_UUID, SENSOR_DATA_UUID)
                .await
        );
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_subscribe_requires_connection() {
        let reader = PeripheralReader::new(Arc::new(MockGattTransport::new()));
        let handle = ConnectionHandle::new(ADDRESS);
        let err = assert_err!(
            reader
                .subscribe(&handle, SENSOR_SERVICE_UUID, SENSOR_DATA_UUID)
                .await
        );
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn test_read_raw_returns_bytes() {
        let mut transport = connected_mock();
        transport
            .expect_read()
            .returning(|_| Ok(vec![0x02, 0x19, 0x03, 0x00, 0x37, 0x02]));

        let reader = PeripheralReader::new(Arc::new(transport));
        reader.connect(ADDRESS).await.unwrap();

        let handle = CharacteristicHandle::new(CharacteristicRef::new(
            SENSOR_SERVICE_UUID,
            SENSOR_DATA_UUID,
        ));
        let data = assert_ok!(reader.read_raw(&handle).await);
        assert_eq!(&data[..], &[0x02, 0x19, 0x03, 0x00, 0x37, 0x02]);
    }

    #[tokio::test]
    async fn test_read_raw_propagates_transport_error() {
        let mut transport = connected_mock();
        transport
            .expect_read()
            .returning(|_| Err(Error::ConnectionLost));

        let reader = PeripheralReader::new(Arc::new(transport));
        reader.connect(ADDRESS).await.unwrap();

        let handle = CharacteristicHandle::new(CharacteristicRef::new(
            BATTERY_SERVICE_UUID,
            BATTERY_LEVEL_UUID,
        ));
        let err = assert_err!(reader.read_raw(&handle).await);
        assert!(matches!(err, Error::ConnectionLost));
    }

    #[tokio::test]
    async fn test_read_raw_times_out() {
        let reader = PeripheralReader::new(Arc::new(StalledTransport))
            .with_read_timeout(Some(Duration::from_millis(20)));
        reader.connect(ADDRESS).await.unwrap();

        let handle = CharacteristicHandle::new(CharacteristicRef::new(
            SENSOR_SERVICE_UUID,
            SENSOR_DATA_UUID,
        ));
        let err = assert_err!(reader.read_raw(&handle).await);
        assert!(matches!(err, Error::Timeout));

        // A timed out read does not drop the connection.
        assert_eq!(reader.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let mut transport = connected_mock();
        transport.expect_disconnect().times(1).returning(|| Ok(()));

        let reader = PeripheralReader::new(Arc::new(transport));
        reader.connect(ADDRESS).await.unwrap();

        assert_ok!(reader.disconnect().await);
        assert_ok!(reader.disconnect().await);
        assert_eq!(reader.state(), ConnectionState::Disconnected);
    }
}
