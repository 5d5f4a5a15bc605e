//! GATT transport abstraction.
//!
//! Everything above this trait talks to the sensor through the handful of
//! GATT primitives it needs, so the radio can be swapped for a mock in tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;

/// A resolved characteristic, identified by its service and its own UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharacteristicRef {
    /// UUID of the owning service.
    pub service_uuid: Uuid,
    /// UUID of the characteristic.
    pub uuid: Uuid,
}

impl CharacteristicRef {
    /// Create a new characteristic reference.
    pub fn new(service_uuid: Uuid, uuid: Uuid) -> Self {
        Self { service_uuid, uuid }
    }
}

impl std::fmt::Display for CharacteristicRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.service_uuid, self.uuid)
    }
}

/// The GATT primitives the sensor integration relies on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GattTransport: Send + Sync {
    /// Open a connection to the device at `address` and discover its services.
    async fn connect(&self, address: &str) -> Result<()>;

    /// Resolve a characteristic by service and characteristic UUID.
    async fn find_characteristic(&self, service: Uuid, characteristic: Uuid)
        -> Result<CharacteristicRef>;

    /// Write `data` to the configuration descriptor of `characteristic`.
    async fn write_descriptor(&self, characteristic: CharacteristicRef, data: &[u8]) -> Result<()>;

    /// Read the current value of `characteristic`.
    async fn read(&self, characteristic: CharacteristicRef) -> Result<Vec<u8>>;

    /// Close the connection.
    async fn disconnect(&self) -> Result<()>;
}
