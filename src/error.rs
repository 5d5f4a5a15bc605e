//! Error types for the jinou-ble crate.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// No peripheral with the configured address showed up while scanning.
    #[error("Device not found: {address}")]
    DeviceNotFound {
        /// The address that was searched for.
        address: String,
    },

    /// Failed to establish a connection to the sensor.
    #[error("Connection failed: {reason}")]
    ConnectionFailed {
        /// Description of why the connection failed.
        reason: String,
    },

    /// Operation requires a connection but the sensor is not connected.
    #[error("Sensor not connected")]
    NotConnected,

    /// The connection to the sensor was lost.
    #[error("Connection lost")]
    ConnectionLost,

    /// Service not found on the device.
    #[error("Service not found: {uuid}")]
    ServiceNotFound {
        /// The UUID of the service that was not found.
        uuid: String,
    },

    /// Characteristic not found on the device.
    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID of the characteristic that was not found.
        uuid: String,
    },

    /// The characteristic has no descriptor to enable notifications on.
    #[error("Descriptor not found on characteristic {uuid}")]
    DescriptorNotFound {
        /// The UUID of the characteristic that was searched.
        uuid: String,
    },

    /// Invalid data was received from the sensor.
    #[error("Invalid data received: {context}")]
    InvalidData {
        /// Description of what was invalid about the data.
        context: String,
    },

    /// A characteristic read did not complete within the configured timeout.
    #[error("Characteristic read timed out")]
    Timeout,

    /// A configuration value was rejected.
    #[error("Invalid configuration: {name} = {value}")]
    InvalidConfig {
        /// The name of the configuration field.
        name: String,
        /// The rejected value.
        value: String,
    },

    /// Platform setup failed; no entities were created.
    #[error("Setup failed for {address}: {source}")]
    Setup {
        /// Address of the sensor being set up.
        address: String,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Whether this error means a service, characteristic or descriptor was absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::ServiceNotFound { .. }
            | Self::CharacteristicNotFound { .. }
            | Self::DescriptorNotFound { .. } => true,
            Self::Setup { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Wrap this error as a setup failure for `address`.
    pub(crate) fn into_setup(self, address: &str) -> Self {
        match self {
            setup @ Self::Setup { .. } => setup,
            other => Self::Setup {
                address: address.to_string(),
                source: Box::new(other),
            },
        }
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
