//! Platform configuration.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default time allowed for the sensor to show up in a scan.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10);

#[cfg(feature = "serde")]
fn default_scan_timeout() -> Duration {
    DEFAULT_SCAN_TIMEOUT
}

/// Configuration for one Jinou sensor.
///
/// With the `serde` feature this deserializes from the host's platform
/// config; `mac` is accepted as an alias for `address`, and timeouts are
/// given in (possibly fractional) seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorConfig {
    /// Device address (MAC on Linux/Windows, platform id on macOS).
    #[cfg_attr(feature = "serde", serde(alias = "mac"))]
    pub address: String,
    /// Display name for both entities.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    /// How long to scan for the device before giving up.
    #[cfg_attr(
        feature = "serde",
        serde(
            rename = "scan_timeout_secs",
            default = "default_scan_timeout",
            with = "duration_secs"
        )
    )]
    pub scan_timeout: Duration,
    /// Optional bound on each characteristic read.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "read_timeout_secs", default, with = "duration_secs_opt")
    )]
    pub read_timeout: Option<Duration>,
}

impl SensorConfig {
    /// Create a configuration for the device at `address` with an empty name.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: String::new(),
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            read_timeout: None,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the scan timeout.
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Bound each characteristic read. `None` waits indefinitely.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Scan timeout.
    pub fn scan_timeout(&self) -> Duration {
        self.scan_timeout
    }

    /// Read timeout, if any.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    /// Check the configuration before setup.
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(Error::InvalidConfig {
                name: "address".to_string(),
                value: self.address.clone(),
            });
        }

        if self.scan_timeout.is_zero() {
            return Err(Error::InvalidConfig {
                name: "scan_timeout".to_string(),
                value: format!("{:?}", self.scan_timeout),
            });
        }

        if let Some(timeout) = self.read_timeout.filter(Duration::is_zero) {
            return Err(Error::InvalidConfig {
                name: "read_timeout".to_string(),
                value: format!("{:?}", timeout),
            });
        }

        Ok(())
    }

    /// The identity entities are created with.
    pub fn identity(&self) -> SensorIdentity {
        SensorIdentity {
            address: self.address.trim().to_string(),
            name: self.name.clone(),
        }
    }
}

/// Address and display name of a configured sensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorIdentity {
    address: String,
    name: String,
}

impl SensorIdentity {
    /// Device address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(feature = "serde")]
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "serde")]
mod duration_secs_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<f64>::deserialize(deserializer)?
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom))
            .transpose()
    }
}
