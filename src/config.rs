//! Coordinator settings and bridge configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};

use crate::errors::Error;
use crate::types::DiscoveryMethod;

type Result<T> = std::result::Result<T, Error>;

/// Configuration document reported by a bridge.
///
/// Every field is optional; transports fill in what the bridge exposes.
#[serde_with::skip_serializing_none]
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfiguration {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub software_version: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
}

/// Settings of a [`crate::Coordinator`].
///
/// Durations are expressed in whole seconds when (de)serialized.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use bridgelink::{CoordinatorConfig, DiscoveryMethod};
///
/// let config = CoordinatorConfig::from_json(
///     r#"{"discovery_timeout": 5, "discovery_methods": ["local_broadcast"]}"#,
/// ).unwrap();
/// assert_eq!(config.pairing_window, Duration::from_secs(30));
/// assert_eq!(config.discovery_timeout, Duration::from_secs(5));
/// assert_eq!(config.discovery_methods, vec![DiscoveryMethod::LocalBroadcast]);
/// ```
#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// How long the user has to press the link button.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub pairing_window: Duration,
    /// Upper bound for a single discovery scan.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub discovery_timeout: Duration,
    /// Methods the transport runs in parallel while scanning.
    pub discovery_methods: Vec<DiscoveryMethod>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            pairing_window: Self::DEFAULT_PAIRING_WINDOW,
            discovery_timeout: Self::DEFAULT_DISCOVERY_TIMEOUT,
            discovery_methods: DiscoveryMethod::all(),
        }
    }
}

impl CoordinatorConfig {
    pub const DEFAULT_PAIRING_WINDOW: Duration = Duration::from_secs(30);
    pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::JsonLoad)
    }

    pub fn with_pairing_window(mut self, window: Duration) -> Self {
        self.pairing_window = window;
        self
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    pub fn with_discovery_methods(mut self, methods: &[DiscoveryMethod]) -> Self {
        self.discovery_methods = methods.to_vec();
        self
    }
}
