//! The bridge this process is associated with.

use std::net::IpAddr;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::config::BridgeConfiguration;
use crate::discovery::BridgeCandidate;

/// A bridge the application is authorized to control.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ConnectedBridge {
    pub id: String,
    pub address: IpAddr,
    pub configuration: BridgeConfiguration,
}

impl ConnectedBridge {
    pub fn new(id: &str, address: IpAddr, configuration: BridgeConfiguration) -> Self {
        ConnectedBridge {
            id: id.to_string(),
            address,
            configuration,
        }
    }

    /// Display name of the bridge, falling back to its id.
    pub fn name(&self) -> &str {
        self.configuration.name.as_deref().unwrap_or(&self.id)
    }
}

impl From<&BridgeCandidate> for ConnectedBridge {
    fn from(candidate: &BridgeCandidate) -> Self {
        ConnectedBridge::new(
            &candidate.id,
            candidate.address,
            BridgeConfiguration::default(),
        )
    }
}

/// Holder of the current [`ConnectedBridge`].
///
/// Only pairing writes it. The value is replaced as a whole and readers get a
/// shared handle to an immutable snapshot.
#[derive(Debug, Default)]
pub(crate) struct ConnectionSlot {
    current: RwLock<Option<Arc<ConnectedBridge>>>,
}

impl ConnectionSlot {
    pub(crate) fn new(initial: Option<ConnectedBridge>) -> Self {
        ConnectionSlot {
            current: RwLock::new(initial.map(Arc::new)),
        }
    }

    pub(crate) fn get(&self) -> Option<Arc<ConnectedBridge>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn replace(&self, bridge: ConnectedBridge) -> Arc<ConnectedBridge> {
        let bridge = Arc::new(bridge);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&bridge));
        bridge
    }
}
