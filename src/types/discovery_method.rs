//! Bridge discovery methods.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// A way of locating a bridge, run in parallel by the transport.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiscoveryMethod {
    /// UPnP/SSDP broadcast on the local segment
    LocalBroadcast,
    /// The vendor's internet directory of registered bridges
    InternetDirectory,
    /// Probing every address of the local subnet
    IpRangeScan,
}

impl DiscoveryMethod {
    /// Every discovery method, in declaration order.
    pub fn all() -> Vec<DiscoveryMethod> {
        DiscoveryMethod::iter().collect()
    }
}
