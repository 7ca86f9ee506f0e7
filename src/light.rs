//! Light snapshots read from the bridge.

use serde::{Deserialize, Serialize};

/// A read-only view of one light, as reported by the transport.
///
/// # Example
///
/// ```
/// use bridgelink::Light;
///
/// let light = Light::new("1", "Hallway", true);
/// assert!(light.is_on());
/// assert_eq!(light.name(), "Hallway");
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Light {
    id: String,
    name: String,
    #[serde(rename = "on")]
    is_on: bool,
}

impl Light {
    pub fn new(id: &str, name: &str, is_on: bool) -> Self {
        Light {
            id: id.to_string(),
            name: name.to_string(),
            is_on,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }
}
