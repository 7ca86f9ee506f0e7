//! Color in the bridge's native numeric ranges.

use serde::{Deserialize, Serialize};

/// A light state color expressed in the bridge's native ranges.
///
/// Each channel is either unset (`None`, the bridge keeps its current value)
/// or within its device bound:
///
/// - hue: 0-65535
/// - saturation: 0-254
/// - brightness: 0-254
#[serde_with::skip_serializing_none]
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "RawDeviceColor")]
pub struct DeviceColor {
    pub(crate) hue: Option<u16>,
    #[serde(rename = "sat")]
    pub(crate) saturation: Option<u8>,
    #[serde(rename = "bri")]
    pub(crate) brightness: Option<u8>,
}

impl DeviceColor {
    pub const MAX_HUE: u16 = 65535;
    pub const MAX_SATURATION: u8 = 254;
    pub const MAX_BRIGHTNESS: u8 = 254;

    /// Create a fully specified color.
    ///
    /// Returns `None` if saturation or brightness exceed 254.
    ///
    /// # Examples
    ///
    /// ```
    /// use bridgelink::DeviceColor;
    ///
    /// assert!(DeviceColor::create(65535, 254, 254).is_some());
    /// assert!(DeviceColor::create(0, 255, 254).is_none());
    /// assert!(DeviceColor::create(0, 254, 255).is_none());
    /// ```
    pub fn create(hue: u16, saturation: u8, brightness: u8) -> Option<Self> {
        if saturation <= Self::MAX_SATURATION && brightness <= Self::MAX_BRIGHTNESS {
            Some(DeviceColor {
                hue: Some(hue),
                saturation: Some(saturation),
                brightness: Some(brightness),
            })
        } else {
            None
        }
    }

    /// A fully saturated, full brightness color with the given hue.
    pub fn vivid(hue: u16) -> Self {
        DeviceColor {
            hue: Some(hue),
            saturation: Some(Self::MAX_SATURATION),
            brightness: Some(Self::MAX_BRIGHTNESS),
        }
    }

    pub fn hue(&self) -> Option<u16> {
        self.hue
    }

    pub fn saturation(&self) -> Option<u8> {
        self.saturation
    }

    pub fn brightness(&self) -> Option<u8> {
        self.brightness
    }
}

/// Unchecked wire form, validated into a [`DeviceColor`].
#[derive(Deserialize)]
struct RawDeviceColor {
    hue: Option<u16>,
    #[serde(rename = "sat")]
    saturation: Option<u8>,
    #[serde(rename = "bri")]
    brightness: Option<u8>,
}

impl TryFrom<RawDeviceColor> for DeviceColor {
    type Error = String;

    fn try_from(raw: RawDeviceColor) -> Result<Self, Self::Error> {
        if raw.saturation.is_some_and(|s| s > Self::MAX_SATURATION) {
            return Err(format!("sat must be at most {}", Self::MAX_SATURATION));
        }
        if raw.brightness.is_some_and(|b| b > Self::MAX_BRIGHTNESS) {
            return Err(format!("bri must be at most {}", Self::MAX_BRIGHTNESS));
        }
        Ok(DeviceColor {
            hue: raw.hue,
            saturation: raw.saturation,
            brightness: raw.brightness,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_serializes_empty() {
        let json = serde_json::to_value(DeviceColor::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_deserialize_checks_bounds() {
        let color: DeviceColor = serde_json::from_str(r#"{"hue": 300, "sat": 254}"#).unwrap();
        assert_eq!(color.hue(), Some(300));
        assert_eq!(color.saturation(), Some(254));
        assert_eq!(color.brightness(), None);

        assert!(serde_json::from_str::<DeviceColor>(r#"{"sat": 255, "bri": 255}"#).is_err());
        assert!(serde_json::from_str::<DeviceColor>(r#"{"bri": 255}"#).is_err());
        assert!(serde_json::from_str::<DeviceColor>(r#"{"hue": 65536}"#).is_err());
    }

    #[test]
    fn test_vivid_uses_bridge_maximums() {
        let color = DeviceColor::vivid(1234);
        assert_eq!(color.hue(), Some(1234));
        assert_eq!(color.saturation(), Some(254));
        assert_eq!(color.brightness(), Some(254));
        let json = serde_json::to_value(color).unwrap();
        assert_eq!(json, serde_json::json!({"hue": 1234, "sat": 254, "bri": 254}));
    }
}
