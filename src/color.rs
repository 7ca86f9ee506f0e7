//! Conversion from application colors to bridge colors.

use crate::errors::Error;
use crate::types::{DeviceColor, Rgba};

type Result<T> = std::result::Result<T, Error>;

/// Convert an application color to the bridge's hue/saturation/brightness ranges.
///
/// The RGB channels are converted to HSB (each normalized to 0.0-1.0), then
/// scaled to the device bounds and rounded. Colors without a defined hue
/// (white, black and every gray) cannot be expressed and are rejected, as are
/// channels outside 0.0-1.0.
///
/// # Examples
///
/// ```
/// use bridgelink::{Rgba, convert};
///
/// let red = convert(&Rgba::rgb(1.0, 0.0, 0.0)).unwrap();
/// assert_eq!(red.hue(), Some(0));
/// assert_eq!(red.saturation(), Some(254));
/// assert_eq!(red.brightness(), Some(254));
///
/// assert!(convert(&Rgba::rgb(0.5, 0.5, 0.5)).is_err());
/// ```
pub fn convert(color: &Rgba) -> Result<DeviceColor> {
    if !color.is_normalized() {
        return Err(Error::UnrepresentableColor);
    }

    let (hue, saturation, brightness) = rgb_to_hsb(color.red, color.green, color.blue)
        .ok_or(Error::UnrepresentableColor)?;

    Ok(DeviceColor {
        hue: Some(scale(hue, f64::from(DeviceColor::MAX_HUE)) as u16),
        saturation: Some(scale(saturation, f64::from(DeviceColor::MAX_SATURATION)) as u8),
        brightness: Some(scale(brightness, f64::from(DeviceColor::MAX_BRIGHTNESS)) as u8),
    })
}

/// HSB with every component in 0.0-1.0; `None` when the hue is undefined.
fn rgb_to_hsb(r: f64, g: f64, b: f64) -> Option<(f64, f64, f64)> {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    if delta <= 0.0 {
        return None;
    }

    let sector = if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    Some((sector / 6.0, delta / max, max))
}

fn scale(value: f64, bound: f64) -> f64 {
    (value * bound).round().clamp(0.0, bound)
}
