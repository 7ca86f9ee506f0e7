//! Device-independent application color.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An additive RGB color with alpha, each channel normalized to 0.0-1.0.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Rgba {
    /// Create an opaque color from normalized channels.
    pub fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    pub fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Create an opaque color from 8-bit channels (0-255 each).
    ///
    /// # Examples
    ///
    /// ```
    /// use bridgelink::Rgba;
    ///
    /// let orange = Rgba::from_rgb8(255, 128, 0);
    /// assert_eq!(orange.red, 1.0);
    /// assert_eq!(orange.blue, 0.0);
    /// ```
    pub fn from_rgb8(red: u8, green: u8, blue: u8) -> Self {
        Self::rgb(
            f64::from(red) / 255.0,
            f64::from(green) / 255.0,
            f64::from(blue) / 255.0,
        )
    }

    /// Returns true when every channel is finite and within 0.0-1.0.
    pub fn is_normalized(&self) -> bool {
        [self.red, self.green, self.blue, self.alpha]
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c))
    }
}

impl FromStr for Rgba {
    type Err = String;

    /// Parse from comma-separated 8-bit channels (e.g., "255,128,0").
    fn from_str(s: &str) -> Result<Self, String> {
        let parts = s
            .split(',')
            .map(|c| c.trim().parse::<u8>())
            .collect::<Result<Vec<u8>, _>>()
            .map_err(|e| format!("Expected format: r,g,b ({e})"))?;
        match parts.as_slice() {
            [r, g, b] => Ok(Self::from_rgb8(*r, *g, *b)),
            _ => Err("Expected format: r,g,b".into()),
        }
    }
}
