use std::fmt;

use serde::{Deserialize, Serialize};

/// A failure reported by a [`crate::BridgeTransport`] implementation.
///
/// The transport owns the wire protocol, so the coordinator only keeps the
/// action that failed and a human readable cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("transport {action} error: {message}")]
pub struct TransportError {
    pub action: String,
    pub message: String,
}

impl TransportError {
    /// Create a new transport error for the given action.
    pub fn new(action: &str, message: impl fmt::Display) -> Self {
        TransportError {
            action: action.to_string(),
            message: message.to_string(),
        }
    }
}

/// All error types that can occur while coordinating a bridge connection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport scan did not resolve within the discovery timeout.
    #[error("bridge discovery timed out")]
    DiscoveryTimeout,

    /// A scan is already outstanding; it must be canceled first.
    #[error("bridge discovery already in progress")]
    DiscoveryInProgress,

    /// Discovery completed without finding any bridge.
    #[error("no bridge found on the local network")]
    NoBridgeFound,

    /// The link button was not pressed within the pairing window.
    #[error("pairing timed out; the link button was not pressed")]
    PairingTimedOut,

    /// The bridge refused to authorize this application.
    #[error("pairing rejected: {0}")]
    PairingRejected(String),

    /// A pairing session is already armed.
    #[error("pairing already in progress with bridge {bridge_id}")]
    PairingAlreadyInProgress { bridge_id: String },

    /// The pairing session was canceled before an outcome was reached.
    #[error("pairing canceled")]
    PairingCancelled,

    /// The local connection to the bridge was lost.
    #[error("lost the local connection to the bridge")]
    ConnectionLost,

    /// The bridge is no longer known at the given address.
    #[error("bridge is unknown at its last address")]
    UnknownBridge,

    /// The color has no defined hue (or is outside the normalized range).
    #[error("color cannot be represented on the bridge")]
    UnrepresentableColor,

    /// A single light rejected its state write.
    #[error("failed to update light {light_id}: {cause}")]
    LightWriteFailed {
        light_id: String,
        cause: TransportError,
    },

    /// The operation needs a paired bridge and none is set.
    #[error("not connected to a bridge")]
    NotConnected,

    /// Any other transport failure (scan, light listing).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Failed to deserialize JSON data.
    #[error("failed to load json: {0:?}")]
    JsonLoad(serde_json::Error),
}

impl Error {
    /// Create a new light write error
    pub fn light_write_failed(light_id: &str, cause: TransportError) -> Self {
        Error::LightWriteFailed {
            light_id: light_id.to_string(),
            cause,
        }
    }

    /// Create a new pairing already in progress error
    pub fn pairing_in_progress(bridge_id: &str) -> Self {
        Error::PairingAlreadyInProgress {
            bridge_id: bridge_id.to_string(),
        }
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
