//! The capability the coordinator drives.
//!
//! Discovery transports, HTTP framing and the push-link protocol belong to the
//! vendor SDK. Applications wrap it in a [`BridgeTransport`] and hand it to a
//! [`crate::Coordinator`].

use std::future::Future;

use crate::connection::ConnectedBridge;
use crate::discovery::BridgeCandidate;
use crate::errors::TransportError;
use crate::light::Light;
use crate::types::{DeviceColor, DiscoveryMethod};

/// The single event a push-link attempt resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingEvent {
    /// The link button was pressed and the application is authorized
    Authenticated,
    /// The bridge refused the authorization request
    AuthenticationFailed,
    /// The local connection dropped during the handshake
    NoLocalConnection,
    /// No bridge answers at the candidate's address
    NoLocalBridge,
    /// The transport's own window closed before the button was pressed
    ButtonNotPressed,
}

/// Trait for the vendor bridge SDK.
///
/// Every network operation is a future; the coordinator may drop any of them
/// before completion to cancel the operation. Implementations must be cheap to
/// share between tasks.
pub trait BridgeTransport: Send + Sync + 'static {
    /// Scan for bridges with the given methods and return what was found, in
    /// the order the transport saw them.
    fn scan(
        &self,
        methods: &[DiscoveryMethod],
    ) -> impl Future<Output = Result<Vec<BridgeCandidate>, TransportError>> + Send;

    /// Associate the candidate and open the push-link window.
    ///
    /// Resolves with exactly one [`PairingEvent`].
    fn pair(&self, candidate: &BridgeCandidate) -> impl Future<Output = PairingEvent> + Send;

    /// Start periodic polling of the bridge's resources. Fire and forget.
    fn start_heartbeat(&self) -> Result<(), TransportError>;

    /// Stop periodic polling. Fire and forget.
    fn stop_heartbeat(&self) -> Result<(), TransportError>;

    /// Read the full current light set.
    fn list_lights(&self) -> impl Future<Output = Result<Vec<Light>, TransportError>> + Send;

    /// Write a new color to one light.
    fn set_light_state(
        &self,
        light_id: &str,
        color: &DeviceColor,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// The bridge the SDK has cached locally, if any.
    fn current_bridge_configuration(&self) -> Option<ConnectedBridge>;
}
