//! The outward handle tying discovery, pairing, heartbeat and light commands
//! to one transport.

use std::sync::Arc;

use futures::channel::oneshot;
use log::{debug, info};
use serde_json::json;
use uuid::Uuid;

use crate::config::CoordinatorConfig;
use crate::connection::{ConnectedBridge, ConnectionSlot};
use crate::discovery::{BridgeCandidate, DiscoveryEngine};
use crate::dispatch::{BatchResult, LightDispatcher};
use crate::errors::Error;
use crate::heartbeat::HeartbeatSupervisor;
use crate::pairing::{PairingOutcome, PairingState, PairingStateMachine};
use crate::transport::BridgeTransport;
use crate::types::Rgba;

type Result<T> = std::result::Result<T, Error>;

struct Inner<T> {
    config: CoordinatorConfig,
    connection: Arc<ConnectionSlot>,
    heartbeat: Arc<HeartbeatSupervisor<T>>,
    discovery: DiscoveryEngine<T>,
    pairing: Arc<PairingStateMachine<T>>,
    dispatcher: LightDispatcher<T>,
}

/// Coordinates the connection lifecycle with a single bridge.
///
/// A `Coordinator` is a cheap handle: clones share the same connection,
/// pairing session and heartbeat state, so it can be handed to every part of
/// an application that needs the bridge.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use bridgelink::{Coordinator, CoordinatorConfig, Rgba};
///
/// async fn run(transport: Arc<MyTransport>) -> Result<(), bridgelink::Error> {
///     let coordinator = Coordinator::new(transport, CoordinatorConfig::default());
///     if coordinator.current_connection().is_none() {
///         // Asks the user to press the link button on the bridge
///         coordinator.connect().await?;
///     }
///     coordinator.set_all_lights_color(&Rgba::rgb(1.0, 0.0, 0.0)).await?;
///     Ok(())
/// }
/// ```
pub struct Coordinator<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Coordinator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: BridgeTransport> Coordinator<T> {
    /// Create a coordinator over `transport`.
    ///
    /// A bridge the transport has cached from an earlier run becomes the
    /// current connection. Call [`Coordinator::resume`] to start polling it.
    pub fn new(transport: Arc<T>, config: CoordinatorConfig) -> Self {
        let restored = transport.current_bridge_configuration();
        match &restored {
            Some(bridge) => info!("Restored bridge {} ({})", bridge.id, bridge.name()),
            None => debug!("No cached bridge to restore"),
        }

        let connection = Arc::new(ConnectionSlot::new(restored));
        let heartbeat = Arc::new(HeartbeatSupervisor::new(
            Arc::clone(&transport),
            Arc::clone(&connection),
        ));
        let discovery = DiscoveryEngine::new(Arc::clone(&transport), Arc::clone(&heartbeat));
        let pairing = Arc::new(PairingStateMachine::new(
            Arc::clone(&transport),
            Arc::clone(&connection),
            Arc::clone(&heartbeat),
            config.pairing_window,
        ));
        let dispatcher = LightDispatcher::new(transport);

        Self {
            inner: Arc::new(Inner {
                config,
                connection,
                heartbeat,
                discovery,
                pairing,
                dispatcher,
            }),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Resume polling the current bridge, if there is one.
    ///
    /// Meant for application launch and foreground transitions.
    pub fn resume(&self) {
        self.inner.heartbeat.enable();
    }

    /// Scan for a bridge with the configured methods and timeout.
    ///
    /// See [`DiscoveryEngine::discover`] for the resolution rules.
    pub async fn discover_bridge(&self) -> Result<Option<BridgeCandidate>> {
        let config = &self.inner.config;
        self.inner
            .discovery
            .discover(config.discovery_timeout, &config.discovery_methods)
            .await
    }

    /// Cancel the outstanding scan. Returns false if none was running.
    pub fn cancel_discovery(&self) -> bool {
        self.inner.discovery.cancel()
    }

    pub fn is_discovering(&self) -> bool {
        self.inner.discovery.is_scanning()
    }

    /// Arm a pairing session and report its outcome through `on_result`.
    ///
    /// See [`PairingStateMachine::start`].
    ///
    /// # Panics
    ///
    /// With `runtime-tokio`, panics when called outside a tokio runtime.
    pub fn start_pairing<F>(&self, candidate: BridgeCandidate, on_result: F) -> Result<Uuid>
    where
        F: FnOnce(PairingOutcome) + Send + 'static,
    {
        self.inner.pairing.start(candidate, on_result)
    }

    /// Pair with `candidate` and wait for the outcome.
    ///
    /// Dropping the returned future does not disarm the session; use
    /// [`Coordinator::cancel_pairing`] for that.
    ///
    /// # Errors
    ///
    /// - [`Error::PairingAlreadyInProgress`] if a session is already armed
    /// - [`Error::PairingTimedOut`], [`Error::PairingRejected`],
    ///   [`Error::ConnectionLost`] or [`Error::UnknownBridge`] for the
    ///   terminal outcomes
    /// - [`Error::PairingCancelled`] if the session was canceled
    ///
    /// # Panics
    ///
    /// With `runtime-tokio`, panics when polled outside a tokio runtime.
    pub async fn pair(&self, candidate: BridgeCandidate) -> Result<Arc<ConnectedBridge>> {
        let (tx, rx) = oneshot::channel();
        self.start_pairing(candidate, move |outcome| {
            let _ = tx.send(outcome);
        })?;

        match rx.await {
            Ok(outcome) => outcome.into_result(),
            Err(oneshot::Canceled) => Err(Error::PairingCancelled),
        }
    }

    /// Discover a bridge and pair with it.
    ///
    /// # Errors
    ///
    /// [`Error::NoBridgeFound`] when discovery comes back empty or is
    /// canceled, otherwise the errors of [`Coordinator::discover_bridge`] and
    /// [`Coordinator::pair`].
    pub async fn connect(&self) -> Result<Arc<ConnectedBridge>> {
        let candidate = self
            .discover_bridge()
            .await?
            .ok_or(Error::NoBridgeFound)?;
        self.pair(candidate).await
    }

    /// Abandon the armed pairing session. Returns false if none was armed.
    pub fn cancel_pairing(&self) -> bool {
        self.inner.pairing.cancel()
    }

    pub fn pairing_state(&self) -> PairingState {
        self.inner.pairing.state()
    }

    pub fn enable_heartbeat(&self) {
        self.inner.heartbeat.enable();
    }

    pub fn disable_heartbeat(&self) {
        self.inner.heartbeat.disable();
    }

    pub fn is_heartbeat_enabled(&self) -> bool {
        self.inner.heartbeat.is_enabled()
    }

    /// Give every light that is on a random vivid color.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] without a paired bridge; see
    /// [`LightDispatcher::randomize_all`] for the rest.
    pub async fn randomize_all_lights(&self) -> Result<BatchResult> {
        self.require_connection()?;
        self.inner.dispatcher.randomize_all().await
    }

    /// Set every light that is on to `color`.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] without a paired bridge; see
    /// [`LightDispatcher::set_all`] for the rest.
    pub async fn set_all_lights_color(&self, color: &Rgba) -> Result<BatchResult> {
        self.require_connection()?;
        self.inner.dispatcher.set_all(color).await
    }

    pub fn current_connection(&self) -> Option<Arc<ConnectedBridge>> {
        self.inner.connection.get()
    }

    /// A JSON snapshot of the coordinator's state.
    pub fn diagnostics(&self) -> serde_json::Value {
        let pairing = match self.pairing_state() {
            PairingState::Idle => json!({ "state": "idle" }),
            PairingState::Armed(session) => json!({
                "state": "armed",
                "session": session.id(),
                "bridge": session.bridge(),
                "remaining_secs": session.remaining().as_secs(),
            }),
        };

        json!({
            "connection": self.current_connection().as_deref(),
            "heartbeat_enabled": self.is_heartbeat_enabled(),
            "discovering": self.is_discovering(),
            "pairing": pairing,
            "config": &self.inner.config,
        })
    }

    fn require_connection(&self) -> Result<Arc<ConnectedBridge>> {
        self.inner.connection.get().ok_or(Error::NotConnected)
    }
}
