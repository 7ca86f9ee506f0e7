//! Push-link pairing.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐  start   ┌───────┐  Authenticated             ┌───────────┐
//! │ Idle │─────────>│ Armed │───────────────────────────>│ Succeeded │
//! └──────┘          └───────┘                            └───────────┘
//!    ^                │  │  AuthenticationFailed /       ┌───────────┐
//!    │     cancel     │  ├─ NoLocalConnection / ────────>│ Failed    │
//!    └────────────────┘  │  NoLocalBridge                └───────────┘
//!                        │  ButtonNotPressed /           ┌───────────┐
//!                        └─ window elapsed ─────────────>│ TimedOut  │
//!                                                        └───────────┘
//! ```
//!
//! Terminal states are reported once through the session's callback, after
//! which the machine is back in `Idle`. A second `start` while `Armed` is
//! rejected with [`Error::PairingAlreadyInProgress`].

use std::fmt;
use std::pin::pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{self, AbortHandle, Abortable, Either};
use log::{debug, info, warn};
use uuid::Uuid;

use crate::connection::{ConnectedBridge, ConnectionSlot};
use crate::discovery::BridgeCandidate;
use crate::errors::Error;
use crate::heartbeat::HeartbeatSupervisor;
use crate::runtime::{self, Instant};
use crate::transport::{BridgeTransport, PairingEvent};

type Result<T> = std::result::Result<T, Error>;

/// Why a pairing attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingFailure {
    /// The bridge refused the authorization; trying again may help
    Rejected,
    /// The local connection dropped during the handshake
    ConnectionLost,
    /// The bridge is not at the candidate address anymore
    UnknownBridge,
}

impl fmt::Display for PairingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingFailure::Rejected => write!(f, "authentication failed"),
            PairingFailure::ConnectionLost => write!(f, "connection lost"),
            PairingFailure::UnknownBridge => write!(f, "bridge unknown"),
        }
    }
}

/// The terminal result of a pairing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingOutcome {
    Succeeded(Arc<ConnectedBridge>),
    Failed(PairingFailure),
    TimedOut,
}

impl PairingOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PairingOutcome::Succeeded(_))
    }

    /// Map the outcome onto the crate's error kinds.
    pub fn into_result(self) -> Result<Arc<ConnectedBridge>> {
        match self {
            PairingOutcome::Succeeded(bridge) => Ok(bridge),
            PairingOutcome::Failed(PairingFailure::Rejected) => {
                Err(Error::PairingRejected(PairingFailure::Rejected.to_string()))
            }
            PairingOutcome::Failed(PairingFailure::ConnectionLost) => Err(Error::ConnectionLost),
            PairingOutcome::Failed(PairingFailure::UnknownBridge) => Err(Error::UnknownBridge),
            PairingOutcome::TimedOut => Err(Error::PairingTimedOut),
        }
    }
}

/// An armed push-link window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingSession {
    id: Uuid,
    bridge: BridgeCandidate,
    deadline: Instant,
}

impl PairingSession {
    fn new(bridge: BridgeCandidate, window: Duration) -> Self {
        PairingSession {
            id: Uuid::new_v4(),
            bridge,
            deadline: Instant::now().saturating_add(window),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn bridge(&self) -> &BridgeCandidate {
        &self.bridge
    }

    /// Time left before the window closes.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_remaining()
    }
}

/// Observable state of the pairing machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingState {
    Idle,
    Armed(PairingSession),
}

struct ArmedSession {
    session: PairingSession,
    abort: AbortHandle,
}

/// Drives the push-link handshake, one session at a time.
pub struct PairingStateMachine<T> {
    transport: Arc<T>,
    connection: Arc<ConnectionSlot>,
    heartbeat: Arc<HeartbeatSupervisor<T>>,
    window: Duration,
    armed: Mutex<Option<ArmedSession>>,
}

impl<T: BridgeTransport> PairingStateMachine<T> {
    pub(crate) fn new(
        transport: Arc<T>,
        connection: Arc<ConnectionSlot>,
        heartbeat: Arc<HeartbeatSupervisor<T>>,
        window: Duration,
    ) -> Self {
        Self {
            transport,
            connection,
            heartbeat,
            window,
            armed: Mutex::new(None),
        }
    }

    pub fn state(&self) -> PairingState {
        match &*self.lock() {
            Some(armed) => PairingState::Armed(armed.session.clone()),
            None => PairingState::Idle,
        }
    }

    /// Arm a push-link window for `candidate`.
    ///
    /// `on_result` runs exactly once with the terminal outcome, unless the
    /// session is canceled first, in which case it is dropped without being
    /// called. The outcome task runs on the selected runtime.
    ///
    /// # Errors
    ///
    /// [`Error::PairingAlreadyInProgress`] if a session is already armed.
    ///
    /// # Panics
    ///
    /// With `runtime-tokio`, panics when called outside a tokio runtime.
    pub fn start<F>(self: &Arc<Self>, candidate: BridgeCandidate, on_result: F) -> Result<Uuid>
    where
        F: FnOnce(PairingOutcome) + Send + 'static,
    {
        let (abort, registration) = AbortHandle::new_pair();
        let session = {
            let mut armed = self.lock();
            if let Some(current) = &*armed {
                return Err(Error::pairing_in_progress(&current.session.bridge.id));
            }
            let session = PairingSession::new(candidate, self.window);
            *armed = Some(ArmedSession {
                session: session.clone(),
                abort,
            });
            session
        };

        info!(
            "Pairing armed for bridge {} at {}; press the link button within {:?}",
            session.bridge.id, session.bridge.address, self.window
        );

        let machine = Arc::clone(self);
        let session_id = session.id;
        runtime::spawn_detached(async move {
            let event = Abortable::new(machine.wait_for_event(&session), registration).await;
            let Ok(event) = event else {
                debug!("Pairing session {} aborted", session.id);
                return;
            };
            if let Some(outcome) = machine.resolve(&session, event) {
                on_result(outcome);
            }
        });

        Ok(session_id)
    }

    /// Abandon the armed session without reporting an outcome.
    ///
    /// Returns false when no session is armed.
    pub fn cancel(&self) -> bool {
        let Some(armed) = self.lock().take() else {
            return false;
        };
        armed.abort.abort();
        info!("Pairing with bridge {} canceled", armed.session.bridge.id);
        true
    }

    /// The transport's event, or `None` once the window elapsed.
    async fn wait_for_event(&self, session: &PairingSession) -> Option<PairingEvent> {
        let event = pin!(self.transport.pair(&session.bridge));
        let deadline = pin!(runtime::sleep(session.remaining()));
        match future::select(event, deadline).await {
            Either::Left((event, _)) => Some(event),
            Either::Right(_) => None,
        }
    }

    /// Leave `Armed` for `session` and compute its outcome.
    ///
    /// Returns `None` when the session is no longer the armed one.
    fn resolve(&self, session: &PairingSession, event: Option<PairingEvent>) -> Option<PairingOutcome> {
        let mut armed = self.lock();
        if armed.as_ref().map(|a| a.session.id) != Some(session.id) {
            debug!("Ignoring {:?} for stale pairing session {}", event, session.id);
            return None;
        }

        let outcome = match event {
            Some(PairingEvent::Authenticated) => {
                let bridge = self
                    .transport
                    .current_bridge_configuration()
                    .filter(|cached| cached.id == session.bridge.id)
                    .unwrap_or_else(|| ConnectedBridge::from(&session.bridge));
                PairingOutcome::Succeeded(self.connection.replace(bridge))
            }
            Some(PairingEvent::AuthenticationFailed) => PairingOutcome::Failed(PairingFailure::Rejected),
            Some(PairingEvent::NoLocalConnection) => {
                PairingOutcome::Failed(PairingFailure::ConnectionLost)
            }
            Some(PairingEvent::NoLocalBridge) => PairingOutcome::Failed(PairingFailure::UnknownBridge),
            Some(PairingEvent::ButtonNotPressed) | None => PairingOutcome::TimedOut,
        };
        *armed = None;
        drop(armed);

        match &outcome {
            PairingOutcome::Succeeded(bridge) => {
                info!("Paired with bridge {} ({})", bridge.id, bridge.name());
                self.heartbeat.enable();
            }
            PairingOutcome::Failed(reason) => {
                warn!("Pairing with bridge {} failed: {}", session.bridge.id, reason)
            }
            PairingOutcome::TimedOut => {
                warn!("Pairing with bridge {} timed out", session.bridge.id)
            }
        }
        Some(outcome)
    }

    fn lock(&self) -> MutexGuard<'_, Option<ArmedSession>> {
        self.armed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(all(test, feature = "runtime-tokio"))]
mod tests {
    use super::*;
    use crate::mock::{MockTransport, bridge, candidate};
    use futures::channel::oneshot;

    const WINDOW: Duration = Duration::from_secs(30);

    fn machine(transport: &Arc<MockTransport>) -> Arc<PairingStateMachine<MockTransport>> {
        machine_with_window(transport, WINDOW)
    }

    fn machine_with_window(
        transport: &Arc<MockTransport>,
        window: Duration,
    ) -> Arc<PairingStateMachine<MockTransport>> {
        let slot = Arc::new(ConnectionSlot::new(None));
        let heartbeat = Arc::new(HeartbeatSupervisor::new(
            Arc::clone(transport),
            Arc::clone(&slot),
        ));
        Arc::new(PairingStateMachine::new(
            Arc::clone(transport),
            slot,
            heartbeat,
            window,
        ))
    }

    fn start(
        machine: &Arc<PairingStateMachine<MockTransport>>,
    ) -> oneshot::Receiver<PairingOutcome> {
        let (tx, rx) = oneshot::channel();
        machine
            .start(candidate("001788fffe123456", "192.168.1.2"), move |outcome| {
                let _ = tx.send(outcome);
            })
            .unwrap();
        rx
    }

    #[tokio::test]
    async fn test_authenticated_connects_and_starts_heartbeat() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_pair(PairingEvent::Authenticated);
        let machine = machine(&transport);

        let outcome = start(&machine).await.unwrap();

        let PairingOutcome::Succeeded(bridge) = outcome else {
            panic!("expected success, got {outcome:?}");
        };
        assert_eq!(bridge.id, "001788fffe123456");
        assert_eq!(machine.connection.get(), Some(bridge));
        assert!(machine.heartbeat.is_enabled());
        assert_eq!(machine.state(), PairingState::Idle);
    }

    #[tokio::test]
    async fn test_success_prefers_cached_configuration() {
        let transport = Arc::new(MockTransport::new().with_cached_bridge(bridge("001788fffe123456")));
        transport.respond_pair(PairingEvent::Authenticated);
        let machine = machine(&transport);

        let bridge = start(&machine).await.unwrap().into_result().unwrap();

        assert_eq!(bridge.name(), "Bridge 001788fffe123456");
    }

    #[tokio::test]
    async fn test_failure_reasons_are_distinct() {
        for (event, expected) in [
            (PairingEvent::AuthenticationFailed, PairingFailure::Rejected),
            (PairingEvent::NoLocalConnection, PairingFailure::ConnectionLost),
            (PairingEvent::NoLocalBridge, PairingFailure::UnknownBridge),
        ] {
            let transport = Arc::new(MockTransport::new());
            transport.respond_pair(event);
            let machine = machine(&transport);

            let outcome = start(&machine).await.unwrap();

            assert_eq!(outcome, PairingOutcome::Failed(expected));
            assert_eq!(machine.state(), PairingState::Idle);
            assert!(machine.connection.get().is_none());
            assert_eq!(transport.heartbeat_starts(), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_button_not_pressed_times_out_early() {
        let transport = Arc::new(MockTransport::new());
        let respond = transport.gate_pair();
        let machine = machine(&transport);
        let started = Instant::now();

        let rx = start(&machine);
        runtime::sleep(Duration::from_secs(5)).await;
        respond.send(PairingEvent::ButtonNotPressed).unwrap();

        assert_eq!(rx.await.unwrap(), PairingOutcome::TimedOut);
        assert!(started.elapsed() < WINDOW);
        assert!(machine.connection.get().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_without_event_times_out() {
        let transport = Arc::new(MockTransport::new());
        let machine = machine(&transport);
        let started = Instant::now();

        let outcome = start(&machine).await.unwrap();

        assert_eq!(outcome, PairingOutcome::TimedOut);
        assert!(started.elapsed() >= WINDOW);
        assert_eq!(machine.state(), PairingState::Idle);
        assert_eq!(outcome.into_result(), Err(Error::PairingTimedOut));
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_window_waits_for_event() {
        let transport = Arc::new(MockTransport::new());
        let respond = transport.gate_pair();
        let machine = machine_with_window(&transport, Duration::MAX);

        let rx = start(&machine);
        let PairingState::Armed(session) = machine.state() else {
            panic!("expected an armed session");
        };
        assert!(session.remaining() > WINDOW);

        runtime::sleep(Duration::from_secs(1)).await;
        respond.send(PairingEvent::Authenticated).unwrap();

        assert!(rx.await.unwrap().is_success());
    }

    #[tokio::test]
    async fn test_second_start_is_rejected() {
        let transport = Arc::new(MockTransport::new());
        let respond = transport.gate_pair();
        let machine = machine(&transport);

        let rx = start(&machine);
        let PairingState::Armed(session) = machine.state() else {
            panic!("expected an armed session");
        };

        let second = machine.start(candidate("other", "192.168.1.3"), |_| {
            panic!("rejected session must not report");
        });
        assert_eq!(
            second,
            Err(Error::pairing_in_progress("001788fffe123456"))
        );
        assert_eq!(machine.state(), PairingState::Armed(session));

        respond.send(PairingEvent::Authenticated).unwrap();
        assert!(rx.await.unwrap().is_success());
        assert_eq!(transport.pair_calls(), 1);
    }

    #[tokio::test]
    async fn test_cancel_never_reports() {
        let transport = Arc::new(MockTransport::new());
        let respond = transport.gate_pair();
        let machine = machine(&transport);

        let rx = start(&machine);
        tokio::task::yield_now().await;
        assert!(machine.cancel());
        let _ = respond.send(PairingEvent::Authenticated);

        // The callback is dropped unused, closing the channel.
        assert!(rx.await.is_err());
        assert_eq!(machine.state(), PairingState::Idle);
        assert!(machine.connection.get().is_none());
        assert!(!machine.cancel());
    }

    #[tokio::test]
    async fn test_restart_after_terminal_outcome() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_pair(PairingEvent::AuthenticationFailed);
        let machine = machine(&transport);

        assert!(!start(&machine).await.unwrap().is_success());

        transport.respond_pair(PairingEvent::Authenticated);
        assert!(start(&machine).await.unwrap().is_success());
    }

    #[test]
    fn test_outcome_error_mapping() {
        assert_eq!(
            PairingOutcome::Failed(PairingFailure::Rejected).into_result(),
            Err(Error::PairingRejected("authentication failed".into()))
        );
        assert_eq!(
            PairingOutcome::Failed(PairingFailure::ConnectionLost).into_result(),
            Err(Error::ConnectionLost)
        );
        assert_eq!(
            PairingOutcome::Failed(PairingFailure::UnknownBridge).into_result(),
            Err(Error::UnknownBridge)
        );
    }
}
