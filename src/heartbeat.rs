//! Local connection heartbeat.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use crate::connection::ConnectionSlot;
use crate::transport::BridgeTransport;

#[derive(Debug, Default)]
struct State {
    enabled: bool,
    /// Outstanding scans; polling stays off while non-zero
    holds: usize,
}

/// Starts and stops the transport's periodic polling of the bridge.
///
/// Both operations are idempotent and never fail outward, so they can be wired
/// straight to application foreground/background transitions.
pub struct HeartbeatSupervisor<T> {
    transport: Arc<T>,
    connection: Arc<ConnectionSlot>,
    state: Mutex<State>,
}

/// Keeps polling off until dropped.
pub(crate) struct HeartbeatHold<'a, T> {
    supervisor: &'a HeartbeatSupervisor<T>,
}

impl<T> Drop for HeartbeatHold<'_, T> {
    fn drop(&mut self) {
        let mut state = self
            .supervisor
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        state.holds = state.holds.saturating_sub(1);
    }
}

impl<T: BridgeTransport> HeartbeatSupervisor<T> {
    pub(crate) fn new(transport: Arc<T>, connection: Arc<ConnectionSlot>) -> Self {
        Self {
            transport,
            connection,
            state: Mutex::new(State::default()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// Start polling if a bridge is connected and polling is not already running.
    ///
    /// Does nothing while a discovery scan is outstanding.
    pub fn enable(&self) {
        let mut state = self.lock();
        if state.enabled {
            return;
        }
        if state.holds > 0 {
            debug!("Heartbeat not enabled: discovery in progress");
            return;
        }

        let Some(bridge) = self.connection.get() else {
            debug!("Heartbeat not enabled: no connected bridge");
            return;
        };

        match self.transport.start_heartbeat() {
            Ok(()) => {
                state.enabled = true;
                info!("Heartbeat enabled for bridge {}", bridge.id);
            }
            Err(e) => warn!("Failed to enable heartbeat: {}", e),
        }
    }

    /// Stop polling.
    pub fn disable(&self) {
        let mut state = self.lock();
        self.stop(&mut state);
    }

    /// Stop polling and block [`HeartbeatSupervisor::enable`] until the
    /// returned hold is dropped.
    pub(crate) fn hold(&self) -> HeartbeatHold<'_, T> {
        let mut state = self.lock();
        state.holds += 1;
        self.stop(&mut state);
        HeartbeatHold { supervisor: self }
    }

    fn stop(&self, state: &mut State) {
        if let Err(e) = self.transport.stop_heartbeat() {
            warn!("Failed to disable heartbeat: {}", e);
        }
        if state.enabled {
            info!("Heartbeat disabled");
        }
        state.enabled = false;
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockTransport, bridge};

    fn supervisor(transport: &Arc<MockTransport>, connected: bool) -> HeartbeatSupervisor<MockTransport> {
        let slot = ConnectionSlot::new(connected.then(|| bridge("abc")));
        HeartbeatSupervisor::new(Arc::clone(transport), Arc::new(slot))
    }

    #[test]
    fn test_enable_without_bridge_is_noop() {
        let transport = Arc::new(MockTransport::new());
        let heartbeat = supervisor(&transport, false);

        heartbeat.enable();

        assert_eq!(transport.heartbeat_starts(), 0);
        assert!(!heartbeat.is_enabled());
    }

    #[test]
    fn test_enable_twice_equals_once() {
        let transport = Arc::new(MockTransport::new());
        let heartbeat = supervisor(&transport, true);

        heartbeat.enable();
        heartbeat.enable();

        assert_eq!(transport.heartbeat_starts(), 1);
        assert!(heartbeat.is_enabled());
    }

    #[test]
    fn test_disable_is_safe_when_disabled() {
        let transport = Arc::new(MockTransport::new());
        let heartbeat = supervisor(&transport, true);

        heartbeat.disable();
        heartbeat.disable();
        assert!(!heartbeat.is_enabled());

        heartbeat.enable();
        heartbeat.disable();
        assert!(!heartbeat.is_enabled());
        assert_eq!(transport.heartbeat_starts(), 1);
        assert_eq!(transport.heartbeat_stops(), 3);
    }

    #[test]
    fn test_failed_start_is_swallowed() {
        let transport = Arc::new(MockTransport::new());
        transport.fail_heartbeat();
        let heartbeat = supervisor(&transport, true);

        heartbeat.enable();

        assert!(!heartbeat.is_enabled());
        assert_eq!(transport.heartbeat_starts(), 1);
    }

    #[test]
    fn test_hold_blocks_enable_until_dropped() {
        let transport = Arc::new(MockTransport::new());
        let heartbeat = supervisor(&transport, true);
        heartbeat.enable();

        let hold = heartbeat.hold();
        assert!(!heartbeat.is_enabled());
        heartbeat.enable();
        assert!(!heartbeat.is_enabled());
        assert_eq!(transport.heartbeat_starts(), 1);

        drop(hold);
        heartbeat.enable();
        assert!(heartbeat.is_enabled());
        assert_eq!(transport.heartbeat_starts(), 2);
    }
}
