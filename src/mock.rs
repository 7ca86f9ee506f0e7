//! Scriptable in-memory transport for unit tests.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::channel::oneshot;

use crate::config::BridgeConfiguration;
use crate::connection::ConnectedBridge;
use crate::discovery::BridgeCandidate;
use crate::errors::TransportError;
use crate::light::Light;
use crate::transport::{BridgeTransport, PairingEvent};
use crate::types::{DeviceColor, DiscoveryMethod};

pub(crate) fn candidate(id: &str, address: &str) -> BridgeCandidate {
    BridgeCandidate::new(id, address.parse().unwrap())
}

pub(crate) fn bridge(id: &str) -> ConnectedBridge {
    ConnectedBridge::new(
        id,
        "192.168.1.2".parse().unwrap(),
        BridgeConfiguration {
            name: Some(format!("Bridge {id}")),
            ..Default::default()
        },
    )
}

enum ScanBehavior {
    Respond(Vec<BridgeCandidate>),
    Fail(TransportError),
    Gated {
        started: oneshot::Sender<()>,
        response: oneshot::Receiver<Vec<BridgeCandidate>>,
    },
    Pending,
}

enum PairBehavior {
    Respond(PairingEvent),
    Gated(oneshot::Receiver<PairingEvent>),
    Pending,
}

pub(crate) struct MockTransport {
    scan: Mutex<ScanBehavior>,
    pair: Mutex<PairBehavior>,
    lights: Mutex<Result<Vec<Light>, TransportError>>,
    failing_lights: Mutex<HashSet<String>>,
    writes: Mutex<Vec<(String, DeviceColor)>>,
    cached: Mutex<Option<ConnectedBridge>>,
    heartbeat_fails: Mutex<bool>,
    scan_calls: AtomicUsize,
    scan_completions: AtomicUsize,
    pair_calls: AtomicUsize,
    heartbeat_starts: AtomicUsize,
    heartbeat_stops: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self {
            scan: Mutex::new(ScanBehavior::Respond(Vec::new())),
            pair: Mutex::new(PairBehavior::Pending),
            lights: Mutex::new(Ok(Vec::new())),
            failing_lights: Mutex::new(HashSet::new()),
            writes: Mutex::new(Vec::new()),
            cached: Mutex::new(None),
            heartbeat_fails: Mutex::new(false),
            scan_calls: AtomicUsize::new(0),
            scan_completions: AtomicUsize::new(0),
            pair_calls: AtomicUsize::new(0),
            heartbeat_starts: AtomicUsize::new(0),
            heartbeat_stops: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_cached_bridge(self, bridge: ConnectedBridge) -> Self {
        *self.cached.lock().unwrap() = Some(bridge);
        self
    }

    pub(crate) fn with_lights(self, lights: &[(&str, bool)]) -> Self {
        *self.lights.lock().unwrap() = Ok(lights
            .iter()
            .map(|(id, on)| Light::new(id, &format!("Light {id}"), *on))
            .collect());
        self
    }

    pub(crate) fn respond_scan(&self, candidates: Vec<BridgeCandidate>) {
        *self.scan.lock().unwrap() = ScanBehavior::Respond(candidates);
    }

    pub(crate) fn fail_scan(&self) {
        *self.scan.lock().unwrap() =
            ScanBehavior::Fail(TransportError::new("scan", "network unreachable"));
    }

    pub(crate) fn hang_scan(&self) {
        *self.scan.lock().unwrap() = ScanBehavior::Pending;
    }

    /// The next scan signals `started` and then waits for the returned sender.
    pub(crate) fn gate_scan(&self) -> (oneshot::Receiver<()>, oneshot::Sender<Vec<BridgeCandidate>>) {
        let (started_tx, started_rx) = oneshot::channel();
        let (response_tx, response_rx) = oneshot::channel();
        *self.scan.lock().unwrap() = ScanBehavior::Gated {
            started: started_tx,
            response: response_rx,
        };
        (started_rx, response_tx)
    }

    pub(crate) fn respond_pair(&self, event: PairingEvent) {
        *self.pair.lock().unwrap() = PairBehavior::Respond(event);
    }

    pub(crate) fn gate_pair(&self) -> oneshot::Sender<PairingEvent> {
        let (tx, rx) = oneshot::channel();
        *self.pair.lock().unwrap() = PairBehavior::Gated(rx);
        tx
    }

    pub(crate) fn fail_light(&self, id: &str) {
        self.failing_lights.lock().unwrap().insert(id.to_string());
    }

    pub(crate) fn fail_list_lights(&self) {
        *self.lights.lock().unwrap() = Err(TransportError::new("list_lights", "bridge busy"));
    }

    pub(crate) fn fail_heartbeat(&self) {
        *self.heartbeat_fails.lock().unwrap() = true;
    }

    pub(crate) fn writes(&self) -> Vec<(String, DeviceColor)> {
        self.writes.lock().unwrap().clone()
    }

    pub(crate) fn written_ids(&self) -> HashSet<String> {
        self.writes().into_iter().map(|(id, _)| id).collect()
    }

    pub(crate) fn scan_calls(&self) -> usize {
        self.scan_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn scan_completions(&self) -> usize {
        self.scan_completions.load(Ordering::SeqCst)
    }

    pub(crate) fn pair_calls(&self) -> usize {
        self.pair_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn heartbeat_starts(&self) -> usize {
        self.heartbeat_starts.load(Ordering::SeqCst)
    }

    pub(crate) fn heartbeat_stops(&self) -> usize {
        self.heartbeat_stops.load(Ordering::SeqCst)
    }
}

impl BridgeTransport for MockTransport {
    async fn scan(
        &self,
        _methods: &[DiscoveryMethod],
    ) -> Result<Vec<BridgeCandidate>, TransportError> {
        self.scan_calls.fetch_add(1, Ordering::SeqCst);
        let behavior = std::mem::replace(&mut *self.scan.lock().unwrap(), ScanBehavior::Pending);
        let result = match behavior {
            ScanBehavior::Respond(candidates) => {
                *self.scan.lock().unwrap() = ScanBehavior::Respond(candidates.clone());
                Ok(candidates)
            }
            ScanBehavior::Fail(e) => Err(e),
            ScanBehavior::Gated { started, response } => {
                let _ = started.send(());
                match response.await {
                    Ok(candidates) => Ok(candidates),
                    Err(_) => futures::future::pending().await,
                }
            }
            ScanBehavior::Pending => futures::future::pending().await,
        };
        self.scan_completions.fetch_add(1, Ordering::SeqCst);
        result
    }

    async fn pair(&self, _candidate: &BridgeCandidate) -> PairingEvent {
        self.pair_calls.fetch_add(1, Ordering::SeqCst);
        let behavior = std::mem::replace(&mut *self.pair.lock().unwrap(), PairBehavior::Pending);
        match behavior {
            PairBehavior::Respond(event) => event,
            PairBehavior::Gated(rx) => match rx.await {
                Ok(event) => event,
                Err(_) => futures::future::pending().await,
            },
            PairBehavior::Pending => futures::future::pending().await,
        }
    }

    fn start_heartbeat(&self) -> Result<(), TransportError> {
        self.heartbeat_starts.fetch_add(1, Ordering::SeqCst);
        if *self.heartbeat_fails.lock().unwrap() {
            return Err(TransportError::new("start_heartbeat", "sdk not started"));
        }
        Ok(())
    }

    fn stop_heartbeat(&self) -> Result<(), TransportError> {
        self.heartbeat_stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_lights(&self) -> Result<Vec<Light>, TransportError> {
        self.lights.lock().unwrap().clone()
    }

    async fn set_light_state(
        &self,
        light_id: &str,
        color: &DeviceColor,
    ) -> Result<(), TransportError> {
        self.writes
            .lock()
            .unwrap()
            .push((light_id.to_string(), *color));
        if self.failing_lights.lock().unwrap().contains(light_id) {
            return Err(TransportError::new("set_light_state", "device unreachable"));
        }
        Ok(())
    }

    fn current_bridge_configuration(&self) -> Option<ConnectedBridge> {
        self.cached.lock().unwrap().clone()
    }
}
