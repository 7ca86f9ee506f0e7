//! Bridge discovery.

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::{AbortHandle, Abortable};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::heartbeat::HeartbeatSupervisor;
use crate::runtime;
use crate::transport::BridgeTransport;
use crate::types::DiscoveryMethod;

type Result<T> = std::result::Result<T, Error>;

/// A bridge found on the network that has not been paired yet.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BridgeCandidate {
    /// Identifier assigned by the bridge
    pub id: String,
    /// Address the bridge answered from
    pub address: IpAddr,
}

impl BridgeCandidate {
    pub fn new(id: &str, address: IpAddr) -> Self {
        BridgeCandidate {
            id: id.to_string(),
            address,
        }
    }
}

#[derive(Debug)]
struct ActiveScan {
    generation: u64,
    abort: AbortHandle,
}

#[derive(Debug, Default)]
struct ScanSlot {
    generation: u64,
    active: Option<ActiveScan>,
}

impl ScanSlot {
    /// Clear the active scan if it is still the one identified by `generation`.
    fn release(&mut self, generation: u64) -> bool {
        match &self.active {
            Some(active) if active.generation == generation => {
                self.active = None;
                true
            }
            _ => false,
        }
    }
}

/// Frees the scan slot when a `discover` future finishes or is dropped.
struct ScanGuard<'a> {
    slot: &'a Mutex<ScanSlot>,
    generation: u64,
}

impl ScanGuard<'_> {
    /// Returns false if the scan was canceled in the meantime.
    fn finish(self) -> bool {
        let released = lock(self.slot).release(self.generation);
        std::mem::forget(self);
        released
    }
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        lock(self.slot).release(self.generation);
    }
}

fn lock(slot: &Mutex<ScanSlot>) -> std::sync::MutexGuard<'_, ScanSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs one bounded, cancellable scan at a time over the transport.
pub struct DiscoveryEngine<T> {
    transport: Arc<T>,
    heartbeat: Arc<HeartbeatSupervisor<T>>,
    slot: Mutex<ScanSlot>,
}

impl<T: BridgeTransport> DiscoveryEngine<T> {
    pub(crate) fn new(transport: Arc<T>, heartbeat: Arc<HeartbeatSupervisor<T>>) -> Self {
        Self {
            transport,
            heartbeat,
            slot: Mutex::new(ScanSlot::default()),
        }
    }

    /// Returns true while a scan is outstanding.
    pub fn is_scanning(&self) -> bool {
        lock(&self.slot).active.is_some()
    }

    /// Scan the network and return the first bridge found.
    ///
    /// The heartbeat is disabled and kept off until the scan ends. When several
    /// bridges answer, the first one in transport order is returned; this is a
    /// simplification, not a quality ranking.
    ///
    /// Resolves to `Ok(None)` when nothing was found or when the scan was
    /// canceled with [`DiscoveryEngine::cancel`].
    ///
    /// # Errors
    ///
    /// - [`Error::DiscoveryInProgress`] if another scan is outstanding
    /// - [`Error::DiscoveryTimeout`] if the transport did not answer in time
    /// - [`Error::Transport`] if the scan itself failed
    pub async fn discover(
        &self,
        timeout: Duration,
        methods: &[DiscoveryMethod],
    ) -> Result<Option<BridgeCandidate>> {
        if methods.is_empty() {
            warn!("Discovery requested without any method");
            return Ok(None);
        }

        let (abort, registration) = AbortHandle::new_pair();
        let guard = {
            let mut slot = lock(&self.slot);
            if slot.active.is_some() {
                return Err(Error::DiscoveryInProgress);
            }
            slot.generation += 1;
            slot.active = Some(ActiveScan {
                generation: slot.generation,
                abort,
            });
            ScanGuard {
                slot: &self.slot,
                generation: slot.generation,
            }
        };

        let _hold = self.heartbeat.hold();
        debug!("Scanning for bridges with {:?}", methods);

        let scan = Abortable::new(
            runtime::timeout(timeout, self.transport.scan(methods)),
            registration,
        )
        .await;

        if !guard.finish() {
            debug!("Discarding result of a canceled scan");
            return Ok(None);
        }

        match scan {
            Err(_aborted) => Ok(None),
            Ok(Err(_timed_out)) => {
                warn!("Bridge discovery timed out after {:?}", timeout);
                Err(Error::DiscoveryTimeout)
            }
            Ok(Ok(Err(e))) => {
                warn!("Bridge discovery failed: {}", e);
                Err(Error::Transport(e))
            }
            Ok(Ok(Ok(candidates))) => {
                let candidates = dedup_candidates(candidates);
                info!("{} bridge(s) found: {:?}", candidates.len(), candidates);
                Ok(candidates.into_iter().next())
            }
        }
    }

    /// Cancel the outstanding scan, if any.
    ///
    /// The canceled `discover` call resolves to `Ok(None)`. Returns true if a
    /// scan was canceled.
    pub fn cancel(&self) -> bool {
        let Some(active) = lock(&self.slot).active.take() else {
            return false;
        };
        active.abort.abort();
        info!("Bridge discovery canceled");
        true
    }
}

/// Drop candidates without an id and keep the first occurrence of each id.
fn dedup_candidates(candidates: Vec<BridgeCandidate>) -> Vec<BridgeCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| !c.id.is_empty() && seen.insert(c.id.clone()))
        .collect()
}
