//! An in-process bridge used by the demos in place of a vendor SDK.

#![allow(dead_code)]

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bridgelink::{
    BridgeCandidate, BridgeConfiguration, BridgeTransport, ConnectedBridge, DeviceColor,
    DiscoveryMethod, Light, PairingEvent, TransportError, runtime,
};

/// How the simulated user treats the link button.
#[derive(Debug, Clone, Copy)]
pub enum LinkButton {
    PressedAfter(Duration),
    Refused,
    Ignored,
}

pub struct SimulatedBridge {
    id: String,
    address: IpAddr,
    scan_delay: Duration,
    button: LinkButton,
    lights: Vec<Light>,
    unreachable: HashSet<String>,
    paired: Mutex<Option<ConnectedBridge>>,
    polling: AtomicBool,
}

impl SimulatedBridge {
    pub fn new(button: LinkButton) -> Self {
        SimulatedBridge {
            id: "001788fffe4d2a10".to_string(),
            address: IpAddr::from([192, 168, 1, 2]),
            scan_delay: Duration::from_millis(300),
            button,
            lights: vec![
                Light::new("1", "Desk", true),
                Light::new("2", "Hallway", false),
                Light::new("3", "Porch", true),
                Light::new("4", "Kitchen", true),
            ],
            unreachable: HashSet::new(),
            paired: Mutex::new(None),
            polling: AtomicBool::new(false),
        }
    }

    /// Make writes to the given light fail.
    pub fn with_unreachable_light(mut self, id: &str) -> Self {
        self.unreachable.insert(id.to_string());
        self
    }

    /// Start as if a previous run had already paired.
    pub fn already_paired(self) -> Self {
        *self.paired.lock().unwrap_or_else(|e| e.into_inner()) = Some(self.configuration());
        self
    }

    fn configuration(&self) -> ConnectedBridge {
        ConnectedBridge::new(
            &self.id,
            self.address,
            BridgeConfiguration {
                name: Some("Simulated Bridge".to_string()),
                model_id: Some("BSB002".to_string()),
                software_version: Some("1.60.0".to_string()),
                mac: Some("00:17:88:4d:2a:10".to_string()),
            },
        )
    }
}

impl BridgeTransport for SimulatedBridge {
    async fn scan(
        &self,
        methods: &[DiscoveryMethod],
    ) -> Result<Vec<BridgeCandidate>, TransportError> {
        log::debug!("Simulated scan via {:?}", methods);
        runtime::sleep(self.scan_delay).await;
        Ok(vec![BridgeCandidate::new(&self.id, self.address)])
    }

    async fn pair(&self, candidate: &BridgeCandidate) -> PairingEvent {
        if candidate.id != self.id {
            return PairingEvent::NoLocalBridge;
        }
        match self.button {
            LinkButton::PressedAfter(delay) => {
                runtime::sleep(delay).await;
                *self.paired.lock().unwrap_or_else(|e| e.into_inner()) =
                    Some(self.configuration());
                PairingEvent::Authenticated
            }
            LinkButton::Refused => PairingEvent::AuthenticationFailed,
            LinkButton::Ignored => std::future::pending().await,
        }
    }

    fn start_heartbeat(&self) -> Result<(), TransportError> {
        self.polling.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop_heartbeat(&self) -> Result<(), TransportError> {
        self.polling.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn list_lights(&self) -> Result<Vec<Light>, TransportError> {
        Ok(self.lights.clone())
    }

    async fn set_light_state(
        &self,
        light_id: &str,
        color: &DeviceColor,
    ) -> Result<(), TransportError> {
        runtime::sleep(Duration::from_millis(50)).await;
        if self.unreachable.contains(light_id) {
            return Err(TransportError::new("set_light_state", "light not reachable"));
        }
        println!(
            "  light {:>2} <- hue {:>5} sat {:>3} bri {:>3}",
            light_id,
            color.hue().unwrap_or_default(),
            color.saturation().unwrap_or_default(),
            color.brightness().unwrap_or_default()
        );
        Ok(())
    }

    fn current_bridge_configuration(&self) -> Option<ConnectedBridge> {
        self.paired.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
