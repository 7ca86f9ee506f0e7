//! # bridgelink
//!
//! An async Rust library that coordinates the connection lifecycle with a local
//! smart-lighting bridge.
//!
//! The crate does not speak the bridge's wire protocol. Applications wrap the
//! vendor SDK in a [`BridgeTransport`] and hand it to a [`Coordinator`], which
//! drives discovery, push-link pairing, heartbeat polling and batched light
//! color changes on top of it.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use bridgelink::{Coordinator, CoordinatorConfig, Rgba};
//!
//! async fn run(transport: Arc<MyTransport>) -> Result<(), bridgelink::Error> {
//!     let coordinator = Coordinator::new(transport, CoordinatorConfig::default());
//!     coordinator.resume();
//!
//!     if coordinator.current_connection().is_none() {
//!         // Press the link button on the bridge within 30 seconds
//!         coordinator.connect().await?;
//!     }
//!
//!     let batch = coordinator
//!         .set_all_lights_color(&Rgba::rgb(0.0, 0.0, 1.0))
//!         .await?;
//!     for error in batch.errors() {
//!         eprintln!("{error}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Runtime Agnostic**: Works with tokio, async-std, or smol async runtimes
//! - **Discovery**: Bounded, cancellable bridge scans with [`DiscoveryEngine`]
//! - **Pairing**: A push-link window with a hard deadline, see [`PairingStateMachine`]
//! - **Heartbeat**: Idempotent polling control with [`HeartbeatSupervisor`]
//! - **Light Batches**: Per-light failure isolation with [`LightDispatcher`]
//! - **Colors**: Application [`Rgba`] colors mapped onto [`DeviceColor`] by [`convert`]
//!
//! ## Logging
//!
//! Everything is logged through the [`log`] facade. Install any logger (for
//! example `env_logger`) to see discovery, pairing and heartbeat transitions.
//!
//! ## Feature Flags
//!
//! - `runtime-tokio` (default): Use the tokio async runtime
//! - `runtime-async-std`: Use the async-std runtime
//! - `runtime-smol`: Use the smol runtime

mod color;
mod config;
mod connection;
mod coordinator;
mod discovery;
mod dispatch;
mod errors;
mod heartbeat;
mod light;
#[cfg(test)]
mod mock;
mod pairing;
pub mod runtime;
mod transport;
mod types;

// Re-export public API
pub use color::convert;
pub use config::{BridgeConfiguration, CoordinatorConfig};
pub use connection::ConnectedBridge;
pub use coordinator::Coordinator;
pub use discovery::{BridgeCandidate, DiscoveryEngine};
pub use dispatch::{BatchResult, LightDispatcher, LightFailure};
pub use errors::{Error, TransportError};
pub use heartbeat::HeartbeatSupervisor;
pub use light::Light;
pub use pairing::{PairingFailure, PairingOutcome, PairingSession, PairingState, PairingStateMachine};
pub use transport::{BridgeTransport, PairingEvent};
pub use types::{DeviceColor, DiscoveryMethod, Rgba};
