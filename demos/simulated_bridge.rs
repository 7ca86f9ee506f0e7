//! Walk through the whole connection lifecycle against a simulated bridge.
//!
//! This example demonstrates:
//! - Discovering a bridge and pairing with it through the link button
//! - Randomizing and setting the color of every light that is on
//! - Reading the coordinator's diagnostics
//!
//! Run with: RUST_LOG=debug cargo run --example simulated_bridge

mod sim;

use std::sync::Arc;
use std::time::Duration;

use bridgelink::{Coordinator, CoordinatorConfig, Rgba};
use sim::{LinkButton, SimulatedBridge};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let transport = Arc::new(
        SimulatedBridge::new(LinkButton::PressedAfter(Duration::from_secs(2)))
            .with_unreachable_light("4"),
    );
    let config = CoordinatorConfig::default().with_pairing_window(Duration::from_secs(10));
    let coordinator = Coordinator::new(transport, config);

    println!("Looking for a bridge...");
    let Some(candidate) = coordinator.discover_bridge().await? else {
        println!("No bridge found.");
        return Ok(());
    };
    println!("Found bridge {} at {}", candidate.id, candidate.address);

    println!("Press the link button on the bridge...");
    let bridge = coordinator.pair(candidate).await?;
    println!("Paired with {}", bridge.name());

    println!("\nRandomizing lights:");
    let batch = coordinator.randomize_all_lights().await?;
    for error in batch.errors() {
        eprintln!("  ✗ {}", error);
    }

    println!("\nSetting lights to orange:");
    let batch = coordinator
        .set_all_lights_color(&Rgba::from_rgb8(255, 128, 0))
        .await?;
    println!(
        "  {} succeeded, {} failed, {} off",
        batch.succeeded,
        batch.failed.len(),
        batch.skipped
    );

    println!("\nDiagnostics:");
    println!("{}", serde_json::to_string_pretty(&coordinator.diagnostics())?);

    coordinator.disable_heartbeat();
    Ok(())
}
