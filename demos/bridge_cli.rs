//! CLI application driving a coordinator over a simulated bridge.
//!
//! Run with: cargo run --example bridge_cli -- --help

mod sim;

use std::sync::Arc;
use std::time::Duration;

use bridgelink::{Coordinator, CoordinatorConfig, DiscoveryMethod, Rgba};
use clap::{Parser, Subcommand, ValueEnum};
use sim::{LinkButton, SimulatedBridge};

#[derive(Parser)]
#[command(name = "bridge-cli")]
#[command(about = "Drive the bridge coordinator from the command line", long_about = None)]
struct Cli {
    /// Pairing window in seconds
    #[arg(long, global = true, default_value = "30")]
    pairing_window: u64,

    /// Discovery timeout in seconds
    #[arg(long, global = true, default_value = "10")]
    discovery_timeout: u64,

    /// Discovery methods to run (default: all)
    #[arg(long, global = true, value_delimiter = ',')]
    methods: Vec<Method>,

    /// Light ids the simulated bridge cannot reach
    #[arg(long, global = true, value_delimiter = ',')]
    unreachable: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    Broadcast,
    Directory,
    IpScan,
}

impl From<Method> for DiscoveryMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Broadcast => DiscoveryMethod::LocalBroadcast,
            Method::Directory => DiscoveryMethod::InternetDirectory,
            Method::IpScan => DiscoveryMethod::IpRangeScan,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Button {
    Press,
    Refuse,
    Ignore,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for a bridge
    Discover,

    /// Discover a bridge and pair with it
    Connect {
        /// What the simulated user does with the link button
        #[arg(short, long, value_enum, default_value = "press")]
        button: Button,

        /// Seconds before the button is pressed
        #[arg(long, default_value = "3")]
        press_after: u64,
    },

    /// Give every light that is on a random color
    Randomize,

    /// Set every light that is on to an RGB color (0-255 for each component)
    Color {
        /// Comma separated channels, e.g. 255,0,0
        rgb: Rgba,
    },

    /// Print the coordinator's diagnostics
    Diagnostics,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = CoordinatorConfig::default()
        .with_pairing_window(Duration::from_secs(cli.pairing_window))
        .with_discovery_timeout(Duration::from_secs(cli.discovery_timeout));
    if !cli.methods.is_empty() {
        let methods: Vec<DiscoveryMethod> = cli.methods.iter().copied().map(Into::into).collect();
        config = config.with_discovery_methods(&methods);
    }

    let button = match &cli.command {
        Commands::Connect {
            button: Button::Press,
            press_after,
        } => LinkButton::PressedAfter(Duration::from_secs(*press_after)),
        Commands::Connect {
            button: Button::Refuse,
            ..
        } => LinkButton::Refused,
        Commands::Connect {
            button: Button::Ignore,
            ..
        } => LinkButton::Ignored,
        // Light commands run against a bridge paired in an earlier session
        _ => LinkButton::Refused,
    };
    let mut transport = SimulatedBridge::new(button);
    if !matches!(cli.command, Commands::Connect { .. } | Commands::Discover) {
        transport = transport.already_paired();
    }
    for id in &cli.unreachable {
        transport = transport.with_unreachable_light(id);
    }

    let coordinator = Coordinator::new(Arc::new(transport), config);
    coordinator.resume();

    match cli.command {
        Commands::Discover => match coordinator.discover_bridge().await {
            Ok(Some(bridge)) => println!("Found bridge {} at {}", bridge.id, bridge.address),
            Ok(None) => println!("No bridge found on the network."),
            Err(e) => eprintln!("Error during discovery: {}", e),
        },

        Commands::Connect { .. } => {
            println!(
                "Connecting; press the link button within {}s...",
                cli.pairing_window
            );
            match coordinator.connect().await {
                Ok(bridge) => println!("Paired with {} ({})", bridge.name(), bridge.address),
                Err(e) => eprintln!("Error connecting: {}", e),
            }
        }

        Commands::Randomize => {
            let batch = coordinator.randomize_all_lights().await?;
            report(&batch);
        }

        Commands::Color { rgb } => match coordinator.set_all_lights_color(&rgb).await {
            Ok(batch) => report(&batch),
            Err(e) => eprintln!("Error setting color: {}", e),
        },

        Commands::Diagnostics => {
            println!("{}", serde_json::to_string_pretty(&coordinator.diagnostics())?);
        }
    }

    Ok(())
}

fn report(batch: &bridgelink::BatchResult) {
    println!(
        "{} light(s) updated, {} off, {} failed",
        batch.succeeded,
        batch.skipped,
        batch.failed.len()
    );
    for failure in &batch.failed {
        eprintln!("  ✗ light {}: {}", failure.light_id, failure.error);
    }
}
