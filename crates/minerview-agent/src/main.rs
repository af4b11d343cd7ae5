//! minerview agent - entry point.
//!
//! Polls the configured fleet and pushes snapshots to dashboards.

use anyhow::Result;
use clap::Parser;
use tokio::sync::broadcast;
use tracing::info;

use minerview_agent::{run_server, AgentConfig, FleetPoller};

/// Fleet telemetry agent for minerview dashboards
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via MINERVIEW_AGENT_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    minerview_core::init_logging();

    info!("Starting minerview agent v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args
        .config
        .or_else(|| std::env::var("MINERVIEW_AGENT_CONFIG").ok())
        .unwrap_or_else(|| "config/agent.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = AgentConfig::load(&config_path)?;
    info!(
        miners = config.miners.len(),
        poll_interval_secs = config.poll_interval_secs,
        port = config.port,
        "Configuration loaded"
    );

    let (snapshot_tx, _) = broadcast::channel(16);

    let poller = FleetPoller::new(&config, snapshot_tx.clone());
    tokio::spawn(poller.run());

    run_server(snapshot_tx, &config).await?;

    Ok(())
}
