//! minerview dashboard entry point.
//!
//! Wires the websocket transport to the terminal frontend: snapshots
//! flow in over one channel, toggle commands flow out over another
//! through an async forwarder task. The TUI itself runs on a blocking
//! thread.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use minerview::{AppConfig, DashboardTui, UiCommand};
use minerview_ws::{CommandHandle, ConnectionManager};

#[derive(Parser, Debug)]
#[command(name = "minerview", about = "Terminal dashboard for a mining fleet")]
struct Args {
    /// Path to the TOML config file.
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    minerview_core::init_logging();

    let args = Args::parse();
    let config_path = args
        .config
        .or_else(|| std::env::var("MINERVIEW_CONFIG").ok())
        .unwrap_or_else(|| "config/dashboard.toml".to_string());

    let config = AppConfig::load(&config_path)?;
    info!(ws_url = %config.ws_url, "Starting minerview dashboard");

    let (snapshot_tx, snapshot_rx) = mpsc::channel(16);
    let manager = Arc::new(ConnectionManager::new(
        config.connection_config(),
        snapshot_tx,
    ));
    let command_handle = manager.command_handle();

    let connection = manager.clone();
    let connection_task = tokio::spawn(async move {
        if let Err(e) = connection.connect().await {
            error!(error = %e, "Connection loop ended");
        }
    });

    let (command_tx, command_rx) = mpsc::channel(16);
    let forwarder_task = tokio::spawn(forward_commands(command_rx, command_handle));

    let tui = DashboardTui::new(
        snapshot_rx,
        command_tx,
        Duration::from_millis(config.tick_rate_ms),
    );
    tokio::task::spawn_blocking(move || tui.run()).await??;

    info!("Dashboard closed, shutting down");
    manager.shutdown();
    forwarder_task.abort();
    let _ = connection_task.await;

    Ok(())
}

/// Forward UI commands to the transport. Failures are logged, never
/// retried.
async fn forward_commands(mut rx: mpsc::Receiver<UiCommand>, handle: CommandHandle) {
    while let Some(command) = rx.recv().await {
        let result = match &command {
            UiCommand::Pause(ip) => handle.pause(ip).await,
            UiCommand::Light(ip) => handle.light(ip).await,
        };
        if let Err(e) = result {
            warn!(?command, error = %e, "Command not sent");
        }
    }
}
