//! Fleet poller.
//!
//! One sweep per interval: query every miner, assemble a snapshot from
//! whatever answered, and broadcast it to connected dashboards. A miner
//! that fails to answer is logged and left out of that snapshot.

use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use minerview_core::Snapshot;

use crate::bosminer::BosMiner;
use crate::config::AgentConfig;

/// Polls the fleet and broadcasts snapshots.
pub struct FleetPoller {
    miners: Vec<BosMiner>,
    interval: Duration,
    snapshot_tx: broadcast::Sender<Snapshot>,
}

impl FleetPoller {
    /// Build a poller from config. Roster order is snapshot order.
    pub fn new(config: &AgentConfig, snapshot_tx: broadcast::Sender<Snapshot>) -> Self {
        let miners = config
            .miners
            .iter()
            .map(|ip| BosMiner::new(ip.clone(), config.api_port))
            .collect();

        Self {
            miners,
            interval: Duration::from_secs(config.poll_interval_secs),
            snapshot_tx,
        }
    }

    /// Run the poll loop forever.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);

        loop {
            ticker.tick().await;
            let snapshot = self.sweep().await;

            match self.snapshot_tx.send(snapshot) {
                Ok(receivers) => {
                    debug!(receivers, "Snapshot broadcast");
                }
                Err(_) => {
                    // No dashboards connected; normal, keep polling.
                    debug!("No dashboard receivers connected");
                }
            }
        }
    }

    /// One poll sweep over the roster.
    async fn sweep(&self) -> Snapshot {
        let mut snapshot = Snapshot::default();

        for miner in &self.miners {
            match miner.fetch_status().await {
                Ok(status) => snapshot.miners.push(status),
                Err(e) => {
                    warn!(ip = %miner.ip, error = %e, "Miner poll failed, skipping");
                }
            }
        }

        snapshot
    }
}
