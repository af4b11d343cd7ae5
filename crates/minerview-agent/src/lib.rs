//! Fleet telemetry agent.
//!
//! Polls each configured miner's local BOSminer API on a fixed
//! interval, assembles a fleet-wide snapshot, and pushes it as a
//! `miner_data` event to every connected dashboard over websocket.
//! Answers `pause` / `light` commands coming back from dashboards.

pub mod bosminer;
pub mod config;
pub mod error;
pub mod poller;
pub mod server;

pub use bosminer::BosMiner;
pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
pub use poller::FleetPoller;
pub use server::run_server;
