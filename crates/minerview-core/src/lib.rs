//! Core domain types for the minerview fleet dashboard.
//!
//! This crate provides the types shared by the transport, renderer and
//! agent crates:
//! - `Snapshot`: one complete fleet-wide telemetry update
//! - `MinerStatus`: per-miner hashrate / temperature / fan readings
//! - Fixed constants: candidate board ids, fan RPM ceiling

pub mod error;
pub mod logging;
pub mod types;

pub use error::{CoreError, Result};
pub use logging::init_logging;
pub use types::{
    board_key, fan_key, FanReading, HashrateReading, MinerStatus, Snapshot, TempReading,
    CANDIDATE_BOARDS, FAN_RPM_CEILING,
};
