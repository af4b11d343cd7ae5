//! Fleet telemetry wire types.
//!
//! Field names follow the agent's JSON payload exactly (`IP`, `HR`,
//! `Temps`, `Fans`, `board_<id>`, `fan_<id>`), so a snapshot round-trips
//! between the agent and the dashboard without any mapping layer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Fixed ceiling for fan gauges, in RPM.
///
/// Gauge segments are `[rpm, FAN_RPM_CEILING - rpm]`. Readings above the
/// ceiling yield a negative second segment; that is accepted, not clamped.
pub const FAN_RPM_CEILING: f64 = 6000.0;

/// Candidate hash board ids. Boards outside this set are never rendered.
pub const CANDIDATE_BOARDS: [u8; 3] = [6, 7, 8];

/// Map key for a hash board, e.g. `board_7`.
pub fn board_key(id: u8) -> String {
    format!("board_{id}")
}

/// Map key for a fan, e.g. `fan_0`.
pub fn fan_key(id: u8) -> String {
    format!("fan_{id}")
}

/// One complete fleet-wide telemetry update.
///
/// Transient: each snapshot fully replaces the prior render. Miner order
/// in `miners` is render order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Per-miner status, in render order.
    pub miners: Vec<MinerStatus>,
}

impl Snapshot {
    /// Parse a snapshot from the serialized payload of a `miner_data` event.
    pub fn parse(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Serialize for a `miner_data` event payload.
    pub fn to_payload(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Telemetry for a single miner, identified by its network address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinerStatus {
    /// Network address of the miner.
    #[serde(rename = "IP")]
    pub ip: String,
    /// Wall-clock time the reading was taken, `%H:%M:%S%.6f`.
    #[serde(rename = "Time", default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Hashrate per board, keyed `board_<id>`.
    #[serde(rename = "HR", default)]
    pub hashrates: HashMap<String, HashrateReading>,
    /// Temperatures per board, keyed `board_<id>`.
    #[serde(rename = "Temps", default)]
    pub temps: HashMap<String, TempReading>,
    /// Fan readings, keyed `fan_<id>`. Every miner is expected to report
    /// `fan_0` and `fan_1`; a missing fan fails the render cycle.
    #[serde(rename = "Fans", default)]
    pub fans: HashMap<String, FanReading>,
}

impl MinerStatus {
    /// Hashrate reading for a board, if the board reported one.
    pub fn hashrate(&self, board: u8) -> Option<f64> {
        self.hashrates.get(&board_key(board)).map(|r| r.hashrate)
    }

    /// Temperature reading for a board, if the board reported one.
    pub fn board_temps(&self, board: u8) -> Option<&TempReading> {
        self.temps.get(&board_key(board))
    }

    /// Fan RPM by fan id.
    pub fn fan_rpm(&self, fan: u8) -> Option<f64> {
        self.fans.get(&fan_key(fan)).map(|f| f.rpm)
    }
}

/// Hashrate reading for one board, in MH/s.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HashrateReading {
    /// 5-second average hashrate.
    /// Some agent builds emit the key as "HR MHS"; accept both.
    #[serde(rename = "HR", alias = "HR MHS")]
    pub hashrate: f64,
}

/// Chip and board-surface temperatures for one board, in degrees C.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TempReading {
    /// Chip temperature.
    #[serde(rename = "Chip")]
    pub chip: f64,
    /// Board-surface temperature.
    #[serde(rename = "Board")]
    pub board: f64,
}

/// Reading for one fan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FanReading {
    /// Fan speed in RPM.
    #[serde(rename = "RPM")]
    pub rpm: f64,
    /// Duty cycle percentage, if reported. Not rendered.
    #[serde(rename = "Speed", default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}
