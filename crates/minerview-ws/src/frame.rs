//! Event frame protocol.
//!
//! Both directions speak one JSON object per websocket text message:
//!
//! ```json
//! { "event": "<name>", "data": <any>, "ack": <id, optional> }
//! ```
//!
//! A frame carrying an `ack` id requests acknowledgment; the peer
//! replies with `event: "ack"` and the same id. Event payloads:
//!
//! - `miner_data` (agent -> dashboard): `data` is the snapshot
//!   serialized as a JSON *string*; acknowledged with the literal
//!   `"graph data received"`
//! - `pause` (dashboard -> agent): `data` is `{"ip": <address>}`; the
//!   ack reply carries `{"ip": ..., "result": ...}`
//! - `light` (dashboard -> agent): `data` is the bare address string,
//!   no ack requested (asymmetric with `pause`, kept as-is)

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound fleet telemetry event.
pub const EVENT_MINER_DATA: &str = "miner_data";
/// Outbound pause command event.
pub const EVENT_PAUSE: &str = "pause";
/// Outbound light command event.
pub const EVENT_LIGHT: &str = "light";
/// Acknowledgment reply event.
pub const EVENT_ACK: &str = "ack";

/// Fixed acknowledgment string for `miner_data` events.
pub const MINER_DATA_ACK: &str = "graph data received";

/// One websocket text message in either direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Event name.
    pub event: String,
    /// Event payload. Shape depends on the event.
    #[serde(default)]
    pub data: Value,
    /// Acknowledgment id. On a non-ack frame, requests an ack reply;
    /// on an ack frame, names the frame being acknowledged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack: Option<u64>,
}

impl Frame {
    /// Build a `miner_data` frame carrying a serialized snapshot.
    pub fn miner_data(payload: String, ack_id: u64) -> Self {
        Self {
            event: EVENT_MINER_DATA.to_string(),
            data: Value::String(payload),
            ack: Some(ack_id),
        }
    }

    /// Build an ack reply for the given id.
    pub fn ack(ack_id: u64, data: Value) -> Self {
        Self {
            event: EVENT_ACK.to_string(),
            data,
            ack: Some(ack_id),
        }
    }

    /// Build a `pause` command frame for a miner address.
    pub fn pause(ip: &str, ack_id: u64) -> Self {
        Self {
            event: EVENT_PAUSE.to_string(),
            data: serde_json::json!({ "ip": ip }),
            ack: Some(ack_id),
        }
    }

    /// Build a `light` command frame. The payload is the bare address
    /// string and no ack is requested.
    pub fn light(ip: &str) -> Self {
        Self {
            event: EVENT_LIGHT.to_string(),
            data: Value::String(ip.to_string()),
            ack: None,
        }
    }

    /// Check if this is an ack reply.
    pub fn is_ack(&self) -> bool {
        self.event == EVENT_ACK
    }
}

/// Payload of a `pause` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PauseCommand {
    /// Target miner address.
    pub ip: String,
}

/// Ack payload of a `pause` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PauseReply {
    /// Target miner address, echoed back.
    #[serde(default)]
    pub ip: Option<String>,
    /// Raw result string, classified via [`CommandOutcome::classify`].
    pub result: String,
}

/// Outcome of a command, derived from the ack's `result` field.
///
/// Purely for logging; no retry and no user-facing feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// `"success"`.
    Success,
    /// `"failed"` - the miner rejected the command.
    Failed,
    /// `"error"` - the agent could not reach the miner.
    TransportError,
    /// Anything else.
    Unknown,
}

impl CommandOutcome {
    /// Classify a raw `result` string.
    pub fn classify(result: &str) -> Self {
        match result {
            "success" => Self::Success,
            "failed" => Self::Failed,
            "error" => Self::TransportError,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
            Self::TransportError => write!(f, "error"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
