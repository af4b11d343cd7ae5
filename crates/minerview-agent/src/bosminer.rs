//! BOSminer API client.
//!
//! BOSminer exposes a one-shot TCP API: connect, send a JSON command,
//! read the reply until the miner closes the socket. The reply is
//! NUL-terminated. One `devs+temps+fans` query yields everything a
//! snapshot needs for one miner.

use std::collections::HashMap;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use minerview_core::{board_key, fan_key, FanReading, HashrateReading, MinerStatus, TempReading};

use crate::error::{AgentError, AgentResult};

/// Combined query for hashrate, temperature and fan readings.
pub const STATUS_COMMAND: &str = "devs+temps+fans";

/// Client for one miner's BOSminer API.
#[derive(Debug, Clone)]
pub struct BosMiner {
    /// Miner network address.
    pub ip: String,
    /// API port, normally 4028.
    pub api_port: u16,
}

impl BosMiner {
    pub fn new(ip: impl Into<String>, api_port: u16) -> Self {
        Self {
            ip: ip.into(),
            api_port,
        }
    }

    /// Send one API command and parse the reply.
    pub async fn send_api_cmd(&self, command: &str) -> AgentResult<Value> {
        let mut stream = TcpStream::connect((self.ip.as_str(), self.api_port)).await?;

        let request = serde_json::to_vec(&serde_json::json!({ "command": command }))?;
        stream.write_all(&request).await?;

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await?;

        // The reply carries a trailing NUL byte.
        if raw.last() == Some(&0) {
            raw.pop();
        }

        debug!(ip = %self.ip, bytes = raw.len(), command, "API reply received");
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Query the miner and assemble its status.
    pub async fn fetch_status(&self) -> AgentResult<MinerStatus> {
        let reply = self.send_api_cmd(STATUS_COMMAND).await?;
        let time = chrono::Local::now().format("%H:%M:%S%.6f").to_string();
        status_from_reply(&self.ip, &reply, time)
    }
}

/// Build a [`MinerStatus`] from a `devs+temps+fans` reply.
///
/// Boards that report hashrate but no temperature reading are filled
/// with zeros rather than omitted.
pub fn status_from_reply(ip: &str, reply: &Value, time: String) -> AgentResult<MinerStatus> {
    let devs = section(reply, "devs", "DEVS")?;
    let temps = section(reply, "temps", "TEMPS")?;
    let fans = section(reply, "fans", "FANS")?;

    let mut hashrates = HashMap::new();
    for dev in devs {
        let id = entry_id(dev, "DEVS")?;
        let hashrate = dev.get("MHS 5s").and_then(Value::as_f64).unwrap_or(0.0);
        hashrates.insert(board_key(id), HashrateReading { hashrate });
    }

    let mut temp_map = HashMap::new();
    for temp in temps {
        let id = entry_id(temp, "TEMPS")?;
        temp_map.insert(
            board_key(id),
            TempReading {
                chip: temp.get("Chip").and_then(Value::as_f64).unwrap_or(0.0),
                board: temp.get("Board").and_then(Value::as_f64).unwrap_or(0.0),
            },
        );
    }
    for key in hashrates.keys() {
        temp_map
            .entry(key.clone())
            .or_insert(TempReading { chip: 0.0, board: 0.0 });
    }

    let mut fan_map = HashMap::new();
    for fan in fans {
        let id = entry_id(fan, "FANS")?;
        fan_map.insert(
            fan_key(id),
            FanReading {
                rpm: fan.get("RPM").and_then(Value::as_f64).unwrap_or(0.0),
                speed: fan.get("Speed").and_then(Value::as_f64),
            },
        );
    }

    Ok(MinerStatus {
        ip: ip.to_string(),
        time: Some(time),
        hashrates,
        temps: temp_map,
        fans: fan_map,
    })
}

/// Extract `reply[<section>][0][<list>]` as an array.
fn section<'a>(reply: &'a Value, name: &str, list: &str) -> AgentResult<&'a Vec<Value>> {
    reply
        .get(name)
        .and_then(|v| v.get(0))
        .and_then(|v| v.get(list))
        .and_then(Value::as_array)
        .ok_or_else(|| AgentError::MinerApi(format!("reply missing {name}[0].{list}")))
}

fn entry_id(entry: &Value, list: &str) -> AgentResult<u8> {
    entry
        .get("ID")
        .and_then(Value::as_u64)
        .and_then(|id| u8::try_from(id).ok())
        .ok_or_else(|| AgentError::MinerApi(format!("{list} entry missing ID")))
}
