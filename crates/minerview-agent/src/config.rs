//! Agent configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AgentError, AgentResult};

/// Agent configuration, loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Port the websocket server listens on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Seconds between poll sweeps of the fleet.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// BOSminer API port on each miner.
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Maximum concurrent dashboard connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Miner addresses to poll.
    #[serde(default)]
    pub miners: Vec<String>,
}

fn default_port() -> u16 {
    8080
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_api_port() -> u16 {
    4028
}

fn default_max_connections() -> usize {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            poll_interval_secs: default_poll_interval_secs(),
            api_port: default_api_port(),
            max_connections: default_max_connections(),
            miners: Vec::new(),
        }
    }
}

impl AgentConfig {
    /// Load from a file, falling back to defaults when it is absent.
    pub fn load(path: &str) -> AgentResult<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(%path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AgentResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AgentError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AgentError::Config(format!("Failed to parse config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.api_port, 4028);
        assert!(config.miners.is_empty());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: AgentConfig = toml::from_str(
            r#"
            miners = ["172.16.1.99", "172.16.1.98"]
            poll_interval_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.miners.len(), 2);
        assert_eq!(config.poll_interval_secs, 10);
        // Unspecified fields fall back to defaults.
        assert_eq!(config.port, 8080);
    }
}
