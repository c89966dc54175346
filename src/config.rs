//! Client Configuration
//!
//! Settings come from the environment, falling back to defaults that
//! work against a local server.

use rand::Rng;
use thiserror::Error;

/// Default server endpoint.
pub const DEFAULT_SERVER_URL: &str = "ws://localhost:8000";

/// Default bound for the inbound and outbound channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Bad configuration value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable is set but does not parse.
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        /// Environment variable name.
        var: &'static str,
        /// Raw value.
        value: String,
        /// What was wrong with it.
        reason: String,
    },

    /// No room to join.
    #[error("no room given; set WHOCHOSE_ROOM")]
    MissingRoom,
}

/// Client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket server base URL.
    pub server_url: String,
    /// Room to join.
    pub room_id: Option<String>,
    /// Display name to join with.
    pub player_name: String,
    /// Channel bound for transport queues.
    pub channel_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            room_id: None,
            player_name: guest_name(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("WHOCHOSE_SERVER_URL") {
            if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                return Err(ConfigError::Invalid {
                    var: "WHOCHOSE_SERVER_URL",
                    value: url,
                    reason: "expected a ws:// or wss:// URL".to_string(),
                });
            }
            config.server_url = url;
        }

        config.room_id = lookup("WHOCHOSE_ROOM").filter(|r| !r.trim().is_empty());

        if let Some(name) = lookup("WHOCHOSE_NAME").filter(|n| !n.trim().is_empty()) {
            config.player_name = name;
        }

        if let Some(raw) = lookup("WHOCHOSE_CHANNEL_CAPACITY") {
            config.channel_capacity = match raw.parse::<usize>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        var: "WHOCHOSE_CHANNEL_CAPACITY",
                        value: raw,
                        reason: "must be at least 1".to_string(),
                    })
                }
                Ok(n) => n,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: "WHOCHOSE_CHANNEL_CAPACITY",
                        value: raw,
                        reason: e.to_string(),
                    })
                }
            };
        }

        Ok(config)
    }

    /// Room to join, or an error if none was configured.
    pub fn room(&self) -> Result<&str, ConfigError> {
        self.room_id.as_deref().ok_or(ConfigError::MissingRoom)
    }
}

/// Random guest name, `Guest#1` to `Guest#5000`.
pub fn guest_name() -> String {
    format!("Guest#{}", rand::thread_rng().gen_range(1..=5000))
}
