//! Client configuration model (`config.toml`).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::log_stream::ReconnectPolicy;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_LOG_STREAM_URL: &str = "ws://localhost:8000/ws/logs";
pub const DEFAULT_MOCK_BASE_URL: &str = "http://localhost:8001/mock";
pub const DEFAULT_TOKEN_SLOT: &str = "mockapi-token";

/// Root of `config.toml`. Every field has a default, so an empty file is valid.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub log_stream: LogStreamConfig,
    pub storage: StorageConfig,
    pub mock_engine: MockEngineConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LogStreamConfig {
    pub url: String,
    pub reconnect: ReconnectConfig,
}

impl Default for LogStreamConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_LOG_STREAM_URL.to_string(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReconnectConfig {
    pub enabled: bool,
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: 5,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
        }
    }
}

impl ReconnectConfig {
    pub fn policy(&self) -> ReconnectPolicy {
        if !self.enabled {
            return ReconnectPolicy::Never;
        }
        ReconnectPolicy::Backoff {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Durable slot holding the raw bearer token.
    pub token_slot: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            token_slot: DEFAULT_TOKEN_SLOT.to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MockEngineConfig {
    pub base_url: String,
}

impl Default for MockEngineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MOCK_BASE_URL.to_string(),
        }
    }
}
