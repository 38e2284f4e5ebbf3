//! Client configuration loading.
//!
//! Configuration priority: environment variables > config.toml > defaults.

use crate::paths::MockApiPaths;
use mockapi_core::config::ClientConfig;
use mockapi_core::{MockApiError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_API_URL: &str = "MOCKAPI_API_URL";
pub const ENV_LOG_STREAM_URL: &str = "MOCKAPI_LOG_STREAM_URL";
pub const ENV_TOKEN_SLOT: &str = "MOCKAPI_TOKEN_SLOT";

/// Loads [`ClientConfig`] from `config.toml` and the environment.
///
/// Does NOT write the file; users edit it by hand.
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new(paths: &MockApiPaths) -> Result<Self> {
        Ok(Self {
            path: paths.config_file()?,
        })
    }

    /// Creates a ConfigService reading a specific file (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file and applies process environment overrides.
    pub fn load(&self) -> Result<ClientConfig> {
        let config = self.load_file()?;
        Ok(apply_overrides(config, |key| std::env::var(key).ok()))
    }

    /// Loads the file only. Missing or empty means defaults.
    pub fn load_file(&self) -> Result<ClientConfig> {
        if !self.path.exists() {
            tracing::debug!("[Config] No config file at {:?}, using defaults", self.path);
            return Ok(ClientConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ClientConfig::default());
        }

        toml::from_str(&content).map_err(|e| {
            MockApiError::config(format!("Invalid config file {}: {}", self.path.display(), e))
        })
    }
}

/// Applies `MOCKAPI_*` overrides using `lookup` to read variables.
pub fn apply_overrides<F>(mut config: ClientConfig, lookup: F) -> ClientConfig
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = non_empty(ENV_API_URL) {
        config.api.base_url = url;
    }
    if let Some(url) = non_empty(ENV_LOG_STREAM_URL) {
        config.log_stream.url = url;
    }
    if let Some(slot) = non_empty(ENV_TOKEN_SLOT) {
        config.storage.token_slot = slot;
    }
    config
}
