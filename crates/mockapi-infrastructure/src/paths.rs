//! Unified path management for console configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/mockapi/           # Config directory
//! ├── config.toml              # Client configuration
//! └── storage.toml             # Durable slots (bearer token)
//! ```

use std::path::{Path, PathBuf};

const APP_DIR: &str = "mockapi";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home/config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for mockapi_core::MockApiError {
    fn from(err: PathError) -> Self {
        mockapi_core::MockApiError::config(err.to_string())
    }
}

/// Resolves every file the console reads or writes.
///
/// `MockApiPaths::new(None)` uses the platform config directory;
/// `MockApiPaths::new(Some(base))` roots everything at `base` (tests,
/// `--config-dir`).
#[derive(Debug, Clone)]
pub struct MockApiPaths {
    base: Option<PathBuf>,
}

impl MockApiPaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the console configuration directory (e.g. `~/.config/mockapi/`).
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the path of the durable slot file.
    ///
    /// # Security Note
    ///
    /// This file holds the bearer token; it is written with mode 600 on Unix.
    pub fn storage_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("storage.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_live_under_config_dir() {
        let paths = MockApiPaths::new(Some(Path::new("/tmp/mockapi-test")));
        let config_dir = paths.config_dir().unwrap();
        assert_eq!(config_dir, PathBuf::from("/tmp/mockapi-test"));
        assert!(paths.config_file().unwrap().starts_with(&config_dir));
        assert!(paths.storage_file().unwrap().ends_with("storage.toml"));
    }

    #[test]
    fn test_default_config_dir_ends_with_app_dir() {
        if let Ok(config_dir) = MockApiPaths::new(None).config_dir() {
            assert!(config_dir.ends_with("mockapi"));
        }
    }
}
