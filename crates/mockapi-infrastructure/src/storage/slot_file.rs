//! TOML-backed slot storage with atomic writes.

use mockapi_core::MockApiError;
use mockapi_core::storage::SlotStorage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

/// Errors that can occur during slot file operations.
#[derive(Debug)]
pub enum SlotStorageError {
    /// File I/O error.
    IoError(std::io::Error),
    /// The file exists but is not a valid slot table.
    ParseError(toml::de::Error),
    /// TOML serialization error.
    SerError(toml::ser::Error),
    /// File locking error.
    LockError(String),
}

impl std::fmt::Display for SlotStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotStorageError::IoError(e) => write!(f, "I/O error: {}", e),
            SlotStorageError::ParseError(e) => write!(f, "TOML parse error: {}", e),
            SlotStorageError::SerError(e) => write!(f, "TOML serialization error: {}", e),
            SlotStorageError::LockError(e) => write!(f, "Lock error: {}", e),
        }
    }
}

impl std::error::Error for SlotStorageError {}

impl From<std::io::Error> for SlotStorageError {
    fn from(e: std::io::Error) -> Self {
        SlotStorageError::IoError(e)
    }
}

impl From<toml::de::Error> for SlotStorageError {
    fn from(e: toml::de::Error) -> Self {
        SlotStorageError::ParseError(e)
    }
}

impl From<toml::ser::Error> for SlotStorageError {
    fn from(e: toml::ser::Error) -> Self {
        SlotStorageError::SerError(e)
    }
}

impl From<SlotStorageError> for MockApiError {
    fn from(e: SlotStorageError) -> Self {
        match e {
            SlotStorageError::ParseError(e) => MockApiError::Serialization {
                format: "TOML".to_string(),
                message: e.to_string(),
            },
            other => MockApiError::storage(other.to_string()),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SlotTable {
    #[serde(default)]
    slots: BTreeMap<String, String>,
}

/// Slot storage persisted as a single TOML file.
///
/// Provides:
/// - **Atomicity**: writes go to a temporary file that is fsynced and renamed over the target
/// - **Isolation**: read-modify-write cycles hold an exclusive lock file
/// - **Privacy**: the file is chmod 600 on Unix
///
/// A corrupt file reads as an error; the next write replaces it.
pub struct TomlSlotStorage {
    path: PathBuf,
}

impl TomlSlotStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<SlotTable, SlotStorageError> {
        if !self.path.exists() {
            return Ok(SlotTable::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(SlotTable::default());
        }

        Ok(toml::from_str(&content)?)
    }

    /// Loads under lock, applies `f`, saves atomically.
    fn update<F>(&self, f: F) -> Result<(), SlotStorageError>
    where
        F: FnOnce(&mut SlotTable) -> bool,
    {
        let _lock = FileLock::acquire(&self.path)?;

        let mut table = match self.load() {
            Ok(table) => table,
            Err(SlotStorageError::ParseError(e)) => {
                tracing::warn!("[Storage] Replacing unreadable slot file {:?}: {}", self.path, e);
                SlotTable::default()
            }
            Err(e) => return Err(e),
        };

        if f(&mut table) {
            self.save(&table)?;
        }
        Ok(())
    }

    fn save(&self, table: &SlotTable) -> Result<(), SlotStorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(table)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        restrict_permissions(&tmp_path)?;
        tmp_file.write_all(content.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> Result<PathBuf, SlotStorageError> {
        let file_name = self.path.file_name().ok_or_else(|| {
            SlotStorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no file name",
            ))
        })?;
        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(self.path.with_file_name(tmp_name))
    }
}

impl SlotStorage for TomlSlotStorage {
    fn read(&self, slot: &str) -> mockapi_core::Result<Option<String>> {
        let table = self.load()?;
        Ok(table.slots.get(slot).cloned())
    }

    fn write(&self, slot: &str, value: &str) -> mockapi_core::Result<()> {
        self.update(|table| {
            table.slots.insert(slot.to_string(), value.to_string());
            true
        })?;
        Ok(())
    }

    fn remove(&self, slot: &str) -> mockapi_core::Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|table| table.slots.remove(slot).is_some())?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Exclusive lock held for the duration of a read-modify-write cycle.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, SlotStorageError> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| SlotStorageError::LockError(format!("Failed to acquire lock: {}", e)))?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}
