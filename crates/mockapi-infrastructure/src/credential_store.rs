//! Process-wide holder of the current bearer token.

use mockapi_core::Result;
use mockapi_core::credential::{AccessToken, Credential};
use mockapi_core::storage::SlotStorage;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Holds the current bearer token in memory, mirrored to one durable slot.
///
/// Memory and storage change under one write lock, so `get()` observes either
/// the state before a `set`/`clear` or the state after it.
///
/// # Security Note
///
/// The token is never logged. Storage failures are reported without it.
pub struct CredentialStore {
    storage: Arc<dyn SlotStorage>,
    slot: String,
    current: RwLock<Credential>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn SlotStorage>, slot: impl Into<String>) -> Self {
        Self {
            storage,
            slot: slot.into(),
            current: RwLock::new(None),
        }
    }

    /// Current in-memory credential.
    pub fn get(&self) -> Credential {
        self.read_lock().clone()
    }

    /// Persists `token`, then makes it current.
    ///
    /// If persisting fails the previous credential stays current.
    pub fn set(&self, token: AccessToken) -> Result<()> {
        let mut current = self.write_lock();
        self.storage.write(&self.slot, token.as_str())?;
        *current = Some(token);
        Ok(())
    }

    /// Forgets the credential.
    ///
    /// Memory is always cleared; a failure to clear durable storage is
    /// returned after the fact.
    pub fn clear(&self) -> Result<()> {
        let mut current = self.write_lock();
        *current = None;
        self.storage.remove(&self.slot)
    }

    /// Loads the persisted credential into memory. Never fails: an empty,
    /// missing or unreadable slot restores as absent.
    pub fn restore(&self) -> Credential {
        let mut current = self.write_lock();
        let restored = match self.storage.read(&self.slot) {
            Ok(Some(raw)) if !raw.trim().is_empty() => Some(AccessToken::new(raw)),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(
                    "[Storage] Could not read credential slot '{}', starting signed out: {}",
                    self.slot,
                    e
                );
                None
            }
        };
        *current = restored.clone();
        restored
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, Credential> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, Credential> {
        self.current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
