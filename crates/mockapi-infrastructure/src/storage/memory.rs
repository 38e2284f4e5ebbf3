//! In-process slot storage.

use mockapi_core::Result;
use mockapi_core::storage::SlotStorage;
use std::collections::HashMap;
use std::sync::Mutex;

/// Slot storage that lives only as long as the process.
///
/// Used by tests.
#[derive(Default)]
pub struct InMemorySlotStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl InMemorySlotStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SlotStorage for InMemorySlotStorage {
    fn read(&self, slot: &str) -> Result<Option<String>> {
        Ok(self.lock().get(slot).cloned())
    }

    fn write(&self, slot: &str, value: &str) -> Result<()> {
        self.lock().insert(slot.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<()> {
        self.lock().remove(slot);
        Ok(())
    }
}
