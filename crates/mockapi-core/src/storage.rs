//! Durable key/value slot storage trait.

use crate::error::Result;

/// Durable client-side storage made of named string slots.
///
/// This is the persistence seam for the credential store; implementations
/// live in the infrastructure crate.
pub trait SlotStorage: Send + Sync {
    /// Reads a slot. `Ok(None)` means the slot is empty.
    fn read(&self, slot: &str) -> Result<Option<String>>;

    /// Writes a slot, replacing any previous value. Must be atomic: a reader
    /// sees either the previous value or the new one.
    fn write(&self, slot: &str, value: &str) -> Result<()>;

    /// Removes a slot. Removing an empty slot is not an error.
    fn remove(&self, slot: &str) -> Result<()>;
}
