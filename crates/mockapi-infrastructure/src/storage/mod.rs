//! Durable slot storage backends.

mod memory;
mod slot_file;

pub use memory::InMemorySlotStorage;
pub use slot_file::{SlotStorageError, TomlSlotStorage};
