use std::collections::VecDeque;

use super::entry::LogEntry;

/// Maximum number of entries a viewer keeps.
pub const LOG_BUFFER_CAPACITY: usize = 50;

/// Newest-first, capacity-bounded list of log entries.
///
/// Order is arrival order; entry timestamps are never consulted.
#[derive(Debug, Clone, PartialEq)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(LOG_BUFFER_CAPACITY),
        }
    }

    /// Inserts at the front, dropping the oldest entry past capacity.
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(LOG_BUFFER_CAPACITY);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn newest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}
