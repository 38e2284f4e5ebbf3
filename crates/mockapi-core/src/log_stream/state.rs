use std::fmt;

use super::buffer::LogBuffer;
use super::entry::LogEntry;

/// Connection status of one log stream viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    Connecting,
    Live,
    Error(String),
    Closed,
}

impl StreamStatus {
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    /// `Error` and `Closed` end a connection.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error(_) | Self::Closed)
    }

    /// Label shown next to the log list.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connecting => "Connecting...",
            Self::Live => "Live: Waiting for requests...",
            Self::Error(_) => "Error: Check backend and Redis connection.",
            Self::Closed => "Disconnected.",
        }
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Something that happened on the push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened,
    Frame(String),
    Error(String),
    Closed,
}

/// How [`LogStreamState::apply`] handled an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    StatusChanged,
    /// A matching entry was added to the buffer.
    Accepted,
    /// A valid entry for another project.
    Ignored,
    /// The frame was not a log entry and was dropped.
    Malformed,
    /// Nothing observable changed.
    Unchanged,
}

impl Applied {
    pub fn is_visible(&self) -> bool {
        matches!(self, Self::StatusChanged | Self::Accepted)
    }
}

/// State machine for one viewer: `Connecting -> Live -> (Error | Closed)`.
///
/// Pure data; the consumer feeds it channel events and publishes snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct LogStreamState {
    target_slug: String,
    status: StreamStatus,
    buffer: LogBuffer,
    accepted_total: u64,
    malformed_total: u64,
}

impl LogStreamState {
    pub fn new(target_slug: impl Into<String>) -> Self {
        Self {
            target_slug: target_slug.into(),
            status: StreamStatus::Connecting,
            buffer: LogBuffer::new(),
            accepted_total: 0,
            malformed_total: 0,
        }
    }

    pub fn target_slug(&self) -> &str {
        &self.target_slug
    }

    pub fn status(&self) -> &StreamStatus {
        &self.status
    }

    pub fn buffer(&self) -> &LogBuffer {
        &self.buffer
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.buffer.iter()
    }

    /// Matching entries received since the stream started, including ones
    /// that have since fallen out of the buffer.
    pub fn accepted_total(&self) -> u64 {
        self.accepted_total
    }

    pub fn malformed_total(&self) -> u64 {
        self.malformed_total
    }

    pub fn apply(&mut self, event: ChannelEvent) -> Applied {
        match event {
            ChannelEvent::Opened => self.set_status(StreamStatus::Live),
            ChannelEvent::Frame(frame) => self.accept_frame(&frame),
            ChannelEvent::Error(message) => self.set_status(StreamStatus::Error(message)),
            ChannelEvent::Closed => self.set_status(StreamStatus::Closed),
        }
    }

    /// Back to `Connecting` for another connection attempt. The buffer is kept.
    pub fn reconnecting(&mut self) -> Applied {
        self.set_status(StreamStatus::Connecting)
    }

    /// Terminal close requested locally.
    pub fn close(&mut self) -> Applied {
        self.set_status(StreamStatus::Closed)
    }

    fn set_status(&mut self, status: StreamStatus) -> Applied {
        if self.status == status {
            return Applied::Unchanged;
        }
        self.status = status;
        Applied::StatusChanged
    }

    fn accept_frame(&mut self, frame: &str) -> Applied {
        match LogEntry::from_frame(frame) {
            Ok(entry) if entry.project_slug == self.target_slug => {
                self.buffer.push(entry);
                self.accepted_total += 1;
                Applied::Accepted
            }
            Ok(_) => Applied::Ignored,
            Err(_) => {
                self.malformed_total += 1;
                Applied::Malformed
            }
        }
    }
}
