//! Live request log domain.
//!
//! Frames arrive on a channel shared by every project; this module decides
//! which of them a viewer keeps and how many.

mod buffer;
mod entry;
mod reconnect;
mod state;

pub use buffer::{LOG_BUFFER_CAPACITY, LogBuffer};
pub use entry::LogEntry;
pub use reconnect::ReconnectPolicy;
pub use state::{Applied, ChannelEvent, LogStreamState, StreamStatus};
