//! Live request log consumption.

mod consumer;

pub use consumer::{LogStreamConsumer, LogStreamView};
