//! Domain layer for the MockAPI console.
//!
//! Holds the types shared by every other crate: the error type, the bearer
//! credential, the observable session state, the log stream state machine and
//! the configuration model. Nothing in here performs IO.

pub mod config;
pub mod credential;
pub mod error;
pub mod log_stream;
pub mod resource;
pub mod session;
pub mod storage;

// Re-export common error type
pub use error::{MockApiError, Result};
