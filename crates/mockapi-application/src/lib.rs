//! Application layer for the MockAPI console.
//!
//! Coordinates the credential store, the API client and the log channel:
//! - [`SessionManager`]: login/logout/bootstrap and the authentication state
//! - [`LogStreamConsumer`]: one live request log per viewed project
//! - [`ResourceService`]: manager API calls with unauthorized-response handling

pub mod log_stream;
pub mod resource_service;
pub mod session;

pub use log_stream::{LogStreamConsumer, LogStreamView};
pub use resource_service::ResourceService;
pub use session::SessionManager;
