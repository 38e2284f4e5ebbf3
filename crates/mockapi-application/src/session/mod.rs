//! Session application services.

mod manager;

pub use manager::{CURRENT_USER_PATH, LOGIN_FAILED_MESSAGE, SessionManager, TOKEN_PATH};
