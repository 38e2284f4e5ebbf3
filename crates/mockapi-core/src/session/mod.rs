//! Session domain: authentication state observed by views.

mod state;

pub use state::{SessionState, UserIdentity};
