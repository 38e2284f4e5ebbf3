pub mod resources;
pub mod session;
pub mod tail;
