//! Network transports for the MockAPI console.
//!
//! - [`ApiClient`]: the one HTTP client every manager API call goes through.
//! - [`LogChannel`]: receive-only push channel carrying request log frames.

pub mod api_client;
pub mod log_channel;

pub use api_client::{
    ApiClient, ApiRequest, ApiResponse, HttpTransport, OutboundRequest, RequestBody,
    ReqwestTransport,
};
pub use log_channel::{LogChannel, WebSocketLogChannel};
pub use reqwest::Method;
