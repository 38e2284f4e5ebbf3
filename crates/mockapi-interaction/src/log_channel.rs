//! Receive-only push channel for request log frames.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use mockapi_core::log_stream::ChannelEvent;
use mockapi_core::{MockApiError, Result};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// Opens a connection to the shared log channel.
///
/// `connect` resolves once the channel is open; the returned stream then
/// yields frames until it reports `Error`/`Closed` or ends. Dropping the
/// stream closes the connection.
#[async_trait]
pub trait LogChannel: Send + Sync {
    async fn connect(&self, url: &str) -> Result<BoxStream<'static, ChannelEvent>>;
}

/// [`LogChannel`] over a WebSocket. Nothing is ever sent upstream.
#[derive(Debug, Default, Clone)]
pub struct WebSocketLogChannel;

impl WebSocketLogChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LogChannel for WebSocketLogChannel {
    async fn connect(&self, url: &str) -> Result<BoxStream<'static, ChannelEvent>> {
        let (socket, _response) = connect_async(url)
            .await
            .map_err(|e| MockApiError::network(format!("WebSocket connect to {} failed: {}", url, e)))?;
        tracing::info!("[LogStream] Connected to {}", url);

        let events = socket
            .filter_map(|message| async move { to_channel_event(message) })
            .boxed();
        Ok(events)
    }
}

fn to_channel_event(
    message: std::result::Result<Message, tokio_tungstenite::tungstenite::Error>,
) -> Option<ChannelEvent> {
    match message {
        Ok(Message::Text(text)) => Some(ChannelEvent::Frame(text)),
        Ok(Message::Binary(bytes)) => Some(ChannelEvent::Frame(
            String::from_utf8_lossy(&bytes).into_owned(),
        )),
        Ok(Message::Close(_)) => Some(ChannelEvent::Closed),
        Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => None,
        Err(e) => Some(ChannelEvent::Error(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::tungstenite::Error as WsError;

    #[test]
    fn test_text_and_binary_become_frames() {
        assert_eq!(
            to_channel_event(Ok(Message::Text("{}".to_string()))),
            Some(ChannelEvent::Frame("{}".to_string()))
        );
        assert_eq!(
            to_channel_event(Ok(Message::Binary(b"{\"a\":1}".to_vec()))),
            Some(ChannelEvent::Frame("{\"a\":1}".to_string()))
        );
    }

    #[test]
    fn test_control_frames_are_skipped() {
        assert_eq!(to_channel_event(Ok(Message::Ping(vec![1]))), None);
        assert_eq!(to_channel_event(Ok(Message::Pong(vec![]))), None);
    }

    #[test]
    fn test_close_and_errors() {
        assert_eq!(to_channel_event(Ok(Message::Close(None))), Some(ChannelEvent::Closed));
        assert!(matches!(
            to_channel_event(Err(WsError::ConnectionClosed)),
            Some(ChannelEvent::Error(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_refused_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = WebSocketLogChannel::new()
            .connect(&format!("ws://{}/ws/logs", addr))
            .await;
        assert!(matches!(result, Err(MockApiError::Network(_))));
    }
}
