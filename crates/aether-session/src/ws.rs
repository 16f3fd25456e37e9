//! WebSocket transport over `tokio-tungstenite`.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt, future};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use crate::errors::TransportError;
use crate::transport::{Connection, Connector, Frame};

/// Opens WebSocket connections. Protocol-level ping/pong is answered by
/// tungstenite and never surfaces as a [`Frame`].
#[derive(Clone, Copy, Debug, Default)]
pub struct WsConnector;

fn to_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Binary(bytes) => Message::Binary(bytes.into()),
        Frame::Close => Message::Close(None),
    }
}

fn to_frame(message: Message) -> Option<Frame> {
    match message {
        Message::Text(text) => Some(Frame::Text(text.as_str().to_owned())),
        Message::Binary(bytes) => Some(Frame::Binary(bytes.to_vec())),
        Message::Close(_) => Some(Frame::Close),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => None,
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Connection, TransportError> {
        let (ws, response) = connect_async(url)
            .await
            .map_err(|e| TransportError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        debug!(url, status = %response.status(), "websocket handshake complete");

        let (sink, stream) = ws.split();
        let sink = sink
            .sink_map_err(|e| TransportError::Send(e.to_string()))
            .with(|frame: Frame| future::ready(Ok::<_, TransportError>(to_message(frame))));
        let stream = stream.filter_map(|item| {
            future::ready(match item {
                Ok(message) => to_frame(message).map(Ok),
                Err(e) => Some(Err(TransportError::Receive(e.to_string()))),
            })
        });

        Ok(Connection {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_frames_map_both_ways() {
        let message = to_message(Frame::Text(r#"{"type":"ping"}"#.into()));
        assert_eq!(
            to_frame(message),
            Some(Frame::Text(r#"{"type":"ping"}"#.into()))
        );
    }

    #[test]
    fn binary_frames_keep_bytes() {
        let message = to_message(Frame::Binary(vec![1, 2, 3]));
        assert_eq!(to_frame(message), Some(Frame::Binary(vec![1, 2, 3])));
    }

    #[test]
    fn control_frames_are_hidden() {
        assert_eq!(to_frame(Message::Ping(vec![1].into())), None);
        assert_eq!(to_frame(Message::Pong(vec![].into())), None);
    }

    #[test]
    fn close_maps_to_close() {
        assert_eq!(to_frame(Message::Close(None)), Some(Frame::Close));
        assert!(matches!(to_message(Frame::Close), Message::Close(None)));
    }

    #[tokio::test]
    async fn refused_connection_is_connect_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = WsConnector
            .connect(&format!("ws://{addr}/ws/reconstruct"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }
}
