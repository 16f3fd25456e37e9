//! End-to-end session tests against a real WebSocket server.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

use aether_core::PointSample;
use aether_protocol::{StreamMessage, decode, encode};
use aether_session::{SessionConfig, SessionManager, SessionState, WsConnector};

const TIMEOUT: Duration = Duration::from_secs(5);

type ServerSocket = WebSocketStream<TcpStream>;

/// Bind a loopback WebSocket server; every accepted socket is handed to the
/// test.
async fn boot_server() -> (String, mpsc::UnboundedReceiver<ServerSocket>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let _accept_loop = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            if let Ok(ws) = accept_async(stream).await {
                if tx.send(ws).is_err() {
                    break;
                }
            }
        }
    });
    (format!("ws://{addr}/ws/reconstruct"), rx)
}

fn fast_config(url: String) -> SessionConfig {
    SessionConfig {
        reconnect_interval: Duration::from_millis(50),
        ..SessionConfig::new(url)
    }
}

async fn wait_for(manager: &SessionManager, target: SessionState) {
    let mut rx = manager.subscribe_state();
    let _ = timeout(TIMEOUT, rx.wait_for(|state| *state == target))
        .await
        .expect("state timeout")
        .unwrap();
}

async fn next_text(ws: &mut ServerSocket) -> String {
    loop {
        let msg = timeout(TIMEOUT, ws.next())
            .await
            .expect("frame timeout")
            .expect("socket open")
            .unwrap();
        if let Message::Text(text) = msg {
            return text.as_str().to_owned();
        }
    }
}

#[tokio::test]
async fn round_trip_over_websocket() {
    let (url, mut sockets) = boot_server().await;
    let (manager, mut inbound) = SessionManager::new(WsConnector, fast_config(url));

    manager.connect();
    let mut server = timeout(TIMEOUT, sockets.recv()).await.unwrap().unwrap();
    wait_for(&manager, SessionState::Connected).await;

    assert!(manager.send(&StreamMessage::upload_complete(2)));
    let received = decode(&next_text(&mut server).await).unwrap();
    assert_eq!(received, StreamMessage::upload_complete(2));

    let batch = StreamMessage::points(vec![
        PointSample::new([0.0, 1.0, 2.0], [255, 0, 0]),
        PointSample::new([3.0, 4.0, 5.0], [0, 255, 0]),
    ]);
    server
        .send(Message::Text(encode(&batch).unwrap().into()))
        .await
        .unwrap();
    let delivered = timeout(TIMEOUT, inbound.recv()).await.unwrap().unwrap();
    assert_eq!(delivered, batch);

    manager.disconnect();
}

#[tokio::test]
async fn server_drop_triggers_reconnect() {
    let (url, mut sockets) = boot_server().await;
    let (manager, _inbound) = SessionManager::new(WsConnector, fast_config(url));

    manager.connect();
    let mut first = timeout(TIMEOUT, sockets.recv()).await.unwrap().unwrap();
    wait_for(&manager, SessionState::Connected).await;

    first.close(None).await.unwrap();
    let _second = timeout(TIMEOUT, sockets.recv()).await.unwrap().unwrap();
    wait_for(&manager, SessionState::Connected).await;
    assert_eq!(manager.connect_attempts(), 2);

    manager.disconnect();
    assert_eq!(manager.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn unreachable_server_keeps_retrying_until_disconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (manager, _inbound) = SessionManager::new(
        WsConnector,
        fast_config(format!("ws://{addr}/ws/reconstruct")),
    );
    manager.connect();

    timeout(TIMEOUT, async {
        while manager.connect_attempts() < 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    manager.disconnect();
    let attempts = manager.connect_attempts();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(manager.connect_attempts(), attempts);
    assert!(!manager.is_retry_pending());
}
