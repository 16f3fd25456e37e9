//! End-to-end run scenarios over an in-memory session.

use std::time::Duration;

use futures::StreamExt;
use futures::channel::mpsc::UnboundedReceiver;
use tokio::time::timeout;

use aether_buffer::SharedPointBuffer;
use aether_core::{PointSample, RunId};
use aether_protocol::StreamMessage;
use aether_session::memory::{MemoryConnector, ServerEnd};
use aether_session::{SessionConfig, SessionManager, SessionState};
use aether_stream::{
    CoordinatorHandle, InputUnit, RunError, RunPhase, StreamCoordinator, StreamStatus,
    spawn_coordinator,
};

const TIMEOUT: Duration = Duration::from_secs(5);

struct Harness {
    session: SessionManager,
    handle: CoordinatorHandle,
    accepted: UnboundedReceiver<ServerEnd>,
}

impl Harness {
    fn new(capacity: usize) -> Self {
        Self::with_config(capacity, SessionConfig::default())
    }

    fn with_config(capacity: usize, config: SessionConfig) -> Self {
        let (connector, accepted) = MemoryConnector::new();
        let (session, inbound) = SessionManager::new(connector, config);
        let buffer = SharedPointBuffer::allocate(capacity).unwrap();
        let handle = spawn_coordinator(StreamCoordinator::new(session.clone(), buffer), inbound);
        Self {
            session,
            handle,
            accepted,
        }
    }

    async fn connect(&mut self) -> ServerEnd {
        self.session.connect();
        let server = timeout(TIMEOUT, self.accepted.next())
            .await
            .unwrap()
            .unwrap();
        let mut state = self.session.subscribe_state();
        let _ = timeout(TIMEOUT, state.wait_for(|s| *s == SessionState::Connected))
            .await
            .unwrap()
            .unwrap();
        server
    }

    async fn wait_until(&self, pred: impl FnMut(&StreamStatus) -> bool) -> StreamStatus {
        let mut rx = self.handle.subscribe();
        let status = timeout(TIMEOUT, rx.wait_for(pred))
            .await
            .expect("status timeout")
            .unwrap()
            .clone();
        status
    }

    async fn finish(self) {
        self.session.disconnect();
        self.handle.shutdown().await;
    }
}

fn points(range: std::ops::Range<u8>) -> Vec<PointSample> {
    range
        .map(|i| PointSample::new([f32::from(i), f32::from(i) * 0.5, -1.0], [i, 255 - i, 0]))
        .collect()
}

fn inputs(n: usize) -> Vec<InputUnit> {
    (0..n)
        .map(|i| InputUnit::new(format!("frame_{i:03}.jpg"), "image/jpeg", vec![0xff, 0xd8, 0xff]))
        .collect()
}

// ── nominal ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn nominal_run_streams_and_completes() {
    let mut h = Harness::new(1_000_000);
    let mut server = h.connect().await;

    let run = h.handle.start_run(inputs(2)).await.unwrap();

    for expected in ["frame_000.jpg", "frame_001.jpg"] {
        match server.recv_message().await.unwrap() {
            StreamMessage::InputBatch {
                filename, run_id, ..
            } => {
                assert_eq!(filename, expected);
                assert_eq!(run_id.as_ref(), Some(&run));
            }
            other => panic!("expected image_data, got {other:?}"),
        }
    }
    assert_eq!(
        server.recv_message().await.unwrap(),
        StreamMessage::upload_complete(2).with_run_id(run.clone())
    );

    server.send_message(&StreamMessage::points(points(0..5)).with_run_id(run.clone()));
    server.send_message(&StreamMessage::points(points(5..10)).with_run_id(run.clone()));
    server.send_message(&StreamMessage::StreamComplete {
        total_points: 10,
        run_id: Some(run.clone()),
    });

    let status = h.wait_until(|s| s.phase.is_terminal()).await;
    assert_eq!(status.phase, RunPhase::Complete { total_points: 10 });
    assert_eq!(status.point_count, 10);
    assert_eq!(status.run_id, Some(run));
    assert_eq!(h.handle.buffer().count(), 10);

    let buffer = h.handle.buffer().read();
    assert_eq!(buffer.sample(9), Some(([9.0, 4.5, -1.0], [9.0 / 255.0, 246.0 / 255.0, 0.0])));
    drop(buffer);
    h.finish().await;
}

#[tokio::test]
async fn untagged_server_batches_are_accepted() {
    let mut h = Harness::new(1_000_000);
    let server = h.connect().await;
    let _run = h.handle.start_run(inputs(1)).await.unwrap();

    server.send_message(&StreamMessage::points(points(0..5)));
    server.send_message(&StreamMessage::points(points(5..10)));
    server.send_message(&StreamMessage::StreamComplete {
        total_points: 10,
        run_id: None,
    });

    let status = h.wait_until(|s| s.phase.is_terminal()).await;
    assert_eq!(status.point_count, 10);
    h.finish().await;
}

// ── capacity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn overflow_keeps_earliest_points() {
    let mut h = Harness::new(10);
    let server = h.connect().await;

    server.send_message(&StreamMessage::points(points(0..15)));
    server.send_message(&StreamMessage::StreamComplete {
        total_points: 15,
        run_id: None,
    });

    let status = h.wait_until(|s| s.phase.is_terminal()).await;
    assert_eq!(status.point_count, 10);
    assert_eq!(status.dropped, 5);
    assert_eq!(status.phase, RunPhase::Complete { total_points: 15 });

    let buffer = h.handle.buffer().read();
    assert_eq!(buffer.sample(9).unwrap().0, [9.0, 4.5, -1.0]);
    assert_eq!(buffer.sample(10), None);
    drop(buffer);
    h.finish().await;
}

// ── robustness ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_frame_between_batches_is_ignored() {
    let mut h = Harness::new(1_000);
    let server = h.connect().await;

    server.send_message(&StreamMessage::points(points(0..5)));
    server.send_text(r#"{"type":"points","data":[{"x":"nan?"}]}"#);
    server.send_message(&StreamMessage::points(points(5..8)));
    server.send_message(&StreamMessage::StreamComplete {
        total_points: 8,
        run_id: None,
    });

    let status = h.wait_until(|s| s.phase.is_terminal()).await;
    assert_eq!(status.point_count, 8);
    assert_eq!(h.session.state(), SessionState::Connected);
    h.finish().await;
}

#[tokio::test]
async fn stale_batches_from_previous_run_are_rejected() {
    let mut h = Harness::new(1_000);
    let server = h.connect().await;

    let first = h.handle.start_run(inputs(1)).await.unwrap();
    server.send_message(&StreamMessage::points(points(0..3)).with_run_id(first.clone()));
    let _ = h.wait_until(|s| s.point_count == 3).await;

    let second = h.handle.start_run(inputs(1)).await.unwrap();
    assert_ne!(first, second);
    server.send_message(&StreamMessage::points(points(3..6)).with_run_id(first.clone()));
    server.send_message(&StreamMessage::StreamComplete {
        total_points: 6,
        run_id: Some(first),
    });
    server.send_message(&StreamMessage::points(points(6..8)).with_run_id(second.clone()));

    let status = h.wait_until(|s| s.point_count == 2).await;
    assert_eq!(status.stale_batches, 1);
    assert_eq!(status.phase, RunPhase::Streaming);
    assert_eq!(status.run_id, Some(second));

    h.finish().await;
}

#[tokio::test]
async fn server_error_marks_run_failed() {
    let mut h = Harness::new(1_000);
    let server = h.connect().await;
    let _run = h.handle.start_run(inputs(3)).await.unwrap();

    server.send_message(&StreamMessage::points(points(0..4)));
    server.send_message(&StreamMessage::Error {
        message: "CUDA out of memory".into(),
    });

    let status = h.wait_until(|s| s.phase.is_terminal()).await;
    assert_eq!(
        status.phase,
        RunPhase::Failed {
            message: "CUDA out of memory".into()
        }
    );
    assert_eq!(status.point_count, 4);
    assert_eq!(h.session.state(), SessionState::Connected);
    h.finish().await;
}

#[tokio::test]
async fn acknowledgements_are_counted() {
    let mut h = Harness::new(1_000);
    let server = h.connect().await;
    let _run = h.handle.start_run(inputs(2)).await.unwrap();

    for _ in 0..2 {
        server.send_message(&StreamMessage::InputAcknowledged {
            status: "received".into(),
            filename: None,
        });
    }
    let status = h.wait_until(|s| s.acknowledged_inputs == 2).await;
    assert_eq!(status.phase, RunPhase::Uploading);
    h.finish().await;
}

// ── run start ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn start_run_while_disconnected_leaves_buffer() {
    let mut h = Harness::new(1_000);
    let server = h.connect().await;
    server.send_message(&StreamMessage::points(points(0..4)));
    let before = h.wait_until(|s| s.point_count == 4).await;

    h.session.disconnect();
    let err = h.handle.start_run(inputs(1)).await.unwrap_err();
    assert_eq!(err, RunError::NotConnected);
    assert_eq!(h.handle.buffer().count(), 4);
    assert_eq!(h.handle.status().generation, before.generation);
    h.handle.shutdown().await;
}

#[tokio::test]
async fn refused_input_interrupts_run() {
    let mut h = Harness::with_config(
        1_000,
        SessionConfig {
            max_message_bytes: 1024,
            ..SessionConfig::default()
        },
    );
    let mut server = h.connect().await;
    let inputs = vec![
        InputUnit::new("small_0.jpg", "image/jpeg", vec![1; 16]),
        InputUnit::new("huge.jpg", "image/jpeg", vec![2; 4096]),
        InputUnit::new("small_1.jpg", "image/jpeg", vec![3; 16]),
    ];

    let err = h.handle.start_run(inputs).await.unwrap_err();
    assert_eq!(err, RunError::Interrupted { sent: 1, total: 3 });

    let status = h.handle.status();
    assert_eq!(
        status.phase,
        RunPhase::Failed {
            message: "upload stopped after sending 1 of 3 inputs".into()
        }
    );
    assert!(status.run_id.is_some());

    // Only the first input went out; neither the rest nor upload_complete did.
    match server.recv_message().await.unwrap() {
        StreamMessage::InputBatch { filename, .. } => assert_eq!(filename, "small_0.jpg"),
        other => panic!("expected image_data, got {other:?}"),
    }
    assert!(h.session.send(&StreamMessage::Ping));
    assert_eq!(server.recv_message().await, Some(StreamMessage::Ping));
    assert_eq!(h.session.state(), SessionState::Connected);
    h.finish().await;
}

#[tokio::test]
async fn new_run_clears_previous_points() {
    let mut h = Harness::new(1_000);
    let server = h.connect().await;
    server.send_message(&StreamMessage::points(points(0..7)));
    let before = h.wait_until(|s| s.point_count == 7).await;

    let run: RunId = h.handle.start_run(inputs(1)).await.unwrap();
    let status = h.handle.status();
    assert_eq!(status.point_count, 0);
    assert_eq!(status.phase, RunPhase::Uploading);
    assert_eq!(status.run_id, Some(run));
    assert!(status.generation > before.generation);
    assert_eq!(h.handle.buffer().count(), 0);
    h.finish().await;
}
