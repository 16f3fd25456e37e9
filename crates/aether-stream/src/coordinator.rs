//! Routes inbound messages into the buffer and drives runs.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use aether_buffer::SharedPointBuffer;
use aether_core::{PointSample, RunId};
use aether_protocol::StreamMessage;
use aether_session::SessionManager;

use crate::errors::RunError;
use crate::input::InputUnit;
use crate::status::{RunPhase, StreamStatus};

/// Binds one session to one buffer.
///
/// The coordinator is the only writer of the buffer. It is not `Sync`-shared;
/// [`spawn_coordinator`](crate::spawn_coordinator) gives it a task of its own.
#[derive(Debug)]
pub struct StreamCoordinator {
    session: SessionManager,
    buffer: SharedPointBuffer,
    status: watch::Sender<StreamStatus>,
    active_run: Option<RunId>,
}

impl StreamCoordinator {
    /// Coordinator over `session` writing into `buffer`.
    pub fn new(session: SessionManager, buffer: SharedPointBuffer) -> Self {
        let initial = StreamStatus {
            generation: buffer.read().generation(),
            point_count: buffer.count(),
            ..StreamStatus::default()
        };
        let (status, _) = watch::channel(initial);
        Self {
            session,
            buffer,
            status,
            active_run: None,
        }
    }

    /// Apply one inbound message.
    pub fn handle_message(&mut self, message: StreamMessage) {
        match message {
            StreamMessage::PointBatch { data, run_id } => self.on_batch(&data, run_id.as_ref()),
            StreamMessage::StreamComplete {
                total_points,
                run_id,
            } => self.on_complete(total_points, run_id.as_ref()),
            StreamMessage::Error { message } => {
                warn!(run_id = ?self.active_run, %message, "server reported run failure");
                self.status.send_modify(|s| s.phase = RunPhase::Failed { message });
            }
            StreamMessage::InputAcknowledged { status, filename } => {
                debug!(%status, ?filename, "input acknowledged");
                self.status.send_modify(|s| s.acknowledged_inputs += 1);
            }
            other => debug!(kind = other.kind(), "ignoring message"),
        }
    }

    fn is_stale(&self, tag: Option<&RunId>) -> bool {
        tag.is_some_and(|tag| self.active_run.as_ref() != Some(tag))
    }

    fn on_batch(&mut self, data: &[PointSample], tag: Option<&RunId>) {
        if self.is_stale(tag) {
            debug!(batch_run = ?tag, active_run = ?self.active_run, points = data.len(), "rejecting stale batch");
            self.status.send_modify(|s| s.stale_batches += 1);
            return;
        }

        let outcome = self.buffer.append(data);
        let count = self.buffer.count();
        debug!(
            written = outcome.written,
            dropped = outcome.dropped,
            count,
            "batch appended"
        );
        self.status.send_modify(|s| {
            s.point_count = count;
            s.dropped += outcome.dropped;
            if matches!(s.phase, RunPhase::Idle | RunPhase::Uploading) {
                s.phase = RunPhase::Streaming;
            }
        });
    }

    fn on_complete(&mut self, total_points: u64, tag: Option<&RunId>) {
        if self.is_stale(tag) {
            debug!(batch_run = ?tag, active_run = ?self.active_run, "ignoring completion of stale run");
            return;
        }
        let count = self.buffer.count();
        info!(run_id = ?self.active_run, total_points, count, "run complete");
        self.status
            .send_modify(|s| s.phase = RunPhase::Complete { total_points });
    }

    /// Start a run: clear the buffer, then send every input followed by the
    /// upload-complete signal.
    ///
    /// Fails with [`RunError::NotConnected`] before touching the buffer when
    /// the session is down.
    pub fn begin_run(&mut self, inputs: &[InputUnit]) -> Result<RunId, RunError> {
        if !self.session.state().is_connected() {
            warn!(state = %self.session.state(), "cannot start run, session not connected");
            return Err(RunError::NotConnected);
        }

        let run = RunId::new();
        let generation = self.buffer.clear();
        self.active_run = Some(run.clone());
        self.status.send_modify(|s| {
            s.run_id = Some(run.clone());
            s.phase = RunPhase::Uploading;
            s.point_count = 0;
            s.dropped = 0;
            s.generation = generation;
            s.acknowledged_inputs = 0;
        });
        info!(run_id = %run, inputs = inputs.len(), generation, "run started");

        let total = inputs.len();
        for (sent, input) in inputs.iter().enumerate() {
            if !self.session.send(&input.to_message(&run)) {
                return Err(self.interrupt(sent, total));
            }
        }
        let complete = StreamMessage::upload_complete(total as u64).with_run_id(run.clone());
        if !self.session.send(&complete) {
            return Err(self.interrupt(total, total));
        }
        debug!(run_id = %run, "upload complete sent");
        Ok(run)
    }

    fn interrupt(&mut self, sent: usize, total: usize) -> RunError {
        let error = RunError::Interrupted { sent, total };
        self.status.send_modify(|s| {
            s.phase = RunPhase::Failed {
                message: error.to_string(),
            };
        });
        error
    }

    /// Current status snapshot.
    pub fn status(&self) -> StreamStatus {
        self.status.borrow().clone()
    }

    /// Watch status changes.
    pub fn subscribe(&self) -> watch::Receiver<StreamStatus> {
        self.status.subscribe()
    }

    /// The buffer, for readers.
    pub fn buffer(&self) -> &SharedPointBuffer {
        &self.buffer
    }

    /// The active run, if any.
    pub fn active_run(&self) -> Option<&RunId> {
        self.active_run.as_ref()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
