//! The coordinator task and its handle.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use aether_buffer::SharedPointBuffer;
use aether_core::RunId;
use aether_protocol::StreamMessage;

use crate::coordinator::StreamCoordinator;
use crate::errors::RunError;
use crate::input::InputUnit;
use crate::status::StreamStatus;

enum Command {
    StartRun {
        inputs: Vec<InputUnit>,
        reply: oneshot::Sender<Result<RunId, RunError>>,
    },
}

/// Handle to a running coordinator task.
///
/// Dropping the handle stops the task once it next wakes.
#[derive(Debug)]
pub struct CoordinatorHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<StreamStatus>,
    buffer: SharedPointBuffer,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StartRun { inputs, .. } => f
                .debug_struct("StartRun")
                .field("inputs", &inputs.len())
                .finish_non_exhaustive(),
        }
    }
}

/// Run `coordinator` on its own task, fed by the session's inbound receiver.
///
/// Inbound messages and commands are handled one at a time, so buffer writes
/// and run starts never interleave.
pub fn spawn_coordinator(
    coordinator: StreamCoordinator,
    inbound: mpsc::UnboundedReceiver<StreamMessage>,
) -> CoordinatorHandle {
    let (commands, command_rx) = mpsc::channel(16);
    let status = coordinator.subscribe();
    let buffer = coordinator.buffer().clone();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run(coordinator, inbound, command_rx, cancel.clone()));
    CoordinatorHandle {
        commands,
        status,
        buffer,
        cancel,
        task,
    }
}

async fn run(
    mut coordinator: StreamCoordinator,
    mut inbound: mpsc::UnboundedReceiver<StreamMessage>,
    mut commands: mpsc::Receiver<Command>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            command = commands.recv() => match command {
                Some(Command::StartRun { inputs, reply }) => {
                    let _ = reply.send(coordinator.begin_run(&inputs));
                }
                None => {
                    debug!("coordinator handle dropped");
                    break;
                }
            },
            message = inbound.recv() => match message {
                Some(message) => coordinator.handle_message(message),
                None => {
                    debug!("inbound channel closed");
                    break;
                }
            },
        }
    }
    info!(count = coordinator.buffer().count(), "stream coordinator stopped");
}

impl CoordinatorHandle {
    /// Start a run with `inputs`.
    pub async fn start_run(&self, inputs: Vec<InputUnit>) -> Result<RunId, RunError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::StartRun { inputs, reply })
            .await
            .map_err(|_| RunError::Closed)?;
        rx.await.map_err(|_| RunError::Closed)?
    }

    /// Watch status changes.
    pub fn subscribe(&self) -> watch::Receiver<StreamStatus> {
        self.status.clone()
    }

    /// Current status snapshot.
    pub fn status(&self) -> StreamStatus {
        self.status.borrow().clone()
    }

    /// The buffer, for readers such as a renderer.
    pub fn buffer(&self) -> &SharedPointBuffer {
        &self.buffer
    }

    /// Stop the task and wait for it to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
