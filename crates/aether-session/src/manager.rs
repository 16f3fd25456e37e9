//! Connection lifecycle: connect, heartbeat, retry, disconnect.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use aether_core::ConnectionId;
use aether_protocol::{DecodeError, StreamMessage, decode, decode_bytes, encode};

use crate::config::SessionConfig;
use crate::errors::TransportError;
use crate::heartbeat::{Heartbeat, HeartbeatAction};
use crate::state::SessionState;
use crate::transport::{Connection, Connector, Frame};

/// How long a close frame may take before the transport is just dropped.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

#[allow(clippy::cast_possible_truncation)]
fn duration_ms(d: Duration) -> u64 {
    d.as_millis() as u64
}

/// The connection currently owned by the session.
struct Slot {
    epoch: u64,
    id: ConnectionId,
    cancel: CancellationToken,
    outbound: Option<mpsc::UnboundedSender<String>>,
}

/// Mutable control state. Every state transition happens under this lock so
/// a finished or cancelled connection task can never overwrite a newer one.
#[derive(Default)]
struct Control {
    stopped: bool,
    next_epoch: u64,
    slot: Option<Slot>,
}

enum Ending {
    Cancelled,
    Closed,
    Failed(TransportError),
}

struct Inner {
    connector: Arc<dyn Connector>,
    config: SessionConfig,
    state: watch::Sender<SessionState>,
    inbound: mpsc::UnboundedSender<StreamMessage>,
    control: Mutex<Control>,
    retry: Mutex<Option<JoinHandle<()>>>,
    attempts: AtomicU64,
}

/// Owns one logical session with the reconstruction server.
///
/// Cheap to clone; clones share the same connection. Must be used inside a
/// tokio runtime. The background tasks keep the session alive until
/// [`disconnect`](Self::disconnect) is called.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Build a session and the receiver of decoded inbound messages. Nothing
    /// connects until [`connect`](Self::connect).
    pub fn new<C>(connector: C, config: SessionConfig) -> (Self, mpsc::UnboundedReceiver<StreamMessage>)
    where
        C: Connector + 'static,
    {
        Self::with_connector(Arc::new(connector), config)
    }

    /// Same as [`new`](Self::new) for an already shared connector.
    pub fn with_connector(
        connector: Arc<dyn Connector>,
        config: SessionConfig,
    ) -> (Self, mpsc::UnboundedReceiver<StreamMessage>) {
        let (inbound, inbound_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(SessionState::Disconnected);
        let inner = Arc::new(Inner {
            connector,
            config,
            state,
            inbound,
            control: Mutex::new(Control::default()),
            retry: Mutex::new(None),
            attempts: AtomicU64::new(0),
        });
        (Self { inner }, inbound_rx)
    }

    /// Start connecting. Clears a previous `disconnect` and skips the wait
    /// of a pending retry. No-op while an attempt or connection is live.
    pub fn connect(&self) {
        if let Some(pending) = self.inner.retry.lock().take() {
            pending.abort();
        }
        self.inner.start_attempt(true);
    }

    /// Stop the session: no further retries, the pending retry timer and the
    /// live connection are cancelled before this returns. Idempotent.
    pub fn disconnect(&self) {
        let slot = {
            let mut control = self.inner.control.lock();
            control.stopped = true;
            let slot = control.slot.take();
            let _ = self.inner.state.send_if_modified(|state| {
                let changed = *state != SessionState::Disconnected;
                *state = SessionState::Disconnected;
                changed
            });
            slot
        };
        let pending = self.inner.retry.lock().take();
        if let Some(handle) = &pending {
            handle.abort();
        }

        match slot {
            Some(slot) => {
                slot.cancel.cancel();
                info!(connection_id = %slot.id, "session disconnected");
            }
            None if pending.is_some() => info!("pending reconnect cancelled"),
            None => debug!("disconnect on idle session"),
        }
    }

    /// Queue one message for the writer. Returns `false` (and logs) when the
    /// session is not connected, the message has no wire form, or its frame
    /// exceeds [`SessionConfig::max_message_bytes`].
    pub fn send(&self, message: &StreamMessage) -> bool {
        let text = match encode(message) {
            Ok(text) => text,
            Err(error) => {
                warn!(kind = message.kind(), %error, "message not encodable, dropped");
                return false;
            }
        };
        let limit = self.inner.config.max_message_bytes;
        if text.len() > limit {
            warn!(
                kind = message.kind(),
                bytes = text.len(),
                limit,
                "message exceeds size limit, dropped"
            );
            return false;
        }

        let control = self.inner.control.lock();
        let Some(outbound) = control.slot.as_ref().and_then(|s| s.outbound.as_ref()) else {
            warn!(
                kind = message.kind(),
                state = %self.state(),
                "send while not connected, message dropped"
            );
            return false;
        };
        if outbound.send(text).is_err() {
            warn!(kind = message.kind(), "connection writer gone, message dropped");
            return false;
        }
        true
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Total connection attempts since construction.
    pub fn connect_attempts(&self) -> u64 {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// Whether a reconnect timer is armed.
    pub fn is_retry_pending(&self) -> bool {
        self.inner
            .retry
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("url", &self.inner.config.url)
            .field("state", &self.state())
            .field("attempts", &self.connect_attempts())
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn start_attempt(self: &Arc<Self>, explicit: bool) {
        let (epoch, id, cancel) = {
            let mut control = self.control.lock();
            if explicit {
                control.stopped = false;
            } else if control.stopped {
                debug!("retry skipped, session stopped");
                return;
            }
            if let Some(slot) = &control.slot {
                debug!(connection_id = %slot.id, "connect ignored, connection already active");
                return;
            }

            control.next_epoch += 1;
            let epoch = control.next_epoch;
            let id = ConnectionId::new();
            let cancel = CancellationToken::new();
            control.slot = Some(Slot {
                epoch,
                id: id.clone(),
                cancel: cancel.clone(),
                outbound: None,
            });
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let _ = self.state.send_replace(SessionState::Connecting);
            info!(connection_id = %id, attempt, url = %self.config.url, "connecting");
            (epoch, id, cancel)
        };

        let inner = Arc::clone(self);
        let _ = tokio::spawn(async move { inner.run_connection(epoch, id, cancel).await });
    }

    async fn run_connection(self: Arc<Self>, epoch: u64, id: ConnectionId, cancel: CancellationToken) {
        let opened = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(connection_id = %id, "connect attempt abandoned");
                return;
            }
            result = self.connector.connect(&self.config.url) => result,
        };

        let ending = match opened {
            Ok(connection) => self.drive(epoch, &id, &cancel, connection).await,
            Err(error) => Ending::Failed(error),
        };
        self.finish(epoch, &id, ending);
    }

    async fn drive(
        &self,
        epoch: u64,
        id: &ConnectionId,
        cancel: &CancellationToken,
        connection: Connection,
    ) -> Ending {
        let Connection {
            mut sink,
            mut stream,
        } = connection;
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        if !self.mark_connected(epoch, outbound) {
            let _ = tokio::time::timeout(CLOSE_GRACE, sink.send(Frame::Close)).await;
            return Ending::Cancelled;
        }
        info!(connection_id = %id, "connected");

        let mut heartbeat = Heartbeat::new(self.config.heartbeat_interval, self.config.pong_timeout);
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    let _ = tokio::time::timeout(CLOSE_GRACE, sink.send(Frame::Close)).await;
                    return Ending::Cancelled;
                }
                frame = stream.next() => match frame {
                    Some(Ok(Frame::Text(text))) => self.deliver(id, decode(&text), &mut heartbeat),
                    Some(Ok(Frame::Binary(bytes))) => self.deliver(id, decode_bytes(&bytes), &mut heartbeat),
                    Some(Ok(Frame::Close)) | None => return Ending::Closed,
                    Some(Err(error)) => return Ending::Failed(error),
                },
                Some(text) = outbound_rx.recv() => {
                    if let Err(error) = sink.send(Frame::Text(text)).await {
                        return Ending::Failed(error);
                    }
                }
                action = heartbeat.tick() => match action {
                    HeartbeatAction::SendPing => {
                        let ping = encode(&StreamMessage::Ping).map_err(|e| TransportError::Send(e.to_string()));
                        let sent = match ping {
                            Ok(text) => sink.send(Frame::Text(text)).await,
                            Err(error) => Err(error),
                        };
                        if let Err(error) = sent {
                            return Ending::Failed(error);
                        }
                        debug!(connection_id = %id, "heartbeat ping sent");
                    }
                    HeartbeatAction::TimedOut => {
                        let timeout_ms = heartbeat.pong_timeout().map_or(0, duration_ms);
                        warn!(connection_id = %id, timeout_ms, "heartbeat timed out, closing");
                        return Ending::Failed(TransportError::PongTimeout { timeout_ms });
                    }
                },
            }
        }
    }

    fn mark_connected(&self, epoch: u64, outbound: mpsc::UnboundedSender<String>) -> bool {
        let mut control = self.control.lock();
        match control.slot.as_mut() {
            Some(slot) if slot.epoch == epoch => {
                slot.outbound = Some(outbound);
                let _ = self.state.send_replace(SessionState::Connected);
                true
            }
            _ => false,
        }
    }

    fn deliver(
        &self,
        id: &ConnectionId,
        decoded: Result<StreamMessage, DecodeError>,
        heartbeat: &mut Heartbeat,
    ) {
        let message = match decoded {
            Ok(StreamMessage::Unknown) => {
                debug!(connection_id = %id, "ignoring frame with unrecognized type");
                return;
            }
            Ok(message) => message,
            Err(error) => {
                warn!(connection_id = %id, %error, "dropping malformed frame");
                return;
            }
        };

        if message == StreamMessage::Pong {
            heartbeat.record_pong();
        }
        if self.inbound.send(message).is_err() {
            debug!(connection_id = %id, "inbound receiver dropped, message discarded");
        }
    }

    fn finish(self: &Arc<Self>, epoch: u64, id: &ConnectionId, ending: Ending) {
        let mut control = self.control.lock();
        if !control.slot.as_ref().is_some_and(|slot| slot.epoch == epoch) {
            debug!(connection_id = %id, "superseded connection ended");
            return;
        }
        control.slot = None;

        let state = match &ending {
            Ending::Cancelled => SessionState::Disconnected,
            Ending::Closed => {
                info!(connection_id = %id, "connection closed");
                SessionState::Disconnected
            }
            Ending::Failed(error) => {
                warn!(connection_id = %id, %error, "connection failed");
                SessionState::Errored
            }
        };
        let _ = self.state.send_replace(state);

        if control.stopped || matches!(ending, Ending::Cancelled) {
            return;
        }
        if self.config.auto_reconnect {
            self.arm_retry();
        } else {
            debug!("auto-reconnect disabled, staying {state}");
        }
    }

    fn arm_retry(self: &Arc<Self>) {
        let delay = self.config.reconnect_interval;
        info!(delay_ms = duration_ms(delay), "reconnect scheduled");

        let inner = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = inner.retry.lock().take();
            inner.start_attempt(false);
        });
        if let Some(previous) = self.retry.lock().replace(handle) {
            previous.abort();
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
