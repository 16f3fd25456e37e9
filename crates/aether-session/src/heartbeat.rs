//! Heartbeat ping scheduling and optional pong liveness.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// What the connection task should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatAction {
    /// Write a ping.
    SendPing,
    /// A ping went unanswered for the whole timeout; drop the connection.
    TimedOut,
}

/// Per-connection heartbeat state.
///
/// The first tick fires one full period after construction. Ticks missed
/// while the task was busy are delayed, not bunched. With a pong timeout
/// set, the deadline runs from the oldest unanswered ping, independent of
/// the ping period.
#[derive(Debug)]
pub struct Heartbeat {
    interval: Interval,
    pong_timeout: Option<Duration>,
    unanswered_since: Option<Instant>,
}

impl Heartbeat {
    /// Start a heartbeat for a freshly opened connection.
    pub fn new(period: Duration, pong_timeout: Option<Duration>) -> Self {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            pong_timeout,
            unanswered_since: None,
        }
    }

    /// Wait for the next ping tick or the pong deadline, whichever is first.
    /// Cancel-safe.
    pub async fn tick(&mut self) -> HeartbeatAction {
        let deadline = self
            .unanswered_since
            .zip(self.pong_timeout)
            .map(|(sent, timeout)| sent + timeout);

        tokio::select! {
            biased;
            () = expire(deadline) => HeartbeatAction::TimedOut,
            _ = self.interval.tick() => {
                if self.pong_timeout.is_some() && self.unanswered_since.is_none() {
                    self.unanswered_since = Some(Instant::now());
                }
                HeartbeatAction::SendPing
            }
        }
    }

    /// Note that the server answered.
    pub fn record_pong(&mut self) {
        self.unanswered_since = None;
    }

    /// Whether a ping is still waiting for its pong.
    pub fn awaiting_pong(&self) -> bool {
        self.unanswered_since.is_some()
    }

    /// The configured pong timeout.
    pub fn pong_timeout(&self) -> Option<Duration> {
        self.pong_timeout
    }
}

async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
