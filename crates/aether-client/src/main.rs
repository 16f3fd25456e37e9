//! # aether-client
//!
//! Command-line streaming client: connects to the reconstruction server,
//! uploads the given inputs as one run and follows the point stream into the
//! buffer until the run ends or Ctrl-C.

#![deny(unsafe_code)]

mod inputs;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use aether_buffer::SharedPointBuffer;
use aether_session::{SessionConfig, SessionManager, WsConnector};
use aether_settings::{AetherSettings, SessionSettings};
use aether_stream::{
    CoordinatorHandle, InputUnit, RunPhase, StreamCoordinator, StreamStatus, spawn_coordinator,
};

/// Log progress every time this many more points arrived.
const PROGRESS_STEP: usize = 10_000;

/// Aether streaming client.
#[derive(Parser, Debug)]
#[command(
    name = "aether-client",
    about = "Stream a point cloud reconstruction from an Aether server"
)]
struct Cli {
    /// WebSocket URL of the reconstruction endpoint (overrides settings).
    #[arg(long)]
    url: Option<String>,

    /// Point buffer capacity (overrides settings).
    #[arg(long)]
    capacity: Option<usize>,

    /// Settings file (defaults to `~/.aether/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log level filter (overrides settings; `RUST_LOG` wins over both).
    #[arg(long)]
    log_level: Option<String>,

    /// Input files uploaded as one run. Without inputs the client only
    /// listens.
    inputs: Vec<PathBuf>,
}

impl Cli {
    fn apply(&self, settings: &mut AetherSettings) {
        if let Some(url) = &self.url {
            settings.session.url.clone_from(url);
        }
        if let Some(capacity) = self.capacity {
            settings.buffer.capacity = capacity;
        }
        if let Some(level) = &self.log_level {
            settings.logging.level.clone_from(level);
        }
    }
}

/// Settings file and env layers, then CLI overrides, validated once.
fn resolve_settings(args: &Cli) -> Result<AetherSettings> {
    let path = args
        .settings
        .clone()
        .unwrap_or_else(aether_settings::settings_path);
    let mut settings = aether_settings::load_layers_from_path(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;
    args.apply(&mut settings);
    settings.validate().context("invalid configuration")?;
    Ok(settings)
}

fn session_config(settings: &SessionSettings) -> SessionConfig {
    SessionConfig {
        auto_reconnect: settings.auto_reconnect,
        reconnect_interval: settings.reconnect_interval(),
        heartbeat_interval: settings.heartbeat_interval(),
        pong_timeout: settings.pong_timeout(),
        ..SessionConfig::new(settings.url.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let settings = resolve_settings(&args)?;

    aether_core::logging::init_subscriber(&settings.logging.level);
    debug!(?settings, "settings loaded");

    let inputs = inputs::load_inputs(&args.inputs)?;
    let buffer = SharedPointBuffer::allocate(settings.buffer.capacity)
        .context("failed to allocate point buffer")?;

    let (session, inbound) = SessionManager::new(WsConnector, session_config(&settings.session));
    let handle = spawn_coordinator(StreamCoordinator::new(session.clone(), buffer), inbound);
    session.connect();

    let outcome = tokio::select! {
        result = drive(&session, &handle, inputs) => result,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            info!("interrupted");
            Ok(())
        }
    };

    session.disconnect();
    let count = handle.buffer().count();
    handle.shutdown().await;
    info!(points = count, "shutdown complete");
    outcome
}

async fn drive(
    session: &SessionManager,
    handle: &CoordinatorHandle,
    inputs: Vec<InputUnit>,
) -> Result<()> {
    let mut state = session.subscribe_state();
    info!(url = %session.config().url, "waiting for connection");
    let _ = state
        .wait_for(|s| s.is_connected())
        .await
        .context("session stopped before connecting")?;

    if inputs.is_empty() {
        info!("no inputs given, listening for batches until ctrl-c");
        return follow(handle.subscribe(), handle.buffer(), false).await;
    }

    let status = handle.subscribe();
    let run = handle.start_run(inputs).await?;
    info!(run_id = %run, "inputs uploaded, waiting for points");
    follow(status, handle.buffer(), true).await
}

/// Log progress until the run ends (or forever when `until_end` is false).
///
/// The current status is handled before waiting, so a run that finished
/// before this was called still returns.
async fn follow(
    mut status: watch::Receiver<StreamStatus>,
    buffer: &SharedPointBuffer,
    until_end: bool,
) -> Result<()> {
    let mut next_report = PROGRESS_STEP;
    let mut last_phase: Option<RunPhase> = None;
    loop {
        let snapshot = status.borrow_and_update().clone();

        if snapshot.point_count >= next_report {
            info!(points = snapshot.point_count, dropped = snapshot.dropped, "streaming");
            next_report = snapshot.point_count + PROGRESS_STEP;
        } else if snapshot.point_count == 0 {
            next_report = PROGRESS_STEP;
        }

        if last_phase.as_ref() != Some(&snapshot.phase) {
            last_phase = Some(snapshot.phase.clone());
            match snapshot.phase {
                RunPhase::Complete { total_points } => {
                    let bounds = buffer.read().bounds();
                    info!(
                        total_points,
                        buffered = snapshot.point_count,
                        dropped = snapshot.dropped,
                        center = ?bounds.map(|b| b.center()),
                        radius = ?bounds.map(|b| b.radius()),
                        "reconstruction complete"
                    );
                    if until_end {
                        return Ok(());
                    }
                }
                RunPhase::Failed { message } => {
                    if until_end {
                        bail!("reconstruction failed: {message}");
                    }
                    warn!(%message, "reconstruction failed");
                }
                RunPhase::Idle | RunPhase::Uploading | RunPhase::Streaming => {}
            }
        }

        status
            .changed()
            .await
            .context("stream coordinator stopped")?;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
