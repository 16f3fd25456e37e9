//! # aether-stream
//!
//! Binds one session to one point buffer for the lifetime of the client.
//!
//! [`StreamCoordinator`] is the only writer of the buffer. Inbound `points`
//! batches are appended in arrival order, `reconstruction_complete` and
//! `error` end the run without touching buffered points, and
//! [`StreamCoordinator::begin_run`] clears the buffer before the first frame
//! of a new run is sent. Runs are tagged with a [`RunId`](aether_core::RunId);
//! batches tagged with any other run are rejected as stale.
//!
//! [`spawn_coordinator`] moves the coordinator onto its own task and returns
//! a [`CoordinatorHandle`].

#![deny(unsafe_code)]

pub mod coordinator;
pub mod errors;
pub mod input;
pub mod status;
pub mod task;

pub use coordinator::StreamCoordinator;
pub use errors::RunError;
pub use input::InputUnit;
pub use status::{RunPhase, StreamStatus};
pub use task::{CoordinatorHandle, spawn_coordinator};
