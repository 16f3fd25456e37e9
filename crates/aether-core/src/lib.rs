//! # aether-core
//!
//! Foundation types shared by every Aether crate:
//!
//! - **Branded IDs**: [`RunId`] and [`ConnectionId`] as newtypes over UUID v7 strings
//! - **Points**: [`PointSample`], the unit of data that flows from the wire into the buffer
//! - **Logging**: [`logging::init_subscriber`] and test-time log capture

#![deny(unsafe_code)]

pub mod ids;
pub mod logging;
pub mod point;

pub use ids::{ConnectionId, RunId};
pub use point::PointSample;
