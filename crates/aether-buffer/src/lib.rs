//! # aether-buffer
//!
//! Fixed-capacity storage for an incrementally streamed point cloud.
//!
//! The buffer is allocated once, sized for the worst case, and never grows:
//!
//! - [`PointBuffer`]: parallel position/color channels plus a visible count
//! - [`SharedPointBuffer`]: single-writer/many-reader handle for the render loop
//! - [`GeometryView`]: the slice-level contract a renderer consumes each frame
//! - [`Bounds`]: axis-aligned bounds of the visible range, kept incrementally
//!
//! Appending past capacity truncates the batch instead of reallocating; the
//! number of dropped samples is reported in [`AppendOutcome`].

#![deny(unsafe_code)]

pub mod bounds;
pub mod buffer;
pub mod errors;
pub mod shared;

pub use bounds::Bounds;
pub use buffer::{AppendOutcome, CHANNELS, GeometryView, PointBuffer};
pub use errors::{BufferError, Result};
pub use shared::SharedPointBuffer;
