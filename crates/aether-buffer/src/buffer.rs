//! The fixed-capacity point buffer.
//!
//! Positions and colors live in two parallel `f32` arrays of `3 × capacity`
//! entries, allocated once. Only the prefix `[0, count)` is ever exposed;
//! slots past `count` may hold stale data from a previous run and are never
//! handed to a renderer.

use std::ops::Range;

use aether_core::PointSample;
use tracing::{debug, warn};

use crate::bounds::Bounds;
use crate::errors::{BufferError, Result};

/// Floats per sample in each channel array.
pub const CHANNELS: usize = 3;

/// Result of a single [`PointBuffer::append`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Samples written into the visible range.
    pub written: usize,
    /// Samples discarded because the buffer was full.
    pub dropped: usize,
}

/// Borrowed, render-ready view of the visible range.
#[derive(Clone, Copy, Debug)]
pub struct GeometryView<'a> {
    /// Interleaved `x, y, z` positions, `3 × count` long.
    pub positions: &'a [f32],
    /// Interleaved `r, g, b` colors in `0.0..=1.0`, `3 × count` long.
    pub colors: &'a [f32],
    /// Number of visible samples.
    pub count: usize,
    /// Clear counter at the time of the view.
    pub generation: u64,
    /// Bounds of the visible samples.
    pub bounds: Option<Bounds>,
}

impl GeometryView<'_> {
    /// Positions as raw bytes for a GPU upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.positions)
    }

    /// Colors as raw bytes for a GPU upload.
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.colors)
    }
}

fn zeroed_channel(capacity: usize, len: usize) -> Result<Box<[f32]>> {
    let mut channel = Vec::new();
    channel.try_reserve_exact(len).map_err(|error| {
        warn!(capacity, %error, "point buffer allocation failed");
        BufferError::InvalidCapacity { capacity }
    })?;
    channel.resize(len, 0.0);
    Ok(channel.into_boxed_slice())
}

/// Pre-allocated, append-only point storage.
pub struct PointBuffer {
    positions: Box<[f32]>,
    colors: Box<[f32]>,
    capacity: usize,
    count: usize,
    generation: u64,
    dropped: usize,
    bounds: Option<Bounds>,
}

impl PointBuffer {
    /// Allocate storage for `capacity` samples.
    ///
    /// Fails with [`BufferError::InvalidCapacity`] for a zero capacity or one
    /// whose channel arrays cannot be allocated.
    pub fn allocate(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(BufferError::InvalidCapacity { capacity });
        }
        let len = capacity
            .checked_mul(CHANNELS)
            .ok_or(BufferError::InvalidCapacity { capacity })?;

        debug!(capacity, "allocating point buffer");
        Ok(Self {
            positions: zeroed_channel(capacity, len)?,
            colors: zeroed_channel(capacity, len)?,
            capacity,
            count: 0,
            generation: 0,
            dropped: 0,
            bounds: None,
        })
    }

    /// Append samples after the current visible range.
    ///
    /// Writes at most `capacity - count` samples, earliest first, and drops
    /// the rest. Colors are normalized from `0..=255` to `0.0..=1.0`.
    pub fn append(&mut self, samples: &[PointSample]) -> AppendOutcome {
        let written = samples.len().min(self.remaining());
        let dropped = samples.len() - written;

        let start = self.count * CHANNELS;
        let end = start + written * CHANNELS;
        let positions = self.positions[start..end].chunks_exact_mut(CHANNELS);
        let colors = self.colors[start..end].chunks_exact_mut(CHANNELS);

        for ((pos, col), sample) in positions.zip(colors).zip(&samples[..written]) {
            let p = sample.position();
            pos.copy_from_slice(&p);
            for (dst, src) in col.iter_mut().zip(sample.color()) {
                *dst = f32::from(src) / 255.0;
            }
            self.bounds = Some(match self.bounds {
                Some(mut b) => {
                    b.include(p);
                    b
                }
                None => Bounds::from_point(p),
            });
        }
        self.count += written;

        if dropped > 0 {
            // Only the first overflow of a run is worth a warning; once full,
            // every later batch overflows.
            if self.dropped == 0 {
                warn!(
                    capacity = self.capacity,
                    dropped, "point buffer full, dropping samples"
                );
            } else {
                debug!(dropped, total_dropped = self.dropped + dropped, "point buffer still full");
            }
            self.dropped += dropped;
        }

        AppendOutcome { written, dropped }
    }

    /// The window a renderer may read: `0..count`.
    pub fn visible_range(&self) -> Range<usize> {
        0..self.count
    }

    /// Reset the visible range to empty without touching storage.
    pub fn clear(&mut self) {
        self.count = 0;
        self.dropped = 0;
        self.bounds = None;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Number of visible samples.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Fixed capacity chosen at allocation.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free slots left before appends start dropping.
    pub fn remaining(&self) -> usize {
        self.capacity - self.count
    }

    /// Whether no sample is visible.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether every slot is filled.
    pub fn is_full(&self) -> bool {
        self.count == self.capacity
    }

    /// Samples dropped by overflow since the last clear.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Number of clears performed on this buffer.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Bounds of the visible samples, `None` when empty.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Visible positions, `3 × count` floats.
    pub fn positions(&self) -> &[f32] {
        &self.positions[..self.count * CHANNELS]
    }

    /// Visible normalized colors, `3 × count` floats.
    pub fn colors(&self) -> &[f32] {
        &self.colors[..self.count * CHANNELS]
    }

    /// Render-ready view of the visible range.
    pub fn view(&self) -> GeometryView<'_> {
        GeometryView {
            positions: self.positions(),
            colors: self.colors(),
            count: self.count,
            generation: self.generation,
            bounds: self.bounds,
        }
    }

    /// Position and normalized color of visible sample `index`.
    pub fn sample(&self, index: usize) -> Option<([f32; 3], [f32; 3])> {
        if index >= self.count {
            return None;
        }
        let base = index * CHANNELS;
        let p = &self.positions[base..base + CHANNELS];
        let c = &self.colors[base..base + CHANNELS];
        Some(([p[0], p[1], p[2]], [c[0], c[1], c[2]]))
    }
}

impl std::fmt::Debug for PointBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointBuffer")
            .field("capacity", &self.capacity)
            .field("count", &self.count)
            .field("generation", &self.generation)
            .field("dropped", &self.dropped)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
