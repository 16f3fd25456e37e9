//! Shared handle between the stream writer and the render loop.
//!
//! Exactly one writer (the stream coordinator) appends and clears; any number
//! of readers take a read guard once per frame. The write section is the
//! O(batch) copy, so a reader never waits on network I/O. The visible count is
//! also mirrored into an atomic so a frame loop can poll it without locking.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use aether_core::PointSample;
use parking_lot::{RwLock, RwLockReadGuard};

use crate::buffer::{AppendOutcome, PointBuffer};
use crate::errors::Result;

/// Cloneable single-writer/many-reader handle to a [`PointBuffer`].
#[derive(Clone)]
pub struct SharedPointBuffer {
    inner: Arc<RwLock<PointBuffer>>,
    count: Arc<AtomicUsize>,
}

impl SharedPointBuffer {
    /// Wrap an already allocated buffer.
    pub fn new(buffer: PointBuffer) -> Self {
        let count = buffer.count();
        Self {
            inner: Arc::new(RwLock::new(buffer)),
            count: Arc::new(AtomicUsize::new(count)),
        }
    }

    /// Allocate and wrap a buffer of `capacity` samples.
    pub fn allocate(capacity: usize) -> Result<Self> {
        PointBuffer::allocate(capacity).map(Self::new)
    }

    /// Append a batch and publish the new count.
    pub fn append(&self, samples: &[PointSample]) -> AppendOutcome {
        let mut buffer = self.inner.write();
        let outcome = buffer.append(samples);
        self.count.store(buffer.count(), Ordering::Release);
        outcome
    }

    /// Clear the buffer and return its new generation.
    pub fn clear(&self) -> u64 {
        let mut buffer = self.inner.write();
        buffer.clear();
        self.count.store(0, Ordering::Release);
        buffer.generation()
    }

    /// Lock-free snapshot of the visible count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Read guard for one frame's worth of rendering.
    pub fn read(&self) -> RwLockReadGuard<'_, PointBuffer> {
        self.inner.read()
    }
}

impl std::fmt::Debug for SharedPointBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedPointBuffer")
            .field("count", &self.count())
            .finish_non_exhaustive()
    }
}
