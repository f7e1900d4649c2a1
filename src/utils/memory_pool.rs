//! Frame buffer pool for reducing per-frame allocation
//!
//! Buffers hold one frame's luminance plane. Idle buffers are owned by the
//! pool; a checked-out buffer is owned by a [`BufferLease`], which hands it
//! back when dropped. The pool does not bound how many buffers are out at
//! once: the analysis pipeline's single-flight flag does.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

/// Recycles byte buffers sized for one frame's luminance plane.
///
/// `acquire` and `release` may run on different threads (capture vs.
/// analysis); the idle list sits behind a mutex held only for a push or pop.
#[derive(Debug, Default)]
pub struct FrameBufferPool {
    idle: Mutex<Vec<Vec<u8>>>,
    allocated: AtomicUsize,
    reuses: AtomicUsize,
}

impl FrameBufferPool {
    /// Create an empty pool
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a pool with `count` idle buffers of `size` bytes already allocated
    pub fn with_buffers(count: usize, size: usize) -> Arc<Self> {
        let pool = Self::default();
        {
            let mut idle = pool.lock_idle();
            for _ in 0..count {
                idle.push(vec![0u8; size]);
            }
        }
        pool.allocated.store(count, Ordering::Relaxed);
        Arc::new(pool)
    }

    /// Check out a buffer of exactly `size` bytes.
    ///
    /// An idle buffer is reused (and grown if it is too small); a new one is
    /// allocated only when none is idle. Contents are unspecified.
    pub fn acquire(self: &Arc<Self>, size: usize) -> BufferLease {
        let recycled = self.lock_idle().pop();
        let buffer = match recycled {
            Some(mut buffer) => {
                self.reuses.fetch_add(1, Ordering::Relaxed);
                buffer.resize(size, 0);
                buffer
            }
            None => {
                let total = self.allocated.fetch_add(1, Ordering::Relaxed) + 1;
                trace!(size, total, "Allocated frame buffer");
                vec![0u8; size]
            }
        };
        BufferLease {
            buffer: Some(buffer),
            pool: Arc::clone(self),
        }
    }

    /// Return a buffer to the idle set
    pub fn release(&self, buffer: Vec<u8>) {
        self.lock_idle().push(buffer);
    }

    /// Number of idle buffers
    pub fn idle_count(&self) -> usize {
        self.lock_idle().len()
    }

    /// Snapshot of allocation counters
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocated: self.allocated.load(Ordering::Relaxed),
            idle: self.idle_count(),
            reuses: self.reuses.load(Ordering::Relaxed),
        }
    }

    /// Drop all idle buffers (checked-out leases are unaffected)
    pub fn clear(&self) {
        let mut idle = self.lock_idle();
        let dropped = idle.len();
        idle.clear();
        self.allocated.fetch_sub(dropped, Ordering::Relaxed);
    }

    fn lock_idle(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        // The idle list stays consistent even if a holder panicked mid-push
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Allocation counters for monitoring pool behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Buffers ever allocated and not cleared
    pub allocated: usize,
    /// Buffers currently idle in the pool
    pub idle: usize,
    /// Number of acquisitions served from the idle set
    pub reuses: usize,
}

impl PoolStats {
    /// Buffers currently checked out
    pub fn in_use(&self) -> usize {
        self.allocated.saturating_sub(self.idle)
    }
}

/// A buffer checked out of a [`FrameBufferPool`].
///
/// Dereferences to the byte slice. Dropping the lease returns the buffer to
/// its pool, so every exit path (success, not-found, error, panic) releases it.
#[derive(Debug)]
pub struct BufferLease {
    buffer: Option<Vec<u8>>,
    pool: Arc<FrameBufferPool>,
}

impl BufferLease {
    /// Take the buffer out of the pool for good.
    ///
    /// The pool stops counting it as allocated.
    pub fn detach(mut self) -> Vec<u8> {
        self.pool.allocated.fetch_sub(1, Ordering::Relaxed);
        self.buffer.take().unwrap_or_default()
    }
}

impl Deref for BufferLease {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buffer.as_deref().unwrap_or_default()
    }
}

impl DerefMut for BufferLease {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buffer.as_deref_mut().unwrap_or_default()
    }
}

impl Drop for BufferLease {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.pool.release(buffer);
        }
    }
}
