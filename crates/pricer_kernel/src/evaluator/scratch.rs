//! Thread-local scratch buffers for replay.
//!
//! Each replay needs two `f64` buffers: resolved inputs and node values.
//! Workers keep returned buffers in a per-thread free list so a batch of
//! replays on one worker allocates once.
//!
//! # Example
//!
//! ```rust,ignore
//! let pool = ScratchPool::new();
//! let mut values = pool.get_buffer(1000);
//! values[0] = 1.0;
//! drop(values);
//!
//! let _again = pool.get_buffer(500);
//! assert!(pool.stats().reused >= 1);
//! ```

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};

/// Per-thread buffer usage counters.
#[cfg_attr(not(test), allow(dead_code))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ScratchStats {
    /// Buffers currently idle in the pool
    pub(crate) idle: usize,
    /// Requests served from an idle buffer
    pub(crate) reused: usize,
    /// Requests that allocated
    pub(crate) allocated: usize,
}

#[derive(Default)]
struct ScratchState {
    idle: Vec<Vec<f64>>,
    stats: ScratchStats,
}

impl ScratchState {
    fn take(&mut self, len: usize) -> Vec<f64> {
        // Smallest idle buffer that fits
        let best = self
            .idle
            .iter()
            .enumerate()
            .filter(|(_, buf)| buf.capacity() >= len)
            .min_by_key(|(_, buf)| buf.capacity())
            .map(|(idx, _)| idx);

        match best {
            Some(idx) => {
                self.stats.reused += 1;
                let buf = self.idle.swap_remove(idx);
                self.stats.idle = self.idle.len();
                buf
            }
            None => {
                self.stats.allocated += 1;
                Vec::with_capacity(len)
            }
        }
    }

    fn give_back(&mut self, mut buf: Vec<f64>) {
        buf.clear();
        self.idle.push(buf);
        self.stats.idle = self.idle.len();
    }
}

thread_local! {
    static SCRATCH: RefCell<ScratchState> = RefCell::new(ScratchState::default());
}

/// Handle to the current thread's scratch buffers. Zero-sized.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ScratchPool;

impl ScratchPool {
    #[inline]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Zero-filled buffer of exactly `len` elements.
    pub(crate) fn get_buffer(&self, len: usize) -> ScratchBuffer {
        let mut buf = SCRATCH.with(|state| state.borrow_mut().take(len));
        buf.resize(len, 0.0);
        ScratchBuffer { inner: Some(buf) }
    }

    /// Counters for the current thread.
    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) fn stats(&self) -> ScratchStats {
        SCRATCH.with(|state| state.borrow().stats)
    }
}

/// Buffer that returns to the current thread's pool on drop.
pub(crate) struct ScratchBuffer {
    inner: Option<Vec<f64>>,
}

impl Deref for ScratchBuffer {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        self.inner.as_deref().unwrap_or(&[])
    }
}

impl DerefMut for ScratchBuffer {
    fn deref_mut(&mut self) -> &mut [f64] {
        self.inner.as_deref_mut().unwrap_or(&mut [])
    }
}

impl Drop for ScratchBuffer {
    fn drop(&mut self) {
        if let Some(buf) = self.inner.take() {
            // The thread-local may already be gone during thread teardown.
            let _ = SCRATCH.try_with(|state| state.borrow_mut().give_back(buf));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_is_zeroed_and_sized() {
        let pool = ScratchPool::new();
        let mut buf = pool.get_buffer(8);
        assert_eq!(buf.len(), 8);
        assert!(buf.iter().all(|&v| v == 0.0));
        buf[3] = 1.0;
        drop(buf);

        let buf = pool.get_buffer(4);
        assert_eq!(buf.len(), 4);
        assert!(buf.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_returned_buffer_is_reused() {
        let pool = ScratchPool::new();
        let before = pool.stats();
        drop(pool.get_buffer(64));
        let _buf = pool.get_buffer(32);
        let after = pool.stats();
        assert!(after.reused > before.reused);
    }

    #[test]
    fn test_pools_are_per_thread() {
        let pool = ScratchPool::new();
        drop(pool.get_buffer(16));
        let idle_here = pool.stats().idle;
        assert!(idle_here >= 1);

        let idle_there = std::thread::spawn(|| ScratchPool::new().stats().idle)
            .join()
            .unwrap();
        assert_eq!(idle_there, 0);
    }
}
