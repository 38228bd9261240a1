//! Allocator shared by one or more arenas.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use crate::{ArenaError, ArenaResult};

/// Sentinel for "retain every freed byte".
const UNLIMITED: usize = usize::MAX;

/// Byte-accounting allocator with a bound on retained free memory.
///
/// Freed memory is kept for reuse until `max_free` bytes are retained; the
/// rest is released to the OS. An optional hard `limit` caps the bytes that
/// may be outstanding at once.
#[derive(Debug)]
pub struct Allocator {
    max_free: AtomicUsize,
    limit: Option<usize>,
    state: Mutex<AllocatorState>,
}

#[derive(Debug, Default)]
struct AllocatorState {
    in_use: usize,
    retained: usize,
    released_to_os: usize,
}

impl Allocator {
    /// Create an allocator without a limit that retains all freed memory.
    pub fn new() -> Self {
        Self {
            max_free: AtomicUsize::new(UNLIMITED),
            limit: None,
            state: Mutex::new(AllocatorState::default()),
        }
    }

    /// Create an allocator that refuses to hand out more than `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::new()
        }
    }

    /// Cap the amount of freed memory kept for reuse.
    ///
    /// Memory already retained above the new bound is released immediately.
    pub fn set_max_free(&self, bytes: usize) {
        self.max_free.store(bytes, Ordering::Release);

        let mut state = self.state.lock();
        if state.retained > bytes {
            let excess = state.retained - bytes;
            state.retained = bytes;
            state.released_to_os += excess;
        }
    }

    /// The retained-free bound, or `None` when unbounded.
    pub fn max_free(&self) -> Option<usize> {
        match self.max_free.load(Ordering::Acquire) {
            UNLIMITED => None,
            bytes => Some(bytes),
        }
    }

    /// Hard cap on outstanding bytes, if any.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Bytes currently handed out to arenas.
    pub fn in_use(&self) -> usize {
        self.state.lock().in_use
    }

    /// Freed bytes kept for reuse.
    pub fn retained(&self) -> usize {
        self.state.lock().retained
    }

    /// Total freed bytes given back to the OS over the allocator's lifetime.
    pub fn released_to_os(&self) -> usize {
        self.state.lock().released_to_os
    }

    pub(crate) fn allocate(&self, bytes: usize) -> ArenaResult<()> {
        let mut state = self.state.lock();

        if let Some(limit) = self.limit {
            let available = limit.saturating_sub(state.in_use);
            if bytes > available {
                return Err(ArenaError::Exhausted {
                    requested: bytes,
                    available,
                });
            }
        }

        let reused = bytes.min(state.retained);
        state.retained -= reused;
        state.in_use += bytes;

        trace!(bytes, reused, in_use = state.in_use, "allocator handed out memory");
        Ok(())
    }

    pub(crate) fn free(&self, bytes: usize) {
        let max_free = self.max_free.load(Ordering::Acquire);
        let mut state = self.state.lock();

        state.in_use = state.in_use.saturating_sub(bytes);
        let keep = bytes.min(max_free.saturating_sub(state.retained));
        state.retained += keep;
        state.released_to_os += bytes - keep;

        trace!(bytes, kept = keep, released = bytes - keep, "allocator reclaimed memory");
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}
