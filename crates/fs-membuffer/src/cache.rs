//! Membuffer cache construction and data path.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use fs_arena::Arena;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::segment::Segment;
use crate::{MembufferError, MembufferResult};

/// Directory bytes accounted per indexed entry.
pub const ENTRY_SIZE: usize = 64;

/// Bookkeeping bytes reserved per segment.
pub const SEGMENT_HEADER_SIZE: usize = 256;

/// Upper bound on segment count for thread-safe caches.
pub const MAX_SEGMENT_COUNT: usize = 64;

/// Smallest total budget worth a segment of its own.
pub const MIN_SEGMENT_SIZE: usize = 1024 * 1024;

/// Shared, sharded cache of byte buffers.
#[derive(Debug)]
pub struct MembufferCache {
    segments: Vec<Mutex<Segment>>,
    total_size: u64,
    directory_size: u64,
    thread_safe: bool,
    hits: AtomicU64,
    misses: AtomicU64,
    /// Holds the directory and segment header reservations
    _arena: Arena,
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembufferStats {
    pub entries: usize,
    pub used_bytes: usize,
    pub hits: u64,
    pub misses: u64,
}

impl MembufferCache {
    /// Build a cache of `total_size` bytes, `directory_size` of which index it.
    ///
    /// A cache that is not `thread_safe` uses a single segment.
    ///
    /// A directory too small to index one entry per segment is raised to
    /// that minimum, leaving every segment at least one byte of data space.
    ///
    /// # Errors
    /// * `InvalidSize` - a size does not fit the address space
    /// * `OutOfMemory` - the arena ran dry; it has been cleared
    pub fn create(
        mut arena: Arena,
        total_size: u64,
        directory_size: u64,
        thread_safe: bool,
    ) -> MembufferResult<Self> {
        let invalid = |reason: &'static str| MembufferError::InvalidSize {
            total_size,
            directory_size,
            reason,
        };

        let total = usize::try_from(total_size).map_err(|_| invalid("exceeds address space"))?;
        let directory =
            usize::try_from(directory_size).map_err(|_| invalid("exceeds address space"))?;

        let segment_count = segment_count_for(total, thread_safe);
        // Undersized directories are raised to one entry per segment
        let entries_per_segment = (directory / ENTRY_SIZE / segment_count).max(1);
        let directory_bytes = entries_per_segment * ENTRY_SIZE * segment_count;
        let data_per_segment = (total.saturating_sub(directory_bytes) / segment_count).max(1);

        let mut segments = Vec::with_capacity(segment_count);
        for index in 0..segment_count {
            let bytes = SEGMENT_HEADER_SIZE + entries_per_segment * ENTRY_SIZE;
            if let Err(source) = arena.reserve(bytes) {
                warn!(
                    segment = index,
                    segment_count,
                    error = %source,
                    "membuffer construction ran out of memory, releasing partial allocation"
                );
                arena.clear();
                return Err(MembufferError::OutOfMemory {
                    segment: index,
                    source,
                });
            }
            segments.push(Mutex::new(Segment::new(data_per_segment, entries_per_segment)));
        }

        debug!(
            total_size,
            directory_size,
            segment_count,
            entries_per_segment,
            thread_safe,
            "membuffer cache created"
        );

        Ok(Self {
            segments,
            total_size,
            directory_size,
            thread_safe,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            _arena: arena,
        })
    }

    /// Look up a copy of the buffer stored under `key`.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let found = self.segment(key).lock().get(key).map(<[u8]>::to_vec);
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store `value` under `key`. Returns false if the value is too large to cache.
    pub fn set(&self, key: &[u8], value: &[u8]) -> bool {
        self.segment(key).lock().insert(key, value)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.segment(key).lock().contains(key)
    }

    pub fn remove(&self, key: &[u8]) -> bool {
        self.segment(key).lock().remove(key)
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn directory_size(&self) -> u64 {
        self.directory_size
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_thread_safe(&self) -> bool {
        self.thread_safe
    }

    pub fn stats(&self) -> MembufferStats {
        let (entries, used_bytes) = self.segments.iter().fold((0, 0), |(n, used), segment| {
            let segment = segment.lock();
            (n + segment.len(), used + segment.used())
        });

        MembufferStats {
            entries,
            used_bytes,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn segment(&self, key: &[u8]) -> &Mutex<Segment> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        // Segment count is a power of two
        let index = (hasher.finish() as usize) & (self.segments.len() - 1);
        &self.segments[index]
    }
}

/// Largest power of two not above `total / MIN_SEGMENT_SIZE`, clamped to
/// `1..=MAX_SEGMENT_COUNT`.
fn segment_count_for(total: usize, thread_safe: bool) -> usize {
    if !thread_safe {
        return 1;
    }

    let wanted = (total / MIN_SEGMENT_SIZE).clamp(1, MAX_SEGMENT_COUNT);
    1 << (usize::BITS - 1 - wanted.leading_zeros())
}
