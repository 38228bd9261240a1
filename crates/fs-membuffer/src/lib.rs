//! Sharded in-memory byte buffer cache
//!
//! A [`MembufferCache`] holds opaque byte content keyed by opaque byte keys.
//! The total byte budget is split into a power-of-two number of segments,
//! each guarded by its own lock, so concurrent readers and writers touching
//! different keys rarely contend.
//!
//! ## Sizing
//!
//! Two budgets are given at construction:
//! - `total_size`: all memory the cache may use, directory included
//! - `directory_size`: the part of `total_size` set aside for the index
//!
//! The directory is divided evenly between segments at [`ENTRY_SIZE`] bytes
//! per entry, which fixes the number of entries each segment may index.
//! Every segment indexes at least one entry, even when that overshoots a
//! tiny directory budget. The remaining budget is split evenly as segment
//! data space, at least one byte per segment.
//!
//! Directory and segment headers are reserved from the [`Arena`] handed to
//! [`MembufferCache::create`]. If the arena runs dry part-way through, it is
//! cleared before the error is returned.

mod cache;
mod segment;

pub use cache::{
    MembufferCache, MembufferStats, ENTRY_SIZE, MAX_SEGMENT_COUNT, MIN_SEGMENT_SIZE,
    SEGMENT_HEADER_SIZE,
};

use fs_arena::ArenaError;
use thiserror::Error;

/// Membuffer result type
pub type MembufferResult<T> = Result<T, MembufferError>;

/// Errors from membuffer construction
#[derive(Debug, Error)]
pub enum MembufferError {
    #[error("invalid cache size (total {total_size}, directory {directory_size}): {reason}")]
    InvalidSize {
        total_size: u64,
        directory_size: u64,
        reason: &'static str,
    },

    #[error("out of memory while allocating segment {segment}")]
    OutOfMemory {
        segment: usize,
        #[source]
        source: ArenaError,
    },
}
