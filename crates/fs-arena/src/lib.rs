//! Scoped memory arenas
//!
//! An [`Arena`] draws memory from a shared [`Allocator`] and gives all of it
//! back at once when cleared or dropped. The allocator keeps freed memory
//! around for reuse up to a configurable `max_free` bound; anything beyond
//! that bound is handed back to the operating system.
//!
//! Memory is tracked by byte count. Cache engines reserve their fixed
//! bookkeeping structures here so a construction that runs out of memory
//! part-way can release everything it already took with a single `clear()`.

mod allocator;
mod arena;

pub use allocator::Allocator;
pub use arena::{Arena, ARENA_HEADER_SIZE};

use thiserror::Error;

/// Arena result type
pub type ArenaResult<T> = Result<T, ArenaError>;

/// Errors from arena operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
    #[error("allocator exhausted: requested {requested} bytes, {available} available")]
    Exhausted { requested: usize, available: usize },
}
