//! Bounded cache of open file handles
//!
//! Opening and closing the same files over and over is expensive. The
//! [`FileHandleCache`] keeps handles that callers are done with open, up to a
//! fixed ceiling, and hands them out again when the same path is requested.
//!
//! A ceiling of `0` is valid: the cache then keeps nothing open and every
//! `open()` goes to the filesystem.

mod cache;

pub use cache::{CachedFile, FileHandleCache, HandleCacheStats, BOOKKEEPING_SIZE};

use std::io;
use std::path::PathBuf;

use fs_arena::ArenaError;
use thiserror::Error;

/// Handle cache result type
pub type HandleCacheResult<T> = Result<T, HandleCacheError>;

/// Errors from handle cache operations
#[derive(Debug, Error)]
pub enum HandleCacheError {
    #[error("arena error: {0}")]
    Arena(#[from] ArenaError),

    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
