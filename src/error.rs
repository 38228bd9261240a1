//! Errors surfaced by the shared cache accessors.

use fs_arena::ArenaError;
use fs_handle_cache::HandleCacheError;
use thiserror::Error;

/// Caching result type
pub type CachingResult<T> = Result<T, CachingError>;

/// Failures creating a cache that has no "absent" state.
#[derive(Debug, Error)]
pub enum CachingError {
    #[error("cannot acquire arena for file handle cache: {0}")]
    Arena(#[from] ArenaError),

    #[error("cannot create file handle cache: {0}")]
    HandleCache(#[from] HandleCacheError),
}
