//! The engine seam used by the cache registry.
//!
//! A [`CacheBackend`] supplies the three primitives the registry consumes:
//! arena acquisition and the two cache constructors. The provided methods
//! go straight to `fs-arena`, `fs-membuffer` and `fs-handle-cache`;
//! [`DefaultBackend`] uses them unchanged.

use std::sync::Arc;

use fs_arena::{Allocator, Arena, ArenaResult};
use fs_handle_cache::{FileHandleCache, HandleCacheResult};
use fs_membuffer::{MembufferCache, MembufferResult};

pub trait CacheBackend: Send + Sync {
    /// Create an arena over a fresh allocator, optionally capping the freed
    /// memory that allocator retains.
    fn acquire_arena(&self, max_free: Option<usize>) -> ArenaResult<Arena> {
        let allocator = Allocator::new();
        if let Some(bytes) = max_free {
            allocator.set_max_free(bytes);
        }
        Arena::new(Arc::new(allocator))
    }

    fn create_membuffer(
        &self,
        arena: Arena,
        total_size: u64,
        directory_size: u64,
        thread_safe: bool,
    ) -> MembufferResult<MembufferCache> {
        MembufferCache::create(arena, total_size, directory_size, thread_safe)
    }

    fn create_file_handle_cache(
        &self,
        arena: Arena,
        max_handles: usize,
        thread_safe: bool,
    ) -> HandleCacheResult<FileHandleCache> {
        FileHandleCache::create(arena, max_handles, thread_safe)
    }
}

/// Backend wired to the real engines.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBackend;

impl CacheBackend for DefaultBackend {}
