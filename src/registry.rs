//! Configuration store plus the two write-once cache slots.
//!
//! ## Slot discipline
//!
//! Each slot goes from empty to populated at most once. Accessors build a
//! candidate outside any lock and publish it with a set-if-empty; when two
//! threads race on an empty slot both may build, the first publish wins and
//! the other instance is dropped, releasing its arena. Reads of a populated
//! slot never block and never rebuild.
//!
//! ## Configure before first use
//!
//! A slot is built from the configuration current at the moment it is first
//! populated. Replacing the configuration afterwards changes what
//! [`CacheRegistry::config`] returns but leaves populated slots untouched:
//! a buffer cache disabled with `cache_size = 0` stays absent, and the file
//! handle cache keeps its original ceiling. Hosts must configure before any
//! cache is used.

use std::sync::Arc;

use fs_handle_cache::FileHandleCache;
use fs_membuffer::MembufferCache;
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::backend::{CacheBackend, DefaultBackend};
use crate::config::CacheConfig;
use crate::error::CachingResult;
use crate::store::ConfigStore;

/// Retained-free bound for the buffer cache allocator: give freed memory
/// straight back to the OS.
pub const MEMBUFFER_MAX_FREE: usize = 1;

/// Share of the buffer cache budget used for its directory (1/16).
pub const DIRECTORY_DIVISOR: u64 = 16;

/// Observable state of a singleton slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Nothing published yet
    Empty,
    /// Published as intentionally absent
    Absent,
    /// Published with a live cache
    Present,
}

/// One configuration store and the buffer / file handle cache slots.
pub struct CacheRegistry<B: CacheBackend = DefaultBackend> {
    backend: B,
    config: ConfigStore,
    /// `Some(None)` marks the buffer cache as intentionally absent
    membuffer: OnceCell<Option<Arc<MembufferCache>>>,
    file_handles: OnceCell<Arc<FileHandleCache>>,
}

impl CacheRegistry<DefaultBackend> {
    pub fn new() -> Self {
        Self::with_backend(DefaultBackend)
    }
}

impl Default for CacheRegistry<DefaultBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: CacheBackend> CacheRegistry<B> {
    /// Create a registry with the default configuration over `backend`.
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            config: ConfigStore::default(),
            membuffer: OnceCell::new(),
            file_handles: OnceCell::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Copy of the current configuration.
    pub fn config(&self) -> CacheConfig {
        self.config.get()
    }

    /// Replace the configuration and prime both caches if still empty.
    ///
    /// Caches that already exist are not rebuilt; see the module docs.
    /// A file handle cache failure is logged here and reported again by the
    /// next [`file_handle_cache`](Self::file_handle_cache) call.
    pub fn set_config(&self, config: CacheConfig) {
        let previous = self.config.replace(config);
        debug!(?previous, current = ?config, "cache configuration replaced");

        if self.membuffer.get().is_some() || self.file_handles.get().is_some() {
            debug!("caches already created, new configuration only affects config() readers");
        }

        self.membuffer_cache();
        if let Err(err) = self.file_handle_cache() {
            warn!(error = %err, "priming file handle cache failed");
        }
    }

    /// The shared buffer cache, created on first access.
    ///
    /// Returns `None` when the cache is disabled (`cache_size == 0`) or could
    /// not be built. A disabled or failed build is published and permanent;
    /// an arena acquisition failure is not, so a later call retries.
    pub fn membuffer_cache(&self) -> Option<Arc<MembufferCache>> {
        if let Some(slot) = self.membuffer.get() {
            return slot.clone();
        }

        let config = self.config.get();
        let candidate = if config.cache_size == 0 {
            debug!("buffer cache disabled by configuration");
            None
        } else {
            let arena = match self.backend.acquire_arena(Some(MEMBUFFER_MAX_FREE)) {
                Ok(arena) => arena,
                Err(err) => {
                    warn!(error = %err, "cannot acquire arena for buffer cache, running without it");
                    return None;
                }
            };

            match self.backend.create_membuffer(
                arena,
                config.cache_size,
                config.cache_size / DIRECTORY_DIVISOR,
                !config.single_threaded,
            ) {
                Ok(cache) => Some(Arc::new(cache)),
                Err(err) => {
                    warn!(
                        error = %err,
                        cache_size = config.cache_size,
                        "cannot create buffer cache, running without it"
                    );
                    None
                }
            }
        };

        match self.membuffer.try_insert(candidate) {
            Ok(published) => {
                info!(
                    present = published.is_some(),
                    cache_size = config.cache_size,
                    single_threaded = config.single_threaded,
                    "buffer cache slot published"
                );
                published.clone()
            }
            Err((published, _discarded)) => {
                debug!("lost buffer cache publication race, discarding local instance");
                published.clone()
            }
        }
    }

    /// The shared file handle cache, created on first access.
    ///
    /// Always exists once created, even with a ceiling of `0`. A failed
    /// build is returned as an error and not published.
    pub fn file_handle_cache(&self) -> CachingResult<Arc<FileHandleCache>> {
        if let Some(cache) = self.file_handles.get() {
            return Ok(Arc::clone(cache));
        }

        let config = self.config.get();
        let arena = self.backend.acquire_arena(None)?;
        let candidate = Arc::new(self.backend.create_file_handle_cache(
            arena,
            config.file_handle_count,
            !config.single_threaded,
        )?);

        match self.file_handles.try_insert(candidate) {
            Ok(published) => {
                info!(
                    file_handle_count = config.file_handle_count,
                    single_threaded = config.single_threaded,
                    "file handle cache slot published"
                );
                Ok(Arc::clone(published))
            }
            Err((published, _discarded)) => {
                debug!("lost file handle cache publication race, discarding local instance");
                Ok(Arc::clone(published))
            }
        }
    }

    pub fn membuffer_state(&self) -> SlotState {
        match self.membuffer.get() {
            None => SlotState::Empty,
            Some(None) => SlotState::Absent,
            Some(Some(_)) => SlotState::Present,
        }
    }

    pub fn file_handle_state(&self) -> SlotState {
        match self.file_handles.get() {
            None => SlotState::Empty,
            Some(_) => SlotState::Present,
        }
    }
}
