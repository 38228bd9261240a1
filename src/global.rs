//! Process-wide cache configuration and shared caches.
//!
//! A single [`CacheRegistry`] lives for the whole process and is created on
//! first use. Call [`set_cache_config`] before anything touches the caches:
//! once a cache exists, later configuration changes do not reach it.

use std::sync::Arc;

use fs_handle_cache::FileHandleCache;
use fs_membuffer::MembufferCache;
use once_cell::sync::Lazy;

use crate::backend::DefaultBackend;
use crate::config::CacheConfig;
use crate::error::CachingResult;
use crate::registry::CacheRegistry;

static REGISTRY: Lazy<CacheRegistry> = Lazy::new(CacheRegistry::<DefaultBackend>::new);

/// The process-wide registry.
pub fn global_registry() -> &'static CacheRegistry {
    &REGISTRY
}

/// Copy of the current process-wide cache configuration.
pub fn get_cache_config() -> CacheConfig {
    REGISTRY.config()
}

/// Replace the process-wide configuration and create any cache not yet created.
pub fn set_cache_config(config: CacheConfig) {
    REGISTRY.set_config(config)
}

/// The process-wide buffer cache, or `None` if disabled or unavailable.
pub fn global_membuffer_cache() -> Option<Arc<MembufferCache>> {
    REGISTRY.membuffer_cache()
}

/// The process-wide file handle cache.
pub fn global_file_handle_cache() -> CachingResult<Arc<FileHandleCache>> {
    REGISTRY.file_handle_cache()
}
