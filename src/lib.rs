//! Shared caches for the filesystem layer
//!
//! This crate owns the process-wide cache configuration and two caches built
//! lazily from it:
//! - a sharded in-memory buffer cache ([`MembufferCache`]), optional
//! - an open file handle cache ([`FileHandleCache`]), always present
//!
//! Each cache is created at most once per process, from the configuration in
//! effect at that moment. Configure first, then use.

pub mod backend;
pub mod config;
pub mod error;
pub mod global;
pub mod registry;
pub mod store;

pub use backend::{CacheBackend, DefaultBackend};
pub use config::{CacheConfig, ConfigError, ConfigLoader, LoadedConfig};
pub use error::{CachingError, CachingResult};
pub use global::{
    get_cache_config, global_file_handle_cache, global_membuffer_cache, global_registry,
    set_cache_config,
};
pub use registry::{CacheRegistry, SlotState};
pub use store::ConfigStore;

pub use fs_handle_cache::{CachedFile, FileHandleCache};
pub use fs_membuffer::MembufferCache;
