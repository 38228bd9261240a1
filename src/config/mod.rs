//! Cache configuration
//!
//! [`CacheConfig`] is the value held by the process-wide configuration store.
//! [`ConfigLoader`] builds one from layers, later layers winning:
//! 1. Built-in defaults
//! 2. Config file (TOML, `[cache]` table)
//! 3. Programmatic / CLI overrides
//!
//! Loading never applies anything; the host hands the result to
//! [`set_cache_config`](crate::set_cache_config).

mod cache_config;
mod loader;
mod merge;

pub use cache_config::{parse_size, CacheConfig, DEFAULT_CACHE_SIZE, DEFAULT_FILE_HANDLE_COUNT};
pub use loader::{ConfigError, ConfigLoader, ConfigOrigin, ConfigSource, LoadedConfig};
pub use merge::{deep_merge, merge_layers};
