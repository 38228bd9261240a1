//! The process-lifetime configuration store.

use parking_lot::RwLock;

use crate::config::CacheConfig;

/// Holds the current [`CacheConfig`], replaced and read as a whole.
///
/// Readers always get a complete copy; no reader sees a mix of old and new
/// fields.
#[derive(Debug, Default)]
pub struct ConfigStore {
    current: RwLock<CacheConfig>,
}

impl ConfigStore {
    pub fn new(initial: CacheConfig) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    /// Snapshot of the current configuration.
    pub fn get(&self) -> CacheConfig {
        *self.current.read()
    }

    /// Replace the configuration, returning the previous one.
    pub fn replace(&self, config: CacheConfig) -> CacheConfig {
        std::mem::replace(&mut *self.current.write(), config)
    }
}
