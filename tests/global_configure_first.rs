//! Configuration applied before any cache is touched.

use std::fs;

use fs_caching::{
    get_cache_config, global_file_handle_cache, global_membuffer_cache, global_registry,
    set_cache_config, CacheConfig, SlotState,
};
use tempfile::TempDir;

#[test]
fn test_disabled_buffer_cache_and_small_handle_ceiling() {
    let config = CacheConfig {
        cache_size: 0,
        file_handle_count: 4,
        cache_fulltexts: true,
        ..CacheConfig::default()
    };
    set_cache_config(config);
    assert_eq!(get_cache_config(), config);

    // set_cache_config primed both slots
    assert_eq!(global_registry().membuffer_state(), SlotState::Absent);
    assert_eq!(global_registry().file_handle_state(), SlotState::Present);

    assert!(global_membuffer_cache().is_none());
    let handles = global_file_handle_cache().unwrap();
    assert_eq!(handles.max_handles(), 4);

    // The handle cache is usable right away
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("rev-1");
    fs::write(&path, "fulltext").unwrap();
    drop(handles.open(&path).unwrap());
    assert_eq!(handles.idle_count(), 1);

    // A disabled buffer cache stays disabled
    let enabled = CacheConfig {
        cache_size: 64 * 1024 * 1024,
        ..config
    };
    set_cache_config(enabled);
    assert_eq!(get_cache_config(), enabled);
    assert!(global_membuffer_cache().is_none());
}
