//! File handle cache and the borrowed handle type.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use fs_arena::Arena;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{HandleCacheError, HandleCacheResult};

/// Bytes reserved from the arena for the cache's own bookkeeping.
pub const BOOKKEEPING_SIZE: usize = 256;

/// Cache keeping at most `max_handles` idle file handles open.
#[derive(Debug)]
pub struct FileHandleCache {
    max_handles: usize,
    thread_safe: bool,
    /// Idle handles, least recently returned first
    idle: Mutex<VecDeque<(PathBuf, File)>>,
    hits: AtomicU64,
    misses: AtomicU64,
    _arena: Arena,
}

/// Counters for handle reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleCacheStats {
    pub idle: usize,
    pub hits: u64,
    pub misses: u64,
}

impl FileHandleCache {
    /// Create a cache enforcing `max_handles` open idle handles.
    pub fn create(mut arena: Arena, max_handles: usize, thread_safe: bool) -> HandleCacheResult<Self> {
        arena.reserve(BOOKKEEPING_SIZE)?;

        debug!(max_handles, thread_safe, "file handle cache created");

        Ok(Self {
            max_handles,
            thread_safe,
            idle: Mutex::new(VecDeque::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            _arena: arena,
        })
    }

    /// Open `path` for reading, reusing an idle handle when one is cached.
    ///
    /// A reused handle is rewound to the start of the file.
    pub fn open(&self, path: impl AsRef<Path>) -> HandleCacheResult<CachedFile<'_>> {
        let path = path.as_ref();

        if let Some(mut file) = self.take_idle(path) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            file.seek(SeekFrom::Start(0))?;
            trace!(path = %path.display(), "reusing cached file handle");
            return Ok(CachedFile::new(self, path.to_path_buf(), file));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let file = File::open(path).map_err(|source| HandleCacheError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(CachedFile::new(self, path.to_path_buf(), file))
    }

    /// Close every idle handle.
    pub fn flush(&self) {
        let closed = {
            let mut idle = self.idle.lock();
            let count = idle.len();
            idle.clear();
            count
        };
        if closed > 0 {
            debug!(closed, "flushed idle file handles");
        }
    }

    pub fn max_handles(&self) -> usize {
        self.max_handles
    }

    pub fn is_thread_safe(&self) -> bool {
        self.thread_safe
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    pub fn stats(&self) -> HandleCacheStats {
        HandleCacheStats {
            idle: self.idle_count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn take_idle(&self, path: &Path) -> Option<File> {
        let mut idle = self.idle.lock();
        let position = idle.iter().rposition(|(p, _)| p == path)?;
        idle.remove(position).map(|(_, file)| file)
    }

    fn give_back(&self, path: PathBuf, file: File) {
        if self.max_handles == 0 {
            return;
        }

        let mut idle = self.idle.lock();
        idle.push_back((path, file));
        while idle.len() > self.max_handles {
            if let Some((closed, _)) = idle.pop_front() {
                trace!(path = %closed.display(), "closing least recently used file handle");
            }
        }
    }
}

/// A file handle on loan from a [`FileHandleCache`].
///
/// Dropping it hands the handle back to the cache.
#[derive(Debug)]
pub struct CachedFile<'a> {
    cache: &'a FileHandleCache,
    path: PathBuf,
    /// Only taken in `drop`
    file: Option<File>,
}

impl<'a> CachedFile<'a> {
    fn new(cache: &'a FileHandleCache, path: PathBuf, file: File) -> Self {
        Self {
            cache,
            path,
            file: Some(file),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Deref for CachedFile<'_> {
    type Target = File;

    fn deref(&self) -> &File {
        self.file.as_ref().expect("file is only taken on drop")
    }
}

impl DerefMut for CachedFile<'_> {
    fn deref_mut(&mut self) -> &mut File {
        self.file.as_mut().expect("file is only taken on drop")
    }
}

impl Drop for CachedFile<'_> {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            self.cache.give_back(std::mem::take(&mut self.path), file);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs_arena::{Allocator, ARENA_HEADER_SIZE};
    use std::fs;
    use std::io::Read;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn make_cache(max_handles: usize) -> FileHandleCache {
        FileHandleCache::create(Arena::unbounded().unwrap(), max_handles, true).unwrap()
    }

    fn write_files(temp_dir: &TempDir, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = temp_dir.path().join(format!("rev-{i}"));
                fs::write(&path, format!("content {i}")).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_create_reserves_bookkeeping() {
        let allocator = Arc::new(Allocator::new());
        let arena = Arena::new(Arc::clone(&allocator)).unwrap();
        let cache = FileHandleCache::create(arena, 16, false).unwrap();

        assert_eq!(allocator.in_use(), ARENA_HEADER_SIZE + BOOKKEEPING_SIZE);
        assert_eq!(cache.max_handles(), 16);
        assert!(!cache.is_thread_safe());
    }

    #[test]
    fn test_create_fails_when_arena_exhausted() {
        let allocator = Arc::new(Allocator::with_limit(ARENA_HEADER_SIZE));
        let arena = Arena::new(allocator).unwrap();

        let err = FileHandleCache::create(arena, 16, true).unwrap_err();
        assert!(matches!(err, HandleCacheError::Arena(_)));
    }

    #[test]
    fn test_handle_reused_after_drop() {
        let temp_dir = TempDir::new().unwrap();
        let paths = write_files(&temp_dir, 1);
        let cache = make_cache(4);

        {
            let mut file = cache.open(&paths[0]).unwrap();
            let mut buf = String::new();
            file.read_to_string(&mut buf).unwrap();
            assert_eq!(buf, "content 0");
        }
        assert_eq!(cache.idle_count(), 1);

        // Reused handle starts from the beginning again
        let mut file = cache.open(&paths[0]).unwrap();
        let mut buf = String::new();
        file.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "content 0");
        assert_eq!(file.path(), paths[0].as_path());
        drop(file);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_loaned_handle_returned_after_partial_read() {
        let temp_dir = TempDir::new().unwrap();
        let paths = write_files(&temp_dir, 1);
        let cache = make_cache(1);

        {
            let mut file = cache.open(&paths[0]).unwrap();
            let mut buf = [0u8; 3];
            file.read_exact(&mut buf).unwrap();
            assert_eq!(&buf, b"con");
            assert_eq!(file.metadata().unwrap().len(), 9);
            assert_eq!(cache.idle_count(), 0);
        }
        assert_eq!(cache.idle_count(), 1);

        let mut buf = String::new();
        cache.open(&paths[0]).unwrap().read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "content 0");
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_ceiling_closes_least_recent() {
        let temp_dir = TempDir::new().unwrap();
        let paths = write_files(&temp_dir, 3);
        let cache = make_cache(2);

        for path in &paths {
            drop(cache.open(path).unwrap());
        }
        assert_eq!(cache.idle_count(), 2);

        // The first file was closed to make room
        drop(cache.open(&paths[0]).unwrap());
        assert_eq!(cache.stats().hits, 0);

        drop(cache.open(&paths[2]).unwrap());
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_zero_ceiling_keeps_nothing_open() {
        let temp_dir = TempDir::new().unwrap();
        let paths = write_files(&temp_dir, 2);
        let cache = make_cache(0);

        drop(cache.open(&paths[0]).unwrap());
        drop(cache.open(&paths[0]).unwrap());

        assert_eq!(cache.idle_count(), 0);
        assert_eq!(cache.stats().hits, 0);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_open_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let cache = make_cache(4);

        let err = cache.open(temp_dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, HandleCacheError::Open { .. }));
    }

    #[test]
    fn test_flush() {
        let temp_dir = TempDir::new().unwrap();
        let paths = write_files(&temp_dir, 3);
        let cache = make_cache(8);

        for path in &paths {
            drop(cache.open(path).unwrap());
        }
        assert_eq!(cache.idle_count(), 3);

        cache.flush();
        assert_eq!(cache.idle_count(), 0);
    }
}
