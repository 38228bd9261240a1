//! Scoped arena over a shared allocator.

use std::sync::Arc;

use tracing::debug;

use crate::{Allocator, ArenaResult};

/// Bytes every arena takes from its allocator when it is created.
pub const ARENA_HEADER_SIZE: usize = 8 * 1024;

/// A memory scope whose reservations are released together.
///
/// Creating an arena takes [`ARENA_HEADER_SIZE`] bytes from the allocator;
/// `clear()` gives back everything reserved since, and dropping the arena
/// gives back the header as well.
#[derive(Debug)]
pub struct Arena {
    allocator: Arc<Allocator>,
    reserved: usize,
}

impl Arena {
    /// Create an arena drawing from `allocator`.
    pub fn new(allocator: Arc<Allocator>) -> ArenaResult<Self> {
        allocator.allocate(ARENA_HEADER_SIZE)?;
        Ok(Self {
            allocator,
            reserved: 0,
        })
    }

    /// Create an arena over a private, unbounded allocator.
    pub fn unbounded() -> ArenaResult<Self> {
        Self::new(Arc::new(Allocator::new()))
    }

    /// Reserve `bytes` from the allocator for the lifetime of this arena.
    pub fn reserve(&mut self, bytes: usize) -> ArenaResult<()> {
        self.allocator.allocate(bytes)?;
        self.reserved += bytes;
        Ok(())
    }

    /// Release every reservation made so far. The arena stays usable.
    pub fn clear(&mut self) {
        if self.reserved > 0 {
            debug!(bytes = self.reserved, "clearing arena");
            self.allocator.free(self.reserved);
            self.reserved = 0;
        }
    }

    /// Bytes reserved beyond the arena header.
    pub fn reserved(&self) -> usize {
        self.reserved
    }

    /// The allocator this arena draws from.
    pub fn allocator(&self) -> &Arc<Allocator> {
        &self.allocator
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        self.clear();
        self.allocator.free(ARENA_HEADER_SIZE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArenaError;

    #[test]
    fn test_arena_takes_header() {
        let allocator = Arc::new(Allocator::new());
        let arena = Arena::new(Arc::clone(&allocator)).unwrap();

        assert_eq!(allocator.in_use(), ARENA_HEADER_SIZE);
        assert_eq!(arena.reserved(), 0);
    }

    #[test]
    fn test_arena_creation_fails_when_exhausted() {
        let allocator = Arc::new(Allocator::with_limit(ARENA_HEADER_SIZE - 1));
        let err = Arena::new(allocator).unwrap_err();

        assert!(matches!(err, ArenaError::Exhausted { .. }));
    }

    #[test]
    fn test_clear_returns_reservations() {
        let allocator = Arc::new(Allocator::new());
        allocator.set_max_free(1);
        let mut arena = Arena::new(Arc::clone(&allocator)).unwrap();

        arena.reserve(1024).unwrap();
        arena.reserve(2048).unwrap();
        assert_eq!(arena.reserved(), 3072);
        assert_eq!(allocator.in_use(), ARENA_HEADER_SIZE + 3072);

        arena.clear();
        assert_eq!(arena.reserved(), 0);
        assert_eq!(allocator.in_use(), ARENA_HEADER_SIZE);
        assert_eq!(allocator.retained(), 1);
        assert_eq!(allocator.released_to_os(), 3071);
    }

    #[test]
    fn test_drop_returns_everything() {
        let allocator = Arc::new(Allocator::new());
        {
            let mut arena = Arena::new(Arc::clone(&allocator)).unwrap();
            arena.reserve(512).unwrap();
        }
        assert_eq!(allocator.in_use(), 0);
        assert_eq!(allocator.retained(), ARENA_HEADER_SIZE + 512);
    }

    #[test]
    fn test_failed_reserve_keeps_prior_reservations() {
        let allocator = Arc::new(Allocator::with_limit(ARENA_HEADER_SIZE + 100));
        let mut arena = Arena::new(Arc::clone(&allocator)).unwrap();

        arena.reserve(60).unwrap();
        assert!(arena.reserve(60).is_err());
        assert_eq!(arena.reserved(), 60);
    }
}
