//! A single cache segment with FIFO eviction.

use std::collections::{HashMap, VecDeque};

#[derive(Debug)]
pub(crate) struct Segment {
    entries: HashMap<Vec<u8>, Vec<u8>>,
    /// Insertion order, oldest first
    order: VecDeque<Vec<u8>>,
    used: usize,
    capacity: usize,
    max_entries: usize,
}

impl Segment {
    pub(crate) fn new(capacity: usize, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            used: 0,
            capacity,
            max_entries,
        }
    }

    pub(crate) fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub(crate) fn contains(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    /// Store `value` under `key`, evicting the oldest entries until it fits.
    ///
    /// Returns false if the value can never fit this segment.
    pub(crate) fn insert(&mut self, key: &[u8], value: &[u8]) -> bool {
        let cost = key.len() + value.len();
        if cost > self.capacity {
            self.remove(key);
            return false;
        }

        self.remove(key);
        while self.used + cost > self.capacity || self.entries.len() >= self.max_entries {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(evicted) = self.entries.remove(&oldest) {
                self.used -= oldest.len() + evicted.len();
            }
        }

        self.used += cost;
        self.order.push_back(key.to_vec());
        self.entries.insert(key.to_vec(), value.to_vec());
        true
    }

    pub(crate) fn remove(&mut self, key: &[u8]) -> bool {
        match self.entries.remove(key) {
            Some(value) => {
                self.used -= key.len() + value.len();
                self.order.retain(|k| k.as_slice() != key);
                true
            }
            None => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn used(&self) -> usize {
        self.used
    }
}
