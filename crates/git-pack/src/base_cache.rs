//! Byte-budgeted LRU cache of reconstructed delta bases, keyed by pack offset.

use git_object::ObjectType;
use lru::LruCache;

/// Default cache budget: 64 MiB of reconstructed object bytes.
pub const DEFAULT_BYTE_BUDGET: usize = 64 * 1024 * 1024;

/// Caches fully-reconstructed `(type, bytes)` pairs by their pack offset, so
/// repeated delta-chain walks through a shared base skip re-decompression and
/// re-application. Unlike a fixed-entry-count LRU, eviction is driven by a
/// total byte budget since reconstructed objects vary wildly in size.
pub struct PackBaseCache {
    cache: LruCache<u64, (ObjectType, Vec<u8>)>,
    byte_budget: usize,
    bytes_used: usize,
}

impl PackBaseCache {
    /// Create a cache with the given byte budget.
    pub fn new(byte_budget: usize) -> Self {
        Self {
            cache: LruCache::unbounded(),
            byte_budget,
            bytes_used: 0,
        }
    }

    /// Get a cached entry (promotes it to most-recently-used).
    pub fn get(&mut self, offset: u64) -> Option<(ObjectType, Vec<u8>)> {
        self.cache.get(&offset).cloned()
    }

    /// Insert an entry, evicting least-recently-used entries until the total
    /// cached size is within budget. An entry larger than the whole budget is
    /// not cached at all.
    pub fn insert(&mut self, offset: u64, entry: (ObjectType, Vec<u8>)) {
        let size = entry.1.len();
        if size > self.byte_budget {
            return;
        }
        if let Some((_, old)) = self.cache.push(offset, entry) {
            self.bytes_used -= old.1.len();
        }
        self.bytes_used += size;
        while self.bytes_used > self.byte_budget {
            match self.cache.pop_lru() {
                Some((_, (_, data))) => self.bytes_used -= data.len(),
                None => break,
            }
        }
    }

    /// Current number of cached entries.
    pub fn len(&self) -> usize {
        self.cache.len()
    }
}
