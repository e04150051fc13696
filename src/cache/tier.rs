//! Byte-bounded LRU tier.
//!
//! Entries are charged `key.len() + value.len()` bytes. Inserting past the bound
//! evicts least-recently-used entries synchronously until the tier fits again.

use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;

use super::stats::CacheStats;

struct Tier {
    entries: LruCache<String, Bytes>,
    bytes: usize,
    gets: u64,
    hits: u64,
    evictions: u64,
}

pub struct ArtifactCache {
    max_bytes: usize,
    tier: Mutex<Tier>,
}

impl ArtifactCache {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            tier: Mutex::new(Tier {
                entries: LruCache::unbounded(),
                bytes: 0,
                gets: 0,
                hits: 0,
                evictions: 0,
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        let mut tier = self.tier.lock();
        tier.gets += 1;
        let value = tier.entries.get(key).cloned();
        if value.is_some() {
            tier.hits += 1;
        }
        value
    }

    pub fn add(&self, key: String, value: Bytes) {
        if self.max_bytes == 0 {
            return;
        }

        let mut tier = self.tier.lock();
        let charge = key.len() + value.len();

        if let Some((old_key, old_value)) = tier.entries.push(key, value) {
            tier.bytes -= old_key.len() + old_value.len();
        }
        tier.bytes += charge;

        while tier.bytes > self.max_bytes {
            match tier.entries.pop_lru() {
                Some((evicted_key, evicted_value)) => {
                    tier.bytes -= evicted_key.len() + evicted_value.len();
                    tier.evictions += 1;
                }
                None => break,
            }
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn stats(&self) -> CacheStats {
        let tier = self.tier.lock();
        CacheStats {
            bytes: tier.bytes,
            items: tier.entries.len(),
            gets: tier.gets,
            hits: tier.hits,
            misses: tier.gets - tier.hits,
            evictions: tier.evictions,
        }
    }
}
