use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter shared between request tasks.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn inc(&self) {
        self.add(1);
    }

    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-group counters.
#[derive(Debug, Default)]
pub struct GroupStats {
    /// Every `get`, regardless of outcome.
    pub gets: Counter,
    /// Served from the main or hot tier.
    pub cache_hits: Counter,
    /// Misses that went through the in-flight group.
    pub loads: Counter,
    /// Misses that joined a computation already running for the same key.
    pub loads_deduped: Counter,
    /// Successful fetches from the owning peer.
    pub peer_loads: Counter,
    pub peer_errors: Counter,
    /// Loader invocations on this node.
    pub local_loads: Counter,
    pub local_load_errs: Counter,
    /// Requests received from other peers.
    pub server_requests: Counter,
    pub bytes_served: Counter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupStatsSnapshot {
    pub gets: u64,
    pub cache_hits: u64,
    pub loads: u64,
    pub loads_deduped: u64,
    pub peer_loads: u64,
    pub peer_errors: u64,
    pub local_loads: u64,
    pub local_load_errs: u64,
    pub server_requests: u64,
    pub bytes_served: u64,
}

impl GroupStats {
    pub fn snapshot(&self) -> GroupStatsSnapshot {
        GroupStatsSnapshot {
            gets: self.gets.get(),
            cache_hits: self.cache_hits.get(),
            loads: self.loads.get(),
            loads_deduped: self.loads_deduped.get(),
            peer_loads: self.peer_loads.get(),
            peer_errors: self.peer_errors.get(),
            local_loads: self.local_loads.get(),
            local_load_errs: self.local_load_errs.get(),
            server_requests: self.server_requests.get(),
            bytes_served: self.bytes_served.get(),
        }
    }
}

/// Figures for one cache tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub bytes: usize,
    pub items: usize,
    pub gets: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}
