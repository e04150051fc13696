use parking_lot::RwLock;
use std::sync::Arc;

use super::ring::{DEFAULT_REPLICAS, HashRing};

/// Where a key should be served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// This node owns the key.
    Local,
    /// The key belongs to the peer at this endpoint.
    Remote(String),
}

/// Current ownership map of the cluster.
///
/// Readers take an `Arc` snapshot of the ring and route against it without holding
/// the lock; `publish` swaps in a fully built ring, so a lookup never sees a partial
/// peer list.
pub struct RoutingTable {
    self_endpoint: String,
    replicas: usize,
    ring: RwLock<Arc<HashRing>>,
}

impl RoutingTable {
    pub fn new(self_endpoint: impl Into<String>) -> Arc<Self> {
        Self::with_replicas(self_endpoint, DEFAULT_REPLICAS)
    }

    pub fn with_replicas(self_endpoint: impl Into<String>, replicas: usize) -> Arc<Self> {
        Arc::new(Self {
            self_endpoint: self_endpoint.into(),
            replicas,
            ring: RwLock::new(Arc::new(HashRing::new(replicas))),
        })
    }

    pub fn self_endpoint(&self) -> &str {
        &self.self_endpoint
    }

    /// Replaces the ring. Only the membership service calls this.
    pub(crate) fn publish<S: AsRef<str>>(&self, peers: &[S]) {
        let ring = Arc::new(HashRing::with_peers(self.replicas, peers));
        tracing::info!("Routing table updated: {} peer(s)", ring.peers().len());
        *self.ring.write() = ring;
    }

    pub fn snapshot(&self) -> Arc<HashRing> {
        self.ring.read().clone()
    }

    pub fn peers(&self) -> Vec<String> {
        self.snapshot().peers().to_vec()
    }

    /// Routes `key` against a single snapshot. An empty ring routes everything locally.
    pub fn route(&self, key: &str) -> Route {
        let ring = self.snapshot();
        match ring.get(key) {
            Some(owner) if owner != self.self_endpoint => Route::Remote(owner.to_string()),
            _ => Route::Local,
        }
    }
}
