use bytes::Bytes;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;

use super::flight::FlightGroup;
use super::peers::PeerClient;
use super::routing::{Route, RoutingTable};
use super::stats::{CacheStats, GroupStats, GroupStatsSnapshot};
use super::tier::ArtifactCache;
use crate::keys::CacheKey;
use crate::loader::{ImageRequest, LoadError, Loader};

pub const DEFAULT_CACHE_BYTES: usize = 64 << 20;
/// A remote artifact is copied into the hot tier on roughly one fetch in this many,
/// so keys fetched often end up hot while one-off keys rarely do.
pub const DEFAULT_HOT_ADMISSION: u32 = 10;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub main_cache_bytes: usize,
    pub hot_cache_bytes: usize,
    pub hot_admission: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            main_cache_bytes: DEFAULT_CACHE_BYTES,
            hot_cache_bytes: DEFAULT_CACHE_BYTES / 8,
            hot_admission: DEFAULT_HOT_ADMISSION,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupSnapshot {
    pub name: String,
    pub group: GroupStatsSnapshot,
    pub main_cache: CacheStats,
    pub hot_cache: CacheStats,
}

/// A named, cluster-wide cache of artifacts.
///
/// Each key has one owner on the hash ring. The owner computes misses with its
/// `Loader` and keeps the result in the main tier; other nodes fetch from the owner
/// and may keep a copy in their hot tier. Concurrent misses for the same key on one
/// node share a single load.
pub struct CacheGroup {
    name: String,
    loader: Arc<dyn Loader>,
    routing: Arc<RoutingTable>,
    peers: PeerClient,
    main_cache: ArtifactCache,
    hot_cache: ArtifactCache,
    hot_admission: u32,
    computations: FlightGroup<Result<Bytes, LoadError>>,
    fetches: FlightGroup<Result<Bytes, LoadError>>,
    stats: GroupStats,
}

impl CacheGroup {
    pub fn new(
        name: &str,
        loader: Arc<dyn Loader>,
        routing: Arc<RoutingTable>,
        config: CacheConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            loader,
            routing,
            peers: PeerClient::new(),
            main_cache: ArtifactCache::new(config.main_cache_bytes),
            hot_cache: ArtifactCache::new(config.hot_cache_bytes),
            hot_admission: config.hot_admission.max(1),
            computations: FlightGroup::new(),
            fetches: FlightGroup::new(),
            stats: GroupStats::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn routing(&self) -> &Arc<RoutingTable> {
        &self.routing
    }

    /// Returns the artifact for `key`, from a local tier, the owning peer, or the loader.
    pub async fn get(self: &Arc<Self>, key: &CacheKey) -> Result<Bytes, LoadError> {
        self.stats.gets.inc();

        if let Some(value) = self.lookup_cache(key) {
            self.stats.cache_hits.inc();
            return Ok(self.served(value));
        }

        let route = self.routing.route(key.as_str());
        let value = self.load(key, route).await?;
        Ok(self.served(value))
    }

    /// Serves `key` on behalf of another peer: this node computes it, never forwards it.
    pub async fn get_as_owner(self: &Arc<Self>, key: &CacheKey) -> Result<Bytes, LoadError> {
        self.stats.server_requests.inc();
        self.stats.gets.inc();

        if let Some(value) = self.main_cache.get(key.as_str()) {
            self.stats.cache_hits.inc();
            return Ok(self.served(value));
        }

        let value = self.load(key, Route::Local).await?;
        Ok(self.served(value))
    }

    fn served(&self, value: Bytes) -> Bytes {
        self.stats.bytes_served.add(value.len() as u64);
        value
    }

    fn lookup_cache(&self, key: &CacheKey) -> Option<Bytes> {
        self.main_cache
            .get(key.as_str())
            .or_else(|| self.hot_cache.get(key.as_str()))
    }

    async fn load(self: &Arc<Self>, key: &CacheKey, route: Route) -> Result<Bytes, LoadError> {
        self.stats.loads.inc();

        let group = Arc::clone(self);
        let call_key = key.clone();

        // Tracked apart so that a forwarded request never waits on a fetch headed back
        // to the peer that forwarded it.
        let flights = match route {
            Route::Local => &self.computations,
            Route::Remote(_) => &self.fetches,
        };

        let (result, joined) = flights
            .work(key.as_str(), move || async move {
                // A call that finished between our cache miss and joining the flight
                // group has already populated the cache.
                if let Some(value) = group.lookup_cache(&call_key) {
                    group.stats.cache_hits.inc();
                    return Ok(value);
                }

                match route {
                    Route::Local => group.load_locally(&call_key).await,
                    Route::Remote(peer) => group.load_from_peer(&peer, &call_key).await,
                }
            })
            .await;

        if joined {
            self.stats.loads_deduped.inc();
        }

        result
    }

    async fn load_locally(&self, key: &CacheKey) -> Result<Bytes, LoadError> {
        self.stats.local_loads.inc();

        let result = match key.parse() {
            Ok(parsed) => self.loader.load(&ImageRequest::from(&parsed)).await,
            Err(e) => Err(LoadError::from(e)),
        };

        match result {
            Ok(value) => {
                tracing::info!("Loaded {} ({} bytes)", key, value.len());
                self.main_cache.add(key.as_str().to_string(), value.clone());
                Ok(value)
            }
            Err(e) => {
                self.stats.local_load_errs.inc();
                tracing::error!("Loading {} failed: {}", key, e);
                Err(e)
            }
        }
    }

    async fn load_from_peer(&self, peer: &str, key: &CacheKey) -> Result<Bytes, LoadError> {
        tracing::debug!("Fetching {} from owner {}", key, peer);

        match self.peers.fetch(peer, &self.name, key).await {
            Ok(value) => {
                self.stats.peer_loads.inc();
                if rand::thread_rng().gen_range(0..self.hot_admission) == 0 {
                    self.hot_cache.add(key.as_str().to_string(), value.clone());
                }
                Ok(value)
            }
            Err(e) => {
                self.stats.peer_errors.inc();
                tracing::warn!("Fetching {} from {} failed: {}", key, peer, e);
                Err(e)
            }
        }
    }

    pub fn snapshot(&self) -> GroupSnapshot {
        GroupSnapshot {
            name: self.name.clone(),
            group: self.stats.snapshot(),
            main_cache: self.main_cache.stats(),
            hot_cache: self.hot_cache.stats(),
        }
    }
}
