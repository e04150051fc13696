use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::types::{MembershipState, MembershipView, PeerSet, WatchState};
use crate::cache::RoutingTable;
use crate::coord::{CoordError, CoordinationRecord, CoordinationStore, Revision};

/// Deliveries waiting to be applied. With depth 1 the watcher does not issue its next
/// watch until the previous update was taken.
const UPDATE_QUEUE_DEPTH: usize = 1;

struct MembershipInner {
    state: MembershipState,
    watch: WatchState,
    peers: PeerSet,
    revision: Revision,
}

/// Registers this node in the shared peer list, keeps the routing table in step with
/// it, and deregisters on shutdown.
///
/// The routing table is written only from here.
pub struct MembershipService {
    store: Arc<dyn CoordinationStore>,
    routing: Arc<RoutingTable>,
    path: String,
    inner: Mutex<MembershipInner>,
    shutdown: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl MembershipService {
    pub fn new(
        store: Arc<dyn CoordinationStore>,
        routing: Arc<RoutingTable>,
        path: &str,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            routing,
            path: path.to_string(),
            inner: Mutex::new(MembershipInner {
                state: MembershipState::Joining,
                watch: WatchState::Idle,
                peers: PeerSet::default(),
                revision: 0,
            }),
            shutdown: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        })
    }

    fn self_endpoint(&self) -> &str {
        self.routing.self_endpoint()
    }

    /// Joins the cluster and, if registration succeeds, starts watching the peer list.
    pub async fn start(self: &Arc<Self>) -> MembershipState {
        info!("Joining cluster as {} via {}", self.self_endpoint(), self.path);

        let (mut peers, revision) = match self.store.fetch(&self.path).await {
            Ok(record) => (PeerSet::parse(&record.value_str()), record.revision),
            Err(CoordError::NotFound(_)) => (PeerSet::default(), 0),
            Err(e) => {
                tracing::warn!("Could not read peer list, starting from empty: {}", e);
                (PeerSet::default(), 0)
            }
        };

        if !peers.add(self.self_endpoint()) {
            tracing::warn!("{} is already listed, reusing the entry", self.self_endpoint());
        }

        let written = self
            .store
            .set_if_revision(&self.path, revision, peers.to_value().into_bytes())
            .await;

        let mut inner = self.inner.lock();
        inner.peers = peers;
        self.routing.publish(inner.peers.as_slice());

        match written {
            Ok(new_revision) => {
                inner.revision = new_revision;
                inner.state = MembershipState::Active;
                inner.watch = WatchState::Running;
                info!(
                    "Registered at revision {} ({} peer(s))",
                    new_revision,
                    inner.peers.len()
                );
                drop(inner);

                self.spawn_watcher(new_revision);
                MembershipState::Active
            }
            Err(e) => {
                inner.revision = revision;
                inner.state = MembershipState::Unregistered;
                tracing::error!("Registration abandoned, not watching for peers: {}", e);
                MembershipState::Unregistered
            }
        }
    }

    fn spawn_watcher(self: &Arc<Self>, after: Revision) {
        let (tx, rx) = mpsc::channel(UPDATE_QUEUE_DEPTH);

        let producer = {
            let store = self.store.clone();
            let path = self.path.clone();
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move {
                watch_loop(store, path, after, tx, shutdown).await;
            })
        };

        let consumer = {
            let service = self.clone();
            tokio::spawn(async move {
                service.apply_loop(rx).await;
            })
        };

        self.tasks.lock().extend([producer, consumer]);
    }

    async fn apply_loop(self: Arc<Self>, mut updates: mpsc::Receiver<CoordinationRecord>) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                update = updates.recv() => match update {
                    Some(record) => self.apply(record),
                    None => {
                        let mut inner = self.inner.lock();
                        inner.watch = WatchState::Closed;
                        tracing::warn!(
                            "Peer list watch closed; keeping {} peer(s) from revision {}",
                            inner.peers.len(),
                            inner.revision
                        );
                        break;
                    }
                },
            }
        }
    }

    fn apply(&self, record: CoordinationRecord) {
        let peers = PeerSet::parse(&record.value_str());

        let mut inner = self.inner.lock();
        if record.revision <= inner.revision {
            tracing::debug!("Ignoring stale peer list at revision {}", record.revision);
            return;
        }

        if !peers.contains(self.self_endpoint()) {
            tracing::warn!(
                "Peer list at revision {} does not include this node",
                record.revision
            );
        }

        info!(
            "Peer list changed at revision {}: {}",
            record.revision,
            peers.to_value()
        );
        self.routing.publish(peers.as_slice());
        inner.peers = peers;
        inner.revision = record.revision;
    }

    /// Stops watching and removes this node from the shared peer list.
    ///
    /// The write uses the last revision seen; if someone wrote since, the stale entry
    /// stays in the record and is only logged.
    pub async fn leave(&self) {
        self.shutdown.cancel();
        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!("Membership task ended abnormally: {}", e);
            }
        }

        let (value, revision) = {
            let mut inner = self.inner.lock();
            if inner.state != MembershipState::Active {
                info!("Leaving without deregistration (state {:?})", inner.state);
                inner.state = MembershipState::Left;
                return;
            }
            inner.state = MembershipState::Leaving;
            let endpoint = self.self_endpoint().to_string();
            inner.peers.remove_first(&endpoint);
            (inner.peers.to_value(), inner.revision)
        };

        match self
            .store
            .set_if_revision(&self.path, revision, value.into_bytes())
            .await
        {
            Ok(new_revision) => {
                info!("Deregistered {} at revision {}", self.self_endpoint(), new_revision);
                self.inner.lock().revision = new_revision;
            }
            Err(e) => {
                tracing::warn!(
                    "Deregistration of {} failed, entry left in peer list: {}",
                    self.self_endpoint(),
                    e
                );
            }
        }

        self.inner.lock().state = MembershipState::Left;
    }

    pub fn view(&self) -> MembershipView {
        let inner = self.inner.lock();
        MembershipView {
            state: inner.state,
            watch: inner.watch,
            revision: inner.revision,
            peers: inner.peers.as_slice().to_vec(),
        }
    }
}

/// Single outstanding watch at a time; each delivery becomes the baseline for the next.
/// Returning drops `updates`, which the consumer observes as the closed state.
async fn watch_loop(
    store: Arc<dyn CoordinationStore>,
    path: String,
    mut after: Revision,
    updates: mpsc::Sender<CoordinationRecord>,
    shutdown: CancellationToken,
) {
    loop {
        let delivered = tokio::select! {
            _ = shutdown.cancelled() => return,
            delivered = store.watch(&path, after) => delivered,
        };

        match delivered {
            Ok(record) => {
                after = record.revision;
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    sent = updates.send(record) => {
                        if sent.is_err() {
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Stopped watching {}: {}", path, e);
                return;
            }
        }
    }
}
