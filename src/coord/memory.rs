//! In-process revisioned store.
//!
//! Holds one global revision counter; every successful write bumps it and stamps the
//! written record with the new value. Watchers park on a `tokio::sync::watch` channel
//! carrying the latest revision and re-check their path whenever it moves.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

use super::store::CoordinationStore;
use super::types::{CoordError, CoordinationRecord, Revision};

#[derive(Default)]
struct StoreState {
    revision: Revision,
    records: HashMap<String, CoordinationRecord>,
}

pub struct MemoryStore {
    state: Mutex<StoreState>,
    changes: watch::Sender<Revision>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        let (changes, _) = watch::channel(0);
        Arc::new(Self {
            state: Mutex::new(StoreState::default()),
            changes,
            closed: AtomicBool::new(false),
        })
    }

    /// Latest revision assigned by this store.
    pub fn revision(&self) -> Revision {
        self.state.lock().revision
    }

    /// Simulates losing the store: pending and future watches fail, reads and writes
    /// report a connection error.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let current = self.revision();
        self.changes.send_replace(current);
    }

    fn ensure_open(&self) -> Result<(), CoordError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CoordError::Connection("store closed".to_string()));
        }
        Ok(())
    }

    fn lookup(&self, path: &str) -> Option<CoordinationRecord> {
        self.state.lock().records.get(path).cloned()
    }
}

#[async_trait]
impl CoordinationStore for MemoryStore {
    async fn fetch(&self, path: &str) -> Result<CoordinationRecord, CoordError> {
        self.ensure_open()?;
        self.lookup(path)
            .ok_or_else(|| CoordError::NotFound(path.to_string()))
    }

    async fn set_if_revision(
        &self,
        path: &str,
        expected: Revision,
        value: Vec<u8>,
    ) -> Result<Revision, CoordError> {
        self.ensure_open()?;

        let new_revision = {
            let mut state = self.state.lock();
            let current = state
                .records
                .get(path)
                .map(|record| record.revision)
                .unwrap_or(0);

            if current > expected {
                return Err(CoordError::Conflict {
                    path: path.to_string(),
                    expected,
                    current,
                });
            }

            state.revision += 1;
            let revision = state.revision;
            state.records.insert(
                path.to_string(),
                CoordinationRecord {
                    path: path.to_string(),
                    revision,
                    value,
                },
            );
            revision
        };

        tracing::debug!("Store: {} set at revision {}", path, new_revision);
        self.changes.send_replace(new_revision);

        Ok(new_revision)
    }

    async fn watch(&self, path: &str, after: Revision) -> Result<CoordinationRecord, CoordError> {
        // Subscribe before the first check so a write landing in between still wakes us.
        let mut changes = self.changes.subscribe();

        loop {
            if self.closed.load(Ordering::SeqCst) {
                return Err(CoordError::Watch {
                    path: path.to_string(),
                    reason: "store closed".to_string(),
                });
            }

            if let Some(record) = self.lookup(path)
                && record.revision > after
            {
                return Ok(record);
            }

            if changes.changed().await.is_err() {
                return Err(CoordError::Watch {
                    path: path.to_string(),
                    reason: "change feed dropped".to_string(),
                });
            }
        }
    }
}
