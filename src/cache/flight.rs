//! In-flight call deduplication.
//!
//! The first caller for a key installs a shared future; callers arriving while it runs
//! await the same future and receive a clone of its output. The call is also driven by
//! its own task, so it runs to completion even if every caller goes away, and it
//! removes its entry when it resolves, so a later miss starts a fresh call.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

type Call<T> = Shared<BoxFuture<'static, T>>;

pub struct FlightGroup<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Running calls, tagged with an id so a call only ever removes its own entry.
    calls: Arc<DashMap<String, (u64, Call<T>)>>,
    next_id: AtomicU64,
}

impl<T> FlightGroup<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            calls: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Runs `make()` for `key` unless a call for it is already running.
    ///
    /// Returns the call's output and whether this caller joined an existing call.
    /// Must be called from within a tokio runtime.
    pub async fn work<F, Fut>(&self, key: &str, make: F) -> (T, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (call, started) = match self.calls.entry(key.to_string()) {
            Entry::Occupied(entry) => (entry.get().1.clone(), false),
            Entry::Vacant(entry) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let calls = Arc::clone(&self.calls);
                let owned_key = key.to_string();
                let body = make();

                let call = async move {
                    let output = body.await;
                    calls.remove_if(&owned_key, |_, (running, _)| *running == id);
                    output
                }
                .boxed()
                .shared();

                entry.insert((id, call.clone()));
                (call, true)
            }
        };

        if started {
            tokio::spawn(call.clone());
        }

        (call.await, !started)
    }

    /// Number of keys with a call currently running.
    pub fn in_flight(&self) -> usize {
        self.calls.len()
    }
}

impl<T> Default for FlightGroup<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
