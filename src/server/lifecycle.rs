//! Shutdown sequencing for a serving node.
//!
//! Runs inside the graceful-shutdown future, before the HTTP server starts draining.
//! Peers parked on `/coord/wait` keep their connections open until the served store
//! answers them, so the node deregisters first and then closes the store it exposes.

use std::sync::Arc;

use crate::coord::MemoryStore;
use crate::membership::MembershipService;

pub async fn prepare_shutdown(
    membership: Arc<MembershipService>,
    served_store: Option<Arc<MemoryStore>>,
) {
    membership.leave().await;

    if let Some(store) = served_store {
        tracing::info!("Closing served coordination store");
        store.close();
    }
}
