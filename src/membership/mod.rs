//! Membership Module
//!
//! Keeps this node listed in the cluster's peer list and keeps the cache routing table
//! in step with that list.
//!
//! ## Lifecycle
//! - **Joining**: read the peer list (empty if unreadable), append this node, and write
//!   it back with compare-and-set. A rejected write abandons registration; there is no
//!   retry.
//! - **Active**: a background watcher long-polls the record and publishes every new
//!   revision to the `RoutingTable`. If the store connection is lost the watcher stops
//!   for good and the last peer list stays in effect.
//! - **Leaving**: on shutdown, remove this node and write the list back with the last
//!   revision seen. A conflicting write leaves a stale entry behind.

pub mod service;
pub mod types;

pub use service::MembershipService;
pub use types::{MembershipState, MembershipView, PeerSet, WatchState};
