//! Coordination Store Module
//!
//! Client side of the revisioned key/value store that acts as the cluster's membership
//! authority. Every record carries a store-assigned revision; writes are compare-and-set
//! against the revision the writer last observed, and watches are long polls that return
//! the first revision newer than the one supplied.
//!
//! ## Submodules
//! - **`store`**: The `CoordinationStore` trait (fetch / set-if-revision / watch).
//! - **`memory`**: `MemoryStore`, an in-process implementation, also served over HTTP.
//! - **`client`**: `HttpStoreClient`, talking to a remote store over HTTP.
//! - **`handlers`** / **`protocol`**: The HTTP surface and its DTOs.

pub mod client;
pub mod handlers;
pub mod memory;
pub mod protocol;
pub mod store;
pub mod types;

pub use client::HttpStoreClient;
pub use memory::MemoryStore;
pub use store::CoordinationStore;
pub use types::{CoordError, CoordinationRecord, Revision};
