//! Mushroom: Distributed Image Cache Library
//!
//! Serves resized and re-encoded copies of source images, computed on demand and
//! shared across a cluster of peers. It serves as the foundation for the binary
//! executable (`main.rs`).
//!
//! ## Architecture Modules
//!
//! - **`keys`**: Canonical cache keys. Maps a file name and free-form query parameters
//!   onto a small, bounded key space, and parses keys back.
//! - **`coord`**: The revisioned, watchable coordination store that holds the peer list,
//!   with an embedded implementation and an HTTP client.
//! - **`membership`**: Registers this node in the peer list, watches it, and publishes
//!   changes to the cache routing table.
//! - **`cache`**: The distributed cache group. Consistent-hash ownership, single-flight
//!   loading, main and hot LRU tiers, and the peer protocol.
//! - **`loader`**: Produces artifacts on a miss (decode, resize, encode as PNG).
//! - **`server`**: The public HTTP routes.
//! - **`config`**: Node configuration from flags and environment.

pub mod cache;
pub mod config;
pub mod coord;
pub mod keys;
pub mod loader;
pub mod membership;
pub mod server;
