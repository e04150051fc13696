//! Distributed Cache Module
//!
//! A named group of artifacts spread over the cluster by consistent hashing.
//!
//! ## Core Concepts
//! - **Ownership**: `HashRing` maps every key to exactly one peer; `RoutingTable` holds
//!   the ring currently published by membership.
//! - **Tiers**: the owner keeps computed artifacts in its main tier. Non-owners may keep
//!   copies of popular remote artifacts in a smaller hot tier.
//! - **Deduplication**: `FlightGroup` collapses concurrent misses for the same key into
//!   one computation or one remote fetch.
//! - **Peer protocol**: owners serve `GET /_cache/{group}/{key}` and never forward it.

pub mod flight;
pub mod group;
pub mod handlers;
pub mod peers;
pub mod protocol;
pub mod ring;
pub mod routing;
pub mod stats;
pub mod tier;

pub use group::{CacheConfig, CacheGroup, GroupSnapshot};
pub use ring::HashRing;
pub use routing::{Route, RoutingTable};
