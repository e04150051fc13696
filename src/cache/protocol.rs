//! Peer Protocol
//!
//! A node that does not own a key asks the owner for it with
//! `GET {peer}/_cache/{group}/{key}`, the key percent-encoded as a single path segment.
//! The owner answers with the raw artifact bytes or a bare error status; it never
//! forwards the request again.

/// First path segment of peer requests.
pub const PEER_PATH_SEGMENT: &str = "_cache";
/// Axum route for peer requests.
pub const ENDPOINT_PEER_GET: &str = "/_cache/:group/:key";
/// Content type of artifacts exchanged between peers.
pub const ARTIFACT_CONTENT_TYPE: &str = "application/octet-stream";
