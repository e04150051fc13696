//! Coordination Store Network Protocol
//!
//! Endpoints and DTOs used when a node reaches the store over HTTP. Values travel as
//! raw byte arrays; the store never interprets them.

use serde::{Deserialize, Serialize};

use super::types::{CoordinationRecord, Revision};

// --- API Endpoints ---

/// Liveness probe used by `connect`.
pub const ENDPOINT_HEALTH: &str = "/coord/health";
/// Read (GET) and compare-and-set (POST) of a single record.
pub const ENDPOINT_RECORD: &str = "/coord/record";
/// Long poll for the next revision of a record.
pub const ENDPOINT_WAIT: &str = "/coord/wait";

// --- Data Transfer Objects ---

/// Query string for reads.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordQuery {
    pub path: String,
}

/// Query string for watches.
#[derive(Debug, Serialize, Deserialize)]
pub struct WaitQuery {
    pub path: String,
    pub after: Revision,
}

/// A record as seen by the store.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordResponse {
    pub path: String,
    pub revision: Revision,
    pub value: Vec<u8>,
}

impl From<CoordinationRecord> for RecordResponse {
    fn from(record: CoordinationRecord) -> Self {
        Self {
            path: record.path,
            revision: record.revision,
            value: record.value,
        }
    }
}

impl From<RecordResponse> for CoordinationRecord {
    fn from(response: RecordResponse) -> Self {
        Self {
            path: response.path,
            revision: response.revision,
            value: response.value,
        }
    }
}

/// Compare-and-set write.
#[derive(Debug, Serialize, Deserialize)]
pub struct SetRequest {
    pub path: String,
    /// Revision the writer last observed for this path.
    pub expected_revision: Revision,
    pub value: Vec<u8>,
}

/// Outcome of a write.
///
/// On success `revision` is the one assigned to the write; on conflict (HTTP 409)
/// it is the revision currently stored.
#[derive(Debug, Serialize, Deserialize)]
pub struct SetResponse {
    pub revision: Revision,
}
