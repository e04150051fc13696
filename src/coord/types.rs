use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store-assigned, monotonically increasing revision. `0` means "never written".
pub type Revision = i64;

/// A single record at a named path, as last observed from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinationRecord {
    pub path: String,
    pub revision: Revision,
    pub value: Vec<u8>,
}

impl CoordinationRecord {
    pub fn value_str(&self) -> String {
        String::from_utf8_lossy(&self.value).into_owned()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoordError {
    /// The store could not be reached.
    #[error("connection to coordination store failed: {0}")]
    Connection(String),

    /// No record exists at the path.
    #[error("no record at {0}")]
    NotFound(String),

    /// The stored revision advanced past the one presented by the writer.
    #[error("revision conflict on {path}: expected {expected}, store is at {current}")]
    Conflict {
        path: String,
        expected: Revision,
        current: Revision,
    },

    /// A watch ended because the connection to the store was lost.
    #[error("watch on {path} failed: {reason}")]
    Watch { path: String, reason: String },

    /// The store answered with something we could not interpret.
    #[error("unexpected response from coordination store: {0}")]
    Protocol(String),
}
