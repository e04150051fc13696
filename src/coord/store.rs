use async_trait::async_trait;

use super::types::{CoordError, CoordinationRecord, Revision};

/// Operations the membership layer needs from a revisioned store.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Reads the record at `path`. Fails with `NotFound` when nothing was ever written.
    async fn fetch(&self, path: &str) -> Result<CoordinationRecord, CoordError>;

    /// Writes `value` unless the record was modified after `expected`.
    /// Returns the revision assigned to the write.
    async fn set_if_revision(
        &self,
        path: &str,
        expected: Revision,
        value: Vec<u8>,
    ) -> Result<Revision, CoordError>;

    /// Blocks until the record at `path` has a revision greater than `after`.
    /// One delivery per call; reissue with the returned revision to keep observing.
    async fn watch(&self, path: &str, after: Revision) -> Result<CoordinationRecord, CoordError>;
}
