//! Artifact Loader
//!
//! The narrow contract between the cache group and whatever produces artifacts on a
//! miss. A loader receives the parsed parts of a cache key and returns encoded bytes.
//!
//! - **`file`**: `FileImageLoader`, reading source images from a directory and
//!   re-encoding them as PNG, resized when a width or height is requested.

pub mod file;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::keys::{KeyError, ParsedKey};

pub use file::FileImageLoader;

/// Failure to produce an artifact. Cloneable so that every caller waiting on the same
/// in-flight load receives the same error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("source image not found: {0}")]
    SourceNotFound(String),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("peer {peer} unreachable: {reason}")]
    PeerUnreachable { peer: String, reason: String },

    #[error("peer {peer} answered with status {status}")]
    PeerFailed { peer: String, status: u16 },

    #[error(transparent)]
    MalformedKey(#[from] KeyError),
}

/// What a loader is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

impl From<&ParsedKey> for ImageRequest {
    fn from(key: &ParsedKey) -> Self {
        Self {
            file_name: key.file_name.clone(),
            width: key.dimension("width"),
            height: key.dimension("height"),
        }
    }
}

#[async_trait]
pub trait Loader: Send + Sync {
    /// Produces the artifact for `request`. Called concurrently for different keys.
    async fn load(&self, request: &ImageRequest) -> Result<Bytes, LoadError>;
}
