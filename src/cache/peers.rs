use bytes::Bytes;
use reqwest::{Client, Url};

use super::protocol::PEER_PATH_SEGMENT;
use crate::keys::CacheKey;
use crate::loader::LoadError;

/// Fetches artifacts from the peer that owns them. Failures are reported once;
/// there is no retry.
#[derive(Clone, Default)]
pub struct PeerClient {
    client: Client,
}

impl PeerClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn peer_url(peer: &str, group: &str, key: &CacheKey) -> Result<Url, LoadError> {
        let base = if peer.contains("://") {
            peer.to_string()
        } else {
            format!("http://{}", peer)
        };

        let unreachable = |reason: String| LoadError::PeerUnreachable {
            peer: peer.to_string(),
            reason,
        };

        let mut url = Url::parse(&base).map_err(|e| unreachable(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| unreachable("endpoint cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend([PEER_PATH_SEGMENT, group, key.as_str()]);

        Ok(url)
    }

    pub async fn fetch(&self, peer: &str, group: &str, key: &CacheKey) -> Result<Bytes, LoadError> {
        let url = Self::peer_url(peer, group, key)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LoadError::PeerUnreachable {
                peer: peer.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(LoadError::PeerFailed {
                peer: peer.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.bytes().await.map_err(|e| LoadError::PeerUnreachable {
            peer: peer.to_string(),
            reason: e.to_string(),
        })
    }
}
