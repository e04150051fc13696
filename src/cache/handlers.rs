use axum::{
    Router,
    extract::{Extension, Path},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;

use super::group::CacheGroup;
use super::protocol::{ARTIFACT_CONTENT_TYPE, ENDPOINT_PEER_GET};
use crate::keys::CacheKey;

/// Peer-facing routes for `group`.
pub fn router(group: Arc<CacheGroup>) -> Router {
    Router::new()
        .route(ENDPOINT_PEER_GET, get(handle_peer_get))
        .layer(Extension(group))
}

pub async fn handle_peer_get(
    Extension(group): Extension<Arc<CacheGroup>>,
    Path((group_name, raw_key)): Path<(String, String)>,
) -> Response {
    if group_name != group.name() {
        tracing::warn!("Peer asked for unknown group {}", group_name);
        return StatusCode::NOT_FOUND.into_response();
    }

    let key: CacheKey = match raw_key.parse() {
        Ok(k) => k,
        Err(e) => {
            tracing::warn!("Peer sent malformed key: {}", e);
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    match group.get_as_owner(&key).await {
        Ok(value) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, ARTIFACT_CONTENT_TYPE)],
            value,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to serve {} to peer: {}", key, e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
