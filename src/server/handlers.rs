use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::PathRejection},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::{ENDPOINT_IMAGE, ENDPOINT_ROOT, ENDPOINT_STATS, IMAGE_CONTENT_TYPE};
use crate::cache::{CacheGroup, GroupSnapshot};
use crate::keys;
use crate::membership::{MembershipService, MembershipView};

const WELCOME_PAGE: &str = "<!DOCTYPE html>
<html>
<head><title>mushroom</title></head>
<body>
<h1>mushroom</h1>
<p>Request an image with <code>/images/{file}?width=W&amp;height=H&amp;dpi=D</code>.
Omitted or zero dimensions keep the source size; one zero dimension keeps the aspect ratio.</p>
<p>Cache and cluster figures are at <a href=\"/stats\">/stats</a>.</p>
</body>
</html>
";

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub cache: GroupSnapshot,
    pub membership: MembershipView,
}

pub fn router(group: Arc<CacheGroup>, membership: Arc<MembershipService>) -> Router {
    Router::new()
        .route(ENDPOINT_ROOT, get(handle_root))
        .route(ENDPOINT_IMAGE, get(handle_get_image))
        .route(ENDPOINT_STATS, get(handle_stats))
        .layer(Extension(group))
        .layer(Extension(membership))
}

pub async fn handle_get_image(
    Extension(group): Extension<Arc<CacheGroup>>,
    file_name: Result<Path<String>, PathRejection>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let Ok(Path(file_name)) = file_name else {
        tracing::warn!("Rejected image request with an undecodable file segment");
        return StatusCode::NOT_FOUND.into_response();
    };

    if !keys::is_valid_file_name(&file_name) {
        tracing::warn!("Rejected image request for {:?}", file_name);
        return StatusCode::NOT_FOUND.into_response();
    }

    let mut params: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in pairs {
        params.entry(name).or_default().push(value);
    }

    let key = keys::generate(&file_name, &params);
    tracing::debug!("GET {} -> {}", file_name, key);

    match group.get(&key).await {
        Ok(image) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, IMAGE_CONTENT_TYPE)],
            image,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to serve {}: {}", key, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
        }
    }
}

pub async fn handle_stats(
    Extension(group): Extension<Arc<CacheGroup>>,
    Extension(membership): Extension<Arc<MembershipService>>,
) -> (StatusCode, Json<StatsResponse>) {
    (
        StatusCode::OK,
        Json(StatsResponse {
            cache: group.snapshot(),
            membership: membership.view(),
        }),
    )
}

pub async fn handle_root() -> Html<&'static str> {
    Html(WELCOME_PAGE)
}
