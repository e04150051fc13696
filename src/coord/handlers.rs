use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    routing::get,
};
use std::sync::Arc;

use super::memory::MemoryStore;
use super::protocol::{
    ENDPOINT_HEALTH, ENDPOINT_RECORD, ENDPOINT_WAIT, RecordQuery, RecordResponse, SetRequest,
    SetResponse, WaitQuery,
};
use super::store::CoordinationStore;
use super::types::CoordError;

/// Routes exposing `store` to other nodes.
pub fn router(store: Arc<MemoryStore>) -> Router {
    Router::new()
        .route(ENDPOINT_HEALTH, get(handle_health))
        .route(
            ENDPOINT_RECORD,
            get(handle_fetch_record).post(handle_set_record),
        )
        .route(ENDPOINT_WAIT, get(handle_wait_record))
        .layer(Extension(store))
}

pub async fn handle_health() -> StatusCode {
    StatusCode::OK
}

pub async fn handle_fetch_record(
    Extension(store): Extension<Arc<MemoryStore>>,
    Query(query): Query<RecordQuery>,
) -> Result<Json<RecordResponse>, StatusCode> {
    match store.fetch(&query.path).await {
        Ok(record) => Ok(Json(record.into())),
        Err(CoordError::NotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Store fetch of {} failed: {}", query.path, e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

pub async fn handle_set_record(
    Extension(store): Extension<Arc<MemoryStore>>,
    Json(req): Json<SetRequest>,
) -> (StatusCode, Json<SetResponse>) {
    match store
        .set_if_revision(&req.path, req.expected_revision, req.value)
        .await
    {
        Ok(revision) => (StatusCode::OK, Json(SetResponse { revision })),
        Err(CoordError::Conflict { current, .. }) => {
            tracing::info!(
                "Store rejected write to {} at revision {} (current {})",
                req.path,
                req.expected_revision,
                current
            );
            (
                StatusCode::CONFLICT,
                Json(SetResponse { revision: current }),
            )
        }
        Err(e) => {
            tracing::error!("Store write to {} failed: {}", req.path, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(SetResponse {
                    revision: req.expected_revision,
                }),
            )
        }
    }
}

pub async fn handle_wait_record(
    Extension(store): Extension<Arc<MemoryStore>>,
    Query(query): Query<WaitQuery>,
) -> Result<Json<RecordResponse>, StatusCode> {
    match store.watch(&query.path, query.after).await {
        Ok(record) => Ok(Json(record.into())),
        Err(e) => {
            tracing::warn!("Store watch on {} ended: {}", query.path, e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
