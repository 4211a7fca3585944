//! Read-only HTTP view of the current snapshot.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tower_http::cors::CorsLayer;

use crate::error::StoreError;
use crate::snapshot::{empty_document, SnapshotStore};

#[derive(Clone)]
pub struct AppState {
    store: SnapshotStore,
}

pub fn create_router(store: SnapshotStore) -> Router {
    let state = AppState { store };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/disaster-data", get(disaster_data))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn disaster_data(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    match state.store.load_document().await {
        Ok(doc) => Ok(Json(doc)),
        // Nothing persisted yet: same shape, all sources empty.
        Err(StoreError::NotFound(_)) => Ok(Json(empty_document())),
        Err(e) => {
            tracing::warn!(error = %e, "snapshot read failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "snapshot unavailable" })),
            ))
        }
    }
}
