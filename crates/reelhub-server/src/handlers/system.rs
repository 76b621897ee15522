use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use reelhub_api::{ApiError, ApiResult, Envelope};
use serde_json::json;

use super::current_user;
use crate::state::AppState;

pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": "reelhub-server",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "status": "ok",
    }))
}

pub async fn healthz() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "storage": state.store.backend_name(),
    }))
}

/// Per-namespace cache hit/miss/key counts.
pub async fn cache_stats(State(state): State<AppState>) -> impl IntoResponse {
    Envelope::new("Cache statistics").field("cache", state.cache.stats())
}

/// Admin-only full cache flush.
pub async fn cache_flush(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Envelope> {
    let caller = current_user(&state, &headers).await?;
    if !caller.is_admin() {
        return Err(ApiError::forbidden("only admins may flush the cache"));
    }
    state.cache.flush_all();
    tracing::info!(admin = %caller.username, "cache flushed");
    Ok(Envelope::new("Cache flushed"))
}
