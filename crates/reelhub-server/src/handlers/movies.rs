use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use reelhub_api::{ApiError, ApiResult, Envelope};
use serde::Deserialize;
use serde_json::Value;

use super::{PageParams, current_user};
use crate::resolvers;
use crate::state::AppState;

pub async fn popular(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Envelope> {
    let payload = state.tmdb.popular(params.page.unwrap_or(1)).await?;
    Ok(listing_envelope("Popular movies fetched", payload))
}

pub async fn now_playing(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Envelope> {
    let payload = state.tmdb.now_playing(params.page.unwrap_or(1)).await?;
    Ok(listing_envelope("Now playing movies fetched", payload))
}

pub async fn upcoming(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Envelope> {
    let payload = state.tmdb.upcoming(params.page.unwrap_or(1)).await?;
    Ok(listing_envelope("Upcoming movies fetched", payload))
}

pub async fn top_rated(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Envelope> {
    let payload = state.tmdb.top_rated(params.page.unwrap_or(1)).await?;
    Ok(listing_envelope("Top rated movies fetched", payload))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    pub page: Option<usize>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Envelope> {
    let query = params.query.trim();
    if query.is_empty() {
        return Err(ApiError::bad_request("query parameter must not be empty"));
    }
    let payload = state.tmdb.search(query, params.page.unwrap_or(1)).await?;
    Ok(listing_envelope("Search results fetched", payload))
}

pub async fn genres(State(state): State<AppState>) -> ApiResult<Envelope> {
    let payload = state.tmdb.genres().await?;
    let genres = payload.get("genres").cloned().unwrap_or(Value::Array(Vec::new()));
    Ok(Envelope::new("Genres fetched").field("genres", genres))
}

/// Read-through movie detail: cache, then storage, then TMDB.
pub async fn detail(
    State(state): State<AppState>,
    Path(tmdb_id): Path<i64>,
) -> ApiResult<Envelope> {
    let movie = resolvers::resolve_movie(&state, tmdb_id).await?;
    Ok(Envelope::new("Movie fetched").field("movie", &movie))
}

/// Admin toggle of the featured flag on a movie projection.
pub async fn toggle_featured(
    State(state): State<AppState>,
    Path(tmdb_id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Envelope> {
    let caller = current_user(&state, &headers).await?;
    if !caller.is_admin() {
        return Err(ApiError::forbidden("only admins may feature movies"));
    }

    let mut movie = resolvers::resolve_movie(&state, tmdb_id).await?;
    movie.featured = !movie.featured;
    resolvers::persist_movie(&state, &movie).await?;

    let message = if movie.featured {
        "Movie featured"
    } else {
        "Movie unfeatured"
    };
    Ok(Envelope::new(message).field("movie", &movie))
}

/// TMDB listing payloads arrive as `{page, results, total_pages,
/// total_results}`; re-shape into the service envelope.
fn listing_envelope(message: &str, payload: Value) -> Envelope {
    let results = payload.get("results").cloned().unwrap_or(Value::Array(Vec::new()));
    let page = payload.get("page").and_then(Value::as_u64).unwrap_or(1);
    let total_pages = payload
        .get("total_pages")
        .and_then(Value::as_u64)
        .unwrap_or(1);
    let total_results = payload
        .get("total_results")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    Envelope::new(message).field("movies", results).field(
        "pagination",
        serde_json::json!({
            "currentPage": page,
            "totalPages": total_pages,
            "totalItems": total_results,
            "hasNextPage": page < total_pages,
            "hasPrevPage": page > 1,
        }),
    )
}
