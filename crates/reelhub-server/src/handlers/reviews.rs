use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use reelhub_api::{ApiError, ApiResult, Envelope};
use reelhub_core::{now_utc, Collection, Review};
use serde::Deserialize;
use serde_json::Value;

use super::{PageParams, current_user, decode};
use crate::resolvers;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReview {
    pub tmdb_id: i64,
    pub rating: u8,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateReview {
    pub rating: Option<u8>,
    pub title: Option<String>,
    pub body: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateReview>,
) -> ApiResult<Envelope> {
    let caller = current_user(&state, &headers).await?;

    // The movie projection must exist before reviews can hang off it.
    resolvers::resolve_movie(&state, body.tmdb_id).await?;

    let review = Review::new(body.tmdb_id, &caller.id, body.rating, body.title, body.body);
    review.validate().map_err(ApiError::from)?;

    let doc = encode_review(&review)?;
    // One review per author per movie, enforced by the storage layer.
    state.store.insert(Collection::Reviews, &doc).await?;

    resolvers::recompute_movie_aggregates(&state, review.tmdb_id).await?;
    resolvers::invalidate_review_pages(&state, review.tmdb_id);
    tracing::info!(tmdb_id = review.tmdb_id, author = %caller.username, "review created");

    Ok(Envelope::new("Review created successfully")
        .field("review", &review)
        .created())
}

pub async fn list_for_movie(
    State(state): State<AppState>,
    Path(tmdb_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> ApiResult<Envelope> {
    let page = resolvers::resolve_review_page(&state, tmdb_id, params.request()).await?;
    Ok(Envelope::new("Reviews fetched")
        .field("reviews", &page.reviews)
        .page(&page.info))
}

pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Envelope> {
    let review = load_review(&state, &id).await?;
    Ok(Envelope::new("Review fetched").field("review", &review))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<UpdateReview>,
) -> ApiResult<Envelope> {
    let caller = current_user(&state, &headers).await?;
    let mut review = load_review(&state, &id).await?;
    if review.author_id != caller.id {
        return Err(ApiError::forbidden("only the author may edit a review"));
    }

    if let Some(rating) = body.rating {
        review.rating = rating;
    }
    if let Some(title) = body.title {
        review.title = title;
    }
    if let Some(text) = body.body {
        review.body = text;
    }
    review.updated_at = now_utc();
    review.validate().map_err(ApiError::from)?;

    let doc = encode_review(&review)?;
    state.store.update(Collection::Reviews, &id, &doc).await?;

    resolvers::recompute_movie_aggregates(&state, review.tmdb_id).await?;
    resolvers::invalidate_review_pages(&state, review.tmdb_id);

    Ok(Envelope::new("Review updated").field("review", &review))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Envelope> {
    let caller = current_user(&state, &headers).await?;
    let review = load_review(&state, &id).await?;
    if review.author_id != caller.id && !caller.is_admin() {
        return Err(ApiError::forbidden(
            "only the author or an admin may delete a review",
        ));
    }

    state.store.delete(Collection::Reviews, &id).await?;
    delete_review_comments(&state, &id).await?;

    resolvers::recompute_movie_aggregates(&state, review.tmdb_id).await?;
    resolvers::invalidate_review_pages(&state, review.tmdb_id);
    tracing::info!(review_id = %id, tmdb_id = review.tmdb_id, "review deleted");

    Ok(Envelope::new("Review deleted"))
}

/// Comments do not outlive their review.
async fn delete_review_comments(state: &AppState, review_id: &str) -> ApiResult<()> {
    let query = reelhub_storage::Query::new()
        .filter(reelhub_storage::Filter::eq("reviewId", review_id));
    let result = state.store.find(Collection::Comments, &query).await?;
    for doc in result.entries {
        state.store.delete(Collection::Comments, &doc.id).await?;
    }
    Ok(())
}

pub(super) async fn load_review(state: &AppState, id: &str) -> ApiResult<Review> {
    let doc = state
        .store
        .get(Collection::Reviews, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Review not found: {id}")))?;
    decode(&doc)
}

fn encode_review(review: &Review) -> ApiResult<Value> {
    serde_json::to_value(review).map_err(|e| ApiError::internal(format!("encode failure: {e}")))
}
