use axum::extract::{Path, State};
use axum::http::HeaderMap;
use reelhub_api::{ApiError, ApiResult, Envelope};
use reelhub_core::{Comment, ContentKind, Review};
use serde_json::Value;

use super::{current_user, decode};
use crate::resolvers;
use crate::state::AppState;

/// Toggle the caller's like on a review or comment.
///
/// The kind segment dispatches through `ContentKind`; anything else is a
/// validation error, never a silent miss.
pub async fn toggle(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Envelope> {
    let caller = current_user(&state, &headers).await?;
    let kind: ContentKind = kind.parse().map_err(ApiError::from)?;

    let doc = state
        .store
        .get(kind.collection(), &id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{kind} not found: {id}")))?;

    let (liked, likes, updated) = match kind {
        ContentKind::Review => {
            let mut review: Review = decode(&doc)?;
            let liked = review.toggle_like(&caller.id);
            // Cached review pages carry like counts.
            resolvers::invalidate_review_pages(&state, review.tmdb_id);
            (liked, review.likes.len(), encode(&review)?)
        }
        ContentKind::Comment => {
            let mut comment: Comment = decode(&doc)?;
            let liked = comment.toggle_like(&caller.id);
            (liked, comment.likes.len(), encode(&comment)?)
        }
    };

    state.store.update(kind.collection(), &id, &updated).await?;

    let message = if liked { "Like added" } else { "Like removed" };
    Ok(Envelope::new(message)
        .field("liked", liked)
        .field("likes", likes))
}

fn encode<T: serde::Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(format!("encode failure: {e}")))
}
