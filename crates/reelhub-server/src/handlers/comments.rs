use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use reelhub_api::{ApiError, ApiResult, Envelope};
use reelhub_core::{now_utc, Collection, Comment, PageInfo};
use reelhub_storage::{Filter, Query as StoreQuery, Sort};
use serde::Deserialize;
use serde_json::Value;

use super::reviews::load_review;
use super::{PageParams, current_user, decode};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateComment {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateComment {
    pub body: String,
}

pub async fn create(
    State(state): State<AppState>,
    Path(review_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<CreateComment>,
) -> ApiResult<Envelope> {
    let caller = current_user(&state, &headers).await?;
    // 404 for comments on a review that does not exist.
    load_review(&state, &review_id).await?;

    let comment = Comment::new(&review_id, &caller.id, body.body);
    comment.validate().map_err(ApiError::from)?;

    let doc = encode_comment(&comment)?;
    state.store.insert(Collection::Comments, &doc).await?;

    Ok(Envelope::new("Comment created successfully")
        .field("comment", &comment)
        .created())
}

/// Comments list in conversation order, oldest first.
pub async fn list_for_review(
    State(state): State<AppState>,
    Path(review_id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Envelope> {
    load_review(&state, &review_id).await?;

    let page = params.request();
    let query = StoreQuery::new()
        .filter(Filter::eq("reviewId", review_id))
        .sort(Sort::asc("createdAt"))
        .paginate(page.offset(), page.limit());
    let result = state.store.find(Collection::Comments, &query).await?;

    let comments = result
        .entries
        .iter()
        .map(decode::<Comment>)
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(Envelope::new("Comments fetched")
        .field("comments", &comments)
        .page(&PageInfo::new(page, result.total)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<UpdateComment>,
) -> ApiResult<Envelope> {
    let caller = current_user(&state, &headers).await?;
    let mut comment = load_comment(&state, &id).await?;
    if comment.author_id != caller.id {
        return Err(ApiError::forbidden("only the author may edit a comment"));
    }

    comment.body = body.body;
    comment.updated_at = now_utc();
    comment.validate().map_err(ApiError::from)?;

    let doc = encode_comment(&comment)?;
    state.store.update(Collection::Comments, &id, &doc).await?;
    Ok(Envelope::new("Comment updated").field("comment", &comment))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Envelope> {
    let caller = current_user(&state, &headers).await?;
    let comment = load_comment(&state, &id).await?;
    if comment.author_id != caller.id && !caller.is_admin() {
        return Err(ApiError::forbidden(
            "only the author or an admin may delete a comment",
        ));
    }

    state.store.delete(Collection::Comments, &id).await?;
    Ok(Envelope::new("Comment deleted"))
}

pub(super) async fn load_comment(state: &AppState, id: &str) -> ApiResult<Comment> {
    let doc = state
        .store
        .get(Collection::Comments, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Comment not found: {id}")))?;
    decode(&doc)
}

fn encode_comment(comment: &Comment) -> ApiResult<Value> {
    serde_json::to_value(comment).map_err(|e| ApiError::internal(format!("encode failure: {e}")))
}
