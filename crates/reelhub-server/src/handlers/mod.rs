pub mod comments;
pub mod likes;
pub mod movies;
pub mod reviews;
pub mod system;
pub mod users;

use axum::http::HeaderMap;
use reelhub_api::{ApiError, ApiResult};
use reelhub_core::{Collection, PageRequest, User};
use reelhub_storage::StoredDocument;
use serde::Deserialize;

use crate::state::AppState;

/// Pagination query parameters shared by all listing endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl PageParams {
    pub fn request(self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}

/// Resolve the calling user from the `X-User-Id` header.
///
/// Session and token handling live in front of this service; the header
/// carries the already-authenticated principal.
pub(crate) async fn current_user(state: &AppState, headers: &HeaderMap) -> ApiResult<User> {
    let id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::unauthorized("missing X-User-Id header"))?;

    let doc = state
        .store
        .get(Collection::Users, id)
        .await?
        .ok_or_else(|| ApiError::unauthorized(format!("unknown user: {id}")))?;
    decode(&doc)
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(doc: &StoredDocument) -> ApiResult<T> {
    doc.decode().map_err(|e| {
        ApiError::internal(format!(
            "corrupt {} document {}: {e}",
            doc.collection, doc.id
        ))
    })
}
