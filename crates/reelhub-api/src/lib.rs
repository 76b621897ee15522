use std::sync::atomic::{AtomicBool, Ordering};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

use reelhub_core::{CoreError, PageInfo};
use reelhub_storage::StorageError;
use reelhub_tmdb::TmdbError;

static EXPOSE_ERROR_DETAIL: AtomicBool = AtomicBool::new(false);

/// Controls whether server-error bodies carry the underlying message as a
/// `detail` field. Development deployments enable this at startup;
/// production bodies stay generic and the full message goes to the log
/// only.
pub fn expose_error_detail(enabled: bool) {
    EXPOSE_ERROR_DETAIL.store(enabled, Ordering::Relaxed);
}

// -------------------------
// API Errors
// -------------------------

/// High-level API errors mapped to HTTP responses.
///
/// Every error serializes as `{"error": <machine code>, "message": <text>}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
    pub fn upstream_unavailable(msg: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(msg.into())
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code for the `error` field of the body.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "validation_error",
            ApiError::Unauthorized(_) => "authorization_error",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::UpstreamUnavailable(_) => "upstream_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::UpstreamUnavailable(msg)
            | ApiError::Internal(msg) => msg.clone(),
        }
    }

    /// Response body. Client errors carry their message verbatim; server
    /// errors get a generic message, with the underlying text as a
    /// `detail` field only when detail exposure is enabled.
    fn body(&self, expose_detail: bool) -> Value {
        if !self.status_code().is_server_error() {
            return json!({
                "error": self.code(),
                "message": self.message(),
            });
        }
        let generic = match self {
            ApiError::UpstreamUnavailable(_) => "Upstream service unavailable",
            _ => "Internal server error",
        };
        let mut body = json!({
            "error": self.code(),
            "message": generic,
        });
        if expose_detail {
            body["detail"] = Value::String(self.message());
        }
        body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "request failed: {self}");
        }
        let body = self.body(EXPOSE_ERROR_DETAIL.load(Ordering::Relaxed));
        (status, axum::Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { .. } => Self::BadRequest(err.to_string()),
            CoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            CoreError::Conflict { .. } => Self::Conflict(err.to_string()),
            CoreError::Authorization(msg) => Self::Forbidden(msg),
            CoreError::Upstream(msg) => Self::UpstreamUnavailable(msg),
            CoreError::JsonError(_) | CoreError::Configuration(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { .. } => Self::NotFound(err.to_string()),
            StorageError::AlreadyExists { .. } | StorageError::UniqueViolation { .. } => {
                Self::Conflict(err.to_string())
            }
            StorageError::InvalidDocument { .. } => Self::BadRequest(err.to_string()),
            StorageError::Internal { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl From<TmdbError> for ApiError {
    fn from(err: TmdbError) -> Self {
        match err {
            // A 404 from TMDB means the id does not exist, not that TMDB is down.
            TmdbError::UpstreamStatus { status: 404, .. } => Self::NotFound(err.to_string()),
            TmdbError::UpstreamStatus { .. } | TmdbError::Unreachable(_) => {
                Self::UpstreamUnavailable(err.to_string())
            }
            TmdbError::InvalidRequest(msg) => Self::Internal(msg),
        }
    }
}

// -------------------------
// Success Envelopes
// -------------------------

/// Success response body: a `message` field with the payload fields
/// merged in beside it.
#[derive(Debug, Clone)]
pub struct Envelope {
    status: StatusCode,
    body: Map<String, Value>,
}

impl Envelope {
    pub fn new(message: impl Into<String>) -> Self {
        let mut body = Map::new();
        body.insert("message".to_string(), Value::String(message.into()));
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    /// Respond with 201 Created instead of 200 OK.
    pub fn created(mut self) -> Self {
        self.status = StatusCode::CREATED;
        self
    }

    /// Attach a named payload field, e.g. `"user"` or `"reviews"`.
    pub fn field(mut self, name: &str, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => {
                self.body.insert(name.to_string(), v);
            }
            Err(e) => {
                tracing::error!(field = name, "failed to serialize envelope field: {e}");
            }
        }
        self
    }

    /// Attach the standard `pagination` object for list responses.
    pub fn page(self, info: &PageInfo) -> Self {
        self.field("pagination", info)
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.body)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, axum::Json(Value::Object(self.body))).into_response()
    }
}
