//! TMDB client error types

/// Errors from the upstream metadata API.
///
/// All three variants propagate to the caller only when no stale cached
/// copy of the requested key exists.
#[derive(Debug, thiserror::Error)]
pub enum TmdbError {
    /// The upstream responded with a non-2xx status.
    #[error("TMDB returned {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    /// Network-level failure: no response was received at all.
    #[error("TMDB unreachable: {0}")]
    Unreachable(String),

    /// The request could not be built or the response body was not the
    /// JSON we asked for.
    #[error("invalid TMDB request: {0}")]
    InvalidRequest(String),
}

impl TmdbError {
    /// Whether retrying the same request later could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unreachable(_) => true,
            Self::UpstreamStatus { status, .. } => *status >= 500 || *status == 429,
            Self::InvalidRequest(_) => false,
        }
    }
}

impl From<reqwest::Error> for TmdbError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            TmdbError::Unreachable(err.to_string())
        } else if err.is_decode() || err.is_builder() {
            TmdbError::InvalidRequest(err.to_string())
        } else {
            TmdbError::Unreachable(err.to_string())
        }
    }
}

impl From<url::ParseError> for TmdbError {
    fn from(err: url::ParseError) -> Self {
        TmdbError::InvalidRequest(err.to_string())
    }
}

/// Result type alias for TMDB client operations
pub type Result<T> = std::result::Result<T, TmdbError>;
