use reelhub_cache::{CacheStore, Namespace};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

use crate::error::{Result, TmdbError};
use crate::governor::{self, SlidingWindow};
use crate::key::derive_key;

/// TTL for volatile listings (popular, now playing, search pages).
const LISTING_TTL: Duration = Duration::from_secs(30 * 60);
/// TTL for slow-moving data (movie details, the genre list).
const DETAILS_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// TMDB v3 API keys are 32-character hex strings; v4 read access tokens
/// are much longer JWTs. Credential length selects the auth scheme.
const V3_KEY_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthScheme {
    /// v4 token sent as `Authorization: Bearer`.
    Bearer,
    /// v3 key sent as an `api_key` query parameter.
    QueryKey,
}

/// Configuration for the TMDB client.
#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub api_key: String,
    pub base_url: String,
    /// Max outbound requests per sliding window. TMDB tolerates ~40;
    /// 35 leaves headroom for clock skew.
    pub max_requests: usize,
    pub window: Duration,
    /// Lifetime of the stale fallback copy kept alongside each response.
    pub stale_ttl: Duration,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.themoviedb.org/3/".to_string(),
            max_requests: 35,
            window: Duration::from_secs(10),
            stale_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Rate-limited, cached client for the TMDB API.
///
/// Every `get` first consults the TMDB namespace of the shared cache;
/// only misses wait on the sliding-window governor and go out over HTTP.
/// Successful responses are written back with an endpoint-specific TTL
/// plus a longer-lived stale copy used as a fallback when a later fetch
/// fails.
#[derive(Debug)]
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: Url,
    auth: AuthScheme,
    api_key: String,
    cache: Arc<CacheStore>,
    window: Mutex<SlidingWindow>,
    stale_ttl: Duration,
}

impl TmdbClient {
    pub fn new(config: TmdbConfig, cache: Arc<CacheStore>) -> Result<Self> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let auth = if config.api_key.len() > V3_KEY_LEN {
            AuthScheme::Bearer
        } else {
            AuthScheme::QueryKey
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base_url,
            auth,
            api_key: config.api_key,
            cache,
            window: Mutex::new(SlidingWindow::new(config.max_requests, config.window)),
            stale_ttl: config.stale_ttl,
        })
    }

    /// TTL per endpoint volatility: listings and searches churn, details
    /// and the genre list barely move.
    fn default_ttl(endpoint: &str) -> Duration {
        if endpoint.starts_with("genre/") {
            return DETAILS_TTL;
        }
        if let Some(rest) = endpoint.strip_prefix("movie/") {
            if rest.parse::<i64>().is_ok() {
                return DETAILS_TTL;
            }
        }
        LISTING_TTL
    }

    /// Fetch an endpoint with the default TTL for its volatility class.
    pub async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        self.get_with_ttl(endpoint, params, Self::default_ttl(endpoint))
            .await
    }

    /// Fetch an endpoint, honoring the cache and the rate governor.
    pub async fn get_with_ttl(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        ttl: Duration,
    ) -> Result<Value> {
        let cache_key = derive_key(endpoint, params);

        if let Some(hit) = self.cache.get(Namespace::Tmdb, &cache_key) {
            return Ok(hit.as_ref().clone());
        }

        governor::acquire(&self.window).await;

        match self.fetch(endpoint, params).await {
            Ok(value) => {
                self.cache.set_with_stale(
                    Namespace::Tmdb,
                    &cache_key,
                    value.clone(),
                    ttl,
                    self.stale_ttl,
                );
                Ok(value)
            }
            Err(err) => {
                if let Some(stale) = self.cache.get_stale(Namespace::Tmdb, &cache_key) {
                    tracing::warn!(
                        endpoint = %endpoint,
                        error = %err,
                        "TMDB fetch failed, serving stale cache copy"
                    );
                    return Ok(stale.as_ref().clone());
                }
                Err(err)
            }
        }
    }

    async fn fetch(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        let mut url = self.base_url.join(endpoint.trim_start_matches('/'))?;
        {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                query.append_pair(name, value);
            }
            if self.auth == AuthScheme::QueryKey {
                query.append_pair("api_key", &self.api_key);
            }
        }

        let mut request = self.http.get(url);
        if self.auth == AuthScheme::Bearer {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            // TMDB error bodies carry a human-readable status_message.
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| {
                    body.get("status_message")
                        .and_then(Value::as_str)
                        .map(String::from)
                })
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("upstream error")
                        .to_string()
                });
            return Err(TmdbError::UpstreamStatus {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| TmdbError::InvalidRequest(format!("malformed TMDB response: {e}")))
    }

    // ---- Endpoint helpers ----

    pub async fn popular(&self, page: usize) -> Result<Value> {
        self.get("movie/popular", &[("page", page.to_string())]).await
    }

    pub async fn now_playing(&self, page: usize) -> Result<Value> {
        self.get("movie/now_playing", &[("page", page.to_string())])
            .await
    }

    pub async fn upcoming(&self, page: usize) -> Result<Value> {
        self.get("movie/upcoming", &[("page", page.to_string())])
            .await
    }

    pub async fn top_rated(&self, page: usize) -> Result<Value> {
        self.get("movie/top_rated", &[("page", page.to_string())])
            .await
    }

    pub async fn genres(&self) -> Result<Value> {
        self.get("genre/movie/list", &[]).await
    }

    pub async fn search(&self, query: &str, page: usize) -> Result<Value> {
        self.get(
            "search/movie",
            &[("query", query.to_string()), ("page", page.to_string())],
        )
        .await
    }

    /// Movie details with cast, crew, and videos folded into one call.
    pub async fn movie_details(&self, tmdb_id: i64) -> Result<Value> {
        self.get(
            &format!("movie/{tmdb_id}"),
            &[("append_to_response", "credits,videos".to_string())],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_classes_by_endpoint() {
        assert_eq!(TmdbClient::default_ttl("movie/popular"), LISTING_TTL);
        assert_eq!(TmdbClient::default_ttl("search/movie"), LISTING_TTL);
        assert_eq!(TmdbClient::default_ttl("movie/550"), DETAILS_TTL);
        assert_eq!(TmdbClient::default_ttl("genre/movie/list"), DETAILS_TTL);
    }

    #[test]
    fn credential_length_selects_auth_scheme() {
        let cache = Arc::new(CacheStore::new());

        let v3 = TmdbClient::new(
            TmdbConfig {
                api_key: "a".repeat(32),
                ..TmdbConfig::default()
            },
            Arc::clone(&cache),
        )
        .unwrap();
        assert_eq!(v3.auth, AuthScheme::QueryKey);

        let v4 = TmdbClient::new(
            TmdbConfig {
                api_key: "a".repeat(200),
                ..TmdbConfig::default()
            },
            cache,
        )
        .unwrap();
        assert_eq!(v4.auth, AuthScheme::Bearer);
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let cache = Arc::new(CacheStore::new());
        let client = TmdbClient::new(
            TmdbConfig {
                base_url: "http://localhost:1234/3".into(),
                ..TmdbConfig::default()
            },
            cache,
        )
        .unwrap();
        assert_eq!(client.base_url.as_str(), "http://localhost:1234/3/");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let cache = Arc::new(CacheStore::new());
        let err = TmdbClient::new(
            TmdbConfig {
                base_url: "not a url".into(),
                ..TmdbConfig::default()
            },
            cache,
        )
        .unwrap_err();
        assert!(matches!(err, TmdbError::InvalidRequest(_)));
    }
}
