use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use reelhub_cache::CacheStore;
use reelhub_db_memory::InMemoryStore;
use reelhub_tmdb::TmdbClient;

use crate::{config::AppConfig, handlers, middleware as app_middleware, state::AppState};

pub struct ReelhubServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    // Development responses carry the underlying message of server errors
    // as a detail field; production bodies stay generic.
    reelhub_api::expose_error_detail(state.config.is_development());
    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::system::root))
        .route("/healthz", get(handlers::system::healthz))
        .route("/readyz", get(handlers::system::readyz))
        // Cache administration
        .route("/api/cache/stats", get(handlers::system::cache_stats))
        .route("/api/cache/flush", post(handlers::system::cache_flush))
        // Users
        .route("/api/users", post(handlers::users::register))
        .route(
            "/api/users/{id}",
            get(handlers::users::get_user).patch(handlers::users::update_user),
        )
        .route(
            "/api/users/{id}/favorites",
            get(handlers::users::list_favorites),
        )
        .route(
            "/api/users/{id}/favorites/{tmdb_id}",
            post(handlers::users::add_favorite).delete(handlers::users::remove_favorite),
        )
        .route(
            "/api/users/{id}/watch-later",
            get(handlers::users::list_watch_later),
        )
        .route(
            "/api/users/{id}/watch-later/{tmdb_id}",
            post(handlers::users::add_watch_later).delete(handlers::users::remove_watch_later),
        )
        // Movies
        .route("/api/movies/popular", get(handlers::movies::popular))
        .route("/api/movies/now-playing", get(handlers::movies::now_playing))
        .route("/api/movies/upcoming", get(handlers::movies::upcoming))
        .route("/api/movies/top-rated", get(handlers::movies::top_rated))
        .route("/api/movies/search", get(handlers::movies::search))
        .route("/api/movies/genres", get(handlers::movies::genres))
        .route("/api/movies/{tmdb_id}", get(handlers::movies::detail))
        .route(
            "/api/movies/{tmdb_id}/featured",
            post(handlers::movies::toggle_featured),
        )
        .route(
            "/api/movies/{tmdb_id}/reviews",
            get(handlers::reviews::list_for_movie),
        )
        // Reviews
        .route("/api/reviews", post(handlers::reviews::create))
        .route(
            "/api/reviews/{id}",
            get(handlers::reviews::get_review)
                .patch(handlers::reviews::update)
                .delete(handlers::reviews::delete),
        )
        // Comments
        .route(
            "/api/reviews/{review_id}/comments",
            get(handlers::comments::list_for_review).post(handlers::comments::create),
        )
        .route(
            "/api/comments/{id}",
            patch(handlers::comments::update).delete(handlers::comments::delete),
        )
        // Likes
        .route("/api/likes/{kind}/{id}", post(handlers::likes::toggle))
        // Middleware stack; later layers wrap earlier ones, so the
        // request-id layer sits outside the trace layer and the span can
        // read the id from extensions.
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %method,
                        http.target = %uri,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> anyhow::Result<ReelhubServer> {
        let cache = Arc::new(CacheStore::new());
        let tmdb = TmdbClient::new(self.config.tmdb_client_config(), Arc::clone(&cache))?;
        let state = AppState::new(
            Arc::new(InMemoryStore::new()),
            cache,
            Arc::new(tmdb),
            self.config,
        );
        let app = build_app(state);

        Ok(ReelhubServer {
            addr: self.addr,
            app,
        })
    }
}

impl ReelhubServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
