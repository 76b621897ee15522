use std::sync::Arc;

use reelhub_cache::CacheStore;
use reelhub_storage::DynStore;
use reelhub_tmdb::TmdbClient;

use crate::config::AppConfig;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub cache: Arc<CacheStore>,
    pub tmdb: Arc<TmdbClient>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        store: DynStore,
        cache: Arc<CacheStore>,
        tmdb: Arc<TmdbClient>,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            cache,
            tmdb,
            config: Arc::new(config),
        }
    }
}
