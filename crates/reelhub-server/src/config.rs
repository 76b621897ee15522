use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub tmdb: TmdbSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub resolver: ResolverSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// "development" or "production". Development responses may carry
    /// extra error detail.
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            tmdb: TmdbSettings::default(),
            cache: CacheSettings::default(),
            resolver: ResolverSettings::default(),
            logging: LoggingConfig::default(),
            environment: default_environment(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.storage.backend != "memory" {
            return Err(format!(
                "storage.backend '{}' is not supported, only 'memory'",
                self.storage.backend
            ));
        }
        if self.tmdb.max_requests == 0 {
            return Err("tmdb.max_requests must be > 0".into());
        }
        if self.tmdb.window_secs == 0 {
            return Err("tmdb.window_secs must be > 0".into());
        }
        if self.resolver.freshness_days == 0 {
            return Err("resolver.freshness_days must be > 0".into());
        }
        let env = self.environment.as_str();
        if env != "development" && env != "production" {
            return Err("environment must be 'development' or 'production'".into());
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    /// Returns the base URL for the server.
    /// If `base_url` is configured, returns that; otherwise computes from host:port.
    pub fn base_url(&self) -> String {
        self.server
            .base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.server.host, self.server.port))
    }

    /// Settings for constructing the TMDB client.
    pub fn tmdb_client_config(&self) -> reelhub_tmdb::TmdbConfig {
        reelhub_tmdb::TmdbConfig {
            api_key: self.tmdb.api_key.clone(),
            base_url: self.tmdb.base_url.clone(),
            max_requests: self.tmdb.max_requests,
            window: Duration::from_secs(self.tmdb.window_secs),
            stale_ttl: Duration::from_secs(self.cache.stale_ttl_secs),
        }
    }

    /// How long a resolved movie projection stays fresh before the next
    /// resolution refreshes it from TMDB.
    pub fn freshness(&self) -> time::Duration {
        time::Duration::days(self.resolver.freshness_days as i64)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn movie_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.movie_ttl_secs)
    }

    pub fn review_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.review_ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base URL for the server, used in links and responses.
    /// If not set, defaults to http://{host}:{port}
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    1024 * 1024
}
fn default_environment() -> String {
    "development".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend name. Only "memory" is implemented; a database
    /// backend would register here behind the same trait.
    #[serde(default = "default_storage_backend")]
    pub backend: String,
}

fn default_storage_backend() -> String {
    "memory".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbSettings {
    /// TMDB credential. v3 keys go out as an api_key query parameter,
    /// v4 tokens as a bearer header.
    /// Prefer setting via REELHUB__TMDB__API_KEY rather than the file.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,
    #[serde(default = "default_tmdb_max_requests")]
    pub max_requests: usize,
    #[serde(default = "default_tmdb_window_secs")]
    pub window_secs: u64,
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3/".into()
}
fn default_tmdb_max_requests() -> usize {
    35
}
fn default_tmdb_window_secs() -> u64 {
    10
}

impl Default for TmdbSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_tmdb_base_url(),
            max_requests: default_tmdb_max_requests(),
            window_secs: default_tmdb_window_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// TTL for resolved movie records in the Movies namespace.
    #[serde(default = "default_movie_ttl_secs")]
    pub movie_ttl_secs: u64,
    /// TTL for cached review pages in the Reviews namespace.
    #[serde(default = "default_review_ttl_secs")]
    pub review_ttl_secs: u64,
    /// TTL for the stale fallback copies of TMDB responses.
    #[serde(default = "default_stale_ttl_secs")]
    pub stale_ttl_secs: u64,
}

fn default_movie_ttl_secs() -> u64 {
    600
}
fn default_review_ttl_secs() -> u64 {
    300
}
fn default_stale_ttl_secs() -> u64 {
    24 * 60 * 60
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            movie_ttl_secs: default_movie_ttl_secs(),
            review_ttl_secs: default_review_ttl_secs(),
            stale_ttl_secs: default_stale_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverSettings {
    /// Movie projections older than this many days are refreshed from
    /// TMDB on the next resolution.
    #[serde(default = "default_freshness_days")]
    pub freshness_days: u64,
}

fn default_freshness_days() -> u64 {
    7
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            freshness_days: default_freshness_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                let default_path = PathBuf::from("reelhub.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g. REELHUB__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("REELHUB")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.tmdb.max_requests, 35);
        assert_eq!(cfg.resolver.freshness_days, 7);
        assert_eq!(cfg.environment, "development");
    }

    #[test]
    fn invalid_log_level_rejected() {
        let mut cfg = AppConfig::default();
        cfg.logging.level = "verbose".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unsupported_backend_rejected() {
        let mut cfg = AppConfig::default();
        cfg.storage.backend = "postgres".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn addr_falls_back_to_any_interface() {
        let mut cfg = AppConfig::default();
        cfg.server.host = "not an ip".into();
        assert_eq!(cfg.addr().ip().to_string(), "0.0.0.0");
    }

    #[test]
    fn file_overrides_merge_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reelhub.toml");
        std::fs::write(
            &path,
            r#"
environment = "production"

[server]
port = 9090

[tmdb]
api_key = "abc"
"#,
        )
        .unwrap();

        let cfg = loader::load_config(path.to_str()).unwrap();
        assert_eq!(cfg.environment, "production");
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.tmdb.api_key, "abc");
        // Untouched sections keep their defaults
        assert_eq!(cfg.cache.movie_ttl_secs, 600);
        assert_eq!(cfg.storage.backend, "memory");
    }

    #[test]
    fn base_url_prefers_configured_value() {
        let mut cfg = AppConfig::default();
        assert_eq!(cfg.base_url(), "http://0.0.0.0:8080");
        cfg.server.base_url = Some("https://reelhub.example.com".into());
        assert_eq!(cfg.base_url(), "https://reelhub.example.com");
    }
}
