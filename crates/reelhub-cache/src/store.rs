use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// The three logical key spaces the cache serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Raw TMDB API responses, keyed by canonical endpoint+params key.
    Tmdb,
    /// Resolved movie records, keyed `movie_{tmdb_id}`.
    Movies,
    /// Review-list pages, keyed `reviews_{tmdb_id}_p{page}_s{size}`.
    Reviews,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [Namespace::Tmdb, Namespace::Movies, Namespace::Reviews];

    fn index(self) -> usize {
        match self {
            Namespace::Tmdb => 0,
            Namespace::Movies => 1,
            Namespace::Reviews => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Namespace::Tmdb => "tmdb",
            Namespace::Movies => "movies",
            Namespace::Reviews => "reviews",
        }
    }
}

/// A cached entry with its own expiry.
///
/// The value is wrapped in `Arc` so cache hits clone a pointer, not a
/// potentially large JSON tree.
#[derive(Clone, Debug)]
struct CachedEntry {
    value: Arc<Value>,
    cached_at: Instant,
    ttl: Duration,
}

impl CachedEntry {
    fn new(value: Arc<Value>, ttl: Duration) -> Self {
        Self {
            value,
            cached_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.cached_at.elapsed() > self.ttl
    }
}

#[derive(Debug, Default)]
struct Shard {
    fresh: DashMap<String, CachedEntry>,
    stale: DashMap<String, CachedEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Hit/miss/key counts for one namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceStats {
    pub hits: u64,
    pub misses: u64,
    pub key_count: usize,
}

/// Per-namespace cache statistics, for the observability endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub tmdb: NamespaceStats,
    pub movies: NamespaceStats,
    pub reviews: NamespaceStats,
}

/// Namespaced in-memory TTL cache.
///
/// All operations are total: lookups of expired or missing keys return
/// `None`, writes always succeed. Expired entries are swept lazily on
/// read and are excluded from key counts.
#[derive(Debug)]
pub struct CacheStore {
    shards: [Shard; 3],
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore {
    pub fn new() -> Self {
        Self {
            shards: [Shard::default(), Shard::default(), Shard::default()],
        }
    }

    fn shard(&self, ns: Namespace) -> &Shard {
        &self.shards[ns.index()]
    }

    /// Get a fresh value; expired entries are removed and count as misses.
    pub fn get(&self, ns: Namespace, key: &str) -> Option<Arc<Value>> {
        let shard = self.shard(ns);
        if let Some(entry) = shard.fresh.get(key) {
            if !entry.is_expired() {
                shard.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(namespace = ns.name(), key = %key, "cache hit");
                return Some(Arc::clone(&entry.value));
            }
            drop(entry);
            shard.fresh.remove(key);
        }
        shard.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(namespace = ns.name(), key = %key, "cache miss");
        None
    }

    /// Set a value with a TTL. Every write carries an expiry.
    pub fn set(&self, ns: Namespace, key: &str, value: Value, ttl: Duration) {
        let entry = CachedEntry::new(Arc::new(value), ttl);
        self.shard(ns).fresh.insert(key.to_string(), entry);
    }

    /// Set a value and additionally retain a longer-lived stale copy,
    /// consulted by [`get_stale`](Self::get_stale) on fetch failure.
    pub fn set_with_stale(
        &self,
        ns: Namespace,
        key: &str,
        value: Value,
        ttl: Duration,
        stale_ttl: Duration,
    ) {
        let value = Arc::new(value);
        let shard = self.shard(ns);
        shard
            .fresh
            .insert(key.to_string(), CachedEntry::new(Arc::clone(&value), ttl));
        shard
            .stale
            .insert(key.to_string(), CachedEntry::new(value, stale_ttl));
    }

    /// Get the stale copy of a key, if one exists and has not expired.
    /// Does not touch hit/miss statistics; this is a failure fallback,
    /// not a regular read path.
    pub fn get_stale(&self, ns: Namespace, key: &str) -> Option<Arc<Value>> {
        let shard = self.shard(ns);
        if let Some(entry) = shard.stale.get(key) {
            if !entry.is_expired() {
                return Some(Arc::clone(&entry.value));
            }
            drop(entry);
            shard.stale.remove(key);
        }
        None
    }

    /// Delete a key from both tiers.
    pub fn delete(&self, ns: Namespace, key: &str) {
        let shard = self.shard(ns);
        shard.fresh.remove(key);
        shard.stale.remove(key);
        tracing::debug!(namespace = ns.name(), key = %key, "cache delete");
    }

    /// Remove every key in the namespace containing the substring, from
    /// both tiers. O(n) in the namespace's entry count.
    pub fn invalidate_pattern(&self, ns: Namespace, pattern: &str) {
        let shard = self.shard(ns);
        shard.fresh.retain(|k, _| !k.contains(pattern));
        shard.stale.retain(|k, _| !k.contains(pattern));
        tracing::debug!(namespace = ns.name(), pattern = %pattern, "cache pattern invalidation");
    }

    /// Clear all namespaces and reset statistics.
    pub fn flush_all(&self) {
        for shard in &self.shards {
            shard.fresh.clear();
            shard.stale.clear();
            shard.hits.store(0, Ordering::Relaxed);
            shard.misses.store(0, Ordering::Relaxed);
        }
        tracing::info!("cache flushed");
    }

    fn namespace_stats(&self, ns: Namespace) -> NamespaceStats {
        let shard = self.shard(ns);
        NamespaceStats {
            hits: shard.hits.load(Ordering::Relaxed),
            misses: shard.misses.load(Ordering::Relaxed),
            key_count: shard
                .fresh
                .iter()
                .filter(|entry| !entry.is_expired())
                .count(),
        }
    }

    /// Per-namespace statistics snapshot.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            tmdb: self.namespace_stats(Namespace::Tmdb),
            movies: self.namespace_stats(Namespace::Movies),
            reviews: self.namespace_stats(Namespace::Reviews),
        }
    }
}
