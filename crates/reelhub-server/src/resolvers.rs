//! Read-through resolvers bridging the cache, local storage, and TMDB.
//!
//! A movie is resolved cache-first, then storage, then upstream. The
//! local projection is created lazily on first resolution and refreshed
//! when it is older than the configured freshness window; a failed
//! refresh logs and serves the stale local record rather than erroring.
//! Concurrent resolutions of the same id are not deduplicated - racing
//! fetches write the same projection and the last write wins.

use reelhub_api::{ApiError, ApiResult};
use reelhub_cache::Namespace;
use reelhub_core::{Collection, Movie, PageInfo, PageRequest, Review};
use reelhub_storage::{Filter, Query, Sort};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::AppState;

pub fn movie_cache_key(tmdb_id: i64) -> String {
    format!("movie_{tmdb_id}")
}

pub fn review_page_cache_key(tmdb_id: i64, page: PageRequest) -> String {
    format!("reviews_{tmdb_id}_p{}_s{}", page.page, page.per_page)
}

/// Resolve a movie by TMDB id, creating or refreshing the local
/// projection as needed. Issues at most one upstream fetch per call.
pub async fn resolve_movie(state: &AppState, tmdb_id: i64) -> ApiResult<Movie> {
    let cache_key = movie_cache_key(tmdb_id);

    if let Some(hit) = state.cache.get(Namespace::Movies, &cache_key) {
        if let Ok(movie) = serde_json::from_value::<Movie>(hit.as_ref().clone()) {
            return Ok(movie);
        }
        // Undecodable cache entries are dropped and resolved fresh.
        state.cache.delete(Namespace::Movies, &cache_key);
    }

    if let Some(mut movie) = find_movie_record(state, tmdb_id).await? {
        if movie.is_stale(state.config.freshness()) {
            refresh_movie(state, &mut movie).await;
        }
        cache_movie(state, &movie);
        return Ok(movie);
    }

    // First resolution of this id: fetch, project, persist.
    let details = state.tmdb.movie_details(tmdb_id).await?;
    let movie = Movie::from_tmdb(tmdb_id, &details).map_err(ApiError::from)?;
    let doc = encode(&movie)?;
    match state.store.insert(Collection::Movies, &doc).await {
        Ok(_) => {}
        // A racing resolver persisted the same id first; use its record.
        Err(e) if e.is_conflict() => {
            if let Some(existing) = find_movie_record(state, tmdb_id).await? {
                cache_movie(state, &existing);
                return Ok(existing);
            }
        }
        Err(e) => return Err(e.into()),
    }
    tracing::info!(tmdb_id, title = %movie.title, "movie projection created");
    cache_movie(state, &movie);
    Ok(movie)
}

/// Cached page of reviews for one movie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub info: PageInfo,
}

/// Resolve one page of reviews for a movie, newest first.
pub async fn resolve_review_page(
    state: &AppState,
    tmdb_id: i64,
    page: PageRequest,
) -> ApiResult<ReviewPage> {
    let cache_key = review_page_cache_key(tmdb_id, page);

    if let Some(hit) = state.cache.get(Namespace::Reviews, &cache_key) {
        if let Ok(cached) = serde_json::from_value::<ReviewPage>(hit.as_ref().clone()) {
            return Ok(cached);
        }
        state.cache.delete(Namespace::Reviews, &cache_key);
    }

    let query = Query::new()
        .filter(Filter::eq("tmdbId", tmdb_id))
        .sort(Sort::desc("createdAt"))
        .paginate(page.offset(), page.limit());
    let result = state.store.find(Collection::Reviews, &query).await?;

    let reviews = result
        .entries
        .iter()
        .map(|doc| {
            doc.decode::<Review>()
                .map_err(|e| ApiError::internal(format!("corrupt review document: {e}")))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    let page_data = ReviewPage {
        reviews,
        info: PageInfo::new(page, result.total),
    };
    if let Ok(value) = serde_json::to_value(&page_data) {
        state
            .cache
            .set(Namespace::Reviews, &cache_key, value, state.config.review_ttl());
    }
    Ok(page_data)
}

/// Drop every cached review page for a movie. Called on any review
/// mutation under that tmdb_id.
pub fn invalidate_review_pages(state: &AppState, tmdb_id: i64) {
    state
        .cache
        .invalidate_pattern(Namespace::Reviews, &format!("reviews_{tmdb_id}"));
}

/// Recompute `review_count` and `local_rating_avg` on the movie record
/// after a review mutation, then drop the cached projection so the next
/// resolution observes the new aggregates.
pub async fn recompute_movie_aggregates(state: &AppState, tmdb_id: i64) -> ApiResult<()> {
    let query = Query::new().filter(Filter::eq("tmdbId", tmdb_id));
    let result = state.store.find(Collection::Reviews, &query).await?;

    let count = result.total as u64;
    let avg = if result.entries.is_empty() {
        0.0
    } else {
        let sum: f64 = result
            .entries
            .iter()
            .filter_map(|doc| doc.document.get("rating").and_then(Value::as_f64))
            .sum();
        sum / result.entries.len() as f64
    };

    if let Some(mut movie) = find_movie_record(state, tmdb_id).await? {
        movie.set_aggregates(count, avg);
        let doc = encode(&movie)?;
        state.store.update(Collection::Movies, &movie.id, &doc).await?;
    }
    state
        .cache
        .delete(Namespace::Movies, &movie_cache_key(tmdb_id));
    Ok(())
}

/// Look up the persisted movie projection by TMDB id.
pub async fn find_movie_record(state: &AppState, tmdb_id: i64) -> ApiResult<Option<Movie>> {
    let query = Query::new()
        .filter(Filter::eq("tmdbId", tmdb_id))
        .paginate(0, 1);
    let result = state.store.find(Collection::Movies, &query).await?;
    match result.entries.into_iter().next() {
        Some(doc) => doc
            .decode::<Movie>()
            .map(Some)
            .map_err(|e| ApiError::internal(format!("corrupt movie document: {e}"))),
        None => Ok(None),
    }
}

/// Persist an updated movie projection and re-cache it.
pub async fn persist_movie(state: &AppState, movie: &Movie) -> ApiResult<()> {
    let doc = encode(movie)?;
    state.store.update(Collection::Movies, &movie.id, &doc).await?;
    cache_movie(state, movie);
    Ok(())
}

async fn refresh_movie(state: &AppState, movie: &mut Movie) {
    match state.tmdb.movie_details(movie.tmdb_id).await {
        Ok(details) => {
            if let Err(e) = movie.refresh_from_tmdb(&details) {
                tracing::warn!(tmdb_id = movie.tmdb_id, error = %e, "TMDB refresh payload rejected, keeping stale projection");
                return;
            }
            match encode(movie) {
                Ok(doc) => {
                    if let Err(e) = state.store.update(Collection::Movies, &movie.id, &doc).await {
                        tracing::warn!(tmdb_id = movie.tmdb_id, error = %e, "failed to persist refreshed projection");
                    }
                }
                Err(e) => {
                    tracing::warn!(tmdb_id = movie.tmdb_id, error = %e, "failed to encode refreshed projection");
                }
            }
        }
        // Resolution never fails because a refresh failed.
        Err(e) => {
            tracing::warn!(tmdb_id = movie.tmdb_id, error = %e, "TMDB refresh failed, serving stale projection");
        }
    }
}

fn cache_movie(state: &AppState, movie: &Movie) {
    if let Ok(value) = serde_json::to_value(movie) {
        state.cache.set(
            Namespace::Movies,
            &movie_cache_key(movie.tmdb_id),
            value,
            state.config.movie_ttl(),
        );
    }
}

fn encode<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(format!("encode failure: {e}")))
}
