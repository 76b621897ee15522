use crate::error::{CoreError, Result};
use crate::time::now_utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{Duration, OffsetDateTime};

/// Role attached to a user document. Admins may feature movies and
/// moderate any review or comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    /// TMDB ids of favorited movies.
    #[serde(default)]
    pub favorites: Vec<i64>,
    /// TMDB ids queued for later.
    #[serde(default)]
    pub watch_later: Vec<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            email: email.into(),
            bio: None,
            avatar_url: None,
            role: UserRole::User,
            favorites: Vec::new(),
            watch_later: Vec::new(),
            created_at: now_utc(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.username.trim().len() < 3 {
            return Err(CoreError::validation(
                "username",
                "must be at least 3 characters",
            ));
        }
        if !self.email.contains('@') {
            return Err(CoreError::validation("email", "must be a valid address"));
        }
        Ok(())
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Persisted projection of TMDB movie metadata plus locally computed
/// review aggregates. Created lazily on first resolution of a TMDB id,
/// refreshed when older than the freshness threshold, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: String,
    pub tmdb_id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<i64>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i64,
    /// Top-billed cast entries as returned by TMDB (`credits.cast`).
    #[serde(default)]
    pub cast: Vec<Value>,
    /// Trailer/teaser entries as returned by TMDB (`videos.results`).
    #[serde(default)]
    pub videos: Vec<Value>,
    /// Number of local reviews for this movie.
    #[serde(default)]
    pub review_count: u64,
    /// Average local review rating, 0.0 when no reviews exist.
    #[serde(default)]
    pub local_rating_avg: f64,
    #[serde(default)]
    pub featured: bool,
    /// When this projection was last rebuilt from TMDB.
    #[serde(with = "time::serde::rfc3339")]
    pub refreshed_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Movie {
    /// Build a projection from a TMDB movie-details payload
    /// (`/movie/{id}?append_to_response=credits,videos`).
    ///
    /// Missing optional fields are tolerated; a missing title is a
    /// validation error since TMDB always sends one for real movies.
    pub fn from_tmdb(tmdb_id: i64, details: &Value) -> Result<Self> {
        let title = details
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::validation("title", "missing in TMDB payload"))?
            .to_string();

        let genres = details
            .get("genres")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|g| {
                        Some(Genre {
                            id: uuid::Uuid::new_v4().to_string(),
                            tmdb_id: g.get("id")?.as_i64()?,
                            name: g.get("name")?.as_str()?.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        // Cast is capped to the top billing order; full crews are large
        // and unused by the frontend.
        let cast = details
            .pointer("/credits/cast")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().take(15).cloned().collect())
            .unwrap_or_default();

        let videos = details
            .pointer("/videos/results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let now = now_utc();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            tmdb_id,
            title,
            overview: string_field(details, "overview"),
            poster_path: string_field(details, "poster_path"),
            backdrop_path: string_field(details, "backdrop_path"),
            release_date: string_field(details, "release_date"),
            runtime: details.get("runtime").and_then(Value::as_i64),
            genres,
            vote_average: details
                .get("vote_average")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
            vote_count: details
                .get("vote_count")
                .and_then(Value::as_i64)
                .unwrap_or(0),
            cast,
            videos,
            review_count: 0,
            local_rating_avg: 0.0,
            featured: false,
            refreshed_at: now,
            created_at: now,
        })
    }

    /// Whether the projection is older than the freshness threshold and
    /// should be refreshed from TMDB on next resolution.
    pub fn is_stale(&self, freshness: Duration) -> bool {
        now_utc() - self.refreshed_at > freshness
    }

    /// Replace the TMDB-derived fields from a fresh details payload,
    /// keeping local identity, aggregates, and the featured flag.
    pub fn refresh_from_tmdb(&mut self, details: &Value) -> Result<()> {
        let fresh = Movie::from_tmdb(self.tmdb_id, details)?;
        self.title = fresh.title;
        self.overview = fresh.overview;
        self.poster_path = fresh.poster_path;
        self.backdrop_path = fresh.backdrop_path;
        self.release_date = fresh.release_date;
        self.runtime = fresh.runtime;
        self.genres = fresh.genres;
        self.vote_average = fresh.vote_average;
        self.vote_count = fresh.vote_count;
        self.cast = fresh.cast;
        self.videos = fresh.videos;
        self.refreshed_at = now_utc();
        Ok(())
    }

    /// Apply recomputed local review aggregates.
    pub fn set_aggregates(&mut self, review_count: u64, local_rating_avg: f64) {
        self.review_count = review_count;
        self.local_rating_avg = local_rating_avg;
    }
}

fn string_field(v: &Value, field: &str) -> Option<String> {
    v.get(field).and_then(Value::as_str).map(String::from)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub tmdb_id: i64,
    pub author_id: String,
    /// 1..=10 inclusive.
    pub rating: u8,
    pub title: String,
    pub body: String,
    /// Ids of users who liked this review.
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Review {
    pub fn new(
        tmdb_id: i64,
        author_id: impl Into<String>,
        rating: u8,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let now = now_utc();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tmdb_id,
            author_id: author_id.into(),
            rating,
            title: title.into(),
            body: body.into(),
            likes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=10).contains(&self.rating) {
            return Err(CoreError::validation(
                "rating",
                "must be between 1 and 10",
            ));
        }
        if self.title.trim().is_empty() {
            return Err(CoreError::validation("title", "must not be empty"));
        }
        if self.body.trim().is_empty() {
            return Err(CoreError::validation("body", "must not be empty"));
        }
        Ok(())
    }

    /// Toggle a like; returns true when the like is now present.
    pub fn toggle_like(&mut self, user_id: &str) -> bool {
        if let Some(pos) = self.likes.iter().position(|u| u == user_id) {
            self.likes.remove(pos);
            false
        } else {
            self.likes.push(user_id.to_string());
            true
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub review_id: String,
    pub author_id: String,
    pub body: String,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Comment {
    pub fn new(
        review_id: impl Into<String>,
        author_id: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let now = now_utc();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            review_id: review_id.into(),
            author_id: author_id.into(),
            body: body.into(),
            likes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.body.trim().is_empty() {
            return Err(CoreError::validation("body", "must not be empty"));
        }
        Ok(())
    }

    /// Toggle a like; returns true when the like is now present.
    pub fn toggle_like(&mut self, user_id: &str) -> bool {
        if let Some(pos) = self.likes.iter().position(|u| u == user_id) {
            self.likes.remove(pos);
            false
        } else {
            self.likes.push(user_id.to_string());
            true
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genre {
    pub id: String,
    pub tmdb_id: i64,
    pub name: String,
}
