use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use reelhub_api::{ApiError, ApiResult, Envelope};
use reelhub_core::{Collection, Movie, User};
use serde::Deserialize;
use serde_json::Value;

use super::{current_user, decode};
use crate::resolvers;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterUser>,
) -> ApiResult<Envelope> {
    let mut user = User::new(body.username, body.email);
    user.bio = body.bio;
    user.avatar_url = body.avatar_url;
    user.validate().map_err(ApiError::from)?;

    let doc = encode_user(&user)?;
    state.store.insert(Collection::Users, &doc).await?;
    tracing::info!(username = %user.username, "user registered");

    Ok(Envelope::new("User registered successfully")
        .field("user", &user)
        .created())
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Envelope> {
    let user = load_user(&state, &id).await?;
    Ok(Envelope::new("User fetched").field("user", &user))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<UpdateUser>,
) -> ApiResult<Envelope> {
    let caller = current_user(&state, &headers).await?;
    if caller.id != id && !caller.is_admin() {
        return Err(ApiError::forbidden("may only edit your own profile"));
    }

    let mut user = load_user(&state, &id).await?;
    if let Some(username) = body.username {
        user.username = username;
    }
    if let Some(email) = body.email {
        user.email = email;
    }
    if body.bio.is_some() {
        user.bio = body.bio;
    }
    if body.avatar_url.is_some() {
        user.avatar_url = body.avatar_url;
    }
    user.validate().map_err(ApiError::from)?;

    let doc = encode_user(&user)?;
    state.store.update(Collection::Users, &id, &doc).await?;
    Ok(Envelope::new("User updated").field("user", &user))
}

/// Which per-user movie list an endpoint operates on.
#[derive(Debug, Clone, Copy)]
pub enum MovieList {
    Favorites,
    WatchLater,
}

impl MovieList {
    fn name(self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::WatchLater => "watch-later",
        }
    }

    fn entries(self, user: &User) -> &Vec<i64> {
        match self {
            Self::Favorites => &user.favorites,
            Self::WatchLater => &user.watch_later,
        }
    }

    fn entries_mut(self, user: &mut User) -> &mut Vec<i64> {
        match self {
            Self::Favorites => &mut user.favorites,
            Self::WatchLater => &mut user.watch_later,
        }
    }
}

pub async fn list_favorites(
    state: State<AppState>,
    path: Path<String>,
) -> ApiResult<Envelope> {
    list_movies(state, path, MovieList::Favorites).await
}

pub async fn list_watch_later(
    state: State<AppState>,
    path: Path<String>,
) -> ApiResult<Envelope> {
    list_movies(state, path, MovieList::WatchLater).await
}

pub async fn add_favorite(
    state: State<AppState>,
    path: Path<(String, i64)>,
    headers: HeaderMap,
) -> ApiResult<Envelope> {
    modify_list(state, path, headers, MovieList::Favorites, true).await
}

pub async fn remove_favorite(
    state: State<AppState>,
    path: Path<(String, i64)>,
    headers: HeaderMap,
) -> ApiResult<Envelope> {
    modify_list(state, path, headers, MovieList::Favorites, false).await
}

pub async fn add_watch_later(
    state: State<AppState>,
    path: Path<(String, i64)>,
    headers: HeaderMap,
) -> ApiResult<Envelope> {
    modify_list(state, path, headers, MovieList::WatchLater, true).await
}

pub async fn remove_watch_later(
    state: State<AppState>,
    path: Path<(String, i64)>,
    headers: HeaderMap,
) -> ApiResult<Envelope> {
    modify_list(state, path, headers, MovieList::WatchLater, false).await
}

/// Resolve every movie on the list. An id whose resolution fails is
/// skipped with a warning so one bad id does not break the whole page.
async fn list_movies(
    State(state): State<AppState>,
    Path(id): Path<String>,
    list: MovieList,
) -> ApiResult<Envelope> {
    let user = load_user(&state, &id).await?;
    let mut movies: Vec<Movie> = Vec::with_capacity(list.entries(&user).len());
    for tmdb_id in list.entries(&user) {
        match resolvers::resolve_movie(&state, *tmdb_id).await {
            Ok(movie) => movies.push(movie),
            Err(e) => {
                tracing::warn!(tmdb_id, error = %e, "skipping unresolvable list entry");
            }
        }
    }
    Ok(Envelope::new(format!("{} fetched", list.name())).field("movies", &movies))
}

async fn modify_list(
    State(state): State<AppState>,
    Path((id, tmdb_id)): Path<(String, i64)>,
    headers: HeaderMap,
    list: MovieList,
    add: bool,
) -> ApiResult<Envelope> {
    let caller = current_user(&state, &headers).await?;
    if caller.id != id && !caller.is_admin() {
        return Err(ApiError::forbidden("may only edit your own lists"));
    }

    let mut user = load_user(&state, &id).await?;
    let entries = list.entries_mut(&mut user);
    let message = if add {
        // The movie must resolve before it can be saved to a list.
        resolvers::resolve_movie(&state, tmdb_id).await?;
        if !entries.contains(&tmdb_id) {
            entries.push(tmdb_id);
        }
        format!("Added to {}", list.name())
    } else {
        entries.retain(|m| *m != tmdb_id);
        format!("Removed from {}", list.name())
    };

    let doc = encode_user(&user)?;
    state.store.update(Collection::Users, &id, &doc).await?;
    Ok(Envelope::new(message).field("user", &user))
}

async fn load_user(state: &AppState, id: &str) -> ApiResult<User> {
    let doc = state
        .store
        .get(Collection::Users, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {id}")))?;
    decode(&doc)
}

fn encode_user(user: &User) -> ApiResult<Value> {
    serde_json::to_value(user).map_err(|e| ApiError::internal(format!("encode failure: {e}")))
}
