//! End-to-end endpoint tests against a server on an ephemeral port,
//! with TMDB stubbed by wiremock.

use std::net::Ipv4Addr;
use std::sync::Arc;

use reelhub_cache::CacheStore;
use reelhub_core::{Collection, UserRole};
use reelhub_db_memory::InMemoryStore;
use reelhub_server::{build_app, AppConfig, AppState};
use reelhub_storage::DocumentStore as _;
use reelhub_tmdb::TmdbClient;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_app(tmdb: &MockServer) -> (String, AppState) {
    let mut cfg = AppConfig::default();
    cfg.server.host = "127.0.0.1".into();
    cfg.tmdb.base_url = tmdb.uri();
    cfg.tmdb.api_key = "test-key".into();

    let cache = Arc::new(CacheStore::new());
    let client = TmdbClient::new(cfg.tmdb_client_config(), Arc::clone(&cache)).unwrap();
    let state = AppState::new(
        Arc::new(InMemoryStore::new()),
        cache,
        Arc::new(client),
        cfg,
    );
    let app = build_app(state.clone());

    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), state)
}

fn movie_details(tmdb_id: i64, title: &str) -> Value {
    json!({
        "id": tmdb_id,
        "title": title,
        "overview": "o",
        "vote_average": 7.5,
        "vote_count": 100,
        "genres": [{"id": 18, "name": "Drama"}],
        "credits": {"cast": []},
        "videos": {"results": []}
    })
}

async fn mount_movie(tmdb: &MockServer, tmdb_id: i64, title: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/movie/{tmdb_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(movie_details(tmdb_id, title)))
        .mount(tmdb)
        .await;
}

async fn register_user(client: &reqwest::Client, base: &str, username: &str) -> String {
    let resp = client
        .post(format!("{base}/api/users"))
        .json(&json!({"username": username, "email": format!("{username}@example.com")}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    body["user"]["id"].as_str().unwrap().to_string()
}

async fn seed_admin(state: &AppState, username: &str) -> String {
    let mut admin = reelhub_core::User::new(username, format!("{username}@example.com"));
    admin.role = UserRole::Admin;
    let doc = serde_json::to_value(&admin).unwrap();
    state
        .store
        .insert(Collection::Users, &doc)
        .await
        .unwrap();
    admin.id
}

#[tokio::test]
async fn health_and_info_endpoints() {
    let tmdb = MockServer::start().await;
    let (base, _state) = spawn_app(&tmdb).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/healthz")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client.get(format!("{base}/")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["name"], "reelhub-server");
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn user_registration_and_username_conflict() {
    let tmdb = MockServer::start().await;
    let (base, _state) = spawn_app(&tmdb).await;
    let client = reqwest::Client::new();

    register_user(&client, &base, "marta").await;

    let resp = client
        .post(format!("{base}/api/users"))
        .json(&json!({"username": "marta", "email": "other@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "conflict");

    let resp = client
        .post(format!("{base}/api/users"))
        .json(&json!({"username": "ab", "email": "short@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn movie_detail_fetches_upstream_exactly_once() {
    let tmdb = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/550"))
        .respond_with(ResponseTemplate::new(200).set_body_json(movie_details(550, "Fight Club")))
        .expect(1)
        .mount(&tmdb)
        .await;

    let (base, _state) = spawn_app(&tmdb).await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let resp = client
            .get(format!("{base}/api/movies/550"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["movie"]["title"], "Fight Club");
        assert_eq!(body["movie"]["tmdbId"], 550);
    }
    tmdb.verify().await;
}

#[tokio::test]
async fn unknown_movie_is_404() {
    let tmdb = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/999999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status_message": "The resource you requested could not be found."
        })))
        .mount(&tmdb)
        .await;

    let (base, _state) = spawn_app(&tmdb).await;
    let resp = reqwest::get(format!("{base}/api/movies/999999")).await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn popular_listing_reshapes_tmdb_pagination() {
    let tmdb = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/popular"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 2,
            "results": [{"id": 1, "title": "A"}],
            "total_pages": 3,
            "total_results": 50
        })))
        .mount(&tmdb)
        .await;

    let (base, _state) = spawn_app(&tmdb).await;
    let resp = reqwest::get(format!("{base}/api/movies/popular?page=2"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["movies"][0]["title"], "A");
    assert_eq!(body["pagination"]["currentPage"], 2);
    assert_eq!(body["pagination"]["totalPages"], 3);
    assert_eq!(body["pagination"]["hasNextPage"], true);
    assert_eq!(body["pagination"]["hasPrevPage"], true);
}

#[tokio::test]
async fn upstream_failures_return_generic_message_with_dev_detail() {
    let tmdb = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/popular"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "status_message": "Internal error: Something went wrong."
        })))
        .mount(&tmdb)
        .await;

    // Default configuration is the development environment.
    let (base, _state) = spawn_app(&tmdb).await;
    let resp = reqwest::get(format!("{base}/api/movies/popular"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "upstream_error");
    assert_eq!(body["message"], "Upstream service unavailable");
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("Something went wrong"), "detail was {detail:?}");
}

#[tokio::test]
async fn search_requires_query() {
    let tmdb = MockServer::start().await;
    let (base, _state) = spawn_app(&tmdb).await;
    let resp = reqwest::get(format!("{base}/api/movies/search?query=")).await.unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn review_lifecycle_updates_aggregates() {
    let tmdb = MockServer::start().await;
    mount_movie(&tmdb, 550, "Fight Club").await;

    let (base, _state) = spawn_app(&tmdb).await;
    let client = reqwest::Client::new();
    let author = register_user(&client, &base, "author").await;

    // Create
    let resp = client
        .post(format!("{base}/api/reviews"))
        .header("x-user-id", &author)
        .json(&json!({"tmdbId": 550, "rating": 8, "title": "Great", "body": "Loved it"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    let review_id = body["review"]["id"].as_str().unwrap().to_string();

    // One review per author per movie
    let resp = client
        .post(format!("{base}/api/reviews"))
        .header("x-user-id", &author)
        .json(&json!({"tmdbId": 550, "rating": 5, "title": "Again", "body": "Twice"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // Aggregates land on the movie projection
    let resp = client
        .get(format!("{base}/api/movies/550"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["movie"]["reviewCount"], 1);
    assert_eq!(body["movie"]["localRatingAvg"], 8.0);

    // Listing
    let resp = client
        .get(format!("{base}/api/movies/550/reviews"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["reviews"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["totalItems"], 1);

    // Only the author may edit
    let other = register_user(&client, &base, "other").await;
    let resp = client
        .patch(format!("{base}/api/reviews/{review_id}"))
        .header("x-user-id", &other)
        .json(&json!({"rating": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // Delete by author empties the listing again
    let resp = client
        .delete(format!("{base}/api/reviews/{review_id}"))
        .header("x-user-id", &author)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .get(format!("{base}/api/movies/550/reviews"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["pagination"]["totalItems"], 0);

    let resp = client
        .get(format!("{base}/api/movies/550"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["movie"]["reviewCount"], 0);
}

#[tokio::test]
async fn reviews_require_identity() {
    let tmdb = MockServer::start().await;
    mount_movie(&tmdb, 550, "Fight Club").await;
    let (base, _state) = spawn_app(&tmdb).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/reviews"))
        .json(&json!({"tmdbId": 550, "rating": 8, "title": "t", "body": "b"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "authorization_error");
}

#[tokio::test]
async fn comments_and_likes() {
    let tmdb = MockServer::start().await;
    mount_movie(&tmdb, 550, "Fight Club").await;
    let (base, _state) = spawn_app(&tmdb).await;
    let client = reqwest::Client::new();
    let author = register_user(&client, &base, "author").await;
    let reader = register_user(&client, &base, "reader").await;

    let resp = client
        .post(format!("{base}/api/reviews"))
        .header("x-user-id", &author)
        .json(&json!({"tmdbId": 550, "rating": 9, "title": "t", "body": "b"}))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let review_id = body["review"]["id"].as_str().unwrap().to_string();

    // Comment
    let resp = client
        .post(format!("{base}/api/reviews/{review_id}/comments"))
        .header("x-user-id", &reader)
        .json(&json!({"body": "agreed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = client
        .get(format!("{base}/api/reviews/{review_id}/comments"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["comments"].as_array().unwrap().len(), 1);
    assert_eq!(body["comments"][0]["body"], "agreed");

    // Like toggles on, then off
    for expected in [true, false] {
        let resp = client
            .post(format!("{base}/api/likes/review/{review_id}"))
            .header("x-user-id", &reader)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["liked"], expected);
    }

    // Unknown kind is a validation error
    let resp = client
        .post(format!("{base}/api/likes/movie/{review_id}"))
        .header("x-user-id", &reader)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn favorites_round_trip() {
    let tmdb = MockServer::start().await;
    mount_movie(&tmdb, 42, "Answer").await;
    let (base, _state) = spawn_app(&tmdb).await;
    let client = reqwest::Client::new();
    let user = register_user(&client, &base, "collector").await;

    let resp = client
        .post(format!("{base}/api/users/{user}/favorites/42"))
        .header("x-user-id", &user)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["favorites"][0], 42);

    let resp = client
        .get(format!("{base}/api/users/{user}/favorites"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["movies"][0]["title"], "Answer");

    // A stranger may not edit someone else's list
    let stranger = register_user(&client, &base, "stranger").await;
    let resp = client
        .delete(format!("{base}/api/users/{user}/favorites/42"))
        .header("x-user-id", &stranger)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = client
        .delete(format!("{base}/api/users/{user}/favorites/42"))
        .header("x-user-id", &user)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["user"]["favorites"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn cache_stats_and_admin_flush() {
    let tmdb = MockServer::start().await;
    mount_movie(&tmdb, 550, "Fight Club").await;
    let (base, state) = spawn_app(&tmdb).await;
    let client = reqwest::Client::new();

    // Populate the movie cache, then read stats
    client
        .get(format!("{base}/api/movies/550"))
        .send()
        .await
        .unwrap();
    let resp = client
        .get(format!("{base}/api/cache/stats"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["cache"]["movies"]["keyCount"], 1);

    // Flush requires an admin
    let user = register_user(&client, &base, "normal").await;
    let resp = client
        .post(format!("{base}/api/cache/flush"))
        .header("x-user-id", &user)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let admin = seed_admin(&state, "boss").await;
    let resp = client
        .post(format!("{base}/api/cache/flush"))
        .header("x-user-id", &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .get(format!("{base}/api/cache/stats"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["cache"]["movies"]["keyCount"], 0);
}

#[tokio::test]
async fn featured_toggle_is_admin_only() {
    let tmdb = MockServer::start().await;
    mount_movie(&tmdb, 550, "Fight Club").await;
    let (base, state) = spawn_app(&tmdb).await;
    let client = reqwest::Client::new();

    let user = register_user(&client, &base, "normal").await;
    let resp = client
        .post(format!("{base}/api/movies/550/featured"))
        .header("x-user-id", &user)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let admin = seed_admin(&state, "boss").await;
    let resp = client
        .post(format!("{base}/api/movies/550/featured"))
        .header("x-user-id", &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["movie"]["featured"], true);
}
