use reelhub_cache::CacheStore;
use reelhub_tmdb::{TmdbClient, TmdbConfig, TmdbError};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, api_key: &str) -> TmdbClient {
    TmdbClient::new(
        TmdbConfig {
            api_key: api_key.to_string(),
            base_url: server.uri(),
            ..TmdbConfig::default()
        },
        Arc::new(CacheStore::new()),
    )
    .unwrap()
}

#[tokio::test]
async fn repeated_request_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/popular"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "results": [{"id": 550, "title": "Fight Club"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, "k");
    let first = client.popular(1).await.unwrap();
    let second = client.popular(1).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first["results"][0]["id"], 550);
    server.verify().await;
}

#[tokio::test]
async fn v3_key_is_sent_as_query_parameter() {
    let server = MockServer::start().await;
    let key = "a".repeat(32);
    Mock::given(method("GET"))
        .and(path("/genre/movie/list"))
        .and(query_param("api_key", key.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"genres": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, &key);
    client.genres().await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn v4_token_is_sent_as_bearer_header() {
    let server = MockServer::start().await;
    let token = "t".repeat(64);
    Mock::given(method("GET"))
        .and(path("/genre/movie/list"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"genres": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, &token);
    client.genres().await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn stale_copy_is_served_when_upstream_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/popular"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "results": [{"id": 550}]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/popular"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server, "k");
    let params = [("page", "1".to_string())];

    // Fresh copy expires almost immediately, stale copy lives on.
    let first = client
        .get_with_ttl("movie/popular", &params, Duration::from_millis(1))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let second = client
        .get_with_ttl("movie/popular", &params, Duration::from_millis(1))
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn upstream_error_carries_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/999999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status_code": 34,
            "status_message": "The resource you requested could not be found."
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, "k");
    let err = client.movie_details(999_999).await.unwrap_err();
    match err {
        TmdbError::UpstreamStatus { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("could not be found"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn distinct_pages_are_cached_separately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/popular"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"page": 1})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/popular"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"page": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, "k");
    assert_eq!(client.popular(1).await.unwrap()["page"], 1);
    assert_eq!(client.popular(2).await.unwrap()["page"], 2);
    server.verify().await;
}
