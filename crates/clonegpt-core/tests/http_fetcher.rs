#![allow(clippy::unwrap_used)]

use clonegpt_core::{AppError, HttpStatusFetcher, StatusFetcher};
use clonegpt_types::{RateLimitConfig, RateLimitReason};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> RateLimitConfig {
    RateLimitConfig { base_url: server.uri(), ..RateLimitConfig::default() }
}

#[tokio::test]
async fn test_within_limit_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rate-limit"))
        .and(query_param("resource", "messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isOverLimit": false,
            "messagesCounter": 12,
            "tokensCounter": 3400,
            "filesCounter": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpStatusFetcher::new(&config_for(&server), "messages").unwrap();
    let status = fetcher.fetch_status().await.unwrap();

    assert!(!status.is_over_limit());
    assert_eq!(status.counters().messages_counter, 12);
    assert_eq!(status.counters().tokens_counter, 3400);
}

#[tokio::test]
async fn test_over_limit_response_with_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rate-limit"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isOverLimit": true,
            "reason": "tokens",
            "periodStart": "2030-01-01T00:00:00Z",
            "periodEnd": "2030-01-01T03:00:00Z",
            "messagesCounter": 1,
            "tokensCounter": 100000,
            "filesCounter": 0
        })))
        .mount(&server)
        .await;

    let fetcher =
        HttpStatusFetcher::new(&config_for(&server), "tokens").unwrap().with_bearer_token("secret");
    let status = fetcher.fetch_status().await.unwrap();

    assert_eq!(status.reason(), Some(RateLimitReason::Tokens));
    assert!(status.period().is_some());
}

#[tokio::test]
async fn test_too_many_requests_becomes_over_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rate-limit"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "kind": "rate_limit",
            "reason": "files",
            "periodStart": "2030-01-01T00:00:00Z",
            "periodEnd": "2030-01-02T00:00:00Z",
            "filesCounter": 20
        })))
        .mount(&server)
        .await;

    let fetcher = HttpStatusFetcher::new(&config_for(&server), "files").unwrap();
    let status = fetcher.fetch_status().await.unwrap();

    assert_eq!(status.reason(), Some(RateLimitReason::Files));
    assert_eq!(status.counters().files_counter, 20);
}

#[tokio::test]
async fn test_plain_too_many_requests_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let fetcher = HttpStatusFetcher::new(&config_for(&server), "messages").unwrap();
    let err = fetcher.fetch_status().await.unwrap_err();
    assert!(matches!(err, AppError::Fetch { status: 429, .. }));
}

#[tokio::test]
async fn test_base_url_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/app/api/rate-limit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "isOverLimit": false })))
        .expect(1)
        .mount(&server)
        .await;

    let config = RateLimitConfig {
        base_url: format!("{}/app", server.uri()),
        ..RateLimitConfig::default()
    };
    let fetcher = HttpStatusFetcher::new(&config, "messages").unwrap();
    assert_eq!(fetcher.url().path(), "/app/api/rate-limit");
    assert!(!fetcher.fetch_status().await.unwrap().is_over_limit());
}

#[tokio::test]
async fn test_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let fetcher = HttpStatusFetcher::new(&config_for(&server), "messages").unwrap();
    match fetcher.fetch_status().await {
        Err(AppError::Fetch { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_status_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "isOverLimit": true, "reason": "messages" })),
        )
        .mount(&server)
        .await;

    let fetcher = HttpStatusFetcher::new(&config_for(&server), "messages").unwrap();
    assert!(matches!(fetcher.fetch_status().await, Err(AppError::Json(_))));
}

#[test]
fn test_invalid_base_url() {
    let config = RateLimitConfig { base_url: "not a url".to_string(), ..RateLimitConfig::default() };
    assert!(matches!(HttpStatusFetcher::new(&config, "messages"), Err(AppError::Config(_))));
}
