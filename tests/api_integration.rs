//! HTTP-level tests for the API router

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use beacon::api;
use beacon::config::CoreConfig;
use beacon::moderation::ContentFilter;
use beacon::Beacon;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn create_app() -> Router {
    let beacon = Beacon::new(&CoreConfig::default(), ContentFilter::builtin().unwrap());
    api::create_api_router(Arc::new(beacon))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_app();
    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "OK");
}

#[tokio::test]
async fn test_stats_cold_start() {
    let app = create_app();
    let (status, json) = send(&app, get("/api/stats")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["stats"]["online"], 1);
    assert_eq!(json["stats"]["today"], 1);
    assert_eq!(json["stats"]["total"], 1);
    assert!(json["stats"]["updated"].is_string());
}

#[tokio::test]
async fn test_ping_with_explicit_user() {
    let app = create_app();

    let (status, json) = send(&app, post_json("/api/stats", r#"{"userId": "u-1"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["id"], "u-1");
    assert_eq!(json["user"]["isNewToday"], true);
    assert_eq!(json["user"]["isNewOverall"], true);

    let (_, json) = send(&app, post_json("/api/stats", r#"{"userId": "u-1"}"#)).await;
    assert_eq!(json["user"]["isNewToday"], false);
    assert_eq!(json["stats"]["totalVisits"], 2);

    send(&app, post_json("/api/stats", r#"{"userId": "u-2"}"#)).await;
    let (_, json) = send(&app, get("/api/stats")).await;
    assert_eq!(json["stats"]["online"], 2);
    assert_eq!(json["stats"]["today"], 2);
}

#[tokio::test]
async fn test_ping_derives_identity_from_headers() {
    let app = create_app();
    let request = || {
        Request::builder()
            .method("POST")
            .uri("/api/stats")
            .header("x-forwarded-for", "203.0.113.9")
            .header("user-agent", "integration-test")
            .body(Body::empty())
            .unwrap()
    };

    let (status, first) = send(&app, request()).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = send(&app, request()).await;

    assert_eq!(first["user"]["id"], second["user"]["id"]);
    assert_eq!(first["user"]["id"].as_str().unwrap().len(), 12);
    assert_eq!(second["user"]["isNewToday"], false);
}

#[tokio::test]
async fn test_ping_tolerates_malformed_body() {
    let app = create_app();
    let (status, json) = send(&app, post_json("/api/stats", "{not json")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
}

#[tokio::test]
async fn test_submit_and_read_ratings() {
    let app = create_app();

    let (status, json) = send(
        &app,
        post_json(
            "/api/ratings",
            r#"{"userId": "u-1", "sound": 5, "design": 4, "remix": 5, "song": 4, "comment": "Отличное радио!"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"], true);
    assert!(json["ratingId"].as_str().unwrap().starts_with("rating_"));
    assert!(json["canEditAfter"].is_string());

    let (status, json) = send(&app, get("/api/ratings")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 1);
    assert_eq!(json["average"], 4.5);
    assert_eq!(json["ratings"][0]["comment"], "Отличное радио!");
    assert_eq!(json["ratings"][0]["sound"], 5);
    assert!(json["ratings"][0]["timestamp"].is_string());
}

#[tokio::test]
async fn test_ratings_listing_hides_submitter_identity() {
    let app = create_app();

    let (status, _) = send(
        &app,
        post_json(
            "/api/ratings",
            r#"{"userId": "secret-user", "sound": 4, "design": 4, "remix": 4, "song": 4}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, json) = send(&app, get("/api/ratings")).await;
    let rating = json["ratings"][0].as_object().unwrap();

    assert!(rating.contains_key("id"));
    assert!(!rating.contains_key("identity"));
    assert!(!json.to_string().contains("secret-user"));
}

#[tokio::test]
async fn test_rejected_comment_returns_422() {
    let app = create_app();

    let (status, json) = send(
        &app,
        post_json(
            "/api/ratings",
            r#"{"userId": "u-1", "sound": 5, "design": 5, "remix": 5, "song": 5, "comment": "хуйня"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "content_rejected");

    let (_, json) = send(&app, get("/api/ratings")).await;
    assert_eq!(json["total"], 0);
    assert_eq!(json["average"], 0.0);
}

#[tokio::test]
async fn test_missing_score_returns_400() {
    let app = create_app();

    let (status, json) = send(
        &app,
        post_json("/api/ratings", r#"{"userId": "u-1", "sound": 5, "design": 5, "remix": 5}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_input");

    let (status, json) = send(&app, post_json("/api/ratings", "not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "malformed_payload");
}

#[tokio::test]
async fn test_likes_flow() {
    let app = create_app();
    let like = |method: &str| {
        Request::builder()
            .method(method)
            .uri("/api/likes")
            .header("content-type", "application/json")
            .header("x-user-id", "listener")
            .body(Body::from(r#"{"trackId": "track-7"}"#))
            .unwrap()
    };

    let (status, json) = send(&app, like("POST")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["userLikes"][0], "track-7");

    let request = Request::builder()
        .uri("/api/likes")
        .header("x-user-id", "listener")
        .body(Body::empty())
        .unwrap();
    let (_, json) = send(&app, request).await;
    assert_eq!(json["tracks"]["track-7"], 1);

    let (_, json) = send(&app, like("DELETE")).await;
    assert_eq!(json["count"], 0);
    assert_eq!(json["userLikes"].as_array().unwrap().len(), 0);

    let (status, json) = send(&app, post_json("/api/likes", "{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_input");
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = create_app();
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/ratings")
        .header("origin", "https://radio.example")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
}
