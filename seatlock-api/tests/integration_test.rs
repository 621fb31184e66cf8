use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use seatlock_api::{app, AppState};
use seatlock_core::TokioScheduler;
use seatlock_store::{RegistryConfig, SeatRegistry};
use serde_json::{json, Value};
use tokio_stream::StreamExt;
use tower::ServiceExt;

fn test_app(config: RegistryConfig) -> Router {
    let scheduler = TokioScheduler::current().unwrap();
    let registry = SeatRegistry::new(config, Arc::new(scheduler)).unwrap();
    app(AppState::new(registry))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn post(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, path: &str) -> (StatusCode, Value) {
    send(app, Request::get(path).body(Body::empty()).unwrap()).await
}

#[tokio::test]
async fn test_list_seats() {
    let app = test_app(RegistryConfig::default());

    let (status, body) = get(&app, "/api/seats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["seats"].as_object().unwrap().len(), 10);
    assert_eq!(body["seats"]["1"], json!({ "id": 1, "status": "available" }));
    assert!(body["serverTime"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_lock_confirm_flow() {
    let app = test_app(RegistryConfig::default());

    let (status, body) = post(&app, "/api/seats/2/lock", json!({ "userId": "alice" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["seat"]["status"], "locked");
    assert_eq!(body["seat"]["holder"], "alice");
    assert!(body["seat"]["expiresAt"].is_i64());

    let (status, body) = post(&app, "/api/seats/2/confirm", json!({ "userId": "alice" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["seat"], json!({ "id": 2, "status": "booked" }));

    let (status, body) = post(&app, "/api/seats/2/lock", json!({ "userId": "bob" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_booked");
}

#[tokio::test]
async fn test_conflicts_and_ownership() {
    let app = test_app(RegistryConfig::default());

    post(&app, "/api/seats/1/lock", json!({ "userId": "alice" })).await;

    let (status, body) = post(&app, "/api/seats/1/lock", json!({ "userId": "bob" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_locked");

    let (status, body) = post(&app, "/api/seats/1/confirm", json!({ "userId": "bob" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "not_lock_owner");

    let (_, body) = get(&app, "/api/seats").await;
    assert_eq!(body["seats"]["1"]["holder"], "alice");
}

#[tokio::test]
async fn test_unlock_twice() {
    let app = test_app(RegistryConfig::default());

    post(&app, "/api/seats/7/lock", json!({ "userId": "alice" })).await;

    let (status, body) = post(&app, "/api/seats/7/unlock", json!({ "userId": "alice" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "released": 7 }));

    let (status, body) = post(&app, "/api/seats/7/unlock", json!({ "userId": "alice" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "not_locked");
}

#[tokio::test]
async fn test_unknown_seat_is_404() {
    let app = test_app(RegistryConfig::default());

    for path in ["/api/seats/11/lock", "/api/seats/0/lock", "/api/seats/abc/lock"] {
        let (status, body) = post(&app, path, json!({ "userId": "alice" })).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
        assert_eq!(body["error"], "not_found");
    }
}

#[tokio::test]
async fn test_unknown_seat_checked_before_body() {
    let app = test_app(RegistryConfig::default());

    let (status, body) = post(&app, "/api/seats/11/lock", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let request = Request::post("/api/seats/11/confirm").body(Body::empty()).unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_user_id_is_400() {
    let app = test_app(RegistryConfig::default());

    let (status, body) = post(&app, "/api/seats/3/lock", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");

    let (status, _) = post(&app, "/api/seats/3/lock", json!({ "userId": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::post("/api/seats/3/lock").body(Body::empty()).unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = get(&app, "/api/seats").await;
    assert_eq!(body["seats"]["3"]["status"], "available");
}

#[tokio::test(start_paused = true)]
async fn test_lock_expires_through_api() {
    let app = test_app(RegistryConfig {
        lock_duration: Duration::from_millis(50),
        ..RegistryConfig::default()
    });

    post(&app, "/api/seats/3/lock", json!({ "userId": "alice" })).await;
    tokio::time::sleep(Duration::from_millis(60)).await;

    let (_, body) = get(&app, "/api/seats").await;
    assert_eq!(body["seats"]["3"], json!({ "id": 3, "status": "available" }));
}

#[tokio::test]
async fn test_index_and_health() {
    let app = test_app(RegistryConfig::default());

    let response = app
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_event_stream_content_type() {
    let app = test_app(RegistryConfig::default());

    let response = app
        .oneshot(Request::get("/api/seats/stream").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));
}

#[tokio::test]
async fn test_event_stream_delivers_lock() {
    let app = test_app(RegistryConfig::default());

    let response = app
        .clone()
        .oneshot(Request::get("/api/seats/stream").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let mut frames = response.into_body().into_data_stream();

    let (status, _) = post(&app, "/api/seats/4/lock", json!({ "userId": "alice" })).await;
    assert_eq!(status, StatusCode::OK);

    let frame = tokio::time::timeout(Duration::from_secs(1), frames.next())
        .await
        .expect("no event within a second")
        .unwrap()
        .unwrap();
    let text = String::from_utf8(frame.to_vec()).unwrap();

    assert!(text.contains("event: seat"), "{text}");
    let data = text
        .lines()
        .find_map(|line| line.strip_prefix("data: "))
        .unwrap();
    let event: Value = serde_json::from_str(data).unwrap();
    assert_eq!(event["seatId"], 4);
    assert_eq!(event["status"], "locked");
    assert_eq!(event["holder"], "alice");
    assert_eq!(event["reason"], "locked");
}
