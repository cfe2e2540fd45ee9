//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use mini_cache::{api::create_router, AppState, Cache, CacheOptions};
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    create_app_with(CacheOptions::default())
}

fn create_app_with(options: CacheOptions) -> Router {
    let cache = Cache::new(options).unwrap();
    create_router(AppState::new(cache))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

// == PUT / SET Endpoint Tests ==

#[tokio::test]
async fn test_put_endpoint_success() {
    let app = create_test_app();

    let response = send(
        &app,
        "PUT",
        "/put",
        Some(json!({"key": "test_key", "value": "test_value"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["stored"], true);
    assert!(json["message"].as_str().unwrap().contains("test_key"));
}

#[tokio::test]
async fn test_put_overwrites_and_set_does_not() {
    let app = create_test_app();

    send(&app, "PUT", "/put", Some(json!({"key": "k", "value": 1}))).await;
    send(&app, "PUT", "/put", Some(json!({"key": "k", "value": 2}))).await;
    send(&app, "PUT", "/set", Some(json!({"key": "k", "value": 3}))).await;

    let response = send(&app, "GET", "/get/k", None).await;
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["value"], json!(2));
}

#[tokio::test]
async fn test_put_structured_value_round_trips() {
    let app = create_test_app();
    let value = json!({"name": "ann", "tags": ["x", "y"], "admin": false});

    send(&app, "PUT", "/put", Some(json!({"key": "user", "value": value.clone()}))).await;

    let response = send(&app, "GET", "/get/user", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "user");
    assert_eq!(json["value"], value);
}

#[tokio::test]
async fn test_integer_value_reads_back_as_integer() {
    let app = create_test_app();

    send(&app, "PUT", "/put", Some(json!({"key": "n", "value": 1}))).await;

    let response = send(&app, "GET", "/get/n", None).await;
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["value"].as_i64(), Some(1));
    assert_eq!(json["value"].to_string(), "1");
}

#[tokio::test]
async fn test_put_zero_ttl_is_not_stored() {
    let app = create_test_app();

    let response = send(
        &app,
        "PUT",
        "/put",
        Some(json!({"key": "k", "value": "v", "ttl": 0})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["stored"], false);

    let response = send(&app, "GET", "/has/k", None).await;
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["exists"], false);
}

// == GET Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app();

    let response = send(&app, "GET", "/get/nonexistent_key", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

// == DELETE Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint_success() {
    let app = create_test_app();
    send(&app, "PUT", "/put", Some(json!({"key": "del_key", "value": "x"}))).await;

    let response = send(&app, "DELETE", "/del/del_key", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/get/del_key", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_endpoint_absent_key_is_ok() {
    let app = create_test_app();

    let response = send(&app, "DELETE", "/del/never_stored", None).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_clean_endpoint_removes_everything() {
    let app = create_test_app();
    for key in ["a", "b", "c"] {
        send(&app, "PUT", "/put", Some(json!({"key": key, "value": true}))).await;
    }

    let response = send(&app, "DELETE", "/clean", None).await;
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], 3);

    let response = send(&app, "GET", "/keys", None).await;
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["keys"], json!([]));
}

// == STATS Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint() {
    let app = create_test_app();
    send(&app, "PUT", "/put", Some(json!({"key": "n", "value": 42}))).await;
    send(&app, "PUT", "/put", Some(json!({"key": "t", "value": "abc"}))).await;

    let response = send(&app, "GET", "/stats", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["count"], 2);
    assert_eq!(json["size"], 14);
    assert_eq!(json["size_text"], "14 bytes");
    assert_eq!(json["ready"], true);
}

// == Eviction via API Tests ==

#[tokio::test]
async fn test_limit_evicts_oldest_key() {
    let app = create_app_with(CacheOptions::new().with_limit(16));
    for key in ["first", "second", "third"] {
        send(&app, "PUT", "/put", Some(json!({"key": key, "value": 1}))).await;
    }

    let response = send(&app, "GET", "/keys", None).await;
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["keys"], json!(["second", "third"]));
}

// == HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = send(&app, "GET", "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

// == Error Response Tests ==

#[tokio::test]
async fn test_invalid_json_request() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/put")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"invalid json"#))
                .unwrap(),
        )
        .await
        .unwrap();

    // Axum returns 422 for JSON parsing errors by default
    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_empty_key_request() {
    let app = create_test_app();

    let response = send(&app, "PUT", "/put", Some(json!({"key": "", "value": "test"}))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_null_value_request() {
    let app = create_test_app();

    let response = send(&app, "PUT", "/put", Some(json!({"key": "k", "value": null}))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_negative_ttl_request() {
    let app = create_test_app();

    let response = send(
        &app,
        "PUT",
        "/put",
        Some(json!({"key": "k", "value": 1, "ttl": -5})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// == TTL Expiration via API Tests ==

#[tokio::test]
async fn test_ttl_expiration_via_api() {
    let app = create_test_app();

    let response = send(
        &app,
        "PUT",
        "/put",
        Some(json!({"key": "ttl_test", "value": "expires_soon", "ttl": 0.2})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/get/ttl_test", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(350)).await;

    let response = send(&app, "GET", "/get/ttl_test", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
