// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use weight_tracker_api::config::Config;
use weight_tracker_api::db::Database;
use weight_tracker_api::routes::create_router;
use weight_tracker_api::services::CacheService;
use weight_tracker_api::AppState;

pub const PASSWORD: &str = "Password123!";

/// Postgres URL for store tests, if one is configured.
#[allow(dead_code)]
pub fn test_database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL").ok()
}

/// Skip test with message if no test database is configured.
#[macro_export]
macro_rules! require_database {
    () => {
        if crate::common::test_database_url().is_none() {
            eprintln!("⚠️  Skipping: TEST_DATABASE_URL not set");
            return;
        }
    };
}

/// Redis URL for cache tests, if one is configured.
#[allow(dead_code)]
pub fn test_redis_url() -> Option<String> {
    std::env::var("TEST_REDIS_URL").ok()
}

/// Skip test with message if no test Redis is configured.
#[macro_export]
macro_rules! require_redis {
    () => {
        if crate::common::test_redis_url().is_none() {
            eprintln!("⚠️  Skipping: TEST_REDIS_URL not set");
            return;
        }
    };
}

/// Build an app over an in-memory store with the given cache.
#[allow(dead_code)]
pub fn app_with_cache(cache: CacheService) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(
        Config::test_default(),
        Database::new_in_memory(),
        cache,
    ));
    (create_router(state.clone()), state)
}

/// Build an app over the given store with the cache disabled.
#[allow(dead_code)]
pub fn app_with_db(db: Database) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(
        Config::test_default(),
        db,
        CacheService::disabled(),
    ));
    (create_router(state.clone()), state)
}

/// Create a test app with an in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    app_with_db(Database::new_in_memory())
}

/// Create a test app whose store is offline.
#[allow(dead_code)]
pub fn create_offline_app() -> (axum::Router, Arc<AppState>) {
    app_with_db(Database::new_mock())
}

/// Build a JSON request, optionally with a bearer token.
#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Build a GET request, optionally with a bearer token.
#[allow(dead_code)]
pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Send a request and decode the JSON response body.
#[allow(dead_code)]
pub async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// Register a user and return the response `data`.
#[allow(dead_code)]
pub async fn register(app: &axum::Router, email: &str, username: &str) -> Value {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/auth/register",
            serde_json::json!({
                "email": email,
                "password": PASSWORD,
                "username": username,
            }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    body["data"].clone()
}
