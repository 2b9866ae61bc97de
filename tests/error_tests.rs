// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use std::sync::Arc;
use weight_tracker_api::config::{Config, Environment};
use weight_tracker_api::db::Database;
use weight_tracker_api::error::AppError;
use weight_tracker_api::routes::create_router;
use weight_tracker_api::services::CacheService;
use weight_tracker_api::AppState;

mod common;
use common::{body_json, create_offline_app, get_request, json_request, send, PASSWORD};

#[tokio::test]
async fn test_store_failure_on_register_is_internal_error() {
    let (app, _) = create_offline_app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/auth/register",
            json!({"email": "john@example.com", "password": PASSWORD, "username": "john_doe"}),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INTERNAL_SERVER_ERROR");
    // Non-production builds include the underlying cause.
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("offline"));
}

#[tokio::test]
async fn test_production_masks_internal_error_detail() {
    let mut config = Config::test_default();
    config.environment = Environment::Production;
    let state = Arc::new(AppState::new(
        config,
        Database::new_mock(),
        CacheService::disabled(),
    ));
    let app = create_router(state);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/auth/register",
            json!({"email": "john@example.com", "password": PASSWORD, "username": "john_doe"}),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({
            "success": false,
            "error": {
                "code": "INTERNAL_SERVER_ERROR",
                "message": "An error occurred"
            }
        })
    );
}

#[tokio::test]
async fn test_wrong_method_uses_error_envelope() {
    let (app, _) = common::create_test_app();

    let (status, body) = send(&app, get_request("/auth/login", None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, body) = send(
        &app,
        json_request("POST", "/health", json!({}), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_store_failure_on_login_is_internal_error() {
    let (app, _) = create_offline_app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/auth/login",
            json!({"email": "john@example.com", "password": PASSWORD}),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "INTERNAL_SERVER_ERROR");
}

#[tokio::test]
async fn test_store_failure_on_me_is_internal_error() {
    let (app, state) = create_offline_app();
    let token = state
        .auth
        .issue(
            weight_tracker_api::services::TokenKind::Access,
            uuid::Uuid::new_v4(),
        )
        .unwrap();

    let (status, body) = send(&app, get_request("/auth/me", Some(&token))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "INTERNAL_SERVER_ERROR");
}

#[tokio::test]
async fn test_validation_error_envelope_shape() {
    let response =
        AppError::invalid_field("email", "must be a valid email address").into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body,
        json!({
            "success": false,
            "error": {
                "code": "VALIDATION_ERROR",
                "message": "Invalid input",
                "details": [
                    {"field": "email", "message": "must be a valid email address"}
                ]
            }
        })
    );
}

#[test]
fn test_status_codes() {
    assert_eq!(AppError::UserExists.status(), StatusCode::CONFLICT);
    assert_eq!(AppError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        AppError::InvalidToken("Invalid refresh token").status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(AppError::UserNotFound.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        AppError::Database("boom".to_string()).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
