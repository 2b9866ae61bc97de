// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod auth;
pub mod health;
pub mod users;

use crate::config::MAX_BODY_BYTES;
use crate::error::{expose_internal_detail, AppError};
use crate::middleware::auth::require_auth;
use crate::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub status: String,
}

/// Service banner.
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Weight Tracker API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
    })
}

async fn not_found() -> AppError {
    AppError::NotFound
}

fn cors_layer(state: &AppState) -> CorsLayer {
    // Outside production, local dev servers on any port are allowed too.
    let cors_origin = state.config.cors_origin.clone();
    let allow_local = !state.config.environment.is_production();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == cors_origin
                    || (allow_local
                        && (origin_str.starts_with("http://localhost")
                            || origin_str.starts_with("http://127.0.0.1")))
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state);

    // Public routes (auth routes guard /auth/me themselves)
    let public_routes = Router::new()
        .route("/", get(root))
        .merge(health::routes())
        .merge(auth::routes(state.clone()));

    // Protected routes (auth required)
    let protected_routes =
        users::routes().route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let mut router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .method_not_allowed_fallback(not_found)
        .fallback(not_found);

    // 500 responses carry the underlying cause everywhere but production.
    if !state.config.environment.is_production() {
        router = router.layer(middleware::from_fn(expose_internal_detail));
    }

    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
