// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Liveness and readiness probes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::time_utils::now_rfc3339;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Serialize, Default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReadinessChecks {
    pub database: bool,
    pub redis: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

/// Liveness: the process is up.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: now_rfc3339(),
    })
}

/// Readiness: the store and the cache both answer.
async fn readiness(State(state): State<Arc<AppState>>) -> Response {
    let (db, cache) = tokio::join!(state.db.ping(), state.cache.ping());

    let checks = ReadinessChecks {
        database: db.is_ok(),
        redis: cache.is_ok(),
    };

    let error = match (db, cache) {
        (Err(e), _) => Some(format!("database: {}", e)),
        (_, Err(e)) => Some(format!("redis: {}", e)),
        _ => None,
    };

    let ready = error.is_none();
    if !ready {
        tracing::warn!(
            database = checks.database,
            redis = checks.redis,
            "Readiness check failed"
        );
    }

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = ReadinessResponse {
        status: if ready { "ready" } else { "not ready" }.to_string(),
        checks,
        error,
        timestamp: now_rfc3339(),
    };

    (status, Json(body)).into_response()
}
