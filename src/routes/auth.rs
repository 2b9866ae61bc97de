// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account authentication routes: register, login, refresh, me.

use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::extract::ValidatedJson;
use crate::middleware::auth::{require_auth, AuthUser};
use crate::models::{NewUser, UserView};
use crate::response::ApiResponse;
use crate::services::cache::user_key;
use crate::services::{TokenKind, TokenPair};
use crate::AppState;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .merge(protected)
}

// ─── Request/Response Types ──────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 3, max = 30, message = "must be 3 to 30 characters"))]
    pub username: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// User plus a fresh token pair.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthResponse {
    pub user: UserView,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub user: UserView,
}

fn session(state: &AppState, user: UserView) -> Result<AuthResponse> {
    let tokens = state
        .auth
        .issue_pair(user.id)
        .map_err(|e| AppError::Internal(e.context("token signing failed")))?;
    Ok(AuthResponse { user, tokens })
}

// ─── Handlers ────────────────────────────────────────────────

/// Create an account and its empty profile, then start a session.
async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<ApiResponse<AuthResponse>> {
    if state.db.user_exists(&req.email, &req.username).await? {
        return Err(AppError::UserExists);
    }

    let password_hash = state.auth.hash_password(&req.password).await?;

    let user = state
        .db
        .create_user(NewUser {
            email: req.email,
            username: req.username,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok(ApiResponse::created(session(&state, user.into())?))
}

/// Exchange email and password for a token pair.
async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<ApiResponse<AuthResponse>> {
    let user = state
        .db
        .find_user_by_email(&req.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !state
        .auth
        .verify_password(&req.password, &user.password_hash)
        .await?
    {
        tracing::info!(user_id = %user.id, "Login rejected: wrong password");
        return Err(AppError::InvalidCredentials);
    }

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(ApiResponse::ok(session(&state, user.into())?))
}

/// Exchange a refresh token for a new pair, if the user still exists.
async fn refresh(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<ApiResponse<AuthResponse>> {
    let user_id = state
        .auth
        .verify(TokenKind::Refresh, &req.refresh_token)
        .map_err(|e| {
            tracing::debug!(reason = %e, "Rejected refresh token");
            AppError::InvalidToken("Invalid refresh token")
        })?;

    let user = state
        .db
        .find_user_by_id(user_id)
        .await?
        .ok_or(AppError::InvalidToken("User not found"))?;

    Ok(ApiResponse::ok(session(&state, user.into())?))
}

/// Current user, read through the cache.
async fn me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<ApiResponse<MeResponse>> {
    let key = user_key(auth.user_id);

    if let Some(user) = state.cache.get::<UserView>(&key).await {
        return Ok(ApiResponse::ok(MeResponse { user }));
    }

    let user: UserView = state
        .db
        .find_user_by_id(auth.user_id)
        .await?
        .ok_or(AppError::UserNotFound)?
        .into();

    state.cache.set(&key, &user, None).await;

    Ok(ApiResponse::ok(MeResponse { user }))
}
