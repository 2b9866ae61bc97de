// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile editing for the signed-in user.
//! The auth middleware is applied in routes/mod.rs for these routes.

use axum::{extract::State, routing::patch, Extension, Router};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::models::{ProfileChanges, UserChanges, UserView};
use crate::response::ApiResponse;
use crate::routes::auth::MeResponse;
use crate::services::cache::user_key;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/users/me", patch(update_me))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub bio: Option<String>,
    #[validate(url(message = "must be a valid URL"))]
    pub avatar_url: Option<String>,
    #[validate(nested)]
    pub profile: Option<ProfileChanges>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            bio: req.bio,
            avatar_url: req.avatar_url,
            profile: req.profile.unwrap_or_default(),
        }
    }
}

/// Partially update the current user's bio, avatar and profile.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<ApiResponse<MeResponse>> {
    let changes = UserChanges::from(req);

    let user: UserView = state
        .db
        .update_user(auth.user_id, &changes)
        .await?
        .ok_or(AppError::UserNotFound)?
        .into();

    state.cache.del(&user_key(auth.user_id)).await;

    tracing::info!(user_id = %auth.user_id, "Profile updated");

    Ok(ApiResponse::ok(MeResponse { user }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_profile_rules_apply() {
        let req: UpdateUserRequest = serde_json::from_value(serde_json::json!({
            "bio": "Started my journey 3 months ago!",
            "profile": { "currentWeight": -5.0 }
        }))
        .unwrap();

        let err = AppError::from(req.validate().unwrap_err());
        match err {
            AppError::Validation(details) => {
                assert_eq!(details[0].field, "profile.currentWeight");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let parsed = serde_json::from_value::<UpdateUserRequest>(serde_json::json!({
            "passwordHash": "x"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_bad_avatar_url() {
        let req = UpdateUserRequest {
            bio: None,
            avatar_url: Some("not a url".to_string()),
            profile: None,
        };
        assert!(req.validate().is_err());
    }
}
