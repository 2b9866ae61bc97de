// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

use crate::models::Profile;

/// Stored user record, including the password hash.
///
/// Deliberately not `Serialize`: API responses go through [`UserView`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    /// bcrypt hash, never leaves the service
    pub password_hash: String,
    pub email_verified: bool,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub profile: Profile,
}

/// Fields required to create a user. The profile starts empty.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

/// Partial update of the editable user fields.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub profile: crate::models::ProfileChanges,
}

/// Public view of a user, as returned by the API and held in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserView {
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub email_verified: bool,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    pub profile: Profile,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            email_verified: user.email_verified,
            avatar_url: user.avatar_url,
            bio: user.bio,
            created_at: user.created_at,
            profile: user.profile,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_omits_password_hash() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: "john@example.com".to_string(),
            username: "john_doe".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            email_verified: false,
            bio: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
            profile: Profile::default(),
        };

        let json = serde_json::to_string(&UserView::from(user)).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.to_lowercase().contains("password"));
        assert!(json.contains("\"avatarUrl\":null"));
        assert!(json.contains("\"emailVerified\":false"));
    }
}
