// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process user store.

use crate::error::AppError;
use crate::models::{NewUser, Profile, User, UserChanges};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Users keyed by id. Uniqueness checks and inserts happen under one write
/// lock, so two registrations for the same email cannot both succeed.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryStore {
    pub async fn find_by_id(&self, id: Uuid) -> Option<User> {
        self.users.read().await.get(&id).cloned()
    }

    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    pub async fn exists(&self, email: &str, username: &str) -> bool {
        self.users
            .read()
            .await
            .values()
            .any(|u| u.email == email || u.username == username)
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.email == new_user.email || u.username == new_user.username)
        {
            return Err(AppError::UserExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            username: new_user.username,
            password_hash: new_user.password_hash,
            email_verified: false,
            bio: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
            profile: Profile::default(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    pub async fn update(&self, id: Uuid, changes: &UserChanges) -> Option<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id)?;

        if let Some(bio) = &changes.bio {
            user.bio = Some(bio.clone());
        }
        if let Some(avatar_url) = &changes.avatar_url {
            user.avatar_url = Some(avatar_url.clone());
        }
        user.profile.apply(&changes.profile);
        user.updated_at = Utc::now();

        Some(user.clone())
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}
