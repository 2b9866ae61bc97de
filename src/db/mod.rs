// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User store.
//!
//! [`Database`] is a cheap-to-clone handle over one of three backends:
//! - Postgres via a `sqlx` pool (production)
//! - an in-process map (local development without `DATABASE_URL`, tests)
//! - offline, where every call fails (readiness and error-path tests)

pub mod memory;
pub mod postgres;

use crate::error::AppError;
use crate::models::{NewUser, User, UserChanges};
use memory::MemoryStore;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
enum Backend {
    Postgres(PgPool),
    Memory(Arc<MemoryStore>),
    Offline,
}

/// User store handle.
#[derive(Clone)]
pub struct Database {
    backend: Backend,
}

impl Database {
    /// Connect to Postgres and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = postgres::connect(database_url).await?;
        postgres::init_schema(&pool).await?;
        tracing::info!("Connected to Postgres");
        Ok(Self {
            backend: Backend::Postgres(pool),
        })
    }

    /// In-process store. Data lives as long as the handle.
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::default())),
        }
    }

    /// Offline store for testing: all operations return an error.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Postgres(_) => "postgres",
            Backend::Memory(_) => "memory",
            Backend::Offline => "offline",
        }
    }

    fn offline() -> AppError {
        AppError::Database("Database not connected (offline mode)".to_string())
    }

    /// Cheap round-trip used by the readiness probe.
    pub async fn ping(&self) -> Result<(), AppError> {
        match &self.backend {
            Backend::Postgres(pool) => postgres::ping(pool).await,
            Backend::Memory(_) => Ok(()),
            Backend::Offline => Err(Self::offline()),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Postgres(pool) => postgres::find_user_by_id(pool, id).await,
            Backend::Memory(store) => Ok(store.find_by_id(id).await),
            Backend::Offline => Err(Self::offline()),
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Postgres(pool) => postgres::find_user_by_email(pool, email).await,
            Backend::Memory(store) => Ok(store.find_by_email(email).await),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Whether any user already holds this email or this username.
    pub async fn user_exists(&self, email: &str, username: &str) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Postgres(pool) => postgres::user_exists(pool, email, username).await,
            Backend::Memory(store) => Ok(store.exists(email, username).await),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Create a user together with its empty profile.
    ///
    /// Returns [`AppError::UserExists`] if the email or username is taken,
    /// including when a concurrent registration wins the race.
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        match &self.backend {
            Backend::Postgres(pool) => postgres::create_user(pool, &new_user).await,
            Backend::Memory(store) => store.create(new_user).await,
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Apply a partial update. `Ok(None)` if the user does not exist.
    pub async fn update_user(
        &self,
        id: Uuid,
        changes: &UserChanges,
    ) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Postgres(pool) => postgres::update_user(pool, id, changes).await,
            Backend::Memory(store) => Ok(store.update(id, changes).await),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Close pooled connections. Used during shutdown.
    pub async fn close(&self) {
        if let Backend::Postgres(pool) = &self.backend {
            pool.close().await;
            tracing::info!("Database connection closed");
        }
    }
}
