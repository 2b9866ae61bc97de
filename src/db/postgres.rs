// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Postgres-backed user store.
//!
//! Users and profiles live in two tables joined 1:1 on the user id. A user
//! and its profile are always inserted in the same transaction.

use crate::error::AppError;
use crate::models::{NewUser, Profile, User, UserChanges};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_USERS: &str = "CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    email_verified BOOLEAN NOT NULL DEFAULT FALSE,
    bio TEXT,
    avatar_url TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

const CREATE_PROFILES: &str = "CREATE TABLE IF NOT EXISTS profiles (
    user_id UUID PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    current_weight DOUBLE PRECISION,
    goal_weight DOUBLE PRECISION,
    height DOUBLE PRECISION,
    activity_level TEXT,
    gender TEXT,
    preferred_units TEXT NOT NULL DEFAULT 'imperial'
)";

const SELECT_USER: &str = "SELECT u.id, u.email, u.username, u.password_hash, u.email_verified,
        u.bio, u.avatar_url, u.created_at, u.updated_at,
        p.current_weight, p.goal_weight, p.height, p.activity_level, p.gender,
        p.preferred_units
    FROM users u
    LEFT JOIN profiles p ON p.user_id = u.id";

/// Flat row produced by [`SELECT_USER`].
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    username: String,
    password_hash: String,
    email_verified: bool,
    bio: Option<String>,
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    current_weight: Option<f64>,
    goal_weight: Option<f64>,
    height: Option<f64>,
    activity_level: Option<String>,
    gender: Option<String>,
    preferred_units: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |e: crate::models::profile::UnknownVariant| {
            AppError::Database(format!("user {}: {}", id, e))
        };

        let profile = Profile {
            current_weight: row.current_weight,
            goal_weight: row.goal_weight,
            height: row.height,
            activity_level: row
                .activity_level
                .as_deref()
                .map(str::parse)
                .transpose()
                .map_err(corrupt)?,
            gender: row
                .gender
                .as_deref()
                .map(str::parse)
                .transpose()
                .map_err(corrupt)?,
            preferred_units: row
                .preferred_units
                .as_deref()
                .map(str::parse)
                .transpose()
                .map_err(corrupt)?
                .unwrap_or_default(),
        };

        Ok(User {
            id: row.id,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            email_verified: row.email_verified,
            bio: row.bio,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
            profile,
        })
    }
}

fn db_error(e: sqlx::Error) -> AppError {
    AppError::Database(e.to_string())
}

pub(super) async fn connect(database_url: &str) -> Result<PgPool, AppError> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
        .map_err(|e| AppError::Database(format!("Failed to connect to Postgres: {}", e)))
}

/// Create the users and profiles tables if they are missing.
pub(super) async fn init_schema(pool: &PgPool) -> Result<(), AppError> {
    for statement in [CREATE_USERS, CREATE_PROFILES] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(db_error)?;
    }
    Ok(())
}

pub(super) async fn ping(pool: &PgPool) -> Result<(), AppError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(db_error)?;
    Ok(())
}

pub(super) async fn find_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, AppError> {
    sqlx::query_as::<_, UserRow>(&format!("{} WHERE u.id = $1", SELECT_USER))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error)?
        .map(User::try_from)
        .transpose()
}

pub(super) async fn find_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<User>, AppError> {
    sqlx::query_as::<_, UserRow>(&format!("{} WHERE u.email = $1", SELECT_USER))
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(db_error)?
        .map(User::try_from)
        .transpose()
}

pub(super) async fn user_exists(
    pool: &PgPool,
    email: &str,
    username: &str,
) -> Result<bool, AppError> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 OR username = $2)",
    )
    .bind(email)
    .bind(username)
    .fetch_one(pool)
    .await
    .map_err(db_error)?;
    Ok(exists)
}

pub(super) async fn create_user(pool: &PgPool, new_user: &NewUser) -> Result<User, AppError> {
    let id = Uuid::new_v4();
    let mut tx = pool.begin().await.map_err(db_error)?;

    sqlx::query("INSERT INTO users (id, email, username, password_hash) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(&new_user.email)
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::UserExists,
            other => db_error(other),
        })?;

    sqlx::query("INSERT INTO profiles (user_id) VALUES ($1)")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;

    find_user_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::Database(format!("user {} missing after insert", id)))
}

pub(super) async fn update_user(
    pool: &PgPool,
    id: Uuid,
    changes: &UserChanges,
) -> Result<Option<User>, AppError> {
    let mut tx = pool.begin().await.map_err(db_error)?;

    let updated = sqlx::query(
        "UPDATE users SET
            bio = COALESCE($2, bio),
            avatar_url = COALESCE($3, avatar_url),
            updated_at = now()
         WHERE id = $1",
    )
    .bind(id)
    .bind(changes.bio.as_deref())
    .bind(changes.avatar_url.as_deref())
    .execute(&mut *tx)
    .await
    .map_err(db_error)?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    let profile = &changes.profile;
    sqlx::query(
        "UPDATE profiles SET
            current_weight = COALESCE($2, current_weight),
            goal_weight = COALESCE($3, goal_weight),
            height = COALESCE($4, height),
            activity_level = COALESCE($5, activity_level),
            gender = COALESCE($6, gender),
            preferred_units = COALESCE($7, preferred_units)
         WHERE user_id = $1",
    )
    .bind(id)
    .bind(profile.current_weight)
    .bind(profile.goal_weight)
    .bind(profile.height)
    .bind(profile.activity_level.map(|v| v.as_str()))
    .bind(profile.gender.map(|v| v.as_str()))
    .bind(profile.preferred_units.map(|v| v.as_str()))
    .execute(&mut *tx)
    .await
    .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;

    find_user_by_id(pool, id).await
}
