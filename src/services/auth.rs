// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing and session token issuance.
//!
//! Tokens are HS256 JWTs holding only the user id (`sub`) and expiry (`exp`).
//! Access and refresh tokens are signed with different secrets, so one can
//! never be replayed as the other. Nothing is persisted server-side.

use crate::config::Config;
use anyhow::Context;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Which of the two token families a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Access/refresh token pair handed to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Why a token was rejected. Handlers collapse all of these into one
/// unauthorized response; the category is only logged.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("token signature invalid")]
    BadSignature,

    #[error("token malformed: {0}")]
    Malformed(String),

    #[error("token subject is not a user id")]
    BadSubject,
}

#[derive(Clone)]
struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl TokenKeys {
    fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }
}

/// Credential checks and token signing.
#[derive(Clone)]
pub struct AuthService {
    access: TokenKeys,
    refresh: TokenKeys,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(config: &Config) -> Self {
        Self {
            access: TokenKeys::new(&config.jwt_secret, config.access_token_ttl_secs),
            refresh: TokenKeys::new(&config.jwt_refresh_secret, config.refresh_token_ttl_secs),
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    fn keys(&self, kind: TokenKind) -> &TokenKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    // ─── Passwords ───────────────────────────────────────────────

    /// Hash a password with bcrypt on the blocking pool.
    pub async fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let password = password.to_owned();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .context("password hashing task failed")?
            .context("failed to hash password")
    }

    /// Check a password against a stored bcrypt hash.
    pub async fn verify_password(&self, password: &str, hash: &str) -> anyhow::Result<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .context("password verification task failed")?
            .context("stored password hash is unreadable")
    }

    // ─── Tokens ──────────────────────────────────────────────────

    /// Sign a token of `kind` for `user_id`.
    pub fn issue(&self, kind: TokenKind, user_id: Uuid) -> anyhow::Result<String> {
        let keys = self.keys(kind);
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + keys.ttl_secs,
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &keys.encoding,
        )?)
    }

    /// Issue a fresh access/refresh pair.
    pub fn issue_pair(&self, user_id: Uuid) -> anyhow::Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue(TokenKind::Access, user_id)?,
            refresh_token: self.issue(TokenKind::Refresh, user_id)?,
        })
    }

    /// Verify signature and expiry, returning the user id.
    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<Uuid, TokenError> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &self.keys(kind).decoding, &validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed(e.to_string()),
            },
        )?;

        data.claims
            .sub
            .parse()
            .map_err(|_| TokenError::BadSubject)
    }
}
