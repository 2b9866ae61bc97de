// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.
//! Signing secrets fall back to development defaults unless `APP_ENV` is
//! `production`, where they are required.

use std::env;
use std::str::FromStr;

const DEV_JWT_SECRET: &str = "dev-jwt-secret";
const DEV_REFRESH_SECRET: &str = "dev-refresh-secret";

/// Access tokens live for 15 minutes.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 15 * 60;
/// Refresh tokens live for 7 days.
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;
pub const DEFAULT_BCRYPT_COST: u32 = 12;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
/// Maximum accepted request body size (1 MiB).
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Deployment environment, controls error detail and secret requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            other => Err(ConfigError::Invalid("APP_ENV", other.to_string())),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    /// Allowed browser origin for CORS
    pub cors_origin: String,

    // --- Tokens ---
    /// HMAC key for access tokens (raw bytes)
    pub jwt_secret: Vec<u8>,
    /// HMAC key for refresh tokens, distinct from `jwt_secret`
    pub jwt_refresh_secret: Vec<u8>,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    /// bcrypt work factor
    pub bcrypt_cost: u32,

    // --- Storage ---
    /// Postgres connection string. `None` selects the in-process store.
    pub database_url: Option<String>,
    pub redis_host: String,
    pub redis_port: u16,
    pub cache_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let environment = match env::var("APP_ENV") {
            Ok(v) => v.parse()?,
            Err(_) => Environment::Development,
        };

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        };

        let jwt_secret = secret("JWT_SECRET", DEV_JWT_SECRET, environment)?;
        let jwt_refresh_secret = secret("JWT_REFRESH_SECRET", DEV_REFRESH_SECRET, environment)?;
        if environment.is_production() && jwt_secret == jwt_refresh_secret {
            return Err(ConfigError::Invalid(
                "JWT_REFRESH_SECRET",
                "must differ from JWT_SECRET".to_string(),
            ));
        }

        let bcrypt_cost = parse_or("BCRYPT_COST", DEFAULT_BCRYPT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid(
                "BCRYPT_COST",
                format!("{} is outside 4..=31", bcrypt_cost),
            ));
        }

        Ok(Self {
            port: parse_or("PORT", 4000)?,
            environment,
            log_format,
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            jwt_secret,
            jwt_refresh_secret,
            access_token_ttl_secs: parse_or("ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TOKEN_TTL_SECS)?,
            refresh_token_ttl_secs: parse_or(
                "REFRESH_TOKEN_TTL_SECS",
                DEFAULT_REFRESH_TOKEN_TTL_SECS,
            )?,
            bcrypt_cost,
            database_url: env::var("DATABASE_URL")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            redis_host: env::var("REDIS_HOST").unwrap_or_else(|_| "localhost".to_string()),
            redis_port: parse_or("REDIS_PORT", 6379)?,
            cache_ttl_secs: parse_or("CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?,
        })
    }

    /// Config for tests: fixed secrets and the cheapest bcrypt cost.
    pub fn test_default() -> Self {
        Self {
            port: 4000,
            environment: Environment::Test,
            log_format: LogFormat::Pretty,
            cors_origin: "http://localhost:3000".to_string(),
            jwt_secret: b"test_jwt_secret_32_bytes_minimum!".to_vec(),
            jwt_refresh_secret: b"test_refresh_secret_32_bytes_min!".to_vec(),
            access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
            bcrypt_cost: 4,
            database_url: None,
            redis_host: "localhost".to_string(),
            redis_port: 6379,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }

    /// Redis connection URL built from host and port.
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/", self.redis_host, self.redis_port)
    }
}

fn secret(
    name: &'static str,
    dev_default: &str,
    environment: Environment,
) -> Result<Vec<u8>, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().as_bytes().to_vec()),
        _ if environment.is_production() => Err(ConfigError::Missing(name)),
        _ => {
            tracing::warn!(var = name, "Using development default secret");
            Ok(dev_default.as_bytes().to_vec())
        }
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
