// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Redis cache-aside helper.
//!
//! Values are stored as JSON with a TTL. The cache is never required for
//! correctness: read failures count as misses and write failures are logged
//! and dropped. Only [`CacheService::ping`] surfaces errors, for readiness.
//!
//! The connection is opened lazily, so the API starts and serves traffic
//! while Redis is down and picks it up once it appears.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const COMMAND_TIMEOUT: Duration = Duration::from_secs(1);
const SCAN_BATCH: usize = 100;

/// Consecutive command failures before the breaker opens.
const FAILURE_THRESHOLD: u32 = 3;
/// How long the cache is skipped after the breaker opens.
const COOL_DOWN: Duration = Duration::from_secs(5);

/// Cache key for a user's public view.
pub fn user_key(id: Uuid) -> String {
    format!("user:{}", id)
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache disabled")]
    Disabled,

    #[error("redis unavailable, retrying later")]
    Unavailable,

    #[error("redis timed out")]
    Timeout,

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Connection plus circuit breaker. The lock is only held for bookkeeping,
/// never across a connect or a command.
#[derive(Default)]
struct ConnState {
    conn: Option<ConnectionManager>,
    /// Set while one task is connecting; others skip the cache meanwhile.
    connecting_since: Option<Instant>,
    failure_count: u32,
    open_until: Option<Instant>,
}

impl ConnState {
    fn breaker_open(&self, now: Instant) -> bool {
        self.open_until.is_some_and(|until| now < until)
    }

    fn connect_in_flight(&self, now: Instant) -> bool {
        // A connect abandoned by a cancelled request expires on its own.
        self.connecting_since
            .is_some_and(|since| now.duration_since(since) < CONNECT_TIMEOUT)
    }

    fn trip(&mut self, now: Instant) {
        self.open_until = Some(now + COOL_DOWN);
    }
}

/// Shared Redis handle. Clones share one connection.
#[derive(Clone)]
pub struct CacheService {
    client: Option<redis::Client>,
    state: Arc<Mutex<ConnState>>,
    default_ttl_secs: u64,
}

impl CacheService {
    /// Create a cache for `redis_url`. Does not connect yet.
    pub fn new(redis_url: &str, default_ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client: Some(client),
            state: Arc::new(Mutex::new(ConnState::default())),
            default_ttl_secs,
        })
    }

    /// Cache that never stores anything and always fails `ping`.
    pub fn disabled() -> Self {
        Self {
            client: None,
            state: Arc::new(Mutex::new(ConnState::default())),
            default_ttl_secs: crate::config::DEFAULT_CACHE_TTL_SECS,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let client = self.client.as_ref().ok_or(CacheError::Disabled)?;

        {
            let mut state = self.state.lock().await;
            let now = Instant::now();
            if state.breaker_open(now) {
                return Err(CacheError::Unavailable);
            }
            if let Some(conn) = state.conn.as_ref() {
                return Ok(conn.clone());
            }
            if state.connect_in_flight(now) {
                return Err(CacheError::Unavailable);
            }
            state.connecting_since = Some(now);
        }

        let result = match tokio::time::timeout(CONNECT_TIMEOUT, client.get_connection_manager())
            .await
        {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(CacheError::from(e)),
            Err(_) => Err(CacheError::Timeout),
        };

        let mut state = self.state.lock().await;
        state.connecting_since = None;
        match result {
            Ok(conn) => {
                tracing::info!("Redis client connected");
                state.conn = Some(conn.clone());
                state.failure_count = 0;
                state.open_until = None;
                Ok(conn)
            }
            Err(e) => {
                tracing::warn!(error = %e, cool_down_secs = COOL_DOWN.as_secs(), "Redis connect failed");
                state.trip(Instant::now());
                Err(e)
            }
        }
    }

    async fn record_success(&self) {
        let mut state = self.state.lock().await;
        state.failure_count = 0;
        state.open_until = None;
    }

    async fn record_failure(&self) {
        let mut state = self.state.lock().await;
        state.failure_count += 1;
        if state.failure_count >= FAILURE_THRESHOLD {
            tracing::warn!(
                failures = state.failure_count,
                cool_down_secs = COOL_DOWN.as_secs(),
                "Redis breaker opened"
            );
            state.failure_count = 0;
            state.trip(Instant::now());
        }
    }

    async fn run<T, F, Fut>(&self, op: F) -> Result<T, CacheError>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        let conn = self.connection().await?;
        let result = match tokio::time::timeout(COMMAND_TIMEOUT, op(conn)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::from(e)),
            Err(_) => Err(CacheError::Timeout),
        };
        match result {
            Ok(_) => self.record_success().await,
            Err(_) => self.record_failure().await,
        }
        result
    }

    /// Fetch and decode a value. Any failure is a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.is_enabled() {
            return None;
        }

        let raw: Option<String> = match self
            .run(|mut conn| async move { conn.get(key).await })
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "Redis GET failed");
                return None;
            }
        };

        match serde_json::from_str(&raw?) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Store a value for `ttl_secs`, or the default TTL.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: Option<u64>) {
        if !self.is_enabled() {
            return;
        }

        let ttl = ttl_secs.unwrap_or(self.default_ttl_secs);
        let payload = match serde_json::to_string(value) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to encode cache entry");
                return;
            }
        };

        let result: Result<(), CacheError> = self
            .run(|mut conn| async move { conn.set_ex(key, payload, ttl).await })
            .await;
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "Redis SET failed");
        }
    }

    pub async fn del(&self, key: &str) {
        if !self.is_enabled() {
            return;
        }

        let result: Result<(), CacheError> = self
            .run(|mut conn| async move { conn.del(key).await })
            .await;
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "Redis DEL failed");
        }
    }

    /// Delete every key matching a glob pattern, walking the keyspace with SCAN.
    /// Returns the number of keys deleted; 0 when Redis is unavailable.
    pub async fn invalidate_pattern(&self, pattern: &str) -> usize {
        if !self.is_enabled() {
            return 0;
        }

        match self.scan_and_delete(pattern).await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::warn!(pattern, error = %e, "Redis pattern invalidation failed");
                0
            }
        }
    }

    async fn scan_and_delete(&self, pattern: &str) -> Result<usize, CacheError> {
        let mut cursor: u64 = 0;
        let mut deleted = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = self
                .run(|mut conn| async move {
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(pattern)
                        .arg("COUNT")
                        .arg(SCAN_BATCH)
                        .query_async(&mut conn)
                        .await
                })
                .await?;

            if !keys.is_empty() {
                deleted += keys.len();
                let _: () = self
                    .run(|mut conn| async move { conn.del(keys).await })
                    .await?;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }
        tracing::debug!(pattern, deleted, "Invalidated cache keys");
        Ok(deleted)
    }

    /// Round-trip to Redis. Used by the readiness probe.
    pub async fn ping(&self) -> Result<(), CacheError> {
        let _pong: String = self
            .run(|mut conn| async move { redis::cmd("PING").query_async(&mut conn).await })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_cache_misses_and_fails_ping() {
        let cache = CacheService::disabled();
        cache.set("user:1", &"value", None).await;
        assert_eq!(cache.get::<String>("user:1").await, None);
        assert!(matches!(cache.ping().await, Err(CacheError::Disabled)));
    }

    #[tokio::test]
    async fn test_unreachable_redis_degrades_to_miss() {
        // Port 1 on localhost refuses connections.
        let cache = CacheService::new("redis://127.0.0.1:1/", 60).unwrap();
        cache.set("user:2", &42u32, Some(10)).await;
        assert_eq!(cache.get::<u32>("user:2").await, None);
        assert_eq!(cache.invalidate_pattern("user:*").await, 0);
        assert!(cache.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_failed_connect_skips_cache_during_cool_down() {
        let cache = CacheService::new("redis://127.0.0.1:1/", 60).unwrap();

        assert!(cache.connection().await.is_err());
        // Breaker is open: no second connect attempt.
        assert!(matches!(
            cache.connection().await,
            Err(CacheError::Unavailable)
        ));
        assert!(matches!(cache.ping().await, Err(CacheError::Unavailable)));
    }

    #[tokio::test]
    async fn test_concurrent_callers_do_not_queue_on_connect() {
        let cache = CacheService::new("redis://127.0.0.1:1/", 60).unwrap();
        {
            let mut state = cache.state.lock().await;
            state.connecting_since = Some(Instant::now());
        }

        // Another task is connecting, so this call returns at once.
        let started = Instant::now();
        assert!(matches!(
            cache.connection().await,
            Err(CacheError::Unavailable)
        ));
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_stale_connect_marker_expires() {
        let now = Instant::now();
        let state = ConnState {
            connecting_since: now.checked_sub(CONNECT_TIMEOUT * 2),
            ..Default::default()
        };
        assert!(!state.connect_in_flight(now));
        assert!(!state.breaker_open(now));
    }

    #[tokio::test]
    async fn test_breaker_opens_after_repeated_failures() {
        let cache = CacheService::new("redis://127.0.0.1:1/", 60).unwrap();
        for _ in 0..FAILURE_THRESHOLD {
            cache.record_failure().await;
        }
        assert!(cache.state.lock().await.breaker_open(Instant::now()));

        cache.record_success().await;
        assert!(!cache.state.lock().await.breaker_open(Instant::now()));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(CacheService::new("not a url", 60).is_err());
    }

    #[test]
    fn test_user_key_format() {
        let id = Uuid::nil();
        assert_eq!(user_key(id), "user:00000000-0000-0000-0000-000000000000");
    }
}
