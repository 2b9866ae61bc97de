// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Weight Tracker API
//!
//! Backend for the weight-loss tracking app: account registration and
//! login with JWT sessions, user profiles, and health probes, over a
//! Postgres user store with a Redis cache in front of it.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use services::{AuthService, CacheService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub cache: CacheService,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(config: Config, db: Database, cache: CacheService) -> Self {
        let auth = AuthService::new(&config);
        Self {
            config,
            db,
            cache,
            auth,
        }
    }
}
