// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod cache;

pub use auth::{AuthService, TokenError, TokenKind, TokenPair};
pub use cache::{CacheError, CacheService};
