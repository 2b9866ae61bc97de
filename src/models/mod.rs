// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod profile;
pub mod user;

pub use profile::{ActivityLevel, Gender, Profile, ProfileChanges, Units};
pub use user::{NewUser, User, UserChanges, UserView};
