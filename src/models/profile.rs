// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user physical/fitness profile.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Self-reported activity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Unit system the weight and height values are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Units {
    Metric,
    #[default]
    Imperial,
}

/// Profile record, one per user.
///
/// Weights are in lbs or kg and height in inches or cm, depending on
/// `preferred_units`. Nothing is converted on write.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Profile {
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    pub height: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub gender: Option<Gender>,
    pub preferred_units: Units,
}

/// Partial profile update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileChanges {
    #[validate(range(exclusive_min = 0.0, max = 1500.0, message = "must be between 0 and 1500"))]
    pub current_weight: Option<f64>,
    #[validate(range(exclusive_min = 0.0, max = 1500.0, message = "must be between 0 and 1500"))]
    pub goal_weight: Option<f64>,
    #[validate(range(exclusive_min = 0.0, max = 300.0, message = "must be between 0 and 300"))]
    pub height: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub gender: Option<Gender>,
    pub preferred_units: Option<Units>,
}

impl Profile {
    /// Apply a partial update in place.
    pub fn apply(&mut self, changes: &ProfileChanges) {
        if let Some(v) = changes.current_weight {
            self.current_weight = Some(v);
        }
        if let Some(v) = changes.goal_weight {
            self.goal_weight = Some(v);
        }
        if let Some(v) = changes.height {
            self.height = Some(v);
        }
        if let Some(v) = changes.activity_level {
            self.activity_level = Some(v);
        }
        if let Some(v) = changes.gender {
            self.gender = Some(v);
        }
        if let Some(v) = changes.preferred_units {
            self.preferred_units = v;
        }
    }
}

// ─── Text column mapping ─────────────────────────────────────

/// Stored value did not match any known variant.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

macro_rules! text_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum!(ActivityLevel, "activity level", {
    Sedentary => "sedentary",
    Light => "light",
    Moderate => "moderate",
    Active => "active",
    VeryActive => "very_active",
});

text_enum!(Gender, "gender", {
    Male => "male",
    Female => "female",
    Other => "other",
});

text_enum!(Units, "unit system", {
    Metric => "metric",
    Imperial => "imperial",
});
