#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Core domain enums shared across the CrimeWatch system.
//!
//! Defines the user roles, account and location statuses, and the public
//! crime-rate banding used by the heatmap. Crime categories themselves are
//! free-text labels supplied by administrators, so no category taxonomy is
//! defined here.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Role attached to an authenticated user account.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    /// Full administrative access: user, location, and crime management.
    Admin,
    /// Business manager: analytics and profile for their own subject only.
    Manager,
}

/// Activation state of a user account.
///
/// Inactive accounts keep their data but fail authorization.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AccountStatus {
    /// Account may authenticate and act.
    Active,
    /// Account is disabled; authentication is refused.
    Inactive,
}

impl AccountStatus {
    /// Whether this status permits authenticated access.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Visibility state of a monitored location.
///
/// Inactive locations are hidden from the public heatmap and excluded from
/// the analytics aggregation, but their crime records are retained.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LocationStatus {
    /// Location is visible and participates in analytics.
    Active,
    /// Location is hidden from all read paths.
    Inactive,
}

impl LocationStatus {
    /// Whether this location participates in public and analytics queries.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Public crime-rate band for a location, derived from its crime count.
///
/// The band labels are part of the public API contract and serialize
/// verbatim (`"Highest"`, `"High"`, ...).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum CrimeRateBand {
    /// 10 or more recorded crimes.
    Highest,
    /// 7 to 9 recorded crimes.
    High,
    /// 4 to 6 recorded crimes.
    Medium,
    /// 1 to 3 recorded crimes.
    Low,
    /// No recorded crimes.
    Lowest,
}

impl CrimeRateBand {
    /// Derives the band from a location's total crime count.
    #[must_use]
    pub const fn from_count(count: u64) -> Self {
        match count {
            10.. => Self::Highest,
            7..=9 => Self::High,
            4..=6 => Self::Medium,
            1..=3 => Self::Low,
            0 => Self::Lowest,
        }
    }

    /// Smallest crime count that maps to this band.
    #[must_use]
    pub const fn minimum_count(self) -> u64 {
        match self {
            Self::Highest => 10,
            Self::High => 7,
            Self::Medium => 4,
            Self::Low => 1,
            Self::Lowest => 0,
        }
    }
}
