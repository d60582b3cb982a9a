#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Database row types and insert payloads.
//!
//! These types represent the shapes of data as stored in and retrieved from
//! the `PostgreSQL` database. They are distinct from the API response types
//! in `crimewatch_server_models`, which are shaped for HTTP clients.

use chrono::{DateTime, Utc};
use crimewatch_crime_models::{AccountStatus, LocationStatus, UserRole};
use serde::{Deserialize, Serialize};

/// A user account row as retrieved from the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
    /// Primary key.
    pub id: i64,
    /// Login email, unique across accounts.
    pub email: String,
    /// Salted password digest (or a legacy plaintext password awaiting
    /// upgrade on next login).
    pub password_digest: String,
    /// Display name.
    pub name: String,
    /// Account role.
    pub role: UserRole,
    /// Account status.
    pub status: AccountStatus,
    /// Last successful login, if any.
    pub last_login: Option<DateTime<Utc>>,
}

/// A manager account joined with its profile, for the admin user listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerAccountRow {
    /// User primary key.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Account role.
    pub role: UserRole,
    /// Account status.
    pub status: AccountStatus,
    /// Last successful login, if any.
    pub last_login: Option<DateTime<Utc>>,
    /// Organization from the manager profile, if one exists.
    pub organization: Option<String>,
    /// Map URL from the manager profile, if one exists.
    pub map_url: Option<String>,
}

/// A manager profile joined with its user account, as consumed by the
/// analytics pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRow {
    /// User primary key of the manager.
    pub user_id: i64,
    /// Manager display name.
    pub name: String,
    /// Organization the manager represents.
    pub organization: String,
    /// Map URL for the organization's location, if stored.
    pub map_url: Option<String>,
    /// Stored latitude, if any.
    pub latitude: Option<f64>,
    /// Stored longitude, if any.
    pub longitude: Option<f64>,
}

/// The slice of a manager's account and profile shown on the profile page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerProfileRow {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Organization the manager represents.
    pub organization: Option<String>,
    /// Map URL for the organization's location.
    pub map_url: Option<String>,
}

/// A monitored location row as retrieved from the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRow {
    /// Primary key.
    pub id: i64,
    /// Location name.
    pub name: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Map URL for the location.
    pub map_url: Option<String>,
    /// Whether the location participates in public views and analytics.
    pub status: LocationStatus,
}

/// A crime report row as retrieved from the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeRow {
    /// Primary key.
    pub id: i64,
    /// Location this crime was reported at.
    pub location_id: i64,
    /// Crime category label.
    pub category: String,
    /// When the crime occurred.
    pub occurred_at: DateTime<Utc>,
    /// Free-form description.
    pub description: Option<String>,
}

/// A crime report joined with its location's name, for admin listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeWithLocationRow {
    /// Primary key.
    pub id: i64,
    /// Location this crime was reported at.
    pub location_id: i64,
    /// Crime category label.
    pub category: String,
    /// When the crime occurred.
    pub occurred_at: DateTime<Utc>,
    /// Free-form description.
    pub description: Option<String>,
    /// Name of the joined location, absent when the location was deleted.
    pub location_name: Option<String>,
}

/// One crime at one active location, as fetched for aggregation.
///
/// The fetch joins crimes onto their locations inside a bounding box, newest
/// crime first, so a location appears once per crime and locations without
/// crimes do not appear at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCrimeRow {
    /// Location primary key.
    pub location_id: i64,
    /// Location name.
    pub location_name: String,
    /// Location latitude (WGS84).
    pub latitude: f64,
    /// Location longitude (WGS84).
    pub longitude: f64,
    /// Crime category label.
    pub category: String,
    /// When the crime occurred.
    pub occurred_at: DateTime<Utc>,
    /// Free-form crime description.
    pub description: Option<String>,
}

/// A location with its total crime count, for the public heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCrimeCountRow {
    /// Location primary key.
    pub id: i64,
    /// Location name.
    pub name: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Number of crimes reported at this location.
    pub crime_count: u64,
}

/// Aggregate statistics for a single location, for the public stats view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationStatsRow {
    /// Location primary key.
    pub id: i64,
    /// Location name.
    pub name: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Total crimes ever reported at this location.
    pub total_crimes: u64,
    /// Crimes reported in the last 30 days.
    pub recent_crimes: u64,
    /// Distinct category labels seen at this location.
    pub categories: Vec<String>,
}

/// A crime joined with location details, for the public recent-crimes feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentCrimeRow {
    /// Crime primary key.
    pub id: i64,
    /// Crime category label.
    pub category: String,
    /// When the crime occurred.
    pub occurred_at: DateTime<Utc>,
    /// Description truncated for the public feed.
    pub description: Option<String>,
    /// Name of the location.
    pub location_name: String,
    /// Location latitude (WGS84).
    pub latitude: f64,
    /// Location longitude (WGS84).
    pub longitude: f64,
}

/// An authentication session row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRow {
    /// Opaque bearer token.
    pub token: String,
    /// User this session belongs to.
    pub user_id: i64,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// Payload for inserting a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLocation {
    /// Location name.
    pub name: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Map URL for the location.
    pub map_url: Option<String>,
}

/// Payload for inserting or replacing a crime report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCrime {
    /// Location the crime was reported at.
    pub location_id: i64,
    /// Crime category label.
    pub category: String,
    /// When the crime occurred.
    pub occurred_at: DateTime<Utc>,
    /// Free-form description.
    pub description: Option<String>,
}

/// Payload for registering a manager account with its profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewManager {
    /// Login email.
    pub email: String,
    /// Salted password digest.
    pub password_digest: String,
    /// Display name.
    pub name: String,
    /// Organization the manager represents.
    pub organization: String,
    /// Map URL for the organization's location.
    pub map_url: Option<String>,
    /// Stored latitude, if provided at registration.
    pub latitude: Option<f64>,
    /// Stored longitude, if provided at registration.
    pub longitude: Option<f64>,
}

/// Payload for updating a manager account and its profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerUpdate {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Organization the manager represents.
    pub organization: Option<String>,
    /// Map URL for the organization's location.
    pub map_url: Option<String>,
}

/// Payload for updating a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdate {
    /// Location name.
    pub name: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Map URL for the location.
    pub map_url: Option<String>,
}
