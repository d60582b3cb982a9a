#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the `CrimeWatch` server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the database row types to allow independent evolution of the API
//! contract. Wire names are camelCase throughout; success responses wrap
//! their payload in one of the envelope types ([`ApiData`], [`ApiMutation`],
//! [`ApiMessage`]) and failures always serialize as [`ApiError`].
//!
//! Request bodies keep every field optional so handlers can answer missing
//! input with their own field-specific messages instead of a generic
//! deserialization error.

use chrono::{DateTime, Utc};
use crimewatch_crime_models::{AccountStatus, CrimeRateBand, LocationStatus, UserRole};
use crimewatch_database_models::{
    CrimeRow, CrimeWithLocationRow, LocationCrimeCountRow, LocationRow, LocationStatsRow,
    ManagerAccountRow, ManagerProfileRow, RecentCrimeRow, UserRow,
};
use serde::{Deserialize, Serialize};

/// Error body shared by every failing endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Always `false`.
    pub success: bool,
    /// Human-readable description of the failure.
    pub error: String,
    /// Stable machine-readable code, present on auth failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl ApiError {
    /// Builds a plain error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: None,
        }
    }

    /// Builds an error body carrying a machine-readable code.
    #[must_use]
    pub fn with_code(error: impl Into<String>, code: &'static str) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: Some(code),
        }
    }
}

/// Envelope for data-less mutations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMessage {
    /// Always `true`.
    pub success: bool,
    /// Confirmation message.
    pub message: String,
}

impl ApiMessage {
    /// Builds a success confirmation.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Envelope for read endpoints: `{success, data}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiData<T> {
    /// Always `true`.
    pub success: bool,
    /// The payload.
    pub data: T,
}

impl<T> ApiData<T> {
    /// Wraps a payload in the success envelope.
    #[must_use]
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Envelope for mutations that return the affected entity:
/// `{success, message, data}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMutation<T> {
    /// Always `true`.
    pub success: bool,
    /// Confirmation message.
    pub message: String,
    /// The created or affected entity.
    pub data: T,
}

impl<T> ApiMutation<T> {
    /// Wraps a confirmation and its entity in the success envelope.
    #[must_use]
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// `POST /api/login` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Login email.
    pub email: Option<String>,
    /// Password attempt.
    pub password: Option<String>,
}

/// A user account with the credential stripped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUser {
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
}

impl From<UserRow> for ApiUser {
    fn from(user: UserRow) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            status: user.status,
        }
    }
}

/// `POST /api/login` success response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Confirmation message.
    pub message: String,
    /// The authenticated account.
    pub user: ApiUser,
    /// Bearer token for subsequent requests.
    pub token: String,
}

// ---------------------------------------------------------------------------
// Admin: user management
// ---------------------------------------------------------------------------

/// `POST /api/admin/register-manager` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterManagerRequest {
    /// Login email.
    pub email: Option<String>,
    /// Initial password.
    pub password: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Organization the manager represents.
    pub organization: Option<String>,
    /// Business latitude, only together with `longitude`.
    pub latitude: Option<f64>,
    /// Business longitude, only together with `latitude`.
    pub longitude: Option<f64>,
}

/// The account snapshot returned after registering a manager.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredManager {
    /// New user primary key.
    pub id: i64,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Always [`UserRole::Manager`].
    pub role: UserRole,
    /// Always [`AccountStatus::Active`].
    pub status: AccountStatus,
    /// Organization the manager represents.
    pub organization: String,
    /// Stored map URL, generated when coordinates were supplied.
    pub map_url: Option<String>,
    /// Stored latitude, if supplied.
    pub latitude: Option<f64>,
    /// Stored longitude, if supplied.
    pub longitude: Option<f64>,
}

/// A manager account joined with its profile, as listed for admins.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiManagerAccount {
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
    /// Organization from the manager profile.
    pub organization: Option<String>,
    /// Map URL from the manager profile.
    pub map_url: Option<String>,
}

impl From<ManagerAccountRow> for ApiManagerAccount {
    fn from(row: ManagerAccountRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role,
            status: row.status,
            last_login: row.last_login,
            organization: row.organization,
            map_url: row.map_url,
        }
    }
}

/// `GET /api/admin/users` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersResponse {
    /// Always `true`.
    pub success: bool,
    /// Manager accounts ordered by id.
    pub users: Vec<ApiManagerAccount>,
}

/// `PATCH /api/admin/users/{id}` request body.
///
/// `location` carries the profile map URL, matching the admin frontend's
/// field name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManagerRequest {
    /// Display name.
    pub name: Option<String>,
    /// Login email.
    pub email: Option<String>,
    /// Organization the manager represents.
    pub organization: Option<String>,
    /// Map URL for the organization's location.
    pub location: Option<String>,
}

/// Body for the account and location status toggles.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    /// `"active"` or `"inactive"`.
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Admin: locations and crimes
// ---------------------------------------------------------------------------

/// A monitored location as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLocation {
    /// Location primary key.
    pub id: i64,
    /// Location name.
    pub name: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Map URL for the location.
    pub map_url: Option<String>,
    /// Whether the location participates in public views.
    pub status: LocationStatus,
}

impl From<LocationRow> for ApiLocation {
    fn from(row: LocationRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            map_url: row.map_url,
            status: row.status,
        }
    }
}

/// Body for creating or replacing a location.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPayload {
    /// Location name.
    pub name: Option<String>,
    /// Latitude (WGS84).
    pub latitude: Option<f64>,
    /// Longitude (WGS84).
    pub longitude: Option<f64>,
    /// Map URL for the location.
    pub map_url: Option<String>,
}

/// A crime report as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCrime {
    /// Crime primary key.
    pub id: i64,
    /// Location the crime was reported at.
    pub location_id: i64,
    /// Crime category label.
    pub category: String,
    /// When the crime occurred.
    pub occurred_at: DateTime<Utc>,
    /// Free-form description.
    pub description: Option<String>,
}

impl From<CrimeRow> for ApiCrime {
    fn from(row: CrimeRow) -> Self {
        Self {
            id: row.id,
            location_id: row.location_id,
            category: row.category,
            occurred_at: row.occurred_at,
            description: row.description,
        }
    }
}

/// A crime report joined with its location name, for admin listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCrimeWithLocation {
    /// Crime primary key.
    pub id: i64,
    /// Location the crime was reported at.
    pub location_id: i64,
    /// Crime category label.
    pub category: String,
    /// When the crime occurred.
    pub occurred_at: DateTime<Utc>,
    /// Free-form description.
    pub description: Option<String>,
    /// Joined location name, absent when the location was deleted.
    pub location_name: Option<String>,
}

impl From<CrimeWithLocationRow> for ApiCrimeWithLocation {
    fn from(row: CrimeWithLocationRow) -> Self {
        Self {
            id: row.id,
            location_id: row.location_id,
            category: row.category,
            occurred_at: row.occurred_at,
            description: row.description,
            location_name: row.location_name,
        }
    }
}

/// Body for creating a crime report.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCrimeRequest {
    /// Location the crime was reported at.
    pub location_id: Option<i64>,
    /// Crime category label.
    pub category: Option<String>,
    /// When the crime occurred (RFC 3339, `YYYY-MM-DD HH:MM:SS`, or
    /// `YYYY-MM-DD`).
    pub occurred_at: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
}

/// Counts reported by the CSV import endpoints.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCounts {
    /// Rows inserted.
    pub imported: u64,
    /// Rows rejected by validation.
    pub skipped: usize,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// A coordinate pair in the public API's `{lat, lng}` shape.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCoordinates {
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lng: f64,
}

/// One location on the public heatmap.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapPoint {
    /// Location primary key.
    pub id: i64,
    /// Location name.
    pub name: String,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lng: f64,
    /// Crime-rate band derived from the count.
    pub crime_rate: CrimeRateBand,
    /// Number of crimes reported at this location.
    pub crime_count: u64,
}

impl From<LocationCrimeCountRow> for HeatmapPoint {
    fn from(row: LocationCrimeCountRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            lat: row.latitude,
            lng: row.longitude,
            crime_rate: CrimeRateBand::from_count(row.crime_count),
            crime_count: row.crime_count,
        }
    }
}

/// `GET /api/public/heatmap` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapResponse {
    /// Always `true`.
    pub success: bool,
    /// Active locations ordered by crime count descending.
    pub data: Vec<HeatmapPoint>,
    /// Number of locations returned.
    pub total: usize,
}

/// Aggregate figures inside the public location stats payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationStatistics {
    /// Total crimes ever reported.
    pub total_crimes: u64,
    /// Crimes reported in the last 30 days.
    pub recent_crimes: u64,
    /// Distinct category labels seen at this location.
    pub crime_types: Vec<String>,
}

/// `GET /api/public/locations/{id}/stats` payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationStatsData {
    /// Location primary key.
    pub id: i64,
    /// Location name.
    pub name: String,
    /// Location coordinates.
    pub coordinates: ApiCoordinates,
    /// Aggregate crime figures.
    pub statistics: LocationStatistics,
}

impl From<LocationStatsRow> for LocationStatsData {
    fn from(row: LocationStatsRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            coordinates: ApiCoordinates {
                lat: row.latitude,
                lng: row.longitude,
            },
            statistics: LocationStatistics {
                total_crimes: row.total_crimes,
                recent_crimes: row.recent_crimes,
                crime_types: row.categories,
            },
        }
    }
}

/// Query parameters for the public recent-crimes feed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentCrimesParams {
    /// Page size, default 10.
    pub limit: Option<u32>,
    /// Page offset, default 0.
    pub offset: Option<u32>,
}

/// One crime in the public recent-crimes feed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentCrimeEntry {
    /// Crime primary key.
    pub id: i64,
    /// Crime category label.
    #[serde(rename = "type")]
    pub crime_type: String,
    /// When the crime occurred.
    pub date: DateTime<Utc>,
    /// Location name.
    pub location: String,
    /// Location coordinates.
    pub coordinates: ApiCoordinates,
    /// Description truncated to 100 characters.
    pub description: Option<String>,
}

impl From<RecentCrimeRow> for RecentCrimeEntry {
    fn from(row: RecentCrimeRow) -> Self {
        Self {
            id: row.id,
            crime_type: row.category,
            date: row.occurred_at,
            location: row.location_name,
            coordinates: ApiCoordinates {
                lat: row.latitude,
                lng: row.longitude,
            },
            description: row.description,
        }
    }
}

/// Pagination echo carried by the recent-crimes feed.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Page size used.
    pub limit: u32,
    /// Page offset used.
    pub offset: u32,
    /// Whether a full page was returned, implying more may exist.
    pub has_more: bool,
}

/// `GET /api/public/recent-crimes` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentCrimesResponse {
    /// Always `true`.
    pub success: bool,
    /// Crimes at active locations, newest first.
    pub data: Vec<RecentCrimeEntry>,
    /// Number of crimes in this page.
    pub total: usize,
    /// Pagination echo.
    pub pagination: Pagination,
}

/// Query parameters for the raw crime listing.
///
/// `location_id` stays a string so the handler can answer garbage input
/// with a JSON error instead of an extractor failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeListParams {
    /// Location to list crimes for.
    pub location_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Chatbot & assistant
// ---------------------------------------------------------------------------

/// `POST /api/chatbot` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatbotRequest {
    /// Location whose crime history grounds the answer.
    pub location_id: Option<i64>,
    /// The visitor's question.
    pub question: Option<String>,
}

/// `POST /api/chatbot` success response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatbotReply {
    /// The generated answer.
    pub reply: String,
}

/// `POST /api/assistant/query` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantQueryRequest {
    /// The visitor's question.
    pub question: Option<String>,
    /// Optional tourist-area hint, matched against the knowledge base.
    pub location: Option<String>,
}

/// Flat success envelope: `{success}` merged with the payload's own fields.
///
/// Used by the assistant query endpoint, whose reply serializes its fields
/// at the top level rather than under `data`.
#[derive(Debug, Clone, Serialize)]
pub struct Enveloped<T> {
    /// Always `true`.
    pub success: bool,
    /// The payload, flattened into the envelope.
    #[serde(flatten)]
    pub payload: T,
}

impl<T> Enveloped<T> {
    /// Flattens a payload into the success envelope.
    #[must_use]
    pub fn new(payload: T) -> Self {
        Self {
            success: true,
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// `GET /api/manager/profile` payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiManagerProfile {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Organization the manager represents.
    pub organization: Option<String>,
    /// Map URL for the organization's location.
    pub map_url: Option<String>,
}

impl From<ManagerProfileRow> for ApiManagerProfile {
    fn from(row: ManagerProfileRow) -> Self {
        Self {
            name: row.name,
            email: row.email,
            organization: row.organization,
            map_url: row.map_url,
        }
    }
}
