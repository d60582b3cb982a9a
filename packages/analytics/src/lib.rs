#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Nearby-crime analytics for manager accounts.
//!
//! [`engine`] holds the pure aggregation: group bounding-box candidate
//! rows by location, filter by exact haversine distance, and fold the
//! survivors into an [`crimewatch_analytics_models::AggregatedSummary`]
//! under the per-location and total caps. [`service`] wires that engine
//! to the database, the analysis cache, and the narrative requester to
//! produce full reports and quick estimates.

pub mod engine;
pub mod service;

use thiserror::Error;

/// Errors that can occur while producing analytics.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// No manager profile exists for the requested account.
    #[error("Subject not found")]
    SubjectNotFound,

    /// The subject has neither stored coordinates nor a resolvable map URL.
    #[error("Subject coordinates are not configured")]
    MissingCoordinates,

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] crimewatch_database::DbError),
}
