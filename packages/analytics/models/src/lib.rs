#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types for the nearby-crime analytics pipeline.
//!
//! The aggregation engine produces an [`AggregatedSummary`]; the narrative
//! requester turns one into a [`NarrativeOutcome`]; the service facade wraps
//! both into the [`AnalyticsReport`] returned to HTTP clients. All wire
//! types serialize camelCase.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use crimewatch_crime_models::CrimeRateBand;
use crimewatch_geo::Coordinates;
use serde::{Deserialize, Serialize};

/// The subject (manager + organization) an analysis was produced for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectInfo {
    /// Manager display name.
    pub name: String,
    /// Organization the analysis is scoped to.
    pub organization: String,
}

/// One crime inside a nearby location's crime list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeDetail {
    /// Crime category label, verbatim from the record.
    pub category: String,
    /// When the crime occurred.
    pub occurred_at: DateTime<Utc>,
    /// Free-form description, if recorded.
    pub description: Option<String>,
}

/// A location inside the search radius together with its retained crimes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyLocation {
    /// Location display name.
    pub name: String,
    /// Location latitude (WGS84).
    pub latitude: f64,
    /// Location longitude (WGS84).
    pub longitude: f64,
    /// Great-circle distance from the subject, rounded to 2 decimals.
    pub distance_km: f64,
    /// Crimes retained for this location (capped).
    pub crimes: Vec<CrimeDetail>,
}

/// One of the most recent crimes across all nearby locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentCrime {
    /// Crime category label.
    pub category: String,
    /// When the crime occurred.
    pub occurred_at: DateTime<Utc>,
    /// Name of the location the crime was reported at.
    pub location_name: String,
    /// Distance of that location from the subject, rounded to 2 decimals.
    pub distance_km: f64,
}

/// Aggregated view of all crimes within the search radius of a subject.
///
/// Ephemeral: computed per request, never persisted. The total always
/// equals both the sum of the category counts and the sum of the
/// per-location crime-list lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedSummary {
    /// Total number of retained crimes.
    pub total_crimes: u64,
    /// Count per category label, exact string match.
    pub categories: BTreeMap<String, u64>,
    /// Count per calendar month, keyed "Month Year" (English month name).
    pub monthly_trends: BTreeMap<String, u64>,
    /// The 10 most recent crimes, newest first.
    pub recent_crimes: Vec<RecentCrime>,
    /// Nearby locations in retrieval order; NOT sorted by distance.
    pub locations: Vec<NearbyLocation>,
    /// Search radius the aggregation used, in kilometers.
    pub radius_km: f64,
}

/// Risk assessment section of a generated narrative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// Overall risk level, e.g. "low" / "medium" / "high".
    #[serde(default)]
    pub level: String,
    /// Supporting detail for the assessment.
    #[serde(default)]
    pub detail: String,
}

/// Pattern analysis section of a generated narrative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimePatterns {
    /// Direction the crime volume is moving.
    #[serde(default)]
    pub trend: String,
    /// Times of day or month with elevated activity.
    #[serde(default)]
    pub peak_times: String,
    /// Places with concentrated activity.
    #[serde(default)]
    pub hotspots: String,
}

/// Business impact section of a generated narrative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessImpact {
    /// Direct impact on the subject's operations.
    #[serde(default)]
    pub direct: String,
    /// Indirect or second-order impact.
    #[serde(default)]
    pub indirect: String,
}

/// Structured narrative produced by the text-generation service.
///
/// Every field defaults to empty so an unparseable model response can be
/// wrapped as a bare overview without failing the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeAnalysis {
    /// Narrative overview paragraph.
    #[serde(default)]
    pub overview: String,
    /// Risk assessment.
    #[serde(default)]
    pub risk: RiskAssessment,
    /// Crime pattern analysis.
    #[serde(default)]
    pub patterns: CrimePatterns,
    /// Expected business impact.
    #[serde(default)]
    pub impact: BusinessImpact,
    /// Closing summary.
    #[serde(default)]
    pub conclusion: String,
}

/// How a narrative was produced, tagged on the wire as `source`.
///
/// Only `Generated` outcomes are worth caching; fallback and all-clear
/// narratives are cheap to recompute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum NarrativeOutcome {
    /// The text-generation service returned a usable narrative.
    #[serde(rename_all = "camelCase")]
    Generated {
        /// Structured narrative (possibly wrapped raw text).
        analysis: NarrativeAnalysis,
        /// Extracted recommendation list, at most 8 items.
        recommendations: Vec<String>,
    },
    /// The service failed; a deterministic narrative was assembled from the
    /// aggregation itself.
    #[serde(rename_all = "camelCase")]
    Fallback {
        /// Deterministic narrative text.
        analysis: String,
        /// Fixed recommendation list.
        recommendations: Vec<String>,
    },
    /// No crimes were found; canned positive narrative, no service call.
    #[serde(rename_all = "camelCase")]
    AllClear {
        /// Canned all-clear text.
        analysis: String,
        /// Fixed recommendation list.
        recommendations: Vec<String>,
    },
}

impl NarrativeOutcome {
    /// Whether this outcome came from the text-generation service.
    #[must_use]
    pub const fn is_generated(&self) -> bool {
        matches!(self, Self::Generated { .. })
    }

    /// The recommendation list, regardless of source.
    #[must_use]
    pub fn recommendations(&self) -> &[String] {
        match self {
            Self::Generated {
                recommendations, ..
            }
            | Self::Fallback {
                recommendations, ..
            }
            | Self::AllClear {
                recommendations, ..
            } => recommendations,
        }
    }
}

/// Full analytics report for one subject, as returned to HTTP clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    /// Who the report is for.
    pub subject: SubjectInfo,
    /// Resolved origin coordinates the search was centered on.
    pub coordinates: Coordinates,
    /// Aggregated crime summary.
    pub summary: AggregatedSummary,
    /// Narrative analysis and recommendations.
    pub narrative: NarrativeOutcome,
    /// Whether the narrative was served from the analysis cache.
    pub cached: bool,
    /// When the report was produced.
    pub analysis_date: DateTime<Utc>,
}

/// Order-of-magnitude crime estimate for the quick-stats endpoint.
///
/// Derived from the bounding-box count alone, with no exact-distance
/// refinement; explicitly non-precise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoughEstimate {
    /// Human-readable figure such as `"~200"`, one significant digit.
    pub approximate_total: String,
    /// Crime-rate band derived from the raw bounding-box count.
    pub band: CrimeRateBand,
    /// Radius approximated by the bounding box, in kilometers.
    pub radius_km: f64,
}

/// Lightweight subject statistics, traded for latency over exactness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickStats {
    /// Who the estimate is for.
    pub subject: SubjectInfo,
    /// The non-precise estimate.
    pub rough_estimate: RoughEstimate,
}
