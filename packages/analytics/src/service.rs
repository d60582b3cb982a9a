//! Orchestration of the analytics pipeline.
//!
//! Fetches the subject, resolves the origin, pulls bounding-box candidate
//! rows, aggregates them, and then decides where the narrative comes
//! from: the all-clear short circuit, the analysis cache, or a fresh LLM
//! request. Only generated narratives are cached; fallbacks are retried
//! on the next request.

use chrono::Utc;
use switchy_database::Database;

use crimewatch_ai::narrative::NarrativeRequester;
use crimewatch_analytics_models::{
    AggregatedSummary, AnalyticsReport, NarrativeOutcome, QuickStats, SubjectInfo,
};
use crimewatch_cache::{AnalysisCache, fingerprint};
use crimewatch_database::{crimes, users};
use crimewatch_geo::bbox::BoundingBox;
use crimewatch_geo::resolver;

use crate::{AnalyticsError, engine};

/// Exact-distance radius applied after the bounding-box prefilter.
pub const DEFAULT_RADIUS_KM: f64 = 20.0;

/// Produces analytics reports and quick estimates for manager accounts.
pub struct AnalyticsService {
    cache: AnalysisCache,
    requester: NarrativeRequester,
}

impl AnalyticsService {
    /// Creates a service over the given cache and narrative requester.
    #[must_use]
    pub const fn new(cache: AnalysisCache, requester: NarrativeRequester) -> Self {
        Self { cache, requester }
    }

    /// Builds the full nearby-crime report for a manager account.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::SubjectNotFound`] when the account has no
    /// manager profile, [`AnalyticsError::MissingCoordinates`] when no
    /// origin can be resolved, and [`AnalyticsError::Database`] on
    /// datastore failures.
    pub async fn get_analytics(
        &self,
        db: &dyn Database,
        user_id: i64,
    ) -> Result<AnalyticsReport, AnalyticsError> {
        let subject = users::subject_profile(db, user_id)
            .await?
            .ok_or(AnalyticsError::SubjectNotFound)?;

        let origin = resolver::resolve_coordinates(
            subject.latitude,
            subject.longitude,
            subject.map_url.as_deref(),
        )
        .ok_or(AnalyticsError::MissingCoordinates)?;

        let bbox = BoundingBox::around_default(origin);
        let rows = crimes::location_crimes_in_bbox(db, &bbox).await?;
        let summary = engine::aggregate(origin, DEFAULT_RADIUS_KM, &rows);
        log::debug!(
            "Aggregated {} crimes across {} locations for user {user_id}",
            summary.total_crimes,
            summary.locations.len()
        );

        let info = SubjectInfo {
            name: subject.name,
            organization: subject.organization,
        };
        let (narrative, cached) = self.resolve_narrative(user_id, &info, &summary).await;

        Ok(AnalyticsReport {
            subject: info,
            coordinates: origin,
            summary,
            narrative,
            cached,
            analysis_date: Utc::now(),
        })
    }

    /// Builds the order-of-magnitude estimate from the raw bounding-box
    /// count, skipping aggregation and narrative work entirely.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::get_analytics`].
    pub async fn quick_stats(
        &self,
        db: &dyn Database,
        user_id: i64,
    ) -> Result<QuickStats, AnalyticsError> {
        let subject = users::subject_profile(db, user_id)
            .await?
            .ok_or(AnalyticsError::SubjectNotFound)?;

        let origin = resolver::resolve_coordinates(
            subject.latitude,
            subject.longitude,
            subject.map_url.as_deref(),
        )
        .ok_or(AnalyticsError::MissingCoordinates)?;

        let bbox = BoundingBox::around_default(origin);
        let count = crimes::count_crimes_in_bbox(db, &bbox).await?;

        Ok(QuickStats {
            subject: SubjectInfo {
                name: subject.name,
                organization: subject.organization,
            },
            rough_estimate: engine::rough_estimate(count, DEFAULT_RADIUS_KM),
        })
    }

    /// Decides where the narrative comes from.
    ///
    /// Zero-crime summaries short-circuit to the all-clear text without
    /// touching the provider or the cache. Otherwise the cache is probed
    /// by `(subject, fingerprint)` and a miss triggers the two-call LLM
    /// request, whose result is cached only when it was actually
    /// generated.
    async fn resolve_narrative(
        &self,
        subject_id: i64,
        subject: &SubjectInfo,
        summary: &AggregatedSummary,
    ) -> (NarrativeOutcome, bool) {
        if summary.total_crimes == 0 {
            return (engine::all_clear(summary.radius_km), false);
        }

        let fingerprint = fingerprint(summary);
        if let Some(outcome) = self.cache.get(subject_id, &fingerprint) {
            log::debug!("Analysis cache hit for subject {subject_id}");
            return (outcome, true);
        }

        let outcome = self.requester.request(subject, summary).await;
        if outcome.is_generated() {
            self.cache.put(subject_id, &fingerprint, outcome.clone());
        }
        (outcome, false)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use chrono::TimeZone as _;

    use crimewatch_ai::AiError;
    use crimewatch_ai::providers::{CompletionRequest, LlmProvider};
    use crimewatch_analytics_models::NearbyLocation;
    use crimewatch_cache::ManualClock;
    use crimewatch_geo::Coordinates;

    use super::*;

    struct ScriptedProvider {
        responses: Mutex<VecDeque<Option<String>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Option<&str>>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|r| r.map(ToString::to_string))
                        .collect(),
                ),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.responses.lock().unwrap().pop_front() {
                Some(Some(text)) => Ok(text),
                _ => Err(AiError::Provider {
                    message: "scripted failure".to_string(),
                }),
            }
        }
    }

    fn service_with(provider: Arc<ScriptedProvider>) -> (AnalyticsService, AnalysisCache) {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let cache = AnalysisCache::new(
            chrono::Duration::minutes(10),
            Arc::new(ManualClock::new(start)),
        );
        let service = AnalyticsService::new(cache.clone(), NarrativeRequester::new(provider));
        (service, cache)
    }

    fn subject() -> SubjectInfo {
        SubjectInfo {
            name: "Budi Santoso".to_string(),
            organization: "Hotel Nusantara".to_string(),
        }
    }

    fn busy_summary() -> AggregatedSummary {
        AggregatedSummary {
            total_crimes: 5,
            categories: BTreeMap::from([("theft".to_string(), 5)]),
            monthly_trends: BTreeMap::from([("January 2025".to_string(), 5)]),
            recent_crimes: Vec::new(),
            locations: vec![NearbyLocation {
                name: "Malioboro".to_string(),
                latitude: -7.79,
                longitude: 110.37,
                distance_km: 0.4,
                crimes: Vec::new(),
            }],
            radius_km: DEFAULT_RADIUS_KM,
        }
    }

    fn quiet_summary() -> AggregatedSummary {
        engine::aggregate(Coordinates::new(-7.797, 110.370), DEFAULT_RADIUS_KM, &[])
    }

    const ANALYSIS_JSON: &str = r#"{"overview": "Busy area.", "conclusion": "Caution."}"#;

    #[tokio::test]
    async fn zero_crimes_skip_the_provider_and_cache() {
        let provider = Arc::new(ScriptedProvider::new(Vec::new()));
        let (service, cache) = service_with(provider.clone());

        let (outcome, cached) = service
            .resolve_narrative(7, &subject(), &quiet_summary())
            .await;

        assert!(matches!(outcome, NarrativeOutcome::AllClear { .. }));
        assert!(!cached);
        assert_eq!(provider.call_count(), 0);
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[tokio::test]
    async fn generated_narratives_are_cached_and_replayed() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Some(ANALYSIS_JSON),
            Some("1. Add lighting along the access road."),
        ]));
        let (service, cache) = service_with(provider.clone());
        let summary = busy_summary();

        let (first, first_cached) = service.resolve_narrative(7, &subject(), &summary).await;
        assert!(first.is_generated());
        assert!(!first_cached);
        assert_eq!(provider.call_count(), 2);
        assert_eq!(cache.stats().entry_count, 1);

        // The script is exhausted, so any further provider call would fail.
        let (second, second_cached) = service.resolve_narrative(7, &subject(), &summary).await;
        assert!(second_cached);
        assert_eq!(provider.call_count(), 2);
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn fallback_narratives_are_not_cached() {
        let provider = Arc::new(ScriptedProvider::new(Vec::new()));
        let (service, cache) = service_with(provider.clone());
        let summary = busy_summary();

        let (first, cached) = service.resolve_narrative(7, &subject(), &summary).await;
        assert!(matches!(first, NarrativeOutcome::Fallback { .. }));
        assert!(!cached);
        assert_eq!(cache.stats().entry_count, 0);

        // Next request tries the provider again instead of replaying.
        let (_, cached) = service.resolve_narrative(7, &subject(), &summary).await;
        assert!(!cached);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn different_subjects_do_not_share_cache_entries() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Some(ANALYSIS_JSON),
            Some("1. Add lighting along the access road."),
            Some(ANALYSIS_JSON),
            Some("1. Add lighting along the access road."),
        ]));
        let (service, cache) = service_with(provider.clone());
        let summary = busy_summary();

        let (_, cached_a) = service.resolve_narrative(7, &subject(), &summary).await;
        let (_, cached_b) = service.resolve_narrative(8, &subject(), &summary).await;

        assert!(!cached_a);
        assert!(!cached_b);
        assert_eq!(provider.call_count(), 4);
        assert_eq!(cache.stats().entry_count, 2);
    }
}
