#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-process TTL cache for analytics narratives.
//!
//! Keyed by `(subject id, summary fingerprint)`, so a cached narrative is
//! served only while the aggregated data it describes is unchanged. Entries
//! expire lazily on read, opportunistically after each write, and in bulk
//! when the host calls [`AnalysisCache::sweep`] on its
//! [`SWEEP_INTERVAL`] cadence. Per-instance and lost on restart.

pub mod clock;
pub mod fingerprint;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use crimewatch_analytics_models::NarrativeOutcome;
use serde::Serialize;

pub use clock::{Clock, ManualClock, SystemClock};
pub use fingerprint::fingerprint;

/// Entry lifetime when `ENVIRONMENT=production`.
pub const PRODUCTION_TTL_SECONDS: i64 = 60 * 60;

/// Entry lifetime everywhere else.
pub const DEFAULT_TTL_SECONDS: i64 = 10 * 60;

/// How often the host should call [`AnalysisCache::sweep`].
pub const SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    outcome: NarrativeOutcome,
    created_at: DateTime<Utc>,
}

/// Operational snapshot of the cache, for logging and diagnostics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of live (possibly stale, not yet swept) entries.
    pub entry_count: usize,
    /// Configured entry lifetime in seconds.
    pub ttl_seconds: i64,
    /// Formatted entry keys, sorted.
    pub keys: Vec<String>,
}

/// Content-addressed TTL store of generated narratives.
///
/// Cloning is cheap and shares the underlying store. The mutex satisfies
/// aliasing across workers but is not a dedup point: two concurrent misses
/// for the same key may both regenerate, and the later `put` wins.
#[derive(Clone)]
pub struct AnalysisCache {
    entries: Arc<Mutex<HashMap<(i64, String), CacheEntry>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl AnalysisCache {
    /// Creates a cache with an explicit entry lifetime.
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            clock,
        }
    }

    /// Creates a cache configured from the environment: `CACHE_TTL_SECONDS`
    /// wins outright; otherwise `ENVIRONMENT=production` selects
    /// [`PRODUCTION_TTL_SECONDS`] and anything else
    /// [`DEFAULT_TTL_SECONDS`].
    #[must_use]
    pub fn from_env(clock: Arc<dyn Clock>) -> Self {
        let ttl_seconds = std::env::var("CACHE_TTL_SECONDS")
            .ok()
            .and_then(|value| value.parse::<i64>().ok())
            .unwrap_or_else(|| {
                if std::env::var("ENVIRONMENT").as_deref() == Ok("production") {
                    PRODUCTION_TTL_SECONDS
                } else {
                    DEFAULT_TTL_SECONDS
                }
            });

        log::debug!("Analysis cache TTL: {ttl_seconds}s");

        Self::new(Duration::seconds(ttl_seconds), clock)
    }

    /// Returns the cached outcome for `(subject_id, fingerprint)` if one
    /// exists and is still fresh. A stale entry is removed and reported
    /// absent.
    #[must_use]
    pub fn get(&self, subject_id: i64, fingerprint: &str) -> Option<NarrativeOutcome> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap();

        match entries.entry((subject_id, fingerprint.to_string())) {
            Entry::Occupied(occupied) => {
                if now - occupied.get().created_at < self.ttl {
                    Some(occupied.get().outcome.clone())
                } else {
                    occupied.remove();
                    None
                }
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Stores an outcome for `(subject_id, fingerprint)`, overwriting any
    /// previous entry, then opportunistically drops stale entries.
    pub fn put(&self, subject_id: i64, fingerprint: &str, outcome: NarrativeOutcome) {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap();

        entries.insert(
            (subject_id, fingerprint.to_string()),
            CacheEntry {
                outcome,
                created_at: now,
            },
        );

        Self::drop_stale(&mut entries, now, self.ttl);
    }

    /// Drops every stale entry and returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap();

        let removed = Self::drop_stale(&mut entries, now, self.ttl);
        if removed > 0 {
            log::debug!("Swept {removed} stale analysis cache entries");
        }

        removed
    }

    /// Drops every entry for one subject and returns how many were removed.
    ///
    /// Nothing calls this from the data-mutation paths today; entries made
    /// stale by edits age out via the TTL instead.
    pub fn invalidate(&self, subject_id: i64) -> usize {
        let mut entries = self.entries.lock().unwrap();

        let before = entries.len();
        entries.retain(|(sid, _), _| *sid != subject_id);
        before - entries.len()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Snapshot of entry count, TTL, and keys.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().unwrap();

        let mut keys: Vec<String> = entries
            .keys()
            .map(|(subject_id, fp)| format!("analytics_{subject_id}_{fp}"))
            .collect();
        keys.sort();

        CacheStats {
            entry_count: entries.len(),
            ttl_seconds: self.ttl.num_seconds(),
            keys,
        }
    }

    fn drop_stale(
        entries: &mut HashMap<(i64, String), CacheEntry>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| now - entry.created_at < ttl);
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use crimewatch_analytics_models::NarrativeAnalysis;

    use super::*;

    fn outcome(overview: &str) -> NarrativeOutcome {
        NarrativeOutcome::Generated {
            analysis: NarrativeAnalysis {
                overview: overview.to_string(),
                ..NarrativeAnalysis::default()
            },
            recommendations: vec!["Improve lighting around entrances".to_string()],
        }
    }

    fn manual_cache(ttl: Duration) -> (AnalysisCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        ));
        (AnalysisCache::new(ttl, clock.clone()), clock)
    }

    #[test]
    fn round_trip() {
        let (cache, _clock) = manual_cache(Duration::minutes(10));

        cache.put(7, "abc", outcome("quiet month"));

        assert_eq!(cache.get(7, "abc"), Some(outcome("quiet month")));
    }

    #[test]
    fn miss_on_unknown_key() {
        let (cache, _clock) = manual_cache(Duration::minutes(10));

        cache.put(7, "abc", outcome("quiet month"));

        assert_eq!(cache.get(7, "def"), None);
        assert_eq!(cache.get(8, "abc"), None);
    }

    #[test]
    fn entry_expires_after_ttl() {
        let (cache, clock) = manual_cache(Duration::minutes(10));

        cache.put(7, "abc", outcome("quiet month"));

        clock.advance(Duration::minutes(9) + Duration::seconds(59));
        assert!(cache.get(7, "abc").is_some());

        clock.advance(Duration::seconds(1));
        assert_eq!(cache.get(7, "abc"), None);

        // The stale entry was removed on read, not merely hidden.
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[test]
    fn put_overwrites_existing_entry() {
        let (cache, _clock) = manual_cache(Duration::minutes(10));

        cache.put(7, "abc", outcome("first"));
        cache.put(7, "abc", outcome("second"));

        assert_eq!(cache.get(7, "abc"), Some(outcome("second")));
        assert_eq!(cache.stats().entry_count, 1);
    }

    #[test]
    fn put_sweeps_stale_entries_opportunistically() {
        let (cache, clock) = manual_cache(Duration::minutes(10));

        cache.put(1, "old", outcome("stale soon"));
        clock.advance(Duration::minutes(11));

        cache.put(2, "new", outcome("fresh"));

        let stats = cache.stats();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.keys, vec!["analytics_2_new".to_string()]);
    }

    #[test]
    fn sweep_reports_removed_count() {
        let (cache, clock) = manual_cache(Duration::minutes(10));

        cache.put(1, "a", outcome("one"));
        cache.put(2, "b", outcome("two"));

        assert_eq!(cache.sweep(), 0);

        clock.advance(Duration::minutes(11));
        assert_eq!(cache.sweep(), 2);
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[test]
    fn invalidate_removes_only_that_subject() {
        let (cache, _clock) = manual_cache(Duration::minutes(10));

        cache.put(1, "a", outcome("one"));
        cache.put(1, "b", outcome("also one"));
        cache.put(2, "c", outcome("two"));

        assert_eq!(cache.invalidate(1), 2);

        assert_eq!(cache.get(1, "a"), None);
        assert_eq!(cache.get(1, "b"), None);
        assert!(cache.get(2, "c").is_some());
    }

    #[test]
    fn clear_empties_the_store() {
        let (cache, _clock) = manual_cache(Duration::minutes(10));

        cache.put(1, "a", outcome("one"));
        cache.put(2, "b", outcome("two"));

        cache.clear();

        assert_eq!(cache.stats().entry_count, 0);
        assert_eq!(cache.get(1, "a"), None);
    }

    #[test]
    fn stats_lists_formatted_keys() {
        let (cache, _clock) = manual_cache(Duration::seconds(600));

        cache.put(3, "zz", outcome("three"));
        cache.put(1, "aa", outcome("one"));

        let stats = cache.stats();
        assert_eq!(stats.ttl_seconds, 600);
        assert_eq!(
            stats.keys,
            vec![
                "analytics_1_aa".to_string(),
                "analytics_3_zz".to_string(),
            ]
        );
    }

    #[test]
    fn clones_share_the_store() {
        let (cache, _clock) = manual_cache(Duration::minutes(10));
        let clone = cache.clone();

        cache.put(7, "abc", outcome("shared"));

        assert!(clone.get(7, "abc").is_some());
    }
}
