//! Pure aggregation of bounding-box candidate rows into a crime summary.
//!
//! Rows arrive from the datastore ordered newest-first and prefiltered by
//! the coarse bounding box; this module applies the exact haversine
//! distance cut and folds the survivors into the summary shape. Locations
//! keep their first-seen order, so the list is implicitly ordered by each
//! location's newest crime.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crimewatch_analytics_models::{
    AggregatedSummary, CrimeDetail, NarrativeOutcome, NearbyLocation, RecentCrime, RoughEstimate,
};
use crimewatch_crime_models::CrimeRateBand;
use crimewatch_database_models::LocationCrimeRow;
use crimewatch_geo::Coordinates;

/// Cap on crimes kept per location.
pub const MAX_CRIMES_PER_LOCATION: usize = 50;

/// Cap on crimes included across the whole summary. Once reached, later
/// rows (and therefore locations not yet seen) are dropped entirely.
pub const MAX_TOTAL_CRIMES: u64 = 1000;

/// Number of entries in the recent-crimes list.
pub const RECENT_CRIMES_LIMIT: usize = 10;

/// Recommendations attached to the all-clear narrative.
const ALL_CLEAR_RECOMMENDATIONS: [&str; 3] = [
    "Maintain your current security measures",
    "Check the analysis again as new reports arrive",
    "Keep in touch with local authorities about area conditions",
];

/// Aggregates candidate rows into a summary around `origin`.
///
/// Only crimes at locations within `radius_km` (exact great-circle
/// distance) are included, and every statistic is computed from the
/// included crimes alone: `total_crimes` always equals the sum of the
/// per-location crime list lengths.
#[must_use]
pub fn aggregate(
    origin: Coordinates,
    radius_km: f64,
    rows: &[LocationCrimeRow],
) -> AggregatedSummary {
    let mut summary = AggregatedSummary {
        total_crimes: 0,
        categories: std::collections::BTreeMap::new(),
        monthly_trends: std::collections::BTreeMap::new(),
        recent_crimes: Vec::new(),
        locations: Vec::new(),
        radius_km,
    };
    // location id -> index into summary.locations, or None when the
    // location already failed the distance cut.
    let mut slots: HashMap<i64, Option<usize>> = HashMap::new();

    for row in rows {
        if summary.total_crimes >= MAX_TOTAL_CRIMES {
            break;
        }

        let locations = &mut summary.locations;
        let slot = *slots.entry(row.location_id).or_insert_with(|| {
            let distance =
                origin.distance_km(Coordinates::new(row.latitude, row.longitude));
            if distance > radius_km {
                return None;
            }
            locations.push(NearbyLocation {
                name: row.location_name.clone(),
                latitude: row.latitude,
                longitude: row.longitude,
                distance_km: round_2dp(distance),
                crimes: Vec::new(),
            });
            Some(locations.len() - 1)
        });
        let Some(index) = slot else {
            continue;
        };

        if summary.locations[index].crimes.len() >= MAX_CRIMES_PER_LOCATION {
            continue;
        }

        summary.locations[index].crimes.push(CrimeDetail {
            category: row.category.clone(),
            occurred_at: row.occurred_at,
            description: row.description.clone(),
        });
        summary.total_crimes += 1;
        *summary.categories.entry(row.category.clone()).or_insert(0) += 1;
        *summary
            .monthly_trends
            .entry(month_label(row.occurred_at))
            .or_insert(0) += 1;

        if summary.recent_crimes.len() < RECENT_CRIMES_LIMIT {
            summary.recent_crimes.push(RecentCrime {
                category: row.category.clone(),
                occurred_at: row.occurred_at,
                location_name: row.location_name.clone(),
                distance_km: summary.locations[index].distance_km,
            });
        }
    }

    summary
}

/// Canned narrative for a summary with no crimes inside the radius.
#[must_use]
pub fn all_clear(radius_km: f64) -> NarrativeOutcome {
    NarrativeOutcome::AllClear {
        analysis: format!(
            "No crime reports were found within {radius_km} km of your location. The area \
             currently looks quiet based on the available data. Keep routine security habits \
             in place and check again as new reports arrive."
        ),
        recommendations: ALL_CLEAR_RECOMMENDATIONS
            .iter()
            .map(ToString::to_string)
            .collect(),
    }
}

/// Order-of-magnitude estimate from a raw bounding-box count.
#[must_use]
pub fn rough_estimate(count: u64, radius_km: f64) -> RoughEstimate {
    RoughEstimate {
        approximate_total: approximate(count),
        band: CrimeRateBand::from_count(count),
        radius_km,
    }
}

/// Rounds a count to one significant digit, formatted as `"~200"`.
fn approximate(count: u64) -> String {
    if count == 0 {
        return "~0".to_string();
    }
    let mut magnitude = 1u64;
    while count / magnitude >= 10 {
        magnitude *= 10;
    }
    let rounded = (count + magnitude / 2) / magnitude * magnitude;
    format!("~{rounded}")
}

fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// English month-and-year label, e.g. `"January 2025"`.
fn month_label(when: DateTime<Utc>) -> String {
    when.format("%B %Y").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    const ORIGIN: Coordinates = Coordinates::new(-7.797, 110.370);
    const RADIUS_KM: f64 = 20.0;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
    }

    fn row(
        location_id: i64,
        name: &str,
        latitude: f64,
        longitude: f64,
        category: &str,
        occurred_at: DateTime<Utc>,
    ) -> LocationCrimeRow {
        LocationCrimeRow {
            location_id,
            location_name: name.to_string(),
            latitude,
            longitude,
            category: category.to_string(),
            occurred_at,
            description: None,
        }
    }

    /// Newest-first rows for one nearby location: 3 thefts and 2 frauds.
    fn nearby_scenario() -> Vec<LocationCrimeRow> {
        vec![
            row(1, "Malioboro", -7.80, 110.37, "theft", at(2025, 2, 10, 21)),
            row(1, "Malioboro", -7.80, 110.37, "fraud", at(2025, 2, 3, 14)),
            row(1, "Malioboro", -7.80, 110.37, "theft", at(2025, 1, 20, 19)),
            row(1, "Malioboro", -7.80, 110.37, "fraud", at(2025, 1, 12, 11)),
            row(1, "Malioboro", -7.80, 110.37, "theft", at(2025, 1, 2, 22)),
        ]
    }

    #[test]
    fn aggregates_single_location_scenario() {
        let summary = aggregate(ORIGIN, RADIUS_KM, &nearby_scenario());

        assert_eq!(summary.total_crimes, 5);
        assert_eq!(summary.categories.get("theft"), Some(&3));
        assert_eq!(summary.categories.get("fraud"), Some(&2));
        assert_eq!(summary.locations.len(), 1);

        let location = &summary.locations[0];
        assert_eq!(location.name, "Malioboro");
        assert_eq!(location.crimes.len(), 5);
        assert!(
            (location.distance_km - 0.4).abs() < 0.1,
            "expected ~0.4 km, got {}",
            location.distance_km
        );
        assert!((summary.radius_km - RADIUS_KM).abs() < f64::EPSILON);
    }

    #[test]
    fn excludes_locations_beyond_radius() {
        let mut rows = nearby_scenario();
        // ~111 km north: inside a sloppy bounding box, outside the radius.
        rows.push(row(2, "Semarang", -6.797, 110.37, "theft", at(2025, 2, 1, 9)));

        let summary = aggregate(ORIGIN, RADIUS_KM, &rows);

        assert_eq!(summary.locations.len(), 1);
        assert_eq!(summary.total_crimes, 5);
        assert!(summary.locations.iter().all(|l| l.name != "Semarang"));
    }

    #[test]
    fn distances_are_rounded_to_two_decimals() {
        let summary = aggregate(ORIGIN, RADIUS_KM, &nearby_scenario());

        let d = summary.locations[0].distance_km;
        assert!(((d * 100.0).round() / 100.0 - d).abs() < f64::EPSILON);
        assert!((summary.recent_crimes[0].distance_km - d).abs() < f64::EPSILON);
    }

    #[test]
    fn caps_crimes_per_location() {
        let rows: Vec<_> = (0..60)
            .map(|i| {
                row(
                    1,
                    "Malioboro",
                    -7.80,
                    110.37,
                    "theft",
                    at(2025, 1, 28, 0) - chrono::Duration::hours(i),
                )
            })
            .collect();

        let summary = aggregate(ORIGIN, RADIUS_KM, &rows);

        assert_eq!(summary.total_crimes, 50);
        assert_eq!(summary.locations[0].crimes.len(), 50);
        assert_eq!(summary.categories.get("theft"), Some(&50));
    }

    #[test]
    fn stops_at_the_total_cap() {
        // 30 locations with 40 crimes each, newest first. The per-location
        // cap never binds, so the total cap cuts the tail off.
        let mut rows = Vec::new();
        let mut minute = 0_i64;
        for location in 0..30_i64 {
            for _ in 0..40 {
                rows.push(row(
                    location,
                    "Spot",
                    -7.80,
                    110.37,
                    "theft",
                    at(2025, 3, 1, 0) - chrono::Duration::minutes(minute),
                ));
                minute += 1;
            }
        }
        assert_eq!(rows.len(), 1200);

        let summary = aggregate(ORIGIN, RADIUS_KM, &rows);

        assert_eq!(summary.total_crimes, 1000);
        assert_eq!(summary.locations.len(), 25);
        assert!(summary.locations.iter().all(|l| l.crimes.len() == 40));
    }

    #[test]
    fn locations_keep_first_seen_order() {
        let rows = vec![
            row(2, "Tugu", -7.78, 110.37, "theft", at(2025, 2, 10, 21)),
            row(1, "Malioboro", -7.80, 110.37, "fraud", at(2025, 2, 9, 14)),
            row(2, "Tugu", -7.78, 110.37, "theft", at(2025, 2, 8, 19)),
        ];

        let summary = aggregate(ORIGIN, RADIUS_KM, &rows);

        assert_eq!(summary.locations[0].name, "Tugu");
        assert_eq!(summary.locations[1].name, "Malioboro");
        assert_eq!(summary.locations[0].crimes.len(), 2);
    }

    #[test]
    fn totals_agree_across_every_breakdown() {
        let mut rows = nearby_scenario();
        rows.push(row(2, "Tugu", -7.78, 110.37, "vandalism", at(2025, 2, 12, 8)));
        rows.push(row(3, "Kraton", -7.805, 110.364, "theft", at(2025, 2, 11, 23)));
        // Dropped by the exact-distance cut; must not leak into any count.
        rows.push(row(4, "Semarang", -6.797, 110.37, "theft", at(2025, 2, 14, 2)));

        let summary = aggregate(ORIGIN, RADIUS_KM, &rows);

        assert_eq!(summary.total_crimes, 7);
        assert_eq!(summary.categories.values().sum::<u64>(), summary.total_crimes);
        assert_eq!(
            summary.locations.iter().map(|l| l.crimes.len()).sum::<usize>(),
            usize::try_from(summary.total_crimes).unwrap()
        );
        assert_eq!(summary.monthly_trends.values().sum::<u64>(), summary.total_crimes);
    }

    #[test]
    fn monthly_trends_use_english_labels() {
        let summary = aggregate(ORIGIN, RADIUS_KM, &nearby_scenario());

        assert_eq!(summary.monthly_trends.get("February 2025"), Some(&2));
        assert_eq!(summary.monthly_trends.get("January 2025"), Some(&3));
    }

    #[test]
    fn recent_crimes_keep_the_ten_newest() {
        let rows: Vec<_> = (0..15)
            .map(|i| {
                row(
                    1,
                    "Malioboro",
                    -7.80,
                    110.37,
                    "theft",
                    at(2025, 1, 30, 0) - chrono::Duration::hours(i),
                )
            })
            .collect();

        let summary = aggregate(ORIGIN, RADIUS_KM, &rows);

        assert_eq!(summary.recent_crimes.len(), 10);
        assert_eq!(summary.recent_crimes[0].occurred_at, at(2025, 1, 30, 0));
        assert!(
            summary
                .recent_crimes
                .windows(2)
                .all(|pair| pair[0].occurred_at >= pair[1].occurred_at)
        );
        assert_eq!(summary.recent_crimes[0].location_name, "Malioboro");
    }

    #[test]
    fn empty_rows_give_an_empty_summary() {
        let summary = aggregate(ORIGIN, RADIUS_KM, &[]);

        assert_eq!(summary.total_crimes, 0);
        assert!(summary.locations.is_empty());
        assert!(summary.categories.is_empty());
        assert!(summary.recent_crimes.is_empty());
    }

    #[test]
    fn all_clear_is_not_generated() {
        let outcome = all_clear(20.0);

        assert!(!outcome.is_generated());
        assert_eq!(outcome.recommendations().len(), 3);
        let NarrativeOutcome::AllClear { analysis, .. } = outcome else {
            panic!("expected all-clear outcome");
        };
        assert!(analysis.contains("within 20 km"));
    }

    #[test]
    fn approximates_to_one_significant_digit() {
        assert_eq!(approximate(0), "~0");
        assert_eq!(approximate(5), "~5");
        assert_eq!(approximate(96), "~100");
        assert_eq!(approximate(237), "~200");
        assert_eq!(approximate(1500), "~2000");
    }

    #[test]
    fn rough_estimate_carries_the_band() {
        let estimate = rough_estimate(237, 20.0);

        assert_eq!(estimate.approximate_total, "~200");
        assert_eq!(estimate.band, CrimeRateBand::Highest);
        assert!((estimate.radius_km - 20.0).abs() < f64::EPSILON);

        assert_eq!(rough_estimate(0, 20.0).band, CrimeRateBand::Lowest);
        assert_eq!(rough_estimate(5, 20.0).band, CrimeRateBand::Medium);
    }
}
