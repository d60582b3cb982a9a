//! Summary fingerprinting for cache addressing.
//!
//! Two summaries produce the same fingerprint exactly when their totals,
//! category counts, month counts, and recent-crime timestamps all agree, so
//! a cached narrative is reused only while the underlying data is
//! unchanged. The digest is deliberately non-cryptographic.

use crimewatch_analytics_models::AggregatedSummary;

/// Computes the deterministic fingerprint of a summary.
///
/// The summary is reduced to a canonical JSON string (sorted keys) over its
/// total, category counts, month counts, and the comma-joined timestamps of
/// its recent crimes, then folded into a 32-bit hash rendered base-36.
#[must_use]
pub fn fingerprint(summary: &AggregatedSummary) -> String {
    let recent_timestamps = summary
        .recent_crimes
        .iter()
        .map(|crime| crime.occurred_at.to_rfc3339())
        .collect::<Vec<_>>()
        .join(",");

    let canonical = serde_json::json!({
        "total": summary.total_crimes,
        "categories": summary.categories,
        "months": summary.monthly_trends,
        "recent": recent_timestamps,
    })
    .to_string();

    to_base36(fold_hash(&canonical).unsigned_abs())
}

/// 32-bit fold hash with wrap-around: `h = (h << 5) - h + byte`.
fn fold_hash(payload: &str) -> i32 {
    let mut hash = 0i32;

    for byte in payload.bytes() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(byte));
    }

    hash
}

fn to_base36(mut value: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();

    while value > 0 {
        digits.push(char::from_digit(value % 36, 36).unwrap_or('0'));
        value /= 36;
    }

    digits.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone as _, Utc};
    use crimewatch_analytics_models::RecentCrime;

    use super::*;

    fn summary(total: u64, categories: &[(&str, u64)]) -> AggregatedSummary {
        AggregatedSummary {
            total_crimes: total,
            categories: categories
                .iter()
                .map(|(name, count)| ((*name).to_string(), *count))
                .collect(),
            monthly_trends: BTreeMap::new(),
            recent_crimes: vec![RecentCrime {
                category: "theft".to_string(),
                occurred_at: Utc.with_ymd_and_hms(2025, 3, 14, 21, 30, 0).unwrap(),
                location_name: "Plaza".to_string(),
                distance_km: 1.2,
            }],
            locations: Vec::new(),
            radius_km: 20.0,
        }
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let a = summary(5, &[("theft", 3), ("fraud", 2)]);
        let b = summary(5, &[("theft", 3), ("fraud", 2)]);

        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn fingerprint_changes_with_total() {
        let a = summary(5, &[("theft", 5)]);
        let b = summary(6, &[("theft", 5)]);

        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn fingerprint_changes_with_categories() {
        let a = summary(5, &[("theft", 3), ("fraud", 2)]);
        let b = summary(5, &[("theft", 2), ("fraud", 3)]);

        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn fingerprint_changes_with_recent_timestamps() {
        let a = summary(5, &[("theft", 5)]);
        let mut b = summary(5, &[("theft", 5)]);
        b.recent_crimes[0].occurred_at = Utc.with_ymd_and_hms(2025, 3, 14, 21, 30, 1).unwrap();

        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn fingerprint_ignores_category_insertion_order() {
        let a = summary(5, &[("theft", 3), ("fraud", 2)]);
        let b = summary(5, &[("fraud", 2), ("theft", 3)]);

        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn fingerprint_is_base36() {
        let fp = fingerprint(&summary(5, &[("theft", 5)]));

        assert!(!fp.is_empty());
        assert!(fp.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn fold_hash_wraps_instead_of_overflowing() {
        let long_payload = "x".repeat(10_000);

        // Just exercising the wrap-around path; the value itself is arbitrary.
        let _ = fold_hash(&long_payload);
    }

    #[test]
    fn base36_zero_renders_as_zero() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
