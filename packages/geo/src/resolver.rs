//! Subject coordinate resolution.
//!
//! Stored coordinates win when both are present and non-zero (zero pairs
//! come from unpopulated records and are treated as absent). Otherwise an
//! ordered list of URL pattern matchers is tried; the first match wins.

use std::sync::LazyLock;

use regex::Regex;
use strum_macros::{AsRefStr, Display};

use crate::Coordinates;

static EMBEDDED_AT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(-?\d+\.?\d*),(-?\d+\.?\d*)").expect("valid regex"));

static EMBEDDED_3D4D_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!3d(-?\d+\.?\d*)!4d(-?\d+\.?\d*)").expect("valid regex"));

static QUERY_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"q=(-?\d+\.?\d*),(-?\d+\.?\d*)").expect("valid regex"));

/// The URL pattern that produced a coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum UrlMatcher {
    /// `@lat,lon` segment embedded in the URL path.
    #[strum(serialize = "embedded-at")]
    EmbeddedAt,
    /// `!3d<lat>!4d<lon>` data segment.
    #[strum(serialize = "embedded-3d4d")]
    Embedded3d4d,
    /// `q=lat,lon` query parameter.
    #[strum(serialize = "query-param")]
    QueryParam,
}

impl UrlMatcher {
    /// All matchers in their fixed priority order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::EmbeddedAt, Self::Embedded3d4d, Self::QueryParam]
    }

    fn regex(self) -> &'static Regex {
        match self {
            Self::EmbeddedAt => &EMBEDDED_AT_RE,
            Self::Embedded3d4d => &EMBEDDED_3D4D_RE,
            Self::QueryParam => &QUERY_PARAM_RE,
        }
    }
}

/// Extracts a coordinate pair from a map-service URL.
///
/// Matchers run in the priority order of [`UrlMatcher::all`]; the first one
/// whose captures parse as floats wins and tags the result.
#[must_use]
pub fn extract_from_url(url: &str) -> Option<(Coordinates, UrlMatcher)> {
    for matcher in UrlMatcher::all() {
        let Some(caps) = matcher.regex().captures(url) else {
            continue;
        };
        let parsed = caps.get(1).zip(caps.get(2)).and_then(|(lat, lon)| {
            let latitude = lat.as_str().parse().ok()?;
            let longitude = lon.as_str().parse().ok()?;
            Some(Coordinates::new(latitude, longitude))
        });
        if let Some(coords) = parsed {
            return Some((coords, *matcher));
        }
    }
    None
}

/// Resolves a subject's origin coordinates.
///
/// Returns `None` when neither stored values nor the URL yield a pair.
/// Callers must treat `None` as a data-quality problem on the subject, not
/// a system fault.
#[must_use]
pub fn resolve_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
    map_url: Option<&str>,
) -> Option<Coordinates> {
    if let Some(stored) = stored_pair(latitude, longitude) {
        return Some(stored);
    }
    map_url.and_then(|url| extract_from_url(url).map(|(coords, _)| coords))
}

/// Returns the stored pair when both components are present and non-zero.
fn stored_pair(lat: Option<f64>, lon: Option<f64>) -> Option<Coordinates> {
    let latitude = lat?;
    let longitude = lon?;
    if latitude == 0.0 || longitude == 0.0 {
        return None;
    }
    Some(Coordinates::new(latitude, longitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_embedded_at() {
        let (coords, matcher) =
            extract_from_url("https://maps.google.com/maps/@-7.78,110.36,15z").unwrap();
        assert!((coords.latitude - -7.78).abs() < 1e-9);
        assert!((coords.longitude - 110.36).abs() < 1e-9);
        assert_eq!(matcher, UrlMatcher::EmbeddedAt);
    }

    #[test]
    fn extracts_embedded_3d4d() {
        let url = "https://www.google.com/maps/place/x/data=!3m1!4b1!4m6!3m5!3d-7.7956!4d110.3695";
        let (coords, matcher) = extract_from_url(url).unwrap();
        assert!((coords.latitude - -7.7956).abs() < 1e-9);
        assert!((coords.longitude - 110.3695).abs() < 1e-9);
        assert_eq!(matcher, UrlMatcher::Embedded3d4d);
    }

    #[test]
    fn extracts_query_param() {
        let (coords, matcher) =
            extract_from_url("https://maps.google.com/?q=-7.801,110.365").unwrap();
        assert!((coords.latitude - -7.801).abs() < 1e-9);
        assert!((coords.longitude - 110.365).abs() < 1e-9);
        assert_eq!(matcher, UrlMatcher::QueryParam);
    }

    #[test]
    fn embedded_at_wins_over_query_param() {
        let url = "https://maps.google.com/@-7.78,110.36?q=-8.0,111.0";
        let (coords, matcher) = extract_from_url(url).unwrap();
        assert_eq!(matcher, UrlMatcher::EmbeddedAt);
        assert!((coords.latitude - -7.78).abs() < 1e-9);
    }

    #[test]
    fn no_pattern_yields_none() {
        assert!(extract_from_url("https://maps.google.com/place/somewhere").is_none());
        assert!(extract_from_url("").is_none());
    }

    #[test]
    fn stored_values_take_priority() {
        let coords = resolve_coordinates(
            Some(-7.797),
            Some(110.370),
            Some("https://maps.google.com/@-8.0,111.0"),
        )
        .unwrap();
        assert!((coords.latitude - -7.797).abs() < 1e-9);
        assert!((coords.longitude - 110.370).abs() < 1e-9);
    }

    #[test]
    fn zero_stored_values_fall_through_to_url() {
        let coords =
            resolve_coordinates(Some(0.0), Some(0.0), Some("https://maps.google.com/@-7.78,110.36"))
                .unwrap();
        assert!((coords.latitude - -7.78).abs() < 1e-9);
    }

    #[test]
    fn missing_everything_yields_none() {
        assert!(resolve_coordinates(None, None, None).is_none());
        assert!(resolve_coordinates(None, Some(110.370), None).is_none());
        assert!(resolve_coordinates(None, None, Some("https://example.com/nothing")).is_none());
    }

    #[test]
    fn matcher_tags_are_stable() {
        assert_eq!(UrlMatcher::EmbeddedAt.to_string(), "embedded-at");
        assert_eq!(UrlMatcher::Embedded3d4d.as_ref(), "embedded-3d4d");
        assert_eq!(UrlMatcher::QueryParam.to_string(), "query-param");
    }
}
