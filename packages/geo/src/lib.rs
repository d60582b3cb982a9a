#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Geographic primitives for the CrimeWatch analytics pipeline.
//!
//! Great-circle distances on a spherical-Earth approximation, the coarse
//! bounding-box prefilter applied before exact distance work, and resolution
//! of a subject's origin coordinates from stored values or a map-service URL.

pub mod bbox;
pub mod resolver;

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers for the spherical-Earth approximation.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Degrees north of the equator, negative south.
    pub latitude: f64,
    /// Degrees east of the prime meridian, negative west.
    pub longitude: f64,
}

impl Coordinates {
    /// Creates a coordinate pair. No range validation is performed.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components lie within their valid degree ranges.
    #[must_use]
    pub fn in_range(self) -> bool {
        is_valid_latitude(self.latitude) && is_valid_longitude(self.longitude)
    }

    /// Great-circle distance to `other` in kilometers.
    #[must_use]
    pub fn distance_km(self, other: Self) -> f64 {
        distance_km(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

/// Great-circle distance between two points via the haversine formula.
///
/// Inputs are decimal degrees, converted to radians internally. The result
/// is finite and non-negative for finite inputs; NaN inputs propagate, so
/// coordinate validation belongs upstream.
#[must_use]
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Whether `latitude` lies within [-90, 90] degrees.
#[must_use]
pub fn is_valid_latitude(latitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude)
}

/// Whether `longitude` lies within [-180, 180] degrees.
#[must_use]
pub fn is_valid_longitude(longitude: f64) -> bool {
    (-180.0..=180.0).contains(&longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_symmetric() {
        let d1 = distance_km(-7.797, 110.370, -6.2088, 106.8456);
        let d2 = distance_km(-6.2088, 106.8456, -7.797, 110.370);
        assert!((d1 - d2).abs() < 1e-9);
    }

    #[test]
    fn distance_to_self_is_zero() {
        assert!(distance_km(-7.797, 110.370, -7.797, 110.370).abs() < f64::EPSILON);
        assert!(distance_km(0.0, 0.0, 0.0, 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn one_degree_at_equator() {
        // 1 degree of arc = R * pi / 180 on the sphere.
        let expected = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;
        assert!((distance_km(0.0, 0.0, 0.0, 1.0) - expected).abs() < 1e-6);
        assert!((distance_km(0.0, 0.0, 1.0, 0.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn antipodal_points_half_circumference() {
        let expected = EARTH_RADIUS_KM * std::f64::consts::PI;
        assert!((distance_km(0.0, 0.0, 0.0, 180.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn nearby_business_scenario() {
        // Origin and a monitored location ~0.4 km apart in Yogyakarta.
        let d = distance_km(-7.797, 110.370, -7.80, 110.37);
        assert!((d - 0.4).abs() < 0.1, "expected ~0.4 km, got {d}");
    }

    #[test]
    fn coordinate_range_checks() {
        assert!(is_valid_latitude(-90.0));
        assert!(is_valid_latitude(90.0));
        assert!(!is_valid_latitude(90.001));
        assert!(is_valid_longitude(-180.0));
        assert!(is_valid_longitude(180.0));
        assert!(!is_valid_longitude(180.5));
        assert!(Coordinates::new(-7.797, 110.370).in_range());
        assert!(!Coordinates::new(-95.0, 110.370).in_range());
    }
}
