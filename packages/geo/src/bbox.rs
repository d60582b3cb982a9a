//! Coarse rectangular prefilter used before exact distance computation.
//!
//! The window bounds the set of candidate locations the datastore returns,
//! so the expensive per-row haversine work stays proportional to the nearby
//! data. A point just outside a corner of the window can still be inside the
//! true radius; that imprecision is accepted.

use crate::Coordinates;

/// Half-width of the default window in degrees, approximating a 20 km radius.
pub const DEFAULT_MARGIN_DEGREES: f64 = 0.2;

/// Rectangular latitude/longitude window around an origin point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Southern edge in degrees.
    pub min_latitude: f64,
    /// Northern edge in degrees.
    pub max_latitude: f64,
    /// Western edge in degrees.
    pub min_longitude: f64,
    /// Eastern edge in degrees.
    pub max_longitude: f64,
}

impl BoundingBox {
    /// Builds the window extending `margin_degrees` from `origin` in every
    /// direction.
    #[must_use]
    pub fn around(origin: Coordinates, margin_degrees: f64) -> Self {
        Self {
            min_latitude: origin.latitude - margin_degrees,
            max_latitude: origin.latitude + margin_degrees,
            min_longitude: origin.longitude - margin_degrees,
            max_longitude: origin.longitude + margin_degrees,
        }
    }

    /// Window with the default ±0.2° margin.
    #[must_use]
    pub fn around_default(origin: Coordinates) -> Self {
        Self::around(origin, DEFAULT_MARGIN_DEGREES)
    }

    /// Whether `point` lies inside the window. Edges are inclusive.
    #[must_use]
    pub fn contains(&self, point: Coordinates) -> bool {
        point.latitude >= self.min_latitude
            && point.latitude <= self.max_latitude
            && point.longitude >= self.min_longitude
            && point.longitude <= self.max_longitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_extends_symmetrically() {
        let bbox = BoundingBox::around_default(Coordinates::new(-7.797, 110.370));
        assert!((bbox.min_latitude - -7.997).abs() < 1e-9);
        assert!((bbox.max_latitude - -7.597).abs() < 1e-9);
        assert!((bbox.min_longitude - 110.170).abs() < 1e-9);
        assert!((bbox.max_longitude - 110.570).abs() < 1e-9);
    }

    #[test]
    fn contains_origin_and_edges() {
        let origin = Coordinates::new(-7.797, 110.370);
        let bbox = BoundingBox::around_default(origin);
        assert!(bbox.contains(origin));
        assert!(bbox.contains(Coordinates::new(bbox.min_latitude, bbox.min_longitude)));
        assert!(bbox.contains(Coordinates::new(bbox.max_latitude, bbox.max_longitude)));
    }

    #[test]
    fn excludes_points_outside() {
        let bbox = BoundingBox::around_default(Coordinates::new(-7.797, 110.370));
        assert!(!bbox.contains(Coordinates::new(-7.797, 110.6)));
        assert!(!bbox.contains(Coordinates::new(-8.1, 110.370)));
        assert!(!bbox.contains(Coordinates::new(40.0, -74.0)));
    }

    #[test]
    fn custom_margin() {
        let bbox = BoundingBox::around(Coordinates::new(10.0, 20.0), 1.0);
        assert!(bbox.contains(Coordinates::new(10.9, 20.9)));
        assert!(!bbox.contains(Coordinates::new(11.1, 20.0)));
    }
}
