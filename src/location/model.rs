//! Coordinates and the national geofence.

use serde::{Deserialize, Serialize};

/// Decimal places kept for stored coordinates.
pub const COORDINATE_PRECISION: i32 = 6;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Round both axes to [`COORDINATE_PRECISION`] decimal places.
    pub fn rounded(self) -> Self {
        let factor = 10f64.powi(COORDINATE_PRECISION);
        Self {
            lat: (self.lat * factor).round() / factor,
            lng: (self.lng * factor).round() / factor,
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// Tashkent city centre; the placeholder location for local runs.
pub const TASHKENT: Coordinate = Coordinate::new(41.3111, 69.2401);

/// Inclusive latitude/longitude rectangle used as a coarse geofence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// Rough box around Uzbekistan.
    pub const UZBEKISTAN: BoundingBox = BoundingBox {
        min_lat: 37.0,
        max_lat: 46.0,
        min_lng: 56.0,
        max_lng: 74.0,
    };

    pub fn contains(&self, point: Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lng..=self.max_lng).contains(&point.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tashkent_is_inside_uzbekistan() {
        assert!(BoundingBox::UZBEKISTAN.contains(TASHKENT));
    }

    #[test]
    fn null_island_is_outside_uzbekistan() {
        assert!(!BoundingBox::UZBEKISTAN.contains(Coordinate::new(0.0, 0.0)));
    }

    #[test]
    fn edges_are_inclusive() {
        let bbox = BoundingBox::UZBEKISTAN;
        assert!(bbox.contains(Coordinate::new(37.0, 56.0)));
        assert!(bbox.contains(Coordinate::new(46.0, 74.0)));
        assert!(!bbox.contains(Coordinate::new(46.000001, 74.0)));
        assert!(!bbox.contains(Coordinate::new(40.0, 55.999999)));
    }

    #[test]
    fn rounds_to_six_places() {
        let c = Coordinate::new(41.311_123_456, 69.240_098_765).rounded();
        assert_eq!(c, Coordinate::new(41.311123, 69.240099));
    }

    #[test]
    fn display_uses_six_places() {
        assert_eq!(TASHKENT.to_string(), "41.311100, 69.240100");
    }
}
