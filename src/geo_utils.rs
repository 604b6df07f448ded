//! # Geographic Utilities
//!
//! Core geographic computation for location traces.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`distance_km`] | Great-circle distance between two lat/lng pairs |
//! | [`haversine_distance_km`] | Same, for two [`GpsPoint`]s |
//! | [`polyline_length_km`] | Path length of a trace (adjacent pairs only) |
//! | [`compute_bounds`] | Bounding box of a trace |
//!
//! ## Example
//!
//! ```rust
//! use fleet_trace::{GpsPoint, geo_utils};
//!
//! let track = vec![
//!     GpsPoint::new(40.7128, -74.0060),
//!     GpsPoint::new(40.7130, -74.0062),
//!     GpsPoint::new(40.7132, -74.0064),
//! ];
//!
//! let length = geo_utils::polyline_length_km(&track);
//! println!("Track length: {:.3} km", length);
//!
//! let bounds = geo_utils::compute_bounds(&track).unwrap();
//! println!("Bounds: {:.4}N to {:.4}N", bounds.min_lat, bounds.max_lat);
//! ```
//!
//! ## Algorithm Notes
//!
//! Distances use the haversine formula on a sphere of radius 6371 km. Inputs are
//! not range-checked: out-of-range degrees give a defined but meaningless result
//! and NaN propagates.

use geo::{BoundingRect, MultiPoint, Point};

use crate::{Bounds, GpsPoint};

/// Mean Earth radius used for all distances, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance in kilometres between two coordinates given in degrees.
///
/// Returns exactly `0.0` for identical points and is symmetric in its arguments.
///
/// # Example
///
/// ```rust
/// use fleet_trace::geo_utils::distance_km;
///
/// // London to Paris is roughly 344 km
/// let d = distance_km(51.5074, -0.1278, 48.8566, 2.3522);
/// assert!((d - 343.5).abs() < 5.0);
/// ```
#[inline]
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// [`distance_km`] for two [`GpsPoint`]s.
#[inline]
pub fn haversine_distance_km(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    distance_km(p1.latitude, p1.longitude, p2.latitude, p2.longitude)
}

/// Total length of a path in kilometres.
///
/// Sums the distance between each consecutive pair of points, in order. Empty or
/// single-point paths return 0.0.
pub fn polyline_length_km(points: &[GpsPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance_km(&w[0], &w[1]))
        .sum()
}

// =============================================================================
// Bounding Box Functions
// =============================================================================

/// Compute the bounding box of a set of points.
///
/// Returns `None` for empty input. A single point yields a degenerate box.
///
/// ```rust
/// use fleet_trace::{GpsPoint, geo_utils};
///
/// let track = vec![
///     GpsPoint::new(51.5000, -0.1300),
///     GpsPoint::new(51.5100, -0.1200),
///     GpsPoint::new(51.5050, -0.1250),
/// ];
///
/// let bounds = geo_utils::compute_bounds(&track).unwrap();
/// assert_eq!(bounds.min_lat, 51.5000);
/// assert_eq!(bounds.max_lng, -0.1200);
/// ```
pub fn compute_bounds(points: &[GpsPoint]) -> Option<Bounds> {
    let multi: MultiPoint<f64> = points
        .iter()
        .map(|p| Point::new(p.longitude, p.latitude))
        .collect::<Vec<_>>()
        .into();

    multi.bounding_rect().map(|rect| Bounds {
        min_lat: rect.min().y,
        max_lat: rect.max().y,
        min_lng: rect.min().x,
        max_lng: rect.max().x,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_distance_same_point() {
        assert_eq!(distance_km(51.5074, -0.1278, 51.5074, -0.1278), 0.0);
        assert_eq!(distance_km(90.0, 0.0, 90.0, 0.0), 0.0);
        assert_eq!(distance_km(-90.0, 45.0, -90.0, 45.0), 0.0);
        assert_eq!(distance_km(0.0, 180.0, 0.0, 180.0), 0.0);
        assert_eq!(distance_km(12.5, -180.0, 12.5, -180.0), 0.0);
    }

    #[test]
    fn test_distance_symmetric() {
        let pairs = [
            (40.7128, -74.0060, 40.7130, -74.0062),
            (51.5074, -0.1278, 48.8566, 2.3522),
            (-33.8688, 151.2093, 35.6762, 139.6503),
            (0.0, 179.9, 0.0, -179.9),
            (89.0, 10.0, -89.0, -170.0),
        ];
        for (lat1, lon1, lat2, lon2) in pairs {
            assert_eq!(
                distance_km(lat1, lon1, lat2, lon2),
                distance_km(lat2, lon2, lat1, lon1)
            );
        }
    }

    #[test]
    fn test_distance_known_value() {
        // London to Paris is approximately 344 km
        let dist = distance_km(51.5074, -0.1278, 48.8566, 2.3522);
        assert!(approx_eq(dist, 343.5, 5.0));
    }

    #[test]
    fn test_distance_across_antimeridian_is_short() {
        // 0.2 degrees of longitude at the equator, not 359.8
        let dist = distance_km(0.0, 179.9, 0.0, -179.9);
        assert!(approx_eq(dist, 22.24, 0.1));
    }

    #[test]
    fn test_distance_nan_propagates() {
        assert!(distance_km(f64::NAN, 0.0, 1.0, 1.0).is_nan());
    }

    #[test]
    fn test_polyline_length_empty_and_single() {
        assert_eq!(polyline_length_km(&[]), 0.0);
        assert_eq!(polyline_length_km(&[GpsPoint::new(40.7128, -74.0060)]), 0.0);
    }

    #[test]
    fn test_polyline_length_is_path_not_span() {
        // Out and back: path length is twice the span
        let a = GpsPoint::new(40.0, -74.0);
        let b = GpsPoint::new(40.1, -74.0);
        let length = polyline_length_km(&[a, b, a]);
        let span = haversine_distance_km(&a, &b);
        assert!(approx_eq(length, 2.0 * span, 1e-9));
    }

    #[test]
    fn test_compute_bounds() {
        let track = vec![
            GpsPoint::new(51.50, -0.13),
            GpsPoint::new(51.51, -0.12),
            GpsPoint::new(51.505, -0.125),
        ];
        let bounds = compute_bounds(&track).unwrap();
        assert_eq!(bounds.min_lat, 51.50);
        assert_eq!(bounds.max_lat, 51.51);
        assert_eq!(bounds.min_lng, -0.13);
        assert_eq!(bounds.max_lng, -0.12);
    }

    #[test]
    fn test_compute_bounds_empty() {
        assert!(compute_bounds(&[]).is_none());
    }
}
