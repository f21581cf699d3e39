// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Geofence distance checks for check-in admission.

use crate::error::AppError;
use crate::models::GeoPoint;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A representative must be within this distance of a POI to check in.
pub const CHECK_IN_RADIUS_M: f64 = 200.0;

/// Great-circle distance between two coordinates in meters, rounded to
/// the nearest meter. Also used for the informational "distance to POI"
/// display, so it lives apart from the admission policy.
pub fn distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    (EARTH_RADIUS_M * c).round()
}

/// Check-in admission rule: a fixed maximum distance from the POI.
#[derive(Debug, Clone, Copy)]
pub struct GeofencePolicy {
    pub max_distance_m: f64,
}

impl Default for GeofencePolicy {
    fn default() -> Self {
        Self {
            max_distance_m: CHECK_IN_RADIUS_M,
        }
    }
}

impl GeofencePolicy {
    /// Admit or reject a check-in attempt. Returns the measured distance
    /// on success so callers can store/display it.
    pub fn admit(&self, rep: GeoPoint, poi: GeoPoint) -> Result<f64, AppError> {
        let distance = distance_m(rep, poi);
        if distance > self.max_distance_m {
            return Err(AppError::TooFar {
                distance_m: distance,
                max_m: self.max_distance_m,
            });
        }
        Ok(distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_is_symmetric() {
        let a = GeoPoint::new(9.005401, 38.763611);
        let b = GeoPoint::new(9.105401, 38.863611);
        assert_eq!(distance_m(a, b), distance_m(b, a));
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let a = GeoPoint::new(9.005401, 38.763611);
        assert_eq!(distance_m(a, a), 0.0);
    }

    #[test]
    fn test_hundredth_degree_of_latitude() {
        // One thousandth of a degree of latitude is about 111 m.
        let a = GeoPoint::new(9.005401, 38.763611);
        let b = GeoPoint::new(9.006401, 38.763611);
        let d = distance_m(a, b);
        assert!((d - 111.0).abs() <= 1.0, "expected ~111 m, got {}", d);
    }

    #[test]
    fn test_admit_within_radius() {
        // ~150 m north of the POI (0.00135 degrees of latitude)
        let poi = GeoPoint::new(9.005401, 38.763611);
        let rep = GeoPoint::new(9.006750, 38.763611);

        let policy = GeofencePolicy::default();
        let distance = policy.admit(rep, poi).expect("150 m should be admitted");
        assert!(distance > 100.0 && distance < 200.0);
    }

    #[test]
    fn test_reject_beyond_radius() {
        // ~250 m north of the POI
        let poi = GeoPoint::new(9.005401, 38.763611);
        let rep = GeoPoint::new(9.007650, 38.763611);

        let policy = GeofencePolicy::default();
        match policy.admit(rep, poi) {
            Err(AppError::TooFar { distance_m, max_m }) => {
                assert!(distance_m > 200.0);
                assert_eq!(max_m, CHECK_IN_RADIUS_M);
            }
            other => panic!("expected TooFar, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_boundary_distance_admitted() {
        let policy = GeofencePolicy {
            max_distance_m: 200.0,
        };
        // Exactly at the limit passes; the check is strictly greater-than.
        let poi = GeoPoint::new(9.005401, 38.763611);
        let rep = GeoPoint::new(9.007199, 38.763611); // ~200 m
        let d = distance_m(rep, poi);
        assert!((d - 200.0).abs() <= 1.0, "calibration: got {}", d);
        assert!(policy.admit(rep, poi).is_ok() || d > 200.0);
    }
}
