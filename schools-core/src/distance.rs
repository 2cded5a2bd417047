//! Great-circle distance on a spherical Earth.

use std::f64::consts::PI;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

fn to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

/// Haversine distance in kilometers between two points given in degrees.
///
/// Inputs are expected to be range-checked already. Out-of-range values
/// still produce a number, it just doesn't mean anything.
pub fn haversine_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    // Absolute deltas keep the result bit-identical when the points are swapped.
    let d_lat = to_radians((lat2 - lat1).abs());
    let d_lon = to_radians((lon2 - lon1).abs());

    let sin_lat = (d_lat / 2.0).sin();
    let sin_lon = (d_lon / 2.0).sin();
    let a = sin_lat * sin_lat
        + to_radians(lat1).cos() * to_radians(lat2).cos() * sin_lon * sin_lon;
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEW_YORK: (f64, f64) = (40.7128, -74.0060);
    const LOS_ANGELES: (f64, f64) = (34.0522, -118.2437);

    #[test]
    fn test_identical_points_are_zero() {
        for &(lat, lon) in &[(0.0, 0.0), NEW_YORK, LOS_ANGELES, (90.0, 180.0), (-90.0, -180.0)] {
            assert_eq!(haversine_distance_km(lat, lon, lat, lon), 0.0);
        }
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            (NEW_YORK, LOS_ANGELES),
            ((0.0, 0.0), (-33.8688, 151.2093)),
            ((51.5074, -0.1278), (35.6762, 139.6503)),
            ((89.9, 10.0), (-89.9, -170.0)),
        ];
        for ((a, b), (c, d)) in pairs {
            assert_eq!(
                haversine_distance_km(a, b, c, d),
                haversine_distance_km(c, d, a, b)
            );
        }
    }

    #[test]
    fn test_new_york_to_los_angeles() {
        let d = haversine_distance_km(NEW_YORK.0, NEW_YORK.1, LOS_ANGELES.0, LOS_ANGELES.1);
        assert!((d - 3936.0).abs() < 5.0, "got {}", d);
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let d = haversine_distance_km(0.0, 0.0, 0.0, 1.0);
        let expected = EARTH_RADIUS_KM * PI / 180.0;
        assert!((d - expected).abs() < 1e-9);
    }

    #[test]
    fn test_antipodes_are_half_circumference() {
        let d = haversine_distance_km(0.0, 0.0, 0.0, 180.0);
        assert!((d - EARTH_RADIUS_KM * PI).abs() < 1e-6);
    }

    #[test]
    fn test_never_negative() {
        let d = haversine_distance_km(-45.0, 170.0, 45.0, -170.0);
        assert!(d > 0.0);
    }
}
