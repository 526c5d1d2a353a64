/// Mean Earth radius used by the spherical model (meters).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Geographic coordinates in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Great-circle distance in meters (haversine on a sphere).
pub fn haversine_m(a: LatLon, b: LatLon) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `h` a hair above 1 for antipodal points.
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Initial compass bearing from `a` to `b`, in degrees within [0, 360).
///
/// Coincident points yield 0.0 since `atan2(0, 0)` is defined as zero.
pub fn bearing_deg(a: LatLon, b: LatLon) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    normalize_bearing(y.atan2(x).to_degrees())
}

/// Wrap any angle in degrees into [0, 360).
pub fn normalize_bearing(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Absolute smallest difference between two bearings, in [0, 180].
pub fn bearing_delta_deg(from: f64, to: f64) -> f64 {
    ((to - from + 180.0).rem_euclid(360.0) - 180.0).abs()
}

#[cfg(test)]
mod tests {
    use super::{LatLon, bearing_delta_deg, bearing_deg, haversine_m, normalize_bearing};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = haversine_m(LatLon::new(0.0, 0.0), LatLon::new(1.0, 0.0));
        assert_close(d, 111_194.9, 0.5);
    }

    #[test]
    fn antipodal_distance_does_not_nan() {
        let d = haversine_m(LatLon::new(0.0, 0.0), LatLon::new(0.0, 180.0));
        assert!(d.is_finite());
        assert_close(d, std::f64::consts::PI * super::EARTH_RADIUS_M, 1.0);
    }

    #[test]
    fn cardinal_bearings() {
        let origin = LatLon::new(45.0, 7.0);
        assert_close(bearing_deg(origin, LatLon::new(46.0, 7.0)), 0.0, 1e-9);
        assert_close(bearing_deg(origin, LatLon::new(44.0, 7.0)), 180.0, 1e-9);
        assert!((bearing_deg(origin, LatLon::new(45.0, 8.0)) - 90.0).abs() < 1.0);
        assert!((bearing_deg(origin, LatLon::new(45.0, 6.0)) - 270.0).abs() < 1.0);
    }

    #[test]
    fn bearing_is_always_in_range() {
        let pts = [
            LatLon::new(0.0, 0.0),
            LatLon::new(-33.9, 151.2),
            LatLon::new(89.9, -179.9),
            LatLon::new(-89.9, 179.9),
            LatLon::new(46.5, 7.9),
        ];
        for a in pts {
            for b in pts {
                let brg = bearing_deg(a, b);
                assert!((0.0..360.0).contains(&brg), "bearing {brg} out of range");
            }
        }
    }

    #[test]
    fn coincident_points_have_defined_bearing() {
        let p = LatLon::new(46.5, 7.9);
        let brg = bearing_deg(p, p);
        assert!(!brg.is_nan());
        assert_eq!(brg, 0.0);
    }

    #[test]
    fn normalize_and_delta_wrap() {
        assert_close(normalize_bearing(-90.0), 270.0, 1e-12);
        assert_close(normalize_bearing(720.5), 0.5, 1e-12);
        assert_close(bearing_delta_deg(350.0, 10.0), 20.0, 1e-12);
        assert_close(bearing_delta_deg(10.0, 350.0), 20.0, 1e-12);
        assert_close(bearing_delta_deg(0.0, 180.0), 180.0, 1e-12);
    }
}
