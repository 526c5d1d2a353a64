use super::{EARTH_RADIUS_M, LatLon, Vec2};

/// Shift a coordinate by a local east/north displacement in meters.
///
/// Small-angle flat-Earth approximation: good over the few kilometers a single
/// route spans, not across continents. East is scaled by `cos(lat)` of the
/// starting point to account for meridian convergence.
pub fn offset_by_meters(origin: LatLon, east_m: f64, north_m: f64) -> LatLon {
    let dlat = (north_m / EARTH_RADIUS_M).to_degrees();
    let dlon = (east_m / (EARTH_RADIUS_M * origin.lat.to_radians().cos())).to_degrees();
    LatLon::new(origin.lat + dlat, origin.lon + dlon)
}

/// East/north displacement in meters from `from` to `to` (inverse of
/// [`offset_by_meters`] under the same approximation).
pub fn meters_between(from: LatLon, to: LatLon) -> Vec2 {
    let north = (to.lat - from.lat).to_radians() * EARTH_RADIUS_M;
    let east = (to.lon - from.lon).to_radians() * EARTH_RADIUS_M * from.lat.to_radians().cos();
    Vec2::new(east, north)
}

/// A local tangent frame anchored at a fixed reference point.
///
/// `x` is east and `y` is north, both in meters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LocalFrame {
    pub origin: LatLon,
}

impl LocalFrame {
    pub fn new(origin: LatLon) -> Self {
        Self { origin }
    }

    pub fn to_local(&self, point: LatLon) -> Vec2 {
        meters_between(self.origin, point)
    }

    pub fn to_geo(&self, local: Vec2) -> LatLon {
        offset_by_meters(self.origin, local.x, local.y)
    }
}

/// Unit vector (east, north) for a compass bearing in degrees.
pub fn heading_vector(bearing_deg: f64) -> Vec2 {
    let rad = bearing_deg.to_radians();
    Vec2::new(rad.sin(), rad.cos())
}
