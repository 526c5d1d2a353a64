//! Route and heightfield fixtures shared by unit tests.

use foundation::math::{LatLon, offset_by_meters};
use foundation::{Route, RoutePoint, resample};
use terrain::TerrainHeight;

pub(crate) fn start() -> LatLon {
    LatLon::new(46.0, 7.0)
}

/// Two points `len_m` apart heading due north, at sea level.
pub(crate) fn straight_route(len_m: f64) -> Route {
    let end = offset_by_meters(start(), 0.0, len_m);
    Route::new(vec![
        RoutePoint::new(start().lat, start().lon, 0.0),
        RoutePoint::new(end.lat, end.lon, 0.0),
    ])
    .unwrap()
}

/// Two 2 km legs meeting at a 150° turn, resampled every 100 m.
pub(crate) fn hairpin_route() -> Route {
    let corner = offset_by_meters(start(), 0.0, 2000.0);
    let heading = 150.0f64.to_radians();
    let end = offset_by_meters(corner, 2000.0 * heading.sin(), 2000.0 * heading.cos());
    let points: Vec<RoutePoint> = [start(), corner, end]
        .iter()
        .map(|p| RoutePoint::new(p.lat, p.lon, 0.0))
        .collect();
    Route::new(resample(&points, 100.0)).unwrap()
}

pub(crate) fn sea_level(_lon: f64, _lat: f64) -> TerrainHeight {
    TerrainHeight::Height(0.0)
}

/// Ground rising linearly to the north, `slope` meters per meter.
pub(crate) fn northward_ramp(slope: f64) -> impl Fn(f64, f64) -> TerrainHeight {
    move |_lon: f64, lat: f64| {
        let north_m = (lat - start().lat).to_radians() * foundation::math::EARTH_RADIUS_M;
        TerrainHeight::Height((north_m * slope).max(0.0))
    }
}
