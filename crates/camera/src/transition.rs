//! Orbit-and-zoom intro and outro sequences around the main camera path.

use foundation::GeoBounds;
use foundation::RoutePoint;
use foundation::math::{LatLon, Vec2, haversine_m, meters_between, offset_by_meters};
use terrain::HeightSource;

use crate::diagnostics::Diagnostics;
use crate::frame::{CameraFrame, LngLat};

/// Classic smoothstep on `[0, 1]`.
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Horizontal offsets below this are treated as "camera directly overhead".
const MIN_ORBIT_RADIUS_M: f64 = 50.0;
const ZOOM_SCALE: f64 = 4.0;
const ZOOM_MARGIN_M: f64 = 1400.0;
const ALTITUDE_MARGIN_M: f64 = 900.0;

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Position on a circle around `center`; angle is a compass bearing in radians.
fn orbit_point(center: LatLon, radius_m: f64, angle_rad: f64) -> LngLat {
    offset_by_meters(center, radius_m * angle_rad.sin(), radius_m * angle_rad.cos()).into()
}

/// Radius and bearing of `camera` around `center`, with a due-north fallback.
fn orbit_base(center: LatLon, camera: LatLon, fallback_radius_m: f64) -> (f64, f64) {
    let offset = meters_between(center, camera);
    let radius = offset.length();
    let offset = if radius < MIN_ORBIT_RADIUS_M {
        Vec2::new(0.0, fallback_radius_m)
    } else {
        offset
    };
    (offset.length(), offset.x.atan2(offset.y))
}

/// Minimum height above the ground under each transition frame.
pub struct GroundClearance<'a, H: ?Sized> {
    pub terrain: &'a H,
    pub clearance_m: f64,
    /// Ground assumed where terrain is unavailable.
    pub fallback_m: f64,
}

impl<H: HeightSource + ?Sized> GroundClearance<'_, H> {
    fn floor(&self, mut frame: CameraFrame, diagnostics: &mut Diagnostics) -> CameraFrame {
        let ground = diagnostics.height_or(self.terrain, frame.position.to_lat_lon(), self.fallback_m);
        frame.altitude = frame.altitude.max(ground + self.clearance_m);
        frame
    }
}

/// Swoops in from high and wide onto the first main frame.
///
/// The orbit holds still for the first 20% of the ease and the zoom finishes
/// at 60%; the last intro frame coincides with the first main frame.
pub fn intro_transition<H: HeightSource + ?Sized>(
    main: &[CameraFrame],
    count: usize,
    ground: &GroundClearance<'_, H>,
    diagnostics: &mut Diagnostics,
) -> Vec<CameraFrame> {
    let Some(first) = main.first() else {
        return Vec::new();
    };
    let center = first.target.to_lat_lon();
    let start_alt = (first.altitude * ZOOM_SCALE).max(first.altitude + ALTITUDE_MARGIN_M);
    let (base_radius, base_angle) = orbit_base(center, first.position.to_lat_lon(), 400.0);
    let start_angle = base_angle + 90f64.to_radians();
    let start_radius = (base_radius * ZOOM_SCALE).max(base_radius + ZOOM_MARGIN_M);

    (0..count)
        .map(|idx| {
            let ease = smoothstep((idx + 1) as f64 / count as f64);
            let zoom = (ease / 0.6).min(1.0);
            let orbit = if ease < 0.2 { 0.0 } else { ((ease - 0.2) / 0.8).min(1.0) };
            let frame = CameraFrame {
                position: orbit_point(
                    center,
                    lerp(start_radius, base_radius, zoom),
                    lerp(start_angle, base_angle, orbit),
                ),
                altitude: lerp(start_alt, first.altitude, zoom),
                target: first.target,
                progress: 0.0,
            };
            ground.floor(frame, diagnostics)
        })
        .collect()
}

/// Pulls back from the last main frame to an overview orbiting the route's
/// bounding-box center while the look-at point drifts to that center.
pub fn outro_transition<H: HeightSource + ?Sized>(
    main: &[CameraFrame],
    count: usize,
    route: &[RoutePoint],
    ground: &GroundClearance<'_, H>,
    diagnostics: &mut Diagnostics,
) -> Vec<CameraFrame> {
    let (Some(last), Some(bounds)) = (main.last(), GeoBounds::from_points(route.iter().map(|p| p.lat_lon())))
    else {
        return Vec::new();
    };
    if count == 0 {
        return Vec::new();
    }

    let center = bounds.center();
    let max_dist = route
        .iter()
        .map(|p| haversine_m(center, p.lat_lon()))
        .fold(0.0, f64::max);
    let overview_radius = 700f64.max(max_dist * 1.7);
    let (base_radius, base_angle) =
        orbit_base(center, last.position.to_lat_lon(), overview_radius * 0.6);
    let end_angle = base_angle + 100f64.to_radians();
    let end_radius = overview_radius
        .max(base_radius * ZOOM_SCALE)
        .max(base_radius + ZOOM_MARGIN_M);
    let end_alt = (last.altitude * 1.6)
        .max(max_dist * 2.2)
        .max(last.altitude * ZOOM_SCALE)
        .max(last.altitude + ALTITUDE_MARGIN_M);

    (0..count)
        .map(|idx| {
            let ease = smoothstep((idx + 1) as f64 / count as f64);
            let zoom = (ease / 0.7).min(1.0);
            let orbit = (ease / 0.85).min(1.0);
            let frame = CameraFrame {
                position: orbit_point(
                    center,
                    lerp(base_radius, end_radius, zoom),
                    lerp(base_angle, end_angle, orbit),
                ),
                altitude: lerp(last.altitude, end_alt, zoom),
                target: LngLat::new(
                    lerp(last.target.lon, center.lon, ease),
                    lerp(last.target.lat, center.lat, ease),
                ),
                progress: 1.0,
            };
            ground.floor(frame, diagnostics)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{northward_ramp, sea_level, start};

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "{a} != {b} (eps={eps})");
    }

    fn frame(camera: LatLon, altitude: f64, target: LatLon, progress: f64) -> CameraFrame {
        CameraFrame {
            position: camera.into(),
            altitude,
            target: target.into(),
            progress,
        }
    }

    fn main_sequence() -> Vec<CameraFrame> {
        let a = start();
        let b = offset_by_meters(a, 0.0, 2000.0);
        vec![
            frame(offset_by_meters(a, -300.0, -200.0), 500.0, offset_by_meters(a, 0.0, 300.0), 0.0),
            frame(offset_by_meters(b, -300.0, -200.0), 600.0, b, 1.0),
        ]
    }

    fn route() -> Vec<RoutePoint> {
        let a = start();
        let b = offset_by_meters(a, 0.0, 2000.0);
        vec![RoutePoint::new(a.lat, a.lon, 0.0), RoutePoint::new(b.lat, b.lon, 0.0)]
    }

    fn sea_level_ground() -> GroundClearance<'static, fn(f64, f64) -> terrain::TerrainHeight> {
        static SEA_LEVEL: fn(f64, f64) -> terrain::TerrainHeight = sea_level;
        GroundClearance {
            terrain: &SEA_LEVEL,
            clearance_m: 0.0,
            fallback_m: 0.0,
        }
    }

    #[test]
    fn smoothstep_endpoints() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert_eq!(smoothstep(0.5), 0.5);
        assert_eq!(smoothstep(2.0), 1.0);
    }

    #[test]
    fn empty_inputs_yield_no_transition() {
        let ground = sea_level_ground();
        let mut d = Diagnostics::new();
        assert!(intro_transition(&[], 10, &ground, &mut d).is_empty());
        assert!(intro_transition(&main_sequence(), 0, &ground, &mut d).is_empty());
        assert!(outro_transition(&[], 10, &route(), &ground, &mut d).is_empty());
        assert!(outro_transition(&main_sequence(), 0, &route(), &ground, &mut d).is_empty());
    }

    #[test]
    fn intro_descends_onto_first_frame() {
        let main = main_sequence();
        let intro = intro_transition(&main, 30, &sea_level_ground(), &mut Diagnostics::new());
        assert_eq!(intro.len(), 30);
        assert!(intro.iter().all(|f| f.progress == 0.0 && f.target == main[0].target));

        // Starts at max(4a, a + 900) and lands exactly on the first frame.
        assert!(intro[0].altitude > 1900.0);
        let last = intro[29];
        assert_close(last.altitude, main[0].altitude, 1e-9);
        assert_close(last.position.lat, main[0].position.lat, 1e-9);
        assert_close(last.position.lon, main[0].position.lon, 1e-9);
        assert!(intro.windows(2).all(|w| w[1].altitude <= w[0].altitude));
    }

    #[test]
    fn intro_fallback_orbit_when_camera_is_overhead() {
        let t = start();
        let main = [frame(t, 800.0, t, 0.0)];
        let intro = intro_transition(&main, 10, &sea_level_ground(), &mut Diagnostics::new());
        // 400 m due north of the target at the end of the zoom.
        let end = meters_between(t, intro[9].position.to_lat_lon());
        assert_close(end.x, 0.0, 0.5);
        assert_close(end.y, 400.0, 0.5);
    }

    #[test]
    fn outro_rises_over_route_center() {
        let main = main_sequence();
        let route = route();
        let outro = outro_transition(&main, 40, &route, &sea_level_ground(), &mut Diagnostics::new());
        assert_eq!(outro.len(), 40);
        assert!(outro.iter().all(|f| f.progress == 1.0));

        let center = GeoBounds::from_points(route.iter().map(|p| p.lat_lon()))
            .unwrap()
            .center();
        let last = outro[39];
        assert_close(last.target.lat, center.lat, 1e-12);
        assert_close(last.target.lon, center.lon, 1e-12);
        // 1 km to the farthest route point: altitude >= max(4 * 600, 2200).
        assert!(last.altitude >= 2400.0 - 1e-9);
        let radius = meters_between(center, last.position.to_lat_lon()).length();
        assert!(radius >= 1700.0 - 1.0, "radius {radius}");
    }

    #[test]
    fn transitions_keep_clearance_over_rising_ground() {
        let terrain = northward_ramp(0.5);
        let ground = GroundClearance {
            terrain: &terrain,
            clearance_m: 220.0,
            fallback_m: 0.0,
        };
        let mut d = Diagnostics::new();
        let main = main_sequence();
        let frames: Vec<CameraFrame> = intro_transition(&main, 30, &ground, &mut d)
            .into_iter()
            .chain(outro_transition(&main, 30, &route(), &ground, &mut d))
            .collect();

        let mut raised = 0;
        for f in &frames {
            let floor = terrain.height_at(f.position.lon, f.position.lat).value_or(0.0) + 220.0;
            assert!(f.altitude >= floor - 1e-9, "{} below {floor}", f.altitude);
            if (f.altitude - floor).abs() < 1e-9 {
                raised += 1;
            }
        }
        assert!(raised > 0, "ramp never forced a frame up");
        assert!(d.is_empty());
    }

    #[test]
    fn missing_terrain_floors_on_fallback_and_counts() {
        let ground = GroundClearance {
            terrain: &terrain::NoTerrain,
            clearance_m: 50.0,
            fallback_m: 2000.0,
        };
        let mut d = Diagnostics::new();
        let intro = intro_transition(&main_sequence(), 5, &ground, &mut d);
        assert!(intro.iter().all(|f| f.altitude >= 2050.0));
        assert_eq!(d.counter(crate::diagnostics::TERRAIN_UNAVAILABLE), 5);
    }
}
