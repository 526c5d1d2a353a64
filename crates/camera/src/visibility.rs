//! Line-of-sight checks against a heightfield.
//!
//! The ray march uses a fixed step regardless of distance, so very long rays
//! can skip narrow ridges between samples.

use foundation::math::{LatLon, haversine_m};
use terrain::HeightSource;

/// Sampling parameters for the straight-line ray march.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RayMarch {
    pub step_m: f64,
    /// Terrain within this many meters below the ray counts as blocking.
    pub margin_m: f64,
}

impl Default for RayMarch {
    fn default() -> Self {
        Self {
            step_m: 40.0,
            margin_m: 2.0,
        }
    }
}

/// Altitude budget for [`ensure_visible`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RaiseBudget {
    pub max_raise_m: f64,
    pub step_m: f64,
}

impl RaiseBudget {
    pub const fn new(max_raise_m: f64, step_m: f64) -> Self {
        Self {
            max_raise_m,
            step_m,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VisibilityOutcome {
    pub altitude: f64,
    pub visible: bool,
    /// Number of raise steps taken; 0 when the first check passed.
    pub raises: u32,
}

/// Whether the straight segment from camera to target clears the terrain.
///
/// Interior samples only; endpoints are never tested. Unavailable heights are
/// skipped rather than treated as blocking.
pub fn is_visible<H: HeightSource + ?Sized>(
    terrain: &H,
    camera: LatLon,
    camera_alt: f64,
    target: LatLon,
    target_alt: f64,
    march: RayMarch,
) -> bool {
    let distance = haversine_m(camera, target);
    let steps = ((distance / march.step_m.max(1.0)) as usize).max(1);
    (1..steps).all(|i| {
        let t = i as f64 / steps as f64;
        let lat = camera.lat + (target.lat - camera.lat) * t;
        let lon = camera.lon + (target.lon - camera.lon) * t;
        let ray_alt = camera_alt + (target_alt - camera_alt) * t;
        match terrain.height_at(lon, lat).value() {
            Some(ground) => ground + march.margin_m <= ray_alt,
            None => true,
        }
    })
}

/// Raises the camera in `budget.step_m` increments until the target is
/// visible or the budget is spent. The result never exceeds
/// `camera_alt + budget.max_raise_m`.
pub fn ensure_visible<H: HeightSource + ?Sized>(
    terrain: &H,
    camera: LatLon,
    camera_alt: f64,
    target: LatLon,
    target_alt: f64,
    budget: RaiseBudget,
) -> VisibilityOutcome {
    let march = RayMarch::default();
    let mut outcome = VisibilityOutcome {
        altitude: camera_alt,
        visible: is_visible(terrain, camera, camera_alt, target, target_alt, march),
        raises: 0,
    };

    let mut remaining = budget.max_raise_m.max(0.0);
    while !outcome.visible && remaining > 0.0 {
        let step = if budget.step_m > 0.0 {
            budget.step_m.min(remaining)
        } else {
            remaining
        };
        outcome.altitude += step;
        outcome.raises += 1;
        remaining -= step;
        outcome.visible = is_visible(terrain, camera, outcome.altitude, target, target_alt, march);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::math::offset_by_meters;
    use terrain::TerrainHeight;

    fn origin() -> LatLon {
        LatLon::new(46.0, 7.0)
    }

    fn flat(_lon: f64, _lat: f64) -> TerrainHeight {
        TerrainHeight::Height(100.0)
    }

    /// 1 km east of the origin sits a north-south wall 500 m east, `height` tall.
    fn wall(height: f64) -> impl Fn(f64, f64) -> TerrainHeight {
        let wall_lon = offset_by_meters(origin(), 500.0, 0.0).lon;
        let half_width = offset_by_meters(origin(), 30.0, 0.0).lon - origin().lon;
        move |lon: f64, _lat: f64| {
            if (lon - wall_lon).abs() <= half_width {
                TerrainHeight::Height(height)
            } else {
                TerrainHeight::Height(0.0)
            }
        }
    }

    fn target() -> LatLon {
        offset_by_meters(origin(), 1000.0, 0.0)
    }

    #[test]
    fn clear_sight_over_flat_ground() {
        assert!(is_visible(&flat, origin(), 300.0, target(), 100.0, RayMarch::default()));
    }

    #[test]
    fn ray_below_ground_is_blocked() {
        assert!(!is_visible(&flat, origin(), 50.0, target(), 50.0, RayMarch::default()));
    }

    #[test]
    fn unavailable_terrain_never_blocks() {
        let missing = |_lon: f64, _lat: f64| TerrainHeight::Unavailable;
        assert!(is_visible(&missing, origin(), 0.0, target(), 0.0, RayMarch::default()));
    }

    #[test]
    fn margin_counts_as_blocking() {
        let march = RayMarch::default();
        // Ray at exactly ground + margin still passes, a hair below does not.
        assert!(is_visible(&flat, origin(), 102.0, target(), 102.0, march));
        assert!(!is_visible(&flat, origin(), 101.5, target(), 101.5, march));
    }

    #[test]
    fn ensure_visible_is_a_no_op_when_clear() {
        let out = ensure_visible(&flat, origin(), 400.0, target(), 100.0, RaiseBudget::new(900.0, 80.0));
        assert_eq!(
            out,
            VisibilityOutcome {
                altitude: 400.0,
                visible: true,
                raises: 0
            }
        );
    }

    #[test]
    fn ensure_visible_raises_over_a_wall() {
        let terrain = wall(300.0);
        let out = ensure_visible(&terrain, origin(), 100.0, target(), 0.0, RaiseBudget::new(900.0, 80.0));
        assert!(out.visible);
        assert!(out.raises > 0);
        assert!(out.altitude > 100.0 && out.altitude <= 1000.0);
        assert!(is_visible(&terrain, origin(), out.altitude, target(), 0.0, RayMarch::default()));
    }

    #[test]
    fn fully_occluded_target_reports_failure_at_max_raise() {
        let terrain = wall(10_000.0);
        let out = ensure_visible(&terrain, origin(), 100.0, target(), 0.0, RaiseBudget::new(900.0, 80.0));
        assert!(!out.visible);
        // 11 full steps of 80 m plus a final 20 m step clamped to the budget.
        assert_eq!(out.raises, 12);
        assert!((out.altitude - 1000.0).abs() < 1e-9);
        assert!(out.altitude <= 100.0 + 900.0);
    }
}
