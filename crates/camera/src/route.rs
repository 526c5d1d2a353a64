use foundation::{Route, RoutePoint, chaikin_smooth, resample};
use terrain::HeightSource;
use tracing::{debug, info};

use crate::diagnostics::Diagnostics;
use crate::error::SynthesisError;

/// Spacing of the resampled route.
pub const RESAMPLE_STEP_M: f64 = 100.0;
/// Tracks whose elevation range is below this are treated as missing elevation.
pub const FLAT_ELEVATION_RANGE_M: f64 = 5.0;

/// A route ready for camera synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRoute {
    pub route: Route,
    /// Index of the highest point (first one on ties).
    pub summit_index: usize,
    pub summit_distance_m: f64,
    /// Whether elevations were replaced by terrain samples.
    pub terrain_elevations: bool,
}

impl PreparedRoute {
    /// Resamples every 100 m, applies `smooth_iterations` Chaikin passes and
    /// locates the summit. Flat tracks take their elevation from `terrain`.
    pub fn prepare<H: HeightSource + ?Sized>(
        points: &[RoutePoint],
        smooth_iterations: usize,
        terrain: &H,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, SynthesisError> {
        let mut points = resample(points, RESAMPLE_STEP_M);
        if smooth_iterations > 0 {
            points = chaikin_smooth(&points, smooth_iterations);
        }
        let mut route = Route::new(points)?;

        let elevations = route.elevations();
        let (min, max) = elevations
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| (lo.min(*e), hi.max(*e)));
        let terrain_elevations = max - min < FLAT_ELEVATION_RANGE_M;
        if terrain_elevations {
            let sampled: Vec<f64> = route
                .points()
                .iter()
                .map(|p| diagnostics.height_or(terrain, p.lat_lon(), p.ele))
                .collect();
            route = route.with_elevations(&sampled);
            debug!("route elevation range {:.1} m; using terrain elevations", max - min);
        }

        let summit_index = summit_index(&route.elevations());
        let summit_distance_m = route.distances()[summit_index];
        info!(
            points = route.points().len(),
            distance_m = route.total_distance(),
            summit_distance_m,
            "route prepared"
        );
        Ok(Self {
            route,
            summit_index,
            summit_distance_m,
            terrain_elevations,
        })
    }

    pub fn summit(&self) -> RoutePoint {
        self.route.points()[self.summit_index]
    }
}

fn summit_index(elevations: &[f64]) -> usize {
    elevations
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, best_ele), (idx, ele)| {
            if *ele > best_ele { (idx, *ele) } else { (best, best_ele) }
        })
        .0
}
