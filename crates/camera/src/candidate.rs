//! Camera placement candidates for auto mode and their scoring.

use foundation::math::{LatLon, Vec2, haversine_m, heading_vector, offset_by_meters};
use foundation::{Route, RoutePoint, interpolate_scalar};
use terrain::HeightSource;

use crate::auto::AutoConfig;
use crate::profile::{RouteSample, summit_weight};
use crate::visibility::{RayMarch, is_visible};

/// Camera-to-target distance that scores best.
const DESIRED_DISTANCE_M: f64 = 650.0;
/// Roughly this many samples are tested per candidate.
const SCORING_SAMPLES: usize = 30;

/// A fixed camera offset relative to the route heading.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Candidate {
    /// Signed lateral offset; positive is to the left of the heading.
    pub side_offset_m: f64,
    pub back_offset_m: f64,
    pub base_clearance_m: f64,
}

impl Candidate {
    /// Left and right at full back offset, then left and right pulled in to
    /// half the back offset with 80 m of extra clearance.
    pub fn factory(config: &AutoConfig) -> [Candidate; 4] {
        let full = |side: f64| Candidate {
            side_offset_m: side,
            back_offset_m: config.back_offset_m,
            base_clearance_m: config.base_clearance_m,
        };
        let half = |side: f64| Candidate {
            side_offset_m: side,
            back_offset_m: config.back_offset_m * 0.5,
            base_clearance_m: config.base_clearance_m + 80.0,
        };
        [
            full(config.side_offset_m),
            full(-config.side_offset_m),
            half(config.side_offset_m),
            half(-config.side_offset_m),
        ]
    }

    /// Camera position for `sample` with the given (possibly modulated) offsets.
    pub fn offset_position(sample: &RouteSample, side_offset_m: f64, back_offset_m: f64) -> LatLon {
        let heading = heading_vector(sample.bearing);
        let side = Vec2::new(-heading.y, heading.x);
        let offset = side * side_offset_m + heading * (-back_offset_m);
        offset_by_meters(sample.point.lat_lon(), offset.x, offset.y)
    }

    pub fn position(&self, sample: &RouteSample) -> LatLon {
        Self::offset_position(sample, self.side_offset_m, self.back_offset_m)
    }
}

/// The route summit as seen by the camera search.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SummitView {
    pub distance_m: f64,
    pub point: RoutePoint,
    /// Ground height at the summit (terrain, else the recorded elevation).
    pub altitude: f64,
    /// Main-sequence sample nearest the summit.
    pub sample_index: usize,
}

/// Everything candidate scoring reads. Scoring never mutates any of it.
pub struct ScoringContext<'a, H: ?Sized> {
    pub terrain: &'a H,
    pub route: &'a Route,
    pub samples: &'a [RouteSample],
    /// Relief per route point, parallel to `route.distances()`.
    pub relief: &'a [f64],
    pub config: &'a AutoConfig,
    pub summit: SummitView,
}

impl<H: HeightSource + ?Sized> ScoringContext<'_, H> {
    fn relief_at(&self, distance_m: f64) -> f64 {
        interpolate_scalar(self.route.distances(), self.relief, distance_m)
    }

    fn summit_weight(&self, distance_m: f64) -> f64 {
        summit_weight(distance_m, self.summit.distance_m, self.config.summit_sigma_m)
    }

    /// Camera position, ground and altitude for an unmodulated candidate.
    fn placement(&self, candidate: &Candidate, sample: &RouteSample, summit_boost_m: f64) -> (LatLon, f64) {
        let camera = candidate.position(sample);
        let ground = self.terrain.height_at(camera.lon, camera.lat).value_or(sample.point.ele);
        let clearance = candidate.base_clearance_m
            + self.relief_at(sample.distance_m) * self.config.relief_factor
            + summit_boost_m * self.summit_weight(sample.distance_m);
        (camera, ground + clearance)
    }

    /// Whether the candidate at the sample nearest the summit sees the summit.
    pub fn summit_visible(&self, candidate: &Candidate, summit_boost_m: f64) -> bool {
        let Some(sample) = self.samples.get(self.summit.sample_index) else {
            return false;
        };
        let (camera, altitude) = self.placement(candidate, sample, summit_boost_m);
        is_visible(
            self.terrain,
            camera,
            altitude,
            self.summit.point.lat_lon(),
            self.summit.altitude,
            RayMarch::default(),
        )
    }
}

/// `0.7·visibility + 0.2·distanceScore + 0.1·summit (+0.2 when the summit is visible)`.
pub fn score_candidate<H: HeightSource + ?Sized>(candidate: &Candidate, ctx: &ScoringContext<'_, H>) -> f64 {
    let stride = (ctx.samples.len() / SCORING_SAMPLES).max(1);
    let total = ctx.route.total_distance();

    let (visible, tested, distance_sum) = ctx.samples.iter().step_by(stride).fold(
        (0usize, 0usize, 0.0f64),
        |(visible, tested, distance_sum), sample| {
            let (camera, altitude) = ctx.placement(candidate, sample, ctx.config.summit_boost_m);
            let lookahead =
                ctx.config.lookahead_m * (1.0 - 0.8 * ctx.summit_weight(sample.distance_m));
            let target = ctx.route.point_at((sample.distance_m + lookahead).min(total));
            let target_alt = ctx.terrain.height_at(target.lon, target.lat).value_or(target.ele);
            let clear = is_visible(
                ctx.terrain,
                camera,
                altitude,
                target.lat_lon(),
                target_alt,
                RayMarch::default(),
            );
            (
                visible + usize::from(clear),
                tested + 1,
                distance_sum + haversine_m(camera, target.lat_lon()),
            )
        },
    );

    let tested = tested.max(1) as f64;
    let visibility = visible as f64 / tested;
    let avg_distance = distance_sum / tested;
    let distance_score =
        1.0 - ((avg_distance - DESIRED_DISTANCE_M).abs() / DESIRED_DISTANCE_M).min(1.0);

    let summit = if ctx.summit_visible(candidate, ctx.config.summit_boost_m) {
        1.0
    } else {
        0.0
    };
    0.7 * visibility + 0.2 * distance_score + 0.1 * summit + 0.2 * summit
}

/// Highest-scoring candidate; ties keep the earlier one.
pub fn pick_best<H: HeightSource + ?Sized>(
    candidates: &[Candidate],
    ctx: &ScoringContext<'_, H>,
) -> Option<(Candidate, f64)> {
    candidates.iter().fold(None, |best, candidate| {
        let score = score_candidate(candidate, ctx);
        match best {
            Some((_, best_score)) if score <= best_score => best,
            _ => Some((*candidate, score)),
        }
    })
}
