//! Auto mode: a searched camera offset flying beside the route.

use foundation::interpolate_scalar;
use foundation::math::{LatLon, LocalFrame};
use terrain::HeightSource;
use tracing::{debug, info};

use crate::candidate::{Candidate, ScoringContext, SummitView, pick_best};
use crate::diagnostics::{Diagnostics, SUMMIT_BOOST_ESCALATIONS};
use crate::error::SynthesisError;
use crate::frame::CameraFrame;
use crate::plan::FrameBudget;
use crate::profile::{
    SampleWarp, nearest_sample, relief_profile, summit_weight, turn_weights, warped_samples,
};
use crate::route::PreparedRoute;
use crate::smoothing::{SmoothingInput, SmoothingState, TurnAlphas};
use crate::transition::{GroundClearance, intro_transition, outro_transition};
use crate::visibility::{RaiseBudget, ensure_visible};

const TARGET_RAISE: RaiseBudget = RaiseBudget::new(900.0, 80.0);
const SUMMIT_RAISE: RaiseBudget = RaiseBudget::new(1600.0, 100.0);
/// Extra altitude at full turn weight.
const TURN_BUMP_M: f64 = 80.0;
const SUMMIT_ESCALATION_ATTEMPTS: usize = 3;
const SUMMIT_ESCALATION_FACTOR: f64 = 1.4;

#[derive(Debug, Clone, PartialEq)]
pub struct AutoConfig {
    pub lookahead_m: f64,
    pub side_offset_m: f64,
    pub back_offset_m: f64,
    /// Minimum clearance above the ground under the camera.
    pub base_clearance_m: f64,
    pub relief_factor: f64,
    pub summit_boost_m: f64,
    pub relief_window_m: f64,
    pub summit_sigma_m: f64,
    /// Extra time spent near the summit (Gaussian peak weight).
    pub summit_bonus: f64,
}

impl Default for AutoConfig {
    fn default() -> Self {
        Self {
            lookahead_m: 320.0,
            side_offset_m: 400.0,
            back_offset_m: 260.0,
            base_clearance_m: 220.0,
            relief_factor: 0.35,
            summit_boost_m: 220.0,
            relief_window_m: 900.0,
            summit_sigma_m: 450.0,
            summit_bonus: 2.0,
        }
    }
}

impl AutoConfig {
    pub fn validate(&self) -> Result<(), SynthesisError> {
        let positive = [
            ("lookahead_m", self.lookahead_m),
            ("relief_window_m", self.relief_window_m),
            ("summit_sigma_m", self.summit_sigma_m),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SynthesisError::config(format!("{name} must be positive, got {value}")));
            }
        }
        let non_negative = [
            ("base_clearance_m", self.base_clearance_m),
            ("back_offset_m", self.back_offset_m),
            ("relief_factor", self.relief_factor),
            ("summit_boost_m", self.summit_boost_m),
            ("summit_bonus", self.summit_bonus),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SynthesisError::config(format!("{name} must be non-negative, got {value}")));
            }
        }
        if !self.side_offset_m.is_finite() {
            return Err(SynthesisError::config("side_offset_m must be finite"));
        }
        Ok(())
    }
}

/// Auto-mode result: the full frame sequence plus what the search decided.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoShot {
    pub frames: Vec<CameraFrame>,
    pub candidate: Candidate,
    pub summit_boost_m: f64,
}

/// A main frame before smoothing.
#[derive(Debug, Copy, Clone)]
struct RawFrame {
    camera: LatLon,
    altitude: f64,
    target: LatLon,
    progress: f64,
    turn_weight: f64,
    /// Ground fallback for this sample when terrain is unavailable.
    route_ele: f64,
}

pub fn synthesize_auto<H: HeightSource + ?Sized>(
    prepared: &PreparedRoute,
    budget: &FrameBudget,
    config: &AutoConfig,
    terrain: &H,
    diagnostics: &mut Diagnostics,
) -> Result<AutoShot, SynthesisError> {
    config.validate()?;
    let route = &prepared.route;
    let total = route.total_distance();

    let samples = warped_samples(
        route,
        budget.main.max(2),
        config.lookahead_m,
        SampleWarp {
            summit_distance_m: prepared.summit_distance_m,
            sigma_m: config.summit_sigma_m,
            bonus: config.summit_bonus,
        },
    );
    let relief = relief_profile(route.distances(), &route.elevations(), config.relief_window_m);

    let summit_point = route.point_at(prepared.summit_distance_m);
    let summit = SummitView {
        distance_m: prepared.summit_distance_m,
        point: summit_point,
        altitude: diagnostics.height_or(terrain, summit_point.lat_lon(), summit_point.ele),
        sample_index: nearest_sample(&samples, prepared.summit_distance_m),
    };
    let ctx = ScoringContext {
        terrain,
        route,
        samples: &samples,
        relief: &relief,
        config,
        summit,
    };

    let candidates = Candidate::factory(config);
    let (candidate, score) = pick_best(&candidates, &ctx)
        .ok_or_else(|| SynthesisError::config("no camera candidates"))?;
    info!(?candidate, score, "auto camera candidate chosen");

    let mut summit_boost_m = config.summit_boost_m;
    for _ in 0..SUMMIT_ESCALATION_ATTEMPTS {
        if ctx.summit_visible(&candidate, summit_boost_m) {
            break;
        }
        summit_boost_m *= SUMMIT_ESCALATION_FACTOR;
        diagnostics.inc_counter(SUMMIT_BOOST_ESCALATIONS, 1);
    }
    if summit_boost_m != config.summit_boost_m {
        debug!(summit_boost_m, "summit boost escalated");
    }

    let turns = turn_weights(&samples);
    let raw: Vec<RawFrame> = samples
        .iter()
        .zip(&turns)
        .enumerate()
        .map(|(idx, (sample, &turn_weight))| {
            let relief_here = interpolate_scalar(route.distances(), &relief, sample.distance_m);
            let weight = summit_weight(sample.distance_m, summit.distance_m, config.summit_sigma_m);
            let relief_scale = 1.0 - (relief_here / 1800.0).min(0.45);
            let side = candidate.side_offset_m * relief_scale * (1.0 - 0.4 * weight);
            let back = candidate.back_offset_m * (1.0 - 0.25 * weight);
            let camera = Candidate::offset_position(sample, side, back);

            let ground = diagnostics.height_or(terrain, camera, sample.point.ele);
            let clearance = candidate.base_clearance_m
                + relief_here * config.relief_factor
                + summit_boost_m * weight;

            let lookahead = config.lookahead_m * (1.0 - 0.8 * weight + 0.8 * turn_weight);
            let target = route.point_at((sample.distance_m + lookahead).min(total));
            let target_alt = diagnostics.height_or(terrain, target.lat_lon(), target.ele);

            let mut altitude = diagnostics.record_visibility(ensure_visible(
                terrain,
                camera,
                ground + clearance,
                target.lat_lon(),
                target_alt,
                TARGET_RAISE,
            ));
            if idx == summit.sample_index {
                altitude = diagnostics.record_visibility(ensure_visible(
                    terrain,
                    camera,
                    altitude,
                    summit.point.lat_lon(),
                    summit.altitude,
                    SUMMIT_RAISE,
                ));
            }

            RawFrame {
                camera,
                altitude: altitude + TURN_BUMP_M * turn_weight,
                target: target.lat_lon(),
                progress: sample.progress,
                turn_weight,
                route_ele: sample.point.ele,
            }
        })
        .collect();

    let main = smooth_frames(&raw, config.base_clearance_m, terrain, diagnostics);
    debug!(frames = main.len(), "auto main sequence built");

    let intro_ground = GroundClearance {
        terrain,
        clearance_m: config.base_clearance_m,
        fallback_m: route.first().ele,
    };
    let outro_ground = GroundClearance {
        terrain,
        clearance_m: config.base_clearance_m,
        fallback_m: route.last().ele,
    };
    let mut frames = intro_transition(&main, budget.intro, &intro_ground, diagnostics);
    let outro = outro_transition(&main, budget.outro, route.points(), &outro_ground, diagnostics);
    frames.extend(main);
    frames.extend(outro);

    Ok(AutoShot {
        frames,
        candidate,
        summit_boost_m,
    })
}

/// Low-passes position, target and altitude in a frame anchored at the first
/// camera, then re-floors altitude over the ground under the moved camera.
fn smooth_frames<H: HeightSource + ?Sized>(
    raw: &[RawFrame],
    min_clearance_m: f64,
    terrain: &H,
    diagnostics: &mut Diagnostics,
) -> Vec<CameraFrame> {
    let Some(first) = raw.first() else {
        return Vec::new();
    };
    let local = LocalFrame::new(first.camera);
    let inputs: Vec<SmoothingInput> = raw
        .iter()
        .map(|f| SmoothingInput {
            position: local.to_local(f.camera),
            target: local.to_local(f.target),
            altitude: f.altitude,
            min_altitude: f.altitude,
        })
        .collect();

    let mut state = SmoothingState::seed(&inputs[0]);
    let mut frames = Vec::with_capacity(raw.len());
    for (frame, input) in raw.iter().zip(&inputs) {
        state = state.step(input, TurnAlphas::for_turn_weight(frame.turn_weight));
        let position = local.to_geo(state.position);
        let ground = diagnostics.height_or(terrain, position, frame.route_ele);
        frames.push(CameraFrame {
            position: position.into(),
            altitude: state.altitude.max(ground + min_clearance_m),
            target: local.to_geo(state.target).into(),
            progress: frame.progress,
        });
    }
    frames
}
