//! Follow mode: a chase camera at fixed distance and pitch behind the route.

use foundation::Route;
use foundation::math::{LocalFrame, heading_vector, offset_by_meters};
use terrain::HeightSource;
use tracing::debug;

use crate::diagnostics::Diagnostics;
use crate::error::SynthesisError;
use crate::frame::CameraFrame;
use crate::plan::FrameBudget;
use crate::profile::uniform_samples;
use crate::smoothing::{FollowAlphas, FollowState, alpha_from_time_constant};
use crate::transition::{GroundClearance, intro_transition, outro_transition};
use crate::visibility::{RaiseBudget, ensure_visible};

const TARGET_RAISE: RaiseBudget = RaiseBudget::new(900.0, 60.0);
const MIN_LOOKAHEAD_M: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FollowConfig {
    /// Horizontal distance behind the target.
    pub distance_m: f64,
    /// Look-down angle in degrees; clamped to [5, 85].
    pub pitch_deg: f64,
    pub lookahead_m: f64,
    pub bearing_sensitivity: f64,
    pub panning_sensitivity: f64,
    /// Filter time constant in seconds; 0 disables smoothing.
    pub smoothing_s: f64,
    pub min_clearance_m: f64,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            distance_m: 500.0,
            pitch_deg: 60.0,
            lookahead_m: 120.0,
            bearing_sensitivity: 3.0,
            panning_sensitivity: 1.5,
            smoothing_s: 0.5,
            min_clearance_m: 30.0,
        }
    }
}

impl FollowConfig {
    pub fn validate(&self) -> Result<(), SynthesisError> {
        let fields = [
            ("distance_m", self.distance_m),
            ("pitch_deg", self.pitch_deg),
            ("lookahead_m", self.lookahead_m),
            ("bearing_sensitivity", self.bearing_sensitivity),
            ("panning_sensitivity", self.panning_sensitivity),
            ("smoothing_s", self.smoothing_s),
            ("min_clearance_m", self.min_clearance_m),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SynthesisError::config(format!("{name} must be finite, got {value}")));
        }
        if self.distance_m <= 0.0 {
            return Err(SynthesisError::config("distance_m must be positive"));
        }
        if self.min_clearance_m < 0.0 {
            return Err(SynthesisError::config("min_clearance_m must be non-negative"));
        }
        Ok(())
    }

    /// Camera height above the target ground implied by distance and pitch.
    pub fn vertical_offset_m(&self) -> f64 {
        self.distance_m / self.pitch_deg.clamp(5.0, 85.0).to_radians().tan()
    }

    fn alphas(&self, fps: u32) -> FollowAlphas {
        FollowAlphas {
            target: alpha_from_time_constant(fps, self.smoothing_s, self.panning_sensitivity),
            bearing: alpha_from_time_constant(fps, self.smoothing_s, self.bearing_sensitivity),
            altitude: alpha_from_time_constant(fps, self.smoothing_s, 1.0),
        }
    }
}

pub fn synthesize_follow<H: HeightSource + ?Sized>(
    route: &Route,
    budget: &FrameBudget,
    fps: u32,
    config: &FollowConfig,
    terrain: &H,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<CameraFrame>, SynthesisError> {
    config.validate()?;
    if fps == 0 {
        return Err(SynthesisError::config("fps must be positive"));
    }

    let samples = uniform_samples(route, budget.main.max(2), config.lookahead_m.max(MIN_LOOKAHEAD_M));
    let alphas = config.alphas(fps);
    let vertical = config.vertical_offset_m();
    let local = LocalFrame::new(route.first().lat_lon());
    debug!(?alphas, vertical, "follow camera filters");

    let mut state = FollowState::new(local.to_local(route.first().lat_lon()), samples[0].bearing);
    let mut main = Vec::with_capacity(samples.len());
    for sample in &samples {
        state = state.track(local.to_local(sample.point.lat_lon()), sample.bearing, alphas);

        let target = local.to_geo(state.target);
        let back = heading_vector(state.bearing) * -config.distance_m;
        let camera = offset_by_meters(target, back.x, back.y);

        let target_alt = diagnostics.height_or(terrain, target, sample.point.ele);
        let ground = diagnostics.height_or(terrain, camera, sample.point.ele);
        let floor = ground + config.min_clearance_m;
        let desired = (target_alt + vertical).max(floor);

        let raised = diagnostics.record_visibility(ensure_visible(
            terrain,
            camera,
            desired,
            target,
            target_alt,
            TARGET_RAISE,
        ));
        state = state.settle(raised, alphas);

        main.push(CameraFrame {
            position: camera.into(),
            altitude: state.altitude.unwrap_or(raised).max(floor),
            target: target.into(),
            progress: sample.progress,
        });
    }

    let intro_ground = GroundClearance {
        terrain,
        clearance_m: config.min_clearance_m,
        fallback_m: route.first().ele,
    };
    let outro_ground = GroundClearance {
        terrain,
        clearance_m: config.min_clearance_m,
        fallback_m: route.last().ele,
    };
    let mut frames = intro_transition(&main, budget.intro, &intro_ground, diagnostics);
    let outro = outro_transition(&main, budget.outro, route.points(), &outro_ground, diagnostics);
    frames.extend(main);
    frames.extend(outro);
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::TERRAIN_UNAVAILABLE;
    use crate::testing::{hairpin_route, northward_ramp, sea_level, straight_route};
    use foundation::math::meters_between;

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "{a} != {b} (eps={eps})");
    }

    #[test]
    fn pitch_is_clamped() {
        let steep = FollowConfig {
            pitch_deg: 90.0,
            ..FollowConfig::default()
        };
        assert_close(steep.vertical_offset_m(), 500.0 / 85f64.to_radians().tan(), 1e-9);
        assert_close(FollowConfig::default().vertical_offset_m(), 500.0 / 3f64.sqrt(), 1e-9);
    }

    #[test]
    fn validation_rejects_degenerate_config() {
        assert!(FollowConfig::default().validate().is_ok());
        let bad = FollowConfig {
            distance_m: 0.0,
            ..FollowConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = FollowConfig {
            smoothing_s: f64::NAN,
            ..FollowConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn camera_trails_target_on_a_straight_route() {
        let route = straight_route(2000.0);
        let budget = FrameBudget::from_counts(60, 0, 0).unwrap();
        let config = FollowConfig::default();
        let frames =
            synthesize_follow(&route, &budget, 30, &config, &sea_level, &mut Diagnostics::new()).unwrap();
        assert_eq!(frames.len(), 60);
        assert_eq!(frames[0].progress, 0.0);
        assert_eq!(frames[59].progress, 1.0);

        for f in &frames {
            let offset = meters_between(f.target.to_lat_lon(), f.position.to_lat_lon());
            assert_close(offset.x, 0.0, 0.5);
            assert_close(offset.y, -500.0, 0.5);
            assert_close(f.altitude, config.vertical_offset_m(), 1e-6);
        }
    }

    #[test]
    fn clearance_holds_on_a_slope() {
        let route = straight_route(3000.0);
        let terrain = northward_ramp(0.4);
        let budget = FrameBudget::from_counts(90, 15, 15).unwrap();
        let config = FollowConfig {
            pitch_deg: 85.0,
            ..FollowConfig::default()
        };
        let frames =
            synthesize_follow(&route, &budget, 30, &config, &terrain, &mut Diagnostics::new()).unwrap();
        assert_eq!(frames.len(), 90);
        for f in &frames {
            let ground = terrain.height_at(f.position.lon, f.position.lat).value_or(0.0);
            assert!(f.altitude >= ground + config.min_clearance_m - 1e-9);
        }
    }

    #[test]
    fn intro_and_outro_keep_clearance_over_steep_ground() {
        let route = straight_route(4000.0);
        let terrain = northward_ramp(0.5);
        let budget = FrameBudget::from_counts(240, 60, 60).unwrap();
        let config = FollowConfig {
            min_clearance_m: 150.0,
            ..FollowConfig::default()
        };
        let mut diagnostics = Diagnostics::new();
        let frames = synthesize_follow(&route, &budget, 30, &config, &terrain, &mut diagnostics).unwrap();

        assert_eq!(frames.len(), 240);
        for (i, f) in frames.iter().enumerate() {
            let ground = terrain.height_at(f.position.lon, f.position.lat).value_or(0.0);
            assert!(
                f.altitude >= ground + config.min_clearance_m - 1e-9,
                "frame {i}: {} over ground {ground}",
                f.altitude
            );
        }
        assert_eq!(diagnostics.counter(TERRAIN_UNAVAILABLE), 0);
    }

    #[test]
    fn bearing_smoothing_survives_the_hairpin() {
        let route = hairpin_route();
        let budget = FrameBudget::from_counts(200, 0, 0).unwrap();
        let frames = synthesize_follow(
            &route,
            &budget,
            30,
            &FollowConfig::default(),
            &sea_level,
            &mut Diagnostics::new(),
        )
        .unwrap();
        for f in &frames {
            let offset = meters_between(f.target.to_lat_lon(), f.position.to_lat_lon());
            assert_close(offset.length(), 500.0, 1.0);
        }
    }

    #[test]
    fn zero_fps_is_a_configuration_error() {
        let route = straight_route(1000.0);
        let budget = FrameBudget::from_counts(10, 0, 0).unwrap();
        let err = synthesize_follow(&route, &budget, 0, &FollowConfig::default(), &sea_level, &mut Diagnostics::new());
        assert!(matches!(err, Err(SynthesisError::Configuration(_))));
    }
}
