//! Camera path synthesis: turns a prepared route into an ordered sequence of
//! camera frames over a terrain height source.

pub mod auto;
pub mod candidate;
pub mod diagnostics;
pub mod error;
pub mod follow;
pub mod frame;
pub mod plan;
pub mod profile;
pub mod route;
pub mod smoothing;
pub mod transition;
pub mod visibility;

#[cfg(test)]
mod testing;

pub use auto::{AutoConfig, AutoShot, synthesize_auto};
pub use candidate::{Candidate, ScoringContext, SummitView, pick_best, score_candidate};
pub use diagnostics::{
    Diagnostics, SUMMIT_BOOST_ESCALATIONS, TERRAIN_UNAVAILABLE, VISIBILITY_UNATTAINABLE,
};
pub use error::SynthesisError;
pub use follow::{FollowConfig, synthesize_follow};
pub use frame::{CameraFrame, LngLat};
pub use plan::{FrameBudget, route_duration_s};
pub use route::PreparedRoute;
pub use visibility::{RaiseBudget, RayMarch, VisibilityOutcome, ensure_visible, is_visible};

use terrain::HeightSource;
use tracing::{info, warn};

/// Camera behaviour for the main sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraMode {
    Auto(AutoConfig),
    Follow(FollowConfig),
}

impl Default for CameraMode {
    fn default() -> Self {
        CameraMode::Auto(AutoConfig::default())
    }
}

/// Frames plus the counters of everything that degraded along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub frames: Vec<CameraFrame>,
    pub diagnostics: Diagnostics,
}

/// Runs the selected mode over `prepared`, producing `budget.len()` frames.
///
/// `diagnostics` carries counters gathered earlier (route preparation); the
/// returned [`Synthesis`] owns the merged totals.
pub fn synthesize<H: HeightSource + ?Sized>(
    prepared: &PreparedRoute,
    budget: &FrameBudget,
    fps: u32,
    mode: &CameraMode,
    terrain: &H,
    mut diagnostics: Diagnostics,
) -> Result<Synthesis, SynthesisError> {
    let frames = match mode {
        CameraMode::Auto(config) => {
            synthesize_auto(prepared, budget, config, terrain, &mut diagnostics)?.frames
        }
        CameraMode::Follow(config) => {
            synthesize_follow(&prepared.route, budget, fps, config, terrain, &mut diagnostics)?
        }
    };

    info!(
        frames = frames.len(),
        intro = budget.intro,
        main = budget.main,
        outro = budget.outro,
        "camera path synthesized"
    );
    for name in [TERRAIN_UNAVAILABLE, VISIBILITY_UNATTAINABLE] {
        let count = diagnostics.counter(name);
        if count > 0 {
            warn!(counter = name, count, "degraded camera placement");
        }
    }
    Ok(Synthesis { frames, diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sea_level, straight_route};
    use terrain::NoTerrain;

    fn prepared() -> PreparedRoute {
        let route = straight_route(2000.0);
        PreparedRoute {
            summit_distance_m: 0.0,
            route,
            summit_index: 0,
            terrain_elevations: false,
        }
    }

    #[test]
    fn both_modes_fill_the_budget() {
        let budget = FrameBudget::from_duration(4.0, 30, 1.0, 1.0).unwrap();
        for mode in [CameraMode::default(), CameraMode::Follow(FollowConfig::default())] {
            let out = synthesize(&prepared(), &budget, 30, &mode, &sea_level, Diagnostics::new()).unwrap();
            assert_eq!(out.frames.len(), 120);
            assert!(out.diagnostics.is_empty());
        }
    }

    #[test]
    fn missing_terrain_is_counted_not_fatal() {
        let budget = FrameBudget::from_counts(30, 0, 0).unwrap();
        let mut seeded = Diagnostics::new();
        seeded.inc_counter(TERRAIN_UNAVAILABLE, 2);
        let out = synthesize(
            &prepared(),
            &budget,
            30,
            &CameraMode::Follow(FollowConfig::default()),
            &NoTerrain,
            seeded,
        )
        .unwrap();
        assert_eq!(out.frames.len(), 30);
        // Two ground lookups per follow frame on top of the seeded count.
        assert_eq!(out.diagnostics.counter(TERRAIN_UNAVAILABLE), 2 + 2 * 30);
        assert!(out.frames.iter().all(|f| f.altitude >= 30.0));
    }

    #[test]
    fn invalid_mode_config_is_rejected() {
        let budget = FrameBudget::from_counts(10, 0, 0).unwrap();
        let mode = CameraMode::Follow(FollowConfig {
            distance_m: -1.0,
            ..FollowConfig::default()
        });
        let err = synthesize(&prepared(), &budget, 30, &mode, &sea_level, Diagnostics::new());
        assert!(matches!(err, Err(SynthesisError::Configuration(_))));
    }
}
