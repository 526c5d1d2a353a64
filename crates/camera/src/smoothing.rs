//! Exponential low-pass filters carried frame to frame as small fold states.

use foundation::math::{Vec2, normalize_bearing};

/// Exponential blend: `prev` moves toward `cur` by `alpha`.
pub fn blend(prev: f64, cur: f64, alpha: f64) -> f64 {
    prev * (1.0 - alpha) + cur * alpha
}

/// Per-frame alpha for a filter with time constant `tau_s` at `fps`, scaled by
/// a channel sensitivity. A non-positive time constant disables smoothing.
pub fn alpha_from_time_constant(fps: u32, tau_s: f64, sensitivity: f64) -> f64 {
    if tau_s <= 0.0 {
        return 1.0;
    }
    let dt = 1.0 / fps.max(1) as f64;
    let base = 1.0 - (-dt / tau_s).exp();
    (base * sensitivity.max(0.1)).clamp(0.01, 1.0)
}

/// Blends two bearings on the unit circle. Falls back to `cur_deg` when the
/// blended vector vanishes (exactly opposite bearings at `alpha = 0.5`).
pub fn smooth_bearing(prev_deg: f64, cur_deg: f64, alpha: f64) -> f64 {
    let (prev_sin, prev_cos) = prev_deg.to_radians().sin_cos();
    let (cur_sin, cur_cos) = cur_deg.to_radians().sin_cos();
    let x = blend(prev_cos, cur_cos, alpha);
    let y = blend(prev_sin, cur_sin, alpha);
    if x == 0.0 && y == 0.0 {
        return cur_deg;
    }
    normalize_bearing(y.atan2(x).to_degrees())
}

/// Auto-mode filter strengths for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TurnAlphas {
    pub position: f64,
    pub target: f64,
    pub altitude: f64,
}

impl TurnAlphas {
    const POSITION: f64 = 0.18;
    const TARGET: f64 = 0.14;
    const ALTITUDE: f64 = 0.12;

    /// Filters loosen in sharp turns so the camera keeps up with the route:
    /// up to 60% for position and target, 40% for altitude.
    pub fn for_turn_weight(turn_weight: f64) -> Self {
        let tw = turn_weight.clamp(0.0, 1.0);
        Self {
            position: (Self::POSITION * (1.0 + 0.6 * tw)).max(0.05),
            target: (Self::TARGET * (1.0 + 0.6 * tw)).max(0.04),
            altitude: (Self::ALTITUDE * (1.0 + 0.4 * tw)).max(0.05),
        }
    }
}

/// Running auto-mode filter state in a local meter frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SmoothingState {
    pub position: Vec2,
    pub target: Vec2,
    pub altitude: f64,
}

/// One raw frame in local meters, plus the altitude the filter may not undercut.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SmoothingInput {
    pub position: Vec2,
    pub target: Vec2,
    pub altitude: f64,
    pub min_altitude: f64,
}

impl SmoothingState {
    /// Seeds the filters from the first raw frame.
    pub fn seed(first: &SmoothingInput) -> Self {
        Self {
            position: first.position,
            target: first.target,
            altitude: first.altitude,
        }
    }

    pub fn step(self, input: &SmoothingInput, alphas: TurnAlphas) -> Self {
        Self {
            position: self.position.lerp(input.position, alphas.position),
            target: self.target.lerp(input.target, alphas.target),
            altitude: blend(self.altitude, input.altitude, alphas.altitude).max(input.min_altitude),
        }
    }
}

/// Running follow-mode filter state. Altitude is unset until the first frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FollowState {
    pub target: Vec2,
    pub bearing: f64,
    pub altitude: Option<f64>,
}

/// Follow-mode channel alphas.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FollowAlphas {
    pub target: f64,
    pub bearing: f64,
    pub altitude: f64,
}

impl FollowState {
    pub fn new(target: Vec2, bearing: f64) -> Self {
        Self {
            target,
            bearing,
            altitude: None,
        }
    }

    /// Advances the target and bearing filters.
    pub fn track(self, target: Vec2, bearing: f64, alphas: FollowAlphas) -> Self {
        Self {
            target: self.target.lerp(target, alphas.target),
            bearing: smooth_bearing(self.bearing, bearing, alphas.bearing),
            altitude: self.altitude,
        }
    }

    /// Advances the altitude filter; the first sample seeds it.
    pub fn settle(self, altitude: f64, alphas: FollowAlphas) -> Self {
        Self {
            altitude: Some(match self.altitude {
                Some(prev) => blend(prev, altitude, alphas.altitude),
                None => altitude,
            }),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "{a} != {b} (eps={eps})");
    }

    #[test]
    fn alpha_follows_time_constant() {
        // dt = 1/30, tau = 0.5: 1 - e^(-1/15)
        let base = 1.0 - (-1.0f64 / 15.0).exp();
        assert_close(alpha_from_time_constant(30, 0.5, 1.0), base, 1e-12);
        assert_close(alpha_from_time_constant(30, 0.5, 3.0), base * 3.0, 1e-12);
        // Sensitivity floors at 0.1 and the result at 0.01.
        assert_close(alpha_from_time_constant(30, 0.5, 0.0), 0.01, 1e-12);
        assert_eq!(alpha_from_time_constant(30, 0.0, 1.0), 1.0);
        assert_eq!(alpha_from_time_constant(1, 0.01, 50.0), 1.0);
    }

    #[test]
    fn bearings_blend_across_north() {
        let b = smooth_bearing(350.0, 10.0, 0.5);
        assert!(b < 1e-9 || b > 360.0 - 1e-9, "got {b}");
        assert_close(smooth_bearing(350.0, 30.0, 0.5), 10.0, 1e-9);
        assert_close(smooth_bearing(80.0, 100.0, 0.25), 85.0, 0.05);
    }

    #[test]
    fn turn_alphas_loosen_in_turns() {
        let straight = TurnAlphas::for_turn_weight(0.0);
        let turn = TurnAlphas::for_turn_weight(1.0);
        assert_close(straight.position, 0.18, 1e-12);
        assert_close(turn.position, 0.18 * 1.6, 1e-12);
        assert_close(turn.target, 0.14 * 1.6, 1e-12);
        assert_close(turn.altitude, 0.12 * 1.4, 1e-12);
        assert!(turn.position > straight.position);
    }

    #[test]
    fn smoothing_never_undercuts_min_altitude() {
        let first = SmoothingInput {
            position: Vec2::new(0.0, 0.0),
            target: Vec2::new(0.0, 300.0),
            altitude: 200.0,
            min_altitude: 200.0,
        };
        let climb = SmoothingInput {
            position: Vec2::new(100.0, 0.0),
            target: Vec2::new(100.0, 300.0),
            altitude: 600.0,
            min_altitude: 600.0,
        };
        let state = SmoothingState::seed(&first).step(&climb, TurnAlphas::for_turn_weight(0.0));
        assert_eq!(state.altitude, 600.0);
        assert_close(state.position.x, 18.0, 1e-9);
        assert_close(state.target.x, 14.0, 1e-9);
    }

    #[test]
    fn follow_state_seeds_altitude_then_filters() {
        let alphas = FollowAlphas {
            target: 0.5,
            bearing: 0.5,
            altitude: 0.25,
        };
        let s = FollowState::new(Vec2::default(), 0.0).settle(100.0, alphas);
        assert_eq!(s.altitude, Some(100.0));
        let s = s.track(Vec2::new(10.0, 0.0), 90.0, alphas).settle(200.0, alphas);
        assert_eq!(s.altitude, Some(125.0));
        assert_close(s.target.x, 5.0, 1e-12);
        assert_close(s.bearing, 45.0, 1e-9);
    }
}
