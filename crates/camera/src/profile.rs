//! Along-route profiles: time warping near the summit, relief and turns.

use foundation::math::bearing_delta_deg;
use foundation::{Route, RoutePoint};

/// Gaussian proximity of `distance_m` to the summit, 1.0 at the summit itself.
pub fn summit_weight(distance_m: f64, summit_distance_m: f64, sigma_m: f64) -> f64 {
    let d = distance_m - summit_distance_m;
    (-(d * d) / (2.0 * sigma_m * sigma_m)).exp()
}

/// Cumulative distances where each segment is stretched by
/// `1 + bonus * summit_weight(segment midpoint)`.
pub fn weighted_distances(distances: &[f64], summit_distance_m: f64, sigma_m: f64, bonus: f64) -> Vec<f64> {
    let mut weighted = Vec::with_capacity(distances.len());
    weighted.push(0.0);
    for pair in distances.windows(2) {
        let mid = 0.5 * (pair[0] + pair[1]);
        let weight = 1.0 + bonus * summit_weight(mid, summit_distance_m, sigma_m);
        let prev = weighted.last().copied().unwrap_or(0.0);
        weighted.push(prev + (pair[1] - pair[0]) * weight);
    }
    weighted
}

/// Maps normalized time `t` to an along-route distance through the weighted profile.
pub fn distance_for_time(distances: &[f64], weighted: &[f64], t: f64) -> f64 {
    let (Some(&first), Some(&last), Some(&total_weight)) =
        (distances.first(), distances.last(), weighted.last())
    else {
        return 0.0;
    };
    if t <= 0.0 {
        return first;
    }
    if t >= 1.0 {
        return last;
    }

    let target = t * total_weight;
    let idx = weighted.partition_point(|w| *w < target);
    if idx == 0 {
        return first;
    }
    if idx >= weighted.len() {
        return last;
    }
    let (w0, w1) = (weighted[idx - 1], weighted[idx]);
    if w1 == w0 {
        return distances[idx];
    }
    let ratio = (target - w0) / (w1 - w0);
    distances[idx - 1] + ratio * (distances[idx] - distances[idx - 1])
}

/// Elevation range inside `±window_m / 2` around each point.
pub fn relief_profile(distances: &[f64], elevations: &[f64], window_m: f64) -> Vec<f64> {
    let half = window_m / 2.0;
    let n = distances.len().min(elevations.len());
    let (mut start, mut end) = (0, 0);
    (0..n)
        .map(|idx| {
            let center = distances[idx];
            while start < n && distances[start] < center - half {
                start += 1;
            }
            while end < n && distances[end] <= center + half {
                end += 1;
            }
            let window = &elevations[start..end.max(start)];
            let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let min = window.iter().copied().fold(f64::INFINITY, f64::min);
            if window.is_empty() { 0.0 } else { max - min }
        })
        .collect()
}

/// A main-sequence sampling point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RouteSample {
    pub distance_m: f64,
    pub point: RoutePoint,
    /// Bearing toward the look-ahead point.
    pub bearing: f64,
    pub progress: f64,
}

impl RouteSample {
    fn at(route: &Route, distance_m: f64, lookahead_m: f64) -> Self {
        let total = route.total_distance();
        let point = route.point_at(distance_m);
        let ahead = route.point_at((distance_m + lookahead_m).min(total));
        Self {
            distance_m,
            point,
            bearing: point.bearing_to(&ahead),
            progress: if total > 0.0 { distance_m / total } else { 0.0 },
        }
    }
}

/// Summit-aware sampling parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SampleWarp {
    pub summit_distance_m: f64,
    pub sigma_m: f64,
    pub bonus: f64,
}

/// `frames` samples spread over the route in warped time.
pub fn warped_samples(route: &Route, frames: usize, lookahead_m: f64, warp: SampleWarp) -> Vec<RouteSample> {
    let weighted = weighted_distances(route.distances(), warp.summit_distance_m, warp.sigma_m, warp.bonus);
    (0..frames)
        .map(|frame| {
            let t = if frames > 1 { frame as f64 / (frames - 1) as f64 } else { 0.0 };
            let d = distance_for_time(route.distances(), &weighted, t);
            RouteSample::at(route, d, lookahead_m)
        })
        .collect()
}

/// `frames` samples spaced uniformly in distance.
pub fn uniform_samples(route: &Route, frames: usize, lookahead_m: f64) -> Vec<RouteSample> {
    let total = route.total_distance();
    (0..frames)
        .map(|frame| {
            let t = if frames > 1 { frame as f64 / (frames - 1) as f64 } else { 0.0 };
            RouteSample::at(route, t * total, lookahead_m)
        })
        .collect()
}

/// Heading change between each sample's neighbours over a 60° scale, in
/// `[0, 1]`. The first and last samples have no turn.
pub fn turn_weights(samples: &[RouteSample]) -> Vec<f64> {
    (0..samples.len())
        .map(|idx| {
            if idx == 0 || idx + 1 >= samples.len() {
                return 0.0;
            }
            let delta = bearing_delta_deg(samples[idx - 1].bearing, samples[idx + 1].bearing);
            (delta / 60.0).min(1.0)
        })
        .collect()
}

/// Index of the sample closest to `distance_m` (first on ties).
pub fn nearest_sample(samples: &[RouteSample], distance_m: f64) -> usize {
    samples
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best, best_delta), (idx, s)| {
            let delta = (s.distance_m - distance_m).abs();
            if delta < best_delta { (idx, delta) } else { (best, best_delta) }
        })
        .0
}
