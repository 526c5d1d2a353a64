//! Route model and polyline utilities.
//!
//! A route is an ordered polyline of [`RoutePoint`]s with a parallel profile of
//! cumulative distances from the start. All functions here are pure.

use crate::math::{LatLon, bearing_deg, haversine_m};

/// A position along the trail. Elevation is meters above sea level.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RoutePoint {
    pub lat: f64,
    pub lon: f64,
    pub ele: f64,
}

impl RoutePoint {
    pub fn new(lat: f64, lon: f64, ele: f64) -> Self {
        Self { lat, lon, ele }
    }

    pub fn lat_lon(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }

    pub fn distance_to(&self, other: &RoutePoint) -> f64 {
        haversine_m(self.lat_lon(), other.lat_lon())
    }

    pub fn bearing_to(&self, other: &RoutePoint) -> f64 {
        bearing_deg(self.lat_lon(), other.lat_lon())
    }

    fn lerp(&self, other: &RoutePoint, ratio: f64) -> RoutePoint {
        RoutePoint::new(
            self.lat + ratio * (other.lat - self.lat),
            self.lon + ratio * (other.lon - self.lon),
            self.ele + ratio * (other.ele - self.ele),
        )
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    #[error("route needs at least two points, got {0}")]
    TooFewPoints(usize),
    #[error("route has zero length")]
    ZeroLength,
}

/// Validated route: at least two points and a positive total length.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    points: Vec<RoutePoint>,
    distances: Vec<f64>,
}

impl Route {
    pub fn new(points: Vec<RoutePoint>) -> Result<Self, RouteError> {
        if points.len() < 2 {
            return Err(RouteError::TooFewPoints(points.len()));
        }
        let distances = cumulative_distances(&points);
        let total = distances.last().copied().unwrap_or(0.0);
        if total <= 0.0 || !total.is_finite() {
            return Err(RouteError::ZeroLength);
        }
        Ok(Self { points, distances })
    }

    pub fn points(&self) -> &[RoutePoint] {
        &self.points
    }

    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    pub fn total_distance(&self) -> f64 {
        // Construction guarantees at least two entries.
        self.distances[self.distances.len() - 1]
    }

    pub fn first(&self) -> RoutePoint {
        self.points[0]
    }

    pub fn last(&self) -> RoutePoint {
        self.points[self.points.len() - 1]
    }

    pub fn elevations(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.ele).collect()
    }

    pub fn point_at(&self, distance_m: f64) -> RoutePoint {
        interpolate_along(&self.points, &self.distances, distance_m)
    }

    /// Rebuild the route with a new elevation per point, keeping positions.
    pub fn with_elevations(&self, elevations: &[f64]) -> Route {
        let points = self
            .points
            .iter()
            .zip(elevations)
            .map(|(p, &ele)| RoutePoint::new(p.lat, p.lon, ele))
            .collect();
        Route {
            points,
            distances: self.distances.clone(),
        }
    }
}

/// Cumulative along-route distance (meters) for each point; starts at 0.
pub fn cumulative_distances(points: &[RoutePoint]) -> Vec<f64> {
    let mut distances = Vec::with_capacity(points.len());
    let mut acc = 0.0;
    for (idx, p) in points.iter().enumerate() {
        if idx > 0 {
            acc += points[idx - 1].distance_to(p);
        }
        distances.push(acc);
    }
    distances
}

/// Point at cumulative distance `target_m`.
///
/// Outside the route's range the first/last point is returned unchanged, so the
/// endpoints are reproduced exactly.
pub fn interpolate_along(points: &[RoutePoint], distances: &[f64], target_m: f64) -> RoutePoint {
    let last = distances.len() - 1;
    if target_m <= 0.0 {
        return points[0];
    }
    if target_m >= distances[last] {
        return points[last];
    }
    let idx = distances.partition_point(|&d| d < target_m).max(1);
    let span = distances[idx] - distances[idx - 1];
    let ratio = if span == 0.0 {
        0.0
    } else {
        (target_m - distances[idx - 1]) / span
    };
    points[idx - 1].lerp(&points[idx], ratio)
}

/// Linear interpolation of a scalar profile parallel to `distances`.
pub fn interpolate_scalar(distances: &[f64], values: &[f64], target_m: f64) -> f64 {
    let last = distances.len() - 1;
    if target_m <= distances[0] {
        return values[0];
    }
    if target_m >= distances[last] {
        return values[last];
    }
    let idx = distances.partition_point(|&d| d < target_m).max(1);
    let (d0, d1) = (distances[idx - 1], distances[idx]);
    if d1 == d0 {
        return values[idx];
    }
    let ratio = (target_m - d0) / (d1 - d0);
    values[idx - 1] + ratio * (values[idx] - values[idx - 1])
}

/// Rebuild the polyline with points roughly every `step_m` meters.
///
/// First and last points are kept exactly. Routes with fewer than two points
/// or zero length are returned as-is.
pub fn resample(points: &[RoutePoint], step_m: f64) -> Vec<RoutePoint> {
    if points.len() < 2 || step_m <= 0.0 {
        return points.to_vec();
    }
    let distances = cumulative_distances(points);
    let total = distances[distances.len() - 1];
    if total == 0.0 {
        return points.to_vec();
    }

    let mut out = vec![points[0]];
    let mut target = step_m;
    let mut idx = 1;
    while target < total && idx < points.len() {
        while idx < points.len() && distances[idx] < target {
            idx += 1;
        }
        if idx >= points.len() {
            break;
        }
        let span = distances[idx] - distances[idx - 1];
        let ratio = if span == 0.0 {
            0.0
        } else {
            (target - distances[idx - 1]) / span
        };
        out.push(points[idx - 1].lerp(&points[idx], ratio));
        target += step_m;
    }
    out.push(points[points.len() - 1]);
    out
}

/// Chaikin corner cutting: each pass replaces every edge with its 1/4 and 3/4
/// points and keeps both endpoints. Fewer than three points pass through.
pub fn chaikin_smooth(points: &[RoutePoint], iterations: usize) -> Vec<RoutePoint> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut current = points.to_vec();
    for _ in 0..iterations {
        let mut next = Vec::with_capacity(current.len() * 2);
        next.push(current[0]);
        for pair in current.windows(2) {
            next.push(pair[0].lerp(&pair[1], 0.25));
            next.push(pair[0].lerp(&pair[1], 0.75));
        }
        next.push(current[current.len() - 1]);
        current = next;
    }
    current
}
