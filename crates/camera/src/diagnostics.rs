use std::collections::BTreeMap;

use foundation::math::LatLon;
use terrain::HeightSource;

use crate::visibility::VisibilityOutcome;

/// Height lookups that fell back to recorded route elevation.
pub const TERRAIN_UNAVAILABLE: &str = "terrain.unavailable";
/// `ensure_visible` calls that ran out of altitude budget.
pub const VISIBILITY_UNATTAINABLE: &str = "visibility.unattainable";
/// Times the summit boost was multiplied to keep the summit in view.
pub const SUMMIT_BOOST_ESCALATIONS: &str = "summit.boost_escalations";

/// Deterministic counters for degraded-but-valid synthesis outcomes.
///
/// Counters live in a sorted map so snapshots have stable ordering.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    counters: BTreeMap<String, u64>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn inc_counter(&mut self, name: impl Into<String>, by: u64) {
        *self.counters.entry(name.into()).or_insert(0) += by;
    }

    pub fn is_empty(&self) -> bool {
        self.counters.values().all(|v| *v == 0)
    }

    /// Ground height at `at`, or `fallback` (counted) when terrain is missing.
    pub fn height_or<H: HeightSource + ?Sized>(&mut self, terrain: &H, at: LatLon, fallback: f64) -> f64 {
        terrain.height_at(at.lon, at.lat).value().unwrap_or_else(|| {
            self.inc_counter(TERRAIN_UNAVAILABLE, 1);
            fallback
        })
    }

    /// Counts an unattainable line of sight and returns the altitude to keep.
    pub fn record_visibility(&mut self, outcome: VisibilityOutcome) -> f64 {
        if !outcome.visible {
            self.inc_counter(VISIBILITY_UNATTAINABLE, 1);
        }
        outcome.altitude
    }

    /// Stable, sorted snapshot suitable for logs.
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        self.counters.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}
