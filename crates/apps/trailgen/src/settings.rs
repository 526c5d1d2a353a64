use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use terrain::{
    DEFAULT_CACHE_MAX_BYTES, DemEncoding, MAX_DEM_ZOOM, MIN_DEM_ZOOM, parse_size, select_zoom,
};

/// Ground resolution the DEM zoom is chosen for, before the bias.
const TARGET_DEM_RESOLUTION_M: f64 = 30.0;
const DEFAULT_DEM_ZOOM_BIAS: i32 = -2;

/// Terrain settings after merging flags over the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainSettings {
    pub url_template: Option<String>,
    pub encoding: DemEncoding,
    pub exaggeration: f64,
    pub cache_dir: PathBuf,
    pub cache_max_bytes: u64,
    pub zoom_bias: i32,
}

/// Terrain flags; any `None` falls back to its `TRAILGEN_*` variable.
#[derive(Debug, Clone, Default)]
pub struct TerrainOverrides {
    pub tiles: Option<String>,
    pub encoding: Option<String>,
    pub exaggeration: Option<f64>,
    pub cache_dir: Option<PathBuf>,
    pub cache_max: Option<String>,
    pub zoom_bias: Option<i32>,
}

impl TerrainSettings {
    pub fn resolve(flags: TerrainOverrides) -> Result<Self> {
        Self::resolve_with(flags, |key| env::var(key).ok())
    }

    pub fn resolve_with(flags: TerrainOverrides, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let url_template = flags
            .tiles
            .or_else(|| var("TRAILGEN_TERRAIN_TILES"))
            .filter(|t| !t.trim().is_empty());

        let encoding = match flags.encoding.or_else(|| var("TRAILGEN_TERRAIN_ENCODING")) {
            Some(raw) => raw.parse::<DemEncoding>().context("invalid terrain encoding")?,
            None => DemEncoding::default(),
        };

        let exaggeration = flags
            .exaggeration
            .unwrap_or_else(|| parse_or(var("TRAILGEN_TERRAIN_EXAGGERATION"), 1.0));

        let cache_dir = flags
            .cache_dir
            .or_else(|| var("TRAILGEN_CACHE_DIR").map(PathBuf::from))
            .unwrap_or_else(|| default_cache_dir(var("HOME")));

        let cache_max_bytes = match flags.cache_max.or_else(|| var("TRAILGEN_CACHE_MAX")) {
            Some(raw) => parse_size(&raw).with_context(|| format!("invalid cache size {raw:?}"))?,
            None => DEFAULT_CACHE_MAX_BYTES,
        };

        let zoom_bias = flags
            .zoom_bias
            .unwrap_or_else(|| parse_or(var("TRAILGEN_DEM_ZOOM_BIAS"), DEFAULT_DEM_ZOOM_BIAS));

        Ok(Self {
            url_template,
            encoding,
            exaggeration,
            cache_dir,
            cache_max_bytes,
            zoom_bias,
        })
    }

    /// DEM zoom for a route centred at `lat`.
    pub fn dem_zoom(&self, lat: f64) -> u8 {
        let base = select_zoom(lat, TARGET_DEM_RESOLUTION_M) as i32;
        (base + self.zoom_bias).clamp(MIN_DEM_ZOOM as i32, MAX_DEM_ZOOM as i32) as u8
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn default_cache_dir(home: Option<String>) -> PathBuf {
    home.map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".trailgen")
        .join("cache")
}
