use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{DEFAULT_TILE_CACHE_CAPACITY, TileCache};
use crate::codec::{DemEncoding, HeightGrid};
use crate::fetch::{TileFetcher, infer_extension, tile_url};
use crate::store::TileStore;
use crate::tile::{TileCoord, locate};

/// Result of a terrain lookup.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TerrainHeight {
    Height(f64),
    Unavailable,
}

impl TerrainHeight {
    pub fn value(self) -> Option<f64> {
        match self {
            TerrainHeight::Height(h) => Some(h),
            TerrainHeight::Unavailable => None,
        }
    }

    pub fn value_or(self, fallback: f64) -> f64 {
        self.value().unwrap_or(fallback)
    }

    pub fn is_available(self) -> bool {
        matches!(self, TerrainHeight::Height(_))
    }
}

/// Anything that can answer "how high is the ground here".
pub trait HeightSource {
    fn height_at(&self, lon: f64, lat: f64) -> TerrainHeight;
}

impl<F> HeightSource for F
where
    F: Fn(f64, f64) -> TerrainHeight,
{
    fn height_at(&self, lon: f64, lat: f64) -> TerrainHeight {
        self(lon, lat)
    }
}

/// Source with no terrain at all; every lookup is unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTerrain;

impl HeightSource for NoTerrain {
    fn height_at(&self, _lon: f64, _lat: f64) -> TerrainHeight {
        TerrainHeight::Unavailable
    }
}

#[derive(Debug, Clone)]
pub struct TerrainConfig {
    pub url_template: String,
    pub encoding: DemEncoding,
    pub zoom: u8,
    pub exaggeration: f64,
    /// Directory name tiles are stored under in the byte store.
    pub tileset: String,
}

impl TerrainConfig {
    pub fn new(url_template: impl Into<String>, zoom: u8) -> Self {
        Self {
            url_template: url_template.into(),
            encoding: DemEncoding::default(),
            zoom,
            exaggeration: 1.0,
            tileset: "terrain_rgb".to_string(),
        }
    }

    pub fn with_encoding(mut self, encoding: DemEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_exaggeration(mut self, exaggeration: f64) -> Self {
        self.exaggeration = exaggeration;
        self
    }
}

/// DEM-backed height source.
///
/// Lookup order per tile: decoded-tile cache, byte store, upstream fetch (then
/// written back to the store once it decodes). Any failure along the way yields
/// [`TerrainHeight::Unavailable`] and leaves the tile uncached so a later
/// lookup retries. Concurrent misses on one tile wait for a single loader.
pub struct TerrainSampler {
    config: TerrainConfig,
    extension: String,
    cache: Mutex<TileCache<Arc<HeightGrid>>>,
    /// Per-tile gates held while a tile is being loaded.
    loading: Mutex<HashMap<TileCoord, Arc<Mutex<()>>>>,
    store: Box<dyn TileStore + Send + Sync>,
    fetcher: Box<dyn TileFetcher + Send + Sync>,
}

impl TerrainSampler {
    pub fn new(
        config: TerrainConfig,
        store: impl TileStore + Send + Sync + 'static,
        fetcher: impl TileFetcher + Send + Sync + 'static,
    ) -> Self {
        let extension = infer_extension(&config.url_template);
        Self {
            config,
            extension,
            cache: Mutex::new(TileCache::new(DEFAULT_TILE_CACHE_CAPACITY)),
            loading: Mutex::new(HashMap::new()),
            store: Box::new(store),
            fetcher: Box::new(fetcher),
        }
    }

    pub fn cached_tiles(&self) -> usize {
        self.cache.lock().len()
    }

    fn cached(&self, coord: TileCoord) -> Option<Arc<HeightGrid>> {
        self.cache.lock().get(&coord).map(Arc::clone)
    }

    fn load_tile(&self, coord: TileCoord) -> Option<Arc<HeightGrid>> {
        if let Some(grid) = self.cached(coord) {
            return Some(grid);
        }

        let gate = Arc::clone(self.loading.lock().entry(coord).or_default());
        let grid = {
            let _loading = gate.lock();
            // Whoever held the gate before us may have filled the cache.
            match self.cached(coord) {
                Some(grid) => Some(grid),
                None => self.load_uncached(coord),
            }
        };

        let mut loading = self.loading.lock();
        if loading.get(&coord).is_some_and(|g| Arc::ptr_eq(g, &gate)) {
            loading.remove(&coord);
        }
        grid
    }

    fn load_uncached(&self, coord: TileCoord) -> Option<Arc<HeightGrid>> {
        let tileset = self.config.tileset.as_str();
        let stored = self
            .store
            .get(tileset, coord, &self.extension)
            .and_then(|bytes| self.decode(coord, &bytes));

        let grid = match stored {
            Some(grid) => grid,
            None => {
                let url = tile_url(&self.config.url_template, coord);
                let bytes = match self.fetcher.fetch(&url) {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        debug!("terrain tile fetch failed: {err}");
                        return None;
                    }
                };
                let grid = self.decode(coord, &bytes)?;
                self.store.put(tileset, coord, &self.extension, &bytes);
                grid
            }
        };

        let grid = Arc::new(grid);
        if let Some(evicted) = self.cache.lock().insert(coord, Arc::clone(&grid)) {
            debug!(z = evicted.z, x = evicted.x, y = evicted.y, "terrain tile evicted");
        }
        Some(grid)
    }

    fn decode(&self, coord: TileCoord, bytes: &[u8]) -> Option<HeightGrid> {
        HeightGrid::from_image_bytes(bytes, self.config.encoding)
            .map_err(|err| debug!(z = coord.z, x = coord.x, y = coord.y, "{err}: {}", err.0))
            .ok()
    }
}

impl HeightSource for TerrainSampler {
    fn height_at(&self, lon: f64, lat: f64) -> TerrainHeight {
        let pixel = locate(lon, lat, self.config.zoom);
        self.load_tile(pixel.tile)
            .and_then(|grid| grid.sample(pixel.px, pixel.py))
            .map_or(TerrainHeight::Unavailable, |h| {
                TerrainHeight::Height(h * self.config.exaggeration)
            })
    }
}

impl std::fmt::Debug for TerrainSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerrainSampler")
            .field("config", &self.config)
            .field("extension", &self.extension)
            .field("cached_tiles", &self.cached_tiles())
            .finish_non_exhaustive()
    }
}
