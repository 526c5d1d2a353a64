use foundation::math::EARTH_RADIUS_M;

/// Edge length of a DEM tile in pixels.
pub const TILE_SIZE: u32 = 256;

pub const MIN_DEM_ZOOM: u8 = 8;
pub const MAX_DEM_ZOOM: u8 = 14;

/// Web-Mercator latitude limit; beyond it tile rows are clamped anyway.
const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Number of tiles along one axis at zoom `z`.
    pub fn tiles_per_axis(z: u8) -> u32 {
        1u32 << z
    }
}

/// A tile plus the pixel inside it, both clamped to valid ranges.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TilePixel {
    pub tile: TileCoord,
    pub px: u32,
    pub py: u32,
}

/// Locates the tile and in-tile pixel covering `(lon, lat)` at `zoom`.
pub fn locate(lon: f64, lat: f64, zoom: u8) -> TilePixel {
    let n = TileCoord::tiles_per_axis(zoom) as f64;
    let lat_rad = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let fx = (lon + 180.0) / 360.0 * n;
    let fy = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0 * n;

    let max_index = TileCoord::tiles_per_axis(zoom) as i64 - 1;
    let tile_x = (fx.floor() as i64).clamp(0, max_index);
    let tile_y = (fy.floor() as i64).clamp(0, max_index);

    let last_pixel = TILE_SIZE as i64 - 1;
    let px = (((fx - tile_x as f64) * TILE_SIZE as f64).floor() as i64).clamp(0, last_pixel);
    let py = (((fy - tile_y as f64) * TILE_SIZE as f64).floor() as i64).clamp(0, last_pixel);

    TilePixel {
        tile: TileCoord::new(zoom, tile_x as u32, tile_y as u32),
        px: px as u32,
        py: py as u32,
    }
}

/// Ground resolution of one tile pixel at `lat` and `zoom`.
pub fn meters_per_pixel(lat: f64, zoom: u8) -> f64 {
    lat.to_radians().cos() * 2.0 * std::f64::consts::PI * EARTH_RADIUS_M
        / (TILE_SIZE as f64 * TileCoord::tiles_per_axis(zoom) as f64)
}

/// Smallest zoom in `[MIN_DEM_ZOOM, MAX_DEM_ZOOM]` whose pixel is no coarser
/// than `target_resolution_m`; the maximum zoom if none qualifies.
pub fn select_zoom(lat: f64, target_resolution_m: f64) -> u8 {
    (MIN_DEM_ZOOM..=MAX_DEM_ZOOM)
        .find(|&z| meters_per_pixel(lat, z) <= target_resolution_m)
        .unwrap_or(MAX_DEM_ZOOM)
}
