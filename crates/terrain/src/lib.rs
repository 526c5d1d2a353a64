//! Ground elevation from tiled RGB-encoded DEM imagery.

pub mod cache;
pub mod codec;
pub mod fetch;
pub mod sampler;
pub mod store;
pub mod tile;

pub use cache::{DEFAULT_TILE_CACHE_CAPACITY, TileCache};
pub use codec::{DemEncoding, EncodingParseError, HeightGrid, TileDecodeError};
#[cfg(feature = "http")]
pub use fetch::HttpTileFetcher;
pub use fetch::{FetchError, NoFetch, TileFetcher, infer_extension, tile_url};
pub use sampler::{HeightSource, NoTerrain, TerrainConfig, TerrainHeight, TerrainSampler};
pub use store::{
    DEFAULT_CACHE_MAX_BYTES, DiskTileStore, MemoryTileStore, SizeParseError, TileStore,
    parse_size,
};
pub use tile::{MAX_DEM_ZOOM, MIN_DEM_ZOOM, TILE_SIZE, TileCoord, TilePixel, locate, select_zoom};
