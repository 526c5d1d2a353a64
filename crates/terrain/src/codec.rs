//! RGB-encoded DEM tiles: height codecs and decoded height grids.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::tile::TILE_SIZE;

/// How a DEM tile packs elevation into RGB channels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DemEncoding {
    /// `height = -10000 + (R*65536 + G*256 + B) * 0.1`
    #[default]
    Mapbox,
    /// `height = (R*256 + G + B/256) - 32768`
    Terrarium,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown terrain encoding '{0}' (expected 'mapbox' or 'terrarium')")]
pub struct EncodingParseError(pub String);

impl FromStr for DemEncoding {
    type Err = EncodingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mapbox" => Ok(DemEncoding::Mapbox),
            "terrarium" => Ok(DemEncoding::Terrarium),
            _ => Err(EncodingParseError(s.to_string())),
        }
    }
}

impl fmt::Display for DemEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemEncoding::Mapbox => write!(f, "mapbox"),
            DemEncoding::Terrarium => write!(f, "terrarium"),
        }
    }
}

impl DemEncoding {
    pub fn decode(self, r: u8, g: u8, b: u8) -> f64 {
        let (r, g, b) = (r as f64, g as f64, b as f64);
        match self {
            DemEncoding::Mapbox => -10_000.0 + (r * 65_536.0 + g * 256.0 + b) * 0.1,
            DemEncoding::Terrarium => (r * 256.0 + g + b / 256.0) - 32_768.0,
        }
    }

    /// Nearest RGB triple for `height`, saturating at the codec's range.
    pub fn encode(self, height: f64) -> [u8; 3] {
        match self {
            DemEncoding::Mapbox => {
                let v = ((height + 10_000.0) * 10.0).round().clamp(0.0, 16_777_215.0) as u32;
                [(v >> 16) as u8, (v >> 8) as u8, v as u8]
            }
            DemEncoding::Terrarium => {
                let v = (height + 32_768.0).clamp(0.0, 65_535.0 + 255.0 / 256.0);
                let whole = v.floor();
                let b = ((v - whole) * 256.0).round().min(255.0) as u8;
                let whole = whole as u32;
                [(whole >> 8) as u8, whole as u8, b]
            }
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to decode terrain tile image")]
pub struct TileDecodeError(#[from] pub image::ImageError);

/// Decoded heights of a single tile, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightGrid {
    width: u32,
    height: u32,
    heights: Vec<f32>,
}

impl HeightGrid {
    /// Decodes PNG/WebP/JPEG tile bytes; any colour type is converted to RGB8 first.
    pub fn from_image_bytes(bytes: &[u8], encoding: DemEncoding) -> Result<Self, TileDecodeError> {
        let rgb = image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        let heights = rgb
            .pixels()
            .map(|p| encoding.decode(p[0], p[1], p[2]) as f32)
            .collect();
        Ok(Self {
            width,
            height,
            heights,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Height at a pixel in nominal 256-pixel tile space. Images of another
    /// size are addressed proportionally.
    pub fn sample(&self, px: u32, py: u32) -> Option<f64> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let x = (px as u64 * self.width as u64 / TILE_SIZE as u64).min(self.width as u64 - 1);
        let y = (py as u64 * self.height as u64 / TILE_SIZE as u64).min(self.height as u64 - 1);
        self.heights
            .get((y * self.width as u64 + x) as usize)
            .map(|h| *h as f64)
    }
}
