//! Raw tile byte stores sitting between the decoded-tile cache and the upstream.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::tile::TileCoord;

/// Default on-disk budget: 2 GiB.
pub const DEFAULT_CACHE_MAX_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Keyed byte storage for fetched tiles.
///
/// Stores never fail loudly: unreadable entries read as absent and failed
/// writes are dropped, so a broken cache only costs refetches.
pub trait TileStore {
    fn get(&self, tileset: &str, coord: TileCoord, ext: &str) -> Option<Vec<u8>>;
    fn put(&self, tileset: &str, coord: TileCoord, ext: &str, bytes: &[u8]);
}

fn tile_key(tileset: &str, coord: TileCoord, ext: &str) -> String {
    format!("{tileset}/{}/{}/{}.{ext}", coord.z, coord.x, coord.y)
}

/// In-memory store, mainly for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryTileStore {
    tiles: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryTileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.read().is_empty()
    }
}

impl TileStore for MemoryTileStore {
    fn get(&self, tileset: &str, coord: TileCoord, ext: &str) -> Option<Vec<u8>> {
        self.tiles.read().get(&tile_key(tileset, coord, ext)).cloned()
    }

    fn put(&self, tileset: &str, coord: TileCoord, ext: &str, bytes: &[u8]) {
        self.tiles
            .write()
            .insert(tile_key(tileset, coord, ext), bytes.to_vec());
    }
}

/// Directory-backed store laid out as `<root>/<tileset>/<z>/<x>/<y>.<ext>`.
///
/// Reads refresh a file's modification time. The tree size is scanned once on
/// open and tracked on every write; only a write that overflows `max_bytes`
/// walks the tree, evicting the stalest files down to 90% of the budget.
#[derive(Debug)]
pub struct DiskTileStore {
    root: PathBuf,
    max_bytes: u64,
    used_bytes: Mutex<u64>,
}

impl DiskTileStore {
    pub fn open(root: impl Into<PathBuf>, max_bytes: u64) -> Self {
        let root = root.into();
        let used = scan(&root).iter().map(|(_, len, _)| len).sum();
        debug!(root = %root.display(), used, max_bytes, "tile cache opened");
        Self {
            root,
            max_bytes,
            used_bytes: Mutex::new(used),
        }
    }

    /// Bytes currently held under the root, as tracked since open.
    pub fn used_bytes(&self) -> u64 {
        *self.used_bytes.lock()
    }

    fn tile_path(&self, tileset: &str, coord: TileCoord, ext: &str) -> PathBuf {
        self.root
            .join(tileset)
            .join(coord.z.to_string())
            .join(coord.x.to_string())
            .join(format!("{}.{ext}", coord.y))
    }

    /// Deletes files oldest-mtime first down to the low-water mark and returns
    /// the bytes left under the root.
    fn evict(&self) -> u64 {
        let mut entries = scan(&self.root);
        let mut total: u64 = entries.iter().map(|(_, len, _)| len).sum();
        let low_water = self.max_bytes / 10 * 9;

        entries.sort();
        let mut removed = 0;
        for (_, len, path) in entries {
            if total <= low_water {
                break;
            }
            match fs::remove_file(&path) {
                Ok(()) => {
                    total = total.saturating_sub(len);
                    removed += 1;
                }
                Err(err) => debug!("tile cache eviction failed: {path:?} -> {err}"),
            }
        }
        debug!(removed, total, max = self.max_bytes, "tile cache trimmed");
        total
    }
}

fn scan(root: &Path) -> Vec<(SystemTime, u64, PathBuf)> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            let mtime = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            Some((mtime, meta.len(), entry.into_path()))
        })
        .collect()
}

fn touch(path: &Path) -> io::Result<()> {
    fs::File::options()
        .write(true)
        .open(path)?
        .set_modified(SystemTime::now())
}

fn write_tile(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)
}

impl TileStore for DiskTileStore {
    fn get(&self, tileset: &str, coord: TileCoord, ext: &str) -> Option<Vec<u8>> {
        let path = self.tile_path(tileset, coord, ext);
        if !path.is_file() {
            return None;
        }
        match fs::read(&path) {
            Ok(data) => {
                if let Err(err) = touch(&path) {
                    debug!("tile cache touch failed: {path:?} -> {err}");
                }
                Some(data)
            }
            Err(err) => {
                debug!("tile cache read failed: {path:?} -> {err}");
                None
            }
        }
    }

    fn put(&self, tileset: &str, coord: TileCoord, ext: &str, bytes: &[u8]) {
        let path = self.tile_path(tileset, coord, ext);
        let mut used = self.used_bytes.lock();
        let replaced = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        if let Err(err) = write_tile(&path, bytes) {
            debug!("tile cache write failed: {path:?} -> {err}");
            return;
        }
        *used = used.saturating_sub(replaced) + bytes.len() as u64;
        if *used > self.max_bytes {
            *used = self.evict();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizeParseError {
    #[error("missing size value in '{0}'")]
    MissingValue(String),
    #[error("unrecognized size '{0}'; use bytes or KB/MB/GB/TB")]
    Unrecognized(String),
}

/// Parses a byte budget such as `1234`, `512KB`, `1.5GB` (binary multiples).
pub fn parse_size(value: &str) -> Result<u64, SizeParseError> {
    let text = value.trim().to_ascii_lowercase();
    if let Ok(bytes) = text.parse::<u64>() {
        return Ok(bytes);
    }

    const UNITS: [(&str, u64); 4] = [
        ("kb", 1 << 10),
        ("mb", 1 << 20),
        ("gb", 1 << 30),
        ("tb", 1 << 40),
    ];
    for (suffix, multiplier) in UNITS {
        let Some(number) = text.strip_suffix(suffix) else {
            continue;
        };
        let number = number.trim();
        if number.is_empty() {
            return Err(SizeParseError::MissingValue(value.to_string()));
        }
        let amount: f64 = number
            .parse()
            .map_err(|_| SizeParseError::Unrecognized(value.to_string()))?;
        if !amount.is_finite() {
            return Err(SizeParseError::Unrecognized(value.to_string()));
        }
        return Ok((amount.max(0.0) * multiplier as f64) as u64);
    }
    Err(SizeParseError::Unrecognized(value.to_string()))
}
