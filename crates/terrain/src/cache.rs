use std::collections::{HashMap, VecDeque};

use crate::tile::TileCoord;

/// Number of decoded tiles kept in memory by default.
pub const DEFAULT_TILE_CACHE_CAPACITY: usize = 64;

/// Bounded tile map with insertion-order eviction.
///
/// Reads never change eviction order: once more than `capacity` tiles have
/// been inserted, the tile inserted earliest is dropped first.
#[derive(Debug)]
pub struct TileCache<V> {
    capacity: usize,
    order: VecDeque<TileCoord>,
    entries: HashMap<TileCoord, V>,
}

impl<V> TileCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::with_capacity(capacity),
            entries: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, coord: &TileCoord) -> Option<&V> {
        self.entries.get(coord)
    }

    /// Inserts a tile and returns the coordinate evicted to make room, if any.
    /// Replacing an existing tile keeps its original insertion position.
    pub fn insert(&mut self, coord: TileCoord, value: V) -> Option<TileCoord> {
        if self.entries.insert(coord, value).is_some() {
            return None;
        }
        self.order.push_back(coord);

        if self.order.len() > self.capacity {
            let oldest = self.order.pop_front()?;
            self.entries.remove(&oldest);
            return Some(oldest);
        }
        None
    }
}

impl<V> Default for TileCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_CACHE_CAPACITY)
    }
}
