// ECS components and resources describing the live game area.
// The host fills these in every frame; the overlay only reads them.

use bevy_ecs::prelude::*;
use glam::Vec2;

/// Object path of a live entity, e.g. `Metadata/Terrain/Doodads/Altar`.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct ObjectPath(pub String);

/// Position of an entity on the world grid, plus the terrain height under it.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct GridPosition {
    pub position: Vec2,
    pub terrain_height: f32,
}

impl GridPosition {
    pub fn new(position: Vec2, terrain_height: f32) -> Self {
        Self {
            position,
            terrain_height,
        }
    }
}

/// Marks the entity controlled by the local player.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct LocalPlayer;

// ============================================================================
// AREA RESOURCES
// ============================================================================

/// Per-area tile index: object path -> live instance positions (world grid).
///
/// Entries keep insertion order; that order is the enumeration order the
/// matcher preserves.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct TileIndex {
    entries: Vec<(String, Vec<Vec2>)>,
}

impl TileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a position to `key`, creating the entry on first use.
    pub fn insert(&mut self, key: impl Into<String>, position: Vec2) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, positions)) => positions.push(position),
            None => self.entries.push((key, vec![position])),
        }
    }

    /// Exact, case-insensitive key lookup. Returns the stored key too, since
    /// its casing may differ from the query.
    pub fn find_ignore_case(&self, key: &str) -> Option<(&str, &[Vec2])> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Vec2])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<Vec2>)> for TileIndex {
    fn from_iter<I: IntoIterator<Item = (K, Vec<Vec2>)>>(iter: I) -> Self {
        let mut index = TileIndex::new();
        for (key, positions) in iter {
            let key = key.into();
            for p in positions {
                index.insert(key.clone(), p);
            }
        }
        index
    }
}

/// Terrain height per world-grid unit, row-major.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct HeightMap {
    pub heights: Vec<f32>,
    pub width: u32,
    pub height: u32,
}

impl HeightMap {
    /// Flat terrain of the given size.
    pub fn flat(width: u32, height: u32) -> Self {
        Self {
            heights: vec![0.0; (width * height) as usize],
            width,
            height,
        }
    }

    /// Height under a world-grid point. `None` outside the map.
    pub fn sample(&self, at: Vec2) -> Option<f32> {
        if !(at.x >= 0.0 && at.y >= 0.0) {
            return None;
        }
        let (x, y) = (at.x as u32, at.y as u32);
        if x >= self.width || y >= self.height {
            return None;
        }
        self.heights.get((y * self.width + x) as usize).copied()
    }

    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) as usize;
            self.heights[idx] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_index_keeps_insertion_order() {
        let mut index = TileIndex::new();
        index.insert("b", Vec2::new(1.0, 1.0));
        index.insert("a", Vec2::new(2.0, 2.0));
        index.insert("b", Vec2::new(3.0, 3.0));
        let keys: Vec<_> = index.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["b", "a"]);
        assert_eq!(index.find_ignore_case("B").unwrap().1.len(), 2);
    }

    #[test]
    fn lookup_is_exact_not_prefix() {
        let index: TileIndex = [("Metadata/X", vec![Vec2::ZERO])].into_iter().collect();
        assert!(index.find_ignore_case("metadata/x").is_some());
        assert!(index.find_ignore_case("Metadata/X2").is_none());
        assert!(index.find_ignore_case("Metadata").is_none());
    }

    #[test]
    fn height_map_rejects_outside_points() {
        let mut map = HeightMap::flat(4, 4);
        map.set(2, 3, 7.5);
        assert_eq!(map.sample(Vec2::new(2.9, 3.1)), Some(7.5));
        assert_eq!(map.sample(Vec2::new(4.0, 0.0)), None);
        assert_eq!(map.sample(Vec2::new(-0.5, 0.0)), None);
        assert_eq!(map.sample(Vec2::new(f32::NAN, 0.0)), None);
    }
}
