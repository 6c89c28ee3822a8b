// Resolve configured pins against the live tile index of the current area.

use glam::Vec2;
use std::rc::Rc;

use super::components::TileIndex;
use super::navigation::PathFinder;
use super::pins::{Pin, PinLibrary};

/// Path-grid radius searched for a walkable stand-in when a tile sits on a
/// blocked cell.
pub const SNAP_RADIUS: i32 = 8;

/// One pin resolved to the live tiles it marks this cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PinTileMatch {
    pub pin: Rc<Pin>,
    /// Tile-index key as stored live (casing may differ from `pin.path`).
    pub tile_key: String,
    /// World-grid positions, in tile-index order, snapped onto walkable cells.
    pub tile_positions: Vec<Vec2>,
}

impl PinTileMatch {
    /// More live instances than the user expected.
    pub fn is_over_matched(&self) -> bool {
        self.tile_positions.len() > self.pin.expected_count
    }

    /// Label text, with a `?` appended when over-matched.
    pub fn label(&self) -> String {
        if self.is_over_matched() {
            format!("{}?", self.pin.label)
        } else {
            self.pin.label.clone()
        }
    }
}

/// Match every pin of every group applying to `area_id` against `tiles`.
///
/// Pins with no live tile are left out. Output follows library order
/// (group, then pin).
pub fn match_pins(
    library: &PinLibrary,
    area_id: &str,
    tiles: &TileIndex,
    pathfinder: &dyn PathFinder,
) -> Vec<PinTileMatch> {
    let mut matches = Vec::new();
    for group in library.groups_for(area_id) {
        for pin in &group.pins {
            let Some((key, positions)) = tiles.find_ignore_case(&pin.path) else {
                continue;
            };
            matches.push(PinTileMatch {
                pin: Rc::clone(pin),
                tile_key: key.to_owned(),
                tile_positions: positions
                    .iter()
                    .map(|&p| snap_to_walkable(p, pathfinder))
                    .collect(),
            });
        }
    }
    matches
}

/// Keep `world` if its cell is walkable, otherwise move it to the nearest
/// walkable cell within [`SNAP_RADIUS`]. Falls back to `world` unchanged.
pub fn snap_to_walkable(world: Vec2, pathfinder: &dyn PathFinder) -> Vec2 {
    let cell = pathfinder.world_to_path_grid(world);
    if pathfinder.is_walkable(cell) {
        return world;
    }
    pathfinder
        .find_nearest_walkable(cell, SNAP_RADIUS)
        .map(|c| pathfinder.path_grid_to_world(c))
        .unwrap_or(world)
}
