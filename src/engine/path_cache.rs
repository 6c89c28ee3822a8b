// Pathfinder priming and per-frame player-cell tracking.
//
// Path geometry itself is not cached: the presenter asks the pathfinder for
// fresh paths every frame. What lives here is the priming pass run after a
// snapshot swap, the player's last path-grid cell, and a staging buffer for
// ready paths that is cleared whenever the player stays in the same cell.
// Nothing fills that buffer yet.

use glam::{IVec2, Vec2};
use std::collections::HashMap;

use super::navigation::PathFinder;
use super::tile_matcher::PinTileMatch;

#[derive(Debug, Default)]
pub struct PathCache {
    last_player_cell: Option<IVec2>,
    /// Ready paths keyed by tile key.
    staged: HashMap<String, Vec<Vec2>>,
    primed: usize,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prime the pathfinder towards the tile closest to the player for every
    /// enabled match. Returns how many primes were issued.
    pub fn prime(
        &mut self,
        matches: &[PinTileMatch],
        player: Vec2,
        pathfinder: &mut dyn PathFinder,
    ) -> usize {
        let player_cell = pathfinder.world_to_path_grid(player);
        let mut issued = 0;
        for entry in matches.iter().filter(|m| m.pin.enabled) {
            let Some(target) = closest_to(&entry.tile_positions, player) else {
                continue;
            };
            let target_cell = pathfinder.world_to_path_grid(target);
            pathfinder.prime(player_cell, target_cell);
            issued += 1;
        }
        self.primed += issued;
        issued
    }

    /// Record the player's cell for this frame. When it is the same as last
    /// frame the staging buffer is cleared; returns true in that case.
    pub fn observe_player_cell(&mut self, cell: IVec2) -> bool {
        let unchanged = self.last_player_cell == Some(cell);
        if unchanged {
            self.staged.clear();
        }
        self.last_player_cell = Some(cell);
        unchanged
    }

    pub fn last_player_cell(&self) -> Option<IVec2> {
        self.last_player_cell
    }

    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Total primes issued since the last reset.
    pub fn primed_total(&self) -> usize {
        self.primed
    }

    /// Forget everything, e.g. when the area (and its grid) changes.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Position in `positions` with the smallest Euclidean distance to `to`.
/// Ties keep the earliest.
pub fn closest_to(positions: &[Vec2], to: Vec2) -> Option<Vec2> {
    positions
        .iter()
        .copied()
        .min_by(|a, b| a.distance_squared(to).total_cmp(&b.distance_squared(to)))
}

/// `positions` sorted nearest-first relative to `to` (stable).
pub fn sorted_by_distance(positions: &[Vec2], to: Vec2) -> Vec<Vec2> {
    let mut sorted = positions.to_vec();
    sorted.sort_by(|a, b| a.distance_squared(to).total_cmp(&b.distance_squared(to)));
    sorted
}
