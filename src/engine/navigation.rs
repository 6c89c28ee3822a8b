// Walkability grid and the pathfinder capability the overlay consumes.
//
// Layer 1: `PathFinder`, what the overlay needs from a grid pathfinder:
//          world-grid <-> path-grid conversion, walkability, nearest walkable
//          cell, point-to-point paths, and a priming hook.
// Layer 2: `NavGrid`, a plain walkability grid implementing it with a BFS
//          integration field and steepest-descent path extraction.
//
// The overlay only talks to the trait, so matching and caching logic can be
// exercised against any grid, including hand-built ones in tests.

use glam::{IVec2, UVec2, Vec2};
use std::collections::VecDeque;

use super::error::PathError;

// ============================================================================
// PATHFINDER CAPABILITY
// ============================================================================

pub trait PathFinder {
    /// World-grid units per path-grid cell.
    fn grid_size(&self) -> f32;

    /// Path-grid size in cells.
    fn dimensions(&self) -> UVec2;

    fn is_walkable(&self, cell: IVec2) -> bool;

    /// Closest walkable cell to `cell` within `radius` cells (Euclidean),
    /// `cell` itself included.
    fn find_nearest_walkable(&self, cell: IVec2, radius: i32) -> Option<IVec2>;

    /// Path-grid polyline from `from` to `to`, both ends included.
    fn find_path(&self, from: IVec2, to: IVec2) -> Result<Vec<IVec2>, PathError>;

    /// Warm internal structures for a later `find_path(from, to)`.
    /// Failures are swallowed; the result is never observed.
    fn prime(&mut self, from: IVec2, to: IVec2);

    /// World-grid point -> path-grid cell (floored).
    fn world_to_path_grid(&self, world: Vec2) -> IVec2 {
        (world / self.grid_size()).floor().as_ivec2()
    }

    /// Path-grid cell -> world-grid point at the cell's origin corner.
    fn path_grid_to_world(&self, cell: IVec2) -> Vec2 {
        cell.as_vec2() * self.grid_size()
    }

    fn path_to_world(&self, path: &[IVec2]) -> Vec<Vec2> {
        path.iter().map(|&c| self.path_grid_to_world(c)).collect()
    }

    fn contains(&self, cell: IVec2) -> bool {
        let dims = self.dimensions().as_ivec2();
        cell.x >= 0 && cell.y >= 0 && cell.x < dims.x && cell.y < dims.y
    }
}

// ============================================================================
// NAVIGATION GRID
// ============================================================================

/// Static tile walkability for one area.
pub struct NavGrid {
    /// True if the player can walk through this cell.
    walkable: Vec<bool>,
    width: u32,
    height: u32,
    grid_size: u32,
    /// Max BFS expansions per `find_path` before giving up.
    max_expansions: u32,
    /// Integration field left behind by the last `prime`.
    primed: Option<IntegrationField>,
}

impl NavGrid {
    /// Fully open grid, all cells walkable.
    pub fn new_open(width: u32, height: u32, grid_size: u32) -> Self {
        Self::from_walkable(width, height, grid_size, vec![true; (width * height) as usize])
    }

    /// Grid from a row-major walkability mask. Short masks are padded with
    /// blocked cells. `grid_size` is clamped to at least 1.
    pub fn from_walkable(width: u32, height: u32, grid_size: u32, mut walkable: Vec<bool>) -> Self {
        walkable.resize((width * height) as usize, false);
        Self {
            walkable,
            width,
            height,
            grid_size: grid_size.max(1),
            max_expansions: width.saturating_mul(height),
            primed: None,
        }
    }

    /// Bound the work a single `find_path` may do.
    pub fn with_search_budget(mut self, max_expansions: u32) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    pub fn set_walkable(&mut self, cell: IVec2, walkable: bool) {
        if let Some(idx) = self.idx(cell) {
            self.walkable[idx] = walkable;
            self.primed = None;
        }
    }

    pub fn walkable_count(&self) -> usize {
        self.walkable.iter().filter(|&&w| w).count()
    }

    /// Goal of the currently primed field, if any.
    pub fn primed_goal(&self) -> Option<IVec2> {
        self.primed.as_ref().map(|f| f.goal)
    }

    #[inline]
    fn idx(&self, cell: IVec2) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 || cell.x >= self.width as i32 || cell.y >= self.height as i32 {
            return None;
        }
        Some((cell.y as u32 * self.width + cell.x as u32) as usize)
    }

    fn check_endpoints(&self, from: IVec2, to: IVec2) -> Result<(), PathError> {
        if self.idx(from).is_none() {
            return Err(PathError::OutOfBounds(from));
        }
        match self.idx(to) {
            None => Err(PathError::OutOfBounds(to)),
            Some(i) if !self.walkable[i] => Err(PathError::Blocked(to)),
            Some(_) => Ok(()),
        }
    }
}

impl PathFinder for NavGrid {
    fn grid_size(&self) -> f32 {
        self.grid_size as f32
    }

    fn dimensions(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    fn is_walkable(&self, cell: IVec2) -> bool {
        self.idx(cell).is_some_and(|i| self.walkable[i])
    }

    fn find_nearest_walkable(&self, cell: IVec2, radius: i32) -> Option<IVec2> {
        if radius < 0 {
            return None;
        }
        let limit = radius * radius;
        let mut best: Option<(i32, IVec2)> = None;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let d2 = dx * dx + dy * dy;
                if d2 > limit || best.is_some_and(|(b, _)| d2 >= b) {
                    continue;
                }
                let candidate = cell + IVec2::new(dx, dy);
                if self.is_walkable(candidate) {
                    best = Some((d2, candidate));
                }
            }
        }
        best.map(|(_, c)| c)
    }

    fn find_path(&self, from: IVec2, to: IVec2) -> Result<Vec<IVec2>, PathError> {
        self.check_endpoints(from, to)?;

        if let Some(field) = self.primed.as_ref().filter(|f| f.goal == to) {
            if let Some(path) = field.descend(self, from) {
                return Ok(path);
            }
        }

        let field = IntegrationField::build(self, to, from, Some(from), self.max_expansions)?;
        field
            .descend(self, from)
            .ok_or(PathError::Unreachable { from, to })
    }

    fn prime(&mut self, from: IVec2, to: IVec2) {
        if self.check_endpoints(from, to).is_err() {
            return;
        }
        match IntegrationField::build(self, to, from, None, u32::MAX) {
            Ok(field) => self.primed = Some(field),
            Err(e) => log::trace!("priming towards {to} skipped: {e}"),
        }
    }
}

// ============================================================================
// INTEGRATION FIELD
// ============================================================================

/// BFS step-distance from every reached cell to a single goal.
struct IntegrationField {
    /// `u32::MAX` = not reached.
    integration: Vec<u32>,
    goal: IVec2,
    /// Cell allowed through even if blocked (the player's own cell).
    passable: IVec2,
}

impl IntegrationField {
    /// BFS (4-connected) outward from `goal`. Stops early once `stop_at` is
    /// reached; errors once more than `budget` cells were expanded.
    fn build(
        grid: &NavGrid,
        goal: IVec2,
        passable: IVec2,
        stop_at: Option<IVec2>,
        budget: u32,
    ) -> Result<Self, PathError> {
        let mut integration = vec![u32::MAX; grid.walkable.len()];
        let mut queue = VecDeque::new();
        let mut expansions = 0u32;

        let goal_idx = grid.idx(goal).ok_or(PathError::OutOfBounds(goal))?;
        integration[goal_idx] = 0;
        queue.push_back(goal);

        while let Some(pos) = queue.pop_front() {
            if stop_at == Some(pos) {
                break;
            }
            expansions += 1;
            if expansions > budget {
                return Err(PathError::SearchBudgetExceeded(budget));
            }
            let Some(pi) = grid.idx(pos) else { continue };
            let pos_cost = integration[pi];
            for nb in cardinal_neighbors(pos) {
                let Some(ni) = grid.idx(nb) else { continue };
                let enterable = grid.walkable[ni] || nb == passable;
                if enterable && integration[ni] == u32::MAX {
                    integration[ni] = pos_cost + 1;
                    queue.push_back(nb);
                }
            }
        }

        Ok(Self {
            integration,
            goal,
            passable,
        })
    }

    fn cost(&self, grid: &NavGrid, cell: IVec2) -> u32 {
        grid.idx(cell)
            .map(|i| self.integration[i])
            .unwrap_or(u32::MAX)
    }

    fn enterable(&self, grid: &NavGrid, cell: IVec2) -> bool {
        grid.is_walkable(cell) || cell == self.passable
    }

    /// Walk downhill from `start` to the goal. Diagonal steps are taken only
    /// when both orthogonal cells beside them are walkable.
    fn descend(&self, grid: &NavGrid, start: IVec2) -> Option<Vec<IVec2>> {
        if self.cost(grid, start) == u32::MAX {
            return None;
        }
        let mut path = vec![start];
        let mut pos = start;
        while pos != self.goal {
            let cost = self.cost(grid, pos);
            let mut best: Option<(u32, IVec2)> = None;
            for nb in all_neighbors(pos) {
                let nb_cost = self.cost(grid, nb);
                if nb_cost >= cost || best.is_some_and(|(b, _)| nb_cost >= b) {
                    continue;
                }
                let step = nb - pos;
                if step.x != 0 && step.y != 0 {
                    let side_a = IVec2::new(pos.x + step.x, pos.y);
                    let side_b = IVec2::new(pos.x, pos.y + step.y);
                    if !self.enterable(grid, side_a) || !self.enterable(grid, side_b) {
                        continue;
                    }
                }
                best = Some((nb_cost, nb));
            }
            // A reached cell always has an orthogonal parent one step closer.
            pos = best?.1;
            path.push(pos);
        }
        Some(path)
    }
}

// ============================================================================
// NEIGHBOR ITERATORS
// ============================================================================

/// The four cardinal (N/S/E/W) neighbors of a cell. Bounds are checked by the caller.
fn cardinal_neighbors(pos: IVec2) -> impl Iterator<Item = IVec2> {
    [IVec2::NEG_X, IVec2::X, IVec2::NEG_Y, IVec2::Y]
        .into_iter()
        .map(move |d| pos + d)
}

/// All eight (cardinal + diagonal) neighbors.
fn all_neighbors(pos: IVec2) -> impl Iterator<Item = IVec2> {
    [
        (-1, -1), (0, -1), (1, -1),
        (-1,  0),          (1,  0),
        (-1,  1), (0,  1), (1,  1),
    ]
    .into_iter()
    .map(move |(dx, dy)| pos + IVec2::new(dx, dy))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Grid from ASCII rows: `#` blocked, anything else walkable.
    fn grid(rows: &[&str], grid_size: u32) -> NavGrid {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let mask = rows
            .iter()
            .flat_map(|r| r.chars().map(|c| c != '#'))
            .collect();
        NavGrid::from_walkable(width, height, grid_size, mask)
    }

    #[test]
    fn conversions_floor_by_grid_size() {
        let g = NavGrid::new_open(10, 10, 23);
        assert_eq!(g.world_to_path_grid(Vec2::new(46.0, 22.9)), IVec2::new(2, 0));
        assert_eq!(g.world_to_path_grid(Vec2::new(-1.0, 0.0)), IVec2::new(-1, 0));
        assert_eq!(g.path_grid_to_world(IVec2::new(3, 4)), Vec2::new(69.0, 92.0));
    }

    #[test]
    fn nearest_walkable_prefers_the_cell_itself() {
        let g = NavGrid::new_open(5, 5, 1);
        assert_eq!(g.find_nearest_walkable(IVec2::new(2, 2), 8), Some(IVec2::new(2, 2)));
    }

    #[test]
    fn nearest_walkable_finds_closest_open_cell() {
        let g = grid(
            &[
                "#######",
                "#######",
                "#######",
                "###.###",
                "#######",
                "#######",
                "......#",
            ],
            1,
        );
        // The lone open cell is one diagonal away; the open row is four rows down.
        assert_eq!(g.find_nearest_walkable(IVec2::new(2, 2), 8), Some(IVec2::new(3, 3)));
        assert_eq!(g.find_nearest_walkable(IVec2::new(0, 0), 1), None);
    }

    #[test]
    fn nearest_walkable_respects_radius() {
        let mut g = grid(&["##########"], 1);
        g.set_walkable(IVec2::new(9, 0), true);
        assert_eq!(g.find_nearest_walkable(IVec2::new(0, 0), 8), None);
        assert_eq!(g.find_nearest_walkable(IVec2::new(1, 0), 8), Some(IVec2::new(9, 0)));
        assert_eq!(g.find_nearest_walkable(IVec2::new(0, 0), -1), None);
    }

    #[test]
    fn path_goes_around_walls() {
        let g = grid(
            &[
                ".....",
                ".###.",
                ".#...",
                ".#.#.",
                "...#.",
            ],
            1,
        );
        let path = g.find_path(IVec2::new(2, 2), IVec2::new(0, 0)).unwrap();
        assert_eq!(path.first(), Some(&IVec2::new(2, 2)));
        assert_eq!(path.last(), Some(&IVec2::new(0, 0)));
        for pair in path.windows(2) {
            let step = (pair[1] - pair[0]).abs();
            assert!(step.x <= 1 && step.y <= 1);
            assert!(g.is_walkable(pair[1]));
        }
    }

    #[test]
    fn diagonal_steps_never_cut_corners() {
        let g = grid(&[".#", ".."], 1);
        let path = g.find_path(IVec2::new(0, 0), IVec2::new(1, 1)).unwrap();
        assert_eq!(path, vec![IVec2::new(0, 0), IVec2::new(0, 1), IVec2::new(1, 1)]);
    }

    #[test]
    fn unreachable_and_blocked_goals_fail() {
        let g = grid(&["..#..", "..#..", "..#.."], 1);
        assert_eq!(
            g.find_path(IVec2::new(0, 0), IVec2::new(4, 0)),
            Err(PathError::Unreachable {
                from: IVec2::new(0, 0),
                to: IVec2::new(4, 0)
            })
        );
        assert_eq!(
            g.find_path(IVec2::new(0, 0), IVec2::new(2, 1)),
            Err(PathError::Blocked(IVec2::new(2, 1)))
        );
        assert_eq!(
            g.find_path(IVec2::new(-1, 0), IVec2::new(1, 1)),
            Err(PathError::OutOfBounds(IVec2::new(-1, 0)))
        );
    }

    #[test]
    fn blocked_start_can_still_leave() {
        let g = grid(&["#..", "..."], 1);
        let path = g.find_path(IVec2::new(0, 0), IVec2::new(2, 1)).unwrap();
        assert_eq!(path.first(), Some(&IVec2::new(0, 0)));
        assert_eq!(path.last(), Some(&IVec2::new(2, 1)));
    }

    #[test]
    fn search_budget_fails_fast() {
        let g = NavGrid::new_open(50, 50, 1).with_search_budget(10);
        assert_eq!(
            g.find_path(IVec2::new(49, 49), IVec2::new(0, 0)),
            Err(PathError::SearchBudgetExceeded(10))
        );
    }

    #[test]
    fn priming_caches_the_goal_field() {
        let mut g = NavGrid::new_open(20, 20, 1).with_search_budget(5);
        g.prime(IVec2::new(19, 19), IVec2::new(0, 0));
        assert_eq!(g.primed_goal(), Some(IVec2::new(0, 0)));
        // The primed field is complete, so the tight budget no longer matters.
        let path = g.find_path(IVec2::new(19, 19), IVec2::new(0, 0)).unwrap();
        assert_eq!(path.len(), 20);

        g.set_walkable(IVec2::new(5, 5), false);
        assert_eq!(g.primed_goal(), None);
    }

    #[test]
    fn start_equal_to_goal_is_a_single_cell() {
        let g = NavGrid::new_open(3, 3, 1);
        assert_eq!(g.find_path(IVec2::ONE, IVec2::ONE).unwrap(), vec![IVec2::ONE]);
    }
}
