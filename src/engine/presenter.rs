// Draws pin labels, pin paths, the walkable-grid debug layer and the tile
// browser onto one surface through one projector.
//
// Everything is positioned relative to the player: a world-grid point becomes
// (point - player) plus the terrain height difference, then goes through the
// surface's oblique projector.

use egui::Color32;
use glam::Vec2;

use super::components::TileIndex;
use super::draw::DrawSurface;
use super::navigation::PathFinder;
use super::path_cache::sorted_by_distance;
use super::pins::Pin;
use super::projection::Projector;
use super::settings::PinSettings;
use super::source::{EntitySource, PlayerState};
use super::tile_matcher::PinTileMatch;

/// Targets closer than this (world-grid units) get no path.
pub const PATH_MIN_DISTANCE: f32 = 80.0;

/// Path colors used when `override_color_paths` is on, cycled by match index.
pub const PATH_PALETTE: [Color32; 9] = [
    Color32::from_rgb(253, 224, 71), // yellow
    Color32::from_rgb(16, 185, 129), // green
    Color32::from_rgb(96, 165, 250), // blue
    Color32::from_rgb(236, 72, 153), // pink
    Color32::from_rgb(249, 115, 22), // orange
    Color32::from_rgb(139, 92, 246), // purple
    Color32::from_rgb(34, 197, 94),  // emerald
    Color32::from_rgb(14, 165, 233), // sky
    Color32::from_rgb(234, 179, 8),  // amber
];

pub const WALKABLE_CELL: Color32 = Color32::from_rgb(50, 205, 50);
pub const BLOCKED_CELL: Color32 = Color32::from_rgb(255, 0, 0);

const TILE_TEXT: Color32 = Color32::from_rgb(100, 116, 139);
const TILE_BORDER: Color32 = Color32::from_rgb(71, 85, 105);

/// Per-frame inputs shared by every draw call.
pub struct FrameContext<'a> {
    pub player: PlayerState,
    pub source: &'a dyn EntitySource,
    pub settings: &'a PinSettings,
}

impl FrameContext<'_> {
    /// Terrain height of `at` relative to the player; 0 when unknown or
    /// when terrain height is ignored.
    pub fn height_delta(&self, at: Vec2) -> f32 {
        if self.settings.ignore_terrain_height {
            return 0.0;
        }
        self.source
            .terrain_height(at)
            .map(|h| h - self.player.terrain_height)
            .unwrap_or(0.0)
    }

    /// Screen position of a world-grid point.
    pub fn project(&self, projector: &Projector, at: Vec2) -> Vec2 {
        projector.project(at - self.player.grid_position, self.height_delta(at))
    }
}

// ============================================================================
// LABELS
// ============================================================================

/// Box of `size` centered on `center`, half extents rounded to whole pixels.
pub fn centered_rect(center: Vec2, size: Vec2) -> (Vec2, Vec2) {
    let half = (size / 2.0).round();
    (center - half, center + half)
}

/// Filled, bordered text box centered on `center`.
pub fn draw_label(
    surface: &mut dyn DrawSurface,
    center: Vec2,
    text: &str,
    text_color: Color32,
    background: Color32,
    border: Color32,
) {
    let (min, max) = centered_rect(center, surface.text_size(text));
    let pad = Vec2::ONE;
    surface.rect_filled(min - pad, max + pad, background);
    surface.rect_stroke(min - pad, max + pad, border, 1.0);
    surface.text(min, text, text_color);
}

/// Label every resolved position of every enabled match. Returns the number
/// of labels drawn.
pub fn draw_pin_labels(
    surface: &mut dyn DrawSurface,
    projector: &Projector,
    matches: &[PinTileMatch],
    frame: &FrameContext<'_>,
) -> usize {
    let mut drawn = 0;
    for entry in matches.iter().filter(|m| m.pin.enabled) {
        let text = entry.label();
        for &position in &entry.tile_positions {
            let screen = frame.project(projector, position);
            draw_label(
                surface,
                screen,
                &text,
                entry.pin.text_color,
                entry.pin.bg_color,
                Color32::BLACK,
            );
            drawn += 1;
        }
    }
    drawn
}

// ============================================================================
// PATHS
// ============================================================================

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PathStats {
    pub requested: usize,
    pub drawn: usize,
    pub failed: usize,
}

/// Color for the path of the match at `index`.
pub fn path_color(index: usize, pin: &Pin, override_colors: bool) -> Color32 {
    if override_colors {
        PATH_PALETTE[index % PATH_PALETTE.len()]
    } else {
        pin.text_color
    }
}

/// Request and draw a path from the player to each of the nearest
/// `expected_count` tiles of every enabled, not over-matched match.
///
/// A failed or empty path draws nothing for that target; the loop moves on.
pub fn draw_pin_paths(
    surface: &mut dyn DrawSurface,
    projector: &Projector,
    matches: &[PinTileMatch],
    pathfinder: &dyn PathFinder,
    frame: &FrameContext<'_>,
) -> PathStats {
    let mut stats = PathStats::default();
    let player = frame.player.grid_position;
    let player_cell = pathfinder.world_to_path_grid(player);

    for (index, entry) in matches.iter().enumerate() {
        if !entry.pin.enabled || entry.tile_positions.is_empty() || entry.is_over_matched() {
            continue;
        }
        let color = path_color(index, &entry.pin, frame.settings.override_color_paths);

        let targets = sorted_by_distance(&entry.tile_positions, player);
        for target in targets.into_iter().take(entry.pin.expected_count) {
            if target.distance(player) < PATH_MIN_DISTANCE {
                continue;
            }
            let target_cell = pathfinder.world_to_path_grid(target);
            stats.requested += 1;
            let path = match pathfinder.find_path(player_cell, target_cell) {
                Ok(path) if path.len() >= 2 => path,
                Ok(_) => {
                    stats.failed += 1;
                    continue;
                }
                Err(e) => {
                    log::trace!("no path to {} ({}): {e}", entry.pin.label, entry.tile_key);
                    stats.failed += 1;
                    continue;
                }
            };
            let world_path = pathfinder.path_to_world(&path);
            draw_world_path(surface, projector, &world_path, frame, color);
            stats.drawn += 1;
        }
    }
    stats
}

/// Polyline starting at the player's exact position and continuing through
/// `path[1..]`. The first path point is the player's own cell and is skipped.
fn draw_world_path(
    surface: &mut dyn DrawSurface,
    projector: &Projector,
    path: &[Vec2],
    frame: &FrameContext<'_>,
    color: Color32,
) {
    let thickness = frame.settings.path_thickness;
    let mut from = projector.project(Vec2::ZERO, 0.0);
    for &point in path.iter().skip(1) {
        let to = frame.project(projector, point);
        surface.line(from, to, color, thickness);
        from = to;
    }
}

// ============================================================================
// DEBUG GRID
// ============================================================================

/// Marker per path-grid cell within `radius` of the player: green when
/// walkable, red when blocked. Returns the walkable count.
pub fn draw_walkable_grid(
    surface: &mut dyn DrawSurface,
    projector: &Projector,
    pathfinder: &dyn PathFinder,
    player: Vec2,
    radius: i32,
) -> usize {
    let center = pathfinder.world_to_path_grid(player);
    let mut walkable = 0;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let cell = center + glam::IVec2::new(dx, dy);
            if !pathfinder.contains(cell) {
                continue;
            }
            let open = pathfinder.is_walkable(cell);
            if open {
                walkable += 1;
            }
            let world = pathfinder.path_grid_to_world(cell);
            let screen = projector.project(world - player, 0.0);
            surface.circle_filled(screen, 3.0, if open { WALKABLE_CELL } else { BLOCKED_CELL });
        }
    }
    log::debug!("walkable cells around player: {walkable}");
    walkable
}

// ============================================================================
// TILE BROWSER
// ============================================================================

/// Label every tile-index position passing the browser filters with the
/// coordinates encoded in its key. Returns the number of labels drawn.
pub fn draw_tile_browser(
    surface: &mut dyn DrawSurface,
    projector: &Projector,
    tiles: &TileIndex,
    frame: &FrameContext<'_>,
) -> usize {
    let filter = frame.settings.tile_filter.to_lowercase();
    let mut drawn = 0;
    for (key, positions) in tiles.iter() {
        if positions.len() < frame.settings.tile_min_positions
            || !key.to_lowercase().contains(&filter)
        {
            continue;
        }
        let label = match tile_coords(key) {
            Some((x, y)) => format!("{x},{y}"),
            None => "?,?".to_owned(),
        };
        for &position in positions {
            let screen = frame.project(projector, position);
            draw_label(surface, screen, &label, TILE_TEXT, Color32::BLACK, TILE_BORDER);
            drawn += 1;
        }
    }
    drawn
}

/// Coordinates encoded in a tile key as `:x:<x>-y:<y>` or `:<x>-y:<y>`.
pub fn tile_coords(key: &str) -> Option<(i32, i32)> {
    key.match_indices(':').find_map(|(i, _)| {
        let rest = &key[i + 1..];
        rest.strip_prefix("x:")
            .and_then(parse_xy)
            .or_else(|| parse_xy(rest))
    })
}

fn parse_xy(s: &str) -> Option<(i32, i32)> {
    let (x, rest) = split_int(s)?;
    let (y, _) = split_int(rest.strip_prefix("-y:")?)?;
    Some((x, y))
}

fn split_int(s: &str) -> Option<(i32, &str)> {
    let sign = usize::from(s.starts_with('-'));
    let digits = s[sign..].bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let end = sign + digits;
    Some((s[..end].parse().ok()?, &s[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::draw::{DrawCall, RecordingSurface};
    use crate::engine::navigation::NavGrid;
    use crate::engine::projection::{SurfaceView, HEIGHT_SCALE};
    use crate::engine::source::EcsEntitySource;
    use std::rc::Rc;

    fn projector() -> Projector {
        SurfaceView::new(Vec2::new(500.0, 500.0), 240.0, 1.0)
            .projector()
            .unwrap()
    }

    fn entry(pin: Pin, positions: Vec<Vec2>) -> PinTileMatch {
        PinTileMatch {
            tile_key: pin.path.clone(),
            pin: Rc::new(pin),
            tile_positions: positions,
        }
    }

    fn source_at(player: Vec2) -> EcsEntitySource {
        let mut source = EcsEntitySource::new(1000, 1000);
        source.spawn_player(player, 0.0);
        source
    }

    #[test]
    fn centered_rect_rounds_half_size() {
        let (min, max) = centered_rect(Vec2::new(10.0, 10.0), Vec2::new(7.0, 13.0));
        assert_eq!(min, Vec2::new(6.0, 3.0));
        assert_eq!(max, Vec2::new(14.0, 17.0));
    }

    #[test]
    fn label_is_box_border_then_text() {
        let mut s = RecordingSurface::new();
        draw_label(&mut s, Vec2::ZERO, "ab", Color32::WHITE, Color32::BLACK, Color32::RED);
        assert!(matches!(s.calls[0], DrawCall::RectFilled { color: Color32::BLACK, .. }));
        assert!(matches!(s.calls[1], DrawCall::RectStroke { color: Color32::RED, .. }));
        assert_eq!(s.texts(), ["ab"]);
    }

    #[test]
    fn disabled_pins_draw_nothing() {
        let source = source_at(Vec2::ZERO);
        let settings = PinSettings::default();
        let frame = FrameContext {
            player: source.player().unwrap(),
            source: &source,
            settings: &settings,
        };
        let pin = Pin {
            enabled: false,
            ..Pin::new("p", "P", 1)
        };
        let matches = vec![entry(pin, vec![Vec2::new(500.0, 500.0)])];
        let grid = NavGrid::new_open(100, 100, 10);
        let mut s = RecordingSurface::new();
        draw_pin_labels(&mut s, &projector(), &matches, &frame);
        draw_pin_paths(&mut s, &projector(), &matches, &grid, &frame);
        assert!(s.calls.is_empty());
    }

    #[test]
    fn paths_start_at_player_and_follow_the_grid() {
        let source = source_at(Vec2::new(5.0, 5.0));
        let settings = PinSettings::default();
        let frame = FrameContext {
            player: source.player().unwrap(),
            source: &source,
            settings: &settings,
        };
        let grid = NavGrid::new_open(100, 100, 10);
        let matches = vec![entry(Pin::new("p", "P", 1), vec![Vec2::new(305.0, 5.0)])];
        let mut s = RecordingSurface::new();
        let stats = draw_pin_paths(&mut s, &projector(), &matches, &grid, &frame);
        assert_eq!(stats, PathStats { requested: 1, drawn: 1, failed: 0 });
        let lines = s.lines();
        // Cells 0..=30 along x: 30 segments after the player's own cell.
        assert_eq!(lines.len(), 30);
        assert_eq!(lines[0].0, Vec2::new(500.0, 500.0));
        for pair in lines.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
        assert_eq!(lines[0].2, Pin::default().text_color);
    }

    #[test]
    fn path_points_are_raised_by_their_own_terrain_height() {
        let settings = PinSettings::default();
        let grid = NavGrid::new_open(100, 100, 10);
        let matches = vec![entry(Pin::new("p", "P", 1), vec![Vec2::new(305.0, 5.0)])];

        let draw = |source: &EcsEntitySource| {
            let frame = FrameContext {
                player: source.player().unwrap(),
                source,
                settings: &settings,
            };
            let mut s = RecordingSurface::new();
            draw_pin_paths(&mut s, &projector(), &matches, &grid, &frame);
            s.lines()
        };

        let flat = draw(&source_at(Vec2::new(5.0, 5.0)));

        // Path point 10 sits on world (100, 0); lift it by 10 projected units.
        let dz = 10.0 * HEIGHT_SCALE;
        let mut hilly = source_at(Vec2::new(5.0, 5.0));
        let mut map = crate::engine::components::HeightMap::flat(1000, 1000);
        map.set(100, 0, dz);
        hilly.set_height_map(map);
        let raised = draw(&hilly);

        assert_eq!(raised.len(), flat.len());
        assert_eq!(raised[0].0, projector().center());
        let lift = 10.0 * projector().factors().sin;
        // Line 9 ends on point 10 and line 10 starts there.
        assert_eq!(raised[9].1.x, flat[9].1.x);
        assert!((raised[9].1.y - flat[9].1.y - lift).abs() < 1e-3);
        assert_eq!(raised[10].0, raised[9].1);
        for (i, (r, f)) in raised.iter().zip(&flat).enumerate() {
            if i != 9 && i != 10 {
                assert_eq!(r, f);
            }
        }
    }

    #[test]
    fn palette_override_cycles_by_match_index() {
        let pin = Pin::new("p", "P", 1);
        assert_eq!(path_color(0, &pin, false), pin.text_color);
        assert_eq!(path_color(1, &pin, true), PATH_PALETTE[1]);
        assert_eq!(path_color(10, &pin, true), PATH_PALETTE[1]);
    }

    #[test]
    fn failed_paths_do_not_stop_the_loop() {
        let source = source_at(Vec2::new(5.0, 5.0));
        let settings = PinSettings::default();
        let frame = FrameContext {
            player: source.player().unwrap(),
            source: &source,
            settings: &settings,
        };
        let mut grid = NavGrid::new_open(100, 100, 10);
        // Wall the first target in.
        for c in [(49, 50), (51, 50), (50, 49), (50, 51), (49, 49), (51, 51), (49, 51), (51, 49)] {
            grid.set_walkable(glam::IVec2::new(c.0, c.1), false);
        }
        let matches = vec![
            entry(Pin::new("a", "A", 1), vec![Vec2::new(505.0, 505.0)]),
            entry(Pin::new("b", "B", 1), vec![Vec2::new(205.0, 5.0)]),
        ];
        let mut s = RecordingSurface::new();
        let stats = draw_pin_paths(&mut s, &projector(), &matches, &grid, &frame);
        assert_eq!(stats, PathStats { requested: 2, drawn: 1, failed: 1 });
        assert_eq!(s.lines().len(), 20);
    }

    #[test]
    fn debug_grid_colors_cells_and_skips_out_of_bounds() {
        let mut grid = NavGrid::new_open(3, 3, 10);
        grid.set_walkable(glam::IVec2::new(1, 1), false);
        let mut s = RecordingSurface::new();
        let walkable = draw_walkable_grid(&mut s, &projector(), &grid, Vec2::new(5.0, 5.0), 2);
        // Only the 3x3 grid is in bounds around cell (0,0) with radius 2.
        assert_eq!(s.circles().len(), 9);
        assert_eq!(walkable, 8);
        assert_eq!(s.circles().iter().filter(|c| c.1 == BLOCKED_CELL).count(), 1);
    }

    #[test]
    fn tile_keys_encode_coordinates() {
        assert_eq!(tile_coords("Art/Tiles/foo.tdt:x:12-y:-3"), Some((12, -3)));
        assert_eq!(tile_coords("Art/Tiles/foo.tdt:7-y:40"), Some((7, 40)));
        assert_eq!(tile_coords("Art/a:b:5-y:6"), Some((5, 6)));
        assert_eq!(tile_coords("Metadata/Altar"), None);
        assert_eq!(tile_coords("x:-y:3"), None);
    }

    #[test]
    fn tile_browser_filters_entries() {
        let mut source = source_at(Vec2::ZERO);
        source.spawn_tile("Art/Room.tdt:x:1-y:2", Vec2::new(10.0, 10.0));
        source.spawn_tile("Art/Room.tdt:x:1-y:2", Vec2::new(20.0, 10.0));
        source.spawn_tile("Art/Hall.tdt:3-y:4", Vec2::new(30.0, 10.0));
        source.spawn_tile("Metadata/Thing", Vec2::new(40.0, 10.0));
        let settings = PinSettings {
            tile_filter: "art/".into(),
            tile_min_positions: 2,
            ..PinSettings::default()
        };
        let frame = FrameContext {
            player: source.player().unwrap(),
            source: &source,
            settings: &settings,
        };
        let mut s = RecordingSurface::new();
        let drawn = draw_tile_browser(&mut s, &projector(), source.tile_index(), &frame);
        assert_eq!(drawn, 2);
        assert_eq!(s.texts(), ["1,2", "1,2"]);
    }

    #[test]
    fn ignored_terrain_height_flattens_projection() {
        let mut source = source_at(Vec2::ZERO);
        let mut map = crate::engine::components::HeightMap::flat(100, 100);
        map.set(50, 50, 100.0);
        source.set_height_map(map);
        let flat = PinSettings {
            ignore_terrain_height: true,
            ..PinSettings::default()
        };
        let hilly = PinSettings::default();
        let player = source.player().unwrap();
        let at = Vec2::new(50.0, 50.0);
        let a = FrameContext { player, source: &source, settings: &flat };
        let b = FrameContext { player, source: &source, settings: &hilly };
        assert_eq!(a.height_delta(at), 0.0);
        assert_eq!(b.height_delta(at), 100.0);
        assert_ne!(a.project(&projector(), at), b.project(&projector(), at));
    }
}
