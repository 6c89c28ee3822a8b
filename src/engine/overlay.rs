// Per-frame driver tying matching, change detection, priming and drawing
// together.
//
// Frame order:
//   1. drain pending area changes (each binds a fresh pathfinder and forces
//      a rematch)
//   2. rematch pins against the live tile index; swap the snapshot only if
//      it changed, priming the pathfinder after a swap
//   3. draw the large overlay (debug grid, paths, labels, tile browser)
//   4. draw the mini-map (labels only)
//
// Area changes may be announced from anywhere through an `AreaSender`, but
// they are only applied on the render thread at step 1.

use std::sync::mpsc::{self, Receiver, Sender};

use super::draw::DrawSurface;
use super::error::Result;
use super::navigation::PathFinder;
use super::path_cache::PathCache;
use super::pins::PinLibrary;
use super::presenter::{self, FrameContext, PathStats};
use super::projection::SurfaceView;
use super::change_tracker::MatchSnapshot;
use super::settings::Settings;
use super::source::EntitySource;
use super::tile_matcher::match_pins;

/// A new area became active, with the pathfinder built for its grid.
pub struct AreaChange {
    pub area_id: String,
    pub pathfinder: Box<dyn PathFinder + Send>,
}

pub type AreaSender = Sender<AreaChange>;

/// What one `render_main` call produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub labels: usize,
    pub paths: PathStats,
    pub walkable_cells: Option<usize>,
    pub tiles: usize,
}

pub struct PinOverlay {
    pins: PinLibrary,
    settings: Settings,
    area_id: String,
    pathfinder: Option<Box<dyn PathFinder + Send>>,
    snapshot: MatchSnapshot,
    path_cache: PathCache,
    /// Pins or area were swapped; the next rematch that actually runs must
    /// replace the snapshot.
    rematch_pending: bool,
    area_tx: AreaSender,
    area_rx: Receiver<AreaChange>,
}

impl PinOverlay {
    pub fn new(pins: PinLibrary, settings: Settings) -> Self {
        let (area_tx, area_rx) = mpsc::channel();
        Self {
            pins,
            settings,
            area_id: String::new(),
            pathfinder: None,
            snapshot: MatchSnapshot::default(),
            path_cache: PathCache::new(),
            rematch_pending: false,
            area_tx,
            area_rx,
        }
    }

    /// Handle for announcing area changes.
    pub fn area_sender(&self) -> AreaSender {
        self.area_tx.clone()
    }

    /// Swap the pin library (e.g. after the user edited a pin file). The next
    /// update rematches against it and replaces the snapshot unconditionally,
    /// since labels and colors are not part of change detection.
    pub fn set_pins(&mut self, pins: PinLibrary) {
        self.pins = pins;
        self.rematch_pending = true;
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn area_id(&self) -> &str {
        &self.area_id
    }

    pub fn snapshot(&self) -> &MatchSnapshot {
        &self.snapshot
    }

    pub fn path_cache(&self) -> &PathCache {
        &self.path_cache
    }

    pub fn pathfinder(&self) -> Option<&(dyn PathFinder + Send)> {
        self.pathfinder.as_deref()
    }

    /// Apply an area change immediately and force a rematch. If matching
    /// cannot run yet (no player), the forced swap stays owed until it can.
    pub fn enter_area(&mut self, change: AreaChange, source: &dyn EntitySource) {
        log::info!("area changed to {}", change.area_id);
        self.area_id = change.area_id;
        self.pathfinder = Some(change.pathfinder);
        self.path_cache.reset();
        self.rematch_pending = true;
        self.update_matches(source, true);
    }

    /// Apply every queued area change, oldest first. Returns how many.
    pub fn drain_area_changes(&mut self, source: &dyn EntitySource) -> usize {
        let mut applied = 0;
        while let Ok(change) = self.area_rx.try_recv() {
            self.enter_area(change, source);
            applied += 1;
        }
        applied
    }

    /// Rematch pins. Returns whether the snapshot was replaced.
    ///
    /// Skipped (returns false) until an area is bound or when the player
    /// position is unavailable this frame. A pending area or pin change
    /// turns this into a forced swap.
    pub fn update_matches(&mut self, source: &dyn EntitySource, force: bool) -> bool {
        let Some(pathfinder) = self.pathfinder.as_deref_mut() else {
            return false;
        };
        let player = match source.player() {
            Ok(player) => player,
            Err(e) => {
                log::trace!("skipping pin matching: {e}");
                return false;
            }
        };

        let force = force || std::mem::take(&mut self.rematch_pending);
        let matches = match_pins(&self.pins, &self.area_id, source.tile_index(), pathfinder);
        if !self.snapshot.replace_if_changed(matches, force) {
            return false;
        }
        log::debug!(
            "found {} pin matches for area {}, updating",
            self.snapshot.len(),
            self.area_id
        );
        let current = self.snapshot.current();
        self.path_cache
            .prime(&current, player.grid_position, pathfinder);
        true
    }

    /// Drain area changes and rematch. Call once per frame before drawing.
    pub fn update(&mut self, source: &dyn EntitySource) {
        self.drain_area_changes(source);
        if self.settings.pin.enabled {
            self.update_matches(source, false);
        }
    }

    /// Draw the large overlay.
    pub fn render_main(
        &mut self,
        surface: &mut dyn DrawSurface,
        view: SurfaceView,
        source: &dyn EntitySource,
    ) -> Result<FrameReport> {
        let mut report = FrameReport::default();
        let Some(pathfinder) = self.pathfinder.as_deref() else {
            return Ok(report);
        };
        let projector = view.projector()?;
        let frame = FrameContext {
            player: source.player()?,
            source,
            settings: &self.settings.pin,
        };
        let player = frame.player.grid_position;

        if self.settings.debug_walkable_terrain {
            report.walkable_cells = Some(presenter::draw_walkable_grid(
                surface,
                &projector,
                pathfinder,
                player,
                self.settings.debug_grid_radius,
            ));
        }

        if self.settings.pin.enabled && !self.snapshot.is_empty() {
            let matches = self.snapshot.current();
            if self.settings.pin.draw_paths {
                self.path_cache
                    .observe_player_cell(pathfinder.world_to_path_grid(player));
                report.paths =
                    presenter::draw_pin_paths(surface, &projector, &matches, pathfinder, &frame);
            }
            report.labels = presenter::draw_pin_labels(surface, &projector, &matches, &frame);
        }

        if self.settings.pin.show_tiles {
            report.tiles =
                presenter::draw_tile_browser(surface, &projector, source.tile_index(), &frame);
        }
        Ok(report)
    }

    /// Draw pin labels on the mini-map. Returns the number of labels drawn.
    pub fn render_minimap(
        &self,
        surface: &mut dyn DrawSurface,
        view: SurfaceView,
        source: &dyn EntitySource,
    ) -> Result<usize> {
        if !self.settings.pin.enabled
            || !self.settings.pin.draw_on_minimap
            || self.pathfinder.is_none()
            || self.snapshot.is_empty()
        {
            return Ok(0);
        }
        let projector = view.projector()?;
        let frame = FrameContext {
            player: source.player()?,
            source,
            settings: &self.settings.pin,
        };
        let matches = self.snapshot.current();
        Ok(presenter::draw_pin_labels(surface, &projector, &matches, &frame))
    }
}
