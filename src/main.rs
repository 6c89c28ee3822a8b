// Pin overlay demo host
// Generates a random walled area, spawns a player and a handful of tagged
// objects into a bevy_ecs world, and draws the pin overlay with egui on top
// of a cleared wgpu frame. WASD moves the player, N rolls a new area.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use winit::{
    event::{ElementState, Event as WinitEvent, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use pin_overlay::engine::host::{HostStats, OverlayHost};
use pin_overlay::engine::input::InputState;
use pin_overlay::engine::{
    AreaChange, AreaSender, DrawSurface, EcsEntitySource, EntitySource, FrameReport, HeightMap,
    NavGrid, PathFinder, Pin, PinLibrary, PinOverlay, Settings, SurfaceView,
};

// ============================================================================
// COMMAND LINE
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "pin_overlay", about = "Pin overlay demo")]
struct Args {
    /// Overlay settings (TOML). Missing file means defaults.
    #[arg(long, default_value = "pin_overlay.toml")]
    settings: PathBuf,

    /// Pin file (TOML). Without one, a built-in demo set is used.
    #[arg(long)]
    pins: Option<PathBuf>,

    /// Seed for area generation.
    #[arg(long)]
    seed: Option<u64>,

    /// World-grid units per path-grid cell.
    #[arg(long, default_value_t = 10)]
    grid_size: u32,
}

// ============================================================================
// DEMO AREA GENERATION
// ============================================================================

const AREA_CELLS: u32 = 64;
const WALL_DENSITY: f64 = 0.22;
const PLAYER_SPEED: f32 = 160.0;
const MINIMAP_SIZE: f32 = 220.0;

const ALTAR: &str = "Metadata/Terrain/Leagues/Ritual/RitualRuneObject";
const STRONGBOX: &str = "Metadata/Chests/StrongBoxes/Arcanist";
const WAYPOINT: &str = "Metadata/MiscellaneousObjects/Waypoint";

fn demo_pins() -> PinLibrary {
    let mut pins = PinLibrary::default();
    pins.push(
        "Demo_*",
        vec![
            Pin::new(ALTAR, "Altar", 1),
            Pin::new(STRONGBOX, "Strongbox", 1),
            Pin::new(WAYPOINT, "Waypoint", 1),
        ],
    );
    pins
}

// Bad files fall back to defaults so the demo keeps running.
fn load_settings(path: &Path) -> Settings {
    Settings::load(path).unwrap_or_else(|e| {
        log::warn!("settings {}: {e}, using defaults", path.display());
        Settings::default()
    })
}

fn load_pins(path: Option<&Path>) -> PinLibrary {
    match path {
        Some(path) => PinLibrary::load(path).unwrap_or_else(|e| {
            log::warn!("pins {}: {e}, using demo pins", path.display());
            demo_pins()
        }),
        None => demo_pins(),
    }
}

struct DemoArea {
    id: String,
    grid: NavGrid,
    heights: HeightMap,
    tiles: Vec<(String, Vec2)>,
    spawn: Vec2,
}

fn generate_area(rng: &mut StdRng, index: u32, grid_size: u32) -> DemoArea {
    let cells = AREA_CELLS;
    let center = (cells / 2) as i32;

    let mut walkable = Vec::with_capacity((cells * cells) as usize);
    for y in 0..cells as i32 {
        for x in 0..cells as i32 {
            let border = x == 0 || y == 0 || x == cells as i32 - 1 || y == cells as i32 - 1;
            let spawn_clearing = (x - center).abs() <= 2 && (y - center).abs() <= 2;
            walkable.push(spawn_clearing || (!border && !rng.gen_bool(WALL_DENSITY)));
        }
    }
    let grid = NavGrid::from_walkable(cells, cells, grid_size, walkable);

    // Rolling hills so height deltas show up in the projection.
    let world = cells * grid_size;
    let mut heights = HeightMap::flat(world, world);
    let phase = rng.gen_range(0.0..std::f32::consts::TAU);
    for y in 0..world {
        for x in 0..world {
            let (fx, fy) = (x as f32 / 97.0, y as f32 / 131.0);
            heights.set(x, y, 60.0 * ((fx + phase).sin() + (fy - phase).cos()));
        }
    }

    // Objects go on random cells, walkable or not; unwalkable ones exercise
    // the snap-to-walkable path.
    let random_point = |rng: &mut StdRng| {
        let cell = Vec2::new(
            rng.gen_range(1..cells - 1) as f32,
            rng.gen_range(1..cells - 1) as f32,
        );
        cell * grid_size as f32 + Vec2::splat(grid_size as f32 / 2.0)
    };
    let mut tiles = vec![(ALTAR.to_owned(), random_point(rng))];
    if rng.gen_bool(0.5) {
        tiles.push((STRONGBOX.to_owned(), random_point(rng)));
        tiles.push((STRONGBOX.to_owned(), random_point(rng)));
    } else {
        tiles.push((STRONGBOX.to_owned(), random_point(rng)));
    }
    tiles.push((WAYPOINT.to_owned(), random_point(rng)));
    for i in 0..6 {
        let p = random_point(rng);
        tiles.push((
            format!("Art/Tiles/room_{i}.tdt:x:{}-y:{}", p.x as i32, p.y as i32),
            p,
        ));
    }

    DemoArea {
        id: format!("Demo_{index}"),
        grid,
        heights,
        tiles,
        spawn: Vec2::splat((center as u32 * grid_size) as f32 + grid_size as f32 / 2.0),
    }
}

/// Load `area` into the entity source and announce it to the overlay. The
/// overlay picks it up on its next update.
fn enter_area(source: &mut EcsEntitySource, area_tx: &AreaSender, area: DemoArea) {
    source.clear_area();
    source.set_height_map(area.heights);
    for (path, position) in area.tiles {
        source.spawn_tile(path, position);
    }
    if source.player_entity().is_none() {
        source.spawn_player(area.spawn, 0.0);
    }
    source.move_player(area.spawn);

    log::info!(
        "generated {} ({} walkable cells, {} objects)",
        area.id,
        area.grid.walkable_count(),
        source.tile_index().len()
    );
    let change = AreaChange {
        area_id: area.id,
        pathfinder: Box::new(area.grid),
    };
    if area_tx.send(change).is_err() {
        log::warn!("overlay is gone, area change dropped");
    }
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    host: OverlayHost,
    input: InputState,

    source: EcsEntitySource,
    overlay: PinOverlay,
    area_tx: AreaSender,
    rng: StdRng,
    settings_path: PathBuf,
    pins_path: Option<PathBuf>,
    grid_size: u32,
    area_index: u32,
    zoom: f32,
    last_report: FrameReport,
    fps: u32,
    last_update: std::time::Instant,
}

impl State {
    async fn new(window: Arc<Window>, args: &Args) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .unwrap();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .unwrap();

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let host = OverlayHost::new(&window, &device, surface_format);

        let overlay = PinOverlay::new(load_pins(args.pins.as_deref()), load_settings(&args.settings));
        let area_tx = overlay.area_sender();
        let mut rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let grid_size = args.grid_size.max(1);
        let world = AREA_CELLS * grid_size;
        let mut source = EcsEntitySource::new(world, world);
        enter_area(&mut source, &area_tx, generate_area(&mut rng, 0, grid_size));

        Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            host,
            input: InputState::new((size.width, size.height)),
            source,
            overlay,
            area_tx,
            rng,
            settings_path: args.settings.clone(),
            pins_path: args.pins.clone(),
            grid_size,
            area_index: 0,
            zoom: 1.0,
            last_report: FrameReport::default(),
            fps: 0,
            last_update: std::time::Instant::now(),
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn toggle(&mut self, edit: impl FnOnce(&mut Settings)) {
        let mut settings = self.overlay.settings().clone();
        edit(&mut settings);
        self.overlay.set_settings(settings);
    }

    fn update(&mut self) {
        let now = std::time::Instant::now();
        let dt = (now - self.last_update).as_secs_f32();
        self.last_update = now;

        if self.input.was_key_pressed(KeyCode::KeyN) {
            self.area_index += 1;
            let area = generate_area(&mut self.rng, self.area_index, self.grid_size);
            enter_area(&mut self.source, &self.area_tx, area);
        }
        if self.input.was_key_pressed(KeyCode::KeyR) {
            self.overlay.set_settings(load_settings(&self.settings_path));
            self.overlay.set_pins(load_pins(self.pins_path.as_deref()));
        }
        if self.input.was_key_pressed(KeyCode::KeyG) {
            self.toggle(|s| s.debug_walkable_terrain = !s.debug_walkable_terrain);
        }
        if self.input.was_key_pressed(KeyCode::KeyT) {
            self.toggle(|s| s.pin.show_tiles = !s.pin.show_tiles);
        }
        if self.input.was_key_pressed(KeyCode::KeyP) {
            self.toggle(|s| s.pin.draw_paths = !s.pin.draw_paths);
        }
        if self.input.was_key_pressed(KeyCode::KeyH) {
            self.toggle(|s| s.pin.ignore_terrain_height = !s.pin.ignore_terrain_height);
        }
        if self.input.was_key_pressed(KeyCode::F3) {
            self.host.toggle_stats();
        }

        if self.input.scroll_delta != 0.0 {
            self.zoom = (self.zoom * 1.1_f32.powf(self.input.scroll_delta)).clamp(0.25, 4.0);
        }

        // Apply pending area changes before moving, so walkability checks run
        // against the grid the player is actually standing on.
        self.overlay.update(&self.source);

        let axis = self.input.movement_axis();
        if axis != Vec2::ZERO {
            if let Ok(player) = self.source.player() {
                let next = player.grid_position + axis * PLAYER_SPEED * dt;
                let walkable = self
                    .overlay
                    .pathfinder()
                    .is_some_and(|pf| pf.is_walkable(pf.world_to_path_grid(next)));
                if walkable {
                    self.source.move_player(next);
                }
            }
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let _render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.05,
                            g: 0.05,
                            b: 0.1,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }

        // egui paints in logical points.
        let scale = self.window.scale_factor() as f32;
        let logical = Vec2::new(self.size.width as f32, self.size.height as f32) / scale;
        let main_view = SurfaceView::new(logical / 2.0, logical.length(), self.zoom);
        let minimap_pos = Vec2::new(logical.x - MINIMAP_SIZE - 10.0, 10.0);
        let minimap_view = SurfaceView::from_rect(
            minimap_pos,
            Vec2::splat(MINIMAP_SIZE),
            Vec2::ZERO,
            self.zoom * 0.25,
        );
        let minimap_rect = self.overlay.settings().pin.draw_on_minimap.then(|| {
            egui::Rect::from_min_size(
                egui::pos2(minimap_pos.x, minimap_pos.y),
                egui::vec2(MINIMAP_SIZE, MINIMAP_SIZE),
            )
        });

        let player = self.source.player().map(|p| p.grid_position).unwrap_or_default();
        let stats = self.host.stats_visible.then(|| HostStats {
            fps: self.fps,
            area_id: self.overlay.area_id().to_owned(),
            matches: self.overlay.snapshot().len(),
            labels: self.last_report.labels,
            paths_drawn: self.last_report.paths.drawn,
            paths_failed: self.last_report.paths.failed,
            player: (player.x, player.y),
            zoom: self.zoom,
        });

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: scale,
        };

        let overlay = &mut self.overlay;
        let source = &self.source;
        let last_report = &mut self.last_report;
        self.host.render(
            &self.device,
            &self.queue,
            &mut encoder,
            &self.window,
            &view,
            &screen_descriptor,
            stats.as_ref(),
            minimap_rect,
            |main, minimap| {
                match overlay.render_main(main, main_view, source) {
                    Ok(report) => {
                        if let Some(cells) = report.walkable_cells {
                            log::debug!("{cells} walkable cells around the player");
                        }
                        *last_report = report;
                    }
                    Err(e) => log::warn!("overlay skipped this frame: {e}"),
                }
                if let Some(minimap) = minimap {
                    draw_player_marker(&mut *minimap, minimap_view.center);
                    if let Err(e) = overlay.render_minimap(minimap, minimap_view, source) {
                        log::warn!("mini-map skipped this frame: {e}");
                    }
                }
            },
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn draw_player_marker(surface: &mut dyn DrawSurface, at: Vec2) {
    surface.circle_filled(at, 3.0, egui::Color32::WHITE);
}

// ============================================================================
// MAIN
// ============================================================================

fn main() {
    env_logger::init();
    let args = Args::parse();

    let event_loop = EventLoop::new().unwrap();

    let window_attributes = Window::default_attributes()
        .with_title("Pin Overlay - WASD move, wheel zoom, N new area, R reload, G/T/P/H toggles")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

    let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

    let mut state = pollster::block_on(State::new(window.clone(), &args));
    let mut frame_count = 0;
    let mut last_fps_update = std::time::Instant::now();

    event_loop
        .run(move |event, control_flow| match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                let _ = state.host.handle_window_event(&window, event);
                state.input.process_event(event);
                match event {
                    WindowEvent::CloseRequested
                    | WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(KeyCode::Escape),
                                ..
                            },
                        ..
                    } => control_flow.exit(),
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        state.update();
                        match state.render() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => state.resize(state.size),
                            Err(wgpu::SurfaceError::OutOfMemory) => control_flow.exit(),
                            Err(e) => log::warn!("{e:?}"),
                        }
                        state.input.end_frame();

                        frame_count += 1;
                        let now = std::time::Instant::now();
                        if (now - last_fps_update).as_secs_f32() >= 1.0 {
                            state.fps = frame_count;
                            frame_count = 0;
                            last_fps_update = now;
                        }
                    }
                    _ => {}
                }
            }
            WinitEvent::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        })
        .unwrap();
}
