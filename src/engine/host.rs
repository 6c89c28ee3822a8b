// egui host for the demo window: owns the egui context, its winit state and
// its wgpu renderer, and runs one egui pass per frame on top of whatever the
// frame already rendered.

use egui::epaint::Shadow;

use super::draw::EguiSurface;

/// Status panel contents, shown in the top-left corner when visible.
pub struct HostStats {
    pub fps: u32,
    pub area_id: String,
    pub matches: usize,
    pub labels: usize,
    pub paths_drawn: usize,
    pub paths_failed: usize,
    pub player: (f32, f32),
    pub zoom: f32,
}

pub struct OverlayHost {
    pub stats_visible: bool,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl OverlayHost {
    pub fn new(
        window: &winit::window::Window,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let egui_ctx = egui::Context::default();

        // Style: dark, semi-transparent, small monospace white font
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = egui::Color32::from_rgba_premultiplied(0, 0, 0, 180);
        visuals.window_stroke = egui::Stroke::NONE;
        visuals.window_shadow = Shadow::NONE;
        visuals.override_text_color = Some(egui::Color32::WHITE);
        egui_ctx.set_visuals(visuals);

        let mut style = (*egui_ctx.style()).clone();
        style.override_font_id = Some(egui::FontId::monospace(13.0));
        egui_ctx.set_style(style);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface_format,
            None,  // no depth
            1,     // msaa samples
            false, // no dithering
        );

        Self {
            stats_visible: true,
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    pub fn toggle_stats(&mut self) {
        self.stats_visible = !self.stats_visible;
    }

    pub fn handle_window_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> egui_winit::EventResponse {
        self.egui_state.on_window_event(window, event)
    }

    /// Run one egui frame.
    ///
    /// `draw` gets the large overlay (a background layer covering the whole
    /// window) and, when `minimap_rect` is set, a second surface clipped to
    /// that rect on a dark panel.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &winit::window::Window,
        view: &wgpu::TextureView,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        stats: Option<&HostStats>,
        minimap_rect: Option<egui::Rect>,
        mut draw: impl FnMut(&mut EguiSurface, Option<&mut EguiSurface>),
    ) {
        let raw_input = self.egui_state.take_egui_input(window);

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            // ── large overlay ────────────────────────────────────────────────
            let mut main = EguiSurface::new(ctx.layer_painter(egui::LayerId::new(
                egui::Order::Background,
                egui::Id::new("pin_overlay_main"),
            )));

            // ── mini-map: dark panel, clipped ───────────────────────────────
            let mut minimap = minimap_rect.map(|rect| {
                let painter = ctx
                    .layer_painter(egui::LayerId::new(
                        egui::Order::Middle,
                        egui::Id::new("pin_overlay_minimap"),
                    ))
                    .with_clip_rect(rect);
                painter.rect_filled(
                    rect,
                    4.0,
                    egui::Color32::from_rgba_unmultiplied(10, 10, 30, 220),
                );
                EguiSurface::new(painter)
            });

            draw(&mut main, minimap.as_mut());

            // ── stats panel ──────────────────────────────────────────────────
            if let Some(stats) = stats {
                egui::Area::new(egui::Id::new("pin_overlay_stats"))
                    .fixed_pos(egui::pos2(10.0, 10.0))
                    .show(ctx, |ui| {
                        egui::Frame::none()
                            .fill(egui::Color32::from_rgba_premultiplied(0, 0, 0, 180))
                            .inner_margin(egui::Margin::same(8.0))
                            .rounding(4.0)
                            .show(ui, |ui: &mut egui::Ui| {
                                ui.label(format!("FPS: {}", stats.fps));
                                ui.label(format!("Area: {}", stats.area_id));
                                ui.label(format!(
                                    "Matches: {}  Labels: {}",
                                    stats.matches, stats.labels
                                ));
                                ui.label(format!(
                                    "Paths: {} drawn, {} failed",
                                    stats.paths_drawn, stats.paths_failed
                                ));
                                ui.label(format!(
                                    "Player: ({:.0}, {:.0})  zoom {:.2}",
                                    stats.player.0, stats.player.1, stats.zoom
                                ));
                                ui.label("WASD move · wheel zoom · N new area · G grid · F3 stats");
                            });
                    });
            }
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, &tris, screen_descriptor);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.egui_renderer
                .render(&mut render_pass.forget_lifetime(), &tris, screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
