// Input state for the demo host
// Abstracts winit events into a queryable per-frame snapshot: held keys drive
// player movement, single presses toggle overlay features, the wheel zooms.

use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

pub struct InputState {
    // Keyboard
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,

    // Scroll: accumulated vertical scroll this frame, reset in end_frame()
    pub scroll_delta: f32,

    pub window_size: (u32, u32),
}

impl InputState {
    pub fn new(window_size: (u32, u32)) -> Self {
        Self {
            keys_held: HashSet::new(),
            keys_pressed: HashSet::new(),
            scroll_delta: 0.0,
            window_size,
        }
    }

    /// Feed a winit WindowEvent into the input state.
    /// Call this once per event before the host's own event handling.
    pub fn process_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            // Auto-repeat arrives as more presses; only the
                            // first one counts as an edge.
                            if self.keys_held.insert(key) {
                                self.keys_pressed.insert(key);
                            }
                        }
                        ElementState::Released => {
                            self.keys_held.remove(&key);
                        }
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                self.scroll_delta += y;
            }
            WindowEvent::Resized(size) => {
                self.window_size = (size.width, size.height);
            }
            WindowEvent::Focused(false) => {
                self.keys_held.clear();
            }
            _ => {}
        }
    }

    /// Call once per frame after update() and render() have consumed input.
    /// Resets per-frame accumulators.
    pub fn end_frame(&mut self) {
        self.scroll_delta = 0.0;
        self.keys_pressed.clear();
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// True only on the frame `key` went down.
    pub fn was_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// WASD / arrow direction in world axes, normalized (zero when idle).
    pub fn movement_axis(&self) -> Vec2 {
        let mut axis = Vec2::ZERO;
        if self.is_key_held(KeyCode::KeyW) || self.is_key_held(KeyCode::ArrowUp) {
            axis.y -= 1.0;
        }
        if self.is_key_held(KeyCode::KeyS) || self.is_key_held(KeyCode::ArrowDown) {
            axis.y += 1.0;
        }
        if self.is_key_held(KeyCode::KeyA) || self.is_key_held(KeyCode::ArrowLeft) {
            axis.x -= 1.0;
        }
        if self.is_key_held(KeyCode::KeyD) || self.is_key_held(KeyCode::ArrowRight) {
            axis.x += 1.0;
        }
        axis.normalize_or_zero()
    }
}
