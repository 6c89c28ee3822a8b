// Drawing primitives the presenter targets.
//
// One `DrawSurface` per active region (large overlay, mini-map). Calls are
// declarative and per frame; nothing is retained between frames.

use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Stroke};
use glam::Vec2;

pub trait DrawSurface {
    fn rect_filled(&mut self, min: Vec2, max: Vec2, color: Color32);

    fn rect_stroke(&mut self, min: Vec2, max: Vec2, color: Color32, thickness: f32);

    fn line(&mut self, from: Vec2, to: Vec2, color: Color32, thickness: f32);

    fn circle_filled(&mut self, center: Vec2, radius: f32, color: Color32);

    /// Draw `text` with its top-left corner at `pos`.
    fn text(&mut self, pos: Vec2, text: &str, color: Color32);

    /// Size `text` will occupy when drawn.
    fn text_size(&self, text: &str) -> Vec2;
}

#[inline]
fn pos2(v: Vec2) -> Pos2 {
    Pos2::new(v.x, v.y)
}

// ============================================================================
// EGUI SURFACE
// ============================================================================

/// `DrawSurface` over an egui painter, usually a background layer clipped to
/// the region being drawn.
pub struct EguiSurface {
    painter: Painter,
    font: FontId,
}

impl EguiSurface {
    pub fn new(painter: Painter) -> Self {
        Self {
            painter,
            font: FontId::monospace(13.0),
        }
    }
}

impl DrawSurface for EguiSurface {
    fn rect_filled(&mut self, min: Vec2, max: Vec2, color: Color32) {
        self.painter
            .rect_filled(Rect::from_min_max(pos2(min), pos2(max)), 0.0, color);
    }

    fn rect_stroke(&mut self, min: Vec2, max: Vec2, color: Color32, thickness: f32) {
        self.painter.rect_stroke(
            Rect::from_min_max(pos2(min), pos2(max)),
            0.0,
            Stroke::new(thickness, color),
        );
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Color32, thickness: f32) {
        self.painter
            .line_segment([pos2(from), pos2(to)], Stroke::new(thickness, color));
    }

    fn circle_filled(&mut self, center: Vec2, radius: f32, color: Color32) {
        self.painter.circle_filled(pos2(center), radius, color);
    }

    fn text(&mut self, pos: Vec2, text: &str, color: Color32) {
        self.painter
            .text(pos2(pos), Align2::LEFT_TOP, text, self.font.clone(), color);
    }

    fn text_size(&self, text: &str) -> Vec2 {
        let size = self
            .painter
            .layout_no_wrap(text.to_owned(), self.font.clone(), Color32::WHITE)
            .size();
        Vec2::new(size.x, size.y)
    }
}

// ============================================================================
// RECORDING SURFACE
// ============================================================================

/// One recorded primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    RectFilled { min: Vec2, max: Vec2, color: Color32 },
    RectStroke { min: Vec2, max: Vec2, color: Color32, thickness: f32 },
    Line { from: Vec2, to: Vec2, color: Color32, thickness: f32 },
    CircleFilled { center: Vec2, radius: f32, color: Color32 },
    Text { pos: Vec2, text: String, color: Color32 },
}

/// Headless surface that records every call. Text is measured as a fixed
/// 7x13 cell per character.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn lines(&self) -> Vec<(Vec2, Vec2, Color32)> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                DrawCall::Line { from, to, color, .. } => Some((from, to, color)),
                _ => None,
            })
            .collect()
    }

    pub fn circles(&self) -> Vec<(Vec2, Color32)> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                DrawCall::CircleFilled { center, color, .. } => Some((center, color)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl DrawSurface for RecordingSurface {
    fn rect_filled(&mut self, min: Vec2, max: Vec2, color: Color32) {
        self.calls.push(DrawCall::RectFilled { min, max, color });
    }

    fn rect_stroke(&mut self, min: Vec2, max: Vec2, color: Color32, thickness: f32) {
        self.calls.push(DrawCall::RectStroke { min, max, color, thickness });
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Color32, thickness: f32) {
        self.calls.push(DrawCall::Line { from, to, color, thickness });
    }

    fn circle_filled(&mut self, center: Vec2, radius: f32, color: Color32) {
        self.calls.push(DrawCall::CircleFilled { center, radius, color });
    }

    fn text(&mut self, pos: Vec2, text: &str, color: Color32) {
        self.calls.push(DrawCall::Text {
            pos,
            text: text.to_owned(),
            color,
        });
    }

    fn text_size(&self, text: &str) -> Vec2 {
        Vec2::new(7.0 * text.chars().count() as f32, 13.0)
    }
}
