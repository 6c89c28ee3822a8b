// Oblique map projection.
//
// The game map is drawn with a fixed-tilt axonometric camera. A world-grid
// delta (relative to the player) plus a height delta is turned into a 2-D
// pixel delta, then offset by the surface's own center. The same math serves
// the large overlay and the corner mini-map; only the view differs.

use glam::Vec2;

use super::error::{OverlayError, Result};

/// Camera tilt of the in-game map, in degrees.
pub const CAMERA_TILT_DEG: f32 = 38.7;
/// Terrain height units per world-grid unit on the vertical axis.
pub const HEIGHT_SCALE: f32 = 10.86957;
/// Reference map scale at zoom 1.0.
pub const MAP_SCALE_BASE: f32 = 240.0;

/// Per-surface cos/sin factors, precomputed once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObliqueFactors {
    pub cos: f32,
    pub sin: f32,
}

impl ObliqueFactors {
    /// Returns `None` when `zoom` or `diagonal` would produce non-finite or
    /// collapsed factors.
    pub fn new(diagonal: f32, zoom: f32) -> Option<Self> {
        if !zoom.is_finite() || zoom == 0.0 || !diagonal.is_finite() || diagonal <= 0.0 {
            return None;
        }
        let tilt = (CAMERA_TILT_DEG as f64).to_radians();
        let map_scale = (MAP_SCALE_BASE / zoom) as f64;
        let cos = (diagonal as f64 * tilt.cos() / map_scale) as f32;
        let sin = (diagonal as f64 * tilt.sin() / map_scale) as f32;
        if !cos.is_finite() || !sin.is_finite() {
            return None;
        }
        Some(Self { cos, sin })
    }
}

/// Convert a world-grid delta and a raw terrain-height delta to a screen delta.
#[inline]
pub fn world_delta_to_screen(delta: Vec2, delta_z: f32, factors: ObliqueFactors) -> Vec2 {
    let dz = delta_z / HEIGHT_SCALE;
    Vec2::new(
        (delta.x - delta.y) * factors.cos,
        (dz - (delta.x + delta.y)) * factors.sin,
    )
}

// ============================================================================
// SURFACE VIEW
// ============================================================================

/// Where and how large one render target is. The player sits at `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceView {
    pub center: Vec2,
    /// Diagonal length of the surface in pixels.
    pub diagonal: f32,
    pub zoom: f32,
}

impl SurfaceView {
    pub fn new(center: Vec2, diagonal: f32, zoom: f32) -> Self {
        Self { center, diagonal, zoom }
    }

    /// View for a rectangular panel, e.g. the corner mini-map.
    ///
    /// `shift` is the panel's own pan offset (default shift plus user shift).
    pub fn from_rect(position: Vec2, size: Vec2, shift: Vec2, zoom: f32) -> Self {
        Self {
            center: position + size / 2.0 + shift,
            diagonal: size.length(),
            zoom,
        }
    }

    /// Validate the view and build a projector for this frame.
    pub fn projector(&self) -> Result<Projector> {
        let factors = ObliqueFactors::new(self.diagonal, self.zoom).ok_or(
            OverlayError::DegenerateProjection {
                zoom: self.zoom,
                diagonal: self.diagonal,
            },
        )?;
        if !self.center.is_finite() {
            return Err(OverlayError::DegenerateProjection {
                zoom: self.zoom,
                diagonal: self.diagonal,
            });
        }
        Ok(Projector {
            center: self.center,
            factors,
        })
    }
}

/// A validated view: projecting through it never yields non-finite pixels
/// for finite input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    center: Vec2,
    factors: ObliqueFactors,
}

impl Projector {
    /// Screen position of a point `delta` world-grid units away from the
    /// player, `delta_z` terrain units above the player.
    #[inline]
    pub fn project(&self, delta: Vec2, delta_z: f32) -> Vec2 {
        self.center + world_delta_to_screen(delta, delta_z, self.factors)
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn factors(&self) -> ObliqueFactors {
        self.factors
    }
}
