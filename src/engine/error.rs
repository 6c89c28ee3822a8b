// Error taxonomy for the overlay engine.
//
// Every failure here is contained by the caller at the smallest unit that
// produced it (one object, one pin, one path, one surface). Nothing in this
// module is allowed to take the host frame down.

use glam::IVec2;
use thiserror::Error;

/// Failures reported by a [`PathFinder`](super::navigation::PathFinder).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("cell {0} is outside the path grid")]
    OutOfBounds(IVec2),

    #[error("cell {0} is not walkable")]
    Blocked(IVec2),

    #[error("no route from {from} to {to}")]
    Unreachable { from: IVec2, to: IVec2 },

    #[error("search gave up after {0} expansions")]
    SearchBudgetExceeded(u32),
}

/// Errors surfaced by the overlay engine and its configuration loaders.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("object is missing its {0} component")]
    MissingComponent(&'static str),

    #[error("pathfinding failed: {0}")]
    Path(#[from] PathError),

    #[error("surface projection is degenerate (zoom {zoom}, diagonal {diagonal})")]
    DegenerateProjection { zoom: f32, diagonal: f32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, OverlayError>;
