// Engine module - pin overlay core plus the demo host pieces
//
// Leaves first: projection -> tile_matcher -> change_tracker -> path_cache
// -> presenter, driven per frame by overlay.

pub mod change_tracker;
pub mod components;
pub mod draw;
pub mod error;
pub mod host;
pub mod input;
pub mod navigation;
pub mod overlay;
pub mod path_cache;
pub mod pins;
pub mod presenter;
pub mod projection;
pub mod settings;
pub mod source;
pub mod tile_matcher;

// Re-export commonly used items
pub use components::*;
pub use draw::{DrawSurface, EguiSurface, RecordingSurface};
pub use error::{OverlayError, PathError, Result};
pub use navigation::{NavGrid, PathFinder};
pub use overlay::{AreaChange, AreaSender, FrameReport, PinOverlay};
pub use pins::{Pin, PinGroup, PinLibrary};
pub use projection::SurfaceView;
pub use settings::{PinSettings, Settings};
pub use source::{EcsEntitySource, EntitySource, PlayerState};
pub use tile_matcher::PinTileMatch;
