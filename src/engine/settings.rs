// Overlay configuration, read from a TOML file. Missing keys take defaults.

use serde::Deserialize;
use std::path::Path;

use super::error::Result;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Draw a walkable/blocked marker for every path-grid cell near the player.
    pub debug_walkable_terrain: bool,
    /// Radius of that marker grid, in path-grid cells.
    pub debug_grid_radius: i32,
    pub pin: PinSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_walkable_terrain: false,
            debug_grid_radius: 10,
            pin: PinSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PinSettings {
    pub enabled: bool,
    pub draw_paths: bool,
    /// Color paths from the fixed palette instead of the pin's text color.
    pub override_color_paths: bool,
    pub path_thickness: f32,
    /// Project everything as if the terrain were flat.
    pub ignore_terrain_height: bool,
    pub draw_on_minimap: bool,

    /// Tile browser: label every tile-index entry on the overlay.
    pub show_tiles: bool,
    /// Only entries whose key contains this (case-insensitive).
    pub tile_filter: String,
    /// Only entries with at least this many live positions.
    pub tile_min_positions: usize,
}

impl Default for PinSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            draw_paths: true,
            override_color_paths: false,
            path_thickness: 1.0,
            ignore_terrain_height: false,
            draw_on_minimap: true,
            show_tiles: false,
            tile_filter: String::new(),
            tile_min_positions: 1,
        }
    }
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&text)?;
        log::info!("settings loaded from {}", path.display());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(Settings::from_toml_str("").unwrap(), Settings::default());
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let s = Settings::from_toml_str(
            r#"
            debug_walkable_terrain = true

            [pin]
            override_color_paths = true
            path_thickness = 2.5
            "#,
        )
        .unwrap();
        assert!(s.debug_walkable_terrain);
        assert_eq!(s.debug_grid_radius, 10);
        assert!(s.pin.override_color_paths);
        assert_eq!(s.pin.path_thickness, 2.5);
        assert!(s.pin.draw_paths);
        assert_eq!(s.pin.tile_min_positions, 1);
    }

    #[test]
    fn missing_file_is_defaults() {
        let s = Settings::load(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(Settings::from_toml_str("[pin]\nenabled = \"yes\"").is_err());
    }
}
