// Read-only view of the live game area.
//
// `EntitySource` is the seam between the overlay and whatever enumerates the
// game process. `EcsEntitySource` backs it with a bevy_ecs `World`: the host
// spawns the player and other live objects as entities and keeps the area's
// `TileIndex` and `HeightMap` as resources.

use bevy_ecs::prelude::*;
use glam::Vec2;

use super::components::{GridPosition, HeightMap, LocalPlayer, ObjectPath, TileIndex};
use super::error::{OverlayError, Result};

/// Player position for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    /// Exact world-grid position (not rounded to a cell).
    pub grid_position: Vec2,
    pub terrain_height: f32,
}

pub trait EntitySource {
    /// Fails with `MissingComponent` when the player has no position yet.
    fn player(&self) -> Result<PlayerState>;

    fn tile_index(&self) -> &TileIndex;

    /// Terrain height under a world-grid point, `None` outside the area.
    fn terrain_height(&self, at: Vec2) -> Option<f32>;
}

// ============================================================================
// ECS-BACKED SOURCE
// ============================================================================

pub struct EcsEntitySource {
    world: World,
    player: Option<Entity>,
}

impl EcsEntitySource {
    /// Empty area with an empty tile index and flat terrain of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        let mut world = World::new();
        world.insert_resource(TileIndex::new());
        world.insert_resource(HeightMap::flat(width, height));
        Self {
            world,
            player: None,
        }
    }

    /// Spawn (or replace) the local player at `position`.
    pub fn spawn_player(&mut self, position: Vec2, terrain_height: f32) -> Entity {
        if let Some(old) = self.player.take() {
            self.world.despawn(old);
        }
        let id = self
            .world
            .spawn((LocalPlayer, GridPosition::new(position, terrain_height)))
            .id();
        self.player = Some(id);
        id
    }

    /// Move the player, keeping the terrain height in sync with the height map.
    pub fn move_player(&mut self, position: Vec2) {
        let Some(id) = self.player else { return };
        let height = self.terrain_height(position).unwrap_or(0.0);
        if let Some(mut pos) = self.world.get_mut::<GridPosition>(id) {
            pos.position = position;
            pos.terrain_height = height;
        }
    }

    /// Spawn a live object and register it in the tile index.
    pub fn spawn_tile(&mut self, path: impl Into<String>, position: Vec2) -> Entity {
        let path = path.into();
        let height = self.terrain_height(position).unwrap_or(0.0);
        self.world
            .resource_mut::<TileIndex>()
            .insert(path.clone(), position);
        self.world
            .spawn((ObjectPath(path), GridPosition::new(position, height)))
            .id()
    }

    /// Drop every non-player object and clear the tile index, e.g. on area change.
    pub fn clear_area(&mut self) {
        let mut query = self
            .world
            .query_filtered::<Entity, (With<ObjectPath>, Without<LocalPlayer>)>();
        let doomed: Vec<Entity> = query.iter(&self.world).collect();
        for id in doomed {
            self.world.despawn(id);
        }
        self.world.resource_mut::<TileIndex>().clear();
    }

    pub fn set_height_map(&mut self, map: HeightMap) {
        self.world.insert_resource(map);
    }

    pub fn player_entity(&self) -> Option<Entity> {
        self.player
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl EntitySource for EcsEntitySource {
    fn player(&self) -> Result<PlayerState> {
        let id = self
            .player
            .ok_or(OverlayError::MissingComponent("LocalPlayer"))?;
        let pos = self
            .world
            .get::<GridPosition>(id)
            .ok_or(OverlayError::MissingComponent("GridPosition"))?;
        Ok(PlayerState {
            grid_position: pos.position,
            terrain_height: pos.terrain_height,
        })
    }

    fn tile_index(&self) -> &TileIndex {
        self.world.resource::<TileIndex>()
    }

    fn terrain_height(&self, at: Vec2) -> Option<f32> {
        self.world.get_resource::<HeightMap>()?.sample(at)
    }
}
