// src/tilemap/rendering/components.rs

use bevy::prelude::*;

use crate::tilemap::core::TileTypeId;

/// Render bookkeeping on every tilemap entity.
#[derive(Component)]
pub struct TilemapRenderState {
    /// True when the tile lists changed since the last build.
    pub dirty: bool,
    /// Draw entities spawned by the last build.
    pub entities: Vec<Entity>,
}

impl Default for TilemapRenderState {
    fn default() -> Self {
        Self { dirty: true, entities: Vec::new() }
    }
}

impl TilemapRenderState {
    #[inline]
    pub fn mark_dirty(&mut self) { self.dirty = true; }
}

/// One draw entity: a merged batch, or a single instance for non-instanced materials.
#[derive(Component, Clone, Copy, Debug)]
pub struct TileBatch {
    pub tilemap: Entity,
    pub tile: TileTypeId,
    pub material_index: usize,
    pub batch_index: usize,
}

#[derive(Component, Default)]
pub struct BatchStats {
    pub instance_count: u32,
    pub merged_vertex_count: u32,
}
