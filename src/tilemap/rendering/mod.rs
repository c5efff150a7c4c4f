//! Tile rendering. Groups placed instances by tile type, splits them into
//! fixed-size batches and bakes one merged mesh per batch for materials that
//! allow instancing; other materials get one entity per instance.

pub mod batcher;
pub mod components;
pub mod render_data;
pub mod resources;
pub mod systems;

pub use batcher::{InstanceBatcher, BATCH_CAPACITY};
pub use components::{BatchStats, TileBatch, TilemapRenderState};
pub use render_data::{build_render_lists, TileRenderList};

use bevy::prelude::*;

use resources::{TileRenderAssets, TilemapRenderConfig};
use systems::{
    cleanup_batches_on_tilemap_removed,
    invalidate_cache_on_catalog_change,
    mark_dirty_on_tiles_changed,
    mark_dirty_on_transform_changed,
    rebuild_dirty_tilemaps,
};

pub struct TilemapRenderPlugin;
impl Plugin for TilemapRenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TileRenderAssets>()
            .init_resource::<TilemapRenderConfig>()
            .add_systems(
                PostUpdate,
                (
                    invalidate_cache_on_catalog_change,
                    mark_dirty_on_tiles_changed,
                    mark_dirty_on_transform_changed,
                    rebuild_dirty_tilemaps,
                    cleanup_batches_on_tilemap_removed,
                )
                    .chain()
                    .after(bevy::transform::TransformSystem::TransformPropagate),
            );
    }
}
