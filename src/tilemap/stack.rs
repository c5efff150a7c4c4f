// src/tilemap/stack.rs
use bevy::prelude::*;
use crate::tilemap::catalog::TileCatalogAssetPlugin;
use crate::tilemap::persist::TilemapAssetPlugin;
use crate::tilemap::plugin::TilemapPlugin;
use crate::tilemap::rendering::TilemapRenderPlugin;

pub struct TilemapStackPlugin;
impl Plugin for TilemapStackPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(TileCatalogAssetPlugin) // *.tiles.ron
           .add_plugins(TilemapAssetPlugin)     // *.tilemap.ron
           .add_plugins(TilemapPlugin)          // settings + spawn + edit session
           .add_plugins(TilemapRenderPlugin);   // batches / per-instance draws
    }
}
