// src/tilemap/rendering/resources.rs

use bevy::prelude::*;
use std::collections::HashMap;

use crate::tilemap::catalog::TileCatalog;
use crate::tilemap::core::TileTypeId;

/// Mesh + material handles per (catalog, tile, material slot), resolved once.
#[derive(Resource, Default)]
pub struct TileRenderAssets {
    pub by_key: HashMap<(AssetId<TileCatalog>, TileTypeId, usize), (Handle<Mesh>, Handle<StandardMaterial>)>,
}

#[derive(Resource)]
pub struct TilemapRenderConfig {
    /// Tilemaps rebuilt per frame at most.
    pub max_rebuilds_per_frame: usize,
}
impl Default for TilemapRenderConfig {
    fn default() -> Self {
        Self { max_rebuilds_per_frame: 1 }
    }
}
