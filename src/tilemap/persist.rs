// src/tilemap/persist.rs
//! Saved form of a tilemap (`*.tilemap.ron`). Tiles are referenced by catalog
//! name so a map survives catalog reordering.

use bevy::asset::{io::Reader, AssetLoader, LoadContext};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::catalog::TileCatalog;
use super::core::{MapRect, TilePose};
use super::error::{Result, TilemapError};
use super::state::{TileInstances, Tilemap};

// ---------- Public plugin to register asset+loader ----------

pub struct TilemapAssetPlugin;

impl Plugin for TilemapAssetPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<TilemapDef>()
            .register_asset_loader(TilemapDefLoader);
    }
}

// ---------- Data form ----------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileInstancesDef {
    pub tile: String,
    pub poses: Vec<TilePose>,
}

#[derive(Asset, TypePath, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TilemapDef {
    #[serde(default)]
    pub rect: MapRect,
    #[serde(default)]
    pub tiles: Vec<TileInstancesDef>,
}

impl TilemapDef {
    /// Resolves tile names against `catalog`. Empty groups are dropped.
    pub fn resolve(&self, catalog: &TileCatalog) -> Result<Tilemap> {
        let mut tilemap = Tilemap::new(self.rect);
        for group in &self.tiles {
            let tile = catalog
                .index_of(&group.tile)
                .ok_or_else(|| TilemapError::UnknownTileName(group.tile.clone()))?;
            if group.poses.is_empty() {
                continue;
            }
            match tilemap.tiles.iter_mut().find(|i| i.tile == tile) {
                Some(existing) => existing.poses.extend_from_slice(&group.poses),
                None => tilemap.tiles.push(TileInstances { tile, poses: group.poses.clone() }),
            }
        }
        Ok(tilemap)
    }

    pub fn from_tilemap(tilemap: &Tilemap, catalog: &TileCatalog) -> Result<Self> {
        let tiles = tilemap
            .tiles
            .iter()
            .map(|i| {
                let name = catalog.name_of(i.tile).ok_or(TilemapError::UnknownTile(i.tile))?;
                Ok(TileInstancesDef { tile: name.to_string(), poses: i.poses.clone() })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rect: tilemap.rect, tiles })
    }

    pub fn to_ron(&self) -> std::result::Result<String, TilemapLoadError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| TilemapLoadError::Ron(e.to_string()))
    }
}

/// Writes `tilemap` as pretty RON.
pub fn save_tilemap(
    path: impl AsRef<Path>,
    tilemap: &Tilemap,
    catalog: &TileCatalog,
) -> std::result::Result<(), TilemapLoadError> {
    let def = TilemapDef::from_tilemap(tilemap, catalog)?;
    std::fs::write(path.as_ref(), def.to_ron()?)?;
    info!("Tilemap: saved {} tiles to {}", tilemap.instance_count(), path.as_ref().display());
    Ok(())
}

// ---------- Asset loader for `.tilemap.ron` ----------

#[derive(Default)]
pub struct TilemapDefLoader;

impl AssetLoader for TilemapDefLoader {
    type Asset = TilemapDef;
    type Settings = ();
    type Error = TilemapLoadError;

    fn extensions(&self) -> &[&str] {
        &["tilemap.ron"]
    }

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _load_context: &mut LoadContext<'_>,
    ) -> std::result::Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        ron::de::from_bytes(&bytes).map_err(|e| TilemapLoadError::Ron(e.to_string()))
    }
}

// ---------- Loader errors ----------

#[derive(thiserror::Error, Debug)]
pub enum TilemapLoadError {
    #[error("I/O while reading or writing tilemap: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(String),
    #[error(transparent)]
    Tilemap(#[from] TilemapError),
}
