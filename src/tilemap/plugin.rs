//! Tilemap plugin wiring (glue).
//! - Catalog + tilemap assets
//! - Settings
//! - Spawn the tilemap entity once both assets are ready, open it for editing
//! - Edit session sync

use bevy::prelude::*;

use super::catalog::TileCatalog;
use super::editor::{sync_edited_tilemap, TilemapEditor, TilesChanged};
use super::persist::TilemapDef;
use super::rendering::TilemapRenderState;

/// Where the catalog and the map live, and whether the map opens for editing.
#[derive(Resource, Clone)]
pub struct TilemapSettings {
    pub catalog_path: String,
    pub tilemap_path: String,
    pub open_for_editing: bool,
}
impl Default for TilemapSettings {
    fn default() -> Self {
        Self {
            catalog_path: "tiles/catalog.tiles.ron".to_string(),
            tilemap_path: "maps/demo.tilemap.ron".to_string(),
            open_for_editing: true,
        }
    }
}

/// Handle to the loaded TileCatalog asset.
#[derive(Resource, Default)]
pub struct TileCatalogHandle(pub Handle<TileCatalog>);

/// Handle to the saved tilemap being shown.
#[derive(Resource, Default)]
pub struct TilemapDefHandle(pub Handle<TilemapDef>);

/// Marks the entity spawned from [`TilemapSettings::tilemap_path`].
#[derive(Component)]
pub struct LoadedTilemap;

pub struct TilemapPlugin;
impl Plugin for TilemapPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TilemapSettings>()
            .init_resource::<TileCatalogHandle>()
            .init_resource::<TilemapDefHandle>()
            .init_resource::<TilemapEditor>()
            .add_event::<TilesChanged>()
            .add_systems(Startup, load_assets)
            .add_systems(Update, (spawn_tilemap_when_ready, sync_edited_tilemap).chain());
    }
}

/// Startup: request loading the catalog and the map, store handles.
fn load_assets(
    mut catalog: ResMut<TileCatalogHandle>,
    mut map: ResMut<TilemapDefHandle>,
    settings: Res<TilemapSettings>,
    assets: Res<AssetServer>,
) {
    if !catalog.0.is_strong() {
        catalog.0 = assets.load(settings.catalog_path.as_str());
    }
    if !map.0.is_strong() {
        map.0 = assets.load(settings.tilemap_path.as_str());
    }
    info!(
        "Tilemap: loading catalog '{}' and map '{}'",
        settings.catalog_path, settings.tilemap_path
    );
}

/// Update: once both assets are in, spawn the map entity and open the session.
fn spawn_tilemap_when_ready(
    mut commands: Commands,
    catalog_handle: Res<TileCatalogHandle>,
    map_handle: Res<TilemapDefHandle>,
    catalogs: Res<Assets<TileCatalog>>,
    defs: Res<Assets<TilemapDef>>,
    settings: Res<TilemapSettings>,
    mut editor: ResMut<TilemapEditor>,
    mut done: Local<bool>,
) {
    if *done { return; }
    let (Some(catalog), Some(def)) = (catalogs.get(&catalog_handle.0), defs.get(&map_handle.0)) else {
        return;
    };
    *done = true;

    let tilemap = match def.resolve(catalog) {
        Ok(t) => t,
        Err(e) => {
            error!("Tilemap: cannot resolve '{}': {e}", settings.tilemap_path);
            return;
        }
    };
    info!(
        "Tilemap: catalog ready ({} tile types), map has {} tiles",
        catalog.len(),
        tilemap.instance_count()
    );

    let entity = commands
        .spawn((
            tilemap.clone(),
            LoadedTilemap,
            TilemapRenderState::default(),
            Transform::default(),
            Visibility::default(),
            Name::new("Tilemap"),
        ))
        .id();

    if settings.open_for_editing {
        if let Err(e) = editor.open(entity, tilemap, catalog) {
            error!("Tilemap: '{}' is corrupt, not opening for editing: {e}", settings.tilemap_path);
        }
    }
}
