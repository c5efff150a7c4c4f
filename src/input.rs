// src/input.rs
//! Keyboard shortcuts driving the edit session (demo tool).
//!
//! 1-9 pick a tile type, R turns it, F fills the ground layer, X clears it,
//! Backspace clears everything, Ctrl+S saves the map back under `assets/`.

use bevy::input::{keyboard::KeyCode, ButtonInput};
use bevy::prelude::*;

use tilemap3d::tilemap::catalog::TileCatalog;
use tilemap3d::tilemap::core::{CellBounds, FootprintLookup, TileType, TileTypeId};
use tilemap3d::tilemap::editor::TilemapEditor;
use tilemap3d::tilemap::persist::save_tilemap;
use tilemap3d::tilemap::plugin::{TileCatalogHandle, TilemapSettings};

const DIGITS: [KeyCode; 9] = [
    KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3,
    KeyCode::Digit4, KeyCode::Digit5, KeyCode::Digit6,
    KeyCode::Digit7, KeyCode::Digit8, KeyCode::Digit9,
];

/// Currently selected tile and rotation.
#[derive(Resource, Default)]
pub struct ToolState {
    pub tile: TileTypeId,
    pub rotation: u8,
}

impl ToolState {
    /// Selected rotation as applied to `tile`; fixed tiles are never turned.
    pub fn rotation_for(&self, tile: &TileType) -> u8 {
        tile.footprint.effective_rotation(self.rotation)
    }
}

pub fn tool_selection_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut tool: ResMut<ToolState>,
) {
    for (i, key) in DIGITS.iter().enumerate() {
        if keys.just_pressed(*key) {
            tool.tile = TileTypeId(i as u32);
            info!("Tool: tile {:?}", tool.tile);
        }
    }
    if keys.just_pressed(KeyCode::KeyR) {
        tool.rotation = (tool.rotation + 1) % 4;
        info!("Tool: rotation {}", tool.rotation);
    }
}

pub fn edit_shortcuts_system(
    keys: Res<ButtonInput<KeyCode>>,
    tool: Res<ToolState>,
    mut editor: ResMut<TilemapEditor>,
    catalogs: Res<Assets<TileCatalog>>,
    handle: Res<TileCatalogHandle>,
    settings: Res<TilemapSettings>,
) {
    let Some(catalog) = catalogs.get(&handle.0) else { return };
    let Some(builder) = editor.builder_mut() else { return };

    let rect = builder.tilemap().rect;
    let ground = CellBounds::new(
        IVec3::new(rect.min.x, 0, rect.min.y),
        IVec3::new(rect.size.x, 1, rect.size.y),
    );

    if keys.just_pressed(KeyCode::KeyF) {
        match catalog.tile_type(tool.tile) {
            Some(tile) => {
                let placed = builder.fill_region(&tile, tool.rotation_for(&tile), &ground);
                info!("Tool: placed {placed} tiles");
            }
            None => warn!("Tool: tile {:?} is not in the catalog", tool.tile),
        }
    }
    if keys.just_pressed(KeyCode::KeyX) && !builder.remove_region(&ground) {
        info!("Tool: ground layer already empty");
    }
    if keys.just_pressed(KeyCode::Backspace) {
        builder.clear();
    }

    let ctrl = keys.pressed(KeyCode::ControlLeft) || keys.pressed(KeyCode::ControlRight);
    if ctrl && keys.just_pressed(KeyCode::KeyS) {
        let path = format!("assets/{}", settings.tilemap_path);
        if let Err(e) = save_tilemap(&path, builder.tilemap(), catalog) {
            error!("Tool: saving '{path}' failed: {e}");
        }
    }
}
