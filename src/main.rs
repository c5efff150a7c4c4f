use bevy::prelude::*;

mod input;
mod setup;

use input::{edit_shortcuts_system, tool_selection_system, ToolState};
use tilemap3d::TilemapStackPlugin;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        // catalog + map assets, edit session, batched tile rendering
        .add_plugins(TilemapStackPlugin)
        .init_resource::<ToolState>()
        // camera, light
        .add_systems(Startup, setup::setup)
        .add_systems(Update, (tool_selection_system, edit_shortcuts_system).chain())
        .run();
}
