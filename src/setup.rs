use bevy::prelude::*;

pub fn setup(
    mut commands: Commands,
) {
    // 1) Light
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(8.0, 16.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // 2) Camera, looking at the middle of the default 32x32 map
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(-8.0, 24.0, 48.0).looking_at(Vec3::new(16.0, 0.0, 16.0), Vec3::Y),
    ));
}
