mod contacts;
mod deferred;
mod delivery;
mod input;
mod sim;
mod ui;
mod vehicle;

use bevy::core_pipeline::bloom::BloomSettings;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::diagnostic::{EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use input::InputPlugin;
use sim::SimPlugin;
use ui::UiPlugin;

/// World units are metres-ish; the camera shows 32 px per unit.
const PIXELS_PER_UNIT: f32 = 32.0;

fn main() {
    App::new()
        .insert_resource(ClearColor(Color::srgb(0.16, 0.2, 0.14)))
        .insert_resource(Msaa::Sample4)
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_plugins(EntityCountDiagnosticsPlugin)
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "courier2d-rs: top-down delivery".into(),
                resolution: (1400., 900.).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins((SimPlugin, UiPlugin, InputPlugin))
        .add_systems(Startup, setup_camera)
        .run();
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((
        Camera2dBundle {
            camera: Camera {
                hdr: true,
                ..default()
            },
            tonemapping: Tonemapping::TonyMcMapface,
            transform: Transform::from_xyz(0.0, 0.0, 999.0)
                .with_scale(Vec3::new(1.0 / PIXELS_PER_UNIT, 1.0 / PIXELS_PER_UNIT, 1.0)),
            ..default()
        },
        BloomSettings::default(),
        MainCamera,
    ));
}

#[derive(Component)]
pub struct MainCamera;
