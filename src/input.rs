use crate::sim::{ResetEvent, SimSettings};
use crate::vehicle::Driver;
use crate::MainCamera;
use bevy::input::mouse::MouseWheel;
use bevy::prelude::*;

/// Two keys per direction: arrows and WASD.
#[derive(Resource, Clone, Debug)]
pub struct Keybinds {
    pub forward: [KeyCode; 2],
    pub back: [KeyCode; 2],
    pub left: [KeyCode; 2],
    pub right: [KeyCode; 2],
}

impl Default for Keybinds {
    fn default() -> Self {
        Self {
            forward: [KeyCode::ArrowUp, KeyCode::KeyW],
            back: [KeyCode::ArrowDown, KeyCode::KeyS],
            left: [KeyCode::ArrowLeft, KeyCode::KeyA],
            right: [KeyCode::ArrowRight, KeyCode::KeyD],
        }
    }
}

/// Movement axes for the current frame, each in {-1, 0, +1}.
#[derive(Resource, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct InputSnapshot {
    pub move_axis: i8,
    pub steer_axis: i8,
}

impl InputSnapshot {
    /// Forward wins over back and left wins over right when both are held.
    pub fn from_axes(forward: bool, back: bool, left: bool, right: bool) -> Self {
        let move_axis = if forward {
            1
        } else if back {
            -1
        } else {
            0
        };
        let steer_axis = if left {
            1
        } else if right {
            -1
        } else {
            0
        };
        Self {
            move_axis,
            steer_axis,
        }
    }

    pub fn read(keys: &ButtonInput<KeyCode>, binds: &Keybinds) -> Self {
        let held = |codes: &[KeyCode; 2]| keys.any_pressed(codes.iter().copied());
        Self::from_axes(
            held(&binds.forward),
            held(&binds.back),
            held(&binds.left),
            held(&binds.right),
        )
    }
}

pub struct InputPlugin;
impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Keybinds>()
            .init_resource::<InputSnapshot>()
            .add_systems(
                Update,
                (
                    read_drive_input,
                    camera_controls,
                    pause_toggle,
                    follow_toggle,
                    reset_trigger,
                    help_toggle,
                    diagnostics_toggle,
                ),
            );
    }
}

pub fn read_drive_input(
    keys: Res<ButtonInput<KeyCode>>,
    binds: Res<Keybinds>,
    mut snapshot: ResMut<InputSnapshot>,
) {
    let next = InputSnapshot::read(&keys, &binds);
    if *snapshot != next {
        *snapshot = next;
    }
}

fn camera_controls(
    mut scroll_evr: EventReader<MouseWheel>,
    mut q_cam: Query<&mut Transform, With<MainCamera>>,
    player_q: Query<&Transform, (With<Driver>, Without<MainCamera>)>,
    settings: Res<SimSettings>,
    time: Res<Time>,
) {
    let Ok(mut t) = q_cam.get_single_mut() else {
        return;
    };

    for ev in scroll_evr.read() {
        let zoom = 1.0 - ev.y * 0.05;
        // Depth stays unscaled so the far plane does not close in.
        let s = (t.scale.x * zoom).clamp(0.005, 0.2);
        t.scale = Vec3::new(s, s, 1.0);
    }

    if settings.follow_player {
        if let Ok(player_transform) = player_q.get_single() {
            let lerp_factor = (1.0 - (-4.0 * time.delta_seconds()).exp()).clamp(0.0, 1.0);
            let target_pos = player_transform.translation.truncate();
            let new_pos = t.translation.truncate().lerp(target_pos, lerp_factor);
            t.translation.x = new_pos.x;
            t.translation.y = new_pos.y;
        }
    }

    t.translation.z = 999.0;
}

fn pause_toggle(mut settings: ResMut<SimSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::Space) {
        settings.running = !settings.running;
    }
}

fn follow_toggle(mut settings: ResMut<SimSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyF) {
        settings.follow_player = !settings.follow_player;
    }
}

fn reset_trigger(mut ev_reset: EventWriter<ResetEvent>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyR) {
        ev_reset.send(ResetEvent);
    }
}

fn help_toggle(mut settings: ResMut<SimSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyH) {
        settings.show_help = !settings.show_help;
    }
}

fn diagnostics_toggle(mut settings: ResMut<SimSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::F3) {
        settings.show_diagnostics = !settings.show_diagnostics;
    }
}
