use bevy::diagnostic::{DiagnosticsStore, EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin};

use crate::deferred::DespawnQueue;
use crate::delivery::{DeliverySettings, DeliveryState, DeliveryTracker};
use crate::sim::{ResetEvent, SimSettings};
use crate::vehicle::{heading_degrees, Driver, DriverProfile, DriverSettings};

pub struct UiPlugin;
impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .add_systems(Update, (ui_system, help_window, diagnostics_window));
    }
}

fn ui_system(
    mut contexts: EguiContexts,
    mut settings: ResMut<SimSettings>,
    mut driver_settings: ResMut<DriverSettings>,
    mut delivery_settings: ResMut<DeliverySettings>,
    player_q: Query<(&Driver, &DeliveryTracker, &Transform)>,
    queue: Res<DespawnQueue>,
    mut ev_reset: EventWriter<ResetEvent>,
) {
    egui::Window::new("Courier").show(contexts.ctx_mut(), |ui| {
        if let Ok((driver, tracker, t)) = player_q.get_single() {
            ui.label(format!(
                "Speed: {:.2}{}",
                driver.current_speed,
                if driver.is_boosted() { "  (boost)" } else { "" }
            ));
            ui.label(format!(
                "Position: ({:.1}, {:.1})  Heading: {:.0}°",
                t.translation.x,
                t.translation.y,
                heading_degrees(t)
            ));
            let status = match tracker.state() {
                DeliveryState::Idle => "Looking for a package",
                DeliveryState::Carrying => "Carrying a package",
            };
            ui.label(status);
            ui.label(format!("Delivered: {}", tracker.delivered()));
        }
        if !queue.is_empty() {
            ui.label(format!("Pending removals: {}", queue.len()));
        }

        ui.separator();

        ui.checkbox(&mut settings.running, "Running");

        let mut profile = driver_settings.profile;
        egui::ComboBox::from_label("Driving")
            .selected_text(format!("{:?}", profile))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut profile, DriverProfile::Scaled, "Scaled");
                ui.selectable_value(&mut profile, DriverProfile::Classic, "Classic");
            });
        if profile != driver_settings.profile {
            *driver_settings = DriverSettings::from_profile(profile);
        }

        let top = match driver_settings.profile {
            DriverProfile::Classic => 0.1,
            DriverProfile::Scaled => 30.0,
        };
        ui.add(egui::Slider::new(&mut driver_settings.regular_speed, 0.0..=top).text("Speed"));
        ui.add(egui::Slider::new(&mut driver_settings.boost_speed, 0.0..=top * 2.0).text("Boost"));
        ui.add(
            egui::Slider::new(&mut driver_settings.steer_speed, 0.0..=top * 20.0).text("Steering"),
        );

        ui.separator();

        ui.add(
            egui::Slider::new(&mut delivery_settings.pickup_duration, 0.0..=3.0)
                .text("Pickup duration (s)"),
        );

        ui.separator();

        ui.checkbox(&mut settings.deterministic, "Deterministic layout");
        if settings.deterministic {
            ui.add(egui::DragValue::new(&mut settings.seed).prefix("Seed: "));
        }
        if ui.button("New level").clicked() {
            ev_reset.send(ResetEvent);
        }
    });
}

fn help_window(mut contexts: EguiContexts, settings: Res<SimSettings>) {
    if !settings.show_help {
        return;
    }
    egui::Window::new("Help").show(contexts.ctx_mut(), |ui| {
        ui.label("W/S or Up/Down: Drive");
        ui.label("A/D or Left/Right: Steer");
        ui.label("Orange: package, green: customer");
        ui.label("Blue: boost, lost on the next crash");
        ui.label("F: Toggle Camera Follow");
        ui.label("Space: Pause");
        ui.label("R: New Level");
        ui.label("H: Toggle Help");
        ui.label("F3: Diagnostics");
        ui.label("Mouse Wheel: Zoom");
    });
}

fn diagnostics_window(
    mut contexts: EguiContexts,
    settings: Res<SimSettings>,
    diagnostics: Res<DiagnosticsStore>,
) {
    if !settings.show_diagnostics {
        return;
    }
    egui::Window::new("Diagnostics").show(contexts.ctx_mut(), |ui| {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                ui.label(format!("FPS: {:.1}", value));
            }
        }
        if let Some(entity_count) = diagnostics.get(&EntityCountDiagnosticsPlugin::ENTITY_COUNT) {
            if let Some(value) = entity_count.value() {
                ui.label(format!("Entities: {}", value));
            }
        }
    });
}
