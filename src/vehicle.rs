use bevy::prelude::*;

use crate::contacts::Tag;
use crate::input::InputSnapshot;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DriverProfile {
    /// Fixed per-frame steps, no boost worth speaking of.
    Classic,
    #[default]
    Scaled,
}

#[derive(Resource, Clone, Debug)]
pub struct DriverSettings {
    pub profile: DriverProfile,
    pub regular_speed: f32,
    pub boost_speed: f32,
    /// Degrees per second (or per frame when not time scaled).
    pub steer_speed: f32,
    /// When false every frame counts as `dt = 1`.
    pub time_scaled: bool,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self::from_profile(DriverProfile::default())
    }
}

impl DriverSettings {
    pub fn from_profile(profile: DriverProfile) -> Self {
        match profile {
            DriverProfile::Classic => Self {
                profile,
                regular_speed: 0.01,
                boost_speed: 0.02,
                steer_speed: 0.5,
                time_scaled: false,
            },
            DriverProfile::Scaled => Self {
                profile,
                regular_speed: 5.0,
                boost_speed: 10.0,
                steer_speed: 200.0,
                time_scaled: true,
            },
        }
    }

    pub fn frame_dt(&self, delta_seconds: f32) -> f32 {
        if self.time_scaled {
            delta_seconds
        } else {
            1.0
        }
    }
}

/// Pose delta produced by one tick: a forward distance along the local up
/// axis and a rotation about +Z, applied in that order.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Motion {
    pub forward: f32,
    pub steer_degrees: f32,
}

#[derive(Component, Clone, Debug)]
pub struct Driver {
    pub current_speed: f32,
    pub regular_speed: f32,
    pub boost_speed: f32,
    pub steer_speed: f32,
    is_boosted: bool,
}

impl Driver {
    pub fn new(settings: &DriverSettings) -> Self {
        Self {
            current_speed: settings.regular_speed,
            regular_speed: settings.regular_speed,
            boost_speed: settings.boost_speed,
            steer_speed: settings.steer_speed,
            is_boosted: false,
        }
    }

    pub fn is_boosted(&self) -> bool {
        self.is_boosted
    }

    /// Takes new tuning values without dropping an active boost.
    pub fn apply_settings(&mut self, settings: &DriverSettings) {
        self.regular_speed = settings.regular_speed;
        self.boost_speed = settings.boost_speed;
        self.steer_speed = settings.steer_speed;
        self.current_speed = if self.is_boosted {
            self.boost_speed
        } else {
            self.regular_speed
        };
    }

    pub fn on_tick(&self, input: InputSnapshot, dt: f32) -> Motion {
        Motion {
            forward: f32::from(input.move_axis) * self.current_speed * dt,
            steer_degrees: f32::from(input.steer_axis) * self.steer_speed * dt,
        }
    }

    /// Returns true when the overlapped pickup was consumed and should be
    /// despawned.
    pub fn on_trigger_enter(&mut self, tag: &Tag) -> bool {
        if *tag != Tag::Boost || self.is_boosted {
            return false;
        }
        self.current_speed = self.boost_speed;
        self.is_boosted = true;
        debug!("boost active, speed {}", self.current_speed);
        true
    }

    /// Any solid contact ends the boost. Returns true if one was active.
    pub fn on_collision_enter(&mut self) -> bool {
        if !self.is_boosted {
            return false;
        }
        self.current_speed = self.regular_speed;
        self.is_boosted = false;
        debug!("boost lost on impact, speed {}", self.current_speed);
        true
    }
}

pub fn apply_motion(t: &mut Transform, motion: Motion) {
    let forward = t.rotation * Vec3::Y;
    t.translation += forward * motion.forward;
    t.rotate_z(motion.steer_degrees.to_radians());
}

pub fn heading_degrees(t: &Transform) -> f32 {
    t.rotation.to_euler(EulerRot::XYZ).2.to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: InputSnapshot = InputSnapshot {
        move_axis: 1,
        steer_axis: 1,
    };

    #[test]
    fn idle_input_leaves_pose_untouched() {
        let driver = Driver::new(&DriverSettings::default());
        let mut t = Transform::default();
        apply_motion(&mut t, driver.on_tick(InputSnapshot::default(), 0.016));

        assert_eq!(t.translation, Vec3::ZERO);
        assert_eq!(heading_degrees(&t), 0.0);
    }

    #[test]
    fn classic_single_tick() {
        let settings = DriverSettings::from_profile(DriverProfile::Classic);
        let driver = Driver::new(&settings);
        let mut t = Transform::default();
        let motion = driver.on_tick(FULL, settings.frame_dt(0.25));
        apply_motion(&mut t, motion);

        assert!((t.translation.y - 0.01).abs() < 1e-6);
        assert!(t.translation.x.abs() < 1e-6);
        assert!((heading_degrees(&t) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn translation_happens_before_rotation() {
        let driver = Driver::new(&DriverSettings::default());
        let mut t = Transform::default();
        apply_motion(
            &mut t,
            Motion {
                forward: 1.0,
                steer_degrees: 90.0,
            },
        );
        // Moved along the old heading, then turned.
        assert!(t.translation.x.abs() < 1e-5);
        assert!((t.translation.y - 1.0).abs() < 1e-5);
        assert!((heading_degrees(&t) - 90.0).abs() < 1e-3);

        let reverse = driver.on_tick(
            InputSnapshot {
                move_axis: -1,
                steer_axis: -1,
            },
            0.5,
        );
        assert_eq!(reverse.forward, -2.5);
        assert_eq!(reverse.steer_degrees, -100.0);
    }

    #[test]
    fn integration_is_linear_in_ticks() {
        let driver = Driver::new(&DriverSettings::default());
        let dt = 0.01;
        let input = InputSnapshot {
            move_axis: 1,
            steer_axis: 0,
        };
        for n in [0_u32, 1, 7, 40] {
            let mut t = Transform::default();
            for _ in 0..n {
                apply_motion(&mut t, driver.on_tick(input, dt));
            }
            let expected = n as f32 * driver.current_speed * dt;
            assert!((t.translation.y - expected).abs() < 1e-4, "n = {n}");
        }

        let turn = InputSnapshot {
            move_axis: 0,
            steer_axis: 1,
        };
        let mut total = 0.0;
        for _ in 0..5 {
            total += driver.on_tick(turn, dt).steer_degrees;
        }
        assert!((total - 5.0 * driver.steer_speed * dt).abs() < 1e-4);
    }

    #[test]
    fn boost_is_idempotent_until_collision() {
        let mut driver = Driver::new(&DriverSettings::default());
        assert!(driver.on_trigger_enter(&Tag::Boost));
        assert_eq!(driver.current_speed, driver.boost_speed);
        assert!(driver.is_boosted());

        assert!(!driver.on_trigger_enter(&Tag::Boost));
        assert!(!driver.on_trigger_enter(&Tag::Boost));
        assert_eq!(driver.current_speed, driver.boost_speed);

        assert!(driver.on_collision_enter());
        assert_eq!(driver.current_speed, driver.regular_speed);
        assert!(!driver.is_boosted());
    }

    #[test]
    fn collision_without_boost_is_noop() {
        let mut driver = Driver::new(&DriverSettings::default());
        assert!(!driver.on_collision_enter());
        assert_eq!(driver.current_speed, 5.0);
    }

    #[test]
    fn other_tags_do_not_boost() {
        let mut driver = Driver::new(&DriverSettings::default());
        for tag in [Tag::Package, Tag::Customer, Tag::Other("boost".into())] {
            assert!(!driver.on_trigger_enter(&tag));
        }
        assert!(!driver.is_boosted());
    }

    #[test]
    fn retuning_keeps_boost() {
        let mut driver = Driver::new(&DriverSettings::default());
        driver.on_trigger_enter(&Tag::Boost);

        let mut settings = DriverSettings::default();
        settings.boost_speed = 12.0;
        driver.apply_settings(&settings);
        assert!(driver.is_boosted());
        assert_eq!(driver.current_speed, 12.0);
    }
}
