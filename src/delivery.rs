use bevy::prelude::*;

use crate::contacts::Tag;

#[derive(Resource, Clone, Debug)]
pub struct DeliverySettings {
    /// Seconds a picked-up package lingers before it is removed.
    pub pickup_duration: f32,
    pub cue_interval: f32,
    pub cue_lifespan: f32,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            pickup_duration: 0.5,
            cue_interval: 0.04,
            cue_lifespan: 0.8,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DeliveryState {
    #[default]
    Idle,
    Carrying,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum DeliveryEffect {
    RemovePackage { delay: f32 },
    StartCue,
    StopCue,
    RejectedPickup,
}

/// Tracks whether the owner holds a package. At most one is ever held and
/// nothing about which package it was is kept.
#[derive(Component, Clone, Debug, Default)]
pub struct DeliveryTracker {
    has_package: bool,
    pickup_duration: f32,
    delivered: u32,
}

impl DeliveryTracker {
    pub fn new(pickup_duration: f32) -> Self {
        Self {
            pickup_duration,
            ..default()
        }
    }

    pub fn has_package(&self) -> bool {
        self.has_package
    }

    pub fn delivered(&self) -> u32 {
        self.delivered
    }

    pub fn state(&self) -> DeliveryState {
        if self.has_package() {
            DeliveryState::Carrying
        } else {
            DeliveryState::Idle
        }
    }

    pub fn set_pickup_duration(&mut self, seconds: f32) {
        self.pickup_duration = seconds;
    }

    // Package and Customer are checked independently, in that order.
    pub fn on_trigger_enter(&mut self, tag: &Tag) -> Vec<DeliveryEffect> {
        let mut effects = Vec::new();

        if *tag == Tag::Package {
            if self.has_package {
                warn!("Already carrying a package, pickup ignored");
                effects.push(DeliveryEffect::RejectedPickup);
            } else {
                info!("Package picked up");
                self.has_package = true;
                effects.push(DeliveryEffect::RemovePackage {
                    delay: self.pickup_duration,
                });
                effects.push(DeliveryEffect::StartCue);
            }
        }

        if *tag == Tag::Customer && self.has_package {
            self.has_package = false;
            self.delivered += 1;
            info!("Package delivered ({} so far)", self.delivered);
            effects.push(DeliveryEffect::StopCue);
        }

        effects
    }
}
