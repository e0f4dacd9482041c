use bevy::prelude::*;
use rand::{Rng, RngCore, SeedableRng};

use crate::contacts::{
    detect_contacts, log_contacts, Collected, Collider, CollisionEntered, ContactSensor, Tag,
    TriggerEntered,
};
use crate::deferred::{process_despawn_queue, DespawnQueue};
use crate::delivery::{DeliveryEffect, DeliverySettings, DeliveryTracker};
use crate::input::{read_drive_input, InputSnapshot};
use crate::vehicle::{apply_motion, Driver, DriverSettings};

pub struct SimPlugin;
impl Plugin for SimPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimSettings>()
            .init_resource::<DriverSettings>()
            .init_resource::<DeliverySettings>()
            .init_resource::<DespawnQueue>()
            .init_resource::<SimClock>()
            .init_resource::<InputSnapshot>()
            .add_event::<TriggerEntered>()
            .add_event::<CollisionEntered>()
            .add_event::<ResetEvent>()
            .add_systems(Startup, spawn_level)
            .add_systems(Update, (sync_settings, handle_reset.after(update_particles)))
            .add_systems(
                Update,
                (
                    tick_sim_clock,
                    drive_vehicle,
                    detect_contacts,
                    log_contacts,
                    // Collisions from this pass end the old boost, not a fresh one.
                    end_boost_on_collision,
                    apply_boost_pickups,
                    track_deliveries,
                    process_despawn_queue,
                    emit_cue_particles,
                    update_particles,
                )
                    .chain()
                    .after(read_drive_input)
                    .run_if(sim_running),
            );
    }
}

#[derive(Event, Default)]
pub struct ResetEvent;

/// Seconds of simulated play. Stands still while the sim is paused.
#[derive(Resource, Default, Debug)]
pub struct SimClock {
    elapsed: f32,
}

impl SimClock {
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

#[derive(Resource, Clone)]
pub struct SimSettings {
    pub running: bool,
    pub follow_player: bool,
    pub show_help: bool,
    pub show_diagnostics: bool,
    pub deterministic: bool,
    pub seed: u64,
    /// Props are scattered inside a square of this half size.
    pub half_extent: f32,
    /// No props closer than this to the spawn point.
    pub spawn_clearance: f32,
    pub obstacles: usize,
    pub packages: usize,
    pub customers: usize,
    pub boosts: usize,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            running: true,
            follow_player: true,
            show_help: true,
            show_diagnostics: false,
            deterministic: false,
            seed: 0,
            half_extent: 30.0,
            spawn_clearance: 4.0,
            obstacles: 25,
            packages: 6,
            customers: 4,
            boosts: 5,
        }
    }
}

/// Anything cleared and respawned on reset.
#[derive(Component)]
pub struct LevelEntity;

/// Start/stop switch for the trail shown while a package is carried.
#[derive(Component)]
pub struct PackageCue {
    pub playing: bool,
    timer: Timer,
}

impl PackageCue {
    pub fn new(interval: f32) -> Self {
        Self {
            playing: false,
            timer: Timer::from_seconds(interval, TimerMode::Repeating),
        }
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.timer.reset();
    }
}

#[derive(Component)]
pub struct Particle {
    pub lifespan: f32,
}

fn sim_running(settings: Res<SimSettings>) -> bool {
    settings.running
}

fn tick_sim_clock(time: Res<Time>, mut clock: ResMut<SimClock>) {
    clock.elapsed += time.delta_seconds();
}

fn spawn_prop(
    commands: &mut Commands,
    name: &str,
    tag: Tag,
    collider: Collider,
    color: Color,
    pos: Vec2,
) {
    commands.spawn((
        Name::new(name.to_string()),
        tag,
        collider,
        LevelEntity,
        SpriteBundle {
            sprite: Sprite {
                color,
                custom_size: Some(Vec2::splat(collider.radius * 2.0)),
                ..default()
            },
            transform: Transform::from_translation(pos.extend(0.0)),
            ..default()
        },
    ));
}

fn spawn_car(
    commands: &mut Commands,
    driver_settings: &DriverSettings,
    delivery_settings: &DeliverySettings,
) {
    commands.spawn((
        Name::new("Car"),
        Driver::new(driver_settings),
        DeliveryTracker::new(delivery_settings.pickup_duration),
        PackageCue::new(delivery_settings.cue_interval),
        Collider::solid(0.5),
        ContactSensor::default(),
        LevelEntity,
        SpriteBundle {
            sprite: Sprite {
                color: Color::srgb(0.95, 0.95, 0.9),
                custom_size: Some(Vec2::new(0.7, 1.2)),
                ..default()
            },
            transform: Transform::from_xyz(0.0, 0.0, 1.0),
            ..default()
        },
    ));
}

const SPOT_ATTEMPTS: usize = 64;

fn random_spot<R: Rng>(rng: &mut R, settings: &SimSettings) -> Vec2 {
    let h = settings.half_extent.max(f32::EPSILON);
    for _ in 0..SPOT_ATTEMPTS {
        let p = Vec2::new(rng.gen_range(-h..h), rng.gen_range(-h..h));
        if p.length() >= settings.spawn_clearance {
            return p;
        }
    }
    // The square is too small for the clearance; sit on the clearance ring.
    Vec2::from_angle(rng.gen::<f32>() * std::f32::consts::TAU) * settings.spawn_clearance
}

fn spawn_level_inner(
    commands: &mut Commands,
    settings: &SimSettings,
    driver_settings: &DriverSettings,
    delivery_settings: &DeliverySettings,
) {
    let mut rng: Box<dyn RngCore> = if settings.deterministic {
        Box::new(rand::rngs::StdRng::seed_from_u64(settings.seed))
    } else {
        Box::new(rand::thread_rng())
    };

    spawn_car(commands, driver_settings, delivery_settings);

    for i in 0..settings.obstacles {
        let radius = rng.gen_range(0.6..1.6);
        let pos = random_spot(&mut rng, settings);
        spawn_prop(
            commands,
            &format!("Rock {i}"),
            Tag::Untagged,
            Collider::solid(radius),
            Color::srgb(0.35, 0.3, 0.28),
            pos,
        );
    }
    for i in 0..settings.packages {
        let pos = random_spot(&mut rng, settings);
        spawn_prop(
            commands,
            &format!("Package {i}"),
            Tag::Package,
            Collider::trigger(0.4),
            Color::srgb(0.85, 0.6, 0.25),
            pos,
        );
    }
    for i in 0..settings.customers {
        let pos = random_spot(&mut rng, settings);
        spawn_prop(
            commands,
            &format!("Customer {i}"),
            Tag::Customer,
            Collider::trigger(0.8),
            Color::srgb(0.3, 0.8, 0.45),
            pos,
        );
    }
    for i in 0..settings.boosts {
        let pos = random_spot(&mut rng, settings);
        spawn_prop(
            commands,
            &format!("Boost {i}"),
            Tag::Boost,
            Collider::trigger(0.35),
            Color::srgb(0.3, 0.6, 1.0),
            pos,
        );
    }

    info!(
        "level ready: {} rocks, {} packages, {} customers, {} boosts",
        settings.obstacles, settings.packages, settings.customers, settings.boosts
    );
}

pub fn spawn_level(
    mut commands: Commands,
    settings: Res<SimSettings>,
    driver_settings: Res<DriverSettings>,
    delivery_settings: Res<DeliverySettings>,
) {
    spawn_level_inner(&mut commands, &settings, &driver_settings, &delivery_settings);
}

fn handle_reset(
    mut commands: Commands,
    mut ev_reset: EventReader<ResetEvent>,
    level_q: Query<(Entity, Option<&Particle>), Or<(With<LevelEntity>, With<Particle>)>>,
    mut queue: ResMut<DespawnQueue>,
    settings: Res<SimSettings>,
    driver_settings: Res<DriverSettings>,
    delivery_settings: Res<DeliverySettings>,
) {
    if ev_reset.is_empty() {
        return;
    }
    ev_reset.clear();

    for (e, particle) in &level_q {
        // Expired particles were already despawned by update_particles.
        if particle.is_some_and(|p| p.lifespan <= 0.0) {
            continue;
        }
        commands.entity(e).despawn_recursive();
    }
    queue.clear();

    spawn_level_inner(&mut commands, &settings, &driver_settings, &delivery_settings);
}

fn sync_settings(
    driver_settings: Res<DriverSettings>,
    delivery_settings: Res<DeliverySettings>,
    mut drivers: Query<&mut Driver>,
    mut carriers: Query<(&mut DeliveryTracker, &mut PackageCue)>,
) {
    if driver_settings.is_changed() {
        for mut driver in &mut drivers {
            driver.apply_settings(&driver_settings);
        }
    }
    if delivery_settings.is_changed() {
        for (mut tracker, mut cue) in &mut carriers {
            tracker.set_pickup_duration(delivery_settings.pickup_duration);
            cue.timer
                .set_duration(std::time::Duration::from_secs_f32(delivery_settings.cue_interval));
        }
    }
}

pub fn drive_vehicle(
    time: Res<Time>,
    input: Res<InputSnapshot>,
    settings: Res<DriverSettings>,
    mut q: Query<(&Driver, &mut Transform)>,
) {
    let dt = settings.frame_dt(time.delta_seconds());
    for (driver, mut t) in &mut q {
        apply_motion(&mut t, driver.on_tick(*input, dt));
    }
}

pub fn apply_boost_pickups(
    mut commands: Commands,
    mut ev_trigger: EventReader<TriggerEntered>,
    mut drivers: Query<&mut Driver>,
) {
    for ev in ev_trigger.read() {
        let Ok(mut driver) = drivers.get_mut(ev.sensor) else {
            continue;
        };
        if driver.on_trigger_enter(&ev.tag) {
            if let Some(ec) = commands.get_entity(ev.other) {
                ec.despawn_recursive();
            }
        }
    }
}

pub fn end_boost_on_collision(
    mut ev_collision: EventReader<CollisionEntered>,
    mut drivers: Query<&mut Driver>,
) {
    for ev in ev_collision.read() {
        if let Ok(mut driver) = drivers.get_mut(ev.sensor) {
            driver.on_collision_enter();
        }
    }
}

pub fn track_deliveries(
    mut commands: Commands,
    clock: Res<SimClock>,
    mut queue: ResMut<DespawnQueue>,
    mut ev_trigger: EventReader<TriggerEntered>,
    mut carriers: Query<(&mut DeliveryTracker, &mut PackageCue)>,
) {
    for ev in ev_trigger.read() {
        let Ok((mut tracker, mut cue)) = carriers.get_mut(ev.sensor) else {
            continue;
        };
        for effect in tracker.on_trigger_enter(&ev.tag) {
            match effect {
                DeliveryEffect::RemovePackage { delay } => {
                    if let Some(mut ec) = commands.get_entity(ev.other) {
                        ec.try_insert(Collected);
                        queue.schedule(ev.other, ev.sensor, clock.elapsed(), delay);
                    }
                }
                DeliveryEffect::StartCue => cue.play(),
                DeliveryEffect::StopCue => {
                    cue.stop();
                    // A package still lingering from the pickup goes now.
                    for e in queue.flush_owner(ev.sensor) {
                        if let Some(ec) = commands.get_entity(e) {
                            ec.despawn_recursive();
                        }
                    }
                }
                DeliveryEffect::RejectedPickup => {}
            }
        }
    }
}

fn emit_cue_particles(
    mut commands: Commands,
    time: Res<Time>,
    settings: Res<DeliverySettings>,
    mut q: Query<(&Transform, &mut PackageCue)>,
) {
    for (t, mut cue) in &mut q {
        if !cue.playing {
            continue;
        }
        cue.timer.tick(time.delta());
        if !cue.timer.just_finished() {
            continue;
        }
        let behind = t.translation - (t.rotation * Vec3::Y) * 0.6;
        commands.spawn((
            SpriteBundle {
                transform: Transform::from_xyz(behind.x, behind.y, 0.5),
                sprite: Sprite {
                    color: Color::srgb(1.0, 0.75, 0.3).with_alpha(0.6),
                    custom_size: Some(Vec2::splat(0.25)),
                    ..default()
                },
                ..default()
            },
            Particle {
                lifespan: settings.cue_lifespan,
            },
        ));
    }
}

fn update_particles(
    mut commands: Commands,
    time: Res<Time>,
    mut q: Query<(Entity, &mut Particle, &mut Sprite)>,
    settings: Res<DeliverySettings>,
) {
    let dt = time.delta_seconds();
    for (e, mut particle, mut sprite) in &mut q {
        particle.lifespan -= dt;
        if particle.lifespan <= 0.0 {
            commands.entity(e).despawn();
        } else {
            let alpha = (particle.lifespan / settings.cue_lifespan).clamp(0.0, 1.0) * 0.6;
            sprite.color.set_alpha(alpha);
        }
    }
}
