use bevy::prelude::*;
use std::collections::HashSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Author-assigned label used for coarse type matching between entities.
#[derive(Component, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Tag {
    #[default]
    Untagged,
    Package,
    Customer,
    Boost,
    Other(String),
}

impl Tag {
    pub fn as_str(&self) -> &str {
        match self {
            Tag::Untagged => "Untagged",
            Tag::Package => "Package",
            Tag::Customer => "Customer",
            Tag::Boost => "Boost",
            Tag::Other(s) => s,
        }
    }
}

impl FromStr for Tag {
    type Err = Infallible;

    // Exact, case-sensitive match. Anything unknown is kept verbatim.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Untagged" => Tag::Untagged,
            "Package" => Tag::Package,
            "Customer" => Tag::Customer,
            "Boost" => Tag::Boost,
            other => Tag::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ColliderKind {
    /// Blocking body: overlaps are resolved and reported as collisions.
    Solid,
    /// Non-blocking volume: overlaps are only reported.
    Trigger,
}

#[derive(Component, Clone, Copy, Debug)]
pub struct Collider {
    pub radius: f32,
    pub kind: ColliderKind,
}

impl Collider {
    pub fn solid(radius: f32) -> Self {
        Self {
            radius,
            kind: ColliderKind::Solid,
        }
    }

    pub fn trigger(radius: f32) -> Self {
        Self {
            radius,
            kind: ColliderKind::Trigger,
        }
    }
}

/// Entities carrying this get enter events for everything they touch.
/// Only the set of entities touched on the previous frame is kept, so an
/// event fires once per contact and again only after separating.
#[derive(Component, Default, Debug)]
pub struct ContactSensor {
    touching: HashSet<Entity>,
}

/// A trigger volume that has already been consumed and no longer reports.
#[derive(Component)]
pub struct Collected;

#[derive(Event, Debug, Clone)]
pub struct TriggerEntered {
    pub sensor: Entity,
    pub other: Entity,
    pub tag: Tag,
}

#[derive(Event, Debug, Clone)]
pub struct CollisionEntered {
    pub sensor: Entity,
    pub other: Entity,
}

pub fn overlaps(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let rsum = ra + rb;
    (b - a).length_squared() <= rsum * rsum
}

/// Vector that moves circle `a` just out of circle `b`, or `None` when they
/// do not overlap. Coincident centers are pushed along +Y.
pub fn separation(a: Vec2, ra: f32, b: Vec2, rb: f32) -> Option<Vec2> {
    let delta = a - b;
    let dist = delta.length();
    let rsum = ra + rb;
    if dist >= rsum {
        return None;
    }
    let normal = if dist > f32::EPSILON {
        delta / dist
    } else {
        Vec2::Y
    };
    Some(normal * (rsum - dist))
}

pub fn detect_contacts(
    mut sensors: Query<(Entity, &mut Transform, &Collider, &mut ContactSensor)>,
    others: Query<
        (Entity, &Transform, &Collider, Option<&Tag>),
        (Without<ContactSensor>, Without<Collected>),
    >,
    mut ev_trigger: EventWriter<TriggerEntered>,
    mut ev_collision: EventWriter<CollisionEntered>,
) {
    for (sensor, mut st, sc, mut contacts) in &mut sensors {
        let mut now_touching = HashSet::with_capacity(contacts.touching.len());

        for (other, ot, oc, tag) in &others {
            let pa = st.translation.truncate();
            let pb = ot.translation.truncate();
            if !overlaps(pa, sc.radius, pb, oc.radius) {
                continue;
            }
            now_touching.insert(other);

            if oc.kind == ColliderKind::Solid {
                if let Some(push) = separation(pa, sc.radius, pb, oc.radius) {
                    st.translation.x += push.x;
                    st.translation.y += push.y;
                }
            }

            if contacts.touching.contains(&other) {
                continue;
            }
            match oc.kind {
                ColliderKind::Solid => {
                    ev_collision.send(CollisionEntered { sensor, other });
                }
                ColliderKind::Trigger => {
                    ev_trigger.send(TriggerEntered {
                        sensor,
                        other,
                        tag: tag.cloned().unwrap_or_default(),
                    });
                }
            }
        }

        contacts.touching = now_touching;
    }
}

pub fn log_contacts(
    mut ev_trigger: EventReader<TriggerEntered>,
    mut ev_collision: EventReader<CollisionEntered>,
    names: Query<&Name>,
) {
    let name_of = |e: Entity| {
        names
            .get(e)
            .map(|n| n.as_str().to_string())
            .unwrap_or_else(|_| format!("{e:?}"))
    };
    for ev in ev_collision.read() {
        info!("Collided with: {}", name_of(ev.other));
    }
    for ev in ev_trigger.read() {
        info!("Triggered by: {} [{}]", name_of(ev.other), ev.tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_match_exact_strings_only() {
        assert_eq!("Package".parse::<Tag>().unwrap(), Tag::Package);
        assert_eq!("Customer".parse::<Tag>().unwrap(), Tag::Customer);
        assert_eq!("Boost".parse::<Tag>().unwrap(), Tag::Boost);
        assert_eq!(
            "package".parse::<Tag>().unwrap(),
            Tag::Other("package".into())
        );
        assert_eq!(Tag::Other("Tree".into()).to_string(), "Tree");
    }

    #[test]
    fn touching_circles_overlap() {
        assert!(overlaps(Vec2::ZERO, 1.0, Vec2::new(2.0, 0.0), 1.0));
        assert!(!overlaps(Vec2::ZERO, 1.0, Vec2::new(2.1, 0.0), 1.0));
    }

    #[test]
    fn separation_pushes_away_from_other() {
        let push = separation(Vec2::new(1.5, 0.0), 1.0, Vec2::ZERO, 1.0).unwrap();
        assert!((push - Vec2::new(0.5, 0.0)).length() < 1e-5);
        assert!(separation(Vec2::new(3.0, 0.0), 1.0, Vec2::ZERO, 1.0).is_none());

        let push = separation(Vec2::ZERO, 1.0, Vec2::ZERO, 1.0).unwrap();
        assert!((push - Vec2::new(0.0, 2.0)).length() < 1e-5);
    }

    #[derive(Resource, Default)]
    struct Seen {
        triggers: Vec<TriggerEntered>,
        collisions: Vec<CollisionEntered>,
    }

    fn record(
        mut seen: ResMut<Seen>,
        mut ev_trigger: EventReader<TriggerEntered>,
        mut ev_collision: EventReader<CollisionEntered>,
    ) {
        seen.triggers.extend(ev_trigger.read().cloned());
        seen.collisions.extend(ev_collision.read().cloned());
    }

    fn contact_app() -> App {
        let mut app = App::new();
        app.init_resource::<Seen>()
            .add_event::<TriggerEntered>()
            .add_event::<CollisionEntered>()
            .add_systems(Update, (detect_contacts, record).chain());
        app
    }

    #[test]
    fn trigger_reports_once_per_entry() {
        let mut app = contact_app();
        let car = app
            .world_mut()
            .spawn((
                Transform::default(),
                Collider::solid(0.5),
                ContactSensor::default(),
            ))
            .id();
        let package = app
            .world_mut()
            .spawn((
                Transform::from_xyz(0.5, 0.0, 0.0),
                Collider::trigger(0.5),
                Tag::Package,
            ))
            .id();

        app.update();
        app.update();
        {
            let seen = app.world().resource::<Seen>();
            assert_eq!(seen.triggers.len(), 1);
            assert_eq!(seen.triggers[0].sensor, car);
            assert_eq!(seen.triggers[0].other, package);
            assert_eq!(seen.triggers[0].tag, Tag::Package);
            assert!(seen.collisions.is_empty());
        }

        // Leave and come back: a fresh entry.
        app.world_mut().get_mut::<Transform>(car).unwrap().translation.x = 10.0;
        app.update();
        app.world_mut().get_mut::<Transform>(car).unwrap().translation.x = 0.0;
        app.update();
        assert_eq!(app.world().resource::<Seen>().triggers.len(), 2);
    }

    #[test]
    fn collected_triggers_are_silent() {
        let mut app = contact_app();
        app.world_mut().spawn((
            Transform::default(),
            Collider::solid(0.5),
            ContactSensor::default(),
        ));
        app.world_mut().spawn((
            Transform::default(),
            Collider::trigger(0.5),
            Tag::Package,
            Collected,
        ));

        app.update();
        assert!(app.world().resource::<Seen>().triggers.is_empty());
    }

    #[test]
    fn solid_contact_blocks_and_reports_collision() {
        let mut app = contact_app();
        let car = app
            .world_mut()
            .spawn((
                Transform::from_xyz(0.0, 0.5, 0.0),
                Collider::solid(0.5),
                ContactSensor::default(),
            ))
            .id();
        let rock = app
            .world_mut()
            .spawn((Transform::default(), Collider::solid(0.5), Name::new("Rock")))
            .id();

        app.update();
        let seen = app.world().resource::<Seen>();
        assert_eq!(seen.collisions.len(), 1);
        assert_eq!(seen.collisions[0].other, rock);
        assert!(seen.triggers.is_empty());

        let y = app.world().get::<Transform>(car).unwrap().translation.y;
        assert!((y - 1.0).abs() < 1e-5);
    }
}
