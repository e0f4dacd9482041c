use bevy::prelude::*;

use crate::sim::SimClock;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ScheduledDespawn {
    pub entity: Entity,
    /// Whoever caused the removal; used to flush early.
    pub owner: Entity,
    /// Sim clock seconds at which the entity goes away.
    pub fire_at: f32,
}

/// Timed removals, fired by `process_despawn_queue` once their time is due.
#[derive(Resource, Default, Debug)]
pub struct DespawnQueue {
    pending: Vec<ScheduledDespawn>,
}

impl DespawnQueue {
    pub fn schedule(&mut self, entity: Entity, owner: Entity, now: f32, delay: f32) {
        if self.is_scheduled(entity) {
            return;
        }
        self.pending.push(ScheduledDespawn {
            entity,
            owner,
            fire_at: now + delay.max(0.0),
        });
    }

    pub fn is_scheduled(&self, entity: Entity) -> bool {
        self.pending.iter().any(|s| s.entity == entity)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Removes and returns every entity whose time has come, earliest first.
    pub fn drain_due(&mut self, now: f32) -> Vec<Entity> {
        let mut due: Vec<ScheduledDespawn> = Vec::new();
        self.pending.retain(|s| {
            if s.fire_at <= now {
                due.push(*s);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.fire_at.total_cmp(&b.fire_at));
        due.into_iter().map(|s| s.entity).collect()
    }

    /// Removes and returns everything scheduled on behalf of `owner`.
    pub fn flush_owner(&mut self, owner: Entity) -> Vec<Entity> {
        let mut flushed = Vec::new();
        self.pending.retain(|s| {
            if s.owner == owner {
                flushed.push(s.entity);
                false
            } else {
                true
            }
        });
        flushed
    }
}

pub fn process_despawn_queue(
    mut commands: Commands,
    clock: Res<SimClock>,
    mut queue: ResMut<DespawnQueue>,
) {
    for e in queue.drain_due(clock.elapsed()) {
        if let Some(ec) = commands.get_entity(e) {
            debug!("removing {:?}", e);
            ec.despawn_recursive();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(n: u32) -> Entity {
        Entity::from_raw(n)
    }

    #[test]
    fn fires_only_when_due() {
        let mut queue = DespawnQueue::default();
        queue.schedule(e(1), e(0), 2.0, 0.5);

        assert!(queue.drain_due(2.4).is_empty());
        assert!(queue.is_scheduled(e(1)));
        assert_eq!(queue.drain_due(2.5), vec![e(1)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn due_entries_come_out_in_time_order() {
        let mut queue = DespawnQueue::default();
        queue.schedule(e(1), e(0), 0.0, 3.0);
        queue.schedule(e(2), e(0), 0.0, 1.0);
        queue.schedule(e(3), e(0), 0.0, 9.0);

        assert_eq!(queue.drain_due(5.0), vec![e(2), e(1)]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn scheduling_twice_keeps_first_entry() {
        let mut queue = DespawnQueue::default();
        queue.schedule(e(1), e(0), 0.0, 1.0);
        queue.schedule(e(1), e(0), 0.0, 5.0);

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain_due(1.0), vec![e(1)]);
    }

    #[test]
    fn flush_takes_only_owned_entries() {
        let mut queue = DespawnQueue::default();
        queue.schedule(e(1), e(10), 0.0, 1.0);
        queue.schedule(e(2), e(11), 0.0, 1.0);

        assert_eq!(queue.flush_owner(e(10)), vec![e(1)]);
        assert!(!queue.is_scheduled(e(1)));
        assert!(queue.is_scheduled(e(2)));
    }
}
