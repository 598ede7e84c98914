//! Recycled obstacle and power-up storage
//!
//! Slots are never freed, only deactivated and parked off-screen. A handle
//! carries the slot generation at acquire time, so a handle kept past its
//! release cannot reach whatever entity reuses the slot later.

use serde::{Deserialize, Serialize};

use super::state::{Entity, EntityKind, ObstacleKind, PoolClass, PowerUpKind};

/// Generational reference to a pooled entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityHandle {
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug, Clone)]
struct Slot {
    entity: Entity,
    generation: u32,
    active: bool,
}

/// Arena of pooled entities
#[derive(Debug, Clone)]
pub struct EntityPool {
    slots: Vec<Slot>,
    max_active: usize,
    active_count: usize,
}

impl EntityPool {
    pub fn new(max_active: usize) -> Self {
        Self {
            slots: Vec::new(),
            max_active,
            active_count: 0,
        }
    }

    /// Allocate `count` inactive slots of a class ahead of play
    pub fn prewarm(&mut self, class: PoolClass, count: usize) {
        let kind = match class {
            PoolClass::Obstacle => EntityKind::Obstacle(ObstacleKind::Bird),
            PoolClass::PowerUp => EntityKind::PowerUp(PowerUpKind::Fuel),
        };
        for _ in 0..count {
            self.slots.push(Slot {
                entity: Entity::parked(kind),
                generation: 0,
                active: false,
            });
        }
    }

    /// Activate an entity of `kind`, reusing an idle slot of the same class
    /// when one exists. Returns `None` at the active cap.
    pub fn acquire(&mut self, kind: EntityKind) -> Option<EntityHandle> {
        if self.active_count >= self.max_active {
            return None;
        }

        let class = kind.class();
        let index = match self
            .slots
            .iter()
            .position(|s| !s.active && s.entity.kind.class() == class)
        {
            Some(i) => i,
            None => {
                self.slots.push(Slot {
                    entity: Entity::parked(kind),
                    generation: 0,
                    active: false,
                });
                self.slots.len() - 1
            }
        };

        let slot = &mut self.slots[index];
        slot.entity = Entity::parked(kind);
        slot.active = true;
        self.active_count += 1;
        Some(EntityHandle {
            index: index as u32,
            generation: slot.generation,
        })
    }

    /// Deactivate and park an entity. Stale or double releases return false.
    pub fn release(&mut self, handle: EntityHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return false;
        };
        if !slot.active || slot.generation != handle.generation {
            return false;
        }
        slot.active = false;
        slot.generation = slot.generation.wrapping_add(1);
        slot.entity = Entity::parked(slot.entity.kind);
        self.active_count -= 1;
        true
    }

    /// Release every active entity
    pub fn release_all(&mut self) -> usize {
        let handles: Vec<EntityHandle> = self.iter_active().map(|(h, _)| h).collect();
        handles.into_iter().filter(|h| self.release(*h)).count()
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&Entity> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.active && s.generation == handle.generation)
            .map(|s| &s.entity)
    }

    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.active && s.generation == handle.generation)
            .map(|s| &mut s.entity)
    }

    /// Active entities in slot order
    pub fn iter_active(&self) -> impl Iterator<Item = (EntityHandle, &Entity)> {
        self.slots.iter().enumerate().filter(|(_, s)| s.active).map(|(i, s)| {
            (
                EntityHandle {
                    index: i as u32,
                    generation: s.generation,
                },
                &s.entity,
            )
        })
    }

    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.slots.iter_mut().filter(|s| s.active).map(|s| &mut s.entity)
    }

    /// Handles of active entities of one class, in slot order
    pub fn active_handles(&self, class: PoolClass) -> Vec<EntityHandle> {
        self.iter_active()
            .filter(|(_, e)| e.kind.class() == class)
            .map(|(h, _)| h)
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Idle slots of a class ready for reuse
    pub fn available_count(&self, class: PoolClass) -> usize {
        self.slots
            .iter()
            .filter(|s| !s.active && s.entity.kind.class() == class)
            .count()
    }

    /// Total slots ever allocated
    pub fn allocated(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::PARKED_POS;

    const BIRD: EntityKind = EntityKind::Obstacle(ObstacleKind::Bird);
    const FUEL: EntityKind = EntityKind::PowerUp(PowerUpKind::Fuel);

    #[test]
    fn test_round_trip_reuses_slot() {
        let mut pool = EntityPool::new(8);
        let h = pool.acquire(BIRD).unwrap();
        assert_eq!(pool.allocated(), 1);
        assert!(pool.release(h));
        let h2 = pool
            .acquire(EntityKind::Obstacle(ObstacleKind::Ufo))
            .unwrap();
        assert_eq!(pool.allocated(), 1);
        assert_eq!(h2.index, h.index);
        assert_eq!(pool.get(h2).unwrap().kind, EntityKind::Obstacle(ObstacleKind::Ufo));
    }

    #[test]
    fn test_batch_round_trip_reuses_every_slot() {
        let mut pool = EntityPool::new(32);
        let first: Vec<_> = (0..12).map(|_| pool.acquire(BIRD).unwrap()).collect();
        assert_eq!(pool.allocated(), 12);
        for h in &first {
            assert!(pool.release(*h));
        }
        assert_eq!(pool.active_count(), 0);

        let second: Vec<_> = (0..12).map(|_| pool.acquire(BIRD).unwrap()).collect();
        assert_eq!(pool.allocated(), 12);
        assert_eq!(pool.active_count(), 12);
        let mut old: Vec<_> = first.iter().map(|h| h.index).collect();
        let mut new: Vec<_> = second.iter().map(|h| h.index).collect();
        old.sort_unstable();
        new.sort_unstable();
        assert_eq!(old, new);
        assert!(first.iter().all(|h| pool.get(*h).is_none()));
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut pool = EntityPool::new(8);
        let h = pool.acquire(BIRD).unwrap();
        pool.release(h);
        let h2 = pool.acquire(BIRD).unwrap();
        assert!(pool.get(h).is_none());
        assert!(!pool.release(h));
        assert!(pool.get(h2).is_some());
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_classes_do_not_share_slots() {
        let mut pool = EntityPool::new(8);
        pool.prewarm(PoolClass::Obstacle, 2);
        let h = pool.acquire(FUEL).unwrap();
        assert_eq!(h.index, 2);
        assert_eq!(pool.available_count(PoolClass::Obstacle), 2);
    }

    #[test]
    fn test_cap_limits_active_entities() {
        let mut pool = EntityPool::new(2);
        assert!(pool.acquire(BIRD).is_some());
        assert!(pool.acquire(FUEL).is_some());
        assert!(pool.acquire(BIRD).is_none());
        assert_eq!(pool.release_all(), 2);
        assert!(pool.acquire(BIRD).is_some());
    }

    #[test]
    fn test_release_parks_entity() {
        let mut pool = EntityPool::new(4);
        let h = pool.acquire(BIRD).unwrap();
        pool.get_mut(h).unwrap().pos = glam::Vec2::new(100.0, 200.0);
        pool.release(h);
        let h2 = pool.acquire(BIRD).unwrap();
        let e = pool.get(h2).unwrap();
        assert_eq!(e.pos, glam::Vec2::new(PARKED_POS.0, PARKED_POS.1));
    }
}
