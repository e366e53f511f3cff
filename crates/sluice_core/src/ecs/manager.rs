//! # Entity Manager
//!
//! Owns the entity pool, every component pool and the lookup indices.
//!
//! Structural changes are two-phase. During a frame, creations and
//! destructions only touch the slot they concern and queue an entry in
//! [`PendingOps`]; [`EntityManager::update`] applies the queues once, after
//! every system has run. A system iterating entities never sees a record or
//! component disappear under it.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::ecs::component::{Component, ComponentKind, COMPONENT_KINDS};
use crate::ecs::entity::{EntityId, EntityRecord, EntityState, EntityTag, ENTITY_TAGS};
use crate::ecs::pending::{ComponentEvent, PendingOps};
use crate::ecs::pools::{ComponentPools, PoolConfig};
use crate::memory::{PoolStats, SlotHandle, SlotPool};

/// Hook run whenever the manager frees components.
///
/// Every call happens before the components concerned are freed, so the
/// observer can still read them (for example to drop tile back-references).
pub trait RemovalObserver {
    /// Called once per entity reclaimed by [`EntityManager::update`].
    fn on_entity_removed(&mut self, id: EntityId, manager: &EntityManager);

    /// Called when a single component is detached from a surviving entity.
    fn on_component_removed(
        &mut self,
        _id: EntityId,
        _kind: ComponentKind,
        _manager: &EntityManager,
    ) {
    }
}

impl RemovalObserver for () {
    fn on_entity_removed(&mut self, _id: EntityId, _manager: &EntityManager) {}
}

/// Entity and component storage with deferred structural mutation.
#[derive(Debug)]
pub struct EntityManager {
    entities: SlotPool<EntityRecord>,
    pools: ComponentPools,
    /// Registered entities by slot index.
    live: BTreeMap<u32, EntityId>,
    /// Registered entities by tag, then slot index.
    by_tag: Vec<BTreeMap<u32, EntityId>>,
    /// Owner of each registered component, by kind then component slot.
    by_component: Vec<BTreeMap<u32, EntityId>>,
}

impl EntityManager {
    /// Creates a manager with every pool pre-allocated.
    ///
    /// # Panics
    ///
    /// Panics if a capacity in `config` is zero.
    #[must_use]
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            entities: SlotPool::new("entity", config.entity_capacity),
            pools: ComponentPools::new(config),
            live: BTreeMap::new(),
            by_tag: vec![BTreeMap::new(); ENTITY_TAGS],
            by_component: vec![BTreeMap::new(); COMPONENT_KINDS],
        }
    }

    fn handle_of(&self, id: EntityId) -> Option<SlotHandle> {
        self.entities
            .handle_at(id.index())
            .filter(|h| h.generation() == id.generation())
    }

    // =========================================================================
    // ENTITIES
    // =========================================================================

    /// Allocates an entity and queues its registration.
    ///
    /// The record is usable immediately (components can be attached, the
    /// position set) but the entity only shows up in the live and tag
    /// indices after the next [`update`](Self::update).
    ///
    /// Returns `None` when the entity pool is exhausted.
    pub fn add_entity(&mut self, tag: EntityTag, ops: &mut PendingOps) -> Option<EntityId> {
        let Some(handle) = self.entities.allocate() else {
            warn!(
                pool = self.entities.name(),
                capacity = self.entities.capacity(),
                ?tag,
                "Entity pool exhausted, spawn skipped"
            );
            return None;
        };
        let id = EntityId::from_handle(handle);
        if let Some(record) = self.entities.get_mut(handle) {
            record.init(id, tag);
        }
        ops.push_add(id);
        Some(id)
    }

    /// Marks an entity dead and queues its reclamation.
    ///
    /// The entity and its components stay readable until the next update.
    /// Returns false if the id is stale or the entity is already dead.
    pub fn remove_entity(&mut self, id: EntityId, ops: &mut PendingOps) -> bool {
        let Some(handle) = self.handle_of(id) else {
            return false;
        };
        match self.entities.get_mut(handle) {
            Some(record) if record.is_alive() => {
                record.mark_dead();
                ops.push_remove(id);
                true
            }
            _ => false,
        }
    }

    /// Returns the record of an allocated entity, dead or alive.
    #[must_use]
    pub fn get_entity(&self, id: EntityId) -> Option<&EntityRecord> {
        self.handle_of(id).and_then(|h| self.entities.get(h))
    }

    /// Mutable access to an entity record.
    pub fn get_entity_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        let handle = self.handle_of(id)?;
        self.entities.get_mut(handle)
    }

    /// True if the id refers to an allocated entity that has not been removed.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.get_entity(id).is_some_and(EntityRecord::is_alive)
    }

    /// World position of an entity.
    #[must_use]
    pub fn position(&self, id: EntityId) -> Option<sluice_shared::Vec2> {
        self.get_entity(id).map(|r| r.position)
    }

    /// Number of registered entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.live.len()
    }

    /// Registered entities in slot order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.live.values().copied()
    }

    /// Registered entities carrying `tag`, in slot order.
    pub fn entities_tagged(&self, tag: EntityTag) -> impl Iterator<Item = EntityId> + '_ {
        self.by_tag[tag.index()].values().copied()
    }

    /// Replaces `out` with the registered entities carrying `tag`.
    pub fn collect_entities_tagged(&self, tag: EntityTag, out: &mut Vec<EntityId>) {
        out.clear();
        out.extend(self.entities_tagged(tag));
    }

    // =========================================================================
    // COMPONENTS
    // =========================================================================

    /// Attaches a zeroed `C` to an entity and returns it.
    ///
    /// The component is readable through the entity at once; it joins the
    /// [`entities_with`](Self::entities_with) index at the next update. If
    /// the entity already has a `C`, that one is returned (including one
    /// whose removal is queued).
    ///
    /// Returns `None` for a dead or stale entity, or when `C`'s pool is
    /// exhausted.
    pub fn add_component<C: Component>(
        &mut self,
        id: EntityId,
        ops: &mut PendingOps,
    ) -> Option<&mut C> {
        let ent = self.handle_of(id)?;
        let record = self.entities.get_mut(ent)?;
        if !record.is_alive() {
            return None;
        }
        if let Some(existing) = record.component(C::KIND) {
            return C::pool_mut(&mut self.pools).get_mut(existing);
        }

        let pool = C::pool_mut(&mut self.pools);
        let Some(handle) = pool.allocate() else {
            warn!(
                pool = pool.name(),
                capacity = pool.capacity(),
                entity = %id,
                "Component pool exhausted"
            );
            return None;
        };
        record.set_component(C::KIND, Some(handle));
        ops.push_event(ComponentEvent::Added {
            entity: id,
            kind: C::KIND,
            handle,
        });
        pool.get_mut(handle)
    }

    /// Returns an entity's `C`, if attached.
    #[must_use]
    pub fn get_component<C: Component>(&self, id: EntityId) -> Option<&C> {
        let handle = self.get_entity(id)?.component(C::KIND)?;
        C::pool(&self.pools).get(handle)
    }

    /// Mutable access to an entity's `C`.
    pub fn get_component_mut<C: Component>(&mut self, id: EntityId) -> Option<&mut C> {
        let handle = self.get_entity(id)?.component(C::KIND)?;
        C::pool_mut(&mut self.pools).get_mut(handle)
    }

    /// Mutable access to an entity record and its `C` at the same time.
    pub fn get_with_component_mut<C: Component>(
        &mut self,
        id: EntityId,
    ) -> Option<(&mut EntityRecord, &mut C)> {
        let ent = self.handle_of(id)?;
        let record = self.entities.get_mut(ent)?;
        let handle = record.component(C::KIND)?;
        let component = C::pool_mut(&mut self.pools).get_mut(handle)?;
        Some((record, component))
    }

    /// True if the entity has a `C`.
    #[must_use]
    pub fn has_component<C: Component>(&self, id: EntityId) -> bool {
        self.get_entity(id).is_some_and(|r| r.has(C::KIND))
    }

    /// Queues the removal of an entity's `C`.
    ///
    /// The component stays attached and readable until the next update.
    /// Returns false if nothing is attached.
    pub fn remove_component<C: Component>(&mut self, id: EntityId, ops: &mut PendingOps) -> bool {
        let Some(handle) = self.get_entity(id).and_then(|r| r.component(C::KIND)) else {
            return false;
        };
        ops.push_event(ComponentEvent::Removed {
            entity: id,
            kind: C::KIND,
            handle,
        });
        true
    }

    /// Detaches and frees an entity's `C` right away, telling `observer`
    /// first.
    ///
    /// Only for call sites that are not iterating over `C` or the entity.
    pub fn remove_component_immediate<C: Component>(
        &mut self,
        id: EntityId,
        observer: &mut impl RemovalObserver,
    ) -> bool {
        let Some(handle) = self.get_entity(id).and_then(|r| r.component(C::KIND)) else {
            return false;
        };
        observer.on_component_removed(id, C::KIND, self);
        if let Some(record) = self.get_entity_mut(id) {
            record.set_component(C::KIND, None);
        }
        self.unindex(C::KIND, handle, id);
        self.pools.free(C::KIND, handle)
    }

    /// Registered owners of `kind` components, in component-slot order.
    pub fn entities_with(&self, kind: ComponentKind) -> impl Iterator<Item = EntityId> + '_ {
        self.by_component[kind.index()].values().copied()
    }

    /// Replaces `out` with the registered owners of `kind` components.
    pub fn collect_entities_with(&self, kind: ComponentKind, out: &mut Vec<EntityId>) {
        out.clear();
        out.extend(self.entities_with(kind));
    }

    /// Direct access to the component pools.
    #[must_use]
    pub fn pools(&self) -> &ComponentPools {
        &self.pools
    }

    /// Occupancy of the entity pool followed by every component pool.
    #[must_use]
    pub fn pool_report(&self) -> Vec<(&'static str, PoolStats)> {
        let mut report = Vec::with_capacity(COMPONENT_KINDS + 1);
        report.push((self.entities.name(), self.entities.stats()));
        report.extend(self.pools.report());
        report
    }

    fn unindex(&mut self, kind: ComponentKind, handle: SlotHandle, owner: EntityId) {
        let index = &mut self.by_component[kind.index()];
        if index.get(&handle.index()) == Some(&owner) {
            index.remove(&handle.index());
        }
    }

    // =========================================================================
    // FRAME FLUSH
    // =========================================================================

    /// Applies every queued change, once per frame after all systems.
    ///
    /// Order: removals (observer, components, indices, slot), then
    /// additions (skipping entities reclaimed in the same flush), then
    /// component events.
    pub fn update(&mut self, ops: &mut PendingOps, observer: &mut impl RemovalObserver) {
        let removals = ops.take_removals();
        for &id in &removals {
            self.reclaim(id, observer);
        }

        let additions = ops.take_additions();
        for &id in &additions {
            self.register(id);
        }

        let events = ops.take_events();
        for &event in &events {
            self.apply_event(event, observer);
        }

        ops.restore(removals, additions, events);
    }

    /// Removes every entity and flushes.
    pub fn clear(&mut self, ops: &mut PendingOps, observer: &mut impl RemovalObserver) {
        let ids: Vec<EntityId> = self.entities.iter().map(|(_, r)| r.id()).collect();
        for id in ids {
            self.remove_entity(id, ops);
        }
        self.update(ops, observer);
        debug!(remaining = self.entities.len(), "Entity manager cleared");
    }

    fn reclaim(&mut self, id: EntityId, observer: &mut impl RemovalObserver) {
        let Some(handle) = self.handle_of(id) else {
            return;
        };
        observer.on_entity_removed(id, self);

        if let Some(record) = self.entities.get_mut(handle) {
            let tag = record.tag();
            let components = record.take_components();
            for (kind, slot) in ComponentKind::ALL.into_iter().zip(components) {
                if let Some(slot) = slot {
                    self.pools.free(kind, slot);
                    self.unindex(kind, slot, id);
                }
            }
            self.by_tag[tag.index()].remove(&id.index());
        }
        self.live.remove(&id.index());
        self.entities.free(handle);
    }

    fn register(&mut self, id: EntityId) {
        let Some(record) = self.get_entity_mut(id) else {
            return;
        };
        if record.state() != EntityState::Pending {
            return;
        }
        record.set_state(EntityState::Live);
        let tag = record.tag();
        self.live.insert(id.index(), id);
        self.by_tag[tag.index()].insert(id.index(), id);
    }

    fn apply_event(&mut self, event: ComponentEvent, observer: &mut impl RemovalObserver) {
        match event {
            ComponentEvent::Added {
                entity,
                kind,
                handle,
            } => {
                if self.get_entity(entity).and_then(|r| r.component(kind)) == Some(handle) {
                    self.by_component[kind.index()].insert(handle.index(), entity);
                }
            }
            ComponentEvent::Removed {
                entity,
                kind,
                handle,
            } => {
                let attached = self
                    .get_entity(entity)
                    .is_some_and(|r| r.component(kind) == Some(handle));
                if attached {
                    observer.on_component_removed(entity, kind, self);
                    if let Some(record) = self.get_entity_mut(entity) {
                        record.set_component(kind, None);
                    }
                }
                self.unindex(kind, handle, entity);
                self.pools.free(kind, handle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{BoundingBox, LifeTimer, Transform};

    fn manager(entities: usize, components: usize) -> EntityManager {
        EntityManager::new(&PoolConfig {
            entity_capacity: entities,
            component_capacity: components,
            player_capacity: 1,
        })
    }

    #[test]
    fn test_added_entity_registers_on_update() {
        let mut em = manager(8, 8);
        let mut ops = PendingOps::new();

        let id = em.add_entity(EntityTag::Crate, &mut ops).unwrap();
        assert_eq!(em.get_entity(id).unwrap().state(), EntityState::Pending);
        assert_eq!(em.entity_count(), 0);
        assert_eq!(em.entities_tagged(EntityTag::Crate).count(), 0);

        em.update(&mut ops, &mut ());
        assert_eq!(em.get_entity(id).unwrap().state(), EntityState::Live);
        assert_eq!(em.entities_tagged(EntityTag::Crate).collect::<Vec<_>>(), vec![id]);
        assert!(ops.is_empty());
    }

    #[test]
    fn test_removed_entity_stays_readable_until_update() {
        let mut em = manager(8, 8);
        let mut ops = PendingOps::new();
        let id = em.add_entity(EntityTag::Arrow, &mut ops).unwrap();
        em.add_component::<Transform>(id, &mut ops).unwrap().velocity.x = 400.0;
        em.update(&mut ops, &mut ());

        assert!(em.remove_entity(id, &mut ops));
        assert!(!em.remove_entity(id, &mut ops));
        assert!(!em.is_alive(id));
        assert_eq!(em.get_component::<Transform>(id).unwrap().velocity.x, 400.0);
        assert_eq!(em.entities_with(ComponentKind::Transform).count(), 1);

        em.update(&mut ops, &mut ());
        assert!(em.get_entity(id).is_none());
        assert!(em.get_component::<Transform>(id).is_none());
        assert_eq!(em.entities_with(ComponentKind::Transform).count(), 0);
        assert_eq!(em.pools().get::<Transform>().len(), 0);
        assert_eq!(em.entity_count(), 0);
    }

    #[test]
    fn test_component_count_stable_within_frame() {
        let mut em = manager(8, 8);
        let mut ops = PendingOps::new();
        let id = em.add_entity(EntityTag::Crate, &mut ops).unwrap();
        em.add_component::<Transform>(id, &mut ops);
        em.add_component::<BoundingBox>(id, &mut ops);
        em.update(&mut ops, &mut ());

        assert!(em.remove_component::<BoundingBox>(id, &mut ops));
        assert_eq!(em.get_entity(id).unwrap().component_count(), 2);
        assert!(em.get_component::<BoundingBox>(id).is_some());

        em.update(&mut ops, &mut ());
        assert_eq!(em.get_entity(id).unwrap().component_count(), 1);
        assert!(!em.has_component::<BoundingBox>(id));
        assert_eq!(em.pools().get::<BoundingBox>().len(), 0);
    }

    #[test]
    fn test_component_indexed_after_update() {
        let mut em = manager(8, 8);
        let mut ops = PendingOps::new();
        let id = em.add_entity(EntityTag::None, &mut ops).unwrap();
        em.add_component::<LifeTimer>(id, &mut ops).unwrap().life_time = 1.0;

        assert!(em.has_component::<LifeTimer>(id));
        assert_eq!(em.entities_with(ComponentKind::LifeTimer).count(), 0);

        em.update(&mut ops, &mut ());
        let mut out = Vec::new();
        em.collect_entities_with(ComponentKind::LifeTimer, &mut out);
        assert_eq!(out, vec![id]);
    }

    #[test]
    fn test_add_component_twice_returns_existing() {
        let mut em = manager(8, 8);
        let mut ops = PendingOps::new();
        let id = em.add_entity(EntityTag::None, &mut ops).unwrap();
        em.add_component::<LifeTimer>(id, &mut ops).unwrap().life_time = 2.5;

        let again = em.add_component::<LifeTimer>(id, &mut ops).unwrap();
        assert_eq!(again.life_time, 2.5);
        assert_eq!(em.pools().get::<LifeTimer>().len(), 1);
    }

    #[test]
    fn test_remove_pending_entity() {
        let mut em = manager(8, 8);
        let mut ops = PendingOps::new();
        let id = em.add_entity(EntityTag::Boulder, &mut ops).unwrap();
        em.add_component::<Transform>(id, &mut ops);
        assert!(em.remove_entity(id, &mut ops));

        em.update(&mut ops, &mut ());
        assert!(em.get_entity(id).is_none());
        assert_eq!(em.entity_count(), 0);
        assert_eq!(em.entities_tagged(EntityTag::Boulder).count(), 0);
        assert_eq!(em.entities_with(ComponentKind::Transform).count(), 0);
        assert_eq!(em.pools().get::<Transform>().len(), 0);
    }

    #[test]
    fn test_stale_id_after_slot_reuse() {
        let mut em = manager(1, 4);
        let mut ops = PendingOps::new();
        let old = em.add_entity(EntityTag::Crate, &mut ops).unwrap();
        em.update(&mut ops, &mut ());
        em.remove_entity(old, &mut ops);
        em.update(&mut ops, &mut ());

        let new = em.add_entity(EntityTag::Chest, &mut ops).unwrap();
        assert_eq!(old.index(), new.index());
        assert!(em.get_entity(old).is_none());
        assert!(!em.remove_entity(old, &mut ops));
        assert!(em.add_component::<Transform>(old, &mut ops).is_none());
        assert!(em.is_alive(new));
    }

    #[test]
    fn test_exhaustion_returns_none() {
        let mut em = manager(2, 1);
        let mut ops = PendingOps::new();
        let a = em.add_entity(EntityTag::None, &mut ops).unwrap();
        let b = em.add_entity(EntityTag::None, &mut ops).unwrap();
        assert!(em.add_entity(EntityTag::None, &mut ops).is_none());

        assert!(em.add_component::<Transform>(a, &mut ops).is_some());
        assert!(em.add_component::<Transform>(b, &mut ops).is_none());
        assert!(!em.has_component::<Transform>(b));
    }

    #[derive(Default)]
    struct Recorder {
        seen: Vec<(EntityId, bool)>,
        detached: Vec<(EntityId, ComponentKind, bool)>,
    }

    impl RemovalObserver for Recorder {
        fn on_entity_removed(&mut self, id: EntityId, manager: &EntityManager) {
            self.seen.push((id, manager.get_component::<Transform>(id).is_some()));
        }

        fn on_component_removed(
            &mut self,
            id: EntityId,
            kind: ComponentKind,
            manager: &EntityManager,
        ) {
            let attached = manager.get_entity(id).is_some_and(|r| r.has(kind));
            self.detached.push((id, kind, attached));
        }
    }

    #[test]
    fn test_observer_sees_detached_components() {
        let mut em = manager(8, 8);
        let mut ops = PendingOps::new();
        let id = em.add_entity(EntityTag::None, &mut ops).unwrap();
        em.add_component::<Transform>(id, &mut ops);
        em.add_component::<LifeTimer>(id, &mut ops);
        em.update(&mut ops, &mut ());

        let mut recorder = Recorder::default();
        assert!(em.remove_component_immediate::<LifeTimer>(id, &mut recorder));
        assert!(!em.remove_component_immediate::<LifeTimer>(id, &mut recorder));

        em.remove_component::<Transform>(id, &mut ops);
        em.update(&mut ops, &mut recorder);

        assert_eq!(
            recorder.detached,
            vec![
                (id, ComponentKind::LifeTimer, true),
                (id, ComponentKind::Transform, true),
            ]
        );
        assert!(recorder.seen.is_empty());
        assert!(!em.has_component::<Transform>(id));
    }

    #[test]
    fn test_observer_sees_components_before_free() {
        let mut em = manager(8, 8);
        let mut ops = PendingOps::new();
        let id = em.add_entity(EntityTag::None, &mut ops).unwrap();
        em.add_component::<Transform>(id, &mut ops);
        em.update(&mut ops, &mut ());

        em.remove_entity(id, &mut ops);
        let mut recorder = Recorder::default();
        em.update(&mut ops, &mut recorder);
        assert_eq!(recorder.seen, vec![(id, true)]);
    }

    #[test]
    fn test_clear_frees_everything() {
        let mut em = manager(8, 8);
        let mut ops = PendingOps::new();
        for _ in 0..3 {
            let id = em.add_entity(EntityTag::Crate, &mut ops).unwrap();
            em.add_component::<BoundingBox>(id, &mut ops);
        }
        em.update(&mut ops, &mut ());
        em.add_entity(EntityTag::Arrow, &mut ops);

        em.clear(&mut ops, &mut ());
        assert_eq!(em.entity_count(), 0);
        let report = em.pool_report();
        assert!(report.iter().all(|(_, stats)| stats.in_use == 0));
    }
}
