//! Mutations queued during a frame and applied by
//! [`EntityManager::update`](crate::ecs::EntityManager::update).

use crate::ecs::component::ComponentKind;
use crate::ecs::entity::EntityId;
use crate::memory::SlotHandle;

/// A component attach or detach waiting for the next update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentEvent {
    /// The component was attached and must enter the forward index.
    Added {
        /// Owner
        entity: EntityId,
        /// Kind of the component
        kind: ComponentKind,
        /// Slot in the kind's pool
        handle: SlotHandle,
    },
    /// The component must be detached and freed.
    Removed {
        /// Owner
        entity: EntityId,
        /// Kind of the component
        kind: ComponentKind,
        /// Slot in the kind's pool
        handle: SlotHandle,
    },
}

/// Per-frame queues of entity and component changes.
///
/// Each queue keeps submission order. The manager drains them in one fixed
/// order: removals, then additions, then component events.
#[derive(Debug, Default)]
pub struct PendingOps {
    to_add: Vec<EntityId>,
    to_remove: Vec<EntityId>,
    component_events: Vec<ComponentEvent>,
}

impl PendingOps {
    /// Creates empty queues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates queues pre-sized for `capacity` entries each.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_add: Vec::with_capacity(capacity),
            to_remove: Vec::with_capacity(capacity),
            component_events: Vec::with_capacity(capacity),
        }
    }

    /// True if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty() && self.component_events.is_empty()
    }

    /// Queued additions.
    #[must_use]
    pub fn additions(&self) -> &[EntityId] {
        &self.to_add
    }

    /// Queued removals.
    #[must_use]
    pub fn removals(&self) -> &[EntityId] {
        &self.to_remove
    }

    /// Queued component events.
    #[must_use]
    pub fn component_events(&self) -> &[ComponentEvent] {
        &self.component_events
    }

    /// Drops everything queued.
    pub fn clear(&mut self) {
        self.to_add.clear();
        self.to_remove.clear();
        self.component_events.clear();
    }

    pub(crate) fn push_add(&mut self, id: EntityId) {
        self.to_add.push(id);
    }

    pub(crate) fn push_remove(&mut self, id: EntityId) {
        self.to_remove.push(id);
    }

    pub(crate) fn push_event(&mut self, event: ComponentEvent) {
        self.component_events.push(event);
    }

    pub(crate) fn take_removals(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.to_remove)
    }

    pub(crate) fn take_additions(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.to_add)
    }

    pub(crate) fn take_events(&mut self) -> Vec<ComponentEvent> {
        std::mem::take(&mut self.component_events)
    }

    /// Hands drained buffers back so their capacity is reused.
    pub(crate) fn restore(
        &mut self,
        mut removals: Vec<EntityId>,
        mut additions: Vec<EntityId>,
        mut events: Vec<ComponentEvent>,
    ) {
        removals.clear();
        additions.clear();
        events.clear();
        // Anything queued while draining was pushed into the fresh buffers.
        removals.append(&mut self.to_remove);
        additions.append(&mut self.to_add);
        events.append(&mut self.component_events);
        self.to_remove = removals;
        self.to_add = additions;
        self.component_events = events;
    }
}
