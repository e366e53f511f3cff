//! # Entity Management
//!
//! Entities are lightweight identifiers consisting of:
//! - An index into the entity pool
//! - A generation counter for safe reuse
//!
//! The record behind an id carries its tag, lifecycle state, world position
//! and one optional component handle per component kind.

use std::cmp::Ordering;

use sluice_shared::Vec2;

use crate::ecs::component::{ComponentKind, COMPONENT_KINDS};
use crate::memory::SlotHandle;

/// Unique identifier for an entity.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Index into the entity pool
/// - Upper 32 bits: Generation counter for detecting stale references
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new entity ID from index and generation.
    ///
    /// # Arguments
    ///
    /// * `index` - The slot index in the entity pool
    /// * `generation` - The slot generation when the entity was created
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Null/invalid entity ID.
    pub const NULL: Self = Self(u64::MAX);

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }

    pub(crate) const fn from_handle(handle: SlotHandle) -> Self {
        Self::new(handle.index(), handle.generation())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index()
            .cmp(&other.index())
            .then(self.generation().cmp(&other.generation()))
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

/// Gameplay category of an entity, used for tag-indexed lookups.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityTag {
    /// Untagged
    #[default]
    None,
    /// The player character
    Player,
    /// Hostile creature
    Enemy,
    /// Wooden or metal crate
    Crate,
    /// Coin chest
    Chest,
    /// Pushable boulder
    Boulder,
    /// Flying arrow
    Arrow,
    /// Bombs and explosions
    Destructible,
    /// Level exit marker
    LevelEnd,
    /// Entities owning large scratch buffers (water runners)
    DynamicMemory,
}

/// Number of entity tags.
pub const ENTITY_TAGS: usize = 10;

impl EntityTag {
    /// Every tag, in declaration order.
    pub const ALL: [Self; ENTITY_TAGS] = [
        Self::None,
        Self::Player,
        Self::Enemy,
        Self::Crate,
        Self::Chest,
        Self::Boulder,
        Self::Arrow,
        Self::Destructible,
        Self::LevelEnd,
        Self::DynamicMemory,
    ];

    /// Dense index of the tag.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Lifecycle of an entity slot.
///
/// A freed entity has no state: its slot is back on the free-list and every
/// lookup through its old id fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EntityState {
    /// Allocated, waiting for the next manager update to be registered.
    #[default]
    Pending,
    /// Registered in the live, tag and component indices.
    Live,
    /// Marked dead, reclaimed by the next manager update.
    PendingRemoval,
}

/// Record stored in the entity pool.
#[derive(Clone, Debug, Default)]
pub struct EntityRecord {
    id: EntityId,
    tag: EntityTag,
    state: EntityState,
    alive: bool,
    /// World position (top-left of the bounding box, when there is one).
    pub position: Vec2,
    components: [Option<SlotHandle>; COMPONENT_KINDS],
}

impl EntityRecord {
    pub(crate) fn init(&mut self, id: EntityId, tag: EntityTag) {
        self.id = id;
        self.tag = tag;
        self.state = EntityState::Pending;
        self.alive = true;
    }

    /// The entity's id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// The entity's tag.
    #[inline]
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.tag
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> EntityState {
        self.state
    }

    /// False from the moment the entity is removed.
    #[inline]
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Handle of the component of `kind`, if attached.
    #[inline]
    #[must_use]
    pub const fn component(&self, kind: ComponentKind) -> Option<SlotHandle> {
        self.components[kind.index()]
    }

    /// True if a component of `kind` is attached.
    #[inline]
    #[must_use]
    pub const fn has(&self, kind: ComponentKind) -> bool {
        self.components[kind.index()].is_some()
    }

    /// Number of attached components.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.iter().filter(|c| c.is_some()).count()
    }

    pub(crate) fn set_component(&mut self, kind: ComponentKind, handle: Option<SlotHandle>) {
        self.components[kind.index()] = handle;
    }

    pub(crate) fn take_components(&mut self) -> [Option<SlotHandle>; COMPONENT_KINDS] {
        std::mem::take(&mut self.components)
    }

    pub(crate) fn set_state(&mut self, state: EntityState) {
        self.state = state;
    }

    pub(crate) fn mark_dead(&mut self) {
        self.alive = false;
        self.state = EntityState::PendingRemoval;
    }
}
