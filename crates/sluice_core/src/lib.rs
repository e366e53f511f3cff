//! # SLUICE Core
//!
//! Fixed-budget Entity Component System for a tile-grid simulation:
//! - Every entity and component lives in a pre-sized slot pool
//! - Handles are generational, so use-after-free resolves to `None`
//! - Structural changes are queued and flushed once per frame
//!
//! ## Architecture Rules
//!
//! 1. **No growth** - Pools never reallocate; exhaustion skips the spawn
//! 2. **Two-phase mutation** - Systems queue, [`EntityManager::update`] applies
//! 3. **Single writer** - One frame runs at a time, no locks anywhere
//!
//! ## Example
//!
//! ```rust,ignore
//! use sluice_core::{EntityManager, EntityTag, PendingOps, PoolConfig, Transform};
//!
//! let mut manager = EntityManager::new(&PoolConfig::default());
//! let mut ops = PendingOps::new();
//! let id = manager.add_entity(EntityTag::Boulder, &mut ops)?;
//! manager.add_component::<Transform>(id, &mut ops)?.active = true;
//! manager.update(&mut ops, &mut ());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod ecs;
pub mod memory;

pub use ecs::{
    AirTimer, AnimationClip, BfsTile, BoundingBox, Component, ComponentKind, ComponentPools,
    Container, ContainerItem, ContainerMaterial, Emitter, EmitterHandle, EntityId, EntityManager,
    EntityRecord, EntityState, EntityTag, HitBoxes, Hurtbox, Jump, LifeTimer, Moveable,
    MovementMode, MovementState, PendingOps, PlayerState, PoolConfig, RemovalObserver,
    RunnerState, Sprite, SpriteBehavior, SpriteContext, SpriteHandle, TileCoord, Transform,
    WaterRunner,
};
pub use memory::{PoolStats, SlotHandle, SlotPool};
