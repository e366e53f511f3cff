//! # Entity Component System
//!
//! A fixed-budget ECS with deferred structural mutation.
//!
//! ## Design Philosophy
//!
//! - Every pool is pre-allocated when the manager is built
//! - Entity and component handles carry a generation, stale ones resolve to `None`
//! - Creation and destruction are queued in [`PendingOps`] and applied once per frame
//! - Index iteration is in slot order, so a frame is deterministic

mod component;
mod entity;
mod manager;
mod pending;
mod pools;
mod sprite;

pub use component::{
    AirTimer, AnimationClip, BfsTile, BoundingBox, Component, ComponentKind, Container,
    ContainerItem, ContainerMaterial, Emitter, EmitterHandle, HitBoxes, Hurtbox, Jump, LifeTimer,
    Moveable, MovementMode, MovementState, PlayerState, RunnerState, Sprite, TileCoord, Transform,
    WaterRunner, COMPONENT_KINDS, MAX_SPRITE_CLIPS,
};
pub use entity::{EntityId, EntityRecord, EntityState, EntityTag, ENTITY_TAGS};
pub use manager::{EntityManager, RemovalObserver};
pub use pending::{ComponentEvent, PendingOps};
pub use pools::{ComponentPools, PoolConfig};
pub use sprite::{SpriteBehavior, SpriteContext, SpriteHandle};
