//! # Component Pools
//!
//! One fixed-capacity [`SlotPool`] per component kind. Capacities are set
//! once from a [`PoolConfig`]; exhausting a pool makes the allocation fail,
//! it never grows.

use sluice_shared::constants::{MAX_COMP_POOL_SIZE, MAX_ENTITIES, MAX_PLAYER_COMP_POOL_SIZE};

use crate::ecs::component::{
    AirTimer, BoundingBox, Component, ComponentKind, Container, Emitter, HitBoxes, Hurtbox, Jump,
    LifeTimer, Moveable, MovementState, PlayerState, Sprite, TileCoord, Transform, WaterRunner,
    COMPONENT_KINDS,
};
use crate::memory::{PoolStats, SlotHandle, SlotPool};

/// Pool capacities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Entity records.
    pub entity_capacity: usize,
    /// Slots per general component pool.
    pub component_capacity: usize,
    /// Slots for player-only components (`Jump`, `PlayerState`).
    pub player_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            entity_capacity: MAX_ENTITIES,
            component_capacity: MAX_COMP_POOL_SIZE,
            player_capacity: MAX_PLAYER_COMP_POOL_SIZE,
        }
    }
}

/// Storage for every component kind.
#[derive(Debug)]
pub struct ComponentPools {
    bbox: SlotPool<BoundingBox>,
    transform: SlotPool<Transform>,
    tile_coord: SlotPool<TileCoord>,
    movement_state: SlotPool<MovementState>,
    jump: SlotPool<Jump>,
    player_state: SlotPool<PlayerState>,
    container: SlotPool<Container>,
    hitboxes: SlotPool<HitBoxes>,
    hurtbox: SlotPool<Hurtbox>,
    sprite: SlotPool<Sprite>,
    moveable: SlotPool<Moveable>,
    life_timer: SlotPool<LifeTimer>,
    water_runner: SlotPool<WaterRunner>,
    air_timer: SlotPool<AirTimer>,
    emitter: SlotPool<Emitter>,
}

/// Dispatches an expression over the pool of a runtime [`ComponentKind`].
/// `ref` borrows the pools shared, otherwise mutably.
macro_rules! with_pool {
    (@ [$($r:tt)+] $pools:expr, $kind:expr, $pool:ident, $body:expr) => {
        match $kind {
            ComponentKind::BoundingBox => {
                let $pool = $($r)+ $pools.bbox;
                $body
            }
            ComponentKind::Transform => {
                let $pool = $($r)+ $pools.transform;
                $body
            }
            ComponentKind::TileCoord => {
                let $pool = $($r)+ $pools.tile_coord;
                $body
            }
            ComponentKind::MovementState => {
                let $pool = $($r)+ $pools.movement_state;
                $body
            }
            ComponentKind::Jump => {
                let $pool = $($r)+ $pools.jump;
                $body
            }
            ComponentKind::PlayerState => {
                let $pool = $($r)+ $pools.player_state;
                $body
            }
            ComponentKind::Container => {
                let $pool = $($r)+ $pools.container;
                $body
            }
            ComponentKind::HitBoxes => {
                let $pool = $($r)+ $pools.hitboxes;
                $body
            }
            ComponentKind::Hurtbox => {
                let $pool = $($r)+ $pools.hurtbox;
                $body
            }
            ComponentKind::Sprite => {
                let $pool = $($r)+ $pools.sprite;
                $body
            }
            ComponentKind::Moveable => {
                let $pool = $($r)+ $pools.moveable;
                $body
            }
            ComponentKind::LifeTimer => {
                let $pool = $($r)+ $pools.life_timer;
                $body
            }
            ComponentKind::WaterRunner => {
                let $pool = $($r)+ $pools.water_runner;
                $body
            }
            ComponentKind::AirTimer => {
                let $pool = $($r)+ $pools.air_timer;
                $body
            }
            ComponentKind::Emitter => {
                let $pool = $($r)+ $pools.emitter;
                $body
            }
        }
    };
    (ref $pools:expr, $kind:expr, |$pool:ident| $body:expr) => {
        with_pool!(@ [&] $pools, $kind, $pool, $body)
    };
    ($pools:expr, $kind:expr, |$pool:ident| $body:expr) => {
        with_pool!(@ [&mut] $pools, $kind, $pool, $body)
    };
}

impl ComponentPools {
    /// Pre-allocates every pool.
    ///
    /// # Panics
    ///
    /// Panics if a capacity in `config` is zero.
    #[must_use]
    pub fn new(config: &PoolConfig) -> Self {
        let n = config.component_capacity;
        let p = config.player_capacity;
        Self {
            bbox: SlotPool::new("bbox", n),
            transform: SlotPool::new("transform", n),
            tile_coord: SlotPool::new("tile_coord", n),
            movement_state: SlotPool::new("movement_state", n),
            jump: SlotPool::new("jump", p),
            player_state: SlotPool::new("player_state", p),
            container: SlotPool::new("container", n),
            hitboxes: SlotPool::new("hitboxes", n),
            hurtbox: SlotPool::new("hurtbox", n),
            sprite: SlotPool::new("sprite", n),
            moveable: SlotPool::new("moveable", n),
            life_timer: SlotPool::new("life_timer", n),
            water_runner: SlotPool::new("water_runner", n),
            air_timer: SlotPool::new("air_timer", n),
            emitter: SlotPool::new("emitter", n),
        }
    }

    /// Typed access to the pool of `C`.
    #[inline]
    #[must_use]
    pub fn get<C: Component>(&self) -> &SlotPool<C> {
        C::pool(self)
    }

    /// Typed mutable access to the pool of `C`.
    #[inline]
    pub fn get_mut<C: Component>(&mut self) -> &mut SlotPool<C> {
        C::pool_mut(self)
    }

    /// Frees a slot in the pool of `kind`. Stale handles are ignored.
    pub fn free(&mut self, kind: ComponentKind, handle: SlotHandle) -> bool {
        with_pool!(self, kind, |pool| pool.free(handle))
    }

    /// Returns the pool name and occupancy of `kind`.
    #[must_use]
    pub fn stats(&self, kind: ComponentKind) -> (&'static str, PoolStats) {
        with_pool!(ref self, kind, |pool| (pool.name(), pool.stats()))
    }

    /// Occupancy of every pool, in kind order.
    #[must_use]
    pub fn report(&self) -> [(&'static str, PoolStats); COMPONENT_KINDS] {
        ComponentKind::ALL.map(|kind| self.stats(kind))
    }

    /// Frees every slot of every pool.
    pub fn clear(&mut self) {
        for kind in ComponentKind::ALL {
            with_pool!(self, kind, |pool| pool.clear());
        }
    }
}

macro_rules! impl_component {
    ($($ty:ty => $kind:ident, $field:ident;)*) => {
        $(
            impl Component for $ty {
                const KIND: ComponentKind = ComponentKind::$kind;

                #[inline]
                fn pool(pools: &ComponentPools) -> &SlotPool<Self> {
                    &pools.$field
                }

                #[inline]
                fn pool_mut(pools: &mut ComponentPools) -> &mut SlotPool<Self> {
                    &mut pools.$field
                }
            }
        )*
    };
}

impl_component! {
    BoundingBox => BoundingBox, bbox;
    Transform => Transform, transform;
    TileCoord => TileCoord, tile_coord;
    MovementState => MovementState, movement_state;
    Jump => Jump, jump;
    PlayerState => PlayerState, player_state;
    Container => Container, container;
    HitBoxes => HitBoxes, hitboxes;
    Hurtbox => Hurtbox, hurtbox;
    Sprite => Sprite, sprite;
    Moveable => Moveable, moveable;
    LifeTimer => LifeTimer, life_timer;
    WaterRunner => WaterRunner, water_runner;
    AirTimer => AirTimer, air_timer;
    Emitter => Emitter, emitter;
}
