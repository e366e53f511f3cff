//! # Entity Archetypes
//!
//! One constructor per kind of level object. Each returns `None` when the
//! entity table or a component pool is full; a half-built entity is
//! removed again and its slots come back at the next flush.

use sluice_core::{
    AirTimer, BoundingBox, Container, ContainerItem, ContainerMaterial, Emitter, EntityId,
    EntityTag, HitBoxes, Hurtbox, Jump, LifeTimer, Moveable, MovementMode, MovementState,
    PlayerState, Sprite, SpriteBehavior, SpriteContext, TileCoord, Transform, WaterRunner,
};
use sluice_shared::constants::{
    ARROW_SPEED, BOMB_LAUNCH_SPEED, BOULDER_MOVE_SPEED, PLAYER_HEIGHT, PLAYER_WIDTH, TILE_SIZE,
};
use sluice_shared::{Rect, Vec2};
use tracing::warn;

use crate::assets::SpriteProvider;
use crate::world::World;

/// Flight direction of an arrow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrowDir {
    /// Towards -x.
    Left,
    /// Towards +x.
    Right,
    /// Towards -y.
    Up,
    /// Towards +y.
    Down,
}

impl ArrowDir {
    /// Unit vector of the direction.
    #[must_use]
    pub const fn unit(self) -> Vec2 {
        match self {
            Self::Left => Vec2::new(-1.0, 0.0),
            Self::Right => Vec2::new(1.0, 0.0),
            Self::Up => Vec2::new(0.0, -1.0),
            Self::Down => Vec2::new(0.0, 1.0),
        }
    }

    /// Hitbox of an arrow flying this way, relative to its tip anchor.
    #[must_use]
    pub const fn hitbox(self) -> Rect {
        match self {
            Self::Left => Rect::new(-14.0, -2.0, 10.0, 4.0),
            Self::Right => Rect::new(4.0, -2.0, 10.0, 4.0),
            Self::Up => Rect::new(-2.0, -14.0, 4.0, 10.0),
            Self::Down => Rect::new(-2.0, 4.0, 4.0, 10.0),
        }
    }
}

// =============================================================================
// SPRITE BEHAVIOURS
// =============================================================================

/// Player clip order in its sprite component.
const PLAYER_CLIPS: [&str; 2] = ["plr_stand", "plr_run"];

/// Stands still or runs depending on horizontal speed.
#[derive(Debug)]
pub struct PlayerSpriteBehavior;

impl SpriteBehavior for PlayerSpriteBehavior {
    fn next_clip(&self, ctx: &SpriteContext) -> usize {
        usize::from(ctx.velocity.x.abs() > 1.0)
    }
}

static PLAYER_SPRITE: PlayerSpriteBehavior = PlayerSpriteBehavior;

// =============================================================================
// HELPERS
// =============================================================================

/// Allocates an entity at `pos` and lets `build` attach its components. A
/// failed build removes the entity again, freeing whatever was attached.
fn spawn_with(
    world: &mut World,
    tag: EntityTag,
    pos: Vec2,
    build: impl FnOnce(&mut World, EntityId) -> Option<()>,
) -> Option<EntityId> {
    let id = world.manager.add_entity(tag, &mut world.ops)?;
    if let Some(record) = world.manager.get_entity_mut(id) {
        record.position = pos;
    }
    if build(world, id).is_some() {
        return Some(id);
    }
    warn!(entity = %id, ?tag, "Spawn abandoned, pool exhausted");
    world.destroy_entity(id);
    None
}

fn attach_sprite(
    world: &mut World,
    id: EntityId,
    sprites: &dyn SpriteProvider,
    clips: &[&str],
    behavior: Option<&'static dyn SpriteBehavior>,
) -> Option<()> {
    let spr = world.manager.add_component::<Sprite>(id, &mut world.ops)?;
    for (slot, name) in spr.clips.iter_mut().zip(clips) {
        *slot = sprites.clip(name);
    }
    spr.behavior = behavior;
    Some(())
}

fn attach_solid_box(world: &mut World, id: EntityId, fragile: bool) -> Option<()> {
    let size = TILE_SIZE as f32;
    let bbox = world.manager.add_component::<BoundingBox>(id, &mut world.ops)?;
    bbox.set(size, size);
    bbox.solid = true;
    bbox.fragile = fragile;
    Some(())
}

fn attach_tile_hurtbox(world: &mut World, id: EntityId, def: u8) -> Option<()> {
    let hurt = world.manager.add_component::<Hurtbox>(id, &mut world.ops)?;
    hurt.size = Vec2::splat(TILE_SIZE as f32);
    hurt.def = def;
    Some(())
}

// =============================================================================
// LEVEL OBJECTS
// =============================================================================

/// Spawns the player with its collision, combat and breath components.
pub fn spawn_player(
    world: &mut World,
    sprites: &dyn SpriteProvider,
    pos: Vec2,
) -> Option<EntityId> {
    spawn_with(world, EntityTag::Player, pos, |world, id| {
        let (w, h) = (PLAYER_WIDTH, PLAYER_HEIGHT);
        let jump_speed = world.config.player.jump_speed;
        let ops = &mut world.ops;
        let m = &mut world.manager;

        m.add_component::<BoundingBox>(id, ops)?.set(w, h);
        m.add_component::<Transform>(id, ops)?.active = true;
        *m.add_component::<Jump>(id, ops)? = Jump {
            jump_speed,
            jumps: 1,
            max_jumps: 1,
            jump_ready: true,
            ..Jump::default()
        };
        m.add_component::<PlayerState>(id, ops)?;
        m.add_component::<TileCoord>(id, ops)?;
        m.add_component::<MovementState>(id, ops)?;
        *m.add_component::<HitBoxes>(id, ops)? = HitBoxes {
            boxes: [Rect::new(0.0, -2.0, w, h + 4.0), Rect::new(-2.0, 0.0, w + 4.0, h)],
            n_boxes: 2,
            atk: 0,
            one_hit: false,
        };
        *m.add_component::<Hurtbox>(id, ops)? = Hurtbox {
            size: Vec2::new(w, h),
            def: 2,
            ..Hurtbox::default()
        };
        *m.add_component::<AirTimer>(id, ops)? = AirTimer {
            max_ftimer: 1.0,
            curr_ftimer: 2.0,
            decay_rate: 1.0,
            max_count: 10,
            curr_count: 10,
        };
        m.add_component::<Emitter>(id, ops)?.offset = Vec2::new(w / 2.0, 0.0);

        attach_sprite(world, id, sprites, &PLAYER_CLIPS, Some(&PLAYER_SPRITE))
    })
}

/// Spawns a crate that releases `item` when broken.
pub fn spawn_crate(
    world: &mut World,
    sprites: &dyn SpriteProvider,
    pos: Vec2,
    material: ContainerMaterial,
    item: ContainerItem,
) -> Option<EntityId> {
    let (shape, def, sprite) = match material {
        ContainerMaterial::Metal => (0.7, 2, "metal_crate"),
        ContainerMaterial::Wooden => (0.8, 1, "wooden_crate"),
    };
    spawn_with(world, EntityTag::Crate, pos, |world, id| {
        attach_solid_box(world, id, false)?;
        let t = world.manager.add_component::<Transform>(id, &mut world.ops)?;
        t.grav_delay = 0.2;
        t.shape_factor = Vec2::splat(shape);
        world.manager.add_component::<MovementState>(id, &mut world.ops)?;
        world.manager.add_component::<TileCoord>(id, &mut world.ops)?;
        attach_tile_hurtbox(world, id, def)?;
        *world.manager.add_component::<Container>(id, &mut world.ops)? =
            Container { material, item };
        attach_sprite(world, id, sprites, &[sprite], None)
    })
}

/// Spawns a boulder that rolls off ledges and crushes wooden tiles.
pub fn spawn_boulder(
    world: &mut World,
    sprites: &dyn SpriteProvider,
    pos: Vec2,
) -> Option<EntityId> {
    spawn_with(world, EntityTag::Boulder, pos, |world, id| {
        attach_solid_box(world, id, false)?;
        let t = world.manager.add_component::<Transform>(id, &mut world.ops)?;
        t.grav_delay = 1.0 / 12.0;
        t.active = true;
        t.shape_factor = Vec2::splat(0.6);
        world.manager.add_component::<MovementState>(id, &mut world.ops)?.ground_state = 0b11;
        world.manager.add_component::<TileCoord>(id, &mut world.ops)?;
        world
            .manager
            .add_component::<Moveable>(id, &mut world.ops)?
            .move_speed = BOULDER_MOVE_SPEED;
        attach_tile_hurtbox(world, id, 2)?;
        attach_sprite(world, id, sprites, &["boulder"], None)
    })
}

/// Spawns a chest holding one coin.
pub fn spawn_chest(world: &mut World, sprites: &dyn SpriteProvider, pos: Vec2) -> Option<EntityId> {
    spawn_with(world, EntityTag::Chest, pos, |world, id| {
        attach_solid_box(world, id, true)?;
        let t = world.manager.add_component::<Transform>(id, &mut world.ops)?;
        t.grav_delay = 0.3;
        t.active = true;
        t.shape_factor = Vec2::splat(0.7);
        world.manager.add_component::<MovementState>(id, &mut world.ops)?;
        world.manager.add_component::<TileCoord>(id, &mut world.ops)?;
        attach_tile_hurtbox(world, id, 4)?;
        attach_sprite(world, id, sprites, &["chest"], None)
    })
}

/// Spawns an arrow anchored at its tip, flying in `dir`.
pub fn spawn_arrow(
    world: &mut World,
    sprites: &dyn SpriteProvider,
    pos: Vec2,
    dir: ArrowDir,
) -> Option<EntityId> {
    spawn_with(world, EntityTag::Arrow, pos, |world, id| {
        world.manager.add_component::<TileCoord>(id, &mut world.ops)?;
        *world.manager.add_component::<HitBoxes>(id, &mut world.ops)? = HitBoxes {
            boxes: [dir.hitbox(), Rect::default()],
            n_boxes: 1,
            atk: 3,
            one_hit: true,
        };
        let t = world.manager.add_component::<Transform>(id, &mut world.ops)?;
        t.movement_mode = MovementMode::Kinematic;
        t.active = true;
        t.velocity = dir.unit() * ARROW_SPEED;
        attach_sprite(world, id, sprites, &["arrow"], None)?;
        world.manager.get_component_mut::<Sprite>(id)?.flip_x = dir == ArrowDir::Left;
        Some(())
    })
}

/// Spawns a lit bomb thrown along `dir`. It explodes on its first hit.
pub fn spawn_bomb(
    world: &mut World,
    sprites: &dyn SpriteProvider,
    pos: Vec2,
    dir: Vec2,
) -> Option<EntityId> {
    spawn_with(world, EntityTag::Destructible, pos, |world, id| {
        world.manager.add_component::<TileCoord>(id, &mut world.ops)?;
        world.manager.add_component::<MovementState>(id, &mut world.ops)?;
        *world.manager.add_component::<HitBoxes>(id, &mut world.ops)? = HitBoxes {
            boxes: [Rect::new(-13.0, -13.0, 26.0, 26.0), Rect::default()],
            n_boxes: 1,
            atk: 0,
            one_hit: true,
        };
        world
            .manager
            .add_component::<Container>(id, &mut world.ops)?
            .item = ContainerItem::Explosion;
        let t = world.manager.add_component::<Transform>(id, &mut world.ops)?;
        t.active = true;
        t.shape_factor = Vec2::splat(0.1);
        t.movement_mode = MovementMode::Regular;
        t.velocity = dir.normalize() * BOMB_LAUNCH_SPEED;
        attach_sprite(world, id, sprites, &["bomb"], None)
    })
}

/// Spawns a short-lived blast centred on `pos`.
pub fn spawn_explosion(
    world: &mut World,
    sprites: &dyn SpriteProvider,
    pos: Vec2,
) -> Option<EntityId> {
    spawn_with(world, EntityTag::Destructible, pos, |world, id| {
        world.manager.add_component::<TileCoord>(id, &mut world.ops)?;
        *world.manager.add_component::<HitBoxes>(id, &mut world.ops)? = HitBoxes {
            boxes: [Rect::new(-36.0, -36.0, 72.0, 72.0), Rect::default()],
            n_boxes: 1,
            atk: 3,
            one_hit: false,
        };
        let t = world.manager.add_component::<Transform>(id, &mut world.ops)?;
        t.movement_mode = MovementMode::Kinematic;
        t.active = true;
        world.manager.add_component::<LifeTimer>(id, &mut world.ops)?.life_time = 0.05;
        attach_sprite(world, id, sprites, &["explosion"], None)
    })
}

/// Spawns the exit flag centred on `pos`.
pub fn spawn_level_end(
    world: &mut World,
    sprites: &dyn SpriteProvider,
    pos: Vec2,
) -> Option<EntityId> {
    spawn_with(world, EntityTag::LevelEnd, pos, |world, id| {
        world.manager.add_component::<TileCoord>(id, &mut world.ops)?;
        attach_sprite(world, id, sprites, &["flag"], None)
    })
}

/// Spawns a water runner starting its search at `start_tile`.
pub fn spawn_water_runner(world: &mut World, start_tile: u32) -> Option<EntityId> {
    let (width, height) = (world.grid.width(), world.grid.height());
    let water = world.config.water;
    spawn_with(world, EntityTag::DynamicMemory, Vec2::ZERO, |world, id| {
        let runner = world.manager.add_component::<WaterRunner>(id, &mut world.ops)?;
        runner.allocate(width, height);
        runner.current_tile = start_tile as i32;
        runner.movement_delay = water.movement_delay;
        runner.movement_speed = water.movement_speed;
        Some(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetRegistry;
    use crate::config::SimConfig;
    use crate::tilemap::TileGrid;
    use sluice_core::RunnerState;

    fn world() -> World {
        World::new(SimConfig::default(), TileGrid::new(8, 8).unwrap())
    }

    #[test]
    fn test_player_layout() {
        let mut w = world();
        let mut assets = AssetRegistry::new();
        assets.add_sprite("plr_stand", 1, 0);
        assets.add_sprite("plr_run", 6, 2);
        let id = spawn_player(&mut w, &assets, Vec2::new(10.0, 20.0)).unwrap();

        assert_eq!(w.manager.position(id), Some(Vec2::new(10.0, 20.0)));
        let bbox = w.manager.get_component::<BoundingBox>(id).unwrap();
        assert_eq!(bbox.size, Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT));
        assert!(!bbox.solid);
        let spr = w.manager.get_component::<Sprite>(id).unwrap();
        assert_eq!(spr.clips[1].frame_count, 6);
        assert!(spr.behavior.is_some());
        let jump = w.manager.get_component::<Jump>(id).unwrap();
        assert_eq!(jump.jumps, 1);
        assert!(jump.jump_ready);
    }

    #[test]
    fn test_arrow_velocity_follows_direction() {
        let mut w = world();
        let assets = AssetRegistry::new();
        let up = spawn_arrow(&mut w, &assets, Vec2::new(50.0, 50.0), ArrowDir::Up).unwrap();
        let t = w.manager.get_component::<Transform>(up).unwrap();
        assert_eq!(t.velocity, Vec2::new(0.0, -ARROW_SPEED));
        assert_eq!(t.movement_mode, MovementMode::Kinematic);
        let hb = w.manager.get_component::<HitBoxes>(up).unwrap();
        assert_eq!(hb.active(), &[Rect::new(-2.0, -14.0, 4.0, 10.0)]);
    }

    #[test]
    fn test_crate_material_sets_defence() {
        let mut w = world();
        let assets = AssetRegistry::new();
        let metal = spawn_crate(
            &mut w,
            &assets,
            Vec2::ZERO,
            ContainerMaterial::Metal,
            ContainerItem::Bomb,
        )
        .unwrap();
        let wood = spawn_crate(
            &mut w,
            &assets,
            Vec2::new(32.0, 0.0),
            ContainerMaterial::Wooden,
            ContainerItem::Empty,
        )
        .unwrap();
        assert_eq!(w.manager.get_component::<Hurtbox>(metal).unwrap().def, 2);
        assert_eq!(w.manager.get_component::<Hurtbox>(wood).unwrap().def, 1);
        assert_eq!(
            w.manager.get_component::<Container>(metal).unwrap().item,
            ContainerItem::Bomb
        );
    }

    #[test]
    fn test_water_runner_sized_to_grid() {
        let mut w = world();
        let id = spawn_water_runner(&mut w, 9).unwrap();
        let runner = w.manager.get_component::<WaterRunner>(id).unwrap();
        assert_eq!(runner.len(), 64);
        assert_eq!(runner.current_tile, 9);
        assert_eq!(runner.state, RunnerState::Reset);
    }

    #[test]
    fn test_player_behavior_runs_when_moving() {
        let ctx = SpriteContext {
            velocity: Vec2::new(120.0, 0.0),
            ..SpriteContext::default()
        };
        assert_eq!(PLAYER_SPRITE.next_clip(&ctx), 1);
        assert_eq!(PLAYER_SPRITE.next_clip(&SpriteContext::default()), 0);
    }
}
