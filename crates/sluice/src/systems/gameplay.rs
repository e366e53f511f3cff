//! Gameplay passes: damage, hazards, timers, containers and level
//! progress.

use sluice_core::{
    AirTimer, BoundingBox, ComponentKind, Container, ContainerItem, Emitter, EntityId, EntityTag,
    HitBoxes, Hurtbox, Jump, LifeTimer, MovementState, PlayerState, Transform,
};
use sluice_shared::constants::TILE_SIZE;
use sluice_shared::{Rect, Vec2};
use tracing::{debug, info};

use crate::archetypes::{spawn_arrow, spawn_bomb, spawn_explosion, ArrowDir};
use crate::assets::SpriteProvider;
use crate::collision::TileArea;
use crate::geometry::{find_aabb_overlap, point_in_aabb, OverlapKind};
use crate::tilemap::TileType;
use crate::world::{LevelState, World};

/// Upward speed of a player bouncing off a crate it broke from above.
const CRATE_BOUNCE_SPEED: f32 = 400.0;
/// Bounce speed while holding jump.
const CRATE_BOUNCE_JUMP_SPEED: f32 = 600.0;
/// Delay before a broken crate or body disappears.
const BREAK_DELAY: f32 = 0.05;
/// Delay before a broken bomb crate disappears.
const BOMB_BREAK_DELAY: f32 = 0.1;

fn overlaps(a: Rect, b: Rect) -> bool {
    find_aabb_overlap(a, b).0 != OverlapKind::None
}

// =============================================================================
// DAMAGE
// =============================================================================

/// Effect of one hitbox touching one hurtbox.
fn apply_hit(world: &mut World, attacker: EntityId, victim: EntityId) {
    let (Some(att), Some(vic), Some(hurt)) = (
        world.manager.get_entity(attacker),
        world.manager.get_entity(victim),
        world.manager.get_component::<Hurtbox>(victim).copied(),
    ) else {
        return;
    };
    let (att_tag, vic_tag) = (att.tag(), vic.tag());
    let (att_pos, vic_pos) = (att.position, vic.position);

    let mut atk = world
        .manager
        .get_component::<HitBoxes>(attacker)
        .map_or(0, |h| h.atk);
    // Players always crack chests open
    if att_tag == EntityTag::Player && vic_tag == EntityTag::Chest {
        atk = hurt.def.saturating_add(1);
    }
    if atk <= hurt.def {
        return;
    }

    if let Some(h) = world.manager.get_component_mut::<Hurtbox>(victim) {
        h.damage_src = Some(attacker);
    }

    if vic_tag == EntityTag::Crate && world.manager.has_component::<PlayerState>(attacker) {
        crate_bounce(world, attacker, att_pos, victim, vic_pos);
    }

    if att_tag == EntityTag::Player {
        world.destroy_entity(victim);
        if vic_tag == EntityTag::Chest {
            world.coins.current += 1;
            debug!(current = world.coins.current, total = world.coins.total, "Coin collected");
        }
    } else if vic_tag == EntityTag::Player {
        world.destroy_entity(victim);
    } else {
        // Not iterating hurtboxes, so the hurtbox can go right away
        world.manager.remove_component_immediate::<Hurtbox>(victim, &mut world.grid);
        let bomb = world
            .manager
            .get_component::<Container>(victim)
            .is_some_and(|c| c.item == ContainerItem::Bomb);
        let delay = if vic_tag == EntityTag::Crate && bomb {
            BOMB_BREAK_DELAY
        } else {
            BREAK_DELAY
        };
        if let Some(timer) = world.manager.add_component::<LifeTimer>(victim, &mut world.ops) {
            timer.life_time = delay;
        }
    }
}

/// Player velocity after breaking a crate: bounce from above, stop from
/// below, stop sideways otherwise.
fn crate_bounce(
    world: &mut World,
    player: EntityId,
    pos: Vec2,
    crate_id: EntityId,
    crate_pos: Vec2,
) {
    let (Some(bbox), Some(crate_bbox), Some(p)) = (
        world.manager.get_component::<BoundingBox>(player).copied(),
        world.manager.get_component::<BoundingBox>(crate_id).copied(),
        world.manager.get_component::<PlayerState>(player).copied(),
    ) else {
        return;
    };

    if pos.y + bbox.size.y <= crate_pos.y {
        let speed = if p.jump_pressed {
            if let Some(jump) = world.manager.get_component_mut::<Jump>(player) {
                jump.short_hop = false;
                jump.jumped = true;
            }
            CRATE_BOUNCE_JUMP_SPEED
        } else {
            CRATE_BOUNCE_SPEED
        };
        if let Some(t) = world.manager.get_component_mut::<Transform>(player) {
            t.velocity.y = -speed;
        }
    } else if let Some(t) = world.manager.get_component_mut::<Transform>(player) {
        if pos.y >= crate_pos.y + crate_bbox.size.y {
            t.velocity.y = 0.0;
        } else {
            t.velocity.x = 0.0;
        }
    }
}

/// Resolves hitboxes against tiles and hurtboxes.
///
/// A hit on a tile whose toughness is below the attack destroys it. A hit on
/// a hurtbox whose defence is below the attack breaks the owner: players
/// destroy their victims at once, anything else starts a short life timer
/// so containers can release their item. One-hit attackers are destroyed by
/// any contact.
pub fn hitbox_update_system(world: &mut World) {
    let ts = TILE_SIZE as f32;
    let mut checked: Vec<EntityId> = Vec::new();
    let mut tiles: Vec<u32> = Vec::new();
    let mut occupants: Vec<EntityId> = Vec::new();

    let ids = world.take_ids(ComponentKind::HitBoxes);
    for &id in &ids {
        let (Some(pos), Some(hitboxes)) = (
            world.manager.position(id),
            world.manager.get_component::<HitBoxes>(id).copied(),
        ) else {
            continue;
        };
        if !world.manager.is_alive(id) {
            continue;
        }

        let mut hit = false;
        checked.clear();
        for local in hitboxes.active() {
            let hitbox = Rect::new(pos.x + local.x, pos.y + local.y, local.width, local.height);
            let area = TileArea {
                x1: (hitbox.x / ts).floor() as i32,
                y1: (hitbox.y / ts).floor() as i32,
                x2: ((hitbox.x + hitbox.width) / ts).floor() as i32,
                y2: ((hitbox.y + hitbox.height) / ts).floor() as i32,
            };
            tiles.clear();
            tiles.extend(area.indices(&world.grid));

            for &idx in &tiles {
                let Some(tile) = world.grid.tile(idx) else {
                    continue;
                };
                if tile.tile_type != TileType::Empty
                    && overlaps(hitbox, world.grid.tile_rect(idx))
                {
                    hit = true;
                    if hitboxes.atk > tile.def {
                        world.destroy_tile(idx);
                        continue;
                    }
                }

                occupants.clear();
                if let Some(tile) = world.grid.tile(idx) {
                    occupants.extend(tile.entities.iter().copied());
                }
                for &other in &occupants {
                    if other == id || checked.contains(&other) || !world.manager.is_alive(other) {
                        continue;
                    }
                    let (Some(other_pos), Some(hurt)) = (
                        world.manager.position(other),
                        world.manager.get_component::<Hurtbox>(other).copied(),
                    ) else {
                        continue;
                    };
                    let hurtbox = Rect::from_pos_size(other_pos + hurt.offset, hurt.size);
                    if overlaps(hitbox, hurtbox) {
                        checked.push(other);
                        hit = true;
                        apply_hit(world, id, other);
                    }
                }
            }
        }

        if hitboxes.one_hit && hit {
            world.destroy_entity(id);
        }
    }
    world.release_ids(ids);
}

// =============================================================================
// HAZARDS
// =============================================================================

/// Boulders crush the one-way platform under them and the platforms on
/// either side of it.
pub fn boulder_destroy_wooden_tile_system(world: &mut World) {
    let ids = world.take_tagged(EntityTag::Boulder);
    for &id in &ids {
        let (Some(pos), Some(bbox)) = (
            world.manager.position(id),
            world.manager.get_component::<BoundingBox>(id).copied(),
        ) else {
            continue;
        };
        let foot = Vec2::new(pos.x + bbox.half_size.x, pos.y + bbox.size.y + 1.0);
        let Some(idx) = world.grid.index_at(foot) else {
            continue;
        };
        if world.grid.tile(idx).map(|t| t.tile_type) != Some(TileType::OneWay) {
            continue;
        }

        world.destroy_tile(idx);
        let (tx, ty) = world.grid.coords(idx);
        for dx in [-1, 1] {
            let Some(side) = world.grid.index(tx as i32 + dx, ty as i32) else {
                continue;
            };
            if world.grid.tile(side).map(|t| t.tile_type) == Some(TileType::OneWay) {
                world.destroy_tile(side);
            }
        }
    }
    world.release_ids(ids);
}

/// Spikes kill players and are destroyed by anything else touching them.
pub fn spike_collision_system(world: &mut World) {
    let mut tiles: Vec<u32> = Vec::new();

    let ids = world.take_ids(ComponentKind::BoundingBox);
    for &id in &ids {
        let (Some(record), Some(bbox)) = (
            world.manager.get_entity(id),
            world.manager.get_component::<BoundingBox>(id).copied(),
        ) else {
            continue;
        };
        if !record.is_alive() {
            continue;
        }
        let tag = record.tag();
        let body = Rect::from_pos_size(record.position, bbox.size);

        tiles.clear();
        tiles.extend(TileArea::covering(body).indices(&world.grid));
        for &idx in &tiles {
            let is_spike = world
                .grid
                .tile(idx)
                .is_some_and(|t| t.tile_type == TileType::Spikes);
            if !is_spike || !overlaps(body, world.grid.tile_rect(idx)) {
                continue;
            }
            if tag == EntityTag::Player {
                world.destroy_entity(id);
                break;
            }
            world.destroy_tile(idx);
        }
    }
    world.release_ids(ids);
}

// =============================================================================
// TIMERS
// =============================================================================

/// Counts life timers down and destroys their owners at zero.
pub fn lifetimer_update_system(world: &mut World, dt: f32) {
    let ids = world.take_ids(ComponentKind::LifeTimer);
    for &id in &ids {
        let Some(timer) = world.manager.get_component_mut::<LifeTimer>(id) else {
            continue;
        };
        timer.life_time -= dt;
        if timer.life_time <= 0.0 {
            world.destroy_entity(id);
        }
    }
    world.release_ids(ids);
}

/// Point whose submersion decides whether an entity is breathing.
fn breath_point(pos: Vec2, bbox: Option<&BoundingBox>, on_ground: bool) -> Vec2 {
    match bbox {
        Some(b) if on_ground => pos + Vec2::new(b.half_size.x, b.half_size.y / 2.0),
        Some(b) => pos + Vec2::new(b.half_size.x, b.half_size.y / 3.0),
        None => pos,
    }
}

/// Drains the breath of submerged entities.
///
/// Out of water the meter refills and the first bubble lasts twice as long.
/// Each expired bubble consumes one count; with none left, players die and
/// anything else is destroyed.
pub fn airtimer_update_system(world: &mut World, dt: f32) {
    let ids = world.take_ids(ComponentKind::AirTimer);
    for &id in &ids {
        let Some(pos) = world.manager.position(id) else {
            continue;
        };
        if !world.manager.is_alive(id) {
            continue;
        }
        let on_ground = world
            .manager
            .get_component::<MovementState>(id)
            .is_some_and(MovementState::on_ground);
        let point = breath_point(pos, world.manager.get_component::<BoundingBox>(id), on_ground);
        let submerged = world
            .grid
            .index_at(point)
            .and_then(|idx| world.grid.water_rect(idx))
            .is_some_and(|water| point_in_aabb(point, water));

        if let Some(emitter) = world.manager.get_component_mut::<Emitter>(id) {
            emitter.active = submerged;
        }
        let Some(air) = world.manager.get_component_mut::<AirTimer>(id) else {
            continue;
        };

        if !submerged {
            air.curr_count = air.max_count;
            air.curr_ftimer = air.max_ftimer * 2.0;
            continue;
        }

        let drain = air.decay_rate * dt;
        if air.curr_ftimer > drain {
            air.curr_ftimer -= drain;
        } else if air.curr_count > 0 {
            air.curr_count -= 1;
            air.curr_ftimer += air.max_ftimer;
        } else {
            debug!(entity = %id, "Out of air");
            world.destroy_entity(id);
        }
    }
    world.release_ids(ids);
}

// =============================================================================
// CONTAINERS
// =============================================================================

/// Releases the item of every container destroyed this frame.
///
/// Arrows spawn on the side they fly towards. A bomb hit by a player is
/// launched away from it, otherwise it blows up in place.
pub fn container_destroy_system(world: &mut World, sprites: &dyn SpriteProvider) {
    let half = TILE_SIZE as f32 / 2.0;
    let full = TILE_SIZE as f32;

    let ids = world.take_ids(ComponentKind::Container);
    for &id in &ids {
        let (Some(record), Some(container)) = (
            world.manager.get_entity(id),
            world.manager.get_component::<Container>(id).copied(),
        ) else {
            continue;
        };
        if record.is_alive() {
            continue;
        }
        let pos = record.position;

        let spawned = match container.item {
            ContainerItem::LeftArrow => {
                spawn_arrow(world, sprites, pos + Vec2::new(0.0, half), ArrowDir::Left)
            }
            ContainerItem::RightArrow => {
                spawn_arrow(world, sprites, pos + Vec2::new(full, half), ArrowDir::Right)
            }
            ContainerItem::UpArrow => {
                spawn_arrow(world, sprites, pos + Vec2::new(half, 0.0), ArrowDir::Up)
            }
            ContainerItem::DownArrow => {
                spawn_arrow(world, sprites, pos + Vec2::new(half, full), ArrowDir::Down)
            }
            ContainerItem::Bomb => match bomb_launch_dir(world, id, pos) {
                Some(dir) => spawn_bomb(world, sprites, pos + Vec2::splat(half), dir),
                None => spawn_explosion(world, sprites, pos + Vec2::splat(half)),
            },
            ContainerItem::Explosion => spawn_explosion(world, sprites, pos + Vec2::splat(half)),
            ContainerItem::Empty | ContainerItem::Coin => None,
        };
        if spawned.is_some() {
            debug!(entity = %id, item = ?container.item, "Container released its item");
        }
    }
    world.release_ids(ids);
}

/// Launch direction for a bomb broken by a player, away from the player.
fn bomb_launch_dir(world: &World, id: EntityId, pos: Vec2) -> Option<Vec2> {
    let src = world.manager.get_component::<Hurtbox>(id)?.damage_src?;
    let src_record = world.manager.get_entity(src)?;
    if src_record.tag() != EntityTag::Player {
        return None;
    }
    let src_size = world.manager.get_component::<BoundingBox>(src)?.size;
    let size = world.manager.get_component::<BoundingBox>(id)?.size;

    let mut dir = Vec2::new(0.0, -1.0);
    if src_record.position.x + src_size.x <= pos.x {
        dir.x = 1.0;
    } else if src_record.position.x >= pos.x + size.x {
        dir.x = -1.0;
    }
    Some(dir)
}

// =============================================================================
// LEVEL PROGRESS
// =============================================================================

/// Completes the level when a player touches the exit with every coin
/// collected.
pub fn level_end_detection_system(world: &mut World) {
    if !world.coins.all_collected() {
        return;
    }
    let half = TILE_SIZE as f32 / 2.0;
    let mut finishers: Vec<EntityId> = Vec::new();

    let flags = world.take_tagged(EntityTag::LevelEnd);
    for &flag in &flags {
        let Some(flag_pos) = world.manager.position(flag) else {
            continue;
        };
        let Some(tile) = world.grid.index_at(flag_pos).and_then(|idx| world.grid.tile(idx)) else {
            continue;
        };
        let exit = Rect::from_pos_size(flag_pos - Vec2::splat(half), Vec2::splat(TILE_SIZE as f32));
        for &other in &tile.entities {
            let Some(record) = world.manager.get_entity(other) else {
                continue;
            };
            if record.tag() != EntityTag::Player || !record.is_alive() {
                continue;
            }
            let Some(bbox) = world.manager.get_component::<BoundingBox>(other) else {
                continue;
            };
            if overlaps(exit, Rect::from_pos_size(record.position, bbox.size)) {
                finishers.push(other);
            }
        }
    }
    world.release_ids(flags);

    for id in finishers {
        world.destroy_entity(id);
        world.state = LevelState::Complete;
        info!(coins = world.coins.current, "Level complete");
    }
}

/// Flags the level as lost once a player has died.
pub fn check_player_dead_system(world: &mut World) {
    if world.state != LevelState::Playing {
        return;
    }
    let dead = world
        .manager
        .entities_tagged(EntityTag::Player)
        .any(|id| world.manager.has_component::<PlayerState>(id) && !world.manager.is_alive(id));
    if dead {
        world.state = LevelState::PlayerDead;
        info!("Player died");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetypes::{spawn_chest, spawn_crate, spawn_player};
    use crate::assets::AssetRegistry;
    use crate::config::SimConfig;
    use crate::systems::update_tilemap_system;
    use crate::tilemap::TileGrid;
    use sluice_core::ContainerMaterial;

    fn world() -> World {
        World::new(SimConfig::default(), TileGrid::new(10, 10).unwrap())
    }

    #[test]
    fn test_lifetimer_destroys_at_zero() {
        let mut w = world();
        let id = w.manager.add_entity(EntityTag::Destructible, &mut w.ops).unwrap();
        w.manager.add_component::<LifeTimer>(id, &mut w.ops).unwrap().life_time = 0.05;
        w.flush();

        lifetimer_update_system(&mut w, 0.03);
        assert!(w.manager.is_alive(id));
        lifetimer_update_system(&mut w, 0.03);
        assert!(!w.manager.is_alive(id));
    }

    #[test]
    fn test_player_opens_chest_for_a_coin() {
        let mut w = world();
        let assets = AssetRegistry::default();
        let player = spawn_player(&mut w, &assets, Vec2::new(64.0, 64.0)).unwrap();
        let chest = spawn_chest(&mut w, &assets, Vec2::new(86.0, 64.0)).unwrap();
        w.coins.total = 1;
        w.flush();
        update_tilemap_system(&mut w);

        hitbox_update_system(&mut w);
        assert!(w.manager.is_alive(player));
        assert!(!w.manager.is_alive(chest));
        assert_eq!(w.coins.current, 1);
        assert!(w.coins.all_collected());
    }

    #[test]
    fn test_arrow_breaks_crate_with_delay() {
        let mut w = world();
        let assets = AssetRegistry::default();
        let target = spawn_crate(
            &mut w,
            &assets,
            Vec2::new(128.0, 64.0),
            ContainerMaterial::Wooden,
            ContainerItem::Empty,
        )
        .unwrap();
        let arrow = spawn_arrow(&mut w, &assets, Vec2::new(120.0, 80.0), ArrowDir::Right).unwrap();
        w.flush();
        update_tilemap_system(&mut w);

        hitbox_update_system(&mut w);
        assert!(!w.manager.is_alive(arrow));
        assert!(w.manager.is_alive(target));
        assert!(!w.manager.has_component::<Hurtbox>(target));
        let timer = w.manager.get_component::<LifeTimer>(target).unwrap();
        assert!((timer.life_time - BREAK_DELAY).abs() < f32::EPSILON);
    }

    #[test]
    fn test_destroyed_arrow_crate_spawns_arrow() {
        let mut w = world();
        let assets = AssetRegistry::default();
        let source = spawn_crate(
            &mut w,
            &assets,
            Vec2::new(64.0, 64.0),
            ContainerMaterial::Metal,
            ContainerItem::LeftArrow,
        )
        .unwrap();
        w.flush();
        w.destroy_entity(source);
        container_destroy_system(&mut w, &assets);
        w.flush();

        let arrows: Vec<_> = w.manager.entities_tagged(EntityTag::Arrow).collect();
        assert_eq!(arrows.len(), 1);
        assert_eq!(w.manager.position(arrows[0]), Some(Vec2::new(64.0, 80.0)));
        let t = w.manager.get_component::<Transform>(arrows[0]).unwrap();
        assert!(t.velocity.x < 0.0);
    }

    #[test]
    fn test_spikes_kill_player() {
        let mut w = world();
        let assets = AssetRegistry::default();
        let spikes = w.grid.index(2, 3).unwrap();
        w.change_tile(spikes, TileType::Spikes);
        // Spikes with no solid neighbour fill the bottom half of the tile
        let player = spawn_player(&mut w, &assets, Vec2::new(64.0, 80.0)).unwrap();
        w.flush();

        spike_collision_system(&mut w);
        assert!(!w.manager.is_alive(player));
        check_player_dead_system(&mut w);
        assert_eq!(w.state, LevelState::PlayerDead);
    }

    #[test]
    fn test_drowning_after_bubbles_run_out() {
        let mut w = world();
        let assets = AssetRegistry::default();
        for ty in 0..4 {
            let idx = w.grid.index(2, ty).unwrap();
            w.grid.set_water_level(idx, 4);
        }
        let player = spawn_player(&mut w, &assets, Vec2::new(68.0, 40.0)).unwrap();
        w.flush();

        airtimer_update_system(&mut w, 0.1);
        let air = *w.manager.get_component::<AirTimer>(player).unwrap();
        assert_eq!(air.curr_count, air.max_count);
        assert!(w.manager.get_component::<Emitter>(player).unwrap().active);

        for _ in 0..200 {
            airtimer_update_system(&mut w, 0.1);
        }
        assert!(!w.manager.is_alive(player));
    }
}
