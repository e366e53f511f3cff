//! Player passes: input to acceleration, box reshaping, pushing, crushing
//! and the ground/air jump bookkeeping.
//!
//! All of them walk the [`PlayerState`] owners, so a body tagged as a player
//! but without player state is simulated like any other body.

use sluice_core::{
    BoundingBox, ComponentKind, EntityId, HitBoxes, Hurtbox, Jump, Moveable, MovementMode,
    MovementState, PlayerState, Transform,
};
use sluice_shared::constants::{
    PLAYER_C_HEIGHT, PLAYER_C_WIDTH, PLAYER_HEIGHT, PLAYER_WIDTH, TILE_SIZE,
};
use sluice_shared::{Rect, Vec2};

use crate::collision::{ContactEdges, Hit};
use crate::geometry::point_in_aabb;
use crate::tilemap::TileType;
use crate::world::World;

/// Movement acceleration divisor while swimming.
const SWIM_ACCEL_DIVISOR: f32 = 1.2;
/// Jump speed divisor when jumping off a ladder.
const LADDER_JUMP_DIVISOR: f32 = 1.4;
/// Jump speed divisor when jumping out of water.
const WATER_JUMP_DIVISOR: f32 = 1.75;

fn tile_type_at(world: &World, pos: Vec2) -> Option<TileType> {
    world
        .grid
        .index_at(pos)
        .and_then(|idx| world.grid.tile(idx))
        .map(|t| t.tile_type)
}

// =============================================================================
// INPUT
// =============================================================================

/// Turns the player's requested direction into acceleration, handles
/// ladders, crouching, the short hop and jumps.
#[allow(clippy::too_many_lines)]
pub fn player_movement_input_system(world: &mut World) {
    let tuning = world.config.player;
    let ts = TILE_SIZE as f32;

    let ids = world.take_ids(ComponentKind::PlayerState);
    for &id in &ids {
        let (Some(mut pos), Some(bbox), Some(mut t), Some(mut jump), Some(mstate), Some(mut p)) = (
            world.manager.position(id),
            world.manager.get_component::<BoundingBox>(id).copied(),
            world.manager.get_component::<Transform>(id).copied(),
            world.manager.get_component::<Jump>(id).copied(),
            world.manager.get_component::<MovementState>(id).copied(),
            world.manager.get_component::<PlayerState>(id).copied(),
        ) else {
            continue;
        };
        if !world.manager.is_alive(id) {
            continue;
        }
        let on_ground = mstate.on_ground();
        let in_water = mstate.in_water();

        if !p.ladder_state {
            if !p.locked {
                if p.player_dir.y < 0.0 {
                    let at = tile_type_at(world, pos + bbox.half_size);
                    if at == Some(TileType::Ladder) && t.velocity.y >= 0.0 {
                        p.ladder_state = true;
                        pos.y -= 1.0;
                    }
                } else if p.player_dir.y > 0.0 {
                    let contact = if on_ground {
                        Vec2::new(pos.x + bbox.half_size.x, pos.y + bbox.size.y)
                    } else {
                        pos + bbox.half_size
                    };
                    if tile_type_at(world, contact) == Some(TileType::Ladder) {
                        p.ladder_state = true;
                        pos.y += 1.0;
                    }
                }
            }
        } else {
            let tile_x = ((pos.x + bbox.half_size.x) / ts).floor() as i32;
            let tile_y1 = ((pos.y + bbox.half_size.y) / ts).floor() as i32;
            let tile_y2 = ((pos.y + bbox.size.y) / ts).floor() as i32;

            p.ladder_state = !on_ground
                && (tile_y1..=tile_y2).any(|ty| {
                    world
                        .grid
                        .index(tile_x, ty)
                        .and_then(|idx| world.grid.tile(idx))
                        .is_some_and(|tile| tile.tile_type == TileType::Ladder)
                });

            if p.ladder_state {
                let scale = if p.locked { 0.0 } else { 1.0 };
                t.velocity.y = p.player_dir.y * tuning.ladder_climb_speed * scale;
                t.velocity.x = p.player_dir.x * tuning.ladder_strafe_speed * scale;
                if p.player_dir.y != 0.0 {
                    // Centre on the ladder while climbing
                    pos.x = tile_x as f32 * ts + ts / 2.0 - bbox.half_size.x;
                }
            }
        }

        if p.locked {
            if p.is_crouch & 1 != 0 {
                p.is_crouch |= 0b10;
            }
        } else {
            if p.player_dir.y > 0.0 {
                p.is_crouch |= 0b10;
            }
            // Stay crouched while there is no headroom to stand
            let stand_pos = pos + Vec2::new(0.0, bbox.size.y - PLAYER_HEIGHT);
            if world.collision().check_collision_at(id, stand_pos, bbox.size) == Hit::Rigid {
                p.is_crouch |= 0b10;
            }
            if !on_ground {
                p.is_crouch &= 0b01;
            }
        }

        if !in_water {
            p.player_dir.y = 0.0;
        }

        if !p.locked {
            let divisor = if in_water { SWIM_ACCEL_DIVISOR } else { 1.0 };
            t.accel = p.player_dir.normalize() * (tuning.move_accel / divisor);
            if p.is_crouch & 1 != 0 {
                t.accel = t.accel * 0.5;
            }
        }

        if jump.jumped && (!p.jump_pressed || p.locked) {
            jump.jump_released = true;
            if !jump.short_hop && t.velocity.y < 0.0 {
                jump.short_hop = true;
                t.velocity.y /= 2.0;
            }
        }

        if !p.locked && jump.jump_released && p.jump_pressed && jump.jumps > 0 && jump.jump_ready {
            jump.jumps -= 1;
            if in_water {
                t.velocity.y = -jump.jump_speed / WATER_JUMP_DIVISOR;
            } else if on_ground || jump.coyote_timer > 0 {
                t.velocity.y = -jump.jump_speed;
            } else if p.ladder_state {
                t.velocity.y = -jump.jump_speed / LADDER_JUMP_DIVISOR;
            }
            p.ladder_state = false;
            jump.coyote_timer = 0;
            jump.jumped = true;
            jump.jump_ready = false;
            jump.jump_released = false;
        }

        p.is_crouch >>= 1;

        if let Some(record) = world.manager.get_entity_mut(id) {
            record.position = pos;
        }
        if let Some(slot) = world.manager.get_component_mut::<Transform>(id) {
            *slot = t;
        }
        if let Some(slot) = world.manager.get_component_mut::<Jump>(id) {
            *slot = jump;
        }
        if let Some(slot) = world.manager.get_component_mut::<PlayerState>(id) {
            *slot = p;
        }
    }
    world.release_ids(ids);
}

// =============================================================================
// BOUNDING BOX
// =============================================================================

/// Offset keeping the bottom centre of a box in place while it resizes.
fn shift_bot_center(old: Vec2, new: Vec2) -> Vec2 {
    Vec2::new((old.x - new.x) / 2.0, old.y - new.y)
}

/// Offset keeping the centre of a box in place while it resizes.
fn shift_mid_center(old: Vec2, new: Vec2) -> Vec2 {
    Vec2::new((old.x - new.x) / 2.0, (old.y - new.y) / 2.0)
}

/// Reshapes the player box for standing, crouching and swimming, and lays
/// out the hit and hurt boxes to match.
///
/// The new box is only taken if it fits where it would land.
pub fn player_bbox_update_system(world: &mut World) {
    let crouched = Vec2::new(PLAYER_C_WIDTH, PLAYER_C_HEIGHT);
    let standing = Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT);

    let ids = world.take_ids(ComponentKind::PlayerState);
    for &id in &ids {
        let (Some(pos), Some(mut bbox), Some(mstate), Some(p)) = (
            world.manager.position(id),
            world.manager.get_component::<BoundingBox>(id).copied(),
            world.manager.get_component::<MovementState>(id).copied(),
            world.manager.get_component::<PlayerState>(id).copied(),
        ) else {
            continue;
        };

        let (new_size, offset) = if mstate.on_ground() {
            let size = if p.is_crouch & 1 != 0 { crouched } else { standing };
            (size, shift_bot_center(bbox.size, size))
        } else if mstate.in_water() && !p.ladder_state {
            (crouched, shift_mid_center(bbox.size, crouched))
        } else {
            (standing, shift_mid_center(bbox.size, standing))
        };

        let mut new_pos = pos;
        if world.collision().check_collision_at(id, pos + offset, new_size) != Hit::Rigid {
            bbox.set(new_size.x, new_size.y);
            new_pos = pos + offset;
        }

        let swimming = mstate.in_water() && !mstate.on_ground();
        if let Some(hit) = world.manager.get_component_mut::<HitBoxes>(id) {
            hit.boxes[0].height = bbox.size.y + 4.0;
            hit.boxes[1].height = bbox.size.y;
            if swimming {
                hit.boxes[0].width = bbox.size.x * 2.0;
                hit.boxes[1].width = bbox.size.x * 2.0 + 4.0;
                if mstate.x_dir > 0 {
                    hit.boxes[0].x = -bbox.size.x;
                    hit.boxes[1].x = -bbox.size.x - 2.0;
                } else {
                    hit.boxes[0].x = 0.0;
                    hit.boxes[1].x = -2.0;
                }
            } else {
                hit.boxes[0].x = 0.0;
                hit.boxes[0].width = bbox.size.x;
                hit.boxes[1].x = -2.0;
                hit.boxes[1].width = bbox.size.x + 4.0;
            }
        }
        if let Some(hurt) = world.manager.get_component_mut::<Hurtbox>(id) {
            hurt.size = bbox.size;
            hurt.offset = Vec2::ZERO;
            if swimming {
                hurt.size.x *= 1.7;
                if mstate.x_dir > 0 {
                    hurt.offset.x = -bbox.size.x * 0.7;
                }
            }
        }

        if let Some((record, slot)) = world.manager.get_with_component_mut::<BoundingBox>(id) {
            record.position = new_pos;
            *slot = bbox;
        }
    }
    world.release_ids(ids);
}

// =============================================================================
// PUSHING
// =============================================================================

/// Moveable body right next to the player in its walking direction.
fn pushed_body(
    world: &World,
    player: EntityId,
    tile: u32,
    contact: Vec2,
) -> Option<(EntityId, Vec2)> {
    let tile = world.grid.tile(tile)?;
    tile.entities.iter().find_map(|&other| {
        if other == player || !world.manager.is_alive(other) {
            return None;
        }
        if !world.manager.has_component::<Moveable>(other) {
            return None;
        }
        let pos = world.manager.position(other)?;
        let bbox = world.manager.get_component::<BoundingBox>(other)?;
        point_in_aabb(contact, Rect::from_pos_size(pos, bbox.size)).then_some((other, pos))
    })
}

/// A grounded or swimming player walking into a moveable body starts a one
/// tile grid move of that body, if the tile behind it is free.
pub fn player_pushing_system(world: &mut World) {
    let ts = TILE_SIZE as f32;

    let ids = world.take_ids(ComponentKind::PlayerState);
    for &id in &ids {
        let (Some(pos), Some(bbox), Some(mstate), Some(p)) = (
            world.manager.position(id),
            world.manager.get_component::<BoundingBox>(id).copied(),
            world.manager.get_component::<MovementState>(id).copied(),
            world.manager.get_component::<PlayerState>(id).copied(),
        ) else {
            continue;
        };
        if !(mstate.on_ground() || mstate.in_water()) || p.player_dir.x == 0.0 {
            continue;
        }

        let mut contact = Vec2::new(pos.x, pos.y + bbox.half_size.y);
        if p.player_dir.x > 0.0 {
            contact.x += bbox.size.x + 1.0;
        } else {
            contact.x -= 1.0;
        }
        let tile_x = (contact.x / ts).floor() as i32;
        let tile_y = (contact.y / ts).floor() as i32;
        let Some(idx) = world.grid.index(tile_x, tile_y) else {
            continue;
        };
        if world.grid.tile(idx).map(|t| t.tile_type) != Some(TileType::Empty) {
            continue;
        }
        let Some((other, other_pos)) = pushed_body(world, id, idx, contact) else {
            continue;
        };

        let (step, target_x) = if pos.x < other_pos.x {
            (ts, tile_x + 1)
        } else {
            (-ts, tile_x - 1)
        };
        let free = world
            .grid
            .index(target_x, tile_y)
            .and_then(|target| world.grid.tile(target))
            .is_some_and(|tile| tile.moveable && tile.entities.is_empty());
        if !free {
            continue;
        }

        if let Some(mv) = world.manager.get_component_mut::<Moveable>(other) {
            mv.gridmove = true;
            mv.prev_pos = other_pos;
            mv.target_pos = Vec2::new(other_pos.x + step, other_pos.y);
        }
        if let Some(other_t) = world.manager.get_component_mut::<Transform>(other) {
            other_t.movement_mode = MovementMode::Kinematic;
        }
        if let Some(t) = world.manager.get_component_mut::<Transform>(id) {
            t.velocity = Vec2::ZERO;
            t.accel = Vec2::ZERO;
        }
    }
    world.release_ids(ids);
}

// =============================================================================
// CRUSHING
// =============================================================================

/// Kills a player squeezed between two rigid contacts on opposite sides,
/// when something rigid actually overlaps the outermost pixel row or column
/// of its box on one of those sides.
///
/// Fitting exactly into a gap is not a crush.
pub fn player_crushing_system(world: &mut World) {
    let ids = world.take_ids(ComponentKind::PlayerState);
    for &id in &ids {
        let (Some(pos), Some(bbox)) = (
            world.manager.position(id),
            world.manager.get_component::<BoundingBox>(id).copied(),
        ) else {
            continue;
        };
        if !world.manager.is_alive(id) {
            continue;
        }
        let size = bbox.size;
        let view = world.collision();
        let edges = view.check_bbox_edges(id, pos, size, true);

        let far = pos + size - Vec2::splat(1.0);
        let rigid = |p1: Vec2, p2: Vec2| view.check_collision_line(id, p1, p2) == Hit::Rigid;

        let vertical = edges.contains(ContactEdges::UP | ContactEdges::DOWN)
            && (rigid(pos, Vec2::new(far.x, pos.y)) || rigid(Vec2::new(pos.x, far.y), far));
        let horizontal = edges.contains(ContactEdges::LEFT | ContactEdges::RIGHT)
            && (rigid(pos, Vec2::new(pos.x, far.y)) || rigid(Vec2::new(far.x, pos.y), far));

        if vertical || horizontal {
            world.destroy_entity(id);
        }
    }
    world.release_ids(ids);
}

// =============================================================================
// JUMP STATE
// =============================================================================

/// Opens the coyote window on leaving ground or water and restores jumps
/// while grounded, swimming or climbing.
pub fn player_ground_air_transition_system(world: &mut World) {
    let coyote_ticks = world.config.player.coyote_ticks;

    let ids = world.take_ids(ComponentKind::PlayerState);
    for &id in &ids {
        let (Some(mstate), Some(p)) = (
            world.manager.get_component::<MovementState>(id).copied(),
            world.manager.get_component::<PlayerState>(id).copied(),
        ) else {
            continue;
        };
        let Some(jump) = world.manager.get_component_mut::<Jump>(id) else {
            continue;
        };

        if mstate.water_state == 0b10 || mstate.ground_state == 0b10 {
            jump.coyote_timer = coyote_ticks;
        } else if mstate.on_ground() || mstate.in_water() || p.ladder_state {
            jump.jumps = jump.max_jumps;
            jump.jumped = false;
            if !jump.jump_released && !p.jump_pressed {
                jump.jump_released = true;
            }
            jump.short_hop = false;
            jump.jump_ready = true;
            jump.coyote_timer = 0;
        } else if jump.coyote_timer > 0 {
            jump.coyote_timer -= 1;
        } else {
            jump.jumps = jump.jumps.saturating_sub(1);
        }
    }
    world.release_ids(ids);
}

/// Clears the requested direction; the action layer sets it again.
pub fn player_dir_reset_system(world: &mut World) {
    let ids = world.take_ids(ComponentKind::PlayerState);
    for &id in &ids {
        if let Some(p) = world.manager.get_component_mut::<PlayerState>(id) {
            p.player_dir = Vec2::ZERO;
        }
    }
    world.release_ids(ids);
}
