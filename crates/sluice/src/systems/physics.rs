//! Physics passes: tile membership, forces, integration, collision
//! resolution and contact state.

use sluice_core::{
    BoundingBox, ComponentKind, EntityId, EntityTag, Moveable, MovementMode, MovementState,
    PlayerState, TileCoord, Transform,
};
use sluice_shared::constants::TILE_SIZE;
use sluice_shared::{Rect, Vec2};

use super::zero_into_edges;
use crate::collision::{ContactEdges, TileArea};
use crate::geometry::{overlap_area, point_in_aabb};
use crate::tilemap::{SolidType, TileType};
use crate::world::World;

/// Extra x friction while crouching.
const CROUCH_FRICTION: f32 = 4.0;
/// X friction scale while running on the ground.
const RUN_FRICTION_SCALE: f32 = 0.9;
/// A grid move ends once the body is this close to its target.
const GRIDMOVE_SNAP: f32 = 0.1;

// =============================================================================
// BROAD PHASE
// =============================================================================

/// Rebuilds the tile sets of every live entity with a [`TileCoord`].
///
/// Entities without a bounding box occupy the tile under their position.
pub fn update_tilemap_system(world: &mut World) {
    let ids = world.take_ids(ComponentKind::TileCoord);
    for &id in &ids {
        let Some(record) = world.manager.get_entity(id) else {
            continue;
        };
        if !record.is_alive() {
            continue;
        }
        let pos = record.position;
        let size = world
            .manager
            .get_component::<BoundingBox>(id)
            .map_or(Vec2::splat(1.0), |b| b.size);
        let Some(old) = world.manager.get_component::<TileCoord>(id).copied() else {
            continue;
        };

        for &idx in old.tiles() {
            world.grid.remove_entity_from_tile(idx, id);
        }

        let mut coord = TileCoord::default();
        for idx in TileArea::covering(Rect::from_pos_size(pos, size)).indices(&world.grid) {
            if !coord.push(idx) {
                break;
            }
        }
        for &idx in coord.tiles() {
            world.grid.add_entity_to_tile(idx, id);
        }
        if let Some(slot) = world.manager.get_component_mut::<TileCoord>(id) {
            *slot = coord;
        }
    }
    world.release_ids(ids);
}

// =============================================================================
// FORCES
// =============================================================================

/// Picks each body's friction coefficients from its water overlap and the
/// player's stance.
pub fn friction_coefficient_update_system(world: &mut World) {
    let physics = world.config.physics;
    let ground = Vec2::new(-physics.ground_x_friction, -physics.ground_y_friction);
    let water = Vec2::splat(-physics.water_friction);

    let ids = world.take_ids(ComponentKind::Transform);
    for &id in &ids {
        let mstate = world.manager.get_component::<MovementState>(id).copied();
        let mut fric = match mstate {
            Some(m) => water * m.water_overlap + ground * (1.0 - m.water_overlap),
            // Air resistance only on y, otherwise bunny hopping outruns walking
            None => ground,
        };

        if let Some(pstate) = world.manager.get_component::<PlayerState>(id) {
            if pstate.is_crouch & 1 != 0 {
                fric.x -= CROUCH_FRICTION;
            }
            if mstate.is_some_and(|m| m.on_ground()) && pstate.player_dir.x != 0.0 {
                fric.x *= RUN_FRICTION_SCALE;
            }
        }

        if let Some(transform) = world.manager.get_component_mut::<Transform>(id) {
            transform.fric_coeff = fric;
        }
    }
    world.release_ids(ids);
}

/// Gravity, buoyancy and friction.
///
/// Gravity waits for the body's gravity delay and is off on the ground.
/// Buoyancy scales with the submerged fraction and only applies while the
/// tile under the body's center is wet. Acceleration into a contact is
/// dropped, and players on a ladder get none at all.
pub fn global_external_forces_system(world: &mut World, dt: f32) {
    let physics = world.config.physics;
    let gravity = Vec2::new(0.0, physics.gravity);
    let upthrust = Vec2::new(0.0, -physics.gravity * physics.upthrust_ratio);

    let ids = world.take_ids(ComponentKind::MovementState);
    for &id in &ids {
        let (Some(pos), Some(mstate), Some(mut t)) = (
            world.manager.position(id),
            world.manager.get_component::<MovementState>(id).copied(),
            world.manager.get_component::<Transform>(id).copied(),
        ) else {
            continue;
        };
        let bbox = world.manager.get_component::<BoundingBox>(id).copied();

        if t.grav_timer > 0.0 {
            t.grav_timer -= dt;
        } else {
            if !mstate.on_ground() {
                let center = pos + bbox.map_or(Vec2::ZERO, |b| b.half_size);
                let center_wet = world
                    .grid
                    .index_at(center)
                    .and_then(|idx| world.grid.tile(idx))
                    .is_some_and(|tile| tile.wet);
                let buoyancy = if center_wet {
                    upthrust * mstate.water_overlap
                } else {
                    Vec2::ZERO
                };
                t.accel = (t.accel + buoyancy).mul_elem(t.shape_factor) + gravity;
            }

            t.accel += t.fric_coeff.mul_elem(t.velocity).mul_elem(t.shape_factor);

            if let Some(bbox) = bbox {
                let edges = world.collision().check_bbox_edges(id, pos, bbox.size, false);
                zero_into_edges(&mut t.accel, edges);
            }
        }

        if let Some(slot) = world.manager.get_component_mut::<Transform>(id) {
            *slot = t;
        }
    }

    world.release_ids(ids);

    let players = world.take_ids(ComponentKind::PlayerState);
    for &id in &players {
        let on_ladder = world
            .manager
            .get_component::<PlayerState>(id)
            .is_some_and(|p| p.ladder_state);
        if on_ladder {
            if let Some(t) = world.manager.get_component_mut::<Transform>(id) {
                t.accel = Vec2::ZERO;
            }
        }
    }
    world.release_ids(players);
}

// =============================================================================
// GRID MOVES
// =============================================================================

/// A still moveable body below `id` whose top contains `foot`.
fn resting_on_moveable(world: &World, id: EntityId, tile: u32, foot: Vec2) -> bool {
    let Some(tile) = world.grid.tile(tile) else {
        return false;
    };
    tile.entities.iter().any(|&other| {
        if other == id || !world.manager.has_component::<Moveable>(other) {
            return false;
        }
        let (Some(pos), Some(bbox), Some(t)) = (
            world.manager.position(other),
            world.manager.get_component::<BoundingBox>(other),
            world.manager.get_component::<Transform>(other),
        ) else {
            return false;
        };
        point_in_aabb(foot, Rect::from_pos_size(pos, bbox.size))
            && t.velocity.length_squared() == 0.0
    })
}

/// True if a body may roll into column `tx` of row `ty - 1` and down to `ty`.
fn roll_lane_free(world: &World, id: EntityId, tx: i32, ty: i32) -> bool {
    let (Some(below), Some(side)) = (world.grid.index(tx, ty), world.grid.index(tx, ty - 1)) else {
        return false;
    };
    let (Some(below_tile), Some(side_tile)) = (world.grid.tile(below), world.grid.tile(side)) else {
        return false;
    };
    if !(below_tile.moveable || below_tile.tile_type == TileType::OneWay) || !side_tile.moveable {
        return false;
    }
    let blocked = |entities: &std::collections::BTreeSet<EntityId>| {
        entities.iter().any(|&other| {
            other != id
                && world
                    .manager
                    .get_component::<BoundingBox>(other)
                    .is_some_and(|b| b.solid)
        })
    };
    !blocked(&below_tile.entities) && !blocked(&side_tile.entities)
}

/// Where a body balanced on another moveable body rolls to, left first.
fn roll_target(world: &World, id: EntityId, pos: Vec2, size: Vec2) -> Option<Vec2> {
    let ts = TILE_SIZE as f32;
    let foot = Vec2::new(pos.x + size.x / 2.0, pos.y + size.y + 1.0);
    let tile_x = (foot.x / ts).floor() as i32;
    let tile_y = (foot.y / ts).floor() as i32;
    let below = world.grid.index(tile_x, tile_y)?;
    if !resting_on_moveable(world, id, below, foot) {
        return None;
    }

    let column = (pos.x / ts).floor() as i32;
    [column - 1, column + 1]
        .into_iter()
        .find(|&tx| roll_lane_free(world, id, tx, tile_y))
        .map(|tx| Vec2::new(tx as f32 * ts, (tile_y - 1) as f32 * ts))
}

/// Advances grid moves and starts new ones for bodies resting on top of
/// another still moveable body.
///
/// A body in a grid move is kinematic and not solid until it lands on its
/// target.
pub fn moveable_update_system(world: &mut World, dt: f32) {
    let ids = world.take_ids(ComponentKind::Moveable);
    for &id in &ids {
        if !world.manager.is_alive(id) {
            continue;
        }
        let (Some(mut pos), Some(mut mv), Some(mut t), Some(mut bbox)) = (
            world.manager.position(id),
            world.manager.get_component::<Moveable>(id).copied(),
            world.manager.get_component::<Transform>(id).copied(),
            world.manager.get_component::<BoundingBox>(id).copied(),
        ) else {
            continue;
        };

        if mv.gridmove {
            let remaining = mv.target_pos.x - pos.x;
            let step = mv.move_speed * dt;
            if remaining.abs() < GRIDMOVE_SNAP {
                t.prev_position = mv.prev_pos;
                pos = mv.target_pos;
                mv.gridmove = false;
                bbox.solid = true;
                t.movement_mode = MovementMode::Regular;
            } else if remaining > 0.0 {
                pos.x += remaining.min(step);
            } else {
                pos.x += remaining.max(-step);
                t.velocity = Vec2::ZERO;
            }
        }

        // Checked right after landing too, so moves can chain
        if !mv.gridmove {
            if let Some(target) = roll_target(world, id, pos, bbox.size) {
                mv.gridmove = true;
                mv.prev_pos = pos;
                mv.target_pos = target;
                bbox.solid = false;
                t.velocity = Vec2::ZERO;
                t.accel = Vec2::ZERO;
                t.movement_mode = MovementMode::Kinematic;
            }
        }

        if let Some(record) = world.manager.get_entity_mut(id) {
            record.position = pos;
        }
        if let Some(slot) = world.manager.get_component_mut::<Moveable>(id) {
            *slot = mv;
        }
        if let Some(slot) = world.manager.get_component_mut::<Transform>(id) {
            *slot = t;
        }
        if let Some(slot) = world.manager.get_component_mut::<BoundingBox>(id) {
            *slot = bbox;
        }
    }
    world.release_ids(ids);
}

// =============================================================================
// INTEGRATION
// =============================================================================

/// Semi-implicit Euler step.
///
/// Inactive bodies are held still. Kinematic bodies keep their velocity.
/// Speed is capped and near-zero components are dropped. Bodies without a
/// bounding box that leave the level are destroyed.
pub fn movement_update_system(world: &mut World, dt: f32) {
    let physics = world.config.physics;
    let (width, height) = (world.grid.width_px(), world.grid.height_px());

    let ids = world.take_ids(ComponentKind::Transform);
    for &id in &ids {
        let Some((record, t)) = world.manager.get_with_component_mut::<Transform>(id) else {
            continue;
        };
        if !record.is_alive() {
            continue;
        }
        if !t.active {
            t.velocity = Vec2::ZERO;
            t.accel = Vec2::ZERO;
            continue;
        }

        t.prev_velocity = t.velocity;
        if t.movement_mode == MovementMode::Regular {
            t.velocity += t.accel * dt;
        }
        if t.velocity.length() > physics.max_speed {
            t.velocity = t.velocity.normalize() * physics.max_speed;
        }
        if t.velocity.x.abs() < physics.velocity_epsilon {
            t.velocity.x = 0.0;
        }
        if t.velocity.y.abs() < physics.velocity_epsilon {
            t.velocity.y = 0.0;
        }

        t.prev_position = record.position;
        record.position += t.velocity * dt;
        t.accel = Vec2::ZERO;

        let pos = record.position;
        let outside = pos.x < 0.0 || pos.x > width || pos.y < 0.0 || pos.y > height;
        if outside && !world.manager.has_component::<BoundingBox>(id) {
            world.destroy_entity(id);
        }
    }
    world.release_ids(ids);
}

// =============================================================================
// COLLISION RESOLUTION
// =============================================================================

/// Rounds away float drift: within 1% of an integer snaps to it.
fn snap_to_pixel(v: f32) -> f32 {
    let fract = v.fract();
    if fract > 0.99 {
        v.trunc() + v.signum()
    } else if fract < 0.01 {
        v.trunc()
    } else {
        v
    }
}

/// Pushes active bodies out of solid tiles and solid entities, keeps them
/// inside the level and snaps sub-pixel drift.
///
/// One-way tiles only block a body whose bottom crossed their top this
/// frame. Players walk through chests. Velocity into a contact is dropped;
/// velocity into the level boundary is reflected.
pub fn tile_collision_system(world: &mut World) {
    let ts = TILE_SIZE as f32;
    let (width, height) = (world.grid.width_px(), world.grid.height_px());
    let mut checked = world.take_marks();

    let ids = world.take_ids(ComponentKind::BoundingBox);
    for &id in &ids {
        let (Some(record), Some(bbox), Some(mut t)) = (
            world.manager.get_entity(id),
            world.manager.get_component::<BoundingBox>(id).copied(),
            world.manager.get_component::<Transform>(id).copied(),
        ) else {
            continue;
        };
        if !record.is_alive() || !t.active {
            continue;
        }
        let tag = record.tag();
        let mut pos = record.position;
        let size = bbox.size;

        // One pixel of slack so touching neighbours are considered
        let area = TileArea {
            x1: ((pos.x - 1.0) / ts).floor() as i32,
            y1: ((pos.y - 1.0) / ts).floor() as i32,
            x2: ((pos.x + size.x) / ts).floor() as i32,
            y2: ((pos.y + size.y) / ts).floor() as i32,
        };

        let view = world.collision();
        let mut edges = ContactEdges::NONE;
        checked.clear();
        for idx in area.indices(view.grid) {
            let Some(tile) = view.grid.tile(idx) else {
                continue;
            };
            if tile.tile_type != TileType::Empty {
                let rect = view.grid.tile_rect(idx);
                let solid = match tile.solid {
                    SolidType::OneWay => {
                        let crossed =
                            t.prev_position.y + size.y <= rect.y && pos.y + size.y > rect.y;
                        if crossed {
                            SolidType::Solid
                        } else {
                            SolidType::NotSolid
                        }
                    }
                    other => other,
                };
                edges |=
                    view.check_collision_and_move(id, &mut pos, t.prev_position, size, rect, solid);
            }

            for &other in &tile.entities {
                if other == id || !checked.insert(other) {
                    continue;
                }
                let (Some(other_record), Some(other_bbox)) = (
                    view.manager.get_entity(other),
                    view.manager.get_component::<BoundingBox>(other),
                ) else {
                    continue;
                };
                if !other_record.is_alive() {
                    continue;
                }
                let solid = if other_bbox.solid
                    && !(tag == EntityTag::Player && other_record.tag() == EntityTag::Chest)
                {
                    SolidType::Solid
                } else {
                    SolidType::NotSolid
                };
                let rect = Rect::from_pos_size(other_record.position, other_bbox.size);
                edges |=
                    view.check_collision_and_move(id, &mut pos, t.prev_position, size, rect, solid);
            }
        }

        zero_into_edges(&mut t.velocity, edges);

        if pos.x < 0.0 {
            pos.x = 0.0;
            t.velocity.x = t.velocity.x.abs();
        } else if pos.x + size.x > width {
            pos.x = width - size.x;
            t.velocity.x = -t.velocity.x.abs();
        }
        if pos.y < 0.0 {
            pos.y = 0.0;
            t.velocity.y = t.velocity.y.abs();
        } else if pos.y + size.y > height {
            pos.y = height - size.y;
            t.velocity.y = -t.velocity.y.abs();
        }

        pos = Vec2::new(snap_to_pixel(pos.x), snap_to_pixel(pos.y));

        if let Some((record, slot)) = world.manager.get_with_component_mut::<Transform>(id) {
            record.position = pos;
            *slot = t;
        }
    }
    world.release_ids(ids);
    world.release_marks(checked);
}

/// Drops velocity into any contact left after resolution.
pub fn edge_velocity_check_system(world: &mut World) {
    let ids = world.take_ids(ComponentKind::BoundingBox);
    for &id in &ids {
        let (Some(pos), Some(bbox), Some(t)) = (
            world.manager.position(id),
            world.manager.get_component::<BoundingBox>(id),
            world.manager.get_component::<Transform>(id),
        ) else {
            continue;
        };
        if !t.active || !world.manager.is_alive(id) {
            continue;
        }
        let edges = world.collision().check_bbox_edges(id, pos, bbox.size, false);
        if let Some(t) = world.manager.get_component_mut::<Transform>(id) {
            zero_into_edges(&mut t.velocity, edges);
        }
    }
    world.release_ids(ids);
}

// =============================================================================
// CONTACT STATE
// =============================================================================

/// Shifts the ground and water histories and measures the submerged
/// fraction.
///
/// Landing re-arms the gravity delay. A body that just left the ground
/// becomes active.
pub fn state_transition_update_system(world: &mut World) {
    let ts = TILE_SIZE as f32;
    let ids = world.take_ids(ComponentKind::MovementState);
    for &id in &ids {
        let (Some(pos), Some(bbox), Some(mut t), Some(mut mstate)) = (
            world.manager.position(id),
            world.manager.get_component::<BoundingBox>(id).copied(),
            world.manager.get_component::<Transform>(id).copied(),
            world.manager.get_component::<MovementState>(id).copied(),
        ) else {
            continue;
        };
        if !world.manager.is_alive(id) {
            continue;
        }

        if t.velocity.x > 0.0 {
            mstate.x_dir = 1;
        } else if t.velocity.x < 0.0 {
            mstate.x_dir = 0;
        }

        let on_ground = world
            .collision()
            .check_on_ground(id, pos, t.prev_position, bbox.size);
        if on_ground {
            t.grav_timer = t.grav_delay;
        }

        let body = Rect::from_pos_size(pos, bbox.size);
        let area = TileArea {
            x1: (pos.x / ts).floor() as i32,
            y1: (pos.y / ts).floor() as i32,
            x2: ((pos.x + bbox.size.x) / ts).floor() as i32,
            y2: ((pos.y + bbox.size.y) / ts).floor() as i32,
        };
        let wet_area: f32 = area
            .indices(&world.grid)
            .filter_map(|idx| world.grid.water_rect(idx))
            .map(|water| overlap_area(body, water))
            .sum();
        mstate.water_overlap = (wet_area / (bbox.size.x * bbox.size.y)).clamp(0.0, 1.0);

        let in_water = mstate.water_overlap > 0.0;
        mstate.ground_state = ((mstate.ground_state << 1) | u8::from(on_ground)) & 0b11;
        mstate.water_state = ((mstate.water_state << 1) | u8::from(in_water)) & 0b11;

        if mstate.ground_state == 0b10 {
            t.active = true;
        }

        if let Some(slot) = world.manager.get_component_mut::<Transform>(id) {
            *slot = t;
        }
        if let Some(slot) = world.manager.get_component_mut::<MovementState>(id) {
            *slot = mstate;
        }
    }
    world.release_ids(ids);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::tilemap::TileGrid;
    use sluice_core::EntityTag;

    fn world() -> World {
        World::new(SimConfig::default(), TileGrid::new(8, 8).unwrap())
    }

    fn spawn_box(world: &mut World, pos: Vec2, size: Vec2) -> EntityId {
        let id = world.manager.add_entity(EntityTag::Crate, &mut world.ops).unwrap();
        world.manager.get_entity_mut(id).unwrap().position = pos;
        let bbox = world.manager.add_component::<BoundingBox>(id, &mut world.ops).unwrap();
        bbox.set(size.x, size.y);
        bbox.solid = true;
        world.manager.add_component::<Transform>(id, &mut world.ops).unwrap().active = true;
        world.manager.add_component::<MovementState>(id, &mut world.ops);
        world.manager.add_component::<TileCoord>(id, &mut world.ops);
        world.flush();
        id
    }

    #[test]
    fn test_snap_to_pixel() {
        assert_eq!(snap_to_pixel(3.995), 4.0);
        assert_eq!(snap_to_pixel(3.005), 3.0);
        assert_eq!(snap_to_pixel(3.5), 3.5);
    }

    #[test]
    fn test_tilemap_update_tracks_spanned_tiles() {
        let mut w = world();
        let id = spawn_box(&mut w, Vec2::new(20.0, 20.0), Vec2::new(30.0, 30.0));
        update_tilemap_system(&mut w);

        let coord = *w.manager.get_component::<TileCoord>(id).unwrap();
        assert_eq!(coord.tiles(), &[0, 1, 8, 9]);
        for idx in [0, 1, 8, 9] {
            assert!(w.grid.tile(idx).unwrap().entities.contains(&id));
        }

        w.manager.get_entity_mut(id).unwrap().position = Vec2::new(100.0, 100.0);
        update_tilemap_system(&mut w);
        assert!(!w.grid.tile(0).unwrap().entities.contains(&id));
        assert_eq!(w.manager.get_component::<TileCoord>(id).unwrap().tiles(), &[27, 28, 35, 36]);
    }

    #[test]
    fn test_integration_caps_speed() {
        let mut w = world();
        let id = spawn_box(&mut w, Vec2::new(100.0, 100.0), Vec2::splat(10.0));
        w.manager.get_component_mut::<Transform>(id).unwrap().velocity = Vec2::new(5000.0, 0.0);
        movement_update_system(&mut w, 0.01);

        let t = w.manager.get_component::<Transform>(id).unwrap();
        assert!((t.velocity.x - w.config.physics.max_speed).abs() < 1e-3);
        assert_eq!(t.prev_position, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_inactive_body_is_held() {
        let mut w = world();
        let id = spawn_box(&mut w, Vec2::new(100.0, 100.0), Vec2::splat(10.0));
        let t = w.manager.get_component_mut::<Transform>(id).unwrap();
        t.active = false;
        t.velocity = Vec2::new(50.0, 50.0);
        movement_update_system(&mut w, 0.01);
        assert_eq!(w.manager.position(id), Some(Vec2::new(100.0, 100.0)));
        assert_eq!(w.manager.get_component::<Transform>(id).unwrap().velocity, Vec2::ZERO);
    }

    #[test]
    fn test_boundary_reflects_velocity() {
        let mut w = world();
        let id = spawn_box(&mut w, Vec2::new(-4.0, 100.0), Vec2::splat(10.0));
        w.manager.get_component_mut::<Transform>(id).unwrap().velocity = Vec2::new(-30.0, 0.0);
        tile_collision_system(&mut w);

        assert_eq!(w.manager.position(id).unwrap().x, 0.0);
        assert_eq!(w.manager.get_component::<Transform>(id).unwrap().velocity.x, 30.0);
    }

    #[test]
    fn test_landing_on_solid_tile_stops_fall() {
        let mut w = world();
        w.change_tile(w.grid.index(1, 4).unwrap(), TileType::Solid);
        let id = spawn_box(&mut w, Vec2::new(33.0, 100.0), Vec2::new(30.0, 30.0));
        let t = w.manager.get_component_mut::<Transform>(id).unwrap();
        t.prev_position = Vec2::new(33.0, 92.0);
        t.velocity = Vec2::new(0.0, 300.0);
        update_tilemap_system(&mut w);
        tile_collision_system(&mut w);

        assert_eq!(w.manager.position(id), Some(Vec2::new(33.0, 98.0)));
        assert_eq!(w.manager.get_component::<Transform>(id).unwrap().velocity.y, 0.0);
    }

    #[test]
    fn test_state_transition_measures_water() {
        let mut w = world();
        let idx = w.grid.index(2, 2).unwrap();
        w.grid.set_water_level(idx, 4);
        let id = spawn_box(&mut w, Vec2::new(64.0, 48.0), Vec2::new(32.0, 32.0));
        state_transition_update_system(&mut w);

        let m = w.manager.get_component::<MovementState>(id).unwrap();
        assert!((m.water_overlap - 0.5).abs() < 1e-6);
        assert!(m.in_water());
        assert!(!m.on_ground());
    }

    #[test]
    fn test_leaving_ground_activates_body() {
        let mut w = world();
        w.change_tile(w.grid.index(0, 3).unwrap(), TileType::Solid);
        let id = spawn_box(&mut w, Vec2::new(0.0, 64.0), Vec2::splat(32.0));
        w.manager.get_component_mut::<Transform>(id).unwrap().active = false;
        update_tilemap_system(&mut w);
        state_transition_update_system(&mut w);
        assert!(w.manager.get_component::<MovementState>(id).unwrap().on_ground());

        w.destroy_tile(w.grid.index(0, 3).unwrap());
        state_transition_update_system(&mut w);
        assert_eq!(w.manager.get_component::<MovementState>(id).unwrap().ground_state, 0b10);
        assert!(w.manager.get_component::<Transform>(id).unwrap().active);
    }
}
