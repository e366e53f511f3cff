//! End-to-end physics scenarios run through the full frame order.

use sluice::collision::TileArea;
use sluice::systems::update_tilemap_system;
use sluice::{AssetRegistry, Scene, SimConfig, TileType};
use sluice_core::{BoundingBox, EntityId, EntityTag, MovementState, TileCoord, Transform};
use sluice_shared::{Rect, Vec2};

// =============================================================================
// HELPERS
// =============================================================================

fn scene_with_floor(row: i32) -> Scene {
    let mut scene = Scene::new(SimConfig::default(), AssetRegistry::default()).unwrap();
    for x in 0..scene.world.grid.width() as i32 {
        let idx = scene.world.grid.index(x, row).unwrap();
        scene.change_tile(idx, TileType::Solid);
    }
    scene
}

/// A falling body with no player input attached.
fn spawn_body(scene: &mut Scene, tag: EntityTag, pos: Vec2, size: Vec2) -> EntityId {
    let world = &mut scene.world;
    let id = world.manager.add_entity(tag, &mut world.ops).unwrap();
    world.manager.get_entity_mut(id).unwrap().position = pos;
    world
        .manager
        .add_component::<BoundingBox>(id, &mut world.ops)
        .unwrap()
        .set(size.x, size.y);
    world
        .manager
        .add_component::<Transform>(id, &mut world.ops)
        .unwrap()
        .active = true;
    world.manager.add_component::<TileCoord>(id, &mut world.ops);
    world.manager.add_component::<MovementState>(id, &mut world.ops);
    world.flush();
    id
}

fn run(scene: &mut Scene, ticks: usize) {
    let dt = scene.world.config.frame.fixed_dt;
    for _ in 0..ticks {
        scene.tick(dt);
    }
}

// =============================================================================
// LANDING
// =============================================================================

#[test]
fn test_body_lands_on_floor_without_tunnelling() {
    let mut scene = scene_with_floor(15);
    let id = spawn_body(
        &mut scene,
        EntityTag::Player,
        Vec2::ZERO,
        Vec2::new(30.0, 55.0),
    );

    run(&mut scene, 150);

    let pos = scene.world.manager.position(id).unwrap();
    let t = scene.world.manager.get_component::<Transform>(id).unwrap();
    assert!((pos.y - 425.0).abs() < 1e-3, "resting y was {}", pos.y);
    assert_eq!(t.velocity.y, 0.0);
    assert!(scene
        .world
        .manager
        .get_component::<MovementState>(id)
        .unwrap()
        .on_ground());
}

#[test]
fn test_resting_body_stays_put() {
    let mut scene = scene_with_floor(15);
    let id = spawn_body(
        &mut scene,
        EntityTag::Crate,
        Vec2::new(96.0, 300.0),
        Vec2::splat(32.0),
    );

    run(&mut scene, 150);
    let settled = scene.world.manager.position(id).unwrap();
    run(&mut scene, 60);
    assert_eq!(scene.world.manager.position(id).unwrap(), settled);
    assert!((settled.y - 448.0).abs() < 1e-3);
}

// =============================================================================
// BROAD PHASE
// =============================================================================

#[test]
fn test_tile_sets_match_bounding_boxes() {
    let mut scene = scene_with_floor(15);
    let sizes = [
        (Vec2::new(10.0, 10.0), Vec2::new(30.0, 55.0)),
        (Vec2::new(70.0, 200.0), Vec2::splat(32.0)),
        (Vec2::new(130.0, 90.0), Vec2::new(22.0, 42.0)),
    ];
    let ids: Vec<EntityId> = sizes
        .iter()
        .map(|&(pos, size)| spawn_body(&mut scene, EntityTag::Crate, pos, size))
        .collect();

    for _ in 0..20 {
        run(&mut scene, 1);
        update_tilemap_system(&mut scene.world);

        let grid = &scene.world.grid;
        for &id in &ids {
            let pos = scene.world.manager.position(id).unwrap();
            let size = scene.world.manager.get_component::<BoundingBox>(id).unwrap().size;
            let mut expected: Vec<u32> = TileArea::covering(Rect::from_pos_size(pos, size))
                .indices(grid)
                .collect();
            let mut listed: Vec<u32> = (0..grid.len() as u32)
                .filter(|&i| grid.tile(i).unwrap().entities.contains(&id))
                .collect();
            expected.sort_unstable();
            listed.sort_unstable();
            assert_eq!(listed, expected);
        }
    }
}

#[test]
fn test_destroyed_body_leaves_no_tile_references() {
    let mut scene = scene_with_floor(15);
    let id = spawn_body(
        &mut scene,
        EntityTag::Crate,
        Vec2::new(40.0, 40.0),
        Vec2::splat(32.0),
    );
    run(&mut scene, 1);
    assert!(scene.world.grid.tiles().any(|t| t.entities.contains(&id)));

    scene.world.destroy_entity(id);
    scene.world.flush();
    assert!(!scene.world.grid.tiles().any(|t| t.entities.contains(&id)));
    assert!(scene.world.manager.get_entity(id).is_none());
}
