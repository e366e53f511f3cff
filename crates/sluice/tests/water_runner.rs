//! Water runner tests
//!
//! A runner dropped into a closed basin has to find the bottom, fill it
//! row by row and stop once the basin is full, including after the level
//! is edited mid-fill.

use sluice::water::lowest_point_search;
use sluice::{AssetRegistry, LevelMap, Scene, SimConfig, TileType};
use sluice_core::{ComponentKind, EntityId, RunnerState, WaterRunner};

const W: u32 = 6;
const H: u32 = 5;

/// Walls on columns 0 and 5, floor on row 4, runner above column 2.
fn basin_scene() -> Scene {
    let mut map = LevelMap::new(W, H);
    for y in 0..H {
        map.set(0, y, 1);
        map.set(W - 1, y, 1);
    }
    for x in 0..W {
        map.set(x, H - 1, 1);
    }
    map.set(2, 0, 21);

    let mut scene = Scene::new(SimConfig::default(), AssetRegistry::default()).unwrap();
    scene.load_map(&map).unwrap();
    scene
}

fn runner_id(scene: &Scene) -> EntityId {
    scene
        .world
        .manager
        .entities_with(ComponentKind::WaterRunner)
        .next()
        .unwrap()
}

fn runner_state(scene: &Scene) -> RunnerState {
    let id = runner_id(scene);
    scene.world.manager.get_component::<WaterRunner>(id).unwrap().state
}

/// Ticks until the runner reports `FillComplete`, up to `max` frames.
fn run_until_complete(scene: &mut Scene, max: u32) -> bool {
    let dt = scene.world.config.frame.fixed_dt;
    for _ in 0..max {
        scene.tick(dt);
        if runner_state(scene) == RunnerState::FillComplete {
            return true;
        }
    }
    false
}

fn interior() -> impl Iterator<Item = (u32, u32)> {
    (0..H - 1).flat_map(|y| (1..W - 1).map(move |x| (x, y)))
}

// =============================================================================
// SEARCH
// =============================================================================

#[test]
fn test_search_targets_basin_floor() {
    let scene = basin_scene();
    let id = runner_id(&scene);
    let mut runner = scene.world.manager.get_component::<WaterRunner>(id).unwrap().clone();

    let target = lowest_point_search(&mut runner, &scene.world.grid).unwrap();
    let (_, row) = scene.world.grid.coords(target);
    assert_eq!(row, H - 2);

    // Same grid, same answer
    let again = lowest_point_search(&mut runner, &scene.world.grid).unwrap();
    assert_eq!(target, again);
}

// =============================================================================
// FILL
// =============================================================================

#[test]
fn test_basin_fills_completely() {
    let mut scene = basin_scene();
    assert!(run_until_complete(&mut scene, 2000));

    let grid = &scene.world.grid;
    for (x, y) in interior() {
        let tile = grid.tile(grid.index(x as i32, y as i32).unwrap()).unwrap();
        assert!(tile.is_full(), "tile ({x}, {y}) not full");
        assert!(tile.wet);
    }
    for y in 0..H {
        let wall = grid.tile(grid.index(0, y as i32).unwrap()).unwrap();
        assert_eq!(wall.water_level, 0);
    }
}

#[test]
fn test_water_never_exceeds_capacity() {
    let mut scene = basin_scene();
    let dt = scene.world.config.frame.fixed_dt;
    for _ in 0..400 {
        scene.tick(dt);
        assert!(scene
            .world
            .grid
            .tiles()
            .all(|t| t.water_level <= t.max_water_level));
    }
}

#[test]
fn test_bottom_row_fills_before_rows_above() {
    let mut scene = basin_scene();
    let dt = scene.world.config.frame.fixed_dt;
    let above = scene.world.grid.index(2, H as i32 - 3).unwrap();
    let bottom: Vec<u32> = (1..W - 1)
        .map(|x| scene.world.grid.index(x as i32, H as i32 - 2).unwrap())
        .collect();

    for _ in 0..2000 {
        scene.tick(dt);
        let grid = &scene.world.grid;
        if grid.tile(above).unwrap().water_level > 0 {
            assert!(bottom.iter().all(|&i| grid.tile(i).unwrap().is_full()));
            return;
        }
    }
    panic!("water never reached the second row");
}

#[test]
fn test_tile_edit_resets_and_refills() {
    let mut scene = basin_scene();
    let dt = scene.world.config.frame.fixed_dt;
    for _ in 0..30 {
        scene.tick(dt);
    }

    // Wall off the top-right corner of the basin
    let corner = scene.world.grid.index(W as i32 - 2, 0).unwrap();
    scene.change_tile(corner, TileType::Solid);
    assert_eq!(runner_state(&scene), RunnerState::Reset);

    assert!(run_until_complete(&mut scene, 2000));
    let grid = &scene.world.grid;
    for (x, y) in interior() {
        let idx = grid.index(x as i32, y as i32).unwrap();
        if idx == corner {
            continue;
        }
        assert!(grid.tile(idx).unwrap().is_full(), "tile ({x}, {y}) not full");
    }
}
