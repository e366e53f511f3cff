//! # Collision Benchmarks
//!
//! Measures the overlap primitive, grid-backed collision queries, and a
//! full scene tick with a pile of falling crates.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sluice::{find_aabb_overlap, AssetRegistry, LevelMap, Scene, SimConfig};
use sluice_core::EntityId;
use sluice_shared::{Rect, Vec2};

const MAP_W: u32 = 48;
const MAP_H: u32 = 32;

/// Walled level with a floor, a few shelves and `crates` wooden crates
/// stacked on them.
fn crate_level(crates: u32) -> LevelMap {
    let mut map = LevelMap::new(MAP_W, MAP_H);
    for x in 0..MAP_W {
        map.set(x, MAP_H - 1, 1);
    }
    for y in 0..MAP_H {
        map.set(0, y, 1);
        map.set(MAP_W - 1, y, 1);
    }
    for shelf in [8, 16, 24] {
        for x in 4..MAP_W - 4 {
            if x % 6 != 0 {
                map.set(x, shelf, 2);
            }
        }
    }
    let mut placed = 0;
    'rows: for y in 1..MAP_H - 2 {
        for x in 2..MAP_W - 2 {
            if placed == crates {
                break 'rows;
            }
            if y % 8 != 0 && x % 3 == 0 {
                map.set(x, y, 8);
                placed += 1;
            }
        }
    }
    map.set(MAP_W / 2, 2, 21);
    map
}

fn bench_aabb_overlap(c: &mut Criterion) {
    let a = Rect::new(10.0, 10.0, 32.0, 32.0);
    let boxes: Vec<Rect> = (0..64)
        .map(|i| Rect::new(i as f32 * 3.0, (i % 8) as f32 * 5.0, 30.0, 42.0))
        .collect();

    c.bench_function("aabb_overlap_64", |b| {
        b.iter(|| {
            let mut hits = 0;
            for &other in &boxes {
                let (kind, overlap) = find_aabb_overlap(black_box(a), other);
                if overlap.x != 0.0 || overlap.y != 0.0 {
                    hits += 1;
                }
                black_box(kind);
            }
            black_box(hits)
        });
    });
}

fn bench_collision_queries(c: &mut Criterion) {
    let mut scene = Scene::new(SimConfig::default(), AssetRegistry::default()).unwrap();
    scene.load_map(&crate_level(120)).unwrap();
    // Let the crates settle into the tile sets
    for _ in 0..60 {
        scene.tick(1.0 / 60.0);
    }
    let ghost = EntityId::new(u32::MAX, 0);
    let size = Vec2::new(30.0, 42.0);

    c.bench_function("check_collision_at_grid_sweep", |b| {
        b.iter(|| {
            let collision = scene.world.collision();
            let mut hits = 0;
            for ty in 0..MAP_H {
                for tx in 0..MAP_W {
                    let pos = Vec2::new(tx as f32 * 32.0, ty as f32 * 32.0);
                    if collision.check_collision_at(ghost, pos, size).is_hit() {
                        hits += 1;
                    }
                }
            }
            black_box(hits)
        });
    });
}

fn bench_scene_tick(c: &mut Criterion) {
    let mut scene = Scene::new(SimConfig::default(), AssetRegistry::default()).unwrap();
    scene.load_map(&crate_level(120)).unwrap();

    c.bench_function("scene_tick_120_crates", |b| {
        b.iter(|| {
            scene.tick(black_box(1.0 / 60.0));
        });
    });
}

criterion_group!(
    benches,
    bench_aabb_overlap,
    bench_collision_queries,
    bench_scene_tick
);
criterion_main!(benches);
