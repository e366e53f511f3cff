//! # ECS Benchmarks
//!
//! Measures the per-frame cost of the deferred spawn/despawn cycle and of
//! forward-index iteration at the default entity budget.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sluice_core::{
    BoundingBox, ComponentKind, EntityManager, EntityTag, PendingOps, PoolConfig, SlotPool,
    Transform,
};

const SPAWNS_PER_FRAME: usize = 512;

fn bench_pool_churn(c: &mut Criterion) {
    let mut pool: SlotPool<Transform> = SlotPool::new("bench", 1024);

    c.bench_function("slot_pool_allocate_free_1024", |b| {
        b.iter(|| {
            for _ in 0..1024 {
                if let Some(h) = pool.allocate() {
                    pool.free(black_box(h));
                }
            }
        });
    });
}

fn bench_spawn_despawn_frame(c: &mut Criterion) {
    let mut manager = EntityManager::new(&PoolConfig::default());
    let mut ops = PendingOps::with_capacity(SPAWNS_PER_FRAME);
    let mut spawned = Vec::with_capacity(SPAWNS_PER_FRAME);

    c.bench_function("spawn_despawn_512_per_frame", |b| {
        b.iter(|| {
            spawned.clear();
            for _ in 0..SPAWNS_PER_FRAME {
                if let Some(id) = manager.add_entity(EntityTag::Arrow, &mut ops) {
                    manager.add_component::<Transform>(id, &mut ops);
                    manager.add_component::<BoundingBox>(id, &mut ops);
                    spawned.push(id);
                }
            }
            manager.update(&mut ops, &mut ());

            for &id in &spawned {
                manager.remove_entity(id, &mut ops);
            }
            manager.update(&mut ops, &mut ());
            black_box(manager.entity_count())
        });
    });
}

fn bench_forward_index_iteration(c: &mut Criterion) {
    let mut manager = EntityManager::new(&PoolConfig::default());
    let mut ops = PendingOps::new();
    for i in 0..1000 {
        if let Some(id) = manager.add_entity(EntityTag::Crate, &mut ops) {
            if let Some(t) = manager.add_component::<Transform>(id, &mut ops) {
                t.velocity.x = i as f32;
            }
        }
    }
    manager.update(&mut ops, &mut ());
    let mut ids = Vec::new();

    c.bench_function("iterate_transforms_1000", |b| {
        b.iter(|| {
            manager.collect_entities_with(ComponentKind::Transform, &mut ids);
            let mut sum = 0.0;
            for &id in &ids {
                if let Some(t) = manager.get_component::<Transform>(id) {
                    sum += t.velocity.x;
                }
            }
            black_box(sum)
        });
    });
}

criterion_group!(
    benches,
    bench_pool_churn,
    bench_spawn_despawn_frame,
    bench_forward_index_iteration
);
criterion_main!(benches);
