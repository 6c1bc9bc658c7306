//! # Entity Manager Benchmarks
//!
//! Component queries and full world ticks at arena-sized entity counts.
//!
//! Run with: `cargo bench --bench ecs_queries`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use emberfall::{
    AiComponent, AiSystem, Collider, CollisionSystem, EntityKind, EntityManager, Health,
    HealthSystem, MovementSystem, Tag, Transform, Vector2, Velocity,
};

fn populate(world: &mut EntityManager, count: usize) {
    for i in 0..count {
        let e = world.create_entity();
        let f = i as f32;
        world.add_component(e, Transform::at(Vector2::new((f * 37.0) % 1280.0, (f * 17.0) % 720.0)));
        world.add_component(e, Velocity(Vector2::new(10.0, -5.0)));
        world.add_component(e, Health::new(50));
        // Every fourth entity is static scenery without a collider
        if i % 4 != 0 {
            world.add_component(e, Collider::new(24.0, 24.0));
        }
        if i % 2 == 0 {
            world.add_component(e, Tag(EntityKind::Enemy));
            world.add_component(e, AiComponent::default());
        }
    }
    if let Some(first) = world.entities().first().copied() {
        world.add_component(first, Tag(EntityKind::Player));
        world.remove_component::<AiComponent>(first);
    }
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("entities_with");

    for count in [100, 1_000, 5_000] {
        let mut world = EntityManager::new();
        populate(&mut world, count);

        group.bench_with_input(BenchmarkId::new("one", count), &world, |b, world| {
            b.iter(|| black_box(world.entities_with::<(Transform,)>().len()));
        });
        group.bench_with_input(BenchmarkId::new("three", count), &world, |b, world| {
            b.iter(|| black_box(world.entities_with::<(Transform, Velocity, Collider)>().len()));
        });
    }

    group.finish();
}

fn bench_world_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_update");

    for count in [100, 500, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut world = EntityManager::new();
            world.add_system(AiSystem::new());
            world.add_system(MovementSystem::new(None));
            world.add_system(CollisionSystem::new());
            world.add_system(HealthSystem::new());
            populate(&mut world, count);

            b.iter(|| {
                world.update(black_box(1.0 / 60.0));
                if let Some(collisions) = world.get_system_mut::<CollisionSystem>() {
                    black_box(collisions.drain_collisions().len());
                }
            });
        });
    }

    group.finish();
}

fn bench_spawn_despawn_cycle(c: &mut Criterion) {
    c.bench_function("spawn_despawn_1000", |b| {
        let mut world = EntityManager::new();
        let mut ids = Vec::with_capacity(1_000);
        b.iter(|| {
            for _ in 0..1_000 {
                let e = world.create_entity();
                world.add_component(e, Health::new(10));
                ids.push(e);
            }
            for e in ids.drain(..) {
                world.destroy_entity(e);
            }
            world.flush_destroyed();
            black_box(world.entity_count())
        });
    });
}

criterion_group!(benches, bench_queries, bench_world_tick, bench_spawn_despawn_cycle);
criterion_main!(benches);
