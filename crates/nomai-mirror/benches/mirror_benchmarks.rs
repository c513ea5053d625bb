//! Mirror mutation throughput.
//!
//! Measures how fast the mirror absorbs a frame of entity mutations and how
//! long the derived hierarchy takes to rebuild, at several world sizes.
//!
//! Run with: `cargo bench --bench mirror_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

use nomai_mirror::prelude::*;
use nomai_reflect::registry::TypeRegistry;
use nomai_reflect::type_names;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const TRANSFORM: ComponentId = ComponentId(1);
const PARENT: ComponentId = ComponentId(2);
const NAME: ComponentId = ComponentId(3);

fn registry() -> ComponentRegistry {
    [
        ComponentInfo::new(1, "bevy_transform::components::transform::Transform"),
        ComponentInfo::new(2, type_names::PARENT),
        ComponentInfo::new(3, type_names::NAME),
    ]
    .into_iter()
    .collect()
}

/// Creation events for `count` entities, every tenth one a root and the rest
/// parented to the closest preceding root.
fn spawn_events(count: u32) -> Vec<(EntityId, EntityMutation)> {
    (0..count)
        .map(|i| {
            let entity = EntityId::new(i, 0);
            let mut changes = vec![
                ComponentChange::new(TRANSFORM, false, json!({ "translation": [i, 0, 0] })),
                ComponentChange::new(NAME, false, json!(format!("entity_{i}"))),
            ];
            if i % 10 != 0 {
                let root = EntityId::new(i - i % 10, 0);
                changes.push(ComponentChange::new(PARENT, false, json!(root.to_raw())));
            }
            (entity, EntityMutation::change(changes, Vec::new()))
        })
        .collect()
}

/// One frame of transform updates touching every tenth entity.
fn update_events(count: u32, frame: u32) -> Vec<(EntityId, EntityMutation)> {
    (0..count)
        .step_by(10)
        .map(|i| {
            let transform = json!({ "translation": [i, frame, 0] });
            let change = ComponentChange::new(TRANSFORM, false, transform);
            (EntityId::new(i, 0), EntityMutation::change(vec![change], Vec::new()))
        })
        .collect()
}

fn populated_mirror(
    components: &ComponentRegistry,
    types: &TypeRegistry,
    count: u32,
) -> WorldMirror {
    let ctx = MirrorContext::new(components, types);
    let mut mirror = WorldMirror::new();
    for (entity, mutation) in spawn_events(count) {
        mirror.apply(ctx, entity, &mutation);
    }
    mirror
}

// ---------------------------------------------------------------------------
// Benchmark 1: Entity creation
// ---------------------------------------------------------------------------

fn bench_spawn_1k(c: &mut Criterion) {
    let components = registry();
    let types = TypeRegistry::new();
    let events = spawn_events(1000);

    c.bench_function("mirror_spawn_1k", |b| {
        b.iter(|| {
            let ctx = MirrorContext::new(&components, &types);
            let mut mirror = WorldMirror::new();
            for (entity, mutation) in &events {
                mirror.apply(ctx, *entity, mutation);
            }
            black_box(mirror.len());
        });
    });
}

// ---------------------------------------------------------------------------
// Benchmark 2: Frame updates at various world sizes
// ---------------------------------------------------------------------------

fn bench_update_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("mirror_update_scaling");
    let components = registry();
    let types = TypeRegistry::new();

    for &count in &[100u32, 1000, 5000] {
        let mut mirror = populated_mirror(&components, &types, count);
        let events = update_events(count, 1);

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &_count| {
            b.iter(|| {
                let ctx = MirrorContext::new(&components, &types);
                for (entity, mutation) in &events {
                    black_box(mirror.apply(ctx, *entity, mutation));
                }
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark 3: Hierarchy rebuild
// ---------------------------------------------------------------------------

fn bench_hierarchy_1k(c: &mut Criterion) {
    let components = registry();
    let types = TypeRegistry::new();
    let mirror = populated_mirror(&components, &types, 1000);

    c.bench_function("mirror_hierarchy_1k", |b| {
        b.iter(|| black_box(build_hierarchy(&mirror, &components)));
    });
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_spawn_1k, bench_update_scaling, bench_hierarchy_1k);
criterion_main!(benches);
