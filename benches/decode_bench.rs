//! Performance benchmarks for the init payload decoder.
//!
//! This suite measures end-to-end init batches through the runtime:
//! - Batch sizes: 1 to 1024 components per payload
//! - Value mix: scalar-heavy vs reference-heavy entries
//! - Handoff paths: direct slices vs the staged scratch arena

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;
use tether::{GraphIndex, PayloadWriter, RefOffsets, Runtime, TypeDescriptor, WireValue};

const MANAGER: u32 = 0;

/// Four scalar slots: bias (float), count (int), label (string),
/// offset (vec3).
fn scalar_descriptor() -> TypeDescriptor {
    TypeDescriptor::from_json(
        r#"{
            "name": "Probe",
            "properties": {
                "bias": { "kind": "float" },
                "count": { "kind": "int" },
                "label": { "kind": "string" },
                "offset": { "kind": "vec3" }
            }
        }"#,
    )
    .unwrap()
}

/// Four reference slots: anchor (node), clip (animation), mesh (mesh),
/// skin (skin).
fn reference_descriptor() -> TypeDescriptor {
    TypeDescriptor::from_json(
        r#"{
            "name": "Binding",
            "properties": {
                "anchor": { "kind": "node" },
                "clip": { "kind": "animation" },
                "mesh": { "kind": "mesh" },
                "skin": { "kind": "skin" }
            }
        }"#,
    )
    .unwrap()
}

fn scalar_payload(count: usize) -> Vec<u8> {
    let mut writer = PayloadWriter::new();
    for i in 0..count {
        writer.entry(&[
            WireValue::Float(i as f32 * 0.25),
            WireValue::Int(i as i32),
            WireValue::Str(format!("probe_{i}")),
            WireValue::Vec3([1.0, 2.0, 3.0]),
        ]);
    }
    writer.finish()
}

fn reference_payload(count: usize) -> Vec<u8> {
    let mut writer = PayloadWriter::new();
    for i in 0..count {
        let raw = i as i32 + 1;
        writer.entry(&[
            WireValue::Ref(raw),
            WireValue::Ref(raw),
            WireValue::Ref(raw),
            WireValue::Ref(raw),
        ]);
    }
    writer.finish()
}

/// Runtime holding `count` components of `descriptor`, ready to take
/// init batches for ids `0..count`.
fn session(descriptor: TypeDescriptor, count: usize) -> (Runtime, GraphIndex, Vec<i32>) {
    let mut rt = Runtime::default();
    let type_index = rt.registry.register(descriptor).unwrap().get();
    let graph = rt.create_graph();
    rt.reserve_object_handles(graph, count + 1);
    rt.create_object(graph, 0, -1);
    for id in 0..count {
        rt.create_component(graph, MANAGER, id as i32, type_index, 0);
    }
    let ids: Vec<i32> = (0..count as i32).collect();
    (rt, graph, ids)
}

/// Decode throughput across batch sizes, scalar entries only.
fn batch_size_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode/batch_sizes");

    for &count in &[1usize, 16, 256, 1024] {
        let (mut rt, graph, ids) = session(scalar_descriptor(), count);
        let payload = scalar_payload(count);
        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_function(format!("batch_{count}"), |b| {
            b.iter(|| {
                let applied = rt.init_components(
                    graph,
                    MANAGER,
                    black_box(&ids),
                    black_box(&payload),
                    RefOffsets::default(),
                );
                black_box(applied)
            });
        });
    }

    group.finish();
}

/// Scalar entries against reference entries at a fixed batch size.
/// Reference entries exercise the wrapper caches on every slot.
fn value_mix_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode/value_mix");
    let count = 256;

    let (mut rt, graph, ids) = session(scalar_descriptor(), count);
    let payload = scalar_payload(count);
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("scalar_entries", |b| {
        b.iter(|| {
            let applied = rt.init_components(
                graph,
                MANAGER,
                black_box(&ids),
                black_box(&payload),
                RefOffsets::default(),
            );
            black_box(applied)
        });
    });

    let (mut rt, graph, ids) = session(reference_descriptor(), count);
    let payload = reference_payload(count);
    let offsets = RefOffsets {
        node: -1,
        ..Default::default()
    };
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("reference_entries", |b| {
        b.iter(|| {
            let applied = rt.init_components(
                graph,
                MANAGER,
                black_box(&ids),
                black_box(&payload),
                black_box(offsets),
            );
            black_box(applied)
        });
    });

    group.finish();
}

/// The staged handoff: ids and payload are copied into the scratch
/// arena first, the way the native module delivers them.
fn staged_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode/staged");
    let count = 256;

    let (mut rt, graph, ids) = session(scalar_descriptor(), count);
    let payload = scalar_payload(count);
    let id_bytes = ids.len() * 4;
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("staged_batch_256", |b| {
        b.iter(|| {
            rt.scratch().ints(ids.len()).copy_from_slice(&ids);
            rt.scratch().bytes(id_bytes + payload.len())[id_bytes..].copy_from_slice(&payload);
            let applied = rt.init_components_staged(
                graph,
                MANAGER,
                ids.len(),
                payload.len(),
                RefOffsets::default(),
            );
            black_box(applied)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    batch_size_benchmarks,
    value_mix_benchmarks,
    staged_benchmarks
);

criterion_main!(benches);
