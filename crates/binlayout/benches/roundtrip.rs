// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serialize/Deserialize Roundtrip Benchmark
//!
//! Measures steady-state encode and decode cost once layouts are cached:
//! - flat record with a computed length
//! - polymorphic member behind a discriminator
//! - collections of increasing size with count and jagged item lengths

use binlayout::{
    BinarySerializer, BindingSource, DescriptorTable, MemberDescriptor, ObjectValue,
    PrimitiveKind, SubtypeBinding, TypeDescriptorBuilder, TypeRef, Value,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn serializer() -> BinarySerializer {
    let table = DescriptorTable::new()
        .with(
            TypeDescriptorBuilder::new("Reading")
                .field("sensor", 0, PrimitiveKind::U16)
                .field("value", 1, PrimitiveKind::F64)
                .build(),
        )
        .with(
            TypeDescriptorBuilder::new("Alarm")
                .base("Reading")
                .field("level", 0, PrimitiveKind::U8)
                .build(),
        )
        .with(
            TypeDescriptorBuilder::new("Frame")
                .field("kind", 0, PrimitiveKind::U8)
                .field("count", 1, PrimitiveKind::U32)
                .field("name_len", 2, PrimitiveKind::U8)
                .member(
                    MemberDescriptor::new("name", TypeRef::string())
                        .with_order(3)
                        .with_length(BindingSource::sibling("name_len")),
                )
                .member(
                    MemberDescriptor::new("reading", TypeRef::named("Reading"))
                        .with_order(4)
                        .with_subtypes(
                            SubtypeBinding::new(BindingSource::sibling("kind"))
                                .case(0u8, "Reading")
                                .case(1u8, "Alarm"),
                        ),
                )
                .member(
                    MemberDescriptor::new("lengths", TypeRef::collection(PrimitiveKind::U8))
                        .with_order(5)
                        .with_count(BindingSource::sibling("count")),
                )
                .member(
                    MemberDescriptor::new("labels", TypeRef::collection(TypeRef::string()))
                        .with_order(6)
                        .with_count(BindingSource::sibling("count"))
                        .with_item_length(BindingSource::sibling("lengths")),
                )
                .build(),
        );
    BinarySerializer::new(table)
}

fn frame(items: usize) -> Value {
    let labels: Vec<Value> = (0..items).map(|i| Value::from(format!("label-{i}"))).collect();
    Value::Object(
        ObjectValue::new("Frame")
            .with("name", "bench")
            .with(
                "reading",
                ObjectValue::new("Alarm")
                    .with("sensor", 7u16)
                    .with("value", 21.5f64)
                    .with("level", 2u8),
            )
            .with("labels", labels),
    )
}

fn bench_encode(c: &mut Criterion) {
    let serializer = serializer();
    let mut group = c.benchmark_group("encode");
    for items in [0usize, 16, 256] {
        let value = frame(items);
        serializer.to_bytes(&value).expect("warm-up encode");
        group.bench_with_input(BenchmarkId::from_parameter(items), &value, |b, value| {
            b.iter(|| serializer.to_bytes(black_box(value)).expect("encode"));
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let serializer = serializer();
    let mut group = c.benchmark_group("decode");
    for items in [0usize, 16, 256] {
        let bytes = serializer.to_bytes(&frame(items)).expect("encode");
        group.bench_with_input(BenchmarkId::from_parameter(items), &bytes, |b, bytes| {
            b.iter(|| serializer.from_bytes("Frame", black_box(bytes)).expect("decode"));
        });
    }
    group.finish();
}

fn bench_cold_layout(c: &mut Criterion) {
    let value = frame(4);
    c.bench_function("encode_cold_layout", |b| {
        b.iter(|| {
            let serializer = serializer();
            black_box(serializer.to_bytes(&value).expect("encode"))
        });
    });
}

criterion_group!(roundtrip_benches, bench_encode, bench_decode, bench_cold_layout);
criterion_main!(roundtrip_benches);
