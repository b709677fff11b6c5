// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use binlayout::{
    BinarySerializer, BindingSource, DescriptorTable, MemberDescriptor, PrimitiveKind,
    SerializerConfig, SubtypeBinding, TypeDescriptorBuilder, TypeRef,
};
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

fn serializer() -> &'static BinarySerializer {
    static SERIALIZER: OnceLock<BinarySerializer> = OnceLock::new();
    SERIALIZER.get_or_init(|| {
        let table = DescriptorTable::new()
            .with(
                TypeDescriptorBuilder::new("Node")
                    .field("value", 0, PrimitiveKind::U8)
                    .field("next", 1, TypeRef::named("Node"))
                    .build(),
            )
            .with(
                TypeDescriptorBuilder::new("Leaf")
                    .base("Node")
                    .field("tag", 0, TypeRef::string())
                    .build(),
            )
            .with(
                TypeDescriptorBuilder::new("Packet")
                    .field("kind", 0, PrimitiveKind::U8)
                    .field("count", 1, PrimitiveKind::U16)
                    .field("size", 2, PrimitiveKind::U32)
                    .member(
                        MemberDescriptor::new("node", TypeRef::named("Node"))
                            .with_order(3)
                            .with_subtypes(
                                SubtypeBinding::new(BindingSource::sibling("kind"))
                                    .case(0u8, "Node")
                                    .case(1u8, "Leaf"),
                            ),
                    )
                    .member(
                        MemberDescriptor::new("sizes", TypeRef::collection(PrimitiveKind::U8))
                            .with_order(4)
                            .with_count(BindingSource::sibling("count")),
                    )
                    .member(
                        MemberDescriptor::new("names", TypeRef::collection(TypeRef::string()))
                            .with_order(5)
                            .with_count(BindingSource::sibling("count"))
                            .with_item_length(BindingSource::sibling("sizes")),
                    )
                    .member(
                        MemberDescriptor::new("payload", PrimitiveKind::Bytes)
                            .with_order(6)
                            .with_length(BindingSource::sibling("size")),
                    )
                    .build(),
            );
        BinarySerializer::new(table).with_config(SerializerConfig {
            max_depth: 32,
            max_collection_count: 1 << 16,
            ..SerializerConfig::default()
        })
    })
}

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary input must fail cleanly, never panic.
    let _ = serializer().from_bytes("Packet", data);
});
