// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Layout validation at first graph build.

#![allow(clippy::missing_panics_doc)]

use binlayout::{
    BinarySerializer, BindingSource, DescriptorTable, Error, MemberDescriptor, ObjectValue,
    PrimitiveKind, SchemaError, StringEncoding, TypeDescriptorBuilder, TypeRef, Value,
};

fn schema_error(serializer: &BinarySerializer, type_name: &str) -> SchemaError {
    match serializer.to_bytes(&Value::Object(ObjectValue::new(type_name))) {
        Err(Error::Schema(err)) => err,
        other => panic!("expected schema error for '{type_name}', got {other:?}"),
    }
}

#[test]
fn test_missing_order() {
    let table = DescriptorTable::new().with(
        TypeDescriptorBuilder::new("Loose")
            .field("a", 0, PrimitiveKind::U8)
            .member(MemberDescriptor::new("b", PrimitiveKind::U8))
            .build(),
    );
    let serializer = BinarySerializer::new(table);
    assert_eq!(
        schema_error(&serializer, "Loose"),
        SchemaError::MissingOrder {
            type_name: "Loose".into(),
            member: "b".into(),
        }
    );
}

#[test]
fn test_duplicate_order() {
    let table = DescriptorTable::new().with(
        TypeDescriptorBuilder::new("Clash")
            .field("a", 1, PrimitiveKind::U8)
            .field("b", 1, PrimitiveKind::U16)
            .build(),
    );
    let serializer = BinarySerializer::new(table);
    assert!(matches!(
        schema_error(&serializer, "Clash"),
        SchemaError::DuplicateOrder { order: 1, .. }
    ));
}

#[test]
fn test_single_member_needs_no_order() {
    let table = DescriptorTable::new().with(
        TypeDescriptorBuilder::new("Single")
            .member(MemberDescriptor::new("only", PrimitiveKind::U16))
            .member(MemberDescriptor::new("skipped", PrimitiveKind::U64).ignored())
            .build(),
    );
    let serializer = BinarySerializer::new(table);
    let value = Value::Object(
        ObjectValue::new("Single")
            .with("only", 0x0102u16)
            .with("skipped", 9u64),
    );

    let bytes = serializer.to_bytes(&value).unwrap();
    assert_eq!(bytes, [2, 1]);
    let decoded = serializer.from_bytes("Single", &bytes).unwrap();
    assert!(!decoded.as_object().unwrap().contains("skipped"));
}

#[test]
fn test_orders_sort_members() {
    let table = DescriptorTable::new().with(
        TypeDescriptorBuilder::new("Sorted")
            .field("third", 30, PrimitiveKind::U8)
            .field("first", -5, PrimitiveKind::U8)
            .field("second", 10, PrimitiveKind::U8)
            .build(),
    );
    let serializer = BinarySerializer::new(table);
    let value = Value::Object(
        ObjectValue::new("Sorted")
            .with("first", 1u8)
            .with("second", 2u8)
            .with("third", 3u8),
    );
    assert_eq!(serializer.to_bytes(&value).unwrap(), [1, 2, 3]);
}

#[test]
fn test_unknown_member_type() {
    let table = DescriptorTable::new().with(
        TypeDescriptorBuilder::new("Holder")
            .field("thing", 0, TypeRef::collection(TypeRef::named("Missing")))
            .build(),
    );
    let serializer = BinarySerializer::new(table);
    assert_eq!(
        schema_error(&serializer, "Holder"),
        SchemaError::UnknownType("Missing".into())
    );
}

#[test]
fn test_inheritance_cycle() {
    let table = DescriptorTable::new()
        .with(TypeDescriptorBuilder::new("A").base("B").build())
        .with(TypeDescriptorBuilder::new("B").base("A").build());
    let serializer = BinarySerializer::new(table);
    assert!(matches!(
        schema_error(&serializer, "A"),
        SchemaError::InheritanceCycle(_)
    ));
}

#[test]
fn test_invalid_member_metadata() {
    let table = DescriptorTable::new()
        .with(
            TypeDescriptorBuilder::new("CountOnScalar")
                .member(MemberDescriptor::new("n", PrimitiveKind::U8).with_count(2u64))
                .build(),
        )
        .with(
            TypeDescriptorBuilder::new("Base")
                .field("id", 0, PrimitiveKind::U8)
                .build(),
        )
        .with(
            TypeDescriptorBuilder::new("Shadow")
                .base("Base")
                .field("id", 0, PrimitiveKind::U16)
                .build(),
        )
        .with(
            TypeDescriptorBuilder::new("BadConstructor")
                .field("a", 0, PrimitiveKind::U8)
                .constructor(&["a", "nope"])
                .build(),
        );
    let serializer = BinarySerializer::new(table);

    for type_name in ["CountOnScalar", "Shadow", "BadConstructor"] {
        assert!(
            matches!(
                schema_error(&serializer, type_name),
                SchemaError::InvalidMember { .. }
            ),
            "{type_name}"
        );
    }
}

#[test]
fn test_failed_layout_is_isolated() {
    let table = DescriptorTable::new()
        .with(
            TypeDescriptorBuilder::new("Good")
                .field("a", 0, PrimitiveKind::U8)
                .build(),
        )
        .with(
            TypeDescriptorBuilder::new("Bad")
                .field("a", 0, PrimitiveKind::U8)
                .field("b", 0, PrimitiveKind::U8)
                .build(),
        );
    let serializer = BinarySerializer::new(table);

    assert!(matches!(
        schema_error(&serializer, "Bad"),
        SchemaError::DuplicateOrder { .. }
    ));
    // Not cached: the same error is raised again.
    assert!(matches!(
        schema_error(&serializer, "Bad"),
        SchemaError::DuplicateOrder { .. }
    ));

    let good = Value::Object(ObjectValue::new("Good").with("a", 5u8));
    assert_eq!(serializer.to_bytes(&good).unwrap(), [5]);
    assert!(serializer.type_graph().contains("Good"));
    assert!(!serializer.type_graph().contains("Bad"));
}

#[test]
fn test_unbounded_member_must_be_last() {
    let table = DescriptorTable::new()
        .with(
            TypeDescriptorBuilder::new("Uncounted")
                .field("data", 0, TypeRef::collection(PrimitiveKind::U8))
                .field("tail", 1, PrimitiveKind::U8)
                .build(),
        )
        .with(
            TypeDescriptorBuilder::new("RawFirst")
                .field("blob", 0, PrimitiveKind::Bytes)
                .field("tail", 1, PrimitiveKind::U8)
                .build(),
        )
        .with(
            TypeDescriptorBuilder::new("SizedFirst")
                .field("text", 0, PrimitiveKind::String(StringEncoding::Sized))
                .field("tail", 1, PrimitiveKind::U8)
                .build(),
        )
        .with(
            TypeDescriptorBuilder::new("Base")
                .field("blob", 0, PrimitiveKind::Bytes)
                .build(),
        )
        .with(
            TypeDescriptorBuilder::new("Derived")
                .base("Base")
                .field("tail", 0, PrimitiveKind::U8)
                .build(),
        )
        .with(
            TypeDescriptorBuilder::new("Blobs")
                .field("n", 0, PrimitiveKind::U8)
                .member(
                    MemberDescriptor::new("items", TypeRef::collection(PrimitiveKind::Bytes))
                        .with_order(1)
                        .with_count(BindingSource::sibling("n")),
                )
                .build(),
        );
    let serializer = BinarySerializer::new(table);

    for type_name in ["Uncounted", "RawFirst", "SizedFirst", "Derived", "Blobs"] {
        assert!(
            matches!(
                schema_error(&serializer, type_name),
                SchemaError::InvalidMember { .. }
            ),
            "{type_name}"
        );
    }
}

#[test]
fn test_bounded_or_trailing_members_accepted() {
    let table = DescriptorTable::new()
        .with(
            TypeDescriptorBuilder::new("Trailing")
                .field("head", 0, PrimitiveKind::U8)
                .field("data", 1, TypeRef::collection(PrimitiveKind::U8))
                .build(),
        )
        .with(
            TypeDescriptorBuilder::new("Bounded")
                .field("len", 0, PrimitiveKind::U8)
                .member(
                    MemberDescriptor::new("blob", PrimitiveKind::Bytes)
                        .with_order(1)
                        .with_length(BindingSource::sibling("len")),
                )
                .field("tail", 2, PrimitiveKind::U8)
                .build(),
        );
    let serializer = BinarySerializer::new(table);

    let trailing = Value::Object(
        ObjectValue::new("Trailing")
            .with("head", 1u8)
            .with("data", Value::list([1u8, 2])),
    );
    let bytes = serializer.to_bytes(&trailing).unwrap();
    assert_eq!(bytes, [1, 1, 2]);
    assert_eq!(serializer.from_bytes("Trailing", &bytes).unwrap(), trailing);

    let bounded = Value::Object(
        ObjectValue::new("Bounded")
            .with("len", 2u8)
            .with("blob", vec![7u8, 8])
            .with("tail", 9u8),
    );
    let bytes = serializer.to_bytes(&bounded).unwrap();
    assert_eq!(bytes, [2, 7, 8, 9]);
    assert_eq!(serializer.from_bytes("Bounded", &bytes).unwrap(), bounded);
}
