// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Item-length bindings: constant, bound to a scalar, and jagged (bound to a
// collection of lengths).

#![allow(clippy::missing_panics_doc)]

use binlayout::{
    BinarySerializer, BindingError, BindingSource, DescriptorTable, Error, MemberDescriptor,
    ObjectValue, PrimitiveKind, TypeDescriptorBuilder, TypeRef, Value,
};

fn strings(items: &[&str]) -> Value {
    Value::list(items.iter().copied())
}

#[test]
fn test_constant_item_length() {
    let table = DescriptorTable::new().with(
        TypeDescriptorBuilder::new("Codes")
            .member(
                MemberDescriptor::new("list", TypeRef::collection(TypeRef::string()))
                    .with_order(0)
                    .with_item_length(3u64),
            )
            .build(),
    );
    let serializer = BinarySerializer::new(table);
    let value = Value::Object(ObjectValue::new("Codes").with("list", strings(&["abc", "def", "ghi"])));

    let bytes = serializer.to_bytes(&value).unwrap();
    assert_eq!(bytes, b"abcdefghi");
    assert_eq!(serializer.from_bytes("Codes", &bytes).unwrap(), value);
}

fn bound_item_length() -> BinarySerializer {
    BinarySerializer::new(
        DescriptorTable::new().with(
            TypeDescriptorBuilder::new("Words")
                .field("item_length", 0, PrimitiveKind::I32)
                .member(
                    MemberDescriptor::new("items", TypeRef::collection(TypeRef::string()))
                        .with_order(1)
                        .with_item_length(BindingSource::sibling("item_length")),
                )
                .build(),
        ),
    )
}

#[test]
fn test_bound_item_length() {
    let serializer = bound_item_length();
    let value = Value::Object(ObjectValue::new("Words").with("items", strings(&["abc", "def", "ghi"])));

    let bytes = serializer.to_bytes(&value).unwrap();
    assert_eq!(bytes.len(), 4 + 3 * 3);
    assert_eq!(&bytes[..4], [3, 0, 0, 0]);

    let decoded = serializer.from_bytes("Words", &bytes).unwrap();
    let words = decoded.as_object().unwrap();
    assert_eq!(words.get_as::<i32>("item_length"), Some(3));
    assert_eq!(words.get("items"), Some(&strings(&["abc", "def", "ghi"])));
}

#[test]
fn test_bound_item_length_mismatch() {
    let serializer = bound_item_length();
    let value = Value::Object(ObjectValue::new("Words").with("items", strings(&["abc", "defghi"])));

    let err = serializer.to_bytes(&value).unwrap_err();
    assert!(matches!(
        err,
        Error::Binding(BindingError::ItemLengthMismatch {
            first: 3,
            index: 1,
            other: 6,
            ..
        })
    ));
}

#[test]
fn test_item_length_of_byte_arrays() {
    let table = DescriptorTable::new().with(
        TypeDescriptorBuilder::new("Blocks")
            .member(
                MemberDescriptor::new("arrays", TypeRef::collection(PrimitiveKind::Bytes))
                    .with_order(0)
                    .with_item_length(3u64),
            )
            .build(),
    );
    let serializer = BinarySerializer::new(table);
    let value = Value::Object(ObjectValue::new("Blocks").with(
        "arrays",
        Value::list([vec![0u8; 3], vec![1u8; 3], vec![2u8; 3]]),
    ));

    let bytes = serializer.to_bytes(&value).unwrap();
    assert_eq!(bytes, [0, 0, 0, 1, 1, 1, 2, 2, 2]);
    assert_eq!(serializer.from_bytes("Blocks", &bytes).unwrap(), value);
}

#[test]
fn test_item_length_around_objects() {
    let table = DescriptorTable::new()
        .with(
            TypeDescriptorBuilder::new("Inner")
                .field("value", 0, TypeRef::string())
                .build(),
        )
        .with(
            TypeDescriptorBuilder::new("Outer")
                .member(
                    MemberDescriptor::new("inner", TypeRef::collection(TypeRef::named("Inner")))
                        .with_order(0)
                        .with_item_length(3u64),
                )
                .build(),
        );
    let serializer = BinarySerializer::new(table);
    let inner = |s: &str| Value::Object(ObjectValue::new("Inner").with("value", s));

    let value = Value::Object(ObjectValue::new("Outer").with("inner", Value::List(vec![inner("he"), inner("wo")])));
    let bytes = serializer.to_bytes(&value).unwrap();
    assert_eq!(bytes, b"he\0wo\0");
    assert_eq!(serializer.from_bytes("Outer", &bytes).unwrap(), value);

    // Items longer than the item length are rejected rather than truncated.
    let long = Value::Object(ObjectValue::new("Outer").with("inner", Value::List(vec![inner("hello")])));
    assert!(matches!(
        serializer.to_bytes(&long),
        Err(Error::Binding(BindingError::LengthMismatch { expected: 3, actual: 6, .. }))
    ));
}

fn jagged() -> BinarySerializer {
    BinarySerializer::new(
        DescriptorTable::new().with(
            TypeDescriptorBuilder::new("Roster")
                .field("name_count", 0, PrimitiveKind::U8)
                .member(
                    MemberDescriptor::new("name_lengths", TypeRef::collection(PrimitiveKind::U8))
                        .with_order(1)
                        .with_count(BindingSource::sibling("name_count")),
                )
                .member(
                    MemberDescriptor::new("names", TypeRef::collection(TypeRef::string()))
                        .with_order(2)
                        .with_count(BindingSource::sibling("name_count"))
                        .with_item_length(BindingSource::sibling("name_lengths")),
                )
                .member(
                    MemberDescriptor::new("aliases", TypeRef::collection(TypeRef::string()))
                        .with_order(3)
                        .with_item_length(BindingSource::sibling("name_lengths")),
                )
                .build(),
        ),
    )
}

#[test]
fn test_jagged_item_lengths() {
    let _ = env_logger::try_init();
    let serializer = jagged();
    let names = strings(&["Alice", "Bob", "Charlie"]);
    let value = Value::Object(
        ObjectValue::new("Roster")
            .with("names", names.clone())
            .with("aliases", names.clone()),
    );

    let bytes = serializer.to_bytes(&value).unwrap();
    let mut expected = vec![3, 5, 3, 7];
    expected.extend_from_slice(b"AliceBobCharlie");
    expected.extend_from_slice(b"AliceBobCharlie");
    assert_eq!(bytes, expected);

    let decoded = serializer.from_bytes("Roster", &bytes).unwrap();
    let roster = decoded.as_object().unwrap();
    assert_eq!(roster.get("name_lengths"), Some(&Value::list([5u8, 3, 7])));
    assert_eq!(roster.get("names"), Some(&names));
    assert_eq!(roster.get("aliases"), Some(&names));
}

#[test]
fn test_jagged_lengths_must_agree() {
    let serializer = jagged();
    let value = Value::Object(
        ObjectValue::new("Roster")
            .with("names", strings(&["Alice", "Bob"]))
            .with("aliases", strings(&["Al", "Bo"])),
    );
    assert!(matches!(
        serializer.to_bytes(&value),
        Err(Error::Binding(BindingError::Conflict { .. }))
    ));
}
