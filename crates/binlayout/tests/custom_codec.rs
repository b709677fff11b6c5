// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Custom codec hook: member-level and type-level codecs, the context they
// receive, and length bindings around them.

#![allow(clippy::missing_panics_doc)]

use binlayout::{
    Annotation, BinarySerializable, BinarySerializer, BindingSource, DescriptorTable, Endianness,
    Error, MemberDescriptor, ObjectValue, PrimitiveKind, SerializationContext,
    TypeDescriptorBuilder, TypeRef, Value,
};
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

/// What a codec saw in its context on one call.
#[derive(Debug, Clone, PartialEq)]
struct Observed {
    annotations: usize,
    member: Option<String>,
    parent: Option<String>,
    style: Option<String>,
}

impl Observed {
    fn from_context(context: &SerializationContext<'_>) -> Self {
        Self {
            annotations: context.annotations().len(),
            member: context.member_name().map(str::to_string),
            parent: context.parent_type().map(str::to_string),
            style: context
                .annotation("Format")
                .and_then(|a| a.argument("style"))
                .map(str::to_string),
        }
    }
}

/// `#rrggbb` strings as three raw bytes.
#[derive(Clone, Default)]
struct HexColor {
    calls: Arc<Mutex<Vec<Observed>>>,
}

impl HexColor {
    fn calls(&self) -> Vec<Observed> {
        self.calls.lock().unwrap().clone()
    }
}

impl BinarySerializable for HexColor {
    fn serialize(
        &self,
        value: &Value,
        stream: &mut dyn Write,
        _endianness: Endianness,
        context: &SerializationContext<'_>,
    ) -> binlayout::Result<()> {
        self.calls.lock().unwrap().push(Observed::from_context(context));

        let text = value
            .as_str()
            .and_then(|s| s.strip_prefix('#'))
            .filter(|s| s.len() == 6)
            .ok_or_else(|| Error::codec(context.type_name(), "expected #rrggbb"))?;
        let mut bytes = [0u8; 3];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&text[i * 2..i * 2 + 2], 16)
                .map_err(|e| Error::codec(context.type_name(), e))?;
        }
        stream.write_all(&bytes)?;
        Ok(())
    }

    fn deserialize(
        &self,
        stream: &mut dyn Read,
        _endianness: Endianness,
        context: &SerializationContext<'_>,
    ) -> binlayout::Result<Value> {
        self.calls.lock().unwrap().push(Observed::from_context(context));

        let mut bytes = [0u8; 3];
        stream.read_exact(&mut bytes)?;
        Ok(Value::String(format!(
            "#{:02x}{:02x}{:02x}",
            bytes[0], bytes[1], bytes[2]
        )))
    }
}

fn pixel_table(codec: &HexColor) -> DescriptorTable {
    DescriptorTable::new().with(
        TypeDescriptorBuilder::new("Pixel")
            .field("x", 0, PrimitiveKind::U16)
            .member(
                MemberDescriptor::new("color", TypeRef::string())
                    .with_order(1)
                    .with_codec(codec.clone())
                    .with_annotation(Annotation::new("Format").with_argument("style", "rgb")),
            )
            .build(),
    )
}

#[test]
fn test_member_codec() {
    let codec = HexColor::default();
    let serializer = BinarySerializer::new(pixel_table(&codec));
    let value = Value::Object(
        ObjectValue::new("Pixel")
            .with("x", 3u16)
            .with("color", "#ff8000"),
    );

    let bytes = serializer.to_bytes(&value).unwrap();
    assert_eq!(bytes, [3, 0, 0xff, 0x80, 0x00]);
    assert_eq!(serializer.from_bytes("Pixel", &bytes).unwrap(), value);

    let seen = Observed {
        annotations: 1,
        member: Some("color".into()),
        parent: Some("Pixel".into()),
        style: Some("rgb".into()),
    };
    assert_eq!(codec.calls(), vec![seen.clone(), seen]);
}

#[test]
fn test_codec_error_propagates() {
    let codec = HexColor::default();
    let serializer = BinarySerializer::new(pixel_table(&codec));
    let value = Value::Object(ObjectValue::new("Pixel").with("color", "red"));

    let mut out = Vec::new();
    let err = serializer.serialize(&value, &mut out).unwrap_err();
    assert!(matches!(err, Error::Codec { .. }));
    assert!(out.is_empty());
}

/// Packs `major.minor` into one byte; the type owns its whole layout.
#[derive(Clone, Default)]
struct PackedVersion {
    type_names: Arc<Mutex<Vec<String>>>,
}

impl BinarySerializable for PackedVersion {
    fn serialize(
        &self,
        value: &Value,
        stream: &mut dyn Write,
        _endianness: Endianness,
        context: &SerializationContext<'_>,
    ) -> binlayout::Result<()> {
        self.type_names
            .lock()
            .unwrap()
            .push(context.type_name().to_string());
        let version = value
            .as_object()
            .ok_or_else(|| Error::codec("Version", "expected an object"))?;
        let major = version.get_as::<u8>("major").unwrap_or(0);
        let minor = version.get_as::<u8>("minor").unwrap_or(0);
        if major > 0x0f || minor > 0x0f {
            return Err(Error::codec("Version", "component does not fit in a nibble"));
        }
        stream.write_all(&[(major << 4) | minor])?;
        Ok(())
    }

    fn deserialize(
        &self,
        stream: &mut dyn Read,
        _endianness: Endianness,
        context: &SerializationContext<'_>,
    ) -> binlayout::Result<Value> {
        self.type_names
            .lock()
            .unwrap()
            .push(context.type_name().to_string());
        let mut byte = [0u8; 1];
        stream.read_exact(&mut byte)?;
        Ok(Value::Object(
            ObjectValue::new("Version")
                .with("major", byte[0] >> 4)
                .with("minor", byte[0] & 0x0f),
        ))
    }
}

#[test]
fn test_type_codec() {
    let codec = PackedVersion::default();
    let table = DescriptorTable::new()
        .with(
            TypeDescriptorBuilder::new("Version")
                .field("major", 0, PrimitiveKind::U8)
                .field("minor", 1, PrimitiveKind::U8)
                .codec(codec.clone())
                .build(),
        )
        .with(
            TypeDescriptorBuilder::new("Release")
                .field("version", 0, TypeRef::named("Version"))
                .field("build", 1, PrimitiveKind::U16)
                .build(),
        );
    let serializer = BinarySerializer::new(table);
    let value = Value::Object(
        ObjectValue::new("Release")
            .with(
                "version",
                ObjectValue::new("Version").with("major", 1u8).with("minor", 2u8),
            )
            .with("build", 7u16),
    );

    let bytes = serializer.to_bytes(&value).unwrap();
    assert_eq!(bytes, [0x12, 7, 0]);
    assert_eq!(serializer.from_bytes("Release", &bytes).unwrap(), value);
    assert_eq!(*codec.type_names.lock().unwrap(), ["Version", "Version"]);
}

/// Writes a `u32` in the byte order it is handed.
struct Ordered;

impl BinarySerializable for Ordered {
    fn serialize(
        &self,
        value: &Value,
        stream: &mut dyn Write,
        endianness: Endianness,
        _context: &SerializationContext<'_>,
    ) -> binlayout::Result<()> {
        let v = value.as_u64().unwrap_or(0) as u32;
        let bytes = match endianness {
            Endianness::Little => v.to_le_bytes(),
            Endianness::Big => v.to_be_bytes(),
        };
        stream.write_all(&bytes)?;
        Ok(())
    }

    fn deserialize(
        &self,
        stream: &mut dyn Read,
        endianness: Endianness,
        _context: &SerializationContext<'_>,
    ) -> binlayout::Result<Value> {
        let mut bytes = [0u8; 4];
        stream.read_exact(&mut bytes)?;
        Ok(Value::U32(match endianness {
            Endianness::Little => u32::from_le_bytes(bytes),
            Endianness::Big => u32::from_be_bytes(bytes),
        }))
    }
}

#[test]
fn test_codec_receives_effective_endianness_and_bounds() {
    let table = DescriptorTable::new().with(
        TypeDescriptorBuilder::new("Wrapped")
            .field("len", 0, PrimitiveKind::U8)
            .member(
                MemberDescriptor::new("value", PrimitiveKind::U32)
                    .with_order(1)
                    .with_endianness(Endianness::Big)
                    .with_length(BindingSource::sibling("len"))
                    .with_codec(Ordered),
            )
            .field("end", 2, PrimitiveKind::U8)
            .build(),
    );
    let serializer = BinarySerializer::new(table);
    let value = Value::Object(
        ObjectValue::new("Wrapped")
            .with("len", 4u8)
            .with("value", 0x01020304u32)
            .with("end", 0xaau8),
    );

    let bytes = serializer.to_bytes(&value).unwrap();
    assert_eq!(bytes, [4, 1, 2, 3, 4, 0xaa]);
    assert_eq!(serializer.from_bytes("Wrapped", &bytes).unwrap(), value);

    // A codec cannot read past its bound.
    let err = serializer.from_bytes("Wrapped", &[2, 1, 2, 3, 4]).unwrap_err();
    assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
}
