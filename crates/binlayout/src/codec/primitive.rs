// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive wire encoding.
//!
//! Fixed-width scalars in either byte order, strings in three delimiting
//! styles, raw bytes. Strings and bytes written inside a length-bound region
//! carry no delimiter of their own (except length-prefixed strings).

use super::stream::BinaryReader;
use crate::descriptor::{Endianness, PrimitiveKind, StringEncoding};
use crate::error::{Error, Result};
use crate::value::{FromValue, Value};

/// Generate a writer for a fixed-width scalar.
///
/// The generated function appends `value` to `out` in the requested order.
macro_rules! impl_write {
    ($name:ident, $type:ty) => {
        fn $name(out: &mut Vec<u8>, value: $type, endianness: Endianness) {
            match endianness {
                Endianness::Little => out.extend_from_slice(&value.to_le_bytes()),
                Endianness::Big => out.extend_from_slice(&value.to_be_bytes()),
            }
        }
    };
}

/// Generate a reader for a fixed-width scalar.
macro_rules! impl_read {
    ($name:ident, $type:ty, $size:expr) => {
        fn $name(reader: &mut BinaryReader<'_>, endianness: Endianness) -> Result<$type> {
            let bytes = reader.read_array::<$size>()?;
            Ok(match endianness {
                Endianness::Little => <$type>::from_le_bytes(bytes),
                Endianness::Big => <$type>::from_be_bytes(bytes),
            })
        }
    };
}

impl_write!(write_u16, u16);
impl_write!(write_u32, u32);
impl_write!(write_u64, u64);
impl_write!(write_i16, i16);
impl_write!(write_i32, i32);
impl_write!(write_i64, i64);
impl_write!(write_f32, f32);
impl_write!(write_f64, f64);

impl_read!(read_u16, u16, 2);
impl_read!(read_u32, u32, 4);
impl_read!(read_u64, u64, 8);
impl_read!(read_i16, i16, 2);
impl_read!(read_i32, i32, 4);
impl_read!(read_i64, i64, 8);
impl_read!(read_f32, f32, 4);
impl_read!(read_f64, f64, 8);

/// Longest 7-bit encoding of a `u64`.
const MAX_VARINT_LEN: usize = 10;

/// Integer of `kind` holding `v`, if it fits.
pub(crate) fn integer(kind: PrimitiveKind, v: i128) -> Option<Value> {
    Some(match kind {
        PrimitiveKind::U8 => Value::U8(u8::try_from(v).ok()?),
        PrimitiveKind::U16 => Value::U16(u16::try_from(v).ok()?),
        PrimitiveKind::U32 => Value::U32(u32::try_from(v).ok()?),
        PrimitiveKind::U64 => Value::U64(u64::try_from(v).ok()?),
        PrimitiveKind::I8 => Value::I8(i8::try_from(v).ok()?),
        PrimitiveKind::I16 => Value::I16(i16::try_from(v).ok()?),
        PrimitiveKind::I32 => Value::I32(i32::try_from(v).ok()?),
        PrimitiveKind::I64 => Value::I64(i64::try_from(v).ok()?),
        _ => return None,
    })
}

/// Convert `value` to `kind`, if representable without loss of meaning.
pub(crate) fn coerce(value: &Value, kind: PrimitiveKind) -> Option<Value> {
    match kind {
        PrimitiveKind::Bool => match value {
            Value::Bool(b) => Some(Value::Bool(*b)),
            other => match other.as_i128()? {
                0 => Some(Value::Bool(false)),
                1 => Some(Value::Bool(true)),
                _ => None,
            },
        },
        PrimitiveKind::F32 => float(value).map(|v| Value::F32(v as f32)),
        PrimitiveKind::F64 => float(value).map(Value::F64),
        PrimitiveKind::String(_) => value.as_str().map(|s| Value::String(s.to_string())),
        PrimitiveKind::Bytes => value.as_bytes().map(|b| Value::Bytes(b.to_vec())),
        _ => match value {
            Value::Bool(_) => None,
            other => integer(kind, other.as_i128()?),
        },
    }
}

fn float(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(_) => None,
        other => other.as_f64(),
    }
}

fn mismatch(member: &str, kind: PrimitiveKind, value: &Value) -> Error {
    match value.as_i128() {
        Some(v) if kind.is_integer() && value.is_integer() => {
            Error::value(member, format!("{v} does not fit in {}", kind.name()))
        }
        _ => Error::value(
            member,
            format!("expected {}, found {}", kind.name(), value.kind_name()),
        ),
    }
}

/// Append the wire form of `value` as `kind`.
///
/// `bounded` is set when a length binding delimits the member.
pub(crate) fn encode(
    out: &mut Vec<u8>,
    kind: PrimitiveKind,
    value: &Value,
    endianness: Endianness,
    bounded: bool,
    member: &str,
) -> Result<()> {
    let bad = || mismatch(member, kind, value);
    match kind {
        PrimitiveKind::Bool => {
            let b = match coerce(value, kind) {
                Some(Value::Bool(b)) => b,
                _ => return Err(bad()),
            };
            out.push(u8::from(b));
        }
        PrimitiveKind::U8 => out.push(u8::from_value(value).ok_or_else(bad)?),
        PrimitiveKind::I8 => out.extend_from_slice(&i8::from_value(value).ok_or_else(bad)?.to_le_bytes()),
        PrimitiveKind::U16 => write_u16(out, u16::from_value(value).ok_or_else(bad)?, endianness),
        PrimitiveKind::U32 => write_u32(out, u32::from_value(value).ok_or_else(bad)?, endianness),
        PrimitiveKind::U64 => write_u64(out, u64::from_value(value).ok_or_else(bad)?, endianness),
        PrimitiveKind::I16 => write_i16(out, i16::from_value(value).ok_or_else(bad)?, endianness),
        PrimitiveKind::I32 => write_i32(out, i32::from_value(value).ok_or_else(bad)?, endianness),
        PrimitiveKind::I64 => write_i64(out, i64::from_value(value).ok_or_else(bad)?, endianness),
        PrimitiveKind::F32 => write_f32(out, float(value).ok_or_else(bad)? as f32, endianness),
        PrimitiveKind::F64 => write_f64(out, float(value).ok_or_else(bad)?, endianness),
        PrimitiveKind::String(encoding) => {
            let s = value.as_str().ok_or_else(bad)?;
            write_string(out, s, encoding, bounded, member)?;
        }
        PrimitiveKind::Bytes => out.extend_from_slice(value.as_bytes().ok_or_else(bad)?),
    }
    Ok(())
}

/// Read one value of `kind`.
pub(crate) fn decode(
    reader: &mut BinaryReader<'_>,
    kind: PrimitiveKind,
    endianness: Endianness,
    bounded: bool,
    member: &str,
) -> Result<Value> {
    Ok(match kind {
        PrimitiveKind::Bool => Value::Bool(reader.read_u8()? != 0),
        PrimitiveKind::U8 => Value::U8(reader.read_u8()?),
        PrimitiveKind::I8 => Value::I8(i8::from_le_bytes(reader.read_array::<1>()?)),
        PrimitiveKind::U16 => Value::U16(read_u16(reader, endianness)?),
        PrimitiveKind::U32 => Value::U32(read_u32(reader, endianness)?),
        PrimitiveKind::U64 => Value::U64(read_u64(reader, endianness)?),
        PrimitiveKind::I16 => Value::I16(read_i16(reader, endianness)?),
        PrimitiveKind::I32 => Value::I32(read_i32(reader, endianness)?),
        PrimitiveKind::I64 => Value::I64(read_i64(reader, endianness)?),
        PrimitiveKind::F32 => Value::F32(read_f32(reader, endianness)?),
        PrimitiveKind::F64 => Value::F64(read_f64(reader, endianness)?),
        PrimitiveKind::String(encoding) => {
            Value::String(read_string(reader, encoding, bounded, member)?)
        }
        PrimitiveKind::Bytes => Value::Bytes(reader.read_to_end()?),
    })
}

fn write_string(
    out: &mut Vec<u8>,
    s: &str,
    encoding: StringEncoding,
    bounded: bool,
    member: &str,
) -> Result<()> {
    let bytes = s.as_bytes();
    match (encoding, bounded) {
        (StringEncoding::LengthPrefixed, _) => {
            write_varint(out, bytes.len() as u64);
            out.extend_from_slice(bytes);
        }
        (StringEncoding::NullTerminated, _) if bytes.contains(&0) => {
            return Err(Error::value(member, "null-terminated string contains a NUL byte"));
        }
        (StringEncoding::NullTerminated, false) => {
            out.extend_from_slice(bytes);
            out.push(0);
        }
        _ => out.extend_from_slice(bytes),
    }
    Ok(())
}

fn read_string(
    reader: &mut BinaryReader<'_>,
    encoding: StringEncoding,
    bounded: bool,
    member: &str,
) -> Result<String> {
    let bytes = match (encoding, bounded) {
        (StringEncoding::LengthPrefixed, _) => {
            let len = read_varint(reader, member)?;
            reader.read_vec(len)?
        }
        (StringEncoding::NullTerminated, false) => reader.read_until_nul()?,
        (StringEncoding::NullTerminated, true) => {
            // Ends at the region end or the first padding byte.
            let mut bytes = reader.read_to_end()?;
            if let Some(nul) = bytes.iter().position(|&b| b == 0) {
                bytes.truncate(nul);
            }
            bytes
        }
        // The region is the string, padding included.
        (StringEncoding::Sized, _) => reader.read_to_end()?,
    };
    String::from_utf8(bytes).map_err(|e| Error::value(member, format!("invalid UTF-8: {e}")))
}

/// 7-bit variable-length integer, low groups first.
pub(crate) fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

pub(crate) fn read_varint(reader: &mut BinaryReader<'_>, member: &str) -> Result<u64> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN {
        let byte = reader.read_u8()?;
        let group = u64::from(byte & 0x7f);
        let shift = 7 * i as u32;
        if shift == 63 && group > 1 {
            break;
        }
        value |= group << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(Error::value(member, "length prefix overflows u64"))
}
