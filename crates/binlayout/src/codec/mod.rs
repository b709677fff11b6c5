// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte-level codecs.
//!
//! - [`custom`]: the [`BinarySerializable`] hook for self-serializing types
//! - `primitive`: scalar, string and byte encoding
//! - [`stream`]: [`BinaryReader`], the bounded reader used on decode

pub mod custom;
pub(crate) mod primitive;
pub mod stream;

pub use custom::{BinarySerializable, CustomCodec, SerializationContext};
pub use stream::BinaryReader;
