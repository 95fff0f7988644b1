//! Canonical JSON serialization for deterministic signing and hashing.
//!
//! Identical logical JSON content must always produce identical bytes, whatever
//! the key insertion order. Payloads signed into a statement go through
//! [`canonicalize`]; the offline receipt digest reuses the same writer with
//! spaced separators.
//!
//! ## Canonicalization Rules
//! 1. Object keys sorted by their UTF-8 bytes, recursively
//! 2. Array order preserved
//! 3. No insignificant whitespace (`,` and `:` separators)
//! 4. Strings emitted ASCII-only, everything outside `' '..='~'` as `\uXXXX`
//! 5. Integers written digit for digit, whatever their magnitude; other
//!    numbers written as serde_json formats an `f64`
//! 6. NaN and infinities rejected, they have no JSON representation
//!
//! NOTE: this is a minimal approximation of RFC 8785 (JCS), not an
//! implementation of it. Number normalization in particular is not attempted.
//! Swapping in a stricter algorithm changes the signed bytes and breaks
//! compatibility with statements already issued.

use crate::error::EncodingError;
use serde::ser::{self, Serialize};
use serde_json::{Number, Value};

/// Bytes produced by [`canonicalize`]. The inner buffer is private, so every
/// value of this type went through the canonical writer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Separator style for the sorted-key writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separators {
    /// `,` and `:`; used for signed payloads.
    Compact,
    /// `, ` and `: `; used for the offline receipt digest.
    Spaced,
}

impl Separators {
    fn item(self) -> &'static [u8] {
        match self {
            Separators::Compact => b",",
            Separators::Spaced => b", ",
        }
    }

    fn key(self) -> &'static [u8] {
        match self {
            Separators::Compact => b":",
            Separators::Spaced => b": ",
        }
    }
}

/// Serialize any value to canonical bytes.
///
/// Fails with [`EncodingError::Json`] when the value cannot be represented as
/// JSON (for example a map with non-string keys, or a NaN float).
pub fn canonicalize<T: Serialize + ?Sized>(value: &T) -> Result<CanonicalBytes, EncodingError> {
    // serde_json maps non-finite floats to `null` without complaint.
    value.serialize(FiniteCheck)?;
    let value = serde_json::to_value(value)?;
    Ok(CanonicalBytes(to_sorted_json(&value, Separators::Compact)))
}

/// Write a JSON value with recursively sorted keys.
pub fn to_sorted_json(value: &Value, separators: Separators) -> Vec<u8> {
    let mut out = Vec::new();
    write_value(value, separators, &mut out);
    out
}

fn write_value(value: &Value, separators: Separators, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => write_number(n, out),
        Value::String(s) => write_json_string(s, out),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.extend_from_slice(separators.item());
                }
                write_value(item, separators, out);
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

            out.push(b'{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.extend_from_slice(separators.item());
                }
                write_json_string(key, out);
                out.extend_from_slice(separators.key());
                write_value(item, separators, out);
            }
            out.push(b'}');
        }
    }
}

fn write_number(n: &Number, out: &mut Vec<u8>) {
    let text = n.to_string();
    if !text.contains(&['.', 'e', 'E'][..]) {
        out.extend_from_slice(text.as_bytes());
        return;
    }
    match n.as_f64().and_then(Number::from_f64) {
        Some(float) => out.extend_from_slice(float.to_string().as_bytes()),
        None => out.extend_from_slice(text.as_bytes()),
    }
}

/// Write a JSON string literal using ASCII-only escaping.
pub fn write_json_string(s: &str, out: &mut Vec<u8>) {
    out.push(b'"');
    for ch in s.chars() {
        match ch {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            '\u{08}' => out.extend_from_slice(b"\\b"),
            '\u{0c}' => out.extend_from_slice(b"\\f"),
            ' '..='~' => out.push(ch as u8),
            _ => {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    out.extend_from_slice(format!("\\u{unit:04x}").as_bytes());
                }
            }
        }
    }
    out.push(b'"');
}

fn non_finite(value: f64) -> serde_json::Error {
    ser::Error::custom(format!("non-finite float {value} has no JSON representation"))
}

/// Serializer that only walks a value, failing on NaN or infinite floats.
struct FiniteCheck;

type Check = std::result::Result<(), serde_json::Error>;

impl ser::Serializer for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, _v: bool) -> Check {
        Ok(())
    }

    fn serialize_i8(self, _v: i8) -> Check {
        Ok(())
    }

    fn serialize_i16(self, _v: i16) -> Check {
        Ok(())
    }

    fn serialize_i32(self, _v: i32) -> Check {
        Ok(())
    }

    fn serialize_i64(self, _v: i64) -> Check {
        Ok(())
    }

    fn serialize_i128(self, _v: i128) -> Check {
        Ok(())
    }

    fn serialize_u8(self, _v: u8) -> Check {
        Ok(())
    }

    fn serialize_u16(self, _v: u16) -> Check {
        Ok(())
    }

    fn serialize_u32(self, _v: u32) -> Check {
        Ok(())
    }

    fn serialize_u64(self, _v: u64) -> Check {
        Ok(())
    }

    fn serialize_u128(self, _v: u128) -> Check {
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Check {
        if v.is_finite() {
            Ok(())
        } else {
            Err(non_finite(f64::from(v)))
        }
    }

    fn serialize_f64(self, v: f64) -> Check {
        if v.is_finite() {
            Ok(())
        } else {
            Err(non_finite(v))
        }
    }

    fn serialize_char(self, _v: char) -> Check {
        Ok(())
    }

    fn serialize_str(self, _v: &str) -> Check {
        Ok(())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Check {
        Ok(())
    }

    fn serialize_none(self) -> Check {
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Check {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Check {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Check {
        Ok(())
    }

    fn serialize_unit_variant(self, _name: &'static str, _index: u32, _variant: &'static str) -> Check {
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(self, _name: &'static str, value: &T) -> Check {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Check {
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> std::result::Result<Self, serde_json::Error> {
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> std::result::Result<Self, serde_json::Error> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> std::result::Result<Self, serde_json::Error> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self, serde_json::Error> {
        Ok(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> std::result::Result<Self, serde_json::Error> {
        Ok(self)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> std::result::Result<Self, serde_json::Error> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self, serde_json::Error> {
        Ok(self)
    }
}

impl ser::SerializeSeq for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Check {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Check {
        Ok(())
    }
}

impl ser::SerializeTuple for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Check {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Check {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Check {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Check {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Check {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Check {
        Ok(())
    }
}

impl ser::SerializeMap for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Check {
        key.serialize(FiniteCheck)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Check {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Check {
        Ok(())
    }
}

impl ser::SerializeStruct for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _key: &'static str, value: &T) -> Check {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Check {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _key: &'static str, value: &T) -> Check {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Check {
        Ok(())
    }
}
