//! Native → [`Value`] serializer.
//!
//! This is where the encoder's type dispatch lives. Every serde data-model
//! type either maps onto one XML-RPC kind or fails with
//! [`Error::Unsupported`]; nothing is narrowed silently.
//!
//! ## Mapping summary
//! - `bool` → `boolean`
//! - `i8`, `i16`, `i32` → `i4`
//! - `f32`, `f64` → `double` (finite values only)
//! - `char`, `&str`, `String` → `string`
//! - bytes (`serde_bytes`) → `base64`
//! - seq / tuple → `array` (`None` elements are dropped)
//! - struct / map → `struct` (`None` members are omitted)
//! - `None`, `()` → no value
//! - unit enum variant → `string` holding the variant name
//! - newtype / tuple / struct variant → single-member `struct` keyed by the variant name
//! - `u8`..`u64`, `i64`, `i128`, `u128` → error

use crate::error::{Error, Result};
use crate::iso8601::{self, DATETIME_TOKEN};
use crate::value::{Struct, Value};
use serde::ser::{self, Serialize};

// ── Public entry points ────────────────────────────────────────────────────

/// Convert `value` into an XML-RPC [`Value`]. `Ok(None)` means the value is
/// null and encodes to no elements at all.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Option<Value>> {
    value.serialize(Serializer)
}

// ── Serializer ─────────────────────────────────────────────────────────────

/// The value serializer. Stateless; compound types collect into their own
/// builders.
///
/// ```rust
/// use serde::Serialize;
/// use xmlrpc_serde::{Value, ser::Serializer};
///
/// assert_eq!(42i32.serialize(Serializer).unwrap(), Some(Value::Int(42)));
/// assert!(42u32.serialize(Serializer).is_err());
/// ```
pub struct Serializer;

impl ser::Serializer for Serializer {
    type Ok = Option<Value>;
    type Error = Error;

    type SerializeSeq = SerializeArray;
    type SerializeTuple = SerializeArray;
    type SerializeTupleStruct = SerializeArray;
    type SerializeTupleVariant = SerializeVariant<SerializeArray>;
    type SerializeMap = SerializeStruct;
    type SerializeStruct = SerializeStruct;
    type SerializeStructVariant = SerializeVariant<SerializeStruct>;

    // ── Primitives ─────────────────────────────────────────────────────────

    fn serialize_bool(self, v: bool) -> Result<Option<Value>> {
        Ok(Some(Value::Boolean(v)))
    }

    fn serialize_i8(self, v: i8) -> Result<Option<Value>> {
        Ok(Some(Value::Int(v.into())))
    }
    fn serialize_i16(self, v: i16) -> Result<Option<Value>> {
        Ok(Some(Value::Int(v.into())))
    }
    /// XML-RPC `i4`, the only integer width on the wire
    fn serialize_i32(self, v: i32) -> Result<Option<Value>> {
        Ok(Some(Value::Int(v)))
    }
    fn serialize_i64(self, _v: i64) -> Result<Option<Value>> {
        Err(Error::Unsupported("i64 (use a 32-bit signed integer)"))
    }
    fn serialize_i128(self, _v: i128) -> Result<Option<Value>> {
        Err(Error::Unsupported("i128 (use a 32-bit signed integer)"))
    }

    fn serialize_u8(self, _v: u8) -> Result<Option<Value>> {
        Err(Error::Unsupported("u8 (use i8, or serde_bytes for binary data)"))
    }
    fn serialize_u16(self, _v: u16) -> Result<Option<Value>> {
        Err(Error::Unsupported("u16 (use i16 instead)"))
    }
    fn serialize_u32(self, _v: u32) -> Result<Option<Value>> {
        Err(Error::Unsupported("u32 (use a 32-bit signed integer)"))
    }
    fn serialize_u64(self, _v: u64) -> Result<Option<Value>> {
        Err(Error::Unsupported("u64 (use a 32-bit signed integer)"))
    }
    fn serialize_u128(self, _v: u128) -> Result<Option<Value>> {
        Err(Error::Unsupported("u128 (use a 32-bit signed integer)"))
    }

    fn serialize_f32(self, v: f32) -> Result<Option<Value>> {
        self.serialize_f64(v.into())
    }
    fn serialize_f64(self, v: f64) -> Result<Option<Value>> {
        if !v.is_finite() {
            return Err(Error::Unsupported("non-finite double"));
        }
        Ok(Some(Value::Double(v)))
    }

    fn serialize_char(self, v: char) -> Result<Option<Value>> {
        Ok(Some(Value::String(v.to_string())))
    }

    fn serialize_str(self, v: &str) -> Result<Option<Value>> {
        Ok(Some(Value::String(v.to_owned())))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Option<Value>> {
        Ok(Some(Value::Base64(v.to_vec())))
    }

    fn serialize_none(self) -> Result<Option<Value>> {
        Ok(None)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Option<Value>> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Option<Value>> {
        Ok(None)
    }
    fn serialize_unit_struct(self, _name: &'static str) -> Result<Option<Value>> {
        Ok(None)
    }

    /// Unit enum variant → its name as a string
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Option<Value>> {
        Ok(Some(Value::String(variant.to_owned())))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Option<Value>> {
        if name == DATETIME_TOKEN {
            // `iso8601::serialize` wraps the formatted text; turn it back
            // into a typed date-time.
            match value.serialize(self)? {
                Some(Value::String(text)) => iso8601::parse(&text)
                    .map(|dt| Some(Value::DateTime(dt)))
                    .ok_or_else(|| Error::Message(format!("invalid date-time '{}'", text))),
                _ => Err(Error::Message("date-time must serialize as text".into())),
            }
        } else {
            value.serialize(self)
        }
    }

    /// Newtype variant → `{ variant: value }`
    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Option<Value>> {
        let mut members = Struct::new();
        if let Some(inner) = to_value(value)? {
            members.insert(variant, inner);
        }
        Ok(Some(Value::Struct(members)))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(SerializeArray {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }
    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    /// Tuple variant → `{ variant: [fields] }`
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Ok(SerializeVariant {
            variant,
            inner: SerializeArray {
                items: Vec::with_capacity(len),
            },
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(SerializeStruct::default())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(SerializeStruct::default())
    }

    /// Struct variant → `{ variant: { fields } }`
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Ok(SerializeVariant {
            variant,
            inner: SerializeStruct::default(),
        })
    }
}

// ── Compound serializer impls ──────────────────────────────────────────────

pub struct SerializeArray {
    items: Vec<Value>,
}

impl SerializeArray {
    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        if let Some(item) = to_value(value)? {
            self.items.push(item);
        }
        Ok(())
    }

    fn finish(self) -> Value {
        Value::Array(self.items)
    }
}

macro_rules! forward_serialize_element {
    ($t:path, $method:ident) => {
        impl $t for SerializeArray {
            type Ok = Option<Value>;
            type Error = Error;
            fn $method<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
                self.push(value)
            }
            fn end(self) -> Result<Option<Value>> {
                Ok(Some(self.finish()))
            }
        }
    };
}

forward_serialize_element!(ser::SerializeSeq, serialize_element);
forward_serialize_element!(ser::SerializeTuple, serialize_element);
forward_serialize_element!(ser::SerializeTupleStruct, serialize_field);

#[derive(Default)]
pub struct SerializeStruct {
    members: Struct,
    next_key: Option<String>,
}

impl SerializeStruct {
    fn set<T: Serialize + ?Sized>(&mut self, name: String, value: &T) -> Result<()> {
        // A null member is left out of the struct entirely.
        if let Some(member) = to_value(value)? {
            self.members.insert(name, member);
        }
        Ok(())
    }

    fn finish(self) -> Value {
        Value::Struct(self.members)
    }
}

impl ser::SerializeMap for SerializeStruct {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<()> {
        let name = match to_value(key)? {
            Some(Value::String(name)) => name,
            Some(Value::Int(i)) => i.to_string(),
            _ => return Err(Error::Message("struct member names must be strings".into())),
        };
        self.next_key = Some(name);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let name = self
            .next_key
            .take()
            .ok_or_else(|| Error::Message("serialize_value called before serialize_key".into()))?;
        self.set(name, value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(Some(self.finish()))
    }
}

impl ser::SerializeStruct for SerializeStruct {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.set(key.to_owned(), value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(Some(self.finish()))
    }
}

/// Wraps an enum variant's payload in a single-member struct.
pub struct SerializeVariant<S> {
    variant: &'static str,
    inner: S,
}

impl<S> SerializeVariant<S> {
    fn wrap(variant: &'static str, payload: Value) -> Option<Value> {
        let mut members = Struct::new();
        members.insert(variant, payload);
        Some(Value::Struct(members))
    }
}

impl ser::SerializeTupleVariant for SerializeVariant<SerializeArray> {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.inner.push(value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(Self::wrap(self.variant, self.inner.finish()))
    }
}

impl ser::SerializeStructVariant for SerializeVariant<SerializeStruct> {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.inner.set(key.to_owned(), value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(Self::wrap(self.variant, self.inner.finish()))
    }
}
