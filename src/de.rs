//! [`Value`] → native deserializer.
//!
//! Decoded values are self-describing, so everything funnels through
//! `deserialize_any` except the few hints that need a different view of the
//! same value (date-times read as text, strings read as enums).

use crate::error::{Error, Result};
use crate::iso8601;
use crate::value::{Struct, Value};
use serde::de::{
    self, DeserializeOwned, EnumAccess, IntoDeserializer, MapAccess, SeqAccess, VariantAccess,
    Visitor,
};

/// Convert a decoded [`Value`] into a native type.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(Deserializer::new(value))
}

/// Deserializer over one owned [`Value`].
pub struct Deserializer {
    value: Value,
}

impl Deserializer {
    pub fn new(value: Value) -> Self {
        Deserializer { value }
    }
}

// ── Main Deserializer impl ─────────────────────────────────────────────────

impl<'de> de::Deserializer<'de> for Deserializer {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Int(v) => visitor.visit_i32(v),
            Value::Boolean(v) => visitor.visit_bool(v),
            Value::String(v) => visitor.visit_string(v),
            Value::Double(v) => visitor.visit_f64(v),
            Value::DateTime(v) => {
                visitor.visit_newtype_struct(iso8601::format(&v).into_deserializer())
            }
            Value::Base64(v) => visitor.visit_byte_buf(v),
            Value::Array(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            Value::Struct(members) => visitor.visit_map(MapDeserializer::new(members)),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }

    /// Date-times read as text in the extended ISO-8601 form.
    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::String(v) => visitor.visit_string(v),
            Value::DateTime(v) => visitor.visit_string(iso8601::format(&v)),
            other => Deserializer::new(other).deserialize_any(visitor),
        }
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Base64(v) => visitor.visit_byte_buf(v),
            Value::String(v) => visitor.visit_byte_buf(v.into_bytes()),
            other => Deserializer::new(other).deserialize_any(visitor),
        }
    }

    /// A value that made it this far is always present; absent members are
    /// handled by serde's missing-field defaults.
    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self.value {
            Value::String(variant) => visitor.visit_enum(variant.into_deserializer()),
            Value::Struct(members) if members.len() == 1 => {
                let (variant, value) = members
                    .into_iter()
                    .next()
                    .ok_or_else(|| Error::Message(format!("empty struct for enum {}", name)))?;
                visitor.visit_enum(EnumDeserializer { variant, value })
            }
            other => Err(Error::Message(format!(
                "expected a string or single-member struct for enum {}, found {}",
                name,
                other.kind()
            ))),
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char
        unit unit_struct seq tuple tuple_struct map struct identifier
    }
}

// ── SeqDeserializer ────────────────────────────────────────────────────────

struct SeqDeserializer {
    items: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(items: Vec<Value>) -> Self {
        SeqDeserializer {
            items: items.into_iter(),
        }
    }
}

impl<'de> SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T: de::DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>> {
        match self.items.next() {
            Some(item) => seed.deserialize(Deserializer::new(item)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

// ── MapDeserializer ────────────────────────────────────────────────────────

struct MapDeserializer {
    members: std::vec::IntoIter<(String, Value)>,
    pending: Option<Value>,
}

impl MapDeserializer {
    fn new(members: Struct) -> Self {
        MapDeserializer {
            members: members.into_iter(),
            pending: None,
        }
    }
}

impl<'de> MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K: de::DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.members.next() {
            Some((name, value)) => {
                self.pending = Some(value);
                seed.deserialize(name.into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: de::DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let value = self
            .pending
            .take()
            .ok_or_else(|| Error::Message("struct member value requested before its name".into()))?;
        seed.deserialize(Deserializer::new(value))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.members.len())
    }
}

// ── EnumDeserializer ───────────────────────────────────────────────────────

/// A `{ variant: payload }` struct read as an enum.
struct EnumDeserializer {
    variant: String,
    value: Value,
}

impl<'de> EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V: de::DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, Self::Variant)> {
        let variant =
            seed.deserialize(IntoDeserializer::<Error>::into_deserializer(self.variant))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Value,
}

impl<'de> VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Err(Error::Message(format!(
            "unit variant carries no payload, found {}",
            self.value.kind()
        )))
    }

    fn newtype_variant_seed<T: de::DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(Deserializer::new(self.value))
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Array(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            other => Err(Error::Message(format!(
                "tuple variant expects an array, found {}",
                other.kind()
            ))),
        }
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self.value {
            Value::Struct(members) => visitor.visit_map(MapDeserializer::new(members)),
            other => Err(Error::Message(format!(
                "struct variant expects a struct, found {}",
                other.kind()
            ))),
        }
    }
}
