//! Serde helper module for XML-RPC `dateTime.iso8601` values.
//!
//! `chrono::NaiveDateTime` serializes itself as a plain string, which would
//! travel as `<string>`. Annotate the field with
//! `#[serde(with = "xmlrpc_serde::iso8601")]` (or wrap it in [`Iso8601`]) to
//! have it written as `<dateTime.iso8601>` instead:
//!
//! ```rust
//! use chrono::NaiveDateTime;
//! use serde::{Deserialize, Serialize};
//! use xmlrpc_serde::{Value, to_value};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Post {
//!     title: String,
//!     #[serde(with = "xmlrpc_serde::iso8601")]
//!     published: NaiveDateTime,
//! }
//!
//! let published = NaiveDateTime::parse_from_str("2017-05-31T05:06:00", "%Y-%m-%dT%H:%M:%S").unwrap();
//! let value = to_value(&Post { title: "hello".into(), published }).unwrap().unwrap();
//! let member = value.as_struct().unwrap().get("published").unwrap();
//! assert_eq!(member, &Value::DateTime(published));
//! ```
//!
//! Date-times carry no offset on the wire; they are treated as naive UTC.
//!
//! # Accepted input forms
//!
//! | Form | Example |
//! |------|---------|
//! | compact date, extended time | `20170531T05:06:00` |
//! | fully compact | `20170531T050600` |
//! | extended | `2017-05-31T05:06:00` |
//!
//! Output is always the extended form.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value::ISO8601_EXTENDED;

/// Newtype name our `Value` serializer recognises as a date-time.
pub(crate) const DATETIME_TOKEN: &str = "$xmlrpc_serde::DateTime";

const INPUT_FORMATS: &[&str] = &["%Y%m%dT%H:%M:%S", "%Y%m%dT%H%M%S", ISO8601_EXTENDED];

/// Parse any of the accepted wire forms.
pub fn parse(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

/// Render in the extended form, without fractional seconds or offset.
pub fn format(value: &NaiveDateTime) -> String {
    value.format(ISO8601_EXTENDED).to_string()
}

// ── serde `with` module functions ─────────────────────────────────────────

pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    // Other serializers see a newtype around the formatted string.
    serializer.serialize_newtype_struct(DATETIME_TOKEN, &format(value))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserializer.deserialize_str(DateTimeVisitor)
}

struct DateTimeVisitor;

impl<'de> serde::de::Visitor<'de> for DateTimeVisitor {
    type Value = NaiveDateTime;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an ISO-8601 date-time")
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<NaiveDateTime, E> {
        parse(v).ok_or_else(|| E::invalid_value(serde::de::Unexpected::Str(v), &self))
    }

    fn visit_newtype_struct<D: serde::Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        deserializer.deserialize_str(self)
    }
}

/// A `NaiveDateTime` that always encodes as `dateTime.iso8601`.
///
/// Useful as a method parameter or return type, where a `with` attribute
/// cannot be attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Iso8601(pub NaiveDateTime);

impl Serialize for Iso8601 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Iso8601 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize(deserializer).map(Iso8601)
    }
}

impl From<NaiveDateTime> for Iso8601 {
    fn from(value: NaiveDateTime) -> Self {
        Iso8601(value)
    }
}
