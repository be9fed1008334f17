//! Explicit type descriptors that drive decoding.
//!
//! The decoder never inspects native types at runtime. Each parameter type
//! declares its wire shape once through [`XmlRpcType`], and record types
//! declare their member table with [`RecordDescriptor`]:
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use xmlrpc_serde::{RecordDescriptor, TypeDescriptor, XmlRpcType};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct User {
//!     #[serde(rename = "userId")]
//!     user_id: i32,
//!     name: String,
//! }
//!
//! impl XmlRpcType for User {
//!     fn descriptor() -> TypeDescriptor {
//!         RecordDescriptor::of::<User>("User")
//!             .field::<i32>("user_id")
//!             .rename("userId")
//!             .field::<String>("name")
//!             .into()
//!     }
//! }
//! ```
//!
//! Wire names in the descriptor must agree with the serde renames on the
//! type, since serde drives the conversion from decoded values.

use serde::Serialize;
use serde_bytes::ByteBuf;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::iso8601::Iso8601;
use crate::value::Value;

/// The statically expected shape of a value.
#[derive(Clone)]
pub enum TypeDescriptor {
    /// Untyped placeholder: accepts any scalar or array element, but cannot
    /// host a struct or array of its own.
    Any,
    Int,
    Boolean,
    String,
    Double,
    DateTime,
    Base64,
    Sequence(SequenceDescriptor),
    Record(Arc<RecordDescriptor>),
}

impl TypeDescriptor {
    pub fn sequence_of(element: TypeDescriptor) -> Self {
        TypeDescriptor::Sequence(SequenceDescriptor {
            element: Arc::new(element),
            shape: SequenceShape::Growable,
        })
    }

    pub fn fixed_sequence_of(element: TypeDescriptor, len: usize) -> Self {
        TypeDescriptor::Sequence(SequenceDescriptor {
            element: Arc::new(element),
            shape: SequenceShape::Fixed(len),
        })
    }

    /// Wire-ish name for error messages.
    pub fn name(&self) -> String {
        match self {
            TypeDescriptor::Any => "any".into(),
            TypeDescriptor::Int => "int".into(),
            TypeDescriptor::Boolean => "boolean".into(),
            TypeDescriptor::String => "string".into(),
            TypeDescriptor::Double => "double".into(),
            TypeDescriptor::DateTime => "dateTime.iso8601".into(),
            TypeDescriptor::Base64 => "base64".into(),
            TypeDescriptor::Sequence(seq) => match seq.shape {
                SequenceShape::Growable => format!("array of {}", seq.element.name()),
                SequenceShape::Fixed(n) => format!("array of {} {}", n, seq.element.name()),
            },
            TypeDescriptor::Record(record) => format!("struct {}", record.name),
        }
    }

    /// Check record tables reachable from this descriptor.
    pub(crate) fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        self.validate_inner(&mut seen)
    }

    fn validate_inner(&self, seen: &mut HashSet<&'static str>) -> Result<()> {
        match self {
            TypeDescriptor::Sequence(seq) => seq.element.validate_inner(seen),
            TypeDescriptor::Record(record) => {
                // Field types are built on demand, so a recursive record yields
                // a fresh table each time; visit each record name once.
                if !seen.insert(record.name) {
                    return Ok(());
                }
                record.validate()?;
                for field in &record.fields {
                    (field.ty)().validate_inner(seen)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl From<RecordDescriptor> for TypeDescriptor {
    fn from(record: RecordDescriptor) -> Self {
        TypeDescriptor::Record(Arc::new(record))
    }
}

#[derive(Clone, Debug)]
pub struct SequenceDescriptor {
    pub element: Arc<TypeDescriptor>,
    pub shape: SequenceShape,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceShape {
    /// Backed by a growable list and passed through as-is.
    Growable,
    /// Must hold exactly this many elements once the array closes.
    Fixed(usize),
}

/// Whether a record field can be bound from the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    ReadWrite,
    ReadOnly,
}

pub struct FieldDescriptor {
    pub name: &'static str,
    pub rename: Option<&'static str>,
    pub access: Access,
    ty: fn() -> TypeDescriptor,
}

impl FieldDescriptor {
    /// Explicit override first, else the field's own name.
    pub fn wire_name(&self) -> &'static str {
        self.rename.unwrap_or(self.name)
    }

    pub fn ty(&self) -> TypeDescriptor {
        (self.ty)()
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("wire_name", &self.wire_name())
            .field("access", &self.access)
            .finish()
    }
}

/// Member table of a bindable record type.
pub struct RecordDescriptor {
    pub name: &'static str,
    fields: Vec<FieldDescriptor>,
    default: Option<fn() -> Result<Option<Value>>>,
}

impl RecordDescriptor {
    /// A record with no default instance: unset members stay absent.
    pub fn new(name: &'static str) -> Self {
        RecordDescriptor {
            name,
            fields: Vec::new(),
            default: None,
        }
    }

    /// A record whose decoding starts from `T::default()`, so members the
    /// client leaves out keep their default values.
    pub fn of<T: Default + Serialize>(name: &'static str) -> Self {
        RecordDescriptor {
            name,
            fields: Vec::new(),
            default: Some(default_instance_of::<T>),
        }
    }

    pub fn field<F: XmlRpcType>(mut self, name: &'static str) -> Self {
        self.fields.push(FieldDescriptor {
            name,
            rename: None,
            access: Access::ReadWrite,
            ty: F::descriptor,
        });
        self
    }

    /// Give the most recently added field an explicit wire name.
    pub fn rename(mut self, wire_name: &'static str) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.rename = Some(wire_name);
        }
        self
    }

    /// Mark the most recently added field as having no setter.
    pub fn read_only(mut self) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.access = Access::ReadOnly;
        }
        self
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn member(&self, wire_name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.wire_name() == wire_name)
    }

    pub(crate) fn default_instance(&self) -> Result<Option<Value>> {
        match self.default {
            Some(make) => make(),
            None => Ok(None),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for field in &self.fields {
            if !names.insert(field.wire_name()) {
                return Err(Error::Registration(format!(
                    "struct {} maps member '{}' more than once",
                    self.name,
                    field.wire_name()
                )));
            }
        }
        match self.default_instance() {
            Ok(None) | Ok(Some(Value::Struct(_))) => Ok(()),
            Ok(Some(other)) => Err(Error::Registration(format!(
                "default instance of {} is a {}, not a struct",
                self.name,
                other.kind()
            ))),
            Err(e) => Err(Error::Registration(format!(
                "cannot build default instance of {}: {}",
                self.name, e
            ))),
        }
    }
}

impl fmt::Debug for RecordDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

fn default_instance_of<T: Default + Serialize>() -> Result<Option<Value>> {
    crate::ser::to_value(&T::default())
}

/// Types that declare their XML-RPC wire shape.
pub trait XmlRpcType {
    fn descriptor() -> TypeDescriptor;
}

macro_rules! scalar_descriptor {
    ($($t:ty => $kind:ident),* $(,)?) => {
        $(
            impl XmlRpcType for $t {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::$kind
                }
            }
        )*
    };
}

scalar_descriptor! {
    i8 => Int,
    i16 => Int,
    i32 => Int,
    bool => Boolean,
    String => String,
    char => String,
    f32 => Double,
    f64 => Double,
    Iso8601 => DateTime,
    ByteBuf => Base64,
    Value => Any,
}

impl<T: XmlRpcType> XmlRpcType for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence_of(T::descriptor())
    }
}

impl<T: XmlRpcType, const N: usize> XmlRpcType for [T; N] {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::fixed_sequence_of(T::descriptor(), N)
    }
}

/// Optional fields bind like their inner type; absence is expressed by
/// leaving the member out.
impl<T: XmlRpcType> XmlRpcType for Option<T> {
    fn descriptor() -> TypeDescriptor {
        T::descriptor()
    }
}
