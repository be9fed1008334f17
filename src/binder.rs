//! In-progress construction of one composite value.
//!
//! A [`ValueContext`] is pushed when `<array>` or `<struct>` opens and is
//! consumed when it closes. The binding mode is chosen from the expected
//! type at that moment; members and elements are then added one at a time
//! as their `<value>` elements close.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::schema::{Access, RecordDescriptor, SequenceDescriptor, SequenceShape, TypeDescriptor};
use crate::value::{Struct, Value};

#[derive(Debug)]
pub(crate) enum ValueContext {
    Sequence {
        descriptor: SequenceDescriptor,
        items: Vec<Value>,
    },
    Record {
        descriptor: Arc<RecordDescriptor>,
        instance: Struct,
        pending: Option<PendingMember>,
    },
}

/// The member named by the last `<name>`, waiting for its `<value>`.
#[derive(Debug)]
pub(crate) struct PendingMember {
    wire_name: &'static str,
    ty: TypeDescriptor,
}

impl ValueContext {
    /// Bind an `<array>` to the expected type.
    pub fn sequence(expected: Option<&TypeDescriptor>) -> Result<Self> {
        match expected {
            Some(TypeDescriptor::Sequence(descriptor)) => Ok(ValueContext::Sequence {
                descriptor: descriptor.clone(),
                items: Vec::new(),
            }),
            Some(other) => Err(Error::Internal(format!(
                "an array cannot be bound to {}",
                other.name()
            ))),
            None => Err(Error::Internal("an array has no expected type".into())),
        }
    }

    /// Bind a `<struct>` to the expected type, starting from its default
    /// instance when the record declares one.
    pub fn record(expected: Option<&TypeDescriptor>) -> Result<Self> {
        let descriptor = match expected {
            Some(TypeDescriptor::Record(descriptor)) => descriptor.clone(),
            Some(TypeDescriptor::Any) | None => {
                return Err(Error::Internal(
                    "struct values must be bound to a concrete record type".into(),
                ));
            }
            Some(other) => {
                return Err(Error::Internal(format!(
                    "a struct cannot be bound to {}",
                    other.name()
                )));
            }
        };

        let instance = match descriptor.default_instance() {
            Ok(Some(Value::Struct(instance))) => instance,
            Ok(None) => Struct::new(),
            Ok(Some(other)) => {
                return Err(Error::Internal(format!(
                    "default instance of {} is a {}, not a struct",
                    descriptor.name,
                    other.kind()
                )));
            }
            Err(e) => {
                return Err(Error::Internal(format!(
                    "cannot build default instance of {}: {}",
                    descriptor.name, e
                )));
            }
        };

        Ok(ValueContext::Record {
            descriptor,
            instance,
            pending: None,
        })
    }

    /// Expected type of the next array element.
    pub fn element_type(&self) -> Result<TypeDescriptor> {
        match self {
            ValueContext::Sequence { descriptor, .. } => Ok((*descriptor.element).clone()),
            ValueContext::Record { descriptor, .. } => Err(Error::Internal(format!(
                "struct {} has no element type",
                descriptor.name
            ))),
        }
    }

    pub fn append(&mut self, value: Value) -> Result<()> {
        match self {
            ValueContext::Sequence { descriptor, items } => {
                if !value.matches(&descriptor.element) {
                    return Err(Error::InvalidParams(format!(
                        "array element {} is a {}, expected {}",
                        items.len(),
                        value.kind(),
                        descriptor.element.name()
                    )));
                }
                items.push(value);
                Ok(())
            }
            ValueContext::Record { descriptor, .. } => Err(Error::Internal(format!(
                "cannot append to struct {}",
                descriptor.name
            ))),
        }
    }

    /// Resolve a `<name>` to a settable field and remember it for the
    /// following `<value>`. Returns the field's expected type.
    pub fn resolve_member(&mut self, name: &str) -> Result<TypeDescriptor> {
        match self {
            ValueContext::Record {
                descriptor,
                pending,
                ..
            } => {
                let field = descriptor.member(name).ok_or_else(|| {
                    Error::Internal(format!(
                        "struct {} has no matching member for '{}'",
                        descriptor.name, name
                    ))
                })?;
                if field.access == Access::ReadOnly {
                    return Err(Error::Internal(format!(
                        "struct {} has no setter for member '{}'",
                        descriptor.name, name
                    )));
                }
                let ty = field.ty();
                *pending = Some(PendingMember {
                    wire_name: field.wire_name(),
                    ty: ty.clone(),
                });
                Ok(ty)
            }
            ValueContext::Sequence { .. } => {
                Err(Error::Internal(format!("an array has no member '{}'", name)))
            }
        }
    }

    /// Expected type of the pending member's value, if a name was resolved.
    pub fn pending_type(&self) -> Option<TypeDescriptor> {
        match self {
            ValueContext::Record {
                pending: Some(p), ..
            } => Some(p.ty.clone()),
            _ => None,
        }
    }

    /// Store a member value through the pending setter and clear it. An
    /// empty `<value/>` leaves the member at its default.
    pub fn set_pending(&mut self, value: Option<Value>) -> Result<()> {
        let ValueContext::Record {
            descriptor,
            instance,
            pending,
        } = self
        else {
            return Err(Error::Internal("member value outside a struct".into()));
        };

        let member = pending.take().ok_or_else(|| {
            Error::Internal(format!("no setter pending in struct {}", descriptor.name))
        })?;

        let Some(value) = value else {
            return Ok(());
        };
        if !value.matches(&member.ty) {
            return Err(Error::InvalidParams(format!(
                "member '{}' of struct {} is a {}, expected {}",
                member.wire_name,
                descriptor.name,
                value.kind(),
                member.ty.name()
            )));
        }
        instance.insert(member.wire_name, value);
        Ok(())
    }

    pub fn clear_pending(&mut self) {
        if let ValueContext::Record { pending, .. } = self {
            *pending = None;
        }
    }

    pub fn finalize(self) -> Result<Value> {
        match self {
            ValueContext::Sequence { descriptor, items } => {
                if let SequenceShape::Fixed(len) = descriptor.shape {
                    if items.len() != len {
                        return Err(Error::InvalidParams(format!(
                            "expected an array of exactly {} elements, received {}",
                            len,
                            items.len()
                        )));
                    }
                }
                Ok(Value::Array(items))
            }
            ValueContext::Record { instance, .. } => Ok(Value::Struct(instance)),
        }
    }
}
