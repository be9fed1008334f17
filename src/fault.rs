//! Mapping errors onto XML-RPC faults.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;

use crate::config::CodecConfig;
use crate::error::Error;
use crate::schema::{RecordDescriptor, TypeDescriptor, XmlRpcType};

/// A `<fault>` payload: the struct holding `faultCode` and `faultString`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    #[serde(rename = "faultCode")]
    pub code: i32,
    #[serde(rename = "faultString")]
    pub message: String,
}

impl Fault {
    pub fn new(code: impl Into<i32>, message: impl Into<String>) -> Self {
        Fault {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fault {}: {}", self.code, self.message)
    }
}

impl XmlRpcType for Fault {
    fn descriptor() -> TypeDescriptor {
        RecordDescriptor::new("Fault")
            .field::<i32>("code")
            .rename("faultCode")
            .field::<String>("message")
            .rename("faultString")
            .into()
    }
}

impl From<Fault> for Error {
    fn from(fault: Fault) -> Self {
        Error::Fault {
            code: fault.code,
            message: fault.message,
        }
    }
}

/// Pick the fault reported for `error`.
///
/// The error and its `source()` chain are searched, outermost first, for a
/// crate [`Error`] carrying a fault code; that error's message becomes the
/// fault string. Anything else is reported with the configured fallback so
/// internal details stay on the server.
pub fn translate(error: &(dyn StdError + 'static), config: &CodecConfig) -> Fault {
    let mut cause = Some(error);
    while let Some(current) = cause {
        if let Some(e) = current.downcast_ref::<Error>() {
            if let Some(code) = e.fault_code() {
                return Fault::new(code, e.to_string());
            }
        }
        cause = current.source();
    }
    Fault::new(
        config.fallback_fault_code,
        config.fallback_fault_string.clone(),
    )
}
