use serde::{de, ser};
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Standard XML-RPC fault codes.
///
/// See <http://xmlrpc-epi.sourceforge.net/specs/rfc.fault_codes.php>.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum FaultCode {
    NotWellFormed = -32700,
    UnsupportedEncoding = -32701,
    InvalidCharacterForEncoding = -32702,
    InvalidXmlRpc = -32600,
    RequestedMethodNotFound = -32601,
    InvalidMethodParameters = -32602,
    InternalXmlRpcError = -32603,
    ApplicationError = -32500,
    SystemError = -32400,
    TransportError = -32300,
}

impl FaultCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<FaultCode> for i32 {
    fn from(code: FaultCode) -> i32 {
        code.code()
    }
}

/// Errors that can occur while decoding a call, invoking a method, or
/// encoding a response.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed XML at the lexical level
    #[error("parse error, not well formed: {0}")]
    NotWellFormed(String),

    /// The XML declaration names an encoding other than UTF-8
    #[error("parse error, unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Input bytes are not valid for the document encoding
    #[error("parse error, invalid character for encoding: {0}")]
    InvalidCharacterForEncoding(String),

    /// Well-formed XML that does not follow the XML-RPC grammar
    #[error("invalid xml-rpc: {0}")]
    InvalidXmlRpc(String),

    /// `<methodName>` did not resolve against the registry
    #[error("requested method not found: {0}")]
    MethodNotFound(String),

    /// Arity or parameter type mismatch
    #[error("invalid method parameters: {0}")]
    InvalidParams(String),

    /// An engine invariant was violated while binding or invoking
    #[error("internal xml-rpc error: {0}")]
    Internal(String),

    /// The input stream ended or failed mid-document
    #[error("transport error: {0}")]
    Transport(String),

    /// A fault raised explicitly by a handler, passed to the client verbatim
    #[error("{message}")]
    Fault { code: i32, message: String },

    /// XML-RPC has no wire representation for this native type
    #[error("XML-RPC does not support type: {0}")]
    Unsupported(&'static str),

    /// A method or record schema was declared inconsistently
    #[error("invalid registration: {0}")]
    Registration(String),

    /// A custom error message from serde
    #[error("{0}")]
    Message(String),

    /// An I/O error occurred while writing output
    #[error("I/O error: {0}")]
    Io(String),

    /// A handler failed with an error that carries no fault code
    #[error("handler failed: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// An explicit fault with an arbitrary code, reported to the client as-is.
    pub fn fault(code: i32, message: impl Into<String>) -> Self {
        Error::Fault {
            code,
            message: message.into(),
        }
    }

    pub fn application(message: impl Into<String>) -> Self {
        Error::fault(FaultCode::ApplicationError.code(), message)
    }

    pub fn system(message: impl Into<String>) -> Self {
        Error::fault(FaultCode::SystemError.code(), message)
    }

    pub fn handler<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Handler(Box::new(error))
    }

    /// The wire fault code for this error, if it is a protocol-level failure.
    ///
    /// Serde messages, unsupported types and handler errors return `None`:
    /// their text describes internals and must not reach the client.
    pub fn fault_code(&self) -> Option<i32> {
        let code = match self {
            Error::NotWellFormed(_) => FaultCode::NotWellFormed,
            Error::UnsupportedEncoding(_) => FaultCode::UnsupportedEncoding,
            Error::InvalidCharacterForEncoding(_) => FaultCode::InvalidCharacterForEncoding,
            Error::InvalidXmlRpc(_) => FaultCode::InvalidXmlRpc,
            Error::MethodNotFound(_) => FaultCode::RequestedMethodNotFound,
            Error::InvalidParams(_) => FaultCode::InvalidMethodParameters,
            Error::Internal(_) => FaultCode::InternalXmlRpcError,
            Error::Transport(_) | Error::Io(_) => FaultCode::TransportError,
            Error::Fault { code, .. } => return Some(*code),
            Error::Unsupported(_)
            | Error::Registration(_)
            | Error::Message(_)
            | Error::Handler(_) => return None,
        };
        Some(code.code())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        match e {
            quick_xml::Error::Io(io) => Error::Transport(io.to_string()),
            other => Error::NotWellFormed(other.to_string()),
        }
    }
}

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}
