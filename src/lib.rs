//! # xmlrpc-serde
//!
//! A streaming XML-RPC codec. Incoming `<methodCall>` documents are decoded
//! against the parameter types a method was registered with, and results
//! are encoded into `<methodResponse>` documents through `serde`.
//!
//! ## Overview
//!
//! XML-RPC carries a small, closed set of value kinds. The decoder consumes
//! XML events one at a time and resolves the method as soon as
//! `</methodName>` closes; every later `<value>` is checked against the
//! declared type of its slot, so bad input fails at the first offending
//! element rather than after the whole document has been buffered. Any
//! failure on the way through [`Handler::respond`] is answered with a
//! `<fault>` carrying one of the standard [`FaultCode`]s.
//!
//! ## Serde type mapping
//!
//! | Rust / serde type | XML-RPC encoding |
//! |-------------------|------------------|
//! | `bool`            | `<boolean>` written as `1` or `0` |
//! | `i8`, `i16`, `i32` | `<i4>` (`<int>` is accepted when decoding) |
//! | `f32`, `f64`      | `<double>`, finite values only |
//! | `char`, `&str`, `String` | `<string>` |
//! | `serde_bytes` bytes | `<base64>` |
//! | [`Iso8601`] / `#[serde(with = "iso8601")]` | `<dateTime.iso8601>` |
//! | `Vec<T>`, `[T; N]`, tuples | `<array>` |
//! | Struct, map       | `<struct>` with one `<member>` per field |
//! | `None`, `()`      | nothing: an empty `<param>`, an omitted member |
//! | Unit enum variant | `<string>` holding the variant name |
//! | Other enum variants | single-member `<struct>` keyed by the variant name |
//! | `i64`, `i128`, unsigned integers | rejected with [`Error::Unsupported`] |
//!
//! ## Example
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use xmlrpc_serde::{
//!     MethodRegistry, RecordDescriptor, TypeDescriptor, Value, XmlRpcType, decode_slice,
//! };
//!
//! #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! impl XmlRpcType for Point {
//!     fn descriptor() -> TypeDescriptor {
//!         RecordDescriptor::of::<Point>("Point")
//!             .field::<i32>("x")
//!             .field::<i32>("y")
//!             .into()
//!     }
//! }
//!
//! let mut registry = MethodRegistry::new();
//! registry
//!     .register_fn("geo.norm1", |(p,): (Point,)| Ok(p.x.abs() + p.y.abs()))
//!     .unwrap();
//!
//! let call = decode_slice(
//!     br#"<methodCall><methodName>geo.norm1</methodName><params><param><value>
//!         <struct>
//!           <member><name>x</name><value><i4>3</i4></value></member>
//!           <member><name>y</name><value><i4>-4</i4></value></member>
//!         </struct>
//!     </value></param></params></methodCall>"#,
//!     &registry,
//! )
//! .unwrap();
//!
//! let result = call.method.invoke(call.params);
//! # let result = tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(result.resolve());
//! assert_eq!(result.unwrap(), Some(Value::Int(7)));
//! ```

mod binder;
pub mod config;
pub mod de;
pub mod decode;
pub mod encode;
pub mod error;
pub mod fault;
pub mod grammar;
pub mod handler;
pub mod iso8601;
pub mod registry;
pub mod schema;
pub mod ser;
pub mod value;

pub use config::CodecConfig;
pub use de::{Deserializer, from_value};
pub use decode::{
    MethodCall, Response, decode, decode_reader, decode_response, decode_response_slice,
    decode_slice, decode_with_config,
};
pub use encode::{Encoder, to_call_bytes, to_fault_bytes, to_response_bytes, to_response_writer};
pub use error::{Error, FaultCode, Result};
pub use fault::{Fault, translate};
pub use handler::{Handler, encode_fault, invoke, invoke_and_encode, respond};
pub use iso8601::Iso8601;
pub use registry::{Invocation, MethodDescriptor, MethodRegistry, Params};
pub use schema::{
    Access, FieldDescriptor, RecordDescriptor, SequenceDescriptor, SequenceShape,
    TypeDescriptor, XmlRpcType,
};
pub use ser::{Serializer, to_value};
pub use value::{Struct, Value};
