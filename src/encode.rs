//! `<methodResponse>` / `<methodCall>` writer.
//!
//! Values are written with an explicit stack, so nesting depth is bounded
//! by memory rather than by the call stack.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::Serialize;
use std::io::Write;

use crate::config::CodecConfig;
use crate::error::{Error, Result};
use crate::fault::Fault;
use crate::grammar::ElementKind;
use crate::iso8601;
use crate::ser::to_value;
use crate::value::Value;

/// Serialize `value` as a complete `<methodResponse>` document.
///
/// ```rust
/// let xml = xmlrpc_serde::to_response_bytes(&"hi").unwrap();
/// assert!(xml.ends_with(
///     b"<methodResponse><params><param><value><string>hi</string></value></param></params></methodResponse>"
/// ));
/// ```
pub fn to_response_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    to_response_writer(&mut buf, value)?;
    Ok(buf)
}

pub fn to_response_writer<W: Write, T: Serialize + ?Sized>(writer: W, value: &T) -> Result<()> {
    let value = to_value(value)?;
    Encoder::new(writer).write_response(value.as_ref())
}

/// A complete fault response document.
pub fn to_fault_bytes(code: i32, message: &str) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new(Vec::new());
    encoder.write_fault(&Fault::new(code, message))?;
    Ok(encoder.into_inner())
}

/// A complete `<methodCall>` document. `params` must serialize to an array,
/// usually a tuple.
pub fn to_call_bytes<T: Serialize + ?Sized>(method: &str, params: &T) -> Result<Vec<u8>> {
    let params = match to_value(params)? {
        Some(Value::Array(items)) => items,
        None => Vec::new(),
        Some(other) => {
            return Err(Error::Message(format!(
                "call parameters must serialize to an array, found {}",
                other.kind()
            )));
        }
    };
    let mut encoder = Encoder::new(Vec::new());
    encoder.write_call(method, &params)?;
    Ok(encoder.into_inner())
}

/// One pending step of the value writer.
enum Step<'a> {
    Value(&'a Value),
    Member(&'a str, &'a Value),
    Close(ElementKind),
}

pub struct Encoder<W: Write> {
    writer: Writer<W>,
    declaration: bool,
}

impl<W: Write> Encoder<W> {
    pub fn new(inner: W) -> Self {
        Encoder::with_config(inner, &CodecConfig::default())
    }

    pub fn with_config(inner: W, config: &CodecConfig) -> Self {
        let writer = match config.indent {
            Some(spaces) => Writer::new_with_indent(inner, b' ', spaces),
            None => Writer::new(inner),
        };
        Encoder {
            writer,
            declaration: config.xml_declaration,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    /// `<methodResponse><params><param>` around `value`. A null result
    /// leaves the `<param>` empty.
    pub fn write_response(&mut self, value: Option<&Value>) -> Result<()> {
        self.write_declaration()?;
        self.open(ElementKind::MethodResponse)?;
        self.open(ElementKind::Params)?;
        self.open(ElementKind::Param)?;
        if let Some(value) = value {
            self.write_value(value)?;
        }
        self.close(ElementKind::Param)?;
        self.close(ElementKind::Params)?;
        self.close(ElementKind::MethodResponse)
    }

    pub fn write_fault(&mut self, fault: &Fault) -> Result<()> {
        let value = to_value(fault)?
            .ok_or_else(|| Error::Internal("fault serialized to nothing".into()))?;
        self.write_declaration()?;
        self.open(ElementKind::MethodResponse)?;
        self.open(ElementKind::Fault)?;
        self.write_value(&value)?;
        self.close(ElementKind::Fault)?;
        self.close(ElementKind::MethodResponse)
    }

    pub fn write_call(&mut self, method: &str, params: &[Value]) -> Result<()> {
        self.write_declaration()?;
        self.open(ElementKind::MethodCall)?;
        self.leaf(ElementKind::MethodName, method)?;
        self.open(ElementKind::Params)?;
        for param in params {
            self.open(ElementKind::Param)?;
            self.write_value(param)?;
            self.close(ElementKind::Param)?;
        }
        self.close(ElementKind::Params)?;
        self.close(ElementKind::MethodCall)
    }

    /// Write one `<value>` element and everything nested in it.
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        let mut stack = vec![Step::Value(value)];
        while let Some(step) = stack.pop() {
            let value = match step {
                Step::Close(kind) => {
                    self.close(kind)?;
                    continue;
                }
                Step::Member(name, value) => {
                    self.open(ElementKind::Member)?;
                    self.leaf(ElementKind::Name, name)?;
                    stack.push(Step::Close(ElementKind::Member));
                    stack.push(Step::Value(value));
                    continue;
                }
                Step::Value(value) => value,
            };

            self.open(ElementKind::Value)?;
            match value {
                Value::Int(v) => self.leaf(ElementKind::Int, &v.to_string())?,
                Value::Boolean(v) => self.leaf(ElementKind::Boolean, if *v { "1" } else { "0" })?,
                Value::String(v) if !v.is_empty() && v.trim().is_empty() => {
                    // Bare whitespace would be dropped by the reader.
                    self.open(ElementKind::String)?;
                    self.writer.write_event(Event::CData(BytesCData::new(v.as_str())))?;
                    self.close(ElementKind::String)?;
                }
                Value::String(v) => self.leaf(ElementKind::String, v)?,
                Value::Double(v) => {
                    if !v.is_finite() {
                        return Err(Error::Unsupported("non-finite double"));
                    }
                    self.leaf(ElementKind::Double, &v.to_string())?
                }
                Value::DateTime(v) => self.leaf(ElementKind::DateTime, &iso8601::format(v))?,
                Value::Base64(v) => self.leaf(ElementKind::Base64, &STANDARD.encode(v))?,
                Value::Array(items) => {
                    self.open(ElementKind::Array)?;
                    self.open(ElementKind::Data)?;
                    stack.push(Step::Close(ElementKind::Value));
                    stack.push(Step::Close(ElementKind::Array));
                    stack.push(Step::Close(ElementKind::Data));
                    stack.extend(items.iter().rev().map(Step::Value));
                    continue;
                }
                Value::Struct(members) => {
                    self.open(ElementKind::Struct)?;
                    stack.push(Step::Close(ElementKind::Value));
                    stack.push(Step::Close(ElementKind::Struct));
                    stack.extend(members.iter().rev().map(|(n, v)| Step::Member(n, v)));
                    continue;
                }
            }
            self.close(ElementKind::Value)?;
        }
        Ok(())
    }

    fn write_declaration(&mut self) -> Result<()> {
        if self.declaration {
            self.writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        }
        Ok(())
    }

    fn open(&mut self, kind: ElementKind) -> Result<()> {
        self.writer
            .write_event(Event::Start(BytesStart::new(kind.wire_name())))?;
        Ok(())
    }

    fn close(&mut self, kind: ElementKind) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(kind.wire_name())))?;
        Ok(())
    }

    fn leaf(&mut self, kind: ElementKind, text: &str) -> Result<()> {
        self.open(kind)?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.close(kind)
    }
}
