//! Streaming `<methodCall>` / `<methodResponse>` decoder.
//!
//! The decoder is a state machine fed one XML event at a time. Nothing is
//! buffered beyond the element being read: the method name is resolved as
//! soon as `</methodName>` closes, and from then on every `<value>` is
//! decoded against the type the registry declared for its slot. A document
//! that strays from the grammar or from the declared types fails at the
//! first offending event.
//!
//! ```rust
//! use xmlrpc_serde::{decode_slice, MethodRegistry, Value};
//!
//! let mut registry = MethodRegistry::new();
//! registry.register_fn("echo", |(s,): (String,)| Ok(s)).unwrap();
//!
//! let call = decode_slice(
//!     br#"<methodCall><methodName>echo</methodName>
//!         <params><param><value><string>hi</string></value></param></params>
//!         </methodCall>"#,
//!     &registry,
//! )
//! .unwrap();
//! assert_eq!(call.name(), "echo");
//! assert_eq!(call.params, vec![Value::String("hi".into())]);
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quick_xml::Reader;
use quick_xml::errors::SyntaxError;
use quick_xml::events::{BytesDecl, Event};
use std::io::BufRead;
use std::sync::Arc;
use tokio::io::AsyncBufRead;
use tracing::{debug, trace};

use crate::binder::ValueContext;
use crate::config::CodecConfig;
use crate::de::from_value;
use crate::error::{Error, Result};
use crate::fault::Fault;
use crate::grammar::{ElementKind, ParseContext};
use crate::iso8601;
use crate::registry::{MethodDescriptor, MethodRegistry};
use crate::schema::{TypeDescriptor, XmlRpcType};
use crate::value::Value;

/// A decoded call: the resolved method and its parameters, already checked
/// against the method's declared parameter types.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: Arc<MethodDescriptor>,
    pub params: Vec<Value>,
}

impl MethodCall {
    pub fn name(&self) -> &str {
        self.method.name()
    }
}

/// A decoded `<methodResponse>`.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The returned value. `None` when the `<param>` held no value.
    Success(Option<Value>),
    Fault(Fault),
}

impl Response {
    /// Turn a fault into an [`Error::Fault`].
    pub fn into_result(self) -> Result<Option<Value>> {
        match self {
            Response::Success(value) => Ok(value),
            Response::Fault(fault) => Err(fault.into()),
        }
    }
}

// ── Drivers ────────────────────────────────────────────────────────────────

/// Decode one `<methodCall>` from an async byte stream.
pub async fn decode<R>(input: R, registry: &MethodRegistry) -> Result<MethodCall>
where
    R: AsyncBufRead + Unpin,
{
    decode_with_config(input, registry, &CodecConfig::default()).await
}

pub async fn decode_with_config<R>(
    input: R,
    registry: &MethodRegistry,
    config: &CodecConfig,
) -> Result<MethodCall>
where
    R: AsyncBufRead + Unpin,
{
    let mut decoder = Decoder::call(registry, config);
    drive_async(input, &mut decoder).await?;
    decoder.into_call()
}

/// Decode one `<methodCall>` from a blocking reader.
pub fn decode_reader<R: BufRead>(input: R, registry: &MethodRegistry) -> Result<MethodCall> {
    let mut decoder = Decoder::call(registry, &CodecConfig::default());
    drive(input, &mut decoder)?;
    decoder.into_call()
}

pub fn decode_slice(input: &[u8], registry: &MethodRegistry) -> Result<MethodCall> {
    decode_reader(input, registry)
}

/// Decode one `<methodResponse>` whose result is expected to be `returns`.
pub async fn decode_response<R>(input: R, returns: &TypeDescriptor) -> Result<Response>
where
    R: AsyncBufRead + Unpin,
{
    let mut decoder = Decoder::response(returns.clone(), &CodecConfig::default());
    drive_async(input, &mut decoder).await?;
    decoder.into_response()
}

pub fn decode_response_slice(input: &[u8], returns: &TypeDescriptor) -> Result<Response> {
    let mut decoder = Decoder::response(returns.clone(), &CodecConfig::default());
    drive(input, &mut decoder)?;
    decoder.into_response()
}

fn xml_reader<R>(input: R) -> Reader<R> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().expand_empty_elements = true;
    reader
}

fn drive<R: BufRead>(input: R, decoder: &mut Decoder<'_>) -> Result<()> {
    let mut reader = xml_reader(input);
    let mut buf = Vec::new();
    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => return Err(read_failure(e, decoder)),
        };
        let done = decoder.feed(event)?;
        buf.clear();
        if done {
            return Ok(());
        }
    }
}

async fn drive_async<R>(input: R, decoder: &mut Decoder<'_>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut reader = xml_reader(input);
    let mut buf = Vec::new();
    loop {
        let event = match reader.read_event_into_async(&mut buf).await {
            Ok(event) => event,
            Err(e) => return Err(read_failure(e, decoder)),
        };
        let done = decoder.feed(event)?;
        buf.clear();
        if done {
            return Ok(());
        }
    }
}

/// Markup left unclosed at end of input means the document was cut short.
fn read_failure(e: quick_xml::Error, decoder: &Decoder<'_>) -> Error {
    match e {
        quick_xml::Error::Syntax(syntax)
            if decoder.started && !matches!(syntax, SyntaxError::InvalidBangMarkup) =>
        {
            Error::Transport(format!("input ended inside markup: {}", syntax))
        }
        other => other.into(),
    }
}

// ── State machine ──────────────────────────────────────────────────────────

/// What the document is being decoded into.
enum Target<'r> {
    Call {
        registry: &'r MethodRegistry,
        method: Option<Arc<MethodDescriptor>>,
        params: Vec<Value>,
    },
    Response {
        returns: TypeDescriptor,
        result: Option<Value>,
        fault: Option<Fault>,
    },
}

struct Decoder<'r> {
    target: Target<'r>,
    max_depth: usize,
    elements: ParseContext,
    /// Composite values under construction, innermost last.
    values: Vec<ValueContext>,
    /// Type expected for the innermost open `<value>`.
    expected: Option<TypeDescriptor>,
    /// The value produced by the innermost element that just closed.
    current: Option<Value>,
    text: String,
    /// The collected text came from CDATA, so whitespace in it is content.
    literal: bool,
    value_has_child: bool,
    /// `<param>` elements opened so far.
    params_seen: usize,
    started: bool,
    finished: bool,
}

impl<'r> Decoder<'r> {
    fn call(registry: &'r MethodRegistry, config: &CodecConfig) -> Self {
        Decoder::new(
            Target::Call {
                registry,
                method: None,
                params: Vec::new(),
            },
            config,
        )
    }

    fn response(returns: TypeDescriptor, config: &CodecConfig) -> Self {
        Decoder::new(
            Target::Response {
                returns,
                result: None,
                fault: None,
            },
            config,
        )
    }

    fn new(target: Target<'r>, config: &CodecConfig) -> Self {
        Decoder {
            target,
            max_depth: config.max_depth,
            elements: ParseContext::new(),
            values: Vec::new(),
            expected: None,
            current: None,
            text: String::new(),
            literal: false,
            value_has_child: false,
            params_seen: 0,
            started: false,
            finished: false,
        }
    }

    /// Feed one event. Returns `true` once the input is exhausted.
    fn feed(&mut self, event: Event<'_>) -> Result<bool> {
        match event {
            Event::Decl(decl) => self.declaration(&decl)?,
            Event::Start(start) => self.start(start.name().as_ref())?,
            Event::Empty(empty) => {
                self.start(empty.name().as_ref())?;
                self.end()?;
            }
            Event::End(_) => self.end()?,
            Event::Text(text) => {
                let raw = std::str::from_utf8(&text)
                    .map_err(|e| Error::InvalidCharacterForEncoding(e.to_string()))?;
                let unescaped = quick_xml::escape::unescape(raw)
                    .map_err(|e| Error::NotWellFormed(e.to_string()))?;
                self.text(&unescaped, false)?;
            }
            Event::CData(data) => {
                let raw = std::str::from_utf8(&data)
                    .map_err(|e| Error::InvalidCharacterForEncoding(e.to_string()))?;
                self.text(raw, true)?;
            }
            Event::Eof => {
                self.eof()?;
                return Ok(true);
            }
            // Comments, processing instructions and doctypes carry nothing.
            _ => {}
        }
        Ok(false)
    }

    fn declaration(&mut self, decl: &BytesDecl<'_>) -> Result<()> {
        if self.started {
            return Err(Error::NotWellFormed(
                "XML declaration after the document element".into(),
            ));
        }
        if let Some(encoding) = decl.encoding() {
            let encoding = encoding.map_err(|e| Error::NotWellFormed(e.to_string()))?;
            let supported = [&b"utf-8"[..], b"utf8", b"us-ascii"]
                .iter()
                .any(|name| encoding.eq_ignore_ascii_case(name));
            if !supported {
                return Err(Error::UnsupportedEncoding(
                    String::from_utf8_lossy(&encoding).into_owned(),
                ));
            }
        }
        Ok(())
    }

    fn start(&mut self, tag: &[u8]) -> Result<()> {
        let parent = self.elements.current();
        if self.finished {
            return Err(Error::NotWellFormed(
                "content after the document element".into(),
            ));
        }
        let kind = ElementKind::from_tag(tag).ok_or_else(|| {
            Error::InvalidXmlRpc(format!(
                "unknown element <{}> in {}",
                String::from_utf8_lossy(tag),
                parent
            ))
        })?;

        if parent == ElementKind::Value {
            if !self.text.trim().is_empty() {
                return Err(Error::InvalidXmlRpc(format!(
                    "{} mixes text with {}",
                    parent, kind
                )));
            }
            self.value_has_child = true;
        }
        if !self.elements.open(kind) {
            return Err(Error::InvalidXmlRpc(format!(
                "{} is not allowed in {}",
                kind, parent
            )));
        }
        if self.elements.depth() > self.max_depth {
            return Err(Error::InvalidXmlRpc(format!(
                "elements nested deeper than {}",
                self.max_depth
            )));
        }
        self.started = true;
        self.text.clear();
        self.literal = false;

        match kind {
            ElementKind::MethodCall if !matches!(self.target, Target::Call { .. }) => {
                return Err(Error::InvalidXmlRpc(
                    "expected <methodResponse>, found <methodCall>".into(),
                ));
            }
            ElementKind::MethodResponse if !matches!(self.target, Target::Response { .. }) => {
                return Err(Error::InvalidXmlRpc(
                    "expected <methodCall>, found <methodResponse>".into(),
                ));
            }
            ElementKind::Params => {
                if let Target::Call { method: None, .. } = self.target {
                    return Err(Error::InvalidXmlRpc(
                        "<params> appears before <methodName>".into(),
                    ));
                }
            }
            ElementKind::Param => self.open_param()?,
            ElementKind::Value => {
                self.expected = Some(self.expected_for_value(parent)?);
                self.current = None;
                self.value_has_child = false;
            }
            ElementKind::Array => {
                let context = ValueContext::sequence(self.expected.as_ref())?;
                self.values.push(context);
            }
            ElementKind::Struct => {
                let context = ValueContext::record(self.expected.as_ref())?;
                self.values.push(context);
            }
            _ => {}
        }
        Ok(())
    }

    fn open_param(&mut self) -> Result<()> {
        match &self.target {
            Target::Call {
                method: Some(method),
                ..
            } => {
                if self.params_seen >= method.arity() {
                    return Err(Error::InvalidParams(format!(
                        "too many parameters for {}: expected {}",
                        method.name(),
                        method.arity()
                    )));
                }
            }
            Target::Call { method: None, .. } => {
                return Err(Error::InvalidXmlRpc(
                    "<param> appears before <methodName>".into(),
                ));
            }
            Target::Response { .. } => {
                if self.params_seen >= 1 {
                    return Err(Error::InvalidXmlRpc(
                        "a response carries exactly one <param>".into(),
                    ));
                }
            }
        }
        self.params_seen += 1;
        Ok(())
    }

    /// The declared type of a `<value>` opening under `parent`.
    fn expected_for_value(&self, parent: ElementKind) -> Result<TypeDescriptor> {
        match parent {
            ElementKind::Param => match &self.target {
                Target::Call {
                    method: Some(method),
                    params,
                    ..
                } => {
                    if params.len() >= self.params_seen {
                        return Err(Error::InvalidXmlRpc(
                            "<param> holds more than one <value>".into(),
                        ));
                    }
                    method.params().get(params.len()).cloned().ok_or_else(|| {
                        Error::Internal(format!("{} has no parameter slot", method.name()))
                    })
                }
                Target::Call { method: None, .. } => {
                    Err(Error::Internal("parameter value without a method".into()))
                }
                Target::Response {
                    returns, result, ..
                } => {
                    if result.is_some() {
                        return Err(Error::InvalidXmlRpc(
                            "<param> holds more than one <value>".into(),
                        ));
                    }
                    Ok(returns.clone())
                }
            },
            ElementKind::Data => self
                .values
                .last()
                .ok_or_else(|| Error::Internal("<data> outside an array".into()))?
                .element_type(),
            ElementKind::Member => self
                .values
                .last()
                .and_then(ValueContext::pending_type)
                .ok_or_else(|| Error::InvalidXmlRpc("<member> has <value> before <name>".into())),
            ElementKind::Fault => match &self.target {
                Target::Response { fault: None, .. } => Ok(Fault::descriptor()),
                _ => Err(Error::InvalidXmlRpc("<fault> holds more than one <value>".into())),
            },
            other => Err(Error::Internal(format!("<value> opened in {}", other))),
        }
    }

    fn text(&mut self, text: &str, literal: bool) -> Result<()> {
        let current = self.elements.current();
        let blank = text.trim().is_empty();
        if current.accepts_text() {
            if current == ElementKind::Value && self.value_has_child && !blank {
                return Err(Error::InvalidXmlRpc(format!(
                    "{} mixes text with a typed value",
                    current
                )));
            }
            self.text.push_str(text);
            self.literal |= literal;
        } else if !blank {
            return Err(Error::InvalidXmlRpc(format!(
                "unexpected text in {}",
                current
            )));
        }
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        let kind = self
            .elements
            .close()
            .ok_or_else(|| Error::NotWellFormed("closing tag without an open element".into()))?;
        let parent = self.elements.current();

        match kind {
            ElementKind::MethodName => self.resolve_method()?,
            kind if kind.is_scalar() => {
                let text = std::mem::take(&mut self.text);
                let literal = std::mem::take(&mut self.literal);
                self.current = Some(parse_scalar(kind, text, literal)?);
            }
            ElementKind::Value => {
                let text = std::mem::take(&mut self.text);
                let literal = std::mem::take(&mut self.literal);
                if self.current.is_none()
                    && !self.value_has_child
                    && (literal || !text.trim().is_empty())
                {
                    // No type element: the text is a string.
                    self.current = Some(Value::String(text));
                }
                let value = self.current.take();
                // Any enclosing value holds a composite, so it has a child.
                self.value_has_child = true;
                self.close_value(parent, value)?;
            }
            ElementKind::Array | ElementKind::Struct => {
                let context = self
                    .values
                    .pop()
                    .ok_or_else(|| Error::Internal(format!("{} closed twice", kind)))?;
                self.current = Some(context.finalize()?);
            }
            ElementKind::Name => {
                let name = std::mem::take(&mut self.text);
                let name = name.trim();
                if name.is_empty() {
                    return Err(Error::Internal("struct member has an empty name".into()));
                }
                let context = self
                    .values
                    .last_mut()
                    .ok_or_else(|| Error::Internal("<name> outside a struct".into()))?;
                if context.pending_type().is_some() {
                    return Err(Error::InvalidXmlRpc("<member> has more than one <name>".into()));
                }
                context.resolve_member(name)?;
            }
            ElementKind::Member => {
                if let Some(context) = self.values.last_mut() {
                    context.clear_pending();
                }
            }
            ElementKind::Param => {
                if let Target::Call { params, .. } = &self.target {
                    if params.len() != self.params_seen {
                        return Err(Error::InvalidParams(format!(
                            "parameter {} has no value",
                            self.params_seen - 1
                        )));
                    }
                }
            }
            ElementKind::Params => self.check_arity()?,
            ElementKind::Fault => {
                if let Target::Response { fault: None, .. } = self.target {
                    return Err(Error::InvalidXmlRpc("<fault> without a value".into()));
                }
            }
            ElementKind::MethodCall => {
                if let Target::Call { method: None, .. } = self.target {
                    return Err(Error::InvalidXmlRpc("<methodCall> without <methodName>".into()));
                }
                self.check_arity()?;
                self.finished = true;
            }
            ElementKind::MethodResponse => {
                if let Target::Response { fault: None, .. } = self.target {
                    if self.params_seen == 0 {
                        return Err(Error::InvalidXmlRpc(
                            "<methodResponse> without <params> or <fault>".into(),
                        ));
                    }
                }
                self.finished = true;
            }
            _ => {}
        }
        Ok(())
    }

    fn resolve_method(&mut self) -> Result<()> {
        let name = std::mem::take(&mut self.text);
        let name = name.trim();
        let Target::Call {
            registry, method, ..
        } = &mut self.target
        else {
            return Err(Error::InvalidXmlRpc("<methodName> in a response".into()));
        };
        if name.is_empty() {
            return Err(Error::InvalidXmlRpc("empty <methodName>".into()));
        }
        if method.is_some() {
            return Err(Error::InvalidXmlRpc("more than one <methodName>".into()));
        }
        let descriptor = registry
            .lookup(name)
            .ok_or_else(|| Error::MethodNotFound(name.to_owned()))?;
        debug!(method = name, arity = descriptor.arity(), "resolved XML-RPC method");
        *method = Some(descriptor);
        Ok(())
    }

    fn close_value(&mut self, parent: ElementKind, value: Option<Value>) -> Result<()> {
        match parent {
            ElementKind::Param => match &mut self.target {
                Target::Call {
                    method: Some(method),
                    params,
                    ..
                } => {
                    let index = params.len();
                    let value = value.ok_or_else(|| {
                        Error::InvalidParams(format!("parameter {} has no value", index))
                    })?;
                    let declared = &method.params()[index];
                    if !value.matches(declared) {
                        return Err(Error::InvalidParams(format!(
                            "parameter {} of {} is a {}, expected {}",
                            index,
                            method.name(),
                            value.kind(),
                            declared.name()
                        )));
                    }
                    trace!(index, kind = value.kind(), "bound parameter");
                    params.push(value);
                }
                Target::Call { method: None, .. } => {
                    return Err(Error::Internal("parameter value without a method".into()));
                }
                Target::Response {
                    returns, result, ..
                } => {
                    if let Some(value) = &value {
                        if !value.matches(returns) {
                            return Err(Error::InvalidParams(format!(
                                "response is a {}, expected {}",
                                value.kind(),
                                returns.name()
                            )));
                        }
                    }
                    *result = value;
                }
            },
            ElementKind::Data => {
                // An empty <value/> inside an array contributes no element.
                if let Some(value) = value {
                    self.values
                        .last_mut()
                        .ok_or_else(|| Error::Internal("<data> outside an array".into()))?
                        .append(value)?;
                }
            }
            ElementKind::Member => self
                .values
                .last_mut()
                .ok_or_else(|| Error::Internal("<member> outside a struct".into()))?
                .set_pending(value)?,
            ElementKind::Fault => {
                let Target::Response { fault, .. } = &mut self.target else {
                    return Err(Error::InvalidXmlRpc("<fault> in a call".into()));
                };
                let value =
                    value.ok_or_else(|| Error::InvalidXmlRpc("<fault> has an empty value".into()))?;
                let decoded: Fault = from_value(value)
                    .map_err(|e| Error::InvalidXmlRpc(format!("malformed fault: {}", e)))?;
                *fault = Some(decoded);
            }
            other => return Err(Error::Internal(format!("<value> closed in {}", other))),
        }
        Ok(())
    }

    /// Every declared parameter must have been supplied.
    fn check_arity(&self) -> Result<()> {
        if let Target::Call {
            method: Some(method),
            params,
            ..
        } = &self.target
        {
            if params.len() != method.arity() {
                return Err(Error::InvalidParams(format!(
                    "too few parameters for {}: expected {}, received {}",
                    method.name(),
                    method.arity(),
                    params.len()
                )));
            }
        }
        Ok(())
    }

    fn eof(&self) -> Result<()> {
        if self.finished {
            Ok(())
        } else if self.started {
            Err(Error::Transport(format!(
                "input ended inside {}",
                self.elements.current()
            )))
        } else {
            Err(Error::InvalidXmlRpc("document has no root element".into()))
        }
    }

    fn into_call(self) -> Result<MethodCall> {
        match self.target {
            Target::Call {
                method: Some(method),
                params,
                ..
            } if self.finished => Ok(MethodCall { method, params }),
            _ => Err(Error::InvalidXmlRpc("no complete <methodCall>".into())),
        }
    }

    fn into_response(self) -> Result<Response> {
        match self.target {
            Target::Response {
                fault: Some(fault), ..
            } => Ok(Response::Fault(fault)),
            Target::Response { result, .. } if self.finished => Ok(Response::Success(result)),
            _ => Err(Error::InvalidXmlRpc("no complete <methodResponse>".into())),
        }
    }
}

/// Convert the text of a scalar element into its typed value.
fn parse_scalar(kind: ElementKind, text: String, literal: bool) -> Result<Value> {
    if kind == ElementKind::String {
        // Whitespace-only text is ignored unless it came from CDATA.
        if !literal && text.trim().is_empty() {
            return Ok(Value::String(String::new()));
        }
        return Ok(Value::String(text));
    }

    let trimmed = text.trim();
    let invalid = || Error::InvalidXmlRpc(format!("'{}' is not a valid {}", trimmed, kind));
    let value = match kind {
        ElementKind::Int => Value::Int(trimmed.parse().map_err(|_| invalid())?),
        ElementKind::Boolean => match trimmed {
            "1" => Value::Boolean(true),
            "0" => Value::Boolean(false),
            t if t.eq_ignore_ascii_case("true") => Value::Boolean(true),
            t if t.eq_ignore_ascii_case("false") => Value::Boolean(false),
            _ => return Err(invalid()),
        },
        ElementKind::Double => {
            let v: f64 = trimmed.parse().map_err(|_| invalid())?;
            if !v.is_finite() {
                return Err(invalid());
            }
            Value::Double(v)
        }
        ElementKind::DateTime => Value::DateTime(iso8601::parse(trimmed).ok_or_else(invalid)?),
        ElementKind::Base64 => {
            let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
            Value::Base64(STANDARD.decode(compact).map_err(|_| invalid())?)
        }
        other => return Err(Error::Internal(format!("{} is not a scalar", other))),
    };
    Ok(value)
}
