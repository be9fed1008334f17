//! The XML-RPC element grammar, shared by the decoder and the encoder.
//!
//! Every element kind has a fixed set of legal children. A close tag always
//! pops back to the parent recorded when the element was opened, so the
//! table only needs to describe start tags and where text may appear.
//!
//! ```text
//! Root           -> methodCall | methodResponse
//! methodCall     -> methodName, params
//! methodResponse -> params | fault
//! params         -> param*
//! param          -> value
//! fault          -> value
//! value          -> i4 | int | boolean | string | double
//!                   | dateTime.iso8601 | base64 | array | struct | text
//! array          -> data
//! data           -> value*
//! struct         -> member*
//! member         -> name, value
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Root,
    MethodCall,
    MethodResponse,
    MethodName,
    Params,
    Param,
    Value,
    Int,
    Boolean,
    String,
    Double,
    DateTime,
    Base64,
    Array,
    Data,
    Struct,
    Member,
    Name,
    Fault,
}

use ElementKind::*;

const SCALARS: &[ElementKind] = &[Int, Boolean, String, Double, DateTime, Base64];

impl ElementKind {
    /// The tag this kind is written with. `Int` is always written as `i4`.
    pub fn wire_name(self) -> &'static str {
        match self {
            Root => "",
            MethodCall => "methodCall",
            MethodResponse => "methodResponse",
            MethodName => "methodName",
            Params => "params",
            Param => "param",
            Value => "value",
            Int => "i4",
            Boolean => "boolean",
            String => "string",
            Double => "double",
            DateTime => "dateTime.iso8601",
            Base64 => "base64",
            Array => "array",
            Data => "data",
            Struct => "struct",
            Member => "member",
            Name => "name",
            Fault => "fault",
        }
    }

    /// Map a tag to its element kind. Both `i4` and `int` read as `Int`.
    pub fn from_tag(tag: &[u8]) -> Option<ElementKind> {
        let kind = match tag {
            b"methodCall" => MethodCall,
            b"methodResponse" => MethodResponse,
            b"methodName" => MethodName,
            b"params" => Params,
            b"param" => Param,
            b"value" => Value,
            b"i4" | b"int" => Int,
            b"boolean" => Boolean,
            b"string" => String,
            b"double" => Double,
            b"dateTime.iso8601" => DateTime,
            b"base64" => Base64,
            b"array" => Array,
            b"data" => Data,
            b"struct" => Struct,
            b"member" => Member,
            b"name" => Name,
            b"fault" => Fault,
            _ => return None,
        };
        Some(kind)
    }

    /// Legal child elements of this kind.
    pub fn children(self) -> &'static [ElementKind] {
        match self {
            Root => &[MethodCall, MethodResponse],
            MethodCall => &[MethodName, Params],
            MethodResponse => &[Params, Fault],
            Params => &[Param],
            Param | Fault | Data => &[Value],
            Value => &[Int, Boolean, String, Double, DateTime, Base64, Array, Struct],
            Array => &[Data],
            Struct => &[Member],
            Member => &[Name, Value],
            MethodName | Name | Int | Boolean | String | Double | DateTime | Base64 => &[],
        }
    }

    pub fn permits(self, child: ElementKind) -> bool {
        self.children().contains(&child)
    }

    /// Whether non-whitespace text may appear directly inside this kind.
    ///
    /// `Value` accepts text too: a bare `<value>text</value>` is a string.
    pub fn accepts_text(self) -> bool {
        self.is_scalar() || matches!(self, MethodName | Name | Value)
    }

    pub fn is_scalar(self) -> bool {
        SCALARS.contains(&self)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Root => write!(f, "document root"),
            other => write!(f, "<{}>", other.wire_name()),
        }
    }
}

/// The ancestor chain of the element currently being decoded.
///
/// The bottom entry is always [`ElementKind::Root`], so the depth of the
/// stack minus one is the document nesting depth.
#[derive(Debug, Clone)]
pub struct ParseContext {
    stack: Vec<ElementKind>,
}

impl ParseContext {
    pub fn new() -> Self {
        ParseContext { stack: vec![Root] }
    }

    pub fn current(&self) -> ElementKind {
        *self.stack.last().unwrap_or(&Root)
    }

    /// Number of open elements.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Open `child` under the current element if the grammar allows it.
    pub fn open(&mut self, child: ElementKind) -> bool {
        if !self.current().permits(child) {
            return false;
        }
        self.stack.push(child);
        true
    }

    /// Close the current element, returning it. The root is never popped.
    pub fn close(&mut self) -> Option<ElementKind> {
        if self.stack.len() > 1 {
            self.stack.pop()
        } else {
            None
        }
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        ParseContext::new()
    }
}
