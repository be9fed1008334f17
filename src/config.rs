use serde::{Deserialize, Serialize};

/// Codec settings. Every field has a default, so a partial document
/// deserializes cleanly:
///
/// ```rust
/// use xmlrpc_serde::CodecConfig;
///
/// let config: CodecConfig = serde_json::from_str(r#"{ "indent": 2 }"#).unwrap();
/// assert_eq!(config.indent, Some(2));
/// assert_eq!(config.max_depth, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Emit `<?xml version="1.0" encoding="utf-8"?>` before each document.
    pub xml_declaration: bool,
    /// Spaces per nesting level. `None` writes the document on one line.
    pub indent: Option<usize>,
    /// Deepest element nesting the decoder accepts.
    pub max_depth: usize,
    /// Fault reported for errors that carry no fault code of their own.
    pub fallback_fault_code: i32,
    pub fallback_fault_string: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            xml_declaration: true,
            indent: None,
            max_depth: 64,
            fallback_fault_code: 500,
            fallback_fault_string: "Internal Server Error".into(),
        }
    }
}

impl CodecConfig {
    pub fn without_declaration(mut self) -> Self {
        self.xml_declaration = false;
        self
    }

    pub fn with_indent(mut self, spaces: usize) -> Self {
        self.indent = Some(spaces);
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_fallback_fault(mut self, code: i32, message: impl Into<String>) -> Self {
        self.fallback_fault_code = code;
        self.fallback_fault_string = message.into();
        self
    }
}
