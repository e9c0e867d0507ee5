//! Marshal value tree

use std::borrow::Cow;

/// Encoding attached to a Ruby string through its instance variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringEncoding {
    /// No encoding ivar (ASCII-8BIT, or any string written by Ruby 1.8)
    Binary,
    /// `E => true`
    Utf8,
    /// `E => false`
    UsAscii,
    /// `encoding => "name"`
    Named(String),
}

/// A decoded Marshal value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(i64),
    Symbol(String),
    String {
        bytes: Vec<u8>,
        encoding: StringEncoding,
    },
    Array(Vec<Value>),
    /// Hash entries in stream order
    Hash(Vec<(Value, Value)>),
}

impl Value {
    /// A UTF-8 tagged string
    pub fn utf8(text: impl Into<String>) -> Self {
        Value::String {
            bytes: text.into().into_bytes(),
            encoding: StringEncoding::Utf8,
        }
    }

    /// An untagged byte string
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Value::String {
            bytes: bytes.into(),
            encoding: StringEncoding::Binary,
        }
    }

    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Symbol(_) => "symbol",
            Value::String { .. } => "string",
            Value::Array(_) => "array",
            Value::Hash(_) => "hash",
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String { bytes, .. } => Some(bytes),
            _ => None,
        }
    }

    /// String contents decoded as UTF-8, replacing invalid sequences
    pub fn as_str_lossy(&self) -> Option<Cow<'_, str>> {
        self.as_bytes().map(String::from_utf8_lossy)
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}
