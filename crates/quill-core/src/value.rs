//! The union of things a prompt statement can yield.

use std::sync::Arc;

use quill_futures::StringFuture;

use crate::message::RenderedMessage;
use crate::records::PromptRecords;

/// Anything that knows how to project itself into prompt text.
///
/// Projection is lazy: implementations return a [`StringFuture`] so a
/// promptable backed by a pending model call composes without forcing.
pub trait Promptable: std::fmt::Debug + Send + Sync {
    /// The textual projection.
    fn to_prompt(&self) -> StringFuture;
}

impl Promptable for String {
    fn to_prompt(&self) -> StringFuture {
        StringFuture::literal(self.clone())
    }
}

/// A value produced by evaluating one prompt statement.
#[derive(Debug, Clone)]
pub enum Value {
    /// No value.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Float scalar.
    Float(f64),
    /// Text, possibly still pending.
    Text(StringFuture),
    /// A sequence captured element by element.
    List(Vec<Value>),
    /// Records produced by a nested prompt function.
    Records(PromptRecords),
    /// A complete message with an explicit role.
    Message(RenderedMessage),
    /// A domain object with a textual projection.
    Promptable(Arc<dyn Promptable>),
}

impl Value {
    /// Kind name for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Records(_) => "records",
            Value::Message(_) => "message",
            Value::Promptable(_) => "promptable",
        }
    }

    /// Textual projection for kinds that have one.
    #[must_use]
    pub fn as_text(&self) -> Option<StringFuture> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::Promptable(p) => Some(p.to_prompt()),
            Value::Int(n) => Some(StringFuture::literal(n.to_string())),
            Value::Float(x) => Some(StringFuture::literal(x.to_string())),
            Value::Bool(b) => Some(StringFuture::literal(b.to_string())),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(StringFuture::literal(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(StringFuture::literal(s))
    }
}

impl From<StringFuture> for Value {
    fn from(s: StringFuture) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
