//! Event interface between the validating parser and its listeners.
//!
//! The parser walks the document once and calls these handlers in document
//! order, one at a time. Validation diagnostics are delivered at the point
//! the validator detects them, interleaved with the structural events.

use std::io;

/// A single attribute of an element, by local name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Attributes of an element as reported by the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(Attribute {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Value of the first attribute with the given local name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (name, value) in iter {
            attributes.push(name, value);
        }
        attributes
    }
}

/// Severity of a diagnostic raised by the validating parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
    /// Parsing cannot continue past this point
    Fatal,
}

/// Listener for the validating parser's event stream.
///
/// Handlers return `io::Result` because listeners typically write a report
/// as they go; the first error stops delivery and is surfaced to the caller.
pub trait RecordEvents {
    fn element_enter(&mut self, name: &str, attributes: &Attributes) -> io::Result<()>;

    fn element_exit(&mut self, name: &str) -> io::Result<()>;

    fn character_data(&mut self, text: &str) -> io::Result<()>;

    fn diagnostic(&mut self, severity: Severity, message: &str) -> io::Result<()>;
}
