//! Error families raised by the compiler and the bridge.
//!
//! Messages embed line numbers where the IDL is at fault, the way the
//! compiler sees them (1-based).

use std::path::PathBuf;

use skein_wire::{ProtocolError, StructValue};

/// The lexer or parser rejected the IDL text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parse error on line {line}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

/// The IDL contradicts a compile-time constraint: duplicate identifiers,
/// missing requiredness, bad oneway declarations, unresolved references.
/// Fatal to compilation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CompileError(pub String);

impl CompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A host value failed validation during construction or serialization.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("cannot convert {actual} into a \"{expected}\"")]
    TypeMismatch { expected: String, actual: String },

    #[error("value {value} is out of range for \"{target}\"")]
    OutOfRange { value: i64, target: String },

    #[error("field \"{field}\" of \"{owner}\" is required and may not be absent")]
    MissingRequired { owner: String, field: String },

    #[error("\"{owner}\" has no field named \"{field}\"")]
    UnknownField { owner: String, field: String },

    #[error("field \"{field}\" of \"{owner}\" was given more than once")]
    DuplicateField { owner: String, field: String },

    #[error(
        "\"{union}\" received values for \"{first}\" and \"{second}\"; \
         unions hold at most one field"
    )]
    MultipleUnionFields {
        union: String,
        first: String,
        second: String,
    },

    #[error("\"{union}\" received no values; exactly one field is required")]
    EmptyUnion { union: String },

    #[error("\"{type_name}\" holds bytes that are not valid UTF-8")]
    InvalidUtf8 { type_name: String },

    #[error("\"{item}\" is not an item of enum \"{enum_name}\"")]
    UnknownEnumItem { enum_name: String, item: String },
}

/// A deserialized function result held an exception id this module does not
/// know about. Carries the raw wire struct for diagnosis.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct UnknownExceptionError {
    pub message: String,
    pub response: StructValue,
}

/// Any error raised by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    UnknownException(#[from] UnknownExceptionError),

    #[error("unknown service \"{service}\"")]
    UnknownService { service: String },

    #[error("service \"{service}\" has no function \"{function}\"")]
    UnknownFunction { service: String, function: String },

    #[error(
        "function \"{function}\" of service \"{service}\" is oneway \
         and does not produce replies"
    )]
    UnexpectedReply { service: String, function: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
