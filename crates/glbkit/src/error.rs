//! Error types for document parsing, decoding and writing.

use thiserror::Error;

use crate::accessor::{ComponentType, ElementShape};
pub use crate::parser::{ParseError, SyntaxError};

/// Every failure raised by this crate.
///
/// Errors are detected synchronously at the point of violation and abort the
/// current parse, decode or write call. Inputs are immutable, so none of them
/// is worth retrying.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad magic, unsupported version, wrong chunk layout or asset version.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// JSON grammar violation.
    #[error("syntax error: {0}")]
    Syntax(#[from] ParseError),

    /// A scalar getter was called on a node of a different kind, or the token
    /// does not fit the requested numeric type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    ValueTypeMismatch {
        /// What the caller asked for.
        expected: &'static str,
        /// The node kind or token found.
        actual: String,
    },

    /// The requested decode is not implemented for this accessor layout.
    #[error("unsupported accessor type: {component_type:?} {shape:?}")]
    UnsupportedAccessorType {
        /// The accessor's component type.
        component_type: ComponentType,
        /// The accessor's shape.
        shape: ElementShape,
    },

    /// An index, offset or length points outside of its container.
    #[error("{what} {index} out of bounds (len: {len})")]
    BoundsViolation {
        /// The kind of index or extent.
        what: &'static str,
        /// The offending value.
        index: usize,
        /// The size it had to stay below.
        len: usize,
    },

    /// Keyed lookup on an object that has no such key.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// The writer was asked to emit a token where the grammar forbids it.
    #[error("json format error: {0}")]
    JsonFormat(&'static str),

    /// A data URI did not contain valid base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// I/O error while resolving external storage or writing a container.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A background parse terminated abnormally.
    #[error("background worker failed: {0}")]
    Worker(String),
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedDocument(msg.into())
    }

    pub(crate) fn out_of_bounds(what: &'static str, index: usize, len: usize) -> Self {
        Self::BoundsViolation { what, index, len }
    }

    pub(crate) fn mismatch(expected: &'static str, actual: impl Into<String>) -> Self {
        Self::ValueTypeMismatch {
            expected,
            actual: actual.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
