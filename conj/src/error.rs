//! Collection error types.
//!
//! Lookup misses are never errors: `entry` returns `None` and `contains`
//! returns `false`. Removal of absent keys is a no-op. Only the operations
//! below can fail, and a failure never disturbs the receiver.

use thiserror::Error;

use crate::contracts::MetaMap;

/// Errors raised by persistent collection operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// Vector `assoc` past the append slot or before the first element.
    #[error("index {index} out of range for vector of length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    /// `pop` on an empty stack.
    #[error("can't pop empty {kind}")]
    Underflow { kind: &'static str },
    /// Operation not defined for this kind of value.
    #[error("{op} not supported on {kind}")]
    Unsupported { op: &'static str, kind: &'static str },
    /// Key of the wrong type for the collection, e.g. a string vector index.
    #[error("invalid key for {kind}: {key}")]
    InvalidKey { kind: &'static str, key: String },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CollectionError>;

impl CollectionError {
    /// Create an index out of range error.
    pub fn index_out_of_range(index: i64, len: usize) -> Self {
        tracing::debug!(index, len, "vector index out of range");
        Self::IndexOutOfRange { index, len }
    }

    /// Create a stack underflow error.
    pub fn underflow(kind: &'static str) -> Self {
        tracing::debug!(kind, "pop on empty stack");
        Self::Underflow { kind }
    }

    /// Create an unsupported operation error.
    pub fn unsupported(op: &'static str, kind: &'static str) -> Self {
        tracing::debug!(op, kind, "unsupported collection operation");
        Self::Unsupported { op, kind }
    }

    /// Create an invalid key error.
    pub fn invalid_key(kind: &'static str, key: impl ToString) -> Self {
        let key = key.to_string();
        tracing::debug!(kind, key = %key, "invalid collection key");
        Self::InvalidKey { kind, key }
    }
}

/// An error carrying a map of data about what went wrong, as raised by
/// `ex-info`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} {data}")]
pub struct ExceptionInfo {
    message: String,
    data: MetaMap,
    cause: Option<Box<ExceptionInfo>>,
}

impl ExceptionInfo {
    pub fn new(message: impl Into<String>, data: MetaMap) -> Self {
        let message = message.into();
        tracing::debug!(message = %message, keys = data.len(), "exception info raised");
        ExceptionInfo {
            message,
            data,
            cause: None,
        }
    }

    /// The same error, recording `cause` as the error it wraps.
    pub fn with_cause(mut self, cause: ExceptionInfo) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> &MetaMap {
        &self.data
    }

    pub fn cause(&self) -> Option<&ExceptionInfo> {
        self.cause.as_deref()
    }
}
