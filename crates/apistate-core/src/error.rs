use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::value::SemanticType;

/// Error type for cache, template and assertion operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Cache miss
    #[error("no value saved under cache key '{0}'")]
    NotFound(String),

    /// Cache key holds a value of another kind
    #[error("cache key '{key}' does not hold {expected}")]
    UnexpectedCacheType { key: String, expected: &'static str },

    /// Placeholder references an identifier missing from the cache
    #[error("template resolution failed: no value saved under '{0}'")]
    TemplateResolution(String),

    /// Requested semantic type is not one of nil, string, int, float, bool, map, slice
    #[error("'{0}' is unknown type, available types: nil, string, int, float, bool, map, slice")]
    UnsupportedType(String),

    /// Node was expected to be of the requested type
    #[error("node '{expression}' is {actual}, but expected to be {requested}")]
    TypeMismatch {
        expression: String,
        requested: SemanticType,
        actual: SemanticType,
    },

    /// Node was expected not to be of the requested type
    #[error("node '{expression}' is {rejected}, but expected not to be")]
    UnexpectedType {
        expression: String,
        rejected: SemanticType,
    },

    /// Node value differs from the expected literal
    #[error("node '{expression}' {semantic_type} value {actual} is not equal to expected {semantic_type} value {expected}")]
    ValueMismatch {
        expression: String,
        semantic_type: SemanticType,
        expected: String,
        actual: String,
    },

    /// Expected literal could not be parsed as the requested type
    #[error("expected value '{literal}' for node '{expression}' could not be converted to {semantic_type}")]
    InvalidLiteral {
        expression: String,
        literal: String,
        semantic_type: SemanticType,
    },

    #[error("node '{expression}' does not point at slice, it is {actual}")]
    NotASlice {
        expression: String,
        actual: SemanticType,
    },

    #[error("node '{expression}' slice has length {actual}, expected {expected}")]
    LengthMismatch {
        expression: String,
        expected: usize,
        actual: usize,
    },

    /// Path expression could not be evaluated against the document
    #[error("could not resolve node '{expression}': {reason}")]
    Resolution { expression: String, reason: String },

    /// One or more expressions of a batch failed
    #[error("{}", MultiNodeFormat(.0))]
    MultiNode(Vec<CoreError>),

    #[error("'{input}' is not a valid duration: {reason}")]
    InvalidDuration { input: String, reason: String },

    /// Cached value could not be rendered for template substitution
    #[error("cache value could not be rendered as text: {0}")]
    Render(String),

    #[error("elapsed time {elapsed:?} exceeds limit {limit:?}")]
    DurationExceeded { elapsed: Duration, limit: Duration },
}

pub type CoreResult<T> = Result<T, CoreError>;

struct MultiNodeFormat<'a>(&'a [CoreError]);

impl fmt::Display for MultiNodeFormat<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of the requested nodes failed:", self.0.len())?;
        for (i, err) in self.0.iter().enumerate() {
            write!(f, "\n  {}. {}", i + 1, err)?;
        }
        Ok(())
    }
}

impl CoreError {
    pub(crate) fn resolution(expression: &str, reason: impl Into<String>) -> Self {
        CoreError::Resolution {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    /// Per-expression failures carried by a `MultiNode` error, or the error itself.
    pub fn failures(&self) -> Vec<&CoreError> {
        match self {
            CoreError::MultiNode(errors) => errors.iter().collect(),
            other => vec![other],
        }
    }
}
