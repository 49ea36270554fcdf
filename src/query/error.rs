//! Errors raised by query, grouping and helper operations.
//!
//! These are all caller-recoverable: a template that trips one of them fails
//! to render, but nothing on disk is touched.

use thiserror::Error;

/// Result type for query operations
pub type Result<T> = std::result::Result<T, QueryError>;

/// Errors produced while filtering, grouping or transforming template data
#[derive(Debug, Error)]
pub enum QueryError {
    /// The input of a collection operation is not an array
    #[error("must pass an array to '{func}'; received {kind}")]
    NotACollection { func: &'static str, kind: &'static str },

    /// A resolved value has the wrong kind for the operation
    #[error("'{func}' expected a {expected} at '{key}'; found {found}")]
    TypeMismatch {
        func: &'static str,
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The input of a mapping operation is not a mapping
    #[error("cannot call '{func}' on a non-mapping value: {kind}")]
    NotAMapping { func: &'static str, kind: &'static str },

    /// A record without a label map was passed to a label operation
    #[error("must pass an array of containers to '{func}'; received {kind}")]
    NotLabeled { func: &'static str, kind: &'static str },

    /// `dict` was called with an odd number of values
    #[error("invalid dict call: odd number of values ({0})")]
    OddArgumentCount(usize),

    /// `dict` was called with a key that is not a string
    #[error("dict keys must be strings; received {0}")]
    NonStringKey(&'static str),

    /// The pattern of a regular-expression predicate does not compile
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// JSON encoding or decoding failed
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The operation needs at least one element
    #[error("cannot call '{0}' on an empty array")]
    EmptyCollection(&'static str),

    /// A required argument was not supplied
    #[error("'{func}' requires the argument '{name}'")]
    MissingArgument { func: &'static str, name: &'static str },

    /// An argument has the wrong kind
    #[error("'{func}' expected argument '{name}' to be a {expected}; found {found}")]
    InvalidArgument {
        func: &'static str,
        name: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// A string could not be parsed as a boolean
    #[error("cannot parse '{0}' as a boolean")]
    ParseBool(String),
}
