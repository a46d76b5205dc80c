//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Challenge not found: {path}")]
    ChallengeNotFound { path: String },

    #[error("Invalid challenge.yaml: {message}")]
    InvalidChallenge { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field {field}: {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid slug '{slug}': {message}")]
    InvalidSlug { slug: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    FieldPath(#[from] FieldPathError),
}

/// Errors from parsing or walking a field path.
///
/// Parse-time variants carry the offending path and a byte position so
/// the caller can point at the exact spot. Walk-time variants name the
/// segment that could not be resolved against the object tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldPathError {
    #[error("field path too long ({len} chars, max {max}): {path}")]
    TooLong { path: String, len: usize, max: usize },

    #[error("field path too deep ({depth} segments, max {max}): {path}")]
    TooDeep { path: String, depth: usize, max: usize },

    #[error("unbalanced bracket at position {position} in path '{path}'")]
    UnbalancedBracket { path: String, position: usize },

    #[error("empty accessor '[]' at position {position} in path '{path}'")]
    EmptyAccessor { path: String, position: usize },

    #[error("invalid accessor '[{accessor}]' in path '{path}': expected a non-negative index or key=value filter")]
    InvalidAccessor { path: String, accessor: String },

    #[error("invalid field name '{segment}' in path '{path}': expected [A-Za-z][A-Za-z0-9]*")]
    InvalidFieldName { path: String, segment: String },

    #[error("kind {kind} does not declare status field '{field}'")]
    UnknownStatusField { kind: String, field: String },

    #[error("field not found: {segment}")]
    FieldNotFound { segment: String },

    #[error("expected an object at '{segment}'")]
    NotAnObject { segment: String },

    #[error("expected an array at '{segment}'")]
    NotAnArray { segment: String },

    #[error("index {index} out of bounds (length {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("filter did not match: no element with {key}={value}")]
    FilterNotMatched { key: String, value: String },

    #[error("non-comparable values for operator {operator}: {left} vs {right}")]
    NonComparable {
        operator: String,
        left: String,
        right: String,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
