//! Error types for document extraction and entity tracking.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while reading documents or mutating entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The response body is not well-formed XML.
    #[error("document parse error: {0}")]
    Parse(String),

    /// A locator expression could not be parsed.
    #[error("invalid locator {locator:?}: {reason}")]
    InvalidLocator { locator: String, reason: String },

    /// A locator uses a prefix missing from the namespace table.
    #[error("unknown namespace prefix: {0}")]
    UnknownPrefix(String),

    /// A single-valued attribute matched more than one node.
    #[error("attribute {attribute} matched {matches} nodes")]
    AmbiguousMatch { attribute: String, matches: usize },

    /// Node text could not be coerced to the declared type.
    #[error("malformed value for {attribute}: {reason}")]
    MalformedValue { attribute: String, reason: String },

    /// The attribute is not declared by the entity's schema.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    /// A value of the wrong type was assigned to an attribute.
    #[error("attribute {attribute} expects {expected}, got {actual}")]
    TypeMismatch {
        attribute: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// The document does not contain the expected entity element.
    #[error("missing element: {0}")]
    MissingElement(String),

    /// An entity failed its kind's validation hook.
    #[error("validation failed: {0}")]
    Validation(String),
}
