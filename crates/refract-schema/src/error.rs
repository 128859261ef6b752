//! Schema codec and validation error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    /// An array schema must carry exactly one item schema.
    #[error("Array schema '{title}' must have exactly one item schema, found {count}")]
    MissingItems { title: String, count: usize },

    /// The `type` keyword named a type outside the supported set.
    #[error("Unknown schema type: {0}")]
    UnknownType(String),

    /// The schema document had an unexpected shape.
    #[error("Malformed schema: {0}")]
    Malformed(String),

    /// JSON value did not pass schema validation.
    #[error("Validation failed: {errors:?}")]
    ValidationFailed {
        /// Individual error messages from the validator.
        errors: Vec<String>,
    },

    /// The serialized schema could not be compiled into a validator.
    #[error("Schema compilation error: {0}")]
    Compilation(String),
}
