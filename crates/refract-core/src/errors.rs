//! Cross-cutting error types for refract.
//!
//! Domain-specific errors (`SchemaError`, `AdapterError`, `RpcError`) live in
//! their respective crates. The binary converges everything into `anyhow`.

use thiserror::Error;

/// Errors that can be raised while handling raw JSON text.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input text is not valid JSON.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A JSON value had a different kind than the caller required.
    #[error("Expected {expected}, found {found}")]
    UnexpectedKind {
        expected: &'static str,
        found: &'static str,
    },
}
