//! Property map errors.

use thiserror::Error;

use super::value::PropertyKind;

#[derive(Debug, Error, PartialEq)]
pub enum PropertyError {
    #[error("Unknown property {0}")]
    Unknown(String),

    #[error("Cannot get {name} as {kind}")]
    KindMismatch { name: String, kind: PropertyKind },

    #[error("Cannot convert {0} to a property value")]
    Unconvertible(String),

    #[error("Property {0} is read-only")]
    ReadOnly(String),

    #[error("Invalid option '{value}' for {name}, expected one of {options:?}")]
    InvalidOption {
        name: String,
        value: String,
        options: Vec<String>,
    },

    #[error("Expected object, found {0}")]
    NotAnObject(&'static str),
}
