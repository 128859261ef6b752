//! Adapter error types.

use refract_core::JsonType;
use thiserror::Error;

/// Why a value could not be converted to or from JSON.
///
/// Whenever an adapter returns one of these, the value it was asked to
/// update is left exactly as it was.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Expected {expected}, found {found}")]
    TypeMismatch {
        expected: JsonType,
        found: &'static str,
    },

    #[error("Value {value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("Unknown {enum_name} name '{name}'")]
    UnknownEnumName {
        enum_name: &'static str,
        name: String,
    },

    #[error("Value of {enum_name} has no registered name")]
    UnregisteredEnumValue { enum_name: &'static str },

    #[error("Expected {expected} items, found {found}")]
    SizeMismatch { expected: usize, found: usize },

    #[error("Item {index}: {source}")]
    Item {
        index: usize,
        #[source]
        source: Box<AdapterError>,
    },

    #[error("Key '{key}': {source}")]
    Entry {
        key: String,
        #[source]
        source: Box<AdapterError>,
    },

    #[error("Field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<AdapterError>,
    },

    /// Serializing an empty `Option`.
    #[error("Cannot serialize an empty value")]
    Empty,
}

impl AdapterError {
    pub(crate) fn mismatch(expected: JsonType, found: &serde_json::Value) -> Self {
        Self::TypeMismatch {
            expected,
            found: refract_core::kind_name(found),
        }
    }

    pub(crate) fn item(index: usize, source: Self) -> Self {
        Self::Item {
            index,
            source: Box::new(source),
        }
    }

    pub(crate) fn entry(key: &str, source: Self) -> Self {
        Self::Entry {
            key: key.to_owned(),
            source: Box::new(source),
        }
    }
}
