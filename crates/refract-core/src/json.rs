//! The dynamic JSON value and its type tags.
//!
//! `JsonValue` is `serde_json::Value` built with `preserve_order`, so object
//! keys keep their insertion order. Schemas and replies rely on that for
//! stable output.

use std::fmt;

use crate::errors::CoreError;

pub type JsonValue = serde_json::Value;
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Parse JSON text into a value.
///
/// # Errors
///
/// Returns `CoreError::Parse` when the text is not valid JSON.
pub fn parse(text: &str) -> Result<JsonValue, CoreError> {
    Ok(serde_json::from_str(text)?)
}

/// Compact single-line stringification.
#[must_use]
pub fn stringify(value: &JsonValue) -> String {
    value.to_string()
}

/// Indented stringification for human consumption.
///
/// # Errors
///
/// Returns `CoreError::Parse` if the value cannot be written (not expected for
/// values built in memory).
pub fn stringify_pretty(value: &JsonValue) -> Result<String, CoreError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Short name of a value's kind, used in error messages.
#[must_use]
pub const fn kind_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// JSON type tag of a schema.
///
/// `Undefined` is the wildcard: the schema accepts any JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JsonType {
    #[default]
    Undefined,
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    /// Wire name as used by the `type` keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Inverse of [`JsonType::as_str`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "undefined" => Some(Self::Undefined),
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Number)
    }

    /// Type equality where integers are a subset of numbers.
    #[must_use]
    pub fn is_compatible(self, other: Self) -> bool {
        self == other || (self.is_numeric() && other.is_numeric())
    }

    /// Type tag of a concrete value. Integral numbers map to `Integer`.
    #[must_use]
    pub fn of(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(_) => Self::Boolean,
            JsonValue::Number(number) if number.is_f64() => Self::Number,
            JsonValue::Number(_) => Self::Integer,
            JsonValue::String(_) => Self::String,
            JsonValue::Array(_) => Self::Array,
            JsonValue::Object(_) => Self::Object,
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Borrow a value as an object or report its actual kind.
///
/// # Errors
///
/// Returns `CoreError::UnexpectedKind` for non-object values.
pub fn expect_object(value: &JsonValue) -> Result<&JsonObject, CoreError> {
    value.as_object().ok_or(CoreError::UnexpectedKind {
        expected: "object",
        found: kind_name(value),
    })
}
