//! Enums encoded as strings through a static name ↔ value table.
//!
//! ```
//! use refract_adapter::{json_enum, serialize};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Shading {
//!     None = 0,
//!     Diffuse = 1,
//!     Electron = 2,
//! }
//!
//! json_enum!(Shading {
//!     "none" => Shading::None,
//!     "diffuse" => Shading::Diffuse,
//!     "electron" => Shading::Electron,
//! });
//!
//! assert_eq!(serialize(&Shading::Diffuse).unwrap(), "diffuse");
//! ```
//!
//! Values missing from the table cannot be serialized and unknown names
//! cannot be deserialized; both fail without touching the output.

use refract_core::{JsonType, JsonValue};
use refract_schema::JsonSchema;

use crate::error::AdapterError;

/// A type with a static name table. Implemented by [`json_enum!`](crate::json_enum).
pub trait JsonEnum: Copy + PartialEq + 'static {
    /// Type name used in error messages.
    const NAME: &'static str;

    /// Ordered `(name, value)` pairs.
    fn variants() -> &'static [(&'static str, Self)];
}

/// Name registered for `value`, if any.
#[must_use]
pub fn enum_name_of<T: JsonEnum>(value: T) -> Option<&'static str> {
    T::variants()
        .iter()
        .find(|(_, candidate)| *candidate == value)
        .map(|(name, _)| *name)
}

/// Value registered under `name`, if any.
#[must_use]
pub fn enum_value_of<T: JsonEnum>(name: &str) -> Option<T> {
    T::variants()
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, value)| *value)
}

#[must_use]
pub fn enum_names<T: JsonEnum>() -> Vec<&'static str> {
    T::variants().iter().map(|(name, _)| *name).collect()
}

#[must_use]
pub fn enum_schema<T: JsonEnum>() -> JsonSchema {
    JsonSchema::enumeration(enum_names::<T>())
}

/// # Errors
///
/// `AdapterError::UnregisteredEnumValue` when `value` is not in the table.
pub fn enum_to_json<T: JsonEnum>(value: T) -> Result<JsonValue, AdapterError> {
    enum_name_of(value)
        .map(|name| JsonValue::String(name.to_owned()))
        .ok_or(AdapterError::UnregisteredEnumValue { enum_name: T::NAME })
}

/// # Errors
///
/// `AdapterError::TypeMismatch` for non-strings, `UnknownEnumName` for
/// names outside the table.
pub fn enum_from_json<T: JsonEnum>(json: &JsonValue, value: &mut T) -> Result<(), AdapterError> {
    let name = json
        .as_str()
        .ok_or_else(|| AdapterError::mismatch(JsonType::String, json))?;
    *value = enum_value_of(name).ok_or_else(|| AdapterError::UnknownEnumName {
        enum_name: T::NAME,
        name: name.to_owned(),
    })?;
    Ok(())
}

/// Declare the name table of an enum and implement [`JsonAdapter`](crate::JsonAdapter) for it.
#[macro_export]
macro_rules! json_enum {
    ($ty:ident { $($name:literal => $value:expr),+ $(,)? }) => {
        impl $crate::enums::JsonEnum for $ty {
            const NAME: &'static str = stringify!($ty);

            fn variants() -> &'static [(&'static str, Self)] {
                &[$(($name, $value)),+]
            }
        }

        impl $crate::JsonAdapter for $ty {
            fn schema() -> $crate::JsonSchema {
                $crate::enums::enum_schema::<Self>()
            }

            fn to_json(&self) -> ::core::result::Result<$crate::JsonValue, $crate::AdapterError> {
                $crate::enums::enum_to_json(*self)
            }

            fn update_from_json(
                &mut self,
                json: &$crate::JsonValue,
            ) -> ::core::result::Result<(), $crate::AdapterError> {
                $crate::enums::enum_from_json(json, self)
            }
        }
    };
}
