//! The adapter trait and its free-function front end.

use refract_core::JsonValue;
use refract_schema::JsonSchema;

use crate::error::AdapterError;

/// Schema, serialization and deserialization for one static type.
///
/// `update_from_json` decodes *into* an existing value: on success the value
/// is replaced, on failure it is left untouched. Containers and aggregates
/// rely on this to stage partial results and commit only on full success.
pub trait JsonAdapter: Sized {
    /// Schema describing every JSON value `to_json` can produce.
    fn schema() -> JsonSchema;

    /// Encode the current value.
    ///
    /// # Errors
    ///
    /// Returns an error when the value has no JSON representation (empty
    /// `Option`, enum value missing from its name table).
    fn to_json(&self) -> Result<JsonValue, AdapterError>;

    /// Decode `json` into `self`.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving `self` unchanged, when `json` does not
    /// have the expected shape.
    fn update_from_json(&mut self, json: &JsonValue) -> Result<(), AdapterError>;
}

#[must_use]
pub fn schema_of<T: JsonAdapter>() -> JsonSchema {
    T::schema()
}

/// Encode `value` as JSON.
///
/// # Errors
///
/// Propagates the adapter's serialization error.
pub fn serialize<T: JsonAdapter>(value: &T) -> Result<JsonValue, AdapterError> {
    value.to_json()
}

/// Decode a fresh `T` starting from its default value.
///
/// # Errors
///
/// Propagates the adapter's deserialization error.
pub fn deserialize<T: JsonAdapter + Default>(json: &JsonValue) -> Result<T, AdapterError> {
    let mut value = T::default();
    value.update_from_json(json)?;
    Ok(value)
}

/// Decode into an existing value (fields absent from `json` keep their
/// current state for messages).
///
/// # Errors
///
/// Propagates the adapter's deserialization error.
pub fn deserialize_into<T: JsonAdapter>(json: &JsonValue, value: &mut T) -> Result<(), AdapterError> {
    value.update_from_json(json)
}

/// The whole JSON document, copied verbatim. Schema is the wildcard.
impl JsonAdapter for JsonValue {
    fn schema() -> JsonSchema {
        JsonSchema::any()
    }

    fn to_json(&self) -> Result<JsonValue, AdapterError> {
        Ok(self.clone())
    }

    fn update_from_json(&mut self, json: &JsonValue) -> Result<(), AdapterError> {
        self.clone_from(json);
        Ok(())
    }
}

/// Empty payload: encodes as `null` and accepts any input.
impl JsonAdapter for () {
    fn schema() -> JsonSchema {
        JsonSchema::null()
    }

    fn to_json(&self) -> Result<JsonValue, AdapterError> {
        Ok(JsonValue::Null)
    }

    fn update_from_json(&mut self, _json: &JsonValue) -> Result<(), AdapterError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_value_is_copied_verbatim() {
        let input = json!({"free": [1, "two", null]});
        let value: JsonValue = deserialize(&input).unwrap();
        assert_eq!(value, input);
        assert_eq!(serialize(&value).unwrap(), input);
        assert!(schema_of::<JsonValue>().is_wildcard());
    }

    #[test]
    fn unit_accepts_anything() {
        assert!(deserialize::<()>(&json!({"ignored": true})).is_ok());
        assert_eq!(serialize(&()).unwrap(), JsonValue::Null);
    }
}
