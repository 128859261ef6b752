//! Pointer-like wrappers: `Box`, `Arc` and `Option`.
//!
//! The schema is the pointee's. Decoding never writes through an existing
//! pointee: a fresh default value is decoded and then swapped in, so other
//! holders of a shared `Arc` never observe the change.

use std::sync::Arc;

use refract_core::JsonValue;
use refract_schema::JsonSchema;

use crate::adapter::JsonAdapter;
use crate::error::AdapterError;

fn decode_fresh<T: JsonAdapter + Default>(json: &JsonValue) -> Result<T, AdapterError> {
    let mut value = T::default();
    value.update_from_json(json)?;
    Ok(value)
}

impl<T: JsonAdapter + Default> JsonAdapter for Box<T> {
    fn schema() -> JsonSchema {
        T::schema()
    }

    fn to_json(&self) -> Result<JsonValue, AdapterError> {
        self.as_ref().to_json()
    }

    fn update_from_json(&mut self, json: &JsonValue) -> Result<(), AdapterError> {
        *self = Self::new(decode_fresh(json)?);
        Ok(())
    }
}

impl<T: JsonAdapter + Default> JsonAdapter for Arc<T> {
    fn schema() -> JsonSchema {
        T::schema()
    }

    fn to_json(&self) -> Result<JsonValue, AdapterError> {
        self.as_ref().to_json()
    }

    fn update_from_json(&mut self, json: &JsonValue) -> Result<(), AdapterError> {
        *self = Self::new(decode_fresh(json)?);
        Ok(())
    }
}

impl<T: JsonAdapter + Default> JsonAdapter for Option<T> {
    fn schema() -> JsonSchema {
        T::schema()
    }

    /// Fails with `AdapterError::Empty` on `None`; message serializers omit
    /// such fields.
    fn to_json(&self) -> Result<JsonValue, AdapterError> {
        self.as_ref().map_or(Err(AdapterError::Empty), T::to_json)
    }

    fn update_from_json(&mut self, json: &JsonValue) -> Result<(), AdapterError> {
        *self = Some(decode_fresh(json)?);
        Ok(())
    }
}
