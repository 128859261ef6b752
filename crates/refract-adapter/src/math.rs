//! Fixed-size math types and their adapter.
//!
//! Vectors, quaternions and planes are plain arrays. They encode as JSON
//! arrays of exactly `N` elements and decode strictly: an input of any other
//! length is rejected and the target keeps its previous value.

use refract_core::{JsonType, JsonValue};
use refract_schema::JsonSchema;

use crate::adapter::JsonAdapter;
use crate::error::AdapterError;

pub type Vector2d = [f64; 2];
pub type Vector3d = [f64; 3];
pub type Vector4d = [f64; 4];
pub type Vector2i = [i32; 2];
pub type Vector3i = [i32; 3];
pub type Vector4i = [i32; 4];

/// Rotation as `[x, y, z, w]`.
pub type Quaternion = [f64; 4];

/// Plane equation coefficients `[a, b, c, d]` for `ax + by + cz + d = 0`.
pub type Plane = [f64; 4];

impl<T: JsonAdapter + Clone, const N: usize> JsonAdapter for [T; N] {
    fn schema() -> JsonSchema {
        JsonSchema::fixed_array(T::schema(), N)
    }

    fn to_json(&self) -> Result<JsonValue, AdapterError> {
        self.iter()
            .enumerate()
            .map(|(index, item)| item.to_json().map_err(|error| AdapterError::item(index, error)))
            .collect::<Result<Vec<_>, _>>()
            .map(JsonValue::Array)
    }

    fn update_from_json(&mut self, json: &JsonValue) -> Result<(), AdapterError> {
        let items = json
            .as_array()
            .ok_or_else(|| AdapterError::mismatch(JsonType::Array, json))?;
        if items.len() != N {
            return Err(AdapterError::SizeMismatch {
                expected: N,
                found: items.len(),
            });
        }

        let mut staged = self.clone();
        for (index, (slot, item)) in staged.iter_mut().zip(items).enumerate() {
            slot.update_from_json(item)
                .map_err(|error| AdapterError::item(index, error))?;
        }
        *self = staged;
        Ok(())
    }
}
