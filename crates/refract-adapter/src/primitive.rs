//! Adapters for `bool`, integers, floats and `String`.
//!
//! Numeric targets accept JSON numbers within range and strings that parse
//! as the target type. Integral floats (`3.0`) are accepted for integer
//! targets. Floats saturate on output: `±inf` becomes the type's largest
//! finite magnitude and `NaN` becomes `0`.

use std::str::FromStr;

use refract_core::{JsonType, JsonValue};
use refract_schema::JsonSchema;

use crate::adapter::JsonAdapter;
use crate::error::AdapterError;

impl JsonAdapter for bool {
    fn schema() -> JsonSchema {
        JsonSchema::boolean()
    }

    fn to_json(&self) -> Result<JsonValue, AdapterError> {
        Ok(JsonValue::Bool(*self))
    }

    fn update_from_json(&mut self, json: &JsonValue) -> Result<(), AdapterError> {
        let value = json
            .as_bool()
            .ok_or_else(|| AdapterError::mismatch(JsonType::Boolean, json))?;
        *self = value;
        Ok(())
    }
}

impl JsonAdapter for String {
    fn schema() -> JsonSchema {
        JsonSchema::string()
    }

    fn to_json(&self) -> Result<JsonValue, AdapterError> {
        Ok(JsonValue::String(self.clone()))
    }

    fn update_from_json(&mut self, json: &JsonValue) -> Result<(), AdapterError> {
        let value = json
            .as_str()
            .ok_or_else(|| AdapterError::mismatch(JsonType::String, json))?;
        value.clone_into(self);
        Ok(())
    }
}

/// Decode an integer target from a number or numeric string.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integer_from_json<T>(json: &JsonValue, target: &'static str) -> Result<T, AdapterError>
where
    T: TryFrom<i64> + TryFrom<u64> + FromStr,
{
    let out_of_range = || AdapterError::OutOfRange {
        value: json.to_string(),
        target,
    };

    match json {
        JsonValue::Number(number) => {
            if let Some(signed) = number.as_i64() {
                T::try_from(signed).map_err(|_| out_of_range())
            } else if let Some(unsigned) = number.as_u64() {
                T::try_from(unsigned).map_err(|_| out_of_range())
            } else {
                let float = number.as_f64().ok_or_else(out_of_range)?;
                if float.fract() != 0.0 || float < i64::MIN as f64 || float > i64::MAX as f64 {
                    return Err(out_of_range());
                }
                T::try_from(float as i64).map_err(|_| out_of_range())
            }
        }
        JsonValue::String(text) => text.trim().parse::<T>().map_err(|_| out_of_range()),
        other => Err(AdapterError::mismatch(JsonType::Integer, other)),
    }
}

/// Decode a float target from a number or finite numeric string.
fn float_from_json(json: &JsonValue, target: &'static str) -> Result<f64, AdapterError> {
    match json {
        JsonValue::Number(number) => number.as_f64().ok_or_else(|| AdapterError::OutOfRange {
            value: json.to_string(),
            target,
        }),
        JsonValue::String(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| AdapterError::OutOfRange {
                value: json.to_string(),
                target,
            }),
        other => Err(AdapterError::mismatch(JsonType::Number, other)),
    }
}

/// `+inf → max`, `-inf → -max`, `NaN → 0`.
fn saturate(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else if value.is_infinite() {
        value.signum() * max
    } else {
        value
    }
}

macro_rules! impl_signed {
    ($($ty:ty),+) => {$(
        impl JsonAdapter for $ty {
            fn schema() -> JsonSchema {
                JsonSchema::integer()
            }

            fn to_json(&self) -> Result<JsonValue, AdapterError> {
                Ok(JsonValue::from(*self))
            }

            fn update_from_json(&mut self, json: &JsonValue) -> Result<(), AdapterError> {
                *self = integer_from_json(json, stringify!($ty))?;
                Ok(())
            }
        }
    )+};
}

macro_rules! impl_unsigned {
    ($($ty:ty),+) => {$(
        impl JsonAdapter for $ty {
            fn schema() -> JsonSchema {
                JsonSchema::unsigned()
            }

            fn to_json(&self) -> Result<JsonValue, AdapterError> {
                Ok(JsonValue::from(*self))
            }

            fn update_from_json(&mut self, json: &JsonValue) -> Result<(), AdapterError> {
                *self = integer_from_json(json, stringify!($ty))?;
                Ok(())
            }
        }
    )+};
}

impl_signed!(i8, i16, i32, i64, isize);
impl_unsigned!(u8, u16, u32, u64, usize);

impl JsonAdapter for f64 {
    fn schema() -> JsonSchema {
        JsonSchema::number()
    }

    fn to_json(&self) -> Result<JsonValue, AdapterError> {
        Ok(JsonValue::from(saturate(*self, Self::MAX)))
    }

    fn update_from_json(&mut self, json: &JsonValue) -> Result<(), AdapterError> {
        *self = float_from_json(json, "f64")?;
        Ok(())
    }
}

impl JsonAdapter for f32 {
    fn schema() -> JsonSchema {
        JsonSchema::number()
    }

    fn to_json(&self) -> Result<JsonValue, AdapterError> {
        Ok(JsonValue::from(saturate(
            f64::from(*self),
            f64::from(Self::MAX),
        )))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn update_from_json(&mut self, json: &JsonValue) -> Result<(), AdapterError> {
        let value = float_from_json(json, "f32")?;
        if value.is_finite() && value.abs() > f64::from(Self::MAX) {
            return Err(AdapterError::OutOfRange {
                value: json.to_string(),
                target: "f32",
            });
        }
        *self = value as Self;
        Ok(())
    }
}
