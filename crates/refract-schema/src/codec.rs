//! Schema ↔ JSON wire representation.
//!
//! Serialization picks the first matching shape; keywords belonging to lower
//! priority shapes are not emitted:
//!
//! ```text
//! oneOf  >  numeric bounds  >  enum  >  array  >  object  >  plain type
//! ```
//!
//! `title`, `description`, `default` and `readOnly` are annotations and are
//! written for every shape when set.

use indexmap::IndexMap;
use refract_core::{JsonObject, JsonType, JsonValue, kind_name};
use serde_json::json;

use crate::error::SchemaError;
use crate::schema::JsonSchema;

impl JsonSchema {
    /// Serialize to the JSON Schema keyword subset understood by clients.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::MissingItems` when an array schema (at any
    /// depth) does not carry exactly one item schema.
    pub fn to_json(&self) -> Result<JsonValue, SchemaError> {
        let mut out = JsonObject::new();
        if !self.title.is_empty() {
            out.insert("title".into(), json!(self.title));
        }
        if !self.description.is_empty() {
            out.insert("description".into(), json!(self.description));
        }

        if !self.one_of.is_empty() {
            let variants = self
                .one_of
                .iter()
                .map(Self::to_json)
                .collect::<Result<Vec<_>, _>>()?;
            out.insert("oneOf".into(), JsonValue::Array(variants));
        } else if self.json_type.is_numeric() {
            out.insert("type".into(), json!(self.json_type.as_str()));
            if let Some(minimum) = self.minimum {
                out.insert("minimum".into(), bound_value(self.json_type, minimum));
            }
            if let Some(maximum) = self.maximum {
                out.insert("maximum".into(), bound_value(self.json_type, maximum));
            }
            if !self.format.is_empty() {
                out.insert("format".into(), json!(self.format));
            }
        } else if !self.enums.is_empty() {
            out.insert("type".into(), json!(JsonType::String.as_str()));
            out.insert("enum".into(), json!(self.enums));
        } else if self.json_type == JsonType::Array {
            let item = self.item().ok_or_else(|| SchemaError::MissingItems {
                title: self.title.clone(),
                count: self.items.len(),
            })?;
            out.insert("type".into(), json!("array"));
            if !item.is_wildcard() {
                out.insert("items".into(), item.to_json()?);
            }
            if let Some(min_items) = self.min_items {
                out.insert("minItems".into(), json!(min_items));
            }
            if let Some(max_items) = self.max_items {
                out.insert("maxItems".into(), json!(max_items));
            }
        } else if self.json_type == JsonType::Object {
            out.insert("type".into(), json!("object"));
            if let Some(value) = &self.additional_properties {
                out.insert("additionalProperties".into(), value.to_json()?);
            } else {
                let mut properties = JsonObject::new();
                for (name, schema) in &self.properties {
                    properties.insert(name.clone(), schema.to_json()?);
                }
                out.insert("properties".into(), JsonValue::Object(properties));
                if !self.required.is_empty() {
                    out.insert("required".into(), json!(self.required));
                }
                out.insert("additionalProperties".into(), json!(false));
            }
        } else if self.json_type != JsonType::Undefined {
            out.insert("type".into(), json!(self.json_type.as_str()));
        }

        if let Some(default) = &self.default {
            out.insert("default".into(), default.clone());
        }
        if self.read_only {
            out.insert("readOnly".into(), json!(true));
        }
        Ok(JsonValue::Object(out))
    }

    /// Rebuild a schema from its wire representation.
    ///
    /// `additionalProperties: true` is read back as a map of wildcards.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Malformed` for non-object documents or keywords
    /// of the wrong kind, and `SchemaError::UnknownType` for unsupported
    /// `type` names.
    pub fn from_json(json: &JsonValue) -> Result<Self, SchemaError> {
        let object = json.as_object().ok_or_else(|| {
            SchemaError::Malformed(format!("expected object, found {}", kind_name(json)))
        })?;

        let mut schema = Self {
            title: string_field(object, "title")?,
            description: string_field(object, "description")?,
            default: object.get("default").cloned(),
            read_only: object
                .get("readOnly")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false),
            ..Self::default()
        };

        if let Some(type_name) = object.get("type") {
            let name = type_name.as_str().ok_or_else(|| {
                SchemaError::Malformed(format!("'type' must be a string, found {type_name}"))
            })?;
            schema.json_type =
                JsonType::from_name(name).ok_or_else(|| SchemaError::UnknownType(name.into()))?;
        }

        if let Some(variants) = object.get("oneOf") {
            schema.one_of = array_field(variants, "oneOf")?
                .iter()
                .map(Self::from_json)
                .collect::<Result<_, _>>()?;
        }

        schema.minimum = number_field(object, "minimum")?;
        schema.maximum = number_field(object, "maximum")?;
        schema.format = string_field(object, "format")?;

        if let Some(names) = object.get("enum") {
            schema.enums = array_field(names, "enum")?
                .iter()
                .map(|name| {
                    name.as_str().map(str::to_owned).ok_or_else(|| {
                        SchemaError::Malformed(format!("enum entries must be strings: {name}"))
                    })
                })
                .collect::<Result<_, _>>()?;
            if schema.json_type == JsonType::Undefined {
                schema.json_type = JsonType::String;
            }
        }

        if schema.json_type == JsonType::Array {
            schema.items = match object.get("items") {
                Some(item) => vec![Self::from_json(item)?],
                None => vec![Self::any()],
            };
            schema.min_items = count_field(object, "minItems")?;
            schema.max_items = count_field(object, "maxItems")?;
        }

        if let Some(properties) = object.get("properties") {
            let properties = properties.as_object().ok_or_else(|| {
                SchemaError::Malformed("'properties' must be an object".into())
            })?;
            let mut parsed = IndexMap::with_capacity(properties.len());
            for (name, property) in properties {
                parsed.insert(name.clone(), Self::from_json(property)?);
            }
            schema.properties = parsed;
        }

        if let Some(required) = object.get("required") {
            schema.required = array_field(required, "required")?
                .iter()
                .filter_map(|name| name.as_str().map(str::to_owned))
                .collect();
        }

        schema.additional_properties = match object.get("additionalProperties") {
            None | Some(JsonValue::Bool(false)) => None,
            Some(JsonValue::Bool(true)) => Some(Box::new(Self::any())),
            Some(value) => Some(Box::new(Self::from_json(value)?)),
        };

        Ok(schema)
    }
}

/// Integer schemas keep integral bounds as JSON integers.
#[allow(clippy::cast_possible_truncation)]
fn bound_value(json_type: JsonType, bound: f64) -> JsonValue {
    if json_type == JsonType::Integer
        && bound.fract() == 0.0
        && bound >= i64::MIN as f64
        && bound <= i64::MAX as f64
    {
        json!(bound as i64)
    } else {
        json!(bound)
    }
}

fn string_field(object: &JsonObject, key: &str) -> Result<String, SchemaError> {
    match object.get(key) {
        None => Ok(String::new()),
        Some(JsonValue::String(value)) => Ok(value.clone()),
        Some(other) => Err(SchemaError::Malformed(format!(
            "'{key}' must be a string, found {}",
            kind_name(other)
        ))),
    }
}

fn number_field(object: &JsonObject, key: &str) -> Result<Option<f64>, SchemaError> {
    object
        .get(key)
        .map(|value| {
            value.as_f64().ok_or_else(|| {
                SchemaError::Malformed(format!(
                    "'{key}' must be a number, found {}",
                    kind_name(value)
                ))
            })
        })
        .transpose()
}

fn count_field(object: &JsonObject, key: &str) -> Result<Option<usize>, SchemaError> {
    object
        .get(key)
        .map(|value| {
            value
                .as_u64()
                .and_then(|count| usize::try_from(count).ok())
                .ok_or_else(|| {
                    SchemaError::Malformed(format!("'{key}' must be a non-negative integer"))
                })
        })
        .transpose()
}

fn array_field<'a>(value: &'a JsonValue, key: &str) -> Result<&'a Vec<JsonValue>, SchemaError> {
    value.as_array().ok_or_else(|| {
        SchemaError::Malformed(format!(
            "'{key}' must be an array, found {}",
            kind_name(value)
        ))
    })
}
