//! JSON bridge for property maps.
//!
//! Property names are camelCase in memory and snake_case on the wire.
//! Decoding has two modes. With a schema hint every key must be described
//! by the hint and decode to exactly the hinted kind. Without one, each
//! value is matched against [`PropertyKind::DECODE_ORDER`] and the first
//! kind that fits wins, which is lossy (integers come back as doubles).

use refract_core::{JsonObject, JsonType, JsonValue, camel_to_snake, kind_name, snake_to_camel};
use refract_schema::JsonSchema;

use super::error::PropertyError;
use super::map::{PropertyMap, PropertyMetadata};
use super::value::{PropertyKind, PropertyValue};

/// Object schema describing every property, current values as defaults.
#[must_use]
pub fn property_map_schema(map: &PropertyMap) -> JsonSchema {
    let mut schema = JsonSchema::object();
    for (name, property) in map.iter() {
        let metadata = &property.metadata;
        let mut sub = property.kind().schema();
        sub.title.clone_from(&metadata.label);
        sub.description.clone_from(&metadata.description);
        let bounded = bounded_mut(&mut sub);
        if metadata.minimum.is_some() {
            bounded.minimum = metadata.minimum;
        }
        if metadata.maximum.is_some() {
            bounded.maximum = metadata.maximum;
        }
        if property.kind() == PropertyKind::Enum {
            sub.enums.clone_from(&metadata.options);
        }
        sub.read_only = metadata.read_only;
        sub.default = Some(property.value.to_json());
        schema.add_property(camel_to_snake(name), sub, false);
    }
    schema
}

#[must_use]
pub fn property_map_to_json(map: &PropertyMap) -> JsonValue {
    let object: JsonObject = map
        .iter()
        .map(|(name, property)| (camel_to_snake(name), property.value.to_json()))
        .collect();
    JsonValue::Object(object)
}

/// Build a new map from a JSON object.
///
/// # Errors
///
/// `NotAnObject` for non-object input. With a hint: `Unknown` for keys the
/// hint does not describe and `KindMismatch` for values of the wrong kind.
/// Without: `Unconvertible` for values no kind accepts.
pub fn property_map_from_json(
    json: &JsonValue,
    hint: Option<&JsonSchema>,
) -> Result<PropertyMap, PropertyError> {
    let object = json
        .as_object()
        .ok_or_else(|| PropertyError::NotAnObject(kind_name(json)))?;

    let mut map = PropertyMap::new();
    for (key, value) in object {
        let name = snake_to_camel(key);
        match hint {
            Some(schema) => {
                let sub = schema
                    .properties
                    .get(key)
                    .ok_or_else(|| PropertyError::Unknown(key.clone()))?;
                let kind = PropertyKind::from_schema(sub).ok_or_else(|| {
                    PropertyError::Unconvertible(key.clone())
                })?;
                let decoded = decode_exact(key, kind, value)?;
                check_option(key, &decoded, &sub.enums)?;
                map.add(name, decoded, metadata_from_schema(sub));
            }
            None => {
                let decoded = PropertyValue::guess(value)
                    .ok_or_else(|| PropertyError::Unconvertible(key.clone()))?;
                map.add(name, decoded, PropertyMetadata::default());
            }
        }
    }
    Ok(map)
}

/// Apply a JSON object to an existing map, all or nothing.
///
/// Each key must name an existing, writable property and decode to its
/// kind; enum values must be among the property's options.
///
/// # Errors
///
/// The first offending key is reported and `map` is left unchanged.
pub fn update_property_map(map: &mut PropertyMap, json: &JsonValue) -> Result<(), PropertyError> {
    let object = json
        .as_object()
        .ok_or_else(|| PropertyError::NotAnObject(kind_name(json)))?;

    let mut staged = map.clone();
    for (key, value) in object {
        let name = snake_to_camel(key);
        let property = staged
            .get(&name)
            .ok_or_else(|| PropertyError::Unknown(key.clone()))?;
        if property.metadata.read_only {
            return Err(PropertyError::ReadOnly(key.clone()));
        }

        let decoded = decode_exact(key, property.kind(), value)?;
        check_option(key, &decoded, &property.metadata.options)?;
        staged.update(&name, decoded)?;
    }

    *map = staged;
    Ok(())
}

fn decode_exact(
    key: &str,
    kind: PropertyKind,
    json: &JsonValue,
) -> Result<PropertyValue, PropertyError> {
    PropertyValue::decode(kind, json).ok_or_else(|| PropertyError::KindMismatch {
        name: key.to_owned(),
        kind,
    })
}

/// Enum values must be one of the declared options, when there are any.
fn check_option(
    key: &str,
    value: &PropertyValue,
    options: &[String],
) -> Result<(), PropertyError> {
    match value {
        PropertyValue::Enum(option) if !options.is_empty() && !options.contains(option) => {
            Err(PropertyError::InvalidOption {
                name: key.to_owned(),
                value: option.clone(),
                options: options.to_vec(),
            })
        }
        _ => Ok(()),
    }
}

/// Vector and list bounds live on the element schema.
fn bounded_mut(schema: &mut JsonSchema) -> &mut JsonSchema {
    if schema.json_type == JsonType::Array && schema.items.len() == 1 {
        &mut schema.items[0]
    } else {
        schema
    }
}

fn bounded(schema: &JsonSchema) -> &JsonSchema {
    match schema.item() {
        Some(item) if schema.json_type == JsonType::Array => item,
        _ => schema,
    }
}

fn metadata_from_schema(schema: &JsonSchema) -> PropertyMetadata {
    let bounds = bounded(schema);
    PropertyMetadata {
        label: schema.title.clone(),
        description: schema.description.clone(),
        minimum: bounds.minimum,
        maximum: bounds.maximum,
        options: schema.enums.clone(),
        read_only: schema.read_only,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn volume() -> PropertyMap {
        let mut map = PropertyMap::new();
        map.add(
            "alphaCorrection",
            0.5,
            PropertyMetadata::default().with_bounds(0.001, 1.0),
        )
        .add("samplesPerPixel", 4_u32, PropertyMetadata::new("Samples"))
        .add(
            "mode",
            PropertyValue::Enum("fast".into()),
            PropertyMetadata::default().with_options(["fast", "accurate"]),
        )
        .add("version", "2.1", PropertyMetadata::default().read_only());
        map
    }

    #[test]
    fn schema_uses_snake_case_and_current_defaults() {
        let schema = property_map_schema(&volume()).to_json().unwrap();
        assert_eq!(
            schema["properties"]["alpha_correction"],
            json!({"type": "number", "minimum": 0.001, "maximum": 1.0, "default": 0.5})
        );
        assert_eq!(
            schema["properties"]["mode"],
            json!({"type": "string", "enum": ["fast", "accurate"], "default": "fast"})
        );
        assert_eq!(schema["properties"]["version"]["readOnly"], json!(true));
        assert_eq!(schema["properties"]["samples_per_pixel"]["title"], json!("Samples"));
    }

    #[test]
    fn to_json_writes_snake_case_keys() {
        assert_eq!(
            property_map_to_json(&volume()),
            json!({
                "alpha_correction": 0.5,
                "samples_per_pixel": 4,
                "mode": "fast",
                "version": "2.1"
            })
        );
    }

    #[test]
    fn hinted_decode_restores_kinds() {
        let original = volume();
        let schema = property_map_schema(&original);
        let decoded =
            property_map_from_json(&property_map_to_json(&original), Some(&schema)).unwrap();

        assert_eq!(decoded.get_as::<u32>("samplesPerPixel").unwrap(), 4);
        assert_eq!(decoded.get("mode").unwrap().value, PropertyValue::Enum("fast".into()));
        assert_eq!(decoded.get("alphaCorrection").unwrap().metadata.maximum, Some(1.0));
        assert!(decoded.get("version").unwrap().metadata.read_only);
    }

    #[test]
    fn hinted_decode_keeps_integer_kinds() {
        let mut map = PropertyMap::new();
        map.add(
            "maxRayDepth",
            3_i32,
            PropertyMetadata::default().with_bounds(1.0, 32.0),
        )
        .add("frameCount", 12_u32, PropertyMetadata::default().with_bounds(0.0, 100.0))
        .add("seed", 7_u64, PropertyMetadata::default().with_bounds(0.0, 1e12))
        .add("offset", -2_i32, PropertyMetadata::default());
        let schema = property_map_schema(&map);

        let wire = JsonSchema::from_json(&schema.to_json().unwrap()).unwrap();
        let decoded = property_map_from_json(&property_map_to_json(&map), Some(&wire)).unwrap();
        assert_eq!(decoded.get("maxRayDepth").unwrap().value, PropertyValue::Int(3));
        assert_eq!(decoded.get("frameCount").unwrap().value, PropertyValue::UInt(12));
        assert_eq!(decoded.get("seed").unwrap().value, PropertyValue::UInt64(7));
        assert_eq!(decoded.get("offset").unwrap().value, PropertyValue::Int(-2));
        assert_eq!(decoded.get("maxRayDepth").unwrap().metadata.maximum, Some(32.0));
    }

    #[test]
    fn hinted_decode_rejects_unknown_options() {
        let schema = property_map_schema(&volume());
        let err = property_map_from_json(&json!({"mode": "bogus"}), Some(&schema)).unwrap_err();
        assert_eq!(
            err,
            PropertyError::InvalidOption {
                name: "mode".into(),
                value: "bogus".into(),
                options: vec!["fast".into(), "accurate".into()],
            }
        );

        let decoded = property_map_from_json(&json!({"mode": "accurate"}), Some(&schema)).unwrap();
        assert_eq!(decoded.get("mode").unwrap().value, PropertyValue::Enum("accurate".into()));
    }

    #[test]
    fn vector_bounds_apply_to_elements() {
        let mut map = PropertyMap::new();
        map.add(
            "backgroundColor",
            [0.0, 0.0, 0.0],
            PropertyMetadata::new("Background").with_bounds(0.0, 1.0),
        )
        .add("weights", vec![1_i32, 2], PropertyMetadata::default().with_bounds(-5.0, 5.0));
        let schema = property_map_schema(&map);
        let json = schema.to_json().unwrap();
        assert_eq!(
            json["properties"]["background_color"],
            json!({
                "title": "Background",
                "type": "array",
                "items": {"type": "number", "minimum": 0.0, "maximum": 1.0},
                "minItems": 3,
                "maxItems": 3,
                "default": [0.0, 0.0, 0.0]
            })
        );
        assert_eq!(json["properties"]["weights"]["items"]["minimum"], json!(-5));
        assert!(refract_schema::validate(&schema, &json!({"background_color": [0.5, 2.0, 0.0]})).is_err());

        let decoded = property_map_from_json(&property_map_to_json(&map), Some(&schema)).unwrap();
        assert_eq!(decoded.get("backgroundColor").unwrap().metadata.maximum, Some(1.0));
    }

    #[test]
    fn hinted_decode_reports_wrong_kind_and_unknown_key() {
        let schema = property_map_schema(&volume());
        assert_eq!(
            property_map_from_json(&json!({"samples_per_pixel": "four"}), Some(&schema))
                .unwrap_err()
                .to_string(),
            "Cannot get samples_per_pixel as uint"
        );
        assert_eq!(
            property_map_from_json(&json!({"gamma": 2.2}), Some(&schema))
                .unwrap_err()
                .to_string(),
            "Unknown property gamma"
        );
    }

    #[test]
    fn unhinted_decode_is_best_effort() {
        let map = property_map_from_json(
            &json!({"max_ray_depth": 3, "background_color": [1, 1, 1], "tags": ["a"]}),
            None,
        )
        .unwrap();
        assert_eq!(map.get_as::<f64>("maxRayDepth").unwrap(), 3.0);
        assert_eq!(map.get_as::<[f64; 3]>("backgroundColor").unwrap(), [1.0, 1.0, 1.0]);
        assert_eq!(map.get_as::<Vec<String>>("tags").unwrap(), ["a"]);

        assert!(property_map_from_json(&json!({"nested": {}}), None).is_err());
        assert!(property_map_from_json(&json!([1]), None).is_err());
    }

    #[test]
    fn update_is_all_or_nothing() {
        let mut map = volume();
        let err = update_property_map(
            &mut map,
            &json!({"alpha_correction": 0.25, "samples_per_pixel": -1}),
        )
        .unwrap_err();
        assert!(matches!(err, PropertyError::KindMismatch { .. }));
        assert_eq!(map, volume());

        update_property_map(&mut map, &json!({"alpha_correction": 0.25, "mode": "accurate"}))
            .unwrap();
        assert_eq!(map.get_as::<f64>("alphaCorrection").unwrap(), 0.25);
    }

    #[test]
    fn update_rejects_read_only_unknown_and_bad_options() {
        let mut map = volume();
        assert!(matches!(
            update_property_map(&mut map, &json!({"version": "3.0"})),
            Err(PropertyError::ReadOnly(_))
        ));
        assert!(matches!(
            update_property_map(&mut map, &json!({"quality": 1})),
            Err(PropertyError::Unknown(_))
        ));
        assert!(matches!(
            update_property_map(&mut map, &json!({"mode": "slow"})),
            Err(PropertyError::InvalidOption { .. })
        ));
        assert_eq!(map, volume());
    }
}
