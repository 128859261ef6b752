//! Validation of JSON instances against a [`JsonSchema`].
//!
//! The schema is serialized with [`JsonSchema::to_json`] and compiled by the
//! `jsonschema` crate, so validation sees exactly what clients see.

use refract_core::JsonValue;

use crate::error::SchemaError;
use crate::schema::JsonSchema;

/// Validate `instance` against `schema`.
///
/// # Errors
///
/// Returns `SchemaError::ValidationFailed` listing every violation, or a
/// codec/compilation error if the schema itself cannot be used.
pub fn validate(schema: &JsonSchema, instance: &JsonValue) -> Result<(), SchemaError> {
    let document = schema.to_json()?;
    let validator = jsonschema::validator_for(&document)
        .map_err(|error| SchemaError::Compilation(format!("{error}")))?;

    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|error| format!("{error}"))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::ValidationFailed { errors })
    }
}

/// Convenience predicate over [`validate`]. Unusable schemas count as invalid.
#[must_use]
pub fn is_valid(schema: &JsonSchema, instance: &JsonValue) -> bool {
    validate(schema, instance).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn camera_schema() -> JsonSchema {
        let mut schema = JsonSchema::object().with_title("Camera");
        schema.add_property("current", JsonSchema::string(), true);
        schema.add_property(
            "position",
            JsonSchema::fixed_array(JsonSchema::number(), 3),
            false,
        );
        schema
    }

    #[test]
    fn accepts_matching_instance() {
        let instance = json!({"current": "perspective", "position": [0, 0, 1]});
        assert!(validate(&camera_schema(), &instance).is_ok());
    }

    #[test]
    fn rejects_missing_required_field() {
        let result = validate(&camera_schema(), &json!({"position": [0, 0, 1]}));
        if let Err(SchemaError::ValidationFailed { errors }) = result {
            assert!(!errors.is_empty());
        } else {
            panic!("Expected ValidationFailed");
        }
    }

    #[test]
    fn rejects_wrong_array_size_and_extra_keys() {
        let instance = json!({"current": "orthographic", "position": [0, 1], "zoom": 2});
        let Err(SchemaError::ValidationFailed { errors }) = validate(&camera_schema(), &instance)
        else {
            panic!("Expected ValidationFailed");
        };
        assert_eq!(errors.len(), 2, "{errors:?}");
    }

    #[test]
    fn enum_and_bounds_are_enforced() {
        let shading = JsonSchema::enumeration(["none", "diffuse"]);
        assert!(is_valid(&shading, &json!("diffuse")));
        assert!(!is_valid(&shading, &json!("bogus")));

        let unsigned = JsonSchema::unsigned();
        assert!(is_valid(&unsigned, &json!(3)));
        assert!(!is_valid(&unsigned, &json!(-1)));
    }

    #[test]
    fn wildcard_accepts_anything() {
        assert!(is_valid(&JsonSchema::any(), &json!({"free": ["form", 1]})));
        assert!(is_valid(&JsonSchema::any(), &json!(null)));
    }

    #[test]
    fn broken_schema_is_reported_not_panicking() {
        let broken = JsonSchema::of_type(refract_core::JsonType::Array);
        assert!(matches!(
            validate(&broken, &json!([])),
            Err(SchemaError::MissingItems { .. })
        ));
    }
}
