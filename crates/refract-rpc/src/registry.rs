//! Endpoint schemas.
//!
//! Every bound method gets a [`MethodSchema`] built once at bind time from
//! its params and result schemas. The [`EndpointRegistry`] serializes it on
//! insert, keeps both forms in bind order and serves the `schema` and
//! `registry` methods.

use indexmap::IndexMap;
use refract_core::{JsonObject, JsonType, JsonValue};
use refract_schema::{JsonSchema, SchemaError};
use serde_json::json;

/// Description of one method as published to clients.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSchema {
    pub title: String,
    pub description: String,
    pub is_async: bool,
    /// `None` for methods taking no params.
    pub params: Option<JsonSchema>,
    /// `None` for methods returning nothing.
    pub returns: Option<JsonSchema>,
}

impl MethodSchema {
    #[must_use]
    pub fn new(title: &str, description: &str, params: JsonSchema, returns: JsonSchema) -> Self {
        Self {
            title: title.to_owned(),
            description: description.to_owned(),
            is_async: false,
            params: non_unit(params),
            returns: non_unit(returns),
        }
    }

    #[must_use]
    pub const fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    /// `{title, description, type: "method", async, params: [..], returns?}`.
    ///
    /// # Errors
    ///
    /// Propagates schema serialization failures.
    pub fn to_json(&self) -> Result<JsonValue, SchemaError> {
        let mut out = JsonObject::new();
        out.insert("title".into(), json!(self.title));
        out.insert("description".into(), json!(self.description));
        out.insert("type".into(), json!("method"));
        out.insert("async".into(), json!(self.is_async));
        let params = match &self.params {
            Some(schema) => vec![schema.to_json()?],
            None => Vec::new(),
        };
        out.insert("params".into(), JsonValue::Array(params));
        if let Some(returns) = &self.returns {
            out.insert("returns".into(), returns.to_json()?);
        }
        Ok(JsonValue::Object(out))
    }
}

/// Unit params and results are described by the null schema.
fn non_unit(schema: JsonSchema) -> Option<JsonSchema> {
    (schema.json_type != JsonType::Null).then_some(schema)
}

#[derive(Debug, Clone)]
struct Endpoint {
    schema: MethodSchema,
    json: JsonValue,
}

/// Ordered store of all bound method schemas.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: IndexMap<String, Endpoint>,
}

impl EndpointRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the schema of `schema.title`.
    ///
    /// # Errors
    ///
    /// Returns the serialization failure and leaves the registry unchanged
    /// when the schema cannot be published.
    pub fn insert(&mut self, schema: MethodSchema) -> Result<(), SchemaError> {
        let json = schema.to_json()?;
        self.endpoints
            .insert(schema.title.clone(), Endpoint { schema, json });
        Ok(())
    }

    /// Get a schema by name. Returns `None` if not found.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MethodSchema> {
        self.endpoints.get(name).map(|endpoint| &endpoint.schema)
    }

    /// Published form of the named schema, serialized when it was inserted.
    #[must_use]
    pub fn describe(&self, name: &str) -> Option<&JsonValue> {
        self.endpoints.get(name).map(|endpoint| &endpoint.json)
    }

    /// Validate params against the named endpoint's params schema.
    ///
    /// Methods without params accept anything.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::ValidationFailed` listing every violation.
    pub fn validate_params(&self, name: &str, params: &JsonValue) -> Result<(), SchemaError> {
        match self.get(name).and_then(|schema| schema.params.as_ref()) {
            Some(schema) => refract_schema::validate(schema, params),
            None => Ok(()),
        }
    }

    /// `[{"name": .., "async": ..}]` in bind order.
    #[must_use]
    pub fn list(&self) -> JsonValue {
        self.endpoints
            .values()
            .map(|Endpoint { schema, .. }| json!({"name": schema.title, "async": schema.is_async}))
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
