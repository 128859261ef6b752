//! The recursive schema value.

use indexmap::IndexMap;
use refract_core::{JsonType, JsonValue};

/// Structural description of a JSON value shape.
///
/// A schema is one of:
/// - a variant set (`one_of` non-empty, nothing else populated),
/// - a scalar (`json_type` plus optional numeric bounds, `format` or enum
///   names),
/// - an array (exactly one entry in `items`, optional size bounds),
/// - a fixed message (`properties` + `required`, closed to extra keys),
/// - a map (`additional_properties` holds the value schema, no properties).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonSchema {
    pub title: String,
    pub description: String,
    pub json_type: JsonType,
    pub one_of: Vec<JsonSchema>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    /// Width annotation of numeric schemas such as `int32` or `uint64`.
    pub format: String,
    pub enums: Vec<String>,
    pub properties: IndexMap<String, JsonSchema>,
    pub required: Vec<String>,
    pub additional_properties: Option<Box<JsonSchema>>,
    pub items: Vec<JsonSchema>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub default: Option<JsonValue>,
    pub read_only: bool,
}

impl JsonSchema {
    #[must_use]
    pub fn of_type(json_type: JsonType) -> Self {
        Self {
            json_type,
            ..Self::default()
        }
    }

    /// Wildcard schema accepting any value.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn null() -> Self {
        Self::of_type(JsonType::Null)
    }

    #[must_use]
    pub fn boolean() -> Self {
        Self::of_type(JsonType::Boolean)
    }

    #[must_use]
    pub fn integer() -> Self {
        Self::of_type(JsonType::Integer)
    }

    /// Integer schema with the implicit `minimum = 0` of unsigned types.
    #[must_use]
    pub fn unsigned() -> Self {
        Self::integer().with_minimum(0.0)
    }

    #[must_use]
    pub fn number() -> Self {
        Self::of_type(JsonType::Number)
    }

    #[must_use]
    pub fn string() -> Self {
        Self::of_type(JsonType::String)
    }

    /// String schema restricted to a list of names.
    #[must_use]
    pub fn enumeration<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enums: names.into_iter().map(Into::into).collect(),
            ..Self::string()
        }
    }

    /// Array of `item` with no size bounds.
    #[must_use]
    pub fn array(item: Self) -> Self {
        Self {
            items: vec![item],
            ..Self::of_type(JsonType::Array)
        }
    }

    /// Array of exactly `size` elements of `item`.
    #[must_use]
    pub fn fixed_array(item: Self, size: usize) -> Self {
        Self {
            min_items: Some(size),
            max_items: Some(size),
            ..Self::array(item)
        }
    }

    /// Open string-keyed map whose values follow `value`.
    #[must_use]
    pub fn map(value: Self) -> Self {
        Self {
            additional_properties: Some(Box::new(value)),
            ..Self::of_type(JsonType::Object)
        }
    }

    /// Closed object with no properties yet.
    #[must_use]
    pub fn object() -> Self {
        Self::of_type(JsonType::Object)
    }

    #[must_use]
    pub fn one_of(variants: Vec<Self>) -> Self {
        Self {
            one_of: variants,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    #[must_use]
    pub fn with_maximum(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn with_item_bounds(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_items = min;
        self.max_items = max;
        self
    }

    #[must_use]
    pub fn as_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Append a property, recording it in `required` when asked.
    ///
    /// Re-adding an existing name replaces its schema in place.
    pub fn add_property(&mut self, name: impl Into<String>, schema: Self, required: bool) {
        let name = name.into();
        if required && !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, schema);
    }

    /// Drop a property and its `required` entry. Returns the removed schema.
    pub fn remove_property(&mut self, name: &str) -> Option<Self> {
        self.required.retain(|required| required != name);
        self.properties.shift_remove(name)
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.json_type == JsonType::Undefined && self.one_of.is_empty()
    }

    /// Object schema describing an open map rather than a fixed message.
    #[must_use]
    pub fn is_map(&self) -> bool {
        self.json_type == JsonType::Object && self.additional_properties.is_some()
    }

    /// The single element schema of an array, if well-formed.
    #[must_use]
    pub fn item(&self) -> Option<&Self> {
        match self.items.as_slice() {
            [item] => Some(item),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_has_zero_minimum() {
        let schema = JsonSchema::unsigned();
        assert_eq!(schema.json_type, JsonType::Integer);
        assert_eq!(schema.minimum, Some(0.0));
        assert_eq!(schema.maximum, None);
    }

    #[test]
    fn fixed_array_bounds_match_size() {
        let schema = JsonSchema::fixed_array(JsonSchema::number(), 3);
        assert_eq!(schema.min_items, Some(3));
        assert_eq!(schema.max_items, Some(3));
        assert_eq!(schema.item(), Some(&JsonSchema::number()));
    }

    #[test]
    fn map_and_message_are_distinct() {
        let map = JsonSchema::map(JsonSchema::string());
        assert!(map.is_map());
        assert!(map.properties.is_empty());

        let mut message = JsonSchema::object();
        message.add_property("name", JsonSchema::string(), true);
        assert!(!message.is_map());
        assert_eq!(message.required, ["name"]);
    }

    #[test]
    fn add_property_keeps_order_and_dedups_required() {
        let mut schema = JsonSchema::object();
        schema.add_property("b", JsonSchema::number(), true);
        schema.add_property("a", JsonSchema::number(), false);
        schema.add_property("b", JsonSchema::integer(), true);

        let names: Vec<&String> = schema.properties.keys().collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(schema.required, ["b"]);
        assert_eq!(schema.properties["b"], JsonSchema::integer());
    }

    #[test]
    fn remove_property_clears_required() {
        let mut schema = JsonSchema::object();
        schema.add_property("id", JsonSchema::unsigned(), true);
        schema.add_property("name", JsonSchema::string(), false);

        assert!(schema.remove_property("id").is_some());
        assert!(schema.required.is_empty());
        assert!(schema.remove_property("id").is_none());
        assert_eq!(schema.properties.len(), 1);
    }
}
