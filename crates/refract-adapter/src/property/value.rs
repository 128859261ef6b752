//! Runtime-typed property values.

use std::fmt;

use refract_core::{JsonType, JsonValue};
use refract_schema::JsonSchema;

/// The closed set of kinds a property can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Double,
    Int,
    UInt,
    UInt64,
    Bool,
    String,
    Enum,
    Vec2d,
    Vec2i,
    Vec3d,
    Vec3i,
    Vec4d,
    Vec4i,
    Doubles,
    Ints,
    Strings,
}

impl PropertyKind {
    /// Kinds tried, in order, when decoding JSON without a schema. `Enum` is
    /// absent: without options an enum is indistinguishable from a string.
    pub const DECODE_ORDER: [Self; 15] = [
        Self::Double,
        Self::Int,
        Self::UInt,
        Self::UInt64,
        Self::String,
        Self::Bool,
        Self::Vec2d,
        Self::Vec2i,
        Self::Vec3d,
        Self::Vec3i,
        Self::Vec4d,
        Self::Vec4i,
        Self::Doubles,
        Self::Ints,
        Self::Strings,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::UInt64 => "uint64",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Enum => "enum",
            Self::Vec2d => "vec2d",
            Self::Vec2i => "vec2i",
            Self::Vec3d => "vec3d",
            Self::Vec3i => "vec3i",
            Self::Vec4d => "vec4d",
            Self::Vec4i => "vec4i",
            Self::Doubles => "double list",
            Self::Ints => "int list",
            Self::Strings => "string list",
        }
    }

    /// Base schema for this kind, before property metadata is applied.
    #[must_use]
    pub fn schema(self) -> JsonSchema {
        match self {
            Self::Double => JsonSchema::number(),
            Self::Int => JsonSchema::integer().with_format(INT_FORMAT),
            Self::UInt => JsonSchema::unsigned()
                .with_maximum(f64::from(u32::MAX))
                .with_format(UINT_FORMAT),
            Self::UInt64 => JsonSchema::unsigned().with_format(UINT64_FORMAT),
            Self::Bool => JsonSchema::boolean(),
            Self::String => JsonSchema::string(),
            Self::Enum => JsonSchema::enumeration(Vec::<String>::new()),
            Self::Vec2d => JsonSchema::fixed_array(JsonSchema::number(), 2),
            Self::Vec2i => JsonSchema::fixed_array(JsonSchema::integer(), 2),
            Self::Vec3d => JsonSchema::fixed_array(JsonSchema::number(), 3),
            Self::Vec3i => JsonSchema::fixed_array(JsonSchema::integer(), 3),
            Self::Vec4d => JsonSchema::fixed_array(JsonSchema::number(), 4),
            Self::Vec4i => JsonSchema::fixed_array(JsonSchema::integer(), 4),
            Self::Doubles => JsonSchema::array(JsonSchema::number()),
            Self::Ints => JsonSchema::array(JsonSchema::integer()),
            Self::Strings => JsonSchema::array(JsonSchema::string()),
        }
    }

    /// Recover the kind a schema describes.
    ///
    /// Integer schemas are told apart by their `format`. Without one the
    /// bounds decide: non-negative with a maximum within `u32` is `UInt`,
    /// non-negative and unbounded above is `UInt64`, anything else is `Int`.
    #[must_use]
    pub fn from_schema(schema: &JsonSchema) -> Option<Self> {
        if !schema.enums.is_empty() {
            return Some(Self::Enum);
        }
        match schema.json_type {
            JsonType::Number => Some(Self::Double),
            JsonType::Integer => Some(integer_kind(schema)),
            JsonType::Boolean => Some(Self::Bool),
            JsonType::String => Some(Self::String),
            JsonType::Array => array_kind(schema),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const INT_FORMAT: &str = "int32";
const UINT_FORMAT: &str = "uint32";
const UINT64_FORMAT: &str = "uint64";

fn integer_kind(schema: &JsonSchema) -> PropertyKind {
    match schema.format.as_str() {
        INT_FORMAT => return PropertyKind::Int,
        UINT_FORMAT => return PropertyKind::UInt,
        UINT64_FORMAT => return PropertyKind::UInt64,
        _ => {}
    }
    match (schema.minimum, schema.maximum) {
        (Some(min), Some(max)) if min >= 0.0 && max <= f64::from(u32::MAX) => PropertyKind::UInt,
        (Some(min), None) if min >= 0.0 => PropertyKind::UInt64,
        _ => PropertyKind::Int,
    }
}

fn array_kind(schema: &JsonSchema) -> Option<PropertyKind> {
    let item = schema.item()?.json_type;
    let fixed = match (schema.min_items, schema.max_items) {
        (Some(min), Some(max)) if min == max => Some(min),
        _ => None,
    };
    let kind = match (item, fixed) {
        (JsonType::Number, Some(2)) => PropertyKind::Vec2d,
        (JsonType::Integer, Some(2)) => PropertyKind::Vec2i,
        (JsonType::Number, Some(3)) => PropertyKind::Vec3d,
        (JsonType::Integer, Some(3)) => PropertyKind::Vec3i,
        (JsonType::Number, Some(4)) => PropertyKind::Vec4d,
        (JsonType::Integer, Some(4)) => PropertyKind::Vec4i,
        (JsonType::Number, _) => PropertyKind::Doubles,
        (JsonType::Integer, _) => PropertyKind::Ints,
        (JsonType::String, _) => PropertyKind::Strings,
        _ => return None,
    };
    Some(kind)
}

/// A property value. Enums hold the selected option name.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Double(f64),
    Int(i32),
    UInt(u32),
    UInt64(u64),
    Bool(bool),
    String(String),
    Enum(String),
    Vec2d([f64; 2]),
    Vec2i([i32; 2]),
    Vec3d([f64; 3]),
    Vec3i([i32; 3]),
    Vec4d([f64; 4]),
    Vec4i([i32; 4]),
    Doubles(Vec<f64>),
    Ints(Vec<i32>),
    Strings(Vec<String>),
}

impl PropertyValue {
    #[must_use]
    pub const fn kind(&self) -> PropertyKind {
        match self {
            Self::Double(_) => PropertyKind::Double,
            Self::Int(_) => PropertyKind::Int,
            Self::UInt(_) => PropertyKind::UInt,
            Self::UInt64(_) => PropertyKind::UInt64,
            Self::Bool(_) => PropertyKind::Bool,
            Self::String(_) => PropertyKind::String,
            Self::Enum(_) => PropertyKind::Enum,
            Self::Vec2d(_) => PropertyKind::Vec2d,
            Self::Vec2i(_) => PropertyKind::Vec2i,
            Self::Vec3d(_) => PropertyKind::Vec3d,
            Self::Vec3i(_) => PropertyKind::Vec3i,
            Self::Vec4d(_) => PropertyKind::Vec4d,
            Self::Vec4i(_) => PropertyKind::Vec4i,
            Self::Doubles(_) => PropertyKind::Doubles,
            Self::Ints(_) => PropertyKind::Ints,
            Self::Strings(_) => PropertyKind::Strings,
        }
    }

    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Double(value) => JsonValue::from(*value),
            Self::Int(value) => JsonValue::from(*value),
            Self::UInt(value) => JsonValue::from(*value),
            Self::UInt64(value) => JsonValue::from(*value),
            Self::Bool(value) => JsonValue::Bool(*value),
            Self::String(value) | Self::Enum(value) => JsonValue::String(value.clone()),
            Self::Vec2d(values) => JsonValue::from(values.to_vec()),
            Self::Vec2i(values) => JsonValue::from(values.to_vec()),
            Self::Vec3d(values) => JsonValue::from(values.to_vec()),
            Self::Vec3i(values) => JsonValue::from(values.to_vec()),
            Self::Vec4d(values) => JsonValue::from(values.to_vec()),
            Self::Vec4i(values) => JsonValue::from(values.to_vec()),
            Self::Doubles(values) => JsonValue::from(values.clone()),
            Self::Ints(values) => JsonValue::from(values.clone()),
            Self::Strings(values) => JsonValue::from(values.clone()),
        }
    }

    /// Decode `json` as exactly `kind`. No coercion: strings never become
    /// numbers, doubles never become integers.
    #[must_use]
    pub fn decode(kind: PropertyKind, json: &JsonValue) -> Option<Self> {
        let value = match kind {
            PropertyKind::Double => Self::Double(as_double(json)?),
            PropertyKind::Int => Self::Int(as_int(json)?),
            PropertyKind::UInt => Self::UInt(u32::try_from(json.as_u64()?).ok()?),
            PropertyKind::UInt64 => Self::UInt64(json.as_u64()?),
            PropertyKind::Bool => Self::Bool(json.as_bool()?),
            PropertyKind::String => Self::String(json.as_str()?.to_owned()),
            PropertyKind::Enum => Self::Enum(json.as_str()?.to_owned()),
            PropertyKind::Vec2d => Self::Vec2d(fixed(json, as_double)?),
            PropertyKind::Vec2i => Self::Vec2i(fixed(json, as_int)?),
            PropertyKind::Vec3d => Self::Vec3d(fixed(json, as_double)?),
            PropertyKind::Vec3i => Self::Vec3i(fixed(json, as_int)?),
            PropertyKind::Vec4d => Self::Vec4d(fixed(json, as_double)?),
            PropertyKind::Vec4i => Self::Vec4i(fixed(json, as_int)?),
            PropertyKind::Doubles => Self::Doubles(list(json, as_double)?),
            PropertyKind::Ints => Self::Ints(list(json, as_int)?),
            PropertyKind::Strings => {
                Self::Strings(list(json, |item| item.as_str().map(str::to_owned))?)
            }
        };
        Some(value)
    }

    /// Best-effort decode without a schema: the first kind of
    /// [`PropertyKind::DECODE_ORDER`] that accepts `json` wins.
    #[must_use]
    pub fn guess(json: &JsonValue) -> Option<Self> {
        PropertyKind::DECODE_ORDER
            .iter()
            .find_map(|kind| Self::decode(*kind, json))
    }
}

fn as_double(json: &JsonValue) -> Option<f64> {
    json.as_f64()
}

fn as_int(json: &JsonValue) -> Option<i32> {
    i32::try_from(json.as_i64()?).ok()
}

fn list<T>(json: &JsonValue, item: impl Fn(&JsonValue) -> Option<T>) -> Option<Vec<T>> {
    json.as_array()?.iter().map(item).collect()
}

fn fixed<T, const N: usize>(
    json: &JsonValue,
    item: impl Fn(&JsonValue) -> Option<T>,
) -> Option<[T; N]> {
    list(json, item)?.try_into().ok()
}

/// Rust types that map onto exactly one property kind.
pub trait PropertyType: Sized {
    const KIND: PropertyKind;

    fn from_value(value: &PropertyValue) -> Option<Self>;

    fn into_value(self) -> PropertyValue;
}

macro_rules! property_type {
    ($($ty:ty => $variant:ident),+ $(,)?) => {$(
        impl PropertyType for $ty {
            const KIND: PropertyKind = PropertyKind::$variant;

            fn from_value(value: &PropertyValue) -> Option<Self> {
                match value {
                    PropertyValue::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }

            fn into_value(self) -> PropertyValue {
                PropertyValue::$variant(self)
            }
        }

        impl From<$ty> for PropertyValue {
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        }
    )+};
}

property_type! {
    f64 => Double,
    i32 => Int,
    u32 => UInt,
    u64 => UInt64,
    bool => Bool,
    String => String,
    [f64; 2] => Vec2d,
    [i32; 2] => Vec2i,
    [f64; 3] => Vec3d,
    [i32; 3] => Vec3i,
    [f64; 4] => Vec4d,
    [i32; 4] => Vec4i,
    Vec<f64> => Doubles,
    Vec<i32> => Ints,
    Vec<String> => Strings,
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(0.5), PropertyValue::Double(0.5))]
    #[case(json!(3), PropertyValue::Double(3.0))]
    #[case(json!("text"), PropertyValue::String("text".into()))]
    #[case(json!(true), PropertyValue::Bool(true))]
    #[case(json!([1, 2]), PropertyValue::Vec2d([1.0, 2.0]))]
    #[case(json!([1.5, 2, 3]), PropertyValue::Vec3d([1.5, 2.0, 3.0]))]
    #[case(json!([0, 0, 0, 1]), PropertyValue::Vec4d([0.0, 0.0, 0.0, 1.0]))]
    #[case(json!([1, 2, 3, 4, 5]), PropertyValue::Doubles(vec![1.0, 2.0, 3.0, 4.0, 5.0]))]
    #[case(json!([]), PropertyValue::Doubles(vec![]))]
    #[case(json!(["a", "b"]), PropertyValue::Strings(vec!["a".into(), "b".into()]))]
    fn guess_follows_decode_order(#[case] input: JsonValue, #[case] expected: PropertyValue) {
        assert_eq!(PropertyValue::guess(&input), Some(expected));
    }

    #[test]
    fn guess_rejects_unsupported_shapes() {
        assert_eq!(PropertyValue::guess(&json!(null)), None);
        assert_eq!(PropertyValue::guess(&json!({"x": 1})), None);
        assert_eq!(PropertyValue::guess(&json!([1, "mixed"])), None);
    }

    #[test]
    fn decode_is_strict() {
        assert_eq!(PropertyValue::decode(PropertyKind::Int, &json!(2.5)), None);
        assert_eq!(PropertyValue::decode(PropertyKind::Int, &json!("2")), None);
        assert_eq!(PropertyValue::decode(PropertyKind::UInt, &json!(-1)), None);
        assert_eq!(
            PropertyValue::decode(PropertyKind::UInt, &json!(u64::from(u32::MAX) + 1)),
            None
        );
        assert_eq!(PropertyValue::decode(PropertyKind::Vec3i, &json!([1, 2])), None);
        assert_eq!(
            PropertyValue::decode(PropertyKind::Vec2i, &json!([-1, 7])),
            Some(PropertyValue::Vec2i([-1, 7]))
        );
    }

    #[rstest]
    #[case(PropertyKind::Double)]
    #[case(PropertyKind::Int)]
    #[case(PropertyKind::UInt)]
    #[case(PropertyKind::UInt64)]
    #[case(PropertyKind::Bool)]
    #[case(PropertyKind::String)]
    #[case(PropertyKind::Vec2d)]
    #[case(PropertyKind::Vec3i)]
    #[case(PropertyKind::Vec4d)]
    #[case(PropertyKind::Doubles)]
    #[case(PropertyKind::Ints)]
    #[case(PropertyKind::Strings)]
    fn kind_survives_its_schema(#[case] kind: PropertyKind) {
        assert_eq!(PropertyKind::from_schema(&kind.schema()), Some(kind));
    }

    #[test]
    fn integer_format_wins_over_bounds() {
        let bounded_int = PropertyKind::Int.schema().with_minimum(1.0).with_maximum(32.0);
        assert_eq!(PropertyKind::from_schema(&bounded_int), Some(PropertyKind::Int));

        let open_int = PropertyKind::Int.schema().with_minimum(0.0);
        assert_eq!(PropertyKind::from_schema(&open_int), Some(PropertyKind::Int));

        let plain = JsonSchema::integer().with_minimum(0.0).with_maximum(10.0);
        assert_eq!(PropertyKind::from_schema(&plain), Some(PropertyKind::UInt));
        assert_eq!(
            PropertyKind::from_schema(&JsonSchema::unsigned()),
            Some(PropertyKind::UInt64)
        );
    }

    #[test]
    fn enum_schema_needs_options() {
        let schema = JsonSchema::enumeration(["a", "b"]);
        assert_eq!(PropertyKind::from_schema(&schema), Some(PropertyKind::Enum));
        assert_eq!(PropertyKind::from_schema(&JsonSchema::null()), None);
    }

    #[test]
    fn typed_access() {
        let value = PropertyValue::from([1.0, 2.0, 3.0]);
        assert_eq!(value.kind(), PropertyKind::Vec3d);
        assert_eq!(<[f64; 3]>::from_value(&value), Some([1.0, 2.0, 3.0]));
        assert_eq!(f64::from_value(&value), None);
        assert_eq!(7_u32.into_value(), PropertyValue::UInt(7));
    }
}
