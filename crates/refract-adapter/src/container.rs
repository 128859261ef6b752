//! Dynamic containers and string-keyed maps.
//!
//! Decoding builds a complete replacement from default-constructed elements
//! and commits it only when every element decodes; a failure anywhere
//! leaves the original container untouched.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::hash::Hash;

use indexmap::IndexMap;
use refract_core::{JsonObject, JsonType, JsonValue};
use refract_schema::JsonSchema;

use crate::adapter::JsonAdapter;
use crate::error::AdapterError;

fn array_to_json<'a, T, I>(items: I) -> Result<JsonValue, AdapterError>
where
    T: JsonAdapter + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| item.to_json().map_err(|error| AdapterError::item(index, error)))
        .collect::<Result<Vec<_>, _>>()
        .map(JsonValue::Array)
}

fn array_from_json<T: JsonAdapter + Default>(json: &JsonValue) -> Result<Vec<T>, AdapterError> {
    let items = json
        .as_array()
        .ok_or_else(|| AdapterError::mismatch(JsonType::Array, json))?;
    let mut decoded = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let mut value = T::default();
        value
            .update_from_json(item)
            .map_err(|error| AdapterError::item(index, error))?;
        decoded.push(value);
    }
    Ok(decoded)
}

fn map_to_json<'a, V, I>(entries: I) -> Result<JsonValue, AdapterError>
where
    V: JsonAdapter + 'a,
    I: IntoIterator<Item = (&'a String, &'a V)>,
{
    let mut object = JsonObject::new();
    for (key, value) in entries {
        let encoded = value
            .to_json()
            .map_err(|error| AdapterError::entry(key, error))?;
        object.insert(key.clone(), encoded);
    }
    Ok(JsonValue::Object(object))
}

fn map_from_json<V: JsonAdapter + Default>(
    json: &JsonValue,
) -> Result<Vec<(String, V)>, AdapterError> {
    let object = json
        .as_object()
        .ok_or_else(|| AdapterError::mismatch(JsonType::Object, json))?;
    let mut decoded = Vec::with_capacity(object.len());
    for (key, item) in object {
        let mut value = V::default();
        value
            .update_from_json(item)
            .map_err(|error| AdapterError::entry(key, error))?;
        decoded.push((key.clone(), value));
    }
    Ok(decoded)
}

macro_rules! impl_sequence {
    ($container:ident<T> where $($bound:path),*) => {
        impl<T> JsonAdapter for $container<T>
        where
            T: JsonAdapter + Default $(+ $bound)*,
        {
            fn schema() -> JsonSchema {
                JsonSchema::array(T::schema())
            }

            fn to_json(&self) -> Result<JsonValue, AdapterError> {
                array_to_json(self)
            }

            fn update_from_json(&mut self, json: &JsonValue) -> Result<(), AdapterError> {
                *self = array_from_json::<T>(json)?.into_iter().collect();
                Ok(())
            }
        }
    };
}

impl_sequence!(Vec<T> where);
impl_sequence!(VecDeque<T> where);
impl_sequence!(LinkedList<T> where);
impl_sequence!(BTreeSet<T> where Ord);
impl_sequence!(HashSet<T> where Eq, Hash);

macro_rules! impl_string_map {
    ($map:ident) => {
        impl<V: JsonAdapter + Default> JsonAdapter for $map<String, V> {
            fn schema() -> JsonSchema {
                JsonSchema::map(V::schema())
            }

            fn to_json(&self) -> Result<JsonValue, AdapterError> {
                map_to_json(self)
            }

            fn update_from_json(&mut self, json: &JsonValue) -> Result<(), AdapterError> {
                *self = map_from_json::<V>(json)?.into_iter().collect();
                Ok(())
            }
        }
    };
}

impl_string_map!(HashMap);
impl_string_map!(BTreeMap);
impl_string_map!(IndexMap);
