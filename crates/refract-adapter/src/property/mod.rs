//! Runtime-typed property maps and their JSON bridge.
//!
//! A [`PropertyMap`] is an ordered set of named values whose kinds are only
//! known at runtime (renderer parameters, loader options). In memory names
//! are camelCase; on the wire they are snake_case.

mod error;
mod json;
mod map;
mod value;

pub use error::PropertyError;
pub use json::{property_map_from_json, property_map_schema, property_map_to_json, update_property_map};
pub use map::{Property, PropertyMap, PropertyMetadata};
pub use value::{PropertyKind, PropertyType, PropertyValue};
