//! # refract-core
//!
//! Foundational types shared by every refract crate:
//! - The dynamic JSON value (`JsonValue`) with parse/stringify helpers
//! - `JsonType`, the type tag used by schemas and error messages
//! - snake_case ↔ camelCase conversion for wire property names
//! - Cross-cutting error types

pub mod errors;
pub mod json;
pub mod naming;

pub use errors::CoreError;
pub use json::{
    JsonObject, JsonType, JsonValue, expect_object, kind_name, parse, stringify, stringify_pretty,
};
pub use naming::{camel_to_snake, snake_to_camel};
