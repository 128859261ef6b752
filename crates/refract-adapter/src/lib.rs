//! # refract-adapter
//!
//! Type-driven JSON adapters for refract.
//!
//! Every type that crosses the wire implements [`JsonAdapter`], which gives
//! it three operations: a schema, serialization to a [`JsonValue`], and
//! in-place deserialization that leaves the value untouched on failure.
//!
//! Implementations are provided for:
//! - primitives (`bool`, integers, floats with saturation, `String`)
//! - enums declared through [`json_enum!`]
//! - fixed-size arrays (math vectors, quaternions, planes) with a strict size policy
//! - dynamic containers and string-keyed maps
//! - pointer-likes (`Box`, `Arc`, `Option`)
//! - aggregates registered through [`JsonMessage`] and [`json_message!`]
//!
//! Property maps ([`property::PropertyMap`]) cover the cases where the field
//! set is only known at runtime.

pub mod adapter;
mod container;
pub mod enums;
pub mod error;
pub mod math;
pub mod message;
mod pointer;
mod primitive;
pub mod property;

pub use adapter::{JsonAdapter, deserialize, deserialize_into, schema_of, serialize};
pub use enums::JsonEnum;
pub use error::AdapterError;
pub use message::{JsonMessage, MessageBuilder, MessageInfo, message_info};
pub use refract_core::JsonValue;
pub use refract_schema::JsonSchema;
