//! # refract-schema
//!
//! JSON Schema model for refract.
//!
//! This crate provides:
//! - `JsonSchema`: the recursive schema value produced by adapters and
//!   property maps
//! - The schema wire codec (`JsonSchema::to_json` / `JsonSchema::from_json`)
//!   covering the draft keyword subset used by clients
//! - Validation of JSON instances against a schema (backed by `jsonschema`)
//!
//! ## Architecture
//!
//! Schemas are produced by `refract-adapter` from static types and from
//! runtime property maps, then exported by `refract-rpc` as endpoint
//! descriptors. They are rarely consumed at runtime; `from_json` exists so
//! stored descriptors can be reloaded and compared.

mod codec;
pub mod error;
pub mod schema;
pub mod validate;

pub use error::SchemaError;
pub use schema::JsonSchema;
pub use validate::{is_valid, validate};
