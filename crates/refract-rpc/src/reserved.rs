//! Params of the methods the server answers itself.

use refract_adapter::{JsonMessage, MessageBuilder, json_message};
use refract_core::JsonValue;

/// `schema {endpoint}`.
#[derive(Debug, Default)]
pub struct SchemaParams {
    pub endpoint: String,
}

impl JsonMessage for SchemaParams {
    fn register(message: &mut MessageBuilder<Self>) {
        message
            .field("endpoint", |p| &p.endpoint, |p| &mut p.endpoint)
            .description("Name of the endpoint to describe")
            .required();
    }
}

/// `cancel {id}`.
#[derive(Debug, Default)]
pub struct CancelParams {
    pub id: JsonValue,
}

impl JsonMessage for CancelParams {
    fn register(message: &mut MessageBuilder<Self>) {
        message
            .field("id", |p| &p.id, |p| &mut p.id)
            .description("Id of the request that started the task")
            .required();
    }
}

/// `chunk {id}`.
#[derive(Debug, Default)]
pub struct ChunkParams {
    pub id: String,
}

impl JsonMessage for ChunkParams {
    fn register(message: &mut MessageBuilder<Self>) {
        message
            .field("id", |p| &p.id, |p| &mut p.id)
            .description("Chunks id announced by the upload request")
            .required();
    }
}

json_message!(SchemaParams, CancelParams, ChunkParams);
