//! JSON-RPC 2.0 envelopes.
//!
//! Replies echo the request's `method` next to its `id`. Field order on the
//! wire is `jsonrpc`, `id`, `method`, then `result` or `error`.

use refract_core::{JsonValue, kind_name};
use serde::{Deserialize, Serialize};

use crate::error::RpcError;

pub const JSONRPC_VERSION: &str = "2.0";

// ---------------------------------------------------------------------------
// Standard JSON-RPC 2.0 error codes
// ---------------------------------------------------------------------------

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

// Application-defined error codes (server range: -32000 to -32099)
pub const TASK_FAILED: i64 = -32000;
pub const NOT_FOUND: i64 = -32001;
pub const SCHEMA_NOT_FOUND: i64 = -32002;
pub const TASK_CANCELLED: i64 = -32003;
pub const UPLOAD_REJECTED: i64 = -32004;

/// Method name of task progress notifications.
pub const PROGRESS_METHOD: &str = "progress";

/// A validated inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    /// String or number. `None` when the client expects no reply.
    pub id: Option<JsonValue>,
    pub method: String,
    /// `null` when absent.
    pub params: JsonValue,
}

/// A request that could not be accepted, with whatever could be recovered
/// for the error reply.
#[derive(Debug)]
pub struct RejectedRequest {
    pub id: Option<JsonValue>,
    pub method: Option<String>,
    pub error: RpcError,
}

impl RpcRequest {
    /// Parse and validate one text frame.
    ///
    /// # Errors
    ///
    /// Malformed JSON is a parse error; anything else that is not a
    /// well-formed 2.0 request is an invalid request.
    pub fn parse(text: &str) -> Result<Self, RejectedRequest> {
        let document: JsonValue = serde_json::from_str(text).map_err(|error| RejectedRequest {
            id: None,
            method: None,
            error: RpcError::Parse(error.to_string()),
        })?;

        let Some(object) = document.as_object() else {
            return Err(RejectedRequest {
                id: None,
                method: None,
                error: RpcError::InvalidRequest(format!(
                    "expected object, found {}",
                    kind_name(&document)
                )),
            });
        };

        let id = object.get("id").filter(|id| !id.is_null()).cloned();
        let method = object
            .get("method")
            .and_then(JsonValue::as_str)
            .map(str::to_owned);
        let reject = |message: String| RejectedRequest {
            id: id.clone(),
            method: method.clone(),
            error: RpcError::InvalidRequest(message),
        };

        if object.get("jsonrpc").and_then(JsonValue::as_str) != Some(JSONRPC_VERSION) {
            return Err(reject(format!(
                "Invalid JSON-RPC version, expected \"{JSONRPC_VERSION}\""
            )));
        }
        if let Some(id) = &id {
            if !id.is_string() && !id.is_number() {
                return Err(reject(format!(
                    "'id' must be a string or a number, found {}",
                    kind_name(id)
                )));
            }
        }
        let Some(method_name) = method.clone() else {
            return Err(reject("'method' must be a string".to_owned()));
        };

        Ok(Self {
            id,
            method: method_name,
            params: object.get("params").cloned().unwrap_or(JsonValue::Null),
        })
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

/// Reply to a request, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcReply {
    pub jsonrpc: String,
    /// `null` when the request could not be parsed.
    pub id: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl RpcReply {
    #[must_use]
    pub fn success(id: Option<JsonValue>, method: Option<String>, result: JsonValue) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id,
            method,
            result: Some(result),
            error: None,
        }
    }

    #[must_use]
    pub fn failure(id: Option<JsonValue>, method: Option<String>, error: &RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id,
            method,
            result: None,
            error: Some(error.to_error_object()),
        }
    }
}

/// Server-initiated message without an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: JsonValue,
}

impl RpcNotification {
    #[must_use]
    pub fn new(method: impl Into<String>, params: JsonValue) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            method: method.into(),
            params,
        }
    }

    /// `{"id": .., "operation": .., "amount": ..}` for a running task.
    #[must_use]
    pub fn progress(id: JsonValue, operation: &str, amount: f64) -> Self {
        let mut params = refract_core::JsonObject::new();
        params.insert("id".into(), id);
        params.insert("operation".into(), JsonValue::String(operation.to_owned()));
        params.insert("amount".into(), JsonValue::from(amount));
        Self::new(PROGRESS_METHOD, JsonValue::Object(params))
    }
}
