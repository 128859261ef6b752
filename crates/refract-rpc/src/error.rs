//! RPC and task error types.

use refract_adapter::AdapterError;
use refract_core::JsonValue;
use refract_schema::SchemaError;
use thiserror::Error;

use crate::protocol::{
    ErrorObject, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, NOT_FOUND,
    PARSE_ERROR, SCHEMA_NOT_FOUND, TASK_CANCELLED, TASK_FAILED, UPLOAD_REJECTED,
};

/// Unified RPC error that can be converted to a JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RpcError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {message}")]
    InvalidParams {
        message: String,
        data: Option<JsonValue>,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    /// Any other code, raised by handlers or the application error helpers.
    #[error("{message}")]
    Application {
        code: i64,
        message: String,
        data: Option<JsonValue>,
    },
}

impl RpcError {
    /// Error with an arbitrary application code.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self::Application {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
            data: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(NOT_FOUND, message)
    }

    pub fn schema_not_found(endpoint: &str) -> Self {
        Self::new(SCHEMA_NOT_FOUND, format!("Unknown endpoint '{endpoint}'"))
    }

    pub fn upload_rejected(message: impl Into<String>) -> Self {
        Self::new(UPLOAD_REJECTED, message)
    }

    /// Attach structured data. Only invalid params and application errors
    /// carry data; other kinds are returned unchanged.
    #[must_use]
    pub fn with_data(self, data: JsonValue) -> Self {
        match self {
            Self::InvalidParams { message, .. } => Self::InvalidParams {
                message,
                data: Some(data),
            },
            Self::Application { code, message, .. } => Self::Application {
                code,
                message,
                data: Some(data),
            },
            other => other,
        }
    }

    /// Convert to a JSON-RPC error code.
    #[must_use]
    pub const fn code(&self) -> i64 {
        match self {
            Self::Parse(_) => PARSE_ERROR,
            Self::InvalidRequest(_) => INVALID_REQUEST,
            Self::MethodNotFound(_) => METHOD_NOT_FOUND,
            Self::InvalidParams { .. } => INVALID_PARAMS,
            Self::Internal(_) => INTERNAL_ERROR,
            Self::Application { code, .. } => *code,
        }
    }

    #[must_use]
    pub const fn data(&self) -> Option<&JsonValue> {
        match self {
            Self::InvalidParams { data, .. } | Self::Application { data, .. } => data.as_ref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_error_object(&self) -> ErrorObject {
        ErrorObject {
            code: self.code(),
            message: self.to_string(),
            data: self.data().cloned(),
        }
    }

    /// Params that failed schema validation, violations listed in `data`.
    pub(crate) fn from_validation(error: SchemaError) -> Self {
        match error {
            SchemaError::ValidationFailed { errors } => {
                Self::invalid_params("params do not match the endpoint schema")
                    .with_data(JsonValue::from(errors))
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<AdapterError> for RpcError {
    fn from(error: AdapterError) -> Self {
        Self::invalid_params(error.to_string())
    }
}

/// Failure of an async task, reported in the task's error reply.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct TaskError {
    pub code: i64,
    pub message: String,
    pub data: Option<JsonValue>,
}

impl TaskError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Generic runtime failure (`TASK_FAILED`).
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(TASK_FAILED, message)
    }

    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(TASK_CANCELLED, "Task cancelled")
    }

    #[must_use]
    pub fn with_data(mut self, data: JsonValue) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.code == TASK_CANCELLED
    }
}

impl From<TaskError> for RpcError {
    fn from(error: TaskError) -> Self {
        Self::Application {
            code: error.code,
            message: error.message,
            data: error.data,
        }
    }
}

impl From<RpcError> for TaskError {
    fn from(error: RpcError) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
            data: error.data().cloned(),
        }
    }
}
