//! Typed endpoint binding.
//!
//! A [`Dispatcher`] maps method names to handlers. Binding derives the
//! method schema from the params and result adapters, and wraps the handler
//! in a closure that decodes params and encodes the result, so the server
//! loop only ever deals in JSON.
//!
//! ```
//! use refract_rpc::Dispatcher;
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.bind_request("double", "Twice the input", |value: i64| Ok(value * 2));
//! assert!(dispatcher.contains("double"));
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use refract_adapter::{JsonAdapter, deserialize};
use refract_core::JsonValue;
use refract_schema::JsonSchema;

use crate::error::{RpcError, TaskError};
use crate::registry::{EndpointRegistry, MethodSchema};
use crate::task::{ChunkedUpload, TaskContext};
use crate::transport::ClientId;

/// Method names handled by the server itself.
pub const RESERVED_METHODS: [&str; 4] = ["schema", "registry", "cancel", "chunk"];

type RequestFn = Box<dyn Fn(JsonValue) -> Result<JsonValue, RpcError> + Send + Sync>;
type NotificationFn = Box<dyn Fn(JsonValue) -> Result<(), RpcError> + Send + Sync>;
type PrepareFn = Box<dyn Fn(JsonValue) -> Result<PreparedTask, RpcError> + Send + Sync>;

/// Task body ready to run on the blocking pool.
pub(crate) type TaskBody = Box<dyn FnOnce(TaskContext) -> Result<JsonValue, TaskError> + Send>;

/// Upload announced by the params of an upload method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UploadRequest {
    pub chunks_id: String,
    pub size: u64,
}

/// Params decoded on the server loop, body still to run.
pub(crate) struct PreparedTask {
    pub body: TaskBody,
    pub upload: Option<UploadRequest>,
}

pub(crate) enum Handler {
    Request(RequestFn),
    Notification(NotificationFn),
    Task(PrepareFn),
}

/// The client whose message is being handled, readable from handlers.
///
/// Set by the server around each handler call and cleared afterwards, so
/// outside of a handler it reads `None`.
#[derive(Debug, Clone, Default)]
pub struct ClientScope(Arc<Mutex<Option<ClientId>>>);

impl ClientScope {
    #[must_use]
    pub fn current(&self) -> Option<ClientId> {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn enter(&self, client: ClientId) -> ScopeGuard<'_> {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(client);
        ScopeGuard(self)
    }
}

pub(crate) struct ScopeGuard<'a>(&'a ClientScope);

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        *self.0.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Endpoint table: handlers plus their published schemas.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Handler>,
    registry: EndpointRegistry,
    scope: ClientScope,
}

fn decode_params<P: JsonAdapter + Default>(params: &JsonValue) -> Result<P, RpcError> {
    deserialize(params).map_err(RpcError::from)
}

fn encode_result<R: JsonAdapter>(result: &R) -> Result<JsonValue, RpcError> {
    result
        .to_json()
        .map_err(|error| RpcError::Internal(format!("cannot serialize result: {error}")))
}

fn task_body<P, R, F>(handler: &Arc<F>, params: P) -> TaskBody
where
    P: Send + 'static,
    R: JsonAdapter + 'static,
    F: Fn(P, &TaskContext) -> Result<R, TaskError> + Send + Sync + 'static,
{
    let handler = Arc::clone(handler);
    Box::new(move |context| {
        let result = handler(params, &context)?;
        result
            .to_json()
            .map_err(|error| TaskError::failed(format!("cannot serialize result: {error}")))
    })
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for handlers that need to know the calling client.
    #[must_use]
    pub fn client_scope(&self) -> ClientScope {
        self.scope.clone()
    }

    #[must_use]
    pub const fn endpoints(&self) -> &EndpointRegistry {
        &self.registry
    }

    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Bind a synchronous method `P -> R`.
    pub fn bind_request<P, R, F>(&mut self, name: &str, description: &str, handler: F) -> &mut Self
    where
        P: JsonAdapter + Default + 'static,
        R: JsonAdapter + 'static,
        F: Fn(P) -> Result<R, RpcError> + Send + Sync + 'static,
    {
        let schema = MethodSchema::new(name, description, P::schema(), R::schema());
        let wrapped: RequestFn = Box::new(move |params| {
            let result = handler(decode_params(&params)?)?;
            encode_result(&result)
        });
        self.insert(schema, Handler::Request(wrapped))
    }

    /// Bind a method whose schemas are only known at runtime.
    pub fn bind_raw_request<F>(
        &mut self,
        name: &str,
        description: &str,
        params: JsonSchema,
        returns: JsonSchema,
        handler: F,
    ) -> &mut Self
    where
        F: Fn(JsonValue) -> Result<JsonValue, RpcError> + Send + Sync + 'static,
    {
        let schema = MethodSchema::new(name, description, params, returns);
        self.insert(schema, Handler::Request(Box::new(handler)))
    }

    /// Bind a fire-and-forget method. Successful calls are rebroadcast to
    /// the other clients when the server is configured to.
    pub fn bind_notification<P, F>(&mut self, name: &str, description: &str, handler: F) -> &mut Self
    where
        P: JsonAdapter + Default + 'static,
        F: Fn(P) -> Result<(), RpcError> + Send + Sync + 'static,
    {
        let schema = MethodSchema::new(name, description, P::schema(), JsonSchema::null());
        let wrapped: NotificationFn = Box::new(move |params| handler(decode_params(&params)?));
        self.insert(schema, Handler::Notification(wrapped))
    }

    /// Bind a long-running method. Params are decoded on the server loop;
    /// the body runs on the blocking pool with a [`TaskContext`].
    pub fn bind_task<P, R, F>(&mut self, name: &str, description: &str, handler: F) -> &mut Self
    where
        P: JsonAdapter + Default + Send + 'static,
        R: JsonAdapter + 'static,
        F: Fn(P, &TaskContext) -> Result<R, TaskError> + Send + Sync + 'static,
    {
        let schema = MethodSchema::new(name, description, P::schema(), R::schema()).asynchronous();
        let handler = Arc::new(handler);
        let prepare: PrepareFn = Box::new(move |params| {
            let params: P = decode_params(&params)?;
            Ok(PreparedTask {
                body: task_body::<P, R, F>(&handler, params),
                upload: None,
            })
        });
        self.insert(schema, Handler::Task(prepare))
    }

    /// Bind a task fed by binary frames. The params announce the upload;
    /// the body pulls chunks with [`TaskContext::receive_chunk`].
    pub fn bind_upload<P, R, F>(&mut self, name: &str, description: &str, handler: F) -> &mut Self
    where
        P: JsonAdapter + ChunkedUpload + Default + Send + 'static,
        R: JsonAdapter + 'static,
        F: Fn(P, &TaskContext) -> Result<R, TaskError> + Send + Sync + 'static,
    {
        let schema = MethodSchema::new(name, description, P::schema(), R::schema()).asynchronous();
        let handler = Arc::new(handler);
        let prepare: PrepareFn = Box::new(move |params| {
            let params: P = decode_params(&params)?;
            let upload = UploadRequest {
                chunks_id: params.chunks_id().to_owned(),
                size: params.size(),
            };
            Ok(PreparedTask {
                body: task_body::<P, R, F>(&handler, params),
                upload: Some(upload),
            })
        });
        self.insert(schema, Handler::Task(prepare))
    }

    pub(crate) fn handler(&self, method: &str) -> Option<&Handler> {
        self.handlers.get(method)
    }

    fn insert(&mut self, schema: MethodSchema, handler: Handler) -> &mut Self {
        if RESERVED_METHODS.contains(&schema.title.as_str()) {
            tracing::warn!(method = %schema.title, "reserved method name, binding ignored");
            return self;
        }
        let name = schema.title.clone();
        if let Err(error) = self.registry.insert(schema) {
            tracing::error!(method = %name, %error, "schema cannot be published, binding ignored");
            return self;
        }
        if self.handlers.insert(name.clone(), handler).is_some() {
            tracing::debug!(method = %name, "replaced existing binding");
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn call(dispatcher: &Dispatcher, method: &str, params: JsonValue) -> Result<JsonValue, RpcError> {
        match dispatcher.handler(method) {
            Some(Handler::Request(handler)) => handler(params),
            _ => panic!("{method} is not a request"),
        }
    }

    #[test]
    fn request_decodes_params_and_encodes_result() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.bind_request("double", "Twice the input", |value: i64| Ok(value * 2));

        assert_eq!(call(&dispatcher, "double", json!(21)).unwrap(), json!(42));
        let err = call(&dispatcher, "double", json!("many")).unwrap_err();
        assert_eq!(err.code(), -32602);
    }

    #[test]
    fn handler_errors_pass_through() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.bind_request("fail", "", |(): ()| -> Result<(), RpcError> {
            Err(RpcError::not_found("nothing here"))
        });
        assert_eq!(
            call(&dispatcher, "fail", JsonValue::Null).unwrap_err(),
            RpcError::not_found("nothing here")
        );
    }

    #[test]
    fn binding_publishes_schema() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .bind_request("get-size", "Window size", |(): ()| Ok([800_u32, 600]))
            .bind_task("render", "Render frames", |frames: u32, _: &TaskContext| {
                Ok(frames)
            });

        let endpoints = dispatcher.endpoints();
        assert_eq!(endpoints.names().collect::<Vec<_>>(), ["get-size", "render"]);
        let render = endpoints.get("render").unwrap();
        assert!(render.is_async);
        assert_eq!(render.params, Some(u32::schema()));

        let size = endpoints.get("get-size").unwrap().to_json().unwrap();
        assert_eq!(size["params"], json!([]));
        assert_eq!(size["returns"]["maxItems"], json!(2));
    }

    #[test]
    fn unpublishable_schema_is_not_bound() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.bind_raw_request(
            "load",
            "Array params without an item schema",
            JsonSchema::of_type(refract_core::JsonType::Array),
            JsonSchema::null(),
            |_| Ok(JsonValue::Null),
        );
        assert!(!dispatcher.contains("load"));
        assert!(dispatcher.endpoints().is_empty());
    }

    #[test]
    fn reserved_names_cannot_be_bound() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.bind_request("schema", "", |(): ()| Ok(()));
        assert!(!dispatcher.contains("schema"));
        assert!(dispatcher.endpoints().is_empty());
    }

    #[test]
    fn scope_is_cleared_after_guard() {
        let scope = ClientScope::default();
        {
            let _guard = scope.enter(ClientId(9));
            assert_eq!(scope.current(), Some(ClientId(9)));
        }
        assert_eq!(scope.current(), None);
    }
}
