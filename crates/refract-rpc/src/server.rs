//! The server loop.
//!
//! One loop owns all mutable state: connected clients, running tasks and
//! upload routing. Request and notification handlers run to completion on
//! it; task bodies run on the blocking pool and report back through an
//! unbounded channel, so every outgoing frame is sent from the loop.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::mpsc::Sender;

use refract_adapter::deserialize;
use refract_config::RpcConfig;
use refract_core::JsonValue;
use serde::Serialize;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::{JoinError, JoinHandle};

use crate::dispatcher::{Dispatcher, Handler, PreparedTask};
use crate::error::{RpcError, TaskError};
use crate::protocol::{RpcNotification, RpcReply, RpcRequest};
use crate::reserved::{CancelParams, ChunkParams, SchemaParams};
use crate::task::{CancelFlag, TaskContext, TaskEvent, TaskKey};
use crate::transport::{ClientId, Transport, TransportEvent};

struct RunningTask {
    id: JsonValue,
    method: String,
    cancel: CancelFlag,
    chunks: Option<Sender<Vec<u8>>>,
    chunks_id: Option<String>,
    handle: Option<JoinHandle<()>>,
}

/// JSON-RPC server over a [`Transport`].
pub struct Server<T: Transport> {
    dispatcher: Arc<Dispatcher>,
    transport: T,
    config: RpcConfig,
    clients: BTreeSet<ClientId>,
    tasks: HashMap<TaskKey, RunningTask>,
    /// `(client, chunks id)` of pending uploads.
    uploads: HashMap<(ClientId, String), TaskKey>,
    /// Upload selected by each client's last `chunk` call.
    selected: HashMap<ClientId, String>,
    events: UnboundedSender<TaskEvent>,
    inbox: UnboundedReceiver<TaskEvent>,
}

impl<T: Transport> Server<T> {
    pub fn new(dispatcher: Dispatcher, transport: T, config: RpcConfig) -> Self {
        let (events, inbox) = unbounded_channel();
        Self {
            dispatcher: Arc::new(dispatcher),
            transport,
            config,
            clients: BTreeSet::new(),
            tasks: HashMap::new(),
            uploads: HashMap::new(),
            selected: HashMap::new(),
            events,
            inbox,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub fn running_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Drain `inbound` and task events until `inbound` closes.
    ///
    /// Tasks still running when this returns keep running; follow up with
    /// [`wait_for_tasks`](Self::wait_for_tasks) or [`shutdown`](Self::shutdown).
    pub async fn run(&mut self, mut inbound: UnboundedReceiver<TransportEvent>) {
        loop {
            tokio::select! {
                event = inbound.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
                Some(event) = self.inbox.recv() => self.handle_task_event(event),
            }
        }
    }

    /// Process task events until no task is running.
    pub async fn wait_for_tasks(&mut self) {
        while !self.tasks.is_empty() {
            match self.inbox.recv().await {
                Some(event) => self.handle_task_event(event),
                None => break,
            }
        }
    }

    /// Cancel every task, join them, and deliver their final replies.
    pub async fn shutdown(&mut self) {
        let handles: Vec<JoinHandle<()>> = self
            .tasks
            .values_mut()
            .filter_map(|task| {
                task.cancel.cancel();
                task.chunks = None;
                task.handle.take()
            })
            .collect();
        if !handles.is_empty() {
            tracing::info!(count = handles.len(), "cancelling outstanding tasks");
        }
        for handle in handles {
            if let Err(error) = handle.await {
                tracing::warn!(%error, "task join failed");
            }
        }
        while let Ok(event) = self.inbox.try_recv() {
            self.handle_task_event(event);
        }
    }

    /// Process one inbound transport event.
    pub fn handle(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected(client) => {
                self.clients.insert(client);
                tracing::info!(%client, "client connected");
            }
            TransportEvent::Disconnected(client) => self.disconnect(client),
            TransportEvent::Text { client, text } => self.handle_text(client, &text),
            TransportEvent::Binary { client, data } => self.handle_binary(client, data),
        }
    }

    fn handle_text(&mut self, client: ClientId, text: &str) {
        if self.clients.insert(client) {
            tracing::debug!(%client, "implicit connect on first message");
        }

        let request = match RpcRequest::parse(text) {
            Ok(request) => request,
            Err(rejected) => {
                tracing::warn!(%client, error = %rejected.error, "rejected message");
                let reply = RpcReply::failure(rejected.id, rejected.method, &rejected.error);
                self.send_json(client, &reply);
                return;
            }
        };
        tracing::debug!(%client, method = %request.method, "dispatching");

        let outcome = match request.method.as_str() {
            "schema" => Some(self.describe(&request.params)),
            "registry" => Some(Ok(self.dispatcher.endpoints().list())),
            "cancel" => Some(self.cancel(client, &request.params)),
            "chunk" => Some(self.select_upload(client, &request.params)),
            _ => self.dispatch(client, &request),
        };
        if let Some(outcome) = outcome {
            self.reply(client, &request, outcome);
        }
    }

    /// Run a bound method. `None` means the reply comes later (tasks).
    fn dispatch(
        &mut self,
        client: ClientId,
        request: &RpcRequest,
    ) -> Option<Result<JsonValue, RpcError>> {
        let dispatcher = Arc::clone(&self.dispatcher);
        let Some(handler) = dispatcher.handler(&request.method) else {
            return Some(Err(RpcError::MethodNotFound(request.method.clone())));
        };

        if self.config.validate_params {
            if let Err(error) = dispatcher
                .endpoints()
                .validate_params(&request.method, &request.params)
            {
                return Some(Err(RpcError::from_validation(error)));
            }
        }

        let scope = dispatcher.client_scope();
        let _guard = scope.enter(client);
        match handler {
            Handler::Request(handler) => Some(handler(request.params.clone())),
            Handler::Notification(handler) => {
                let outcome = handler(request.params.clone());
                if outcome.is_ok() && self.config.rebroadcast_notifications {
                    self.rebroadcast(client, request);
                }
                Some(outcome.map(|()| JsonValue::from("OK")))
            }
            Handler::Task(prepare) => {
                let Some(id) = request.id.clone() else {
                    tracing::warn!(%client, method = %request.method, "async method called without id, ignored");
                    return None;
                };
                let key = TaskKey::new(client, &id);
                if self.tasks.contains_key(&key) {
                    return Some(Err(RpcError::InvalidRequest(format!(
                        "Task {} is already running",
                        key.id
                    ))));
                }
                prepare(request.params.clone())
                    .and_then(|prepared| self.start_task(key, id, &request.method, prepared))
                    .err()
                    .map(Err)
            }
        }
    }

    fn start_task(
        &mut self,
        key: TaskKey,
        id: JsonValue,
        method: &str,
        prepared: PreparedTask,
    ) -> Result<(), RpcError> {
        let (chunks, receiver, chunks_id) = match prepared.upload {
            Some(upload) => {
                if upload.size > self.config.max_upload_bytes {
                    return Err(RpcError::invalid_params(format!(
                        "Upload of {} bytes exceeds the limit of {} bytes",
                        upload.size, self.config.max_upload_bytes
                    )));
                }
                let slot = (key.client, upload.chunks_id.clone());
                if self.uploads.contains_key(&slot) {
                    return Err(RpcError::invalid_params(format!(
                        "Upload '{}' is already pending",
                        upload.chunks_id
                    )));
                }
                let (sender, receiver) = std::sync::mpsc::channel();
                self.uploads.insert(slot, key.clone());
                (Some(sender), Some(receiver), Some(upload.chunks_id))
            }
            None => (None, None, None),
        };

        let cancel = CancelFlag::default();
        let context = TaskContext::new(key.clone(), cancel.clone(), self.events.clone(), receiver);
        let events = self.events.clone();
        let finished_key = key.clone();
        let body = prepared.body;
        let handle = tokio::spawn(async move {
            let outcome = match tokio::task::spawn_blocking(move || body(context)).await {
                Ok(outcome) => outcome,
                Err(error) => Err(join_failure(error)),
            };
            let finished = TaskEvent::Finished {
                key: finished_key,
                outcome,
            };
            if events.send(finished).is_err() {
                tracing::debug!("server loop gone before task completion");
            }
        });

        tracing::info!(client = %key.client, id = %key.id, method, "task started");
        self.tasks.insert(
            key,
            RunningTask {
                id,
                method: method.to_owned(),
                cancel,
                chunks,
                chunks_id,
                handle: Some(handle),
            },
        );
        Ok(())
    }

    fn handle_task_event(&mut self, event: TaskEvent) {
        match event {
            TaskEvent::Progress {
                key,
                operation,
                amount,
            } => {
                if let Some(task) = self.tasks.get(&key) {
                    let progress = RpcNotification::progress(task.id.clone(), &operation, amount);
                    self.send_json(key.client, &progress);
                }
            }
            TaskEvent::Binary { key, data } => {
                if self.tasks.contains_key(&key) && self.clients.contains(&key.client) {
                    if let Err(error) = self.transport.send_binary(key.client, &data) {
                        tracing::warn!(client = %key.client, %error, "binary send failed");
                    }
                }
            }
            TaskEvent::Finished { key, outcome } => {
                let Some(task) = self.tasks.remove(&key) else {
                    return;
                };
                if let Some(chunks_id) = task.chunks_id {
                    if self.selected.get(&key.client) == Some(&chunks_id) {
                        self.selected.remove(&key.client);
                    }
                    self.uploads.remove(&(key.client, chunks_id));
                }

                let reply = match outcome {
                    Ok(result) => {
                        tracing::info!(client = %key.client, id = %key.id, method = %task.method, "task finished");
                        RpcReply::success(Some(task.id), Some(task.method), result)
                    }
                    Err(error) => {
                        tracing::info!(client = %key.client, id = %key.id, method = %task.method, %error, "task failed");
                        RpcReply::failure(Some(task.id), Some(task.method), &error.into())
                    }
                };
                self.send_json(key.client, &reply);
            }
        }
    }

    fn handle_binary(&self, client: ClientId, data: Vec<u8>) {
        let sender = self
            .selected
            .get(&client)
            .and_then(|chunks_id| self.uploads.get(&(client, chunks_id.clone())))
            .and_then(|key| self.tasks.get(key))
            .and_then(|task| task.chunks.as_ref());
        match sender {
            Some(sender) => {
                if sender.send(data).is_err() {
                    tracing::debug!(%client, "upload task stopped receiving");
                }
            }
            None => tracing::warn!(%client, "binary frame without a selected upload, dropped"),
        }
    }

    fn disconnect(&mut self, client: ClientId) {
        self.clients.remove(&client);
        self.selected.remove(&client);
        let mut cancelled = 0_usize;
        for task in self
            .tasks
            .iter_mut()
            .filter_map(|(key, task)| (key.client == client).then_some(task))
        {
            task.cancel.cancel();
            task.chunks = None;
            cancelled += 1;
        }
        tracing::info!(%client, cancelled, "client disconnected");
    }

    fn describe(&self, params: &JsonValue) -> Result<JsonValue, RpcError> {
        let SchemaParams { endpoint } = deserialize(params)?;
        self.dispatcher
            .endpoints()
            .describe(&endpoint)
            .cloned()
            .ok_or_else(|| RpcError::schema_not_found(&endpoint))
    }

    fn cancel(&self, client: ClientId, params: &JsonValue) -> Result<JsonValue, RpcError> {
        let CancelParams { id } = deserialize(params)?;
        let task = self
            .tasks
            .get(&TaskKey::new(client, &id))
            .ok_or_else(|| RpcError::not_found(format!("No task with id {id}")))?;
        task.cancel.cancel();
        tracing::info!(%client, %id, method = %task.method, "task cancellation requested");
        Ok(JsonValue::Null)
    }

    fn select_upload(&mut self, client: ClientId, params: &JsonValue) -> Result<JsonValue, RpcError> {
        let ChunkParams { id } = deserialize(params)?;
        if !self.uploads.contains_key(&(client, id.clone())) {
            return Err(RpcError::upload_rejected(format!("No pending upload '{id}'")));
        }
        self.selected.insert(client, id);
        Ok(JsonValue::Null)
    }

    fn rebroadcast(&self, origin: ClientId, request: &RpcRequest) {
        let notification = RpcNotification::new(request.method.clone(), request.params.clone());
        for client in self.clients.iter().copied().filter(|client| *client != origin) {
            self.send_json(client, &notification);
        }
    }

    fn reply(&self, client: ClientId, request: &RpcRequest, outcome: Result<JsonValue, RpcError>) {
        let Some(id) = request.id.clone() else {
            if let Err(error) = outcome {
                tracing::warn!(%client, method = %request.method, %error, "notification failed");
            }
            return;
        };
        let method = Some(request.method.clone());
        let reply = match outcome {
            Ok(result) => RpcReply::success(Some(id), method, result),
            Err(error) => RpcReply::failure(Some(id), method, &error),
        };
        self.send_json(client, &reply);
    }

    fn send_json<M: Serialize>(&self, client: ClientId, message: &M) {
        if !self.clients.contains(&client) {
            tracing::debug!(%client, "client gone, message dropped");
            return;
        }
        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(%client, %error, "cannot serialize outgoing message");
                return;
            }
        };
        if let Err(error) = self.transport.send_text(client, &text) {
            tracing::warn!(%client, %error, "send failed");
        }
    }
}

fn join_failure(error: JoinError) -> TaskError {
    if !error.is_panic() {
        return TaskError::cancelled();
    }
    let panic = error.into_panic();
    let message = panic
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned());
    TaskError::failed(format!("Task panicked: {message}"))
}
