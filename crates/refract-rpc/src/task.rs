//! Async task plumbing: cancellation, progress and binary chunk delivery.
//!
//! Task bodies run on tokio's blocking pool. They never touch the
//! transport; everything they report travels as a [`TaskEvent`] to the
//! server loop, which owns all outgoing traffic.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use refract_core::JsonValue;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::TaskError;
use crate::transport::ClientId;

/// How often a blocked [`TaskContext::receive_chunk`] rechecks cancellation.
const CHUNK_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Params of a binary upload method.
pub trait ChunkedUpload {
    /// Name the client passes to the `chunk` method before sending frames.
    fn chunks_id(&self) -> &str;

    /// Total payload size announced by the client, in bytes.
    fn size(&self) -> u64;
}

/// A running task is identified by its client and request id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskKey {
    pub client: ClientId,
    /// Canonical JSON text of the request id.
    pub id: String,
}

impl TaskKey {
    #[must_use]
    pub fn new(client: ClientId, id: &JsonValue) -> Self {
        Self {
            client,
            id: id.to_string(),
        }
    }
}

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Messages from task bodies to the server loop.
#[derive(Debug)]
pub enum TaskEvent {
    Progress {
        key: TaskKey,
        operation: String,
        amount: f64,
    },
    Binary {
        key: TaskKey,
        data: Vec<u8>,
    },
    Finished {
        key: TaskKey,
        outcome: Result<JsonValue, TaskError>,
    },
}

/// Handle given to a task body.
pub struct TaskContext {
    key: TaskKey,
    cancel: CancelFlag,
    events: UnboundedSender<TaskEvent>,
    chunks: Option<Receiver<Vec<u8>>>,
}

impl TaskContext {
    pub(crate) const fn new(
        key: TaskKey,
        cancel: CancelFlag,
        events: UnboundedSender<TaskEvent>,
        chunks: Option<Receiver<Vec<u8>>>,
    ) -> Self {
        Self {
            key,
            cancel,
            events,
            chunks,
        }
    }

    /// The client that started the task.
    #[must_use]
    pub const fn client(&self) -> ClientId {
        self.key.client
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancellation point for `?`.
    ///
    /// # Errors
    ///
    /// `TaskError::cancelled()` once the client cancelled the task.
    pub fn check_cancelled(&self) -> Result<(), TaskError> {
        if self.is_cancelled() {
            Err(TaskError::cancelled())
        } else {
            Ok(())
        }
    }

    /// Report progress; `amount` is clamped to `[0, 1]`.
    pub fn progress(&self, operation: &str, amount: f64) {
        self.emit(TaskEvent::Progress {
            key: self.key.clone(),
            operation: operation.to_owned(),
            amount: amount.clamp(0.0, 1.0),
        });
    }

    /// Send a binary frame to the requesting client ahead of the reply.
    pub fn send_binary(&self, data: Vec<u8>) {
        self.emit(TaskEvent::Binary {
            key: self.key.clone(),
            data,
        });
    }

    /// Block until the next binary frame of this task's upload arrives.
    ///
    /// # Errors
    ///
    /// Cancelled if the task is cancelled while waiting, failed if the task
    /// has no upload or the upload was torn down.
    pub fn receive_chunk(&self) -> Result<Vec<u8>, TaskError> {
        let chunks = self
            .chunks
            .as_ref()
            .ok_or_else(|| TaskError::failed("Task has no binary upload"))?;
        loop {
            self.check_cancelled()?;
            match chunks.recv_timeout(CHUNK_POLL_INTERVAL) {
                Ok(chunk) => return Ok(chunk),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    self.check_cancelled()?;
                    return Err(TaskError::failed("Upload closed before completion"));
                }
            }
        }
    }

    fn emit(&self, event: TaskEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!(task = %self.key.id, "server loop gone, task event dropped");
        }
    }
}
