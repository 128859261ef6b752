//! # refract-rpc
//!
//! JSON-RPC 2.0 dispatch for refract.
//!
//! This crate provides:
//! - `Dispatcher`: typed endpoint binding (requests, notifications, tasks
//!   and binary uploads) with schemas derived from the bound types
//! - `Server`: the message loop over any [`Transport`], including the
//!   built-in `schema`, `registry`, `cancel` and `chunk` methods
//! - Task plumbing: progress notifications, cancellation and chunked
//!   binary uploads delivered to tasks on the blocking pool
//!
//! ## Architecture
//!
//! The server loop is single-threaded over its own state. Handlers for
//! requests and notifications run inline; task bodies run on tokio's
//! blocking pool and talk back through [`TaskEvent`]s, so only the loop
//! ever writes to the transport. Transports feed [`TransportEvent`]s in
//! and implement [`Transport`] for the way out.

mod dispatcher;
pub mod error;
pub mod protocol;
pub mod registry;
mod reserved;
mod server;
pub mod task;
pub mod transport;

pub use dispatcher::{ClientScope, Dispatcher, RESERVED_METHODS};
pub use error::{RpcError, TaskError};
pub use protocol::{ErrorObject, RpcNotification, RpcReply, RpcRequest};
pub use registry::{EndpointRegistry, MethodSchema};
pub use reserved::{CancelParams, ChunkParams, SchemaParams};
pub use server::Server;
pub use task::{CancelFlag, ChunkedUpload, TaskContext, TaskEvent, TaskKey};
pub use transport::{ClientId, MemoryTransport, Transport, TransportError, TransportEvent};
