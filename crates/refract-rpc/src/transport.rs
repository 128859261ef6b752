//! Client connections as seen by the server loop.
//!
//! A transport delivers [`TransportEvent`]s into the loop and carries
//! outgoing frames back to clients. Only the loop calls [`Transport`]
//! methods, so implementations need no internal ordering guarantees beyond
//! per-call atomicity.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use refract_core::JsonValue;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Inbound activity from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected(ClientId),
    Disconnected(ClientId),
    Text { client: ClientId, text: String },
    Binary { client: ClientId, data: Vec<u8> },
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Client {0} is not connected")]
    Closed(ClientId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outgoing half of a connection.
pub trait Transport: Send + Sync {
    /// Send one text frame.
    ///
    /// # Errors
    ///
    /// Fails when the client is gone or the channel is broken.
    fn send_text(&self, client: ClientId, text: &str) -> Result<(), TransportError>;

    /// Send one binary frame.
    ///
    /// # Errors
    ///
    /// Fails when the client is gone or the channel is broken.
    fn send_binary(&self, client: ClientId, data: &[u8]) -> Result<(), TransportError>;
}

/// One recorded outgoing frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Text { client: ClientId, text: String },
    Binary { client: ClientId, data: Vec<u8> },
}

#[derive(Debug, Default)]
struct MemoryState {
    sent: Vec<Outgoing>,
    closed: HashSet<ClientId>,
}

/// In-process transport recording every frame. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain every frame recorded so far.
    #[must_use]
    pub fn take(&self) -> Vec<Outgoing> {
        std::mem::take(&mut self.lock().sent)
    }

    /// Drain the text frames sent to `client`, leaving the rest recorded.
    #[must_use]
    pub fn take_text(&self, client: ClientId) -> Vec<String> {
        let mut state = self.lock();
        let (mine, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut state.sent)
            .into_iter()
            .partition(|frame| matches!(frame, Outgoing::Text { client: to, .. } if *to == client));
        state.sent = rest;
        mine.into_iter()
            .filter_map(|frame| match frame {
                Outgoing::Text { text, .. } => Some(text),
                Outgoing::Binary { .. } => None,
            })
            .collect()
    }

    /// [`take_text`](Self::take_text), parsed. Frames that are not JSON
    /// are skipped.
    #[must_use]
    pub fn take_json(&self, client: ClientId) -> Vec<JsonValue> {
        self.take_text(client)
            .iter()
            .filter_map(|text| serde_json::from_str(text).ok())
            .collect()
    }

    /// Make later sends to `client` fail.
    pub fn close(&self, client: ClientId) {
        self.lock().closed.insert(client);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, client: ClientId, frame: Outgoing) -> Result<(), TransportError> {
        let mut state = self.lock();
        if state.closed.contains(&client) {
            return Err(TransportError::Closed(client));
        }
        state.sent.push(frame);
        Ok(())
    }
}

impl Transport for MemoryTransport {
    fn send_text(&self, client: ClientId, text: &str) -> Result<(), TransportError> {
        self.record(
            client,
            Outgoing::Text {
                client,
                text: text.to_owned(),
            },
        )
    }

    fn send_binary(&self, client: ClientId, data: &[u8]) -> Result<(), TransportError> {
        self.record(
            client,
            Outgoing::Binary {
                client,
                data: data.to_vec(),
            },
        )
    }
}
