//! Stdio transport: one client, one JSON message per line.

use std::io::Write;

use refract_rpc::{ClientId, Transport, TransportError, TransportEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;

/// The only client of a stdio session.
pub const STDIO_CLIENT: ClientId = ClientId(0);

/// Writes each text frame as a line on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdioTransport;

impl Transport for StdioTransport {
    fn send_text(&self, _client: ClientId, text: &str) -> Result<(), TransportError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{text}")?;
        out.flush()?;
        Ok(())
    }

    fn send_binary(&self, _client: ClientId, data: &[u8]) -> Result<(), TransportError> {
        Err(TransportError::Io(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            format!("cannot write a {} byte binary frame to stdout", data.len()),
        )))
    }
}

/// Feed stdin lines to the server until EOF.
///
/// # Errors
///
/// Fails when stdin cannot be read.
pub async fn forward_stdin(inbound: UnboundedSender<TransportEvent>) -> std::io::Result<()> {
    if inbound.send(TransportEvent::Connected(STDIO_CLIENT)).is_err() {
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let event = TransportEvent::Text {
            client: STDIO_CLIENT,
            text: line,
        };
        if inbound.send(event).is_err() {
            tracing::debug!("server stopped, no longer reading stdin");
            break;
        }
    }
    Ok(())
}
