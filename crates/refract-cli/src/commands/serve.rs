use anyhow::Context;
use refract_config::RefractConfig;
use refract_rpc::Server;
use tokio::sync::mpsc::unbounded_channel;

use crate::scene;
use crate::stdio::{StdioTransport, forward_stdin};

/// Handle `rfx serve`.
pub async fn handle(config: &RefractConfig) -> anyhow::Result<()> {
    let mut server = Server::new(scene::dispatcher(), StdioTransport, config.rpc.clone());
    tracing::info!(endpoints = server.dispatcher().endpoints().len(), "serving on stdio");

    let (inbound, events) = unbounded_channel();
    let reader = tokio::spawn(forward_stdin(inbound));
    server.run(events).await;

    let read = reader.await.context("stdin reader task failed")?;
    super::drain(&mut server).await;
    read.context("failed to read stdin")
}
