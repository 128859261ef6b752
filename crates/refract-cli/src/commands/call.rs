use anyhow::Context;
use refract_config::RefractConfig;
use refract_core::{JsonValue, expect_object, stringify};
use refract_rpc::{Server, Transport, TransportEvent};
use serde_json::json;

use crate::cli::CallArgs;
use crate::scene;
use crate::stdio::{STDIO_CLIENT, StdioTransport};

/// Binary frame size used for `--upload`.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Handle `rfx call`.
pub async fn handle(args: &CallArgs, config: &RefractConfig) -> anyhow::Result<()> {
    let params: JsonValue = match &args.params {
        Some(text) => {
            refract_core::parse(text).with_context(|| format!("params are not valid JSON: {text}"))?
        }
        None => JsonValue::Null,
    };
    let upload = match &args.upload {
        Some(path) => {
            let chunks_id = expect_object(&params)
                .context("--upload needs object params")?
                .get("chunks_id")
                .and_then(JsonValue::as_str)
                .context("--upload needs params with a string 'chunks_id'")?
                .to_owned();
            let data = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read upload file {}", path.display()))?;
            Some((chunks_id, data))
        }
        None => None,
    };

    let mut server = Server::new(scene::dispatcher(), StdioTransport, config.rpc.clone());
    server.handle(TransportEvent::Connected(STDIO_CLIENT));
    submit(&mut server, json!(1), &args.method, params);
    if let Some((chunks_id, data)) = upload {
        submit(&mut server, json!(2), "chunk", json!({"id": chunks_id}));
        for chunk in data.chunks(UPLOAD_CHUNK_SIZE) {
            server.handle(TransportEvent::Binary {
                client: STDIO_CLIENT,
                data: chunk.to_vec(),
            });
        }
    }

    super::drain(&mut server).await;
    Ok(())
}

fn submit<T: Transport>(server: &mut Server<T>, id: JsonValue, method: &str, params: JsonValue) {
    let request = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});
    server.handle(TransportEvent::Text {
        client: STDIO_CLIENT,
        text: stringify(&request),
    });
}
