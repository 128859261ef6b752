//! Async tasks: progress, cancellation, failures and binary uploads.

use std::time::Duration;

use pretty_assertions::assert_eq;
use refract_adapter::{JsonMessage, MessageBuilder, json_message};
use refract_config::RpcConfig;
use refract_rpc::{
    ChunkedUpload, ClientId, Dispatcher, MemoryTransport, Server, TaskContext, TaskError,
    TransportEvent, transport::Outgoing,
};
use serde_json::json;
use tokio::sync::mpsc::unbounded_channel;

const ALICE: ClientId = ClientId(1);

#[derive(Debug, Default)]
struct ModelUpload {
    chunks_id: String,
    size: u64,
}

impl JsonMessage for ModelUpload {
    fn register(message: &mut MessageBuilder<Self>) {
        message
            .field("chunks_id", |u| &u.chunks_id, |u| &mut u.chunks_id)
            .required();
        message.field("size", |u| &u.size, |u| &mut u.size).required();
    }
}

json_message!(ModelUpload);

impl ChunkedUpload for ModelUpload {
    fn chunks_id(&self) -> &str {
        &self.chunks_id
    }

    fn size(&self) -> u64 {
        self.size
    }
}

fn wait_for_cancel(context: &TaskContext) -> Result<(), TaskError> {
    loop {
        context.check_cancelled()?;
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn dispatcher() -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .bind_task("render", "Render frames", |frames: u32, context: &TaskContext| {
            for frame in 1..=frames {
                context.progress("Rendering", f64::from(frame) / f64::from(frames));
            }
            Ok(frames)
        })
        .bind_task("wait", "Run until cancelled", |(): (), context: &TaskContext| {
            wait_for_cancel(context)
        })
        .bind_task("explode", "Always panics", |(): (), _: &TaskContext| -> Result<(), TaskError> {
            panic!("boom")
        })
        .bind_upload("upload-model", "Receive a model", |upload: ModelUpload, context: &TaskContext| {
            let mut bytes = Vec::new();
            while (bytes.len() as u64) < upload.size {
                bytes.extend(context.receive_chunk()?);
            }
            context.send_binary(bytes.clone());
            Ok(bytes.len())
        });
    dispatcher
}

fn server(config: RpcConfig) -> (Server<MemoryTransport>, MemoryTransport) {
    let transport = MemoryTransport::new();
    (Server::new(dispatcher(), transport.clone(), config), transport)
}

fn send(server: &mut Server<MemoryTransport>, message: &str) {
    server.handle(TransportEvent::Text {
        client: ALICE,
        text: message.to_owned(),
    });
}

#[tokio::test]
async fn progress_precedes_the_reply() {
    let (mut server, transport) = server(RpcConfig::default());
    send(&mut server, r#"{"jsonrpc":"2.0","id":"r1","method":"render","params":2}"#);
    assert_eq!(server.running_tasks(), 1);
    server.wait_for_tasks().await;

    assert_eq!(
        transport.take_json(ALICE),
        [
            json!({"jsonrpc": "2.0", "method": "progress", "params": {"id": "r1", "operation": "Rendering", "amount": 0.5}}),
            json!({"jsonrpc": "2.0", "method": "progress", "params": {"id": "r1", "operation": "Rendering", "amount": 1.0}}),
            json!({"jsonrpc": "2.0", "id": "r1", "method": "render", "result": 2}),
        ]
    );
    assert_eq!(server.running_tasks(), 0);
}

#[tokio::test]
async fn cancel_stops_a_running_task() {
    let (mut server, transport) = server(RpcConfig::default());
    send(&mut server, r#"{"jsonrpc":"2.0","id":1,"method":"wait"}"#);
    send(&mut server, r#"{"jsonrpc":"2.0","id":2,"method":"cancel","params":{"id":1}}"#);
    server.wait_for_tasks().await;

    assert_eq!(
        transport.take_json(ALICE),
        [
            json!({"jsonrpc": "2.0", "id": 2, "method": "cancel", "result": null}),
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "wait",
                "error": {"code": -32003, "message": "Task cancelled"}
            }),
        ]
    );
}

#[tokio::test]
async fn cancel_of_unknown_task_is_not_found() {
    let (mut server, transport) = server(RpcConfig::default());
    send(&mut server, r#"{"jsonrpc":"2.0","id":2,"method":"cancel","params":{"id":"ghost"}}"#);
    assert_eq!(transport.take_json(ALICE)[0]["error"]["code"], json!(-32001));
}

#[tokio::test]
async fn duplicate_task_id_is_rejected() {
    let (mut server, transport) = server(RpcConfig::default());
    send(&mut server, r#"{"jsonrpc":"2.0","id":"w","method":"wait"}"#);
    send(&mut server, r#"{"jsonrpc":"2.0","id":"w","method":"wait"}"#);
    assert_eq!(transport.take_json(ALICE)[0]["error"]["code"], json!(-32600));
    assert_eq!(server.running_tasks(), 1);
    server.shutdown().await;
}

#[tokio::test]
async fn task_without_id_is_ignored() {
    let (mut server, transport) = server(RpcConfig::default());
    send(&mut server, r#"{"jsonrpc":"2.0","method":"render","params":1}"#);
    assert_eq!(server.running_tasks(), 0);
    assert!(transport.take().is_empty());
}

#[tokio::test]
async fn panicking_task_reports_task_failed() {
    let (mut server, transport) = server(RpcConfig::default());
    send(&mut server, r#"{"jsonrpc":"2.0","id":9,"method":"explode"}"#);
    server.wait_for_tasks().await;

    let reply = &transport.take_json(ALICE)[0];
    assert_eq!(
        reply["error"],
        json!({"code": -32000, "message": "Task panicked: boom"})
    );
}

#[tokio::test]
async fn upload_receives_selected_chunks() {
    let (mut server, transport) = server(RpcConfig::default());
    send(
        &mut server,
        r#"{"jsonrpc":"2.0","id":"u","method":"upload-model","params":{"chunks_id":"mesh","size":6}}"#,
    );
    send(&mut server, r#"{"jsonrpc":"2.0","id":"c","method":"chunk","params":{"id":"mesh"}}"#);
    for part in [b"abc".to_vec(), b"def".to_vec()] {
        server.handle(TransportEvent::Binary {
            client: ALICE,
            data: part,
        });
    }
    server.wait_for_tasks().await;

    assert_eq!(
        transport.take(),
        [
            Outgoing::Text {
                client: ALICE,
                text: r#"{"jsonrpc":"2.0","id":"c","method":"chunk","result":null}"#.into()
            },
            Outgoing::Binary {
                client: ALICE,
                data: b"abcdef".to_vec()
            },
            Outgoing::Text {
                client: ALICE,
                text: r#"{"jsonrpc":"2.0","id":"u","method":"upload-model","result":6}"#.into()
            },
        ]
    );
}

#[tokio::test]
async fn upload_limits_and_unknown_chunks() {
    let config = RpcConfig {
        max_upload_bytes: 4,
        ..RpcConfig::default()
    };
    let (mut server, transport) = server(config);
    send(
        &mut server,
        r#"{"jsonrpc":"2.0","id":1,"method":"upload-model","params":{"chunks_id":"big","size":6}}"#,
    );
    send(&mut server, r#"{"jsonrpc":"2.0","id":2,"method":"chunk","params":{"id":"big"}}"#);

    let replies = transport.take_json(ALICE);
    assert_eq!(replies[0]["error"]["code"], json!(-32602));
    assert_eq!(replies[1]["error"]["code"], json!(-32004));
    assert_eq!(server.running_tasks(), 0);
}

#[tokio::test]
async fn disconnect_cancels_client_tasks() {
    let (mut server, transport) = server(RpcConfig::default());
    send(&mut server, r#"{"jsonrpc":"2.0","id":1,"method":"wait"}"#);
    server.handle(TransportEvent::Disconnected(ALICE));
    server.wait_for_tasks().await;

    assert_eq!(server.running_tasks(), 0);
    assert!(transport.take().is_empty());
}

#[tokio::test]
async fn shutdown_joins_outstanding_tasks() {
    let (mut server, transport) = server(RpcConfig::default());
    send(&mut server, r#"{"jsonrpc":"2.0","id":1,"method":"wait"}"#);
    send(&mut server, r#"{"jsonrpc":"2.0","id":2,"method":"wait"}"#);
    server.shutdown().await;

    assert_eq!(server.running_tasks(), 0);
    let codes: Vec<_> = transport
        .take_json(ALICE)
        .iter()
        .map(|reply| reply["error"]["code"].clone())
        .collect();
    assert_eq!(codes, [json!(-32003), json!(-32003)]);
}

#[tokio::test]
async fn run_drains_inbound_until_closed() {
    let (mut server, transport) = server(RpcConfig::default());
    let (inbound, events) = unbounded_channel();
    inbound.send(TransportEvent::Connected(ALICE)).unwrap();
    inbound
        .send(TransportEvent::Text {
            client: ALICE,
            text: r#"{"jsonrpc":"2.0","id":1,"method":"render","params":1}"#.into(),
        })
        .unwrap();
    drop(inbound);

    server.run(events).await;
    server.wait_for_tasks().await;

    let replies = transport.take_json(ALICE);
    assert_eq!(replies.last().unwrap()["result"], json!(1));
}
