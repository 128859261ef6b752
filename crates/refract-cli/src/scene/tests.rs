use pretty_assertions::assert_eq;
use refract_config::RpcConfig;
use refract_rpc::{ClientId, MemoryTransport, Server, TransportEvent};
use serde_json::json;

use super::dispatcher;

const CLIENT: ClientId = ClientId(3);

fn server() -> (Server<MemoryTransport>, MemoryTransport) {
    let transport = MemoryTransport::new();
    let server = Server::new(dispatcher(), transport.clone(), RpcConfig::default());
    (server, transport)
}

fn call(server: &mut Server<MemoryTransport>, transport: &MemoryTransport, method: &str, params: serde_json::Value) -> serde_json::Value {
    server.handle(TransportEvent::Text {
        client: CLIENT,
        text: json!({"jsonrpc": "2.0", "id": method, "method": method, "params": params}).to_string(),
    });
    transport.take_json(CLIENT).pop().expect("a reply")
}

#[test]
fn camera_updates_are_partial() {
    let (mut server, transport) = server();
    let reply = call(&mut server, &transport, "get-camera", json!({}));
    assert_eq!(
        reply["result"],
        json!({
            "current": "perspective",
            "position": [0.0, 0.0, 1.0],
            "target": [0.0, 0.0, 0.0],
            "up": [0.0, 1.0, 0.0]
        })
    );

    call(&mut server, &transport, "set-camera", json!({"position": [1, 2, 3], "up": [0, 1]}));
    let camera = call(&mut server, &transport, "get-camera", json!(null))["result"].clone();
    assert_eq!(camera["position"], json!([1.0, 2.0, 3.0]));
    assert_eq!(camera["up"], json!([0.0, 1.0, 0.0]));
    assert_eq!(camera["current"], json!("perspective"));
}

#[test]
fn renderer_params_use_snake_case_and_reject_bad_updates() {
    let (mut server, transport) = server();
    let params = call(&mut server, &transport, "get-renderer-params", json!(null))["result"].clone();
    assert_eq!(params["samples_per_pixel"], json!(1));
    assert_eq!(params["denoiser"], json!("none"));

    let reply = call(
        &mut server,
        &transport,
        "set-renderer-params",
        json!({"max_ray_depth": 8, "denoiser": "fast"}),
    );
    assert_eq!(reply["result"], json!(null));

    let reply = call(&mut server, &transport, "set-renderer-params", json!({"engine_version": "9"}));
    assert_eq!(reply["error"]["code"], json!(-32602));

    let params = call(&mut server, &transport, "get-renderer-params", json!(null))["result"].clone();
    assert_eq!(params["max_ray_depth"], json!(8));
    assert_eq!(params["denoiser"], json!("fast"));
}

#[test]
fn renderer_schema_carries_metadata() {
    let dispatcher = dispatcher();
    let schema = dispatcher
        .endpoints()
        .get("set-renderer-params")
        .unwrap()
        .to_json()
        .unwrap();
    let properties = &schema["params"][0]["properties"];
    assert_eq!(
        properties["alpha_correction"],
        json!({
            "title": "Alpha correction",
            "type": "number",
            "minimum": 0.001,
            "maximum": 1.0,
            "default": 0.5
        })
    );
    assert_eq!(properties["engine_version"]["readOnly"], json!(true));
}

#[test]
fn clip_planes_lifecycle() {
    let (mut server, transport) = server();
    let first = call(&mut server, &transport, "add-clip-plane", json!([1, 0, 0, 0]));
    assert_eq!(first["result"], json!({"id": 0, "plane": [1.0, 0.0, 0.0, 0.0]}));
    call(&mut server, &transport, "add-clip-plane", json!([0, 1, 0, -1]));

    let reply = call(&mut server, &transport, "add-clip-plane", json!([0, 1]));
    assert_eq!(reply["error"]["code"], json!(-32602));

    call(&mut server, &transport, "remove-clip-planes", json!([0, 42]));
    let planes = call(&mut server, &transport, "get-clip-planes", json!(null));
    assert_eq!(planes["result"], json!([{"id": 1, "plane": [0.0, 1.0, 0.0, -1.0]}]));
}

#[test]
fn removing_unknown_model_is_not_found() {
    let (mut server, transport) = server();
    let reply = call(&mut server, &transport, "remove-model", json!([4]));
    assert_eq!(
        reply["error"],
        json!({"code": -32001, "message": "Model 4 not found"})
    );
}

#[tokio::test]
async fn upload_then_snapshot_sees_the_model() {
    let (mut server, transport) = server();
    server.handle(TransportEvent::Text {
        client: CLIENT,
        text: r#"{"jsonrpc":"2.0","id":1,"method":"upload-model","params":{"chunks_id":"m","size":4,"name":"cube"}}"#.into(),
    });
    server.handle(TransportEvent::Text {
        client: CLIENT,
        text: r#"{"jsonrpc":"2.0","id":2,"method":"chunk","params":{"id":"m"}}"#.into(),
    });
    server.handle(TransportEvent::Binary {
        client: CLIENT,
        data: vec![1, 2, 3, 4],
    });
    server.wait_for_tasks().await;

    let replies = transport.take_json(CLIENT);
    assert_eq!(
        replies.last().unwrap()["result"],
        json!({"id": 0, "name": "cube", "size": 4, "visible": true})
    );

    server.handle(TransportEvent::Text {
        client: CLIENT,
        text: r#"{"jsonrpc":"2.0","method":"set-shading","params":{"shading":"electron"}}"#.into(),
    });
    server.handle(TransportEvent::Text {
        client: CLIENT,
        text: r#"{"jsonrpc":"2.0","id":3,"method":"snapshot","params":{"size":[8,8],"samples_per_pixel":2}}"#.into(),
    });
    server.wait_for_tasks().await;

    let replies = transport.take_json(CLIENT);
    let progress: Vec<_> = replies
        .iter()
        .filter(|message| message["method"] == "progress")
        .map(|message| message["params"]["amount"].clone())
        .collect();
    assert_eq!(progress, [json!(0.5), json!(1.0)]);
    assert_eq!(
        replies.last().unwrap()["result"],
        json!({"size": [8, 8], "samples": 2, "shading": "electron", "models": 1})
    );
}

#[tokio::test]
async fn snapshot_can_be_cancelled() {
    let (mut server, transport) = server();
    server.handle(TransportEvent::Text {
        client: CLIENT,
        text: r#"{"jsonrpc":"2.0","id":"s","method":"snapshot","params":{"samples_per_pixel":200}}"#.into(),
    });
    server.handle(TransportEvent::Text {
        client: CLIENT,
        text: r#"{"jsonrpc":"2.0","id":"c","method":"cancel","params":{"id":"s"}}"#.into(),
    });
    server.wait_for_tasks().await;

    let last = transport.take_json(CLIENT).pop().unwrap();
    assert_eq!(last["id"], json!("s"));
    assert_eq!(last["error"]["code"], json!(-32003));
}
