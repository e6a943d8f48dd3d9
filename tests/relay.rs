//! End-to-end tests: a real server on an ephemeral port, driven over
//! WebSocket and HTTP.

#![allow(clippy::panic, missing_docs)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use thief_relay::app::{build_app, build_state};
use thief_relay::config::RelayConfig;
use thief_relay::domain::BroadcastGateway;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

async fn spawn_server() -> (SocketAddr, Arc<BroadcastGateway>) {
    let (state, gateway) = build_state(&RelayConfig::default());
    let app = build_app(state);

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("failed to bind test listener");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("listener has no local address");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, gateway)
}

/// WebSocket test client that buffers frames so tests can wait for a
/// specific frame type without losing the others.
struct Client {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    pending: VecDeque<Value>,
    next_id: u32,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let Ok((ws, _)) = connect_async(format!("ws://{addr}/ws")).await else {
            panic!("websocket connect failed");
        };
        Self {
            ws,
            pending: VecDeque::new(),
            next_id: 0,
        }
    }

    async fn send(&mut self, payload: Value) -> String {
        self.next_id += 1;
        let id = format!("c{}", self.next_id);
        let frame = json!({ "id": id, "type": "command", "payload": payload }).to_string();
        if self.ws.send(Message::text(frame)).await.is_err() {
            panic!("websocket send failed");
        }
        id
    }

    async fn read_frame(&mut self) -> Value {
        loop {
            let Ok(next) = tokio::time::timeout(RECV_TIMEOUT, self.ws.next()).await else {
                panic!("timed out waiting for a frame");
            };
            let Some(Ok(msg)) = next else {
                panic!("websocket closed unexpectedly");
            };
            if let Message::Text(text) = msg {
                let Ok(value) = serde_json::from_str::<Value>(text.as_str()) else {
                    panic!("frame is not JSON");
                };
                return value;
            }
        }
    }

    /// Returns the first frame of `frame_type`, keeping the others queued.
    async fn expect(&mut self, frame_type: &str) -> Value {
        if let Some(pos) = self.pending.iter().position(|f| f["type"] == frame_type)
            && let Some(frame) = self.pending.remove(pos)
        {
            return frame;
        }
        loop {
            let frame = self.read_frame().await;
            if frame["type"] == frame_type {
                return frame;
            }
            self.pending.push_back(frame);
        }
    }

    /// Returns the envelope of the next broadcast event.
    async fn next_event(&mut self) -> Value {
        self.expect("event").await["payload"].clone()
    }

    async fn subscribe(&mut self, room_id: i64) {
        self.send(json!({ "command": "subscribe", "roomId": room_id })).await;
        let response = self.expect("response").await;
        assert_eq!(response["payload"]["subscribed"], room_id);
    }

    async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}

async fn get_json(url: String) -> Value {
    let Ok(response) = reqwest::get(url).await else {
        panic!("GET failed");
    };
    let Ok(body) = response.json::<Value>().await else {
        panic!("GET body is not JSON");
    };
    body
}

async fn member_count(addr: SocketAddr, room_id: i64) -> u64 {
    let body = get_json(format!("http://{addr}/api/v1/rooms/{room_id}")).await;
    let Some(count) = body["memberCount"].as_u64() else {
        panic!("memberCount missing: {body}");
    };
    count
}

#[tokio::test]
async fn alice_and_bob_join_and_leave() {
    let (addr, _gateway) = spawn_server().await;
    let mut alice = Client::connect(addr).await;
    let mut bob = Client::connect(addr).await;
    alice.subscribe(42).await;
    bob.subscribe(42).await;

    alice
        .send(json!({ "command": "join", "roomId": 42, "playerId": 1, "nickname": "Alice" }))
        .await;
    let ack = alice.expect("response").await;
    assert_eq!(ack["payload"]["accepted"], "JOIN");
    assert_eq!(ack["payload"]["memberCount"], 1);

    let joined = bob.next_event().await;
    assert_eq!(joined["type"], "JOIN");
    assert_eq!(joined["roomId"], 42);
    assert_eq!(joined["senderId"], 1);
    assert_eq!(joined["payload"], json!({ "nickname": "Alice", "memberCount": 1 }));
    assert!(joined["timestamp"].is_i64());

    bob.send(json!({ "command": "join", "roomId": 42, "playerId": 2, "nickname": "Bob" }))
        .await;
    assert_eq!(bob.expect("response").await["payload"]["memberCount"], 2);
    assert_eq!(member_count(addr, 42).await, 2);

    alice
        .send(json!({ "command": "leave", "roomId": 42, "playerId": 1 }))
        .await;
    let _ = alice.expect("response").await;
    let _ = bob.next_event().await; // Bob's own JOIN
    let left = bob.next_event().await;
    assert_eq!(left["type"], "LEAVE");
    assert_eq!(left["payload"], json!({ "memberCount": 1 }));

    bob.send(json!({ "command": "leave", "roomId": 42, "playerId": 2 }))
        .await;
    assert_eq!(bob.expect("response").await["payload"]["memberCount"], 0);
    assert_eq!(member_count(addr, 42).await, 0);

    let rooms = get_json(format!("http://{addr}/api/v1/rooms")).await;
    assert_eq!(rooms["total"], 0);
}

#[tokio::test]
async fn tag_on_empty_room_is_broadcast() {
    let (addr, _gateway) = spawn_server().await;
    let mut watcher = Client::connect(addr).await;
    watcher.subscribe(7).await;

    let Ok(response) = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/rooms/7/tag"))
        .json(&json!({ "taggerId": 10, "targetId": 11, "qrCode": "QR-ABC" }))
        .send()
        .await
    else {
        panic!("POST failed");
    };
    assert_eq!(response.status().as_u16(), 202);

    let tag = watcher.next_event().await;
    assert_eq!(tag["type"], "TAG");
    assert_eq!(tag["senderId"], 10);
    assert_eq!(tag["payload"], json!({ "targetId": 11, "qrCode": "QR-ABC" }));
    assert_eq!(member_count(addr, 7).await, 0);
}

#[tokio::test]
async fn invalid_events_are_rejected_to_sender_only() {
    let (addr, _gateway) = spawn_server().await;
    let mut sender = Client::connect(addr).await;
    let mut watcher = Client::connect(addr).await;
    watcher.subscribe(3).await;

    let id = sender
        .send(json!({ "command": "tag", "roomId": 3, "taggerId": 1, "targetId": 2, "qrCode": "" }))
        .await;
    let err = sender.expect("error").await;
    assert_eq!(err["id"], id);
    assert_eq!(err["payload"]["code"], 1001);

    sender
        .send(json!({ "command": "join", "roomId": 3, "playerId": 1 }))
        .await;
    let _ = sender.expect("error").await;
    assert_eq!(member_count(addr, 3).await, 0);

    let Ok(response) = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/rooms/3/tag"))
        .json(&json!({ "taggerId": 1, "targetId": 2, "qrCode": "   " }))
        .send()
        .await
    else {
        panic!("POST failed");
    };
    assert_eq!(response.status().as_u16(), 400);
    let Ok(body) = response.json::<Value>().await else {
        panic!("error body is not JSON");
    };
    assert_eq!(body["error"]["code"], 1001);

    // A valid start afterwards is the first thing the watcher sees.
    sender
        .send(json!({ "command": "start", "roomId": 3, "hostId": 1 }))
        .await;
    let start = watcher.next_event().await;
    assert_eq!(start["type"], "START");
    assert_eq!(start["payload"], json!({ "status": "started" }));
}

#[tokio::test]
async fn events_arrive_in_publish_order() {
    let (addr, _gateway) = spawn_server().await;
    let mut player = Client::connect(addr).await;
    let mut watcher = Client::connect(addr).await;
    watcher.subscribe(9).await;

    player
        .send(json!({ "command": "join", "roomId": 9, "playerId": 1, "nickname": "Runner" }))
        .await;
    player
        .send(json!({ "command": "start", "roomId": 9, "hostId": 1 }))
        .await;
    for step in 0..5 {
        player
            .send(json!({
                "command": "location", "roomId": 9, "playerId": 1,
                "latitude": 37.5 + f64::from(step) * 0.001, "longitude": 127.0, "accuracy": 5.0
            }))
            .await;
    }
    player
        .send(json!({ "command": "tag", "roomId": 9, "taggerId": 1, "targetId": 2, "qrCode": "QR-9" }))
        .await;

    let mut seen = Vec::new();
    for _ in 0..8 {
        let event = watcher.next_event().await;
        seen.push(event["type"].as_str().map(str::to_string).unwrap_or_default());
    }
    let expected: Vec<String> = ["JOIN", "START"]
        .into_iter()
        .chain(std::iter::repeat_n("LOCATION", 5))
        .chain(["TAG"])
        .map(str::to_string)
        .collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn closing_socket_leaves_joined_rooms() {
    let (addr, _gateway) = spawn_server().await;
    let mut player = Client::connect(addr).await;
    let mut watcher = Client::connect(addr).await;
    watcher.subscribe(5).await;

    player
        .send(json!({ "command": "join", "roomId": 5, "playerId": 77, "nickname": "Ghost" }))
        .await;
    let _ = player.expect("response").await;
    assert_eq!(watcher.next_event().await["type"], "JOIN");

    player.close().await;

    let left = watcher.next_event().await;
    assert_eq!(left["type"], "LEAVE");
    assert_eq!(left["senderId"], 77);
    assert_eq!(left["payload"]["memberCount"], 0);
    assert_eq!(member_count(addr, 5).await, 0);
}

#[tokio::test]
async fn closed_gateway_reports_unavailable() {
    let (addr, gateway) = spawn_server().await;
    gateway.close();

    let Ok(response) = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/rooms/1/start"))
        .json(&json!({ "hostId": 1 }))
        .send()
        .await
    else {
        panic!("POST failed");
    };
    assert_eq!(response.status().as_u16(), 503);

    let mut player = Client::connect(addr).await;
    player
        .send(json!({ "command": "join", "roomId": 1, "playerId": 1, "nickname": "Late" }))
        .await;
    let err = player.expect("error").await;
    assert_eq!(err["payload"]["code"], 3002);
    // The membership change is kept even though nobody was told.
    assert_eq!(member_count(addr, 1).await, 1);
}

#[tokio::test]
async fn health_reports_ok() {
    let (addr, _gateway) = spawn_server().await;
    let body = get_json(format!("http://{addr}/health")).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["rooms"], 0);
}
