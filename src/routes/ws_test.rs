use super::*;
use crate::services::rooms::{MemoryRoomDirectory, Privacy};
use crate::state::test_helpers::{FailingSaves, seed_room, test_app_state, test_app_state_with_rooms};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

// =============================================================================
// Helpers
// =============================================================================

async fn serve(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, crate::routes::app(state)).await.unwrap();
    });
    addr
}

/// Open a websocket and consume the `connected` greeting.
async fn connect(addr: SocketAddr) -> (Client, SocketId) {
    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let hello = recv_frame(&mut ws).await;
    assert_eq!(hello.event, event::CONNECTED);
    let socket_id = hello.data["socketId"].as_str().unwrap().parse().unwrap();
    (ws, socket_id)
}

async fn send(ws: &mut Client, event: &str, data: serde_json::Value) {
    let json = Frame::new(event, data).to_json().unwrap();
    ws.send(WsMessage::Text(json.into())).await.unwrap();
}

async fn recv_frame(ws: &mut Client) -> Frame {
    loop {
        let msg = timeout(Duration::from_millis(500), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("socket closed")
            .expect("socket error");
        if let WsMessage::Text(text) = msg {
            return Frame::parse(text.as_str()).unwrap();
        }
    }
}

async fn recv_event(ws: &mut Client, event: &str) -> Frame {
    loop {
        let frame = recv_frame(ws).await;
        if frame.event == event {
            return frame;
        }
    }
}

async fn assert_no_frame(ws: &mut Client) {
    let result = timeout(Duration::from_millis(80), ws.next()).await;
    assert!(result.is_err(), "expected no frame, got {result:?}");
}

async fn join(ws: &mut Client, room_id: &str, user_id: &str, name: &str) {
    send(ws, event::JOIN_ROOM, json!({"roomId": room_id, "user": {"_id": user_id, "name": name}})).await;
}

/// Poll until `check` holds; background directory writes land asynchronously.
async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..50 {
        if check() {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    false
}

// =============================================================================
// Connection
// =============================================================================

#[tokio::test]
async fn each_connection_gets_distinct_socket_id() {
    let (state, _rooms) = test_app_state();
    let addr = serve(state).await;

    let (_a, a_id) = connect(addr).await;
    let (_b, b_id) = connect(addr).await;

    assert_ne!(a_id, b_id);
}

#[tokio::test]
async fn malformed_text_is_dropped_and_connection_survives() {
    let (state, rooms) = test_app_state();
    seed_room(&rooms, "R", "host", Privacy::Public);
    let addr = serve(state).await;
    let (mut ws, _) = connect(addr).await;

    ws.send(WsMessage::Text("not json".into())).await.unwrap();
    send(&mut ws, event::JOIN_ROOM, json!({"roomId": 7})).await;
    assert_no_frame(&mut ws).await;

    join(&mut ws, "R", "u1", "Ada").await;
    let roster = recv_event(&mut ws, event::USERS_UPDATED).await;
    assert_eq!(roster.data[0]["_id"], "u1");
}

// =============================================================================
// Admission
// =============================================================================

#[tokio::test]
async fn unknown_room_replies_room_error() {
    let (state, _rooms) = test_app_state();
    let addr = serve(state).await;
    let (mut ws, _) = connect(addr).await;

    join(&mut ws, "missing", "u1", "Ada").await;

    let frame = recv_frame(&mut ws).await;
    assert_eq!(frame.event, event::ROOM_ERROR);
    assert_eq!(frame.data, "Room not found");
}

#[tokio::test]
async fn public_join_broadcasts_roster_and_enrolls_user() {
    let (state, rooms) = test_app_state();
    seed_room(&rooms, "R", "host", Privacy::Public);
    let addr = serve(state).await;
    let (mut a, a_id) = connect(addr).await;
    let (mut b, b_id) = connect(addr).await;

    join(&mut a, "R", "u1", "Ada").await;
    recv_event(&mut a, event::USERS_UPDATED).await;
    join(&mut b, "R", "u2", "Bo").await;

    let roster = recv_event(&mut a, event::USERS_UPDATED).await;
    assert_eq!(roster.data[0]["socketId"], a_id.to_string());
    assert_eq!(roster.data[1]["socketId"], b_id.to_string());
    assert_eq!(recv_event(&mut b, event::USERS_UPDATED).await.data, roster.data);

    let enrolled = eventually(|| {
        let room = futures::executor::block_on(rooms.get_room("R")).unwrap().unwrap();
        room.is_recognized("u1") && room.is_recognized("u2")
    })
    .await;
    assert!(enrolled);
}

#[tokio::test]
async fn private_room_waits_for_host_approval() {
    let (state, rooms) = test_app_state();
    seed_room(&rooms, "P", "host", Privacy::Private);
    let addr = serve(state).await;
    let (mut host, _) = connect(addr).await;
    let (mut guest, guest_id) = connect(addr).await;

    join(&mut host, "P", "host", "Hana").await;
    recv_event(&mut host, event::USERS_UPDATED).await;

    join(&mut guest, "P", "guest", "Gus").await;
    assert_eq!(recv_frame(&mut guest).await.event, event::JOIN_PENDING);

    let request = recv_event(&mut host, event::REQUEST_JOIN).await;
    assert_eq!(request.data["socketId"], guest_id.to_string());
    assert_eq!(request.data["user"]["name"], "Gus");

    send(&mut host, event::APPROVE_JOIN, json!({"socketId": guest_id.to_string(), "roomId": "P"})).await;

    assert_eq!(recv_frame(&mut guest).await.event, event::JOIN_APPROVED);
    let roster = recv_event(&mut guest, event::USERS_UPDATED).await;
    assert_eq!(roster.data.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn private_room_without_host_is_rejected() {
    let (state, rooms) = test_app_state();
    seed_room(&rooms, "P", "host", Privacy::Private);
    let addr = serve(state).await;
    let (mut guest, _) = connect(addr).await;

    join(&mut guest, "P", "guest", "Gus").await;

    let frame = recv_frame(&mut guest).await;
    assert_eq!(frame.event, event::ROOM_ERROR);
    assert_eq!(frame.data, "Host is not currently in the room to approve entry.");
}

// =============================================================================
// Relay and persistence
// =============================================================================

#[tokio::test]
async fn draw_reaches_peers_but_not_sender() {
    let (state, rooms) = test_app_state();
    seed_room(&rooms, "R", "host", Privacy::Public);
    let addr = serve(state).await;
    let (mut a, _) = connect(addr).await;
    let (mut b, _) = connect(addr).await;
    join(&mut a, "R", "u1", "Ada").await;
    recv_event(&mut a, event::USERS_UPDATED).await;
    join(&mut b, "R", "u2", "Bo").await;
    recv_event(&mut a, event::USERS_UPDATED).await;
    recv_event(&mut b, event::USERS_UPDATED).await;

    send(&mut a, event::DRAW, json!({"roomId": "R", "drawData": {"id": "e1", "tool": "pencil"}})).await;

    let frame = recv_frame(&mut b).await;
    assert_eq!(frame.event, event::DRAW);
    assert_eq!(frame.data["id"], "e1");
    assert_no_frame(&mut a).await;
}

#[tokio::test]
async fn save_board_from_member_is_persisted() {
    let (state, rooms) = test_app_state();
    seed_room(&rooms, "R", "host", Privacy::Public);
    let addr = serve(state).await;
    let (mut ws, _) = connect(addr).await;
    join(&mut ws, "R", "u1", "Ada").await;
    recv_event(&mut ws, event::USERS_UPDATED).await;

    send(&mut ws, event::SAVE_BOARD, json!({"roomId": "R", "elements": [{"id": "e1", "tool": "rect"}]})).await;

    let saved = eventually(|| rooms.snapshot("R").is_some_and(|snap| snap.len() == 1)).await;
    assert!(saved);
    assert_no_frame(&mut ws).await;
}

#[tokio::test]
async fn save_board_from_non_member_is_ignored() {
    let (state, rooms) = test_app_state();
    seed_room(&rooms, "R", "host", Privacy::Public);
    let addr = serve(state).await;
    let (mut ws, _) = connect(addr).await;

    send(&mut ws, event::SAVE_BOARD, json!({"roomId": "R", "elements": [{"id": "e1"}]})).await;
    assert_no_frame(&mut ws).await;

    assert_eq!(rooms.snapshot("R"), Some(Vec::new()));
}

#[tokio::test]
async fn failed_save_is_not_reported_to_client() {
    let inner = MemoryRoomDirectory::new();
    seed_room(&inner, "R", "host", Privacy::Public);
    let state = test_app_state_with_rooms(Arc::new(FailingSaves { inner }));
    let addr = serve(state).await;
    let (mut ws, _) = connect(addr).await;
    join(&mut ws, "R", "u1", "Ada").await;
    recv_event(&mut ws, event::USERS_UPDATED).await;

    send(&mut ws, event::SAVE_BOARD, json!({"roomId": "R", "elements": []})).await;
    assert_no_frame(&mut ws).await;

    // Still connected and still a member.
    send(&mut ws, event::LEAVE_ROOM, json!({"roomId": "R"})).await;
    join(&mut ws, "R", "u1", "Ada").await;
    assert_eq!(recv_frame(&mut ws).await.event, event::USERS_UPDATED);
}

#[tokio::test]
async fn closing_socket_updates_remaining_roster() {
    let (state, rooms) = test_app_state();
    seed_room(&rooms, "R", "host", Privacy::Public);
    let addr = serve(state).await;
    let (mut a, a_id) = connect(addr).await;
    let (mut b, _) = connect(addr).await;
    join(&mut a, "R", "u1", "Ada").await;
    recv_event(&mut a, event::USERS_UPDATED).await;
    join(&mut b, "R", "u2", "Bo").await;
    recv_event(&mut a, event::USERS_UPDATED).await;

    b.close(None).await.unwrap();

    let roster = recv_event(&mut a, event::USERS_UPDATED).await;
    assert_eq!(roster.data, json!([{"_id": "u1", "name": "Ada", "socketId": a_id.to_string()}]));
}
