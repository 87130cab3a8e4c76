//! WebSocket handler — one task per connection, relaying frames to the hub.
//!
//! DESIGN
//! ======
//! On upgrade, assigns a socket id, registers an outbound channel with the
//! hub and enters a `select!` loop:
//! - Incoming client frames → parse, then hand to the hub
//! - Frames the hub addressed to this connection → forward to the client
//!
//! The only work done here rather than in the hub is I/O: `join_room` looks
//! the room up in the directory before the hub decides, and `save_board`
//! writes the snapshot in a background task.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → register with hub → send `connected` with `socketId`
//! 2. Client frames → hub commands; hub deliveries → client
//! 3. Close or error → hub disconnect (leave room, drop pending request)

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::frame::{ErrorCode, Frame};
use crate::hub::HubClosed;
use crate::hub::admission::{self, Decision};
use crate::protocol::{BoardPayload, Connected, JoinRoom, SocketId, event};
use crate::services::rooms::{Privacy, RoomDirectory};
use crate::state::AppState;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let socket_id = Uuid::new_v4();

    // Per-connection channel for frames the hub addresses to this client.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(state.config.ws_client_queue);
    if let Err(e) = state.hub.connect(socket_id, client_tx).await {
        error!(%socket_id, error = %e, error_code = e.error_code(), "ws: hub unavailable");
        return;
    }

    let welcome = Frame::with_payload(event::CONNECTED, &Connected { socket_id });
    if send_frame(&mut socket, &welcome).await.is_ok() {
        info!(%socket_id, "ws: client connected");
        loop {
            tokio::select! {
                msg = socket.recv() => {
                    let Some(Ok(msg)) = msg else { break };
                    match msg {
                        Message::Text(text) => {
                            if process_inbound_text(&state, socket_id, text.as_str()).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }
                Some(frame) = client_rx.recv() => {
                    if send_frame(&mut socket, &frame).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    if let Err(e) = state.hub.disconnect(socket_id).await {
        warn!(%socket_id, error = %e, "ws: disconnect after hub stopped");
    }
    info!(%socket_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame.
///
/// Malformed frames are dropped here; only a stopped hub is an error, and it
/// ends the connection.
async fn process_inbound_text(state: &AppState, socket_id: SocketId, text: &str) -> Result<(), HubClosed> {
    let frame = match Frame::parse(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(%socket_id, error = %e, error_code = e.error_code(), "ws: invalid inbound frame");
            return Ok(());
        }
    };

    if frame.event != event::CURSOR_MOVE {
        debug!(%socket_id, event = %frame.event, "ws: recv frame");
    }

    match frame.event.as_str() {
        event::JOIN_ROOM => join_room(state, socket_id, &frame).await,
        event::SAVE_BOARD => save_board(state, socket_id, &frame).await,
        _ => state.hub.dispatch(socket_id, frame).await,
    }
}

async fn join_room(state: &AppState, socket_id: SocketId, frame: &Frame) -> Result<(), HubClosed> {
    let join: JoinRoom = match frame.payload() {
        Ok(join) => join,
        Err(e) => {
            warn!(%socket_id, error = %e, error_code = e.error_code(), "ws: bad join_room");
            return Ok(());
        }
    };

    let lookup = state.rooms.get_room(&join.room_id).await;
    let room = admission::resolve(&join.room_id, lookup, OffsetDateTime::now_utc());

    // First entry into a public room puts it in the user's room history.
    let enroll = room
        .as_ref()
        .is_ok_and(|room| room.privacy == Privacy::Public && !room.is_recognized(&join.user.id));

    let user_id = join.user.id.clone();
    let decision = state.hub.join(socket_id, join.user, room).await?;
    if enroll && decision == Decision::Admitted {
        enroll_fire_and_forget(state.rooms.clone(), join.room_id, user_id);
    }
    Ok(())
}

async fn save_board(state: &AppState, socket_id: SocketId, frame: &Frame) -> Result<(), HubClosed> {
    let board: BoardPayload = match frame.payload() {
        Ok(board) => board,
        Err(e) => {
            warn!(%socket_id, error = %e, error_code = e.error_code(), "ws: bad save_board");
            return Ok(());
        }
    };

    if !state.hub.is_member(socket_id, board.room_id.clone()).await? {
        warn!(%socket_id, room_id = %board.room_id, "ws: save_board from non-member ignored");
        return Ok(());
    }
    save_fire_and_forget(state.rooms.clone(), board.room_id, board.elements);
    Ok(())
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match frame.to_json() {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, event = %frame.event, "ws: failed to serialize frame");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

fn enroll_fire_and_forget(rooms: Arc<dyn RoomDirectory>, room_id: String, user_id: String) {
    tokio::spawn(async move {
        if let Err(e) = rooms.enroll(&room_id, &user_id).await {
            error!(%room_id, %user_id, error = %e, error_code = e.error_code(), retryable = e.retryable(), "room enroll failed");
        }
    });
}

fn save_fire_and_forget(rooms: Arc<dyn RoomDirectory>, room_id: String, elements: Vec<Value>) {
    tokio::spawn(async move {
        match rooms.save_snapshot(&room_id, &elements).await {
            Ok(()) => debug!(%room_id, elements = elements.len(), "board saved"),
            Err(e) => {
                error!(%room_id, error = %e, error_code = e.error_code(), retryable = e.retryable(), "board save failed");
            }
        }
    });
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
