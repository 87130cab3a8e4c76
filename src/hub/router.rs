//! Broadcast router — room fan-out for board, chat and presence events.
//!
//! Every routed event goes to everyone in the named room except the sender.
//! Payloads are reshaped to the outbound form (room id stripped, cursor
//! tagged with the sender) but element and message bodies pass through
//! untouched. Senders that are not members of the named room are ignored.

use serde_json::Value;
use tracing::warn;

use super::Delivery;
use super::registry::RoomRegistry;
use crate::frame::{Frame, FrameError};
use crate::protocol::{
    BoardPayload, ChatPayload, CursorMove, CursorUpdate, DrawPayload, PollVote, PollVoteUpdate, Reaction, RoomId,
    SocketId, event,
};

/// Route one board/chat/presence frame.
///
/// # Errors
///
/// Returns [`FrameError::Payload`] if the payload does not match the event.
pub fn route(registry: &RoomRegistry, sender: SocketId, frame: &Frame) -> Result<Vec<Delivery>, FrameError> {
    let (room_id, outbound): (RoomId, Frame) = match frame.event.as_str() {
        event::DRAW => {
            let draw: DrawPayload = frame.payload()?;
            (draw.room_id, Frame::new(event::DRAW, draw.draw_data))
        }
        event::SYNC_BOARD => {
            let board: BoardPayload = frame.payload()?;
            (board.room_id, Frame::new(event::SYNC_BOARD, Value::Array(board.elements)))
        }
        event::CLEAR_BOARD => (frame.payload()?, Frame::empty(event::CLEAR_BOARD)),
        event::CURSOR_MOVE => {
            let cursor: CursorMove = frame.payload()?;
            let update = CursorUpdate { cursor: cursor.cursor_data, socket_id: sender };
            (cursor.room_id, Frame::with_payload(event::CURSOR_MOVE, &update))
        }
        event::CHAT_MESSAGE => {
            let chat: ChatPayload = frame.payload()?;
            (chat.room_id, Frame::new(event::CHAT_MESSAGE, chat.message))
        }
        event::REACTION => {
            let reaction: Reaction = frame.payload()?;
            let outbound = Frame::with_payload(event::REACTION, &reaction);
            (reaction.room_id, outbound)
        }
        event::POLL_VOTE => {
            let vote: PollVote = frame.payload()?;
            let room_id = vote.room_id.clone();
            (room_id, Frame::with_payload(event::POLL_VOTE, &PollVoteUpdate::from(vote)))
        }
        other => {
            warn!(socket_id = %sender, event = other, "unknown event dropped");
            return Ok(Vec::new());
        }
    };

    if !registry.is_member(&room_id, sender) {
        if frame.event != event::CURSOR_MOVE {
            warn!(%room_id, socket_id = %sender, event = %frame.event, "event from non-member dropped");
        }
        return Ok(Vec::new());
    }
    Ok(vec![Delivery::room(room_id, outbound, Some(sender))])
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
