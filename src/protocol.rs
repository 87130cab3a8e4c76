//! Wire protocol — event names and payload shapes.
//!
//! DESIGN
//! ======
//! Field names follow the existing browser clients exactly (`roomId`,
//! `socketId`, `callerID`, `_id`). Whiteboard elements and chat messages
//! are carried as raw JSON on the server side; the typed versions live in
//! `crate::board` and are only decoded by the client model.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Room identifier as issued by the room directory (six-character code).
pub type RoomId = String;

/// Transport identity of one websocket connection.
pub type SocketId = Uuid;

// =============================================================================
// EVENT NAMES
// =============================================================================

pub mod event {
    // Connection
    pub const CONNECTED: &str = "connected";

    // Admission
    pub const JOIN_ROOM: &str = "join_room";
    pub const LEAVE_ROOM: &str = "leave_room";
    pub const APPROVE_JOIN: &str = "approve_join";
    pub const DENY_JOIN: &str = "deny_join";
    pub const JOIN_PENDING: &str = "join_pending";
    pub const JOIN_APPROVED: &str = "join_approved";
    pub const JOIN_DENIED: &str = "join_denied";
    pub const REQUEST_JOIN: &str = "request_join";
    pub const ROOM_ERROR: &str = "room_error";
    pub const USERS_UPDATED: &str = "users_updated";

    // Board and room broadcast
    pub const DRAW: &str = "draw";
    pub const SYNC_BOARD: &str = "sync_board";
    pub const CLEAR_BOARD: &str = "clear_board";
    pub const SAVE_BOARD: &str = "save_board";
    pub const CURSOR_MOVE: &str = "cursor_move";
    pub const CHAT_MESSAGE: &str = "chat_message";
    pub const REACTION: &str = "reaction";
    pub const POLL_VOTE: &str = "poll_vote";

    // Signaling
    pub const JOIN_VIDEO: &str = "join_video";
    pub const LEAVE_VIDEO: &str = "leave_video";
    pub const ALL_VIDEO_USERS: &str = "all_video_users";
    pub const SENDING_SIGNAL: &str = "sending_signal";
    pub const USER_JOINED_VIDEO: &str = "user_joined_video";
    pub const RETURNING_SIGNAL: &str = "returning_signal";
    pub const RECEIVING_RETURNED_SIGNAL: &str = "receiving_returned_signal";
    pub const USER_LEFT_VIDEO: &str = "user_left_video";
}

// =============================================================================
// IDENTITY
// =============================================================================

/// Pre-authenticated user identity as supplied by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connected {
    pub socket_id: SocketId,
}

// =============================================================================
// ADMISSION PAYLOADS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    pub room_id: RoomId,
    pub user: UserIdentity,
}

/// Payload of `leave_room`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRef {
    pub room_id: RoomId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveJoin {
    pub socket_id: SocketId,
    pub room_id: RoomId,
    /// Echoed by clients; the identity recorded in the waiting area wins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserIdentity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DenyJoin {
    pub socket_id: SocketId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
}

/// Direct notification to the host: `request_join`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub socket_id: SocketId,
    pub user: UserIdentity,
}

// =============================================================================
// BOARD PAYLOADS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawPayload<E = Value> {
    pub room_id: RoomId,
    pub draw_data: E,
}

/// Payload of `sync_board` and `save_board`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardPayload<E = Value> {
    pub room_id: RoomId,
    pub elements: Vec<E>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorData {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorMove {
    pub room_id: RoomId,
    pub cursor_data: CursorData,
}

/// Outbound `cursor_move`: the cursor tagged with its sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorUpdate {
    #[serde(flatten)]
    pub cursor: CursorData,
    pub socket_id: SocketId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload<M = Value> {
    pub room_id: RoomId,
    pub message: M,
}

/// `reaction` is relayed with its room id intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub room_id: RoomId,
    pub emoji: String,
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollVote {
    pub room_id: RoomId,
    pub message_id: String,
    pub option_index: usize,
    pub voter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollVoteUpdate {
    pub message_id: String,
    pub option_index: usize,
    pub voter: String,
}

impl From<PollVote> for PollVoteUpdate {
    fn from(vote: PollVote) -> Self {
        Self { message_id: vote.message_id, option_index: vote.option_index, voter: vote.voter }
    }
}

// =============================================================================
// SIGNALING PAYLOADS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendingSignal {
    pub user_to_signal: SocketId,
    /// Ignored on receipt; the relay stamps the sender's own identity.
    #[serde(rename = "callerID", default, skip_serializing_if = "Option::is_none")]
    pub caller_id: Option<SocketId>,
    pub signal: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturningSignal {
    #[serde(rename = "callerID")]
    pub caller_id: SocketId,
    pub signal: Value,
}

/// Outbound `user_joined_video`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerOffer {
    pub signal: Value,
    #[serde(rename = "callerID")]
    pub caller_id: SocketId,
}

/// Outbound `receiving_returned_signal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerAnswer {
    pub signal: Value,
    pub id: SocketId,
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
