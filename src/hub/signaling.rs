//! Signaling relay — peer-connection handshakes between two room members.
//!
//! DESIGN
//! ======
//! Handshake blobs are opaque; the relay only routes them. A newcomer asks
//! for the roster of media-ready peers (`join_video`) and then offers to
//! each one (`sending_signal` -> `user_joined_video`); each peer answers
//! (`returning_signal` -> `receiving_returned_signal`).
//!
//! The caller identity on every relayed payload is the sender's own
//! connection, never a client-supplied value. Targets must share the
//! sender's room. A target that has gone away is dropped silently.

use tracing::{debug, warn};

use super::Delivery;
use super::registry::RoomRegistry;
use crate::frame::Frame;
use crate::protocol::{PeerAnswer, PeerOffer, ReturningSignal, SendingSignal, SocketId, event};

/// Mark `sender` media-ready and reply with the other media-ready members.
pub fn join_video(registry: &mut RoomRegistry, sender: SocketId, room_id: &str) -> Vec<Delivery> {
    if !registry.is_member(room_id, sender) {
        warn!(%room_id, socket_id = %sender, "join_video from non-member ignored");
        return Vec::new();
    }
    let peers = registry.media_peers(room_id, sender);
    registry.set_media_ready(room_id, sender, true);
    debug!(%room_id, socket_id = %sender, peers = peers.len(), "joined video");
    vec![Delivery::direct(sender, Frame::with_payload(event::ALL_VIDEO_USERS, &peers))]
}

/// Clear the media flag and tell the remaining media peers.
pub fn leave_video(registry: &mut RoomRegistry, sender: SocketId, room_id: &str) -> Vec<Delivery> {
    let was_ready = registry
        .room(room_id)
        .and_then(|room| room.participants().iter().find(|p| p.socket_id == sender))
        .is_some_and(|p| p.media_ready);
    if !was_ready {
        return Vec::new();
    }
    registry.set_media_ready(room_id, sender, false);
    peer_left(sender, &registry.media_peers(room_id, sender))
}

/// Relay an offer from `sender` to `userToSignal`.
pub fn sending_signal(registry: &RoomRegistry, sender: SocketId, payload: SendingSignal) -> Vec<Delivery> {
    let target = payload.user_to_signal;
    if !same_room(registry, sender, target) {
        debug!(socket_id = %sender, %target, "sending_signal to stale target dropped");
        return Vec::new();
    }
    let offer = PeerOffer { signal: payload.signal, caller_id: sender };
    vec![Delivery::direct(target, Frame::with_payload(event::USER_JOINED_VIDEO, &offer))]
}

/// Relay an answer from `sender` back to the original caller.
pub fn returning_signal(registry: &RoomRegistry, sender: SocketId, payload: ReturningSignal) -> Vec<Delivery> {
    let target = payload.caller_id;
    if !same_room(registry, sender, target) {
        debug!(socket_id = %sender, %target, "returning_signal to stale target dropped");
        return Vec::new();
    }
    let answer = PeerAnswer { signal: payload.signal, id: sender };
    vec![Delivery::direct(target, Frame::with_payload(event::RECEIVING_RETURNED_SIGNAL, &answer))]
}

/// `user_left_video` to each of `peers`.
#[must_use]
pub fn peer_left(departed: SocketId, peers: &[SocketId]) -> Vec<Delivery> {
    peers
        .iter()
        .map(|peer| Delivery::direct(*peer, Frame::new(event::USER_LEFT_VIDEO, departed.to_string())))
        .collect()
}

fn same_room(registry: &RoomRegistry, a: SocketId, b: SocketId) -> bool {
    a != b
        && registry
            .member_room(a)
            .is_some_and(|room_id| registry.is_member(room_id, b))
}

#[cfg(test)]
#[path = "signaling_test.rs"]
mod tests;
