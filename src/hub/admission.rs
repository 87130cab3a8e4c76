//! Admission — who gets into a room, who waits, who is turned away.
//!
//! DESIGN
//! ======
//! A join attempt is decided from the externally fetched room descriptor and
//! the live registry: non-private rooms and recognized users are admitted
//! immediately; strangers to a private room are parked in its waiting area
//! while the host is present, and rejected otherwise. Pending requests are
//! resolved by the host (`approve_join` / `deny_join`) or dropped when the
//! requester leaves.
//!
//! When the host departs, every request still waiting on them is denied so
//! no requester is left pending forever.
//!
//! A user admitted on a new connection while an older one still holds their
//! seat takes that seat over. The old connection is told with `room_error`,
//! its video peers get `user_left_video`, and a host coming back this way is
//! re-sent every request still waiting.
//!
//! Every function here mutates the registry synchronously and returns the
//! frames to deliver; the coordinator applies them once the mutation is
//! complete.

use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use super::Delivery;
use super::registry::{Added, Location, Participant, PendingRequest, RoomRecord, RoomRegistry};
use crate::frame::{ErrorCode, Frame};
use crate::protocol::{JoinRequest, SocketId, UserIdentity, event};
use crate::services::rooms::{DirectoryError, Privacy, RoomDescriptor};

// =============================================================================
// TYPES
// =============================================================================

/// Terminal admission failures. `Display` is the reason sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("Room not found")]
    NotFound,
    #[error("Room has expired and is no longer available")]
    Expired,
    #[error("Host is not currently in the room to approve entry.")]
    HostAbsent,
    #[error("Host denied entry")]
    Denied,
    #[error("Room is temporarily unavailable")]
    Unavailable,
    #[error("Joined this room from another connection")]
    Replaced,
}

impl ErrorCode for AdmissionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound => "E_ROOM_NOT_FOUND",
            Self::Expired => "E_ROOM_EXPIRED",
            Self::HostAbsent => "E_HOST_ABSENT",
            Self::Denied => "E_JOIN_DENIED",
            Self::Unavailable => "E_ROOM_UNAVAILABLE",
            Self::Replaced => "E_SEAT_REPLACED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::HostAbsent | Self::Unavailable)
    }
}

/// Outcome of one join attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Admitted,
    /// Parked; `host` is the connection that was asked to decide.
    Pending { host: SocketId },
    Rejected(AdmissionError),
}

// =============================================================================
// DECISION
// =============================================================================

/// Turn a directory lookup into a usable descriptor.
///
/// # Errors
///
/// Missing rooms are [`AdmissionError::NotFound`], past-expiry rooms
/// [`AdmissionError::Expired`], and store failures
/// [`AdmissionError::Unavailable`].
pub fn resolve(
    room_id: &str,
    lookup: Result<Option<RoomDescriptor>, DirectoryError>,
    now: OffsetDateTime,
) -> Result<RoomDescriptor, AdmissionError> {
    match lookup {
        Ok(Some(room)) if room.is_expired(now) => Err(AdmissionError::Expired),
        Ok(Some(room)) => Ok(room),
        Ok(None) => Err(AdmissionError::NotFound),
        Err(e) => {
            error!(%room_id, error = %e, error_code = e.error_code(), "room lookup failed");
            Err(AdmissionError::Unavailable)
        }
    }
}

/// Pure admission rule for `user` against `room` and its live record.
#[must_use]
pub fn decide(room: &RoomDescriptor, user: &UserIdentity, live: Option<&RoomRecord>) -> Decision {
    if room.privacy != Privacy::Private || room.is_recognized(&user.id) {
        return Decision::Admitted;
    }
    match live.and_then(|record| record.member_by_user(&room.host_id)) {
        Some(host) => Decision::Pending { host: host.socket_id },
        None => Decision::Rejected(AdmissionError::HostAbsent),
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Handle a `join_room` from `socket_id`.
pub fn request(
    registry: &mut RoomRegistry,
    socket_id: SocketId,
    user: UserIdentity,
    room: Result<RoomDescriptor, AdmissionError>,
) -> (Decision, Vec<Delivery>) {
    let room = match room {
        Ok(room) => room,
        Err(e) => {
            warn!(%socket_id, error = %e, error_code = e.error_code(), "join rejected");
            let reply = Delivery::direct(socket_id, Frame::new(event::ROOM_ERROR, e.to_string()));
            return (Decision::Rejected(e), vec![reply]);
        }
    };
    let room_id = room.room_id.as_str();

    // Same transport asking again: re-announce the roster.
    if registry.is_member(room_id, socket_id) {
        return (Decision::Admitted, vec![roster(registry, room_id)]);
    }

    let decision = decide(&room, &user, registry.room(room_id));
    let mut deliveries = Vec::new();
    match &decision {
        Decision::Admitted => {
            deliveries.extend(depart(registry, socket_id));
            registry.ensure_room(room_id);
            registry.set_host(room_id, &room.host_id);
            let added = registry.add_participant(room_id, Participant::new(user, socket_id));
            info!(%room_id, %socket_id, "joined room");
            deliveries.extend(takeover(registry, room_id, socket_id, added));
            deliveries.push(roster(registry, room_id));
        }
        Decision::Pending { host } => {
            deliveries.extend(depart(registry, socket_id));
            let notice = JoinRequest { socket_id, user: user.clone() };
            if !registry.park(room_id, PendingRequest { socket_id, user }) {
                // Only reachable if the detach above emptied this very room.
                let e = AdmissionError::HostAbsent;
                deliveries.push(Delivery::direct(socket_id, Frame::new(event::ROOM_ERROR, e.to_string())));
                return (Decision::Rejected(e), deliveries);
            }
            info!(%room_id, %socket_id, host = %host, "join pending host approval");
            deliveries.push(Delivery::direct(*host, Frame::with_payload(event::REQUEST_JOIN, &notice)));
            deliveries.push(Delivery::direct(socket_id, Frame::empty(event::JOIN_PENDING)));
        }
        Decision::Rejected(e) => {
            warn!(%room_id, %socket_id, error = %e, error_code = e.error_code(), "join rejected");
            deliveries.push(Delivery::direct(socket_id, Frame::new(event::ROOM_ERROR, e.to_string())));
        }
    }
    (decision, deliveries)
}

/// Host admits a waiting connection.
pub fn approve(registry: &mut RoomRegistry, approver: SocketId, target: SocketId, room_id: &str) -> Vec<Delivery> {
    if !is_host(registry, room_id, approver) {
        warn!(%room_id, %approver, %target, "approve_join from non-host ignored");
        return Vec::new();
    }
    let Some(request) = registry.take_pending(room_id, target) else {
        debug!(%room_id, %target, "approve_join for unknown request dropped");
        return Vec::new();
    };

    let added = registry.add_participant(room_id, Participant::new(request.user, target));
    info!(%room_id, socket_id = %target, "join approved");
    let mut deliveries = vec![Delivery::direct(target, Frame::empty(event::JOIN_APPROVED))];
    deliveries.extend(takeover(registry, room_id, target, added));
    deliveries.push(roster(registry, room_id));
    deliveries
}

/// Host turns a waiting connection away. `room_hint` narrows the lookup
/// when the client supplies it.
pub fn deny(registry: &mut RoomRegistry, denier: SocketId, target: SocketId, room_hint: Option<&str>) -> Vec<Delivery> {
    let Some(Location::Waiting(room_id)) = registry.location(target).cloned() else {
        debug!(%target, "deny_join for unknown request dropped");
        return Vec::new();
    };
    if room_hint.is_some_and(|hint| hint != room_id) || !is_host(registry, &room_id, denier) {
        warn!(%room_id, %denier, %target, "deny_join from non-host ignored");
        return Vec::new();
    }

    registry.take_pending(&room_id, target);
    info!(%room_id, socket_id = %target, error_code = AdmissionError::Denied.error_code(), "join denied");
    vec![Delivery::direct(target, Frame::empty(event::JOIN_DENIED))]
}

/// Remove `socket_id` from wherever it sits. Used for `leave_room`,
/// disconnects, and before moving a connection to another room.
pub fn depart(registry: &mut RoomRegistry, socket_id: SocketId) -> Vec<Delivery> {
    match registry.location(socket_id).cloned() {
        None => Vec::new(),
        Some(Location::Waiting(room_id)) => {
            registry.take_pending(&room_id, socket_id);
            debug!(%room_id, %socket_id, "pending join abandoned");
            Vec::new()
        }
        Some(Location::Member(room_id)) => leave_room(registry, &room_id, socket_id),
    }
}

fn leave_room(registry: &mut RoomRegistry, room_id: &str, socket_id: SocketId) -> Vec<Delivery> {
    let was_host = is_host(registry, room_id, socket_id);
    let peers = registry.media_peers(room_id, socket_id);
    let Some(removed) = registry.remove_participant(room_id, socket_id) else {
        return Vec::new();
    };
    info!(%room_id, %socket_id, room_deleted = removed.room_deleted, "left room");

    let mut deliveries = Vec::new();
    if !removed.room_deleted {
        deliveries.push(roster(registry, room_id));
    }
    if removed.participant.media_ready {
        deliveries.extend(super::signaling::peer_left(socket_id, &peers));
    }

    let abandoned = if removed.room_deleted {
        removed.orphaned
    } else if was_host {
        registry.drain_pending(room_id)
    } else {
        Vec::new()
    };
    for request in abandoned {
        info!(%room_id, socket_id = %request.socket_id, error_code = AdmissionError::Denied.error_code(), "pending join denied on host departure");
        deliveries.push(Delivery::direct(request.socket_id, Frame::empty(event::JOIN_DENIED)));
    }
    deliveries
}

// =============================================================================
// HELPERS
// =============================================================================

/// Frames owed when `socket_id` took over another connection's seat.
fn takeover(registry: &RoomRegistry, room_id: &str, socket_id: SocketId, added: Added) -> Vec<Delivery> {
    let Added::Replaced { previous } = added else {
        return Vec::new();
    };
    let displaced = previous.socket_id;
    info!(%room_id, %socket_id, %displaced, "seat taken over by new connection");

    let reason = AdmissionError::Replaced.to_string();
    let mut deliveries = vec![Delivery::direct(displaced, Frame::new(event::ROOM_ERROR, reason))];
    if previous.media_ready {
        let peers = registry.media_peers(room_id, socket_id);
        deliveries.extend(super::signaling::peer_left(displaced, &peers));
    }

    // Requests parked while the host sat on the old connection.
    if is_host(registry, room_id, socket_id) {
        if let Some(room) = registry.room(room_id) {
            for pending in room.waiting() {
                let notice = JoinRequest { socket_id: pending.socket_id, user: pending.user.clone() };
                deliveries.push(Delivery::direct(socket_id, Frame::with_payload(event::REQUEST_JOIN, &notice)));
            }
        }
    }
    deliveries
}

fn is_host(registry: &RoomRegistry, room_id: &str, socket_id: SocketId) -> bool {
    registry
        .room(room_id)
        .is_some_and(|room| room.is_host_connection(socket_id))
}

/// `users_updated` to the whole room, listing members in join order.
pub(crate) fn roster(registry: &RoomRegistry, room_id: &str) -> Delivery {
    let members = registry.list_participants(room_id);
    Delivery::room(room_id, Frame::with_payload(event::USERS_UPDATED, &members), None)
}

#[cfg(test)]
#[path = "admission_test.rs"]
mod tests;
