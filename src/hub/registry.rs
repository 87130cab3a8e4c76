//! Room registry — live membership and waiting areas, keyed by room id.
//!
//! DESIGN
//! ======
//! Plain data owned by the coordinator; no locks, no I/O. Each room keeps
//! its participants in join order (for deterministic `users_updated`
//! listings) and a separate waiting area of parked join requests.
//!
//! A location index maps every placed connection to exactly one of
//! `Member(room)` or `Waiting(room)`, so a connection can never sit in two
//! rooms, two waiting areas, or a room and a waiting area at once. A room
//! record is removed as soon as its last participant leaves.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::protocol::{RoomId, SocketId, UserIdentity};

// =============================================================================
// TYPES
// =============================================================================

/// A connected user attached to a room. Serializes as a `users_updated` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(flatten)]
    pub user: UserIdentity,
    pub socket_id: SocketId,
    /// Set once the participant calls `join_video`.
    #[serde(skip)]
    pub media_ready: bool,
}

impl Participant {
    #[must_use]
    pub fn new(user: UserIdentity, socket_id: SocketId) -> Self {
        Self { user, socket_id, media_ready: false }
    }
}

/// A join request parked until the host resolves it.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub socket_id: SocketId,
    pub user: UserIdentity,
}

/// Where a connection currently sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Member(RoomId),
    Waiting(RoomId),
}

#[derive(Debug, Default)]
pub struct RoomRecord {
    /// Host user id, learned from the room descriptor at admission time.
    pub host_id: Option<String>,
    participants: Vec<Participant>,
    waiting: Vec<PendingRequest>,
}

impl RoomRecord {
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    #[must_use]
    pub fn waiting(&self) -> &[PendingRequest] {
        &self.waiting
    }

    /// Participant currently holding the given user identity.
    #[must_use]
    pub fn member_by_user(&self, user_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user.id == user_id)
    }

    /// Whether the recorded host is currently an active participant.
    #[must_use]
    pub fn host_present(&self) -> bool {
        self.host_id
            .as_deref()
            .is_some_and(|host| self.member_by_user(host).is_some())
    }

    /// Whether `socket_id` is an active participant holding the host identity.
    #[must_use]
    pub fn is_host_connection(&self, socket_id: SocketId) -> bool {
        let Some(host) = self.host_id.as_deref() else {
            return false;
        };
        self.participants
            .iter()
            .any(|p| p.socket_id == socket_id && p.user.id == host)
    }
}

/// Result of [`RoomRegistry::add_participant`].
#[derive(Debug, Clone, PartialEq)]
pub enum Added {
    Inserted,
    /// This connection was already a member; nothing changed.
    AlreadyPresent,
    /// The same user identity was present on another connection; that entry
    /// now points at the new connection, keeping its list position.
    /// `previous` is the displaced entry as it stood, media flag included.
    Replaced { previous: Participant },
}

/// Result of [`RoomRegistry::remove_participant`].
#[derive(Debug, Clone, PartialEq)]
pub struct Removed {
    pub participant: Participant,
    /// True when the room record was deleted because it became empty.
    pub room_deleted: bool,
    /// Waiting requests left behind by a deleted room.
    pub orphaned: Vec<PendingRequest>,
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, RoomRecord>,
    locations: HashMap<SocketId, Location>,
}

impl RoomRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the room record if absent. Callers must place a participant in
    /// the same step, or the record is removed again by `delete_if_empty`.
    pub fn ensure_room(&mut self, room_id: &str) -> &mut RoomRecord {
        self.rooms.entry(room_id.to_owned()).or_default()
    }

    #[must_use]
    pub fn room(&self, room_id: &str) -> Option<&RoomRecord> {
        self.rooms.get(room_id)
    }

    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    #[must_use]
    pub fn location(&self, socket_id: SocketId) -> Option<&Location> {
        self.locations.get(&socket_id)
    }

    /// Room the connection is an active member of.
    #[must_use]
    pub fn member_room(&self, socket_id: SocketId) -> Option<&str> {
        match self.locations.get(&socket_id) {
            Some(Location::Member(room_id)) => Some(room_id),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_member(&self, room_id: &str, socket_id: SocketId) -> bool {
        self.member_room(socket_id) == Some(room_id)
    }

    /// Participants in join order. Empty for unknown rooms.
    #[must_use]
    pub fn list_participants(&self, room_id: &str) -> Vec<Participant> {
        self.rooms
            .get(room_id)
            .map(|room| room.participants.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self, room_id: &str) -> bool {
        self.rooms
            .get(room_id)
            .is_none_or(|room| room.participants.is_empty())
    }

    /// Remove the record if it has no participants. Returns any waiting
    /// requests that were dropped with it.
    pub fn delete_if_empty(&mut self, room_id: &str) -> Option<Vec<PendingRequest>> {
        if !self.rooms.get(room_id)?.participants.is_empty() {
            return None;
        }
        let room = self.rooms.remove(room_id)?;
        for pending in &room.waiting {
            self.locations.remove(&pending.socket_id);
        }
        Some(room.waiting)
    }

    /// Make `participant` an active member of `room_id`.
    ///
    /// Membership is deduplicated by user identity. A connection placed in
    /// another room or waiting area is moved; callers that need to notify the
    /// old room detach it first.
    pub fn add_participant(&mut self, room_id: &str, participant: Participant) -> Added {
        let socket_id = participant.socket_id;
        match self.locations.get(&socket_id).cloned() {
            Some(Location::Member(current)) if current == room_id => return Added::AlreadyPresent,
            Some(Location::Member(other)) => {
                self.remove_participant(&other, socket_id);
            }
            Some(Location::Waiting(other)) => {
                self.take_pending(&other, socket_id);
            }
            None => {}
        }

        let room = self.ensure_room(room_id);
        let added = if let Some(existing) = room
            .participants
            .iter_mut()
            .find(|p| p.user.id == participant.user.id)
        {
            let previous = std::mem::replace(existing, participant);
            Added::Replaced { previous }
        } else {
            room.participants.push(participant);
            Added::Inserted
        };

        if let Added::Replaced { previous } = &added {
            self.locations.remove(&previous.socket_id);
        }
        self.locations
            .insert(socket_id, Location::Member(room_id.to_owned()));
        added
    }

    /// Remove an active member. Deletes the room when it becomes empty.
    pub fn remove_participant(&mut self, room_id: &str, socket_id: SocketId) -> Option<Removed> {
        let room = self.rooms.get_mut(room_id)?;
        let index = room
            .participants
            .iter()
            .position(|p| p.socket_id == socket_id)?;
        let participant = room.participants.remove(index);
        self.locations.remove(&socket_id);

        let orphaned = self.delete_if_empty(room_id);
        Some(Removed { participant, room_deleted: orphaned.is_some(), orphaned: orphaned.unwrap_or_default() })
    }

    /// Park a join request in the room's waiting area. The room must already
    /// exist (its host is a participant). Re-parking replaces the old request.
    pub fn park(&mut self, room_id: &str, request: PendingRequest) -> bool {
        if !self.rooms.contains_key(room_id) {
            return false;
        }
        let socket_id = request.socket_id;
        match self.locations.get(&socket_id).cloned() {
            Some(Location::Member(other)) => {
                self.remove_participant(&other, socket_id);
            }
            Some(Location::Waiting(other)) => {
                self.take_pending(&other, socket_id);
            }
            None => {}
        }
        // The removal above may have emptied this very room.
        let Some(room) = self.rooms.get_mut(room_id) else {
            return false;
        };
        room.waiting.push(request);
        self.locations
            .insert(socket_id, Location::Waiting(room_id.to_owned()));
        true
    }

    /// Remove and return a parked request.
    pub fn take_pending(&mut self, room_id: &str, socket_id: SocketId) -> Option<PendingRequest> {
        let room = self.rooms.get_mut(room_id)?;
        let index = room.waiting.iter().position(|p| p.socket_id == socket_id)?;
        let request = room.waiting.remove(index);
        self.locations.remove(&socket_id);
        Some(request)
    }

    /// Remove every parked request for a room.
    pub fn drain_pending(&mut self, room_id: &str) -> Vec<PendingRequest> {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return Vec::new();
        };
        let drained: Vec<PendingRequest> = room.waiting.drain(..).collect();
        for request in &drained {
            self.locations.remove(&request.socket_id);
        }
        drained
    }

    /// Record the host identity learned from the room descriptor.
    pub fn set_host(&mut self, room_id: &str, host_id: &str) {
        if let Some(room) = self.rooms.get_mut(room_id) {
            room.host_id = Some(host_id.to_owned());
        }
    }

    /// Flip a member's media-readiness flag. False if not a member.
    pub fn set_media_ready(&mut self, room_id: &str, socket_id: SocketId, ready: bool) -> bool {
        let Some(participant) = self
            .rooms
            .get_mut(room_id)
            .and_then(|room| room.participants.iter_mut().find(|p| p.socket_id == socket_id))
        else {
            return false;
        };
        participant.media_ready = ready;
        true
    }

    /// Media-ready members of a room other than `except`, in join order.
    #[must_use]
    pub fn media_peers(&self, room_id: &str, except: SocketId) -> Vec<SocketId> {
        self.rooms
            .get(room_id)
            .map(|room| {
                room.participants
                    .iter()
                    .filter(|p| p.media_ready && p.socket_id != except)
                    .map(|p| p.socket_id)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
