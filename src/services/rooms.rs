//! Room directory — the external room store the coordinator consults.
//!
//! SYSTEM CONTEXT
//! ==============
//! Room CRUD lives elsewhere; this layer only needs three narrow operations:
//! fetch a room descriptor by id, enroll a user into a public room's access
//! list, and persist a whiteboard snapshot. `PgRoomDirectory` talks to the
//! shared Postgres schema, `MemoryRoomDirectory` backs development runs
//! without a database and the test suite.
//!
//! ERROR HANDLING
//! ==============
//! A missing room is `Ok(None)` from `get_room`, not an error. Database
//! failures surface as `DirectoryError::Database`; callers log them and keep
//! the live session running.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use time::OffsetDateTime;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("room not found: {0}")]
    NotFound(String),
    #[error("unknown privacy state: {0}")]
    InvalidPrivacy(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl crate::frame::ErrorCode for DirectoryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_ROOM_NOT_FOUND",
            Self::InvalidPrivacy(_) => "E_ROOM_PRIVACY",
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// Room visibility. Only `Private` gates entry behind host approval;
/// `Hidden` rooms are unlisted but admit anyone holding the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Privacy {
    Public,
    Private,
    Hidden,
}

impl Privacy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::Private => "Private",
            Self::Hidden => "Hidden",
        }
    }
}

impl FromStr for Privacy {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Public" => Ok(Self::Public),
            "Private" => Ok(Self::Private),
            "Hidden" => Ok(Self::Hidden),
            other => Err(DirectoryError::InvalidPrivacy(other.to_owned())),
        }
    }
}

/// What the coordinator needs to know about a room to admit someone.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomDescriptor {
    pub room_id: String,
    pub host_id: String,
    pub privacy: Privacy,
    pub authorized_editors: Vec<String>,
    pub authorized_viewers: Vec<String>,
    /// Set for temporary rooms.
    pub expires_at: Option<OffsetDateTime>,
}

impl RoomDescriptor {
    #[must_use]
    pub fn new(room_id: impl Into<String>, host_id: impl Into<String>, privacy: Privacy) -> Self {
        Self {
            room_id: room_id.into(),
            host_id: host_id.into(),
            privacy,
            authorized_editors: Vec::new(),
            authorized_viewers: Vec::new(),
            expires_at: None,
        }
    }

    #[must_use]
    pub fn is_host(&self, user_id: &str) -> bool {
        self.host_id == user_id
    }

    /// Host, editor or viewer of this room.
    #[must_use]
    pub fn is_recognized(&self, user_id: &str) -> bool {
        self.is_host(user_id)
            || self.authorized_editors.iter().any(|id| id == user_id)
            || self.authorized_viewers.iter().any(|id| id == user_id)
    }

    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }
}

// =============================================================================
// DIRECTORY TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait RoomDirectory: Send + Sync {
    /// Fetch a room descriptor. `Ok(None)` when the room does not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`DirectoryError`] if the backing store fails.
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomDescriptor>, DirectoryError>;

    /// Add `user_id` to the room's editor list unless already recognized.
    ///
    /// # Errors
    ///
    /// Returns a [`DirectoryError`] if the backing store fails.
    async fn enroll(&self, room_id: &str, user_id: &str) -> Result<(), DirectoryError>;

    /// Replace the stored whiteboard snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] for unknown rooms, or a store error.
    async fn save_snapshot(&self, room_id: &str, elements: &[Value]) -> Result<(), DirectoryError>;
}

// =============================================================================
// POSTGRES
// =============================================================================

pub struct PgRoomDirectory {
    pool: PgPool,
}

impl PgRoomDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RoomDirectory for PgRoomDirectory {
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomDescriptor>, DirectoryError> {
        let row = sqlx::query_as::<_, (String, String, String, Vec<String>, Vec<String>, Option<OffsetDateTime>)>(
            "SELECT room_id, host_id, privacy_state, authorized_editors, authorized_viewers, expires_at
             FROM rooms
             WHERE room_id = $1",
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((room_id, host_id, privacy, authorized_editors, authorized_viewers, expires_at)) = row else {
            return Ok(None);
        };

        Ok(Some(RoomDescriptor {
            room_id,
            host_id,
            privacy: privacy.parse()?,
            authorized_editors,
            authorized_viewers,
            expires_at,
        }))
    }

    async fn enroll(&self, room_id: &str, user_id: &str) -> Result<(), DirectoryError> {
        sqlx::query(
            "UPDATE rooms
             SET authorized_editors = array_append(authorized_editors, $2), updated_at = now()
             WHERE room_id = $1
               AND host_id <> $2
               AND NOT ($2 = ANY(authorized_editors))
               AND NOT ($2 = ANY(authorized_viewers))",
        )
        .bind(room_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_snapshot(&self, room_id: &str, elements: &[Value]) -> Result<(), DirectoryError> {
        let result = sqlx::query("UPDATE rooms SET whiteboard_data = $2, updated_at = now() WHERE room_id = $1")
            .bind(room_id)
            .bind(Value::Array(elements.to_vec()))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DirectoryError::NotFound(room_id.to_owned()));
        }
        Ok(())
    }
}

// =============================================================================
// IN-MEMORY
// =============================================================================

struct StoredRoom {
    descriptor: RoomDescriptor,
    snapshot: Vec<Value>,
}

/// Process-local directory. Rooms must be inserted explicitly.
#[derive(Default)]
pub struct MemoryRoomDirectory {
    rooms: Mutex<HashMap<String, StoredRoom>>,
}

impl MemoryRoomDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, descriptor: RoomDescriptor) {
        let mut rooms = self.rooms.lock().unwrap_or_else(PoisonError::into_inner);
        rooms.insert(descriptor.room_id.clone(), StoredRoom { descriptor, snapshot: Vec::new() });
    }

    /// Last saved snapshot for a room.
    #[must_use]
    pub fn snapshot(&self, room_id: &str) -> Option<Vec<Value>> {
        let rooms = self.rooms.lock().unwrap_or_else(PoisonError::into_inner);
        rooms.get(room_id).map(|room| room.snapshot.clone())
    }
}

#[async_trait::async_trait]
impl RoomDirectory for MemoryRoomDirectory {
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomDescriptor>, DirectoryError> {
        let rooms = self.rooms.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(rooms.get(room_id).map(|room| room.descriptor.clone()))
    }

    async fn enroll(&self, room_id: &str, user_id: &str) -> Result<(), DirectoryError> {
        let mut rooms = self.rooms.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(room) = rooms.get_mut(room_id) else {
            return Err(DirectoryError::NotFound(room_id.to_owned()));
        };
        if !room.descriptor.is_recognized(user_id) {
            room.descriptor.authorized_editors.push(user_id.to_owned());
        }
        Ok(())
    }

    async fn save_snapshot(&self, room_id: &str, elements: &[Value]) -> Result<(), DirectoryError> {
        let mut rooms = self.rooms.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(room) = rooms.get_mut(room_id) else {
            return Err(DirectoryError::NotFound(room_id.to_owned()));
        };
        room.snapshot = elements.to_vec();
        Ok(())
    }
}

#[cfg(test)]
#[path = "rooms_test.rs"]
mod tests;
