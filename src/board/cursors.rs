//! Remote cursors with a short time-to-live.
//!
//! Cursor updates are fire-and-forget, so a peer that stops moving (or
//! vanishes without a clean leave) simply ages out after [`CURSOR_TTL`].
//! Callers pass `now` explicitly to keep expiry deterministic.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::protocol::{CursorData, CursorUpdate, SocketId};

pub const CURSOR_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCursor {
    pub cursor: CursorData,
    pub seen: Instant,
}

#[derive(Debug, Clone)]
pub struct CursorTracker {
    cursors: HashMap<SocketId, RemoteCursor>,
    ttl: Duration,
}

impl Default for CursorTracker {
    fn default() -> Self {
        Self::with_ttl(CURSOR_TTL)
    }
}

impl CursorTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { cursors: HashMap::new(), ttl }
    }

    pub fn update(&mut self, update: CursorUpdate, now: Instant) {
        self.cursors
            .insert(update.socket_id, RemoteCursor { cursor: update.cursor, seen: now });
    }

    pub fn remove(&mut self, socket_id: SocketId) {
        self.cursors.remove(&socket_id);
    }

    /// Drop cursors of peers no longer in the room.
    pub fn retain_members(&mut self, members: &[SocketId]) {
        self.cursors.retain(|socket_id, _| members.contains(socket_id));
    }

    /// Remove cursors older than the TTL; returns whose were removed.
    pub fn expire(&mut self, now: Instant) -> Vec<SocketId> {
        let ttl = self.ttl;
        let stale: Vec<SocketId> = self
            .cursors
            .iter()
            .filter(|(_, c)| now.saturating_duration_since(c.seen) > ttl)
            .map(|(socket_id, _)| *socket_id)
            .collect();
        for socket_id in &stale {
            self.cursors.remove(socket_id);
        }
        stale
    }

    /// Cursors still fresh at `now`.
    #[must_use]
    pub fn active(&self, now: Instant) -> Vec<(SocketId, &CursorData)> {
        self.cursors
            .iter()
            .filter(|(_, c)| now.saturating_duration_since(c.seen) <= self.ttl)
            .map(|(socket_id, c)| (*socket_id, &c.cursor))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}

#[cfg(test)]
#[path = "cursors_test.rs"]
mod tests;
