//! Board session — one client's mirror of a room.
//!
//! DESIGN
//! ======
//! Inbound frames update local state without touching history: `draw`
//! previews upsert a single element, `sync_board` replaces the whole
//! snapshot (the last one applied wins), `clear_board` resets the board and
//! its history. Local actions record a history entry and return the frame
//! to send; undo, redo and jumps return a `sync_board` of the restored
//! snapshot so peers follow along.

use std::time::Instant;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;
use uuid::Uuid;

use super::chat::{ChatError, ChatLog, ChatMessage};
use super::cursors::CursorTracker;
use super::element::{self, Element, Snapshot};
use super::history::History;
use crate::frame::{Frame, FrameError};
use crate::hub::registry::Participant;
use crate::protocol::{
    BoardPayload, ChatPayload, CursorData, CursorMove, CursorUpdate, DrawPayload, PollVote, PollVoteUpdate, Reaction,
    RoomId, SocketId, event,
};

pub struct BoardSession {
    room_id: RoomId,
    user_name: String,
    elements: Snapshot,
    history: History<Snapshot>,
    chat: ChatLog,
    cursors: CursorTracker,
}

impl BoardSession {
    pub fn new(room_id: impl Into<RoomId>, user_name: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            user_name: user_name.into(),
            elements: Snapshot::new(),
            history: History::new(),
            chat: ChatLog::new(),
            cursors: CursorTracker::new(),
        }
    }

    /// Start from a stored snapshot, which becomes the first history entry.
    pub fn with_snapshot(room_id: impl Into<RoomId>, user_name: impl Into<String>, snapshot: Snapshot) -> Self {
        let mut session = Self::new(room_id, user_name);
        session.history.record(snapshot.clone());
        session.elements = snapshot;
        session
    }

    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    #[must_use]
    pub fn history(&self) -> &History<Snapshot> {
        &self.history
    }

    #[must_use]
    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    #[must_use]
    pub fn cursors(&self) -> &CursorTracker {
        &self.cursors
    }

    // =========================================================================
    // INBOUND
    // =========================================================================

    /// Apply a frame relayed from a peer.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Payload`] if the payload is malformed.
    pub fn apply_inbound(&mut self, frame: &Frame, now: Instant) -> Result<(), FrameError> {
        match frame.event.as_str() {
            event::DRAW => element::upsert(&mut self.elements, frame.payload()?),
            event::SYNC_BOARD => self.elements = frame.payload()?,
            event::CLEAR_BOARD => {
                self.elements.clear();
                self.history.reset();
            }
            event::CURSOR_MOVE => self.cursors.update(frame.payload::<CursorUpdate>()?, now),
            event::CHAT_MESSAGE => self.chat.add(frame.payload()?),
            event::POLL_VOTE => {
                let vote: PollVoteUpdate = frame.payload()?;
                if let Err(e) = self.chat.apply_vote(&vote.message_id, vote.option_index, &vote.voter) {
                    debug!(error = %e, "poll vote ignored");
                }
            }
            event::USERS_UPDATED => {
                let members: Vec<Participant> = frame.payload()?;
                let ids: Vec<SocketId> = members.into_iter().map(|m| m.socket_id).collect();
                self.cursors.retain_members(&ids);
            }
            _ => {}
        }
        Ok(())
    }

    /// Drop cursors that have aged out.
    pub fn tick(&mut self, now: Instant) -> Vec<SocketId> {
        self.cursors.expire(now)
    }

    // =========================================================================
    // LOCAL ACTIONS
    // =========================================================================

    /// In-progress element: broadcast as `draw`, not recorded.
    #[must_use]
    pub fn preview(&self, element: &Element) -> Frame {
        Frame::with_payload(event::DRAW, &DrawPayload { room_id: self.room_id.clone(), draw_data: element })
    }

    /// Commit a new or changed element.
    pub fn add(&mut self, element: Element) -> Frame {
        let mut next = self.elements.clone();
        element::upsert(&mut next, element);
        self.commit(next)
    }

    /// Edit an element in place. `None` if it does not exist.
    pub fn update(&mut self, id: &str, edit: impl FnOnce(&mut Element)) -> Option<Frame> {
        let mut next = self.elements.clone();
        edit(next.iter_mut().find(|el| el.id == id)?);
        Some(self.commit(next))
    }

    /// Delete an element. Deleting a missing id records nothing.
    pub fn delete(&mut self, id: &str) -> Option<Frame> {
        let mut next = self.elements.clone();
        if !element::remove(&mut next, id) {
            return None;
        }
        Some(self.commit(next))
    }

    /// Replace the board with `elements` as one recorded action.
    pub fn commit(&mut self, elements: Snapshot) -> Frame {
        self.history.record(elements.clone());
        self.elements = elements;
        self.sync_frame()
    }

    /// Clear the board for everyone.
    pub fn clear(&mut self) -> Frame {
        self.elements.clear();
        self.history.reset();
        Frame::new(event::CLEAR_BOARD, self.room_id.clone())
    }

    pub fn undo(&mut self) -> Option<Frame> {
        let restored = self.history.undo()?.clone();
        Some(self.restore(restored))
    }

    pub fn redo(&mut self) -> Option<Frame> {
        let restored = self.history.redo()?.clone();
        Some(self.restore(restored))
    }

    pub fn jump_to(&mut self, index: usize) -> Option<Frame> {
        let restored = self.history.jump_to(index)?.clone();
        Some(self.restore(restored))
    }

    /// `save_board` with the current snapshot.
    #[must_use]
    pub fn save(&self) -> Frame {
        Frame::with_payload(
            event::SAVE_BOARD,
            &BoardPayload { room_id: self.room_id.clone(), elements: self.elements.clone() },
        )
    }

    #[must_use]
    pub fn cursor(&self, x: f64, y: f64, color: &str) -> Frame {
        let cursor_data = CursorData { x, y, color: color.to_owned(), name: self.user_name.clone() };
        Frame::with_payload(event::CURSOR_MOVE, &CursorMove { room_id: self.room_id.clone(), cursor_data })
    }

    #[must_use]
    pub fn react(&self, emoji: &str) -> Frame {
        let reaction = Reaction { room_id: self.room_id.clone(), emoji: emoji.to_owned(), user_name: self.user_name.clone() };
        Frame::with_payload(event::REACTION, &reaction)
    }

    // =========================================================================
    // CHAT
    // =========================================================================

    /// # Errors
    ///
    /// [`ChatError::EmptyText`] for blank messages.
    pub fn send_text(&mut self, text: &str) -> Result<Frame, ChatError> {
        let message = ChatMessage::text(Uuid::new_v4().to_string(), self.user_name.clone(), text, timestamp())?;
        Ok(self.post(message))
    }

    /// # Errors
    ///
    /// As [`ChatMessage::poll`].
    pub fn send_poll<I, S>(&mut self, question: &str, options: I) -> Result<Frame, ChatError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let message =
            ChatMessage::poll(Uuid::new_v4().to_string(), self.user_name.clone(), question, options, timestamp())?;
        Ok(self.post(message))
    }

    /// Vote locally with the same rule peers apply, then emit `poll_vote`.
    ///
    /// # Errors
    ///
    /// As [`ChatLog::apply_vote`]; nothing is sent on error.
    pub fn vote(&mut self, message_id: &str, option_index: usize) -> Result<Frame, ChatError> {
        self.chat.apply_vote(message_id, option_index, &self.user_name)?;
        let vote = PollVote {
            room_id: self.room_id.clone(),
            message_id: message_id.to_owned(),
            option_index,
            voter: self.user_name.clone(),
        };
        Ok(Frame::with_payload(event::POLL_VOTE, &vote))
    }

    fn post(&mut self, message: ChatMessage) -> Frame {
        let frame =
            Frame::with_payload(event::CHAT_MESSAGE, &ChatPayload { room_id: self.room_id.clone(), message: &message });
        self.chat.add(message);
        frame
    }

    fn restore(&mut self, snapshot: Snapshot) -> Frame {
        self.elements = snapshot;
        self.sync_frame()
    }

    fn sync_frame(&self) -> Frame {
        Frame::with_payload(
            event::SYNC_BOARD,
            &BoardPayload { room_id: self.room_id.clone(), elements: self.elements.clone() },
        )
    }
}

fn timestamp() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
