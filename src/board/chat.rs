//! Room chat — text messages, polls, and the single-vote rule.
//!
//! DESIGN
//! ======
//! Chat is client-local: the server relays messages and votes but keeps no
//! log. Every client applies a vote with the same rule, retracting the
//! voter from every option of the poll before adding the new vote, so a
//! voter holds at most one vote per poll on every client. The sender's
//! optimistic update goes through the same [`ChatMessage::apply_vote`].

use serde::{Deserialize, Serialize};

use crate::frame::ErrorCode;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyText,
    #[error("poll needs a question")]
    MissingQuestion,
    #[error("poll needs at least two options")]
    TooFewOptions,
    #[error("message {0} is not a poll")]
    NotAPoll(String),
    #[error("poll {message_id} has no option {index}")]
    NoSuchOption { message_id: String, index: usize },
    #[error("message not found: {0}")]
    NotFound(String),
}

impl ErrorCode for ChatError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyText => "E_CHAT_EMPTY",
            Self::MissingQuestion => "E_POLL_QUESTION",
            Self::TooFewOptions => "E_POLL_OPTIONS",
            Self::NotAPoll(_) => "E_NOT_A_POLL",
            Self::NoSuchOption { .. } => "E_POLL_OPTION",
            Self::NotFound(_) => "E_MESSAGE_NOT_FOUND",
        }
    }
}

// =============================================================================
// MESSAGES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: String,
    #[serde(flatten)]
    pub body: MessageBody,
    /// RFC 3339 send time, as set by the sender.
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageBody {
    Text { text: String },
    Poll { question: String, options: Vec<PollOption> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub text: String,
    #[serde(default)]
    pub votes: Vec<String>,
}

impl ChatMessage {
    /// # Errors
    ///
    /// [`ChatError::EmptyText`] if `text` is blank.
    pub fn text(
        id: impl Into<String>,
        sender: impl Into<String>,
        text: &str,
        timestamp: impl Into<String>,
    ) -> Result<Self, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyText);
        }
        Ok(Self {
            id: id.into(),
            sender: sender.into(),
            body: MessageBody::Text { text: text.to_owned() },
            timestamp: timestamp.into(),
        })
    }

    /// Build a poll. Blank options are dropped before counting.
    ///
    /// # Errors
    ///
    /// [`ChatError::MissingQuestion`] for a blank question,
    /// [`ChatError::TooFewOptions`] if fewer than two options remain.
    pub fn poll<I, S>(
        id: impl Into<String>,
        sender: impl Into<String>,
        question: &str,
        options: I,
        timestamp: impl Into<String>,
    ) -> Result<Self, ChatError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if question.trim().is_empty() {
            return Err(ChatError::MissingQuestion);
        }
        let options: Vec<PollOption> = options
            .into_iter()
            .filter(|text| !text.as_ref().trim().is_empty())
            .map(|text| PollOption { text: text.as_ref().to_owned(), votes: Vec::new() })
            .collect();
        if options.len() < 2 {
            return Err(ChatError::TooFewOptions);
        }
        Ok(Self {
            id: id.into(),
            sender: sender.into(),
            body: MessageBody::Poll { question: question.to_owned(), options },
            timestamp: timestamp.into(),
        })
    }

    /// Move `voter`'s vote to `option_index`. An invalid index changes nothing.
    ///
    /// # Errors
    ///
    /// [`ChatError::NotAPoll`] or [`ChatError::NoSuchOption`].
    pub fn apply_vote(&mut self, option_index: usize, voter: &str) -> Result<(), ChatError> {
        let MessageBody::Poll { options, .. } = &mut self.body else {
            return Err(ChatError::NotAPoll(self.id.clone()));
        };
        if option_index >= options.len() {
            return Err(ChatError::NoSuchOption { message_id: self.id.clone(), index: option_index });
        }
        for option in options.iter_mut() {
            option.votes.retain(|v| v != voter);
        }
        options[option_index].votes.push(voter.to_owned());
        Ok(())
    }

    /// Votes across all options; zero for text messages.
    #[must_use]
    pub fn total_votes(&self) -> usize {
        match &self.body {
            MessageBody::Poll { options, .. } => options.iter().map(|o| o.votes.len()).sum(),
            MessageBody::Text { .. } => 0,
        }
    }
}

// =============================================================================
// LOG
// =============================================================================

/// Messages in arrival order.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Apply `f` to the message with `id`. False if there is none.
    pub fn update(&mut self, id: &str, f: impl FnOnce(&mut ChatMessage)) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                f(message);
                true
            }
            None => false,
        }
    }

    /// # Errors
    ///
    /// [`ChatError::NotFound`] for unknown messages, otherwise as
    /// [`ChatMessage::apply_vote`].
    pub fn apply_vote(&mut self, message_id: &str, option_index: usize, voter: &str) -> Result<(), ChatError> {
        let message = self
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| ChatError::NotFound(message_id.to_owned()))?;
        message.apply_vote(option_index, voter)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
