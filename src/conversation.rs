//! The conversation store: an ordered, append-only list of chat messages.
//!
//! Insertion order is display order is chronological order. Messages are
//! never edited or removed; the store lives for one session and is only
//! written to disk when the caller asks for a transcript.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Assistant,
}

/// Time-derived, strictly increasing message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One chat bubble. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub origin: Origin,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only message history with its own id clock.
#[derive(Debug, Default, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    last_id: Option<i64>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return a copy of it.
    ///
    /// The id is the creation time in Unix milliseconds, bumped past the
    /// previous id when the clock has not moved (or moved backwards).
    pub fn push(&mut self, origin: Origin, text: impl Into<String>) -> Message {
        let created_at = Utc::now();
        let id = self.next_id(created_at.timestamp_millis());
        let message = Message {
            id,
            origin,
            text: text.into(),
            created_at,
        };
        self.messages.push(message.clone());
        message
    }

    fn next_id(&mut self, now_ms: i64) -> MessageId {
        let id = match self.last_id {
            Some(last) if now_ms <= last => last + 1,
            _ => now_ms,
        };
        self.last_id = Some(id);
        MessageId(id)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Pretty JSON transcript of every message in order.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.messages)
    }
}
