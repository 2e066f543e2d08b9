//! Conversation transcript: authored turns in strict insertion order

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    Customer,
    Agent,
    System,
}

/// One authored message in the conversation transcript.
///
/// Immutable once created; lives until the session is reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub turn_id: String,
    pub author: Author,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only ordered log of turns for the active session.
///
/// Insertion order is permanent: no reordering, no dedup. `clear` exists
/// only for the session reset path.
#[derive(Debug, Default)]
pub struct TranscriptLog {
    turns: Vec<Turn>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn with a fresh identifier and current timestamp.
    ///
    /// Always succeeds; callers are responsible for filtering
    /// empty-after-trim text before appending.
    pub fn append(&mut self, author: Author, text: impl Into<String>) -> Turn {
        let text = text.into();
        debug_assert!(!text.trim().is_empty(), "turn text must be non-empty");

        let turn = Turn {
            turn_id: uuid::Uuid::new_v4().to_string(),
            author,
            text,
            created_at: Utc::now(),
        };
        self.turns.push(turn.clone());
        turn
    }

    /// Snapshot of all turns in insertion order.
    ///
    /// A cloned snapshot, not a live view: consumers iterating the result
    /// are unaffected by later appends.
    pub fn all(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drop all turns. Used only when the session resets.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
