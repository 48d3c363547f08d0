//! Working memory: the recent-turn ring buffer for one session.
//!
//! Owned by whoever runs the session and passed by reference to prompt
//! assembly. Cleared at session end, hydrated from persisted turns at start.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who said a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The human.
    User,
    /// The companion persona.
    Companion,
}

/// One utterance in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Speaker.
    pub role: Role,
    /// What was said.
    pub content: String,
    /// When it was said.
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    /// A turn stamped at `created_at`.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at,
        }
    }
}

/// Fixed-capacity buffer of the most recent turns.
#[derive(Debug, Clone)]
pub struct WorkingMemory {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
    message_count: usize,
    session_started_at: DateTime<Utc>,
}

impl WorkingMemory {
    /// An empty buffer holding at most `capacity` turns (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
            message_count: 0,
            session_started_at: Utc::now(),
        }
    }

    /// Append a turn, evicting the oldest once full.
    pub fn push(&mut self, turn: ConversationTurn) {
        if self.turns.len() == self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
        self.message_count += 1;
    }

    /// The last `limit` turns, oldest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<&ConversationTurn> {
        let skip = self.turns.len().saturating_sub(limit);
        self.turns.iter().skip(skip).collect()
    }

    /// Drop every turn and restart the session clock.
    pub fn clear(&mut self) {
        self.clear_at(Utc::now());
    }

    /// [`WorkingMemory::clear`] with an explicit clock.
    pub fn clear_at(&mut self, now: DateTime<Utc>) {
        self.turns.clear();
        self.message_count = 0;
        self.session_started_at = now;
    }

    /// Load persisted turns if the buffer is still empty. Returns whether
    /// anything was loaded.
    pub fn hydrate(&mut self, turns: impl IntoIterator<Item = ConversationTurn>) -> bool {
        if !self.turns.is_empty() {
            return false;
        }
        for turn in turns {
            if self.turns.len() == self.capacity {
                self.turns.pop_front();
            }
            self.turns.push_back(turn);
        }
        self.message_count = self.turns.len();
        !self.turns.is_empty()
    }

    /// Turns pushed (or hydrated) this session.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.message_count
    }

    /// When the current session began.
    #[must_use]
    pub fn session_started_at(&self) -> DateTime<Utc> {
        self.session_started_at
    }

    /// Turns currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Maximum turns held.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(i: usize) -> ConversationTurn {
        ConversationTurn::new(Role::User, format!("message {i}"), Utc::now())
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut wm = WorkingMemory::new(3);
        for i in 0..5 {
            wm.push(turn(i));
        }
        assert_eq!(wm.len(), 3);
        assert_eq!(wm.message_count(), 5);
        let recent: Vec<&str> = wm.recent(10).iter().map(|t| t.content.as_str()).collect();
        assert_eq!(recent, vec!["message 2", "message 3", "message 4"]);
    }

    #[test]
    fn recent_returns_tail() {
        let mut wm = WorkingMemory::new(10);
        for i in 0..4 {
            wm.push(turn(i));
        }
        let recent = wm.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].content, "message 3");
    }

    #[test]
    fn hydrate_only_when_empty() {
        let mut wm = WorkingMemory::new(2);
        assert!(wm.hydrate((0..3).map(turn)));
        assert_eq!(wm.len(), 2);
        assert_eq!(wm.message_count(), 2);
        assert!(!wm.hydrate((10..12).map(turn)));
        assert_eq!(wm.recent(1)[0].content, "message 2");
    }

    #[test]
    fn clear_resets_session() {
        let mut wm = WorkingMemory::new(2);
        wm.push(turn(0));
        let later = Utc::now() + chrono::Duration::hours(1);
        wm.clear_at(later);
        assert!(wm.is_empty());
        assert_eq!(wm.message_count(), 0);
        assert_eq!(wm.session_started_at(), later);
    }
}
