//! Conversation participant roster.

use std::collections::HashSet;

/// Presence projection for one conversation.
///
/// Fed from roster snapshots and join/leave deltas pushed on the
/// consultation channel.
#[derive(Debug, Default)]
pub struct ParticipantRoster {
    participants: HashSet<i64>,
}

impl ParticipantRoster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roster wholesale from a snapshot.
    pub fn replace(&mut self, participants: impl IntoIterator<Item = i64>) {
        self.participants = participants.into_iter().collect();
    }

    /// Record a participant joining. Returns whether they were new.
    pub fn joined(&mut self, user_id: i64) -> bool {
        self.participants.insert(user_id)
    }

    /// Record a participant leaving. Returns whether they were present.
    pub fn left(&mut self, user_id: i64) -> bool {
        self.participants.remove(&user_id)
    }

    /// Whether `user_id` is currently present.
    #[must_use]
    pub fn contains(&self, user_id: i64) -> bool {
        self.participants.contains(&user_id)
    }

    /// Number of participants present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// True when nobody is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
