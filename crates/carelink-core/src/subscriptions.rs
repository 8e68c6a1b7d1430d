//! Group membership intent.

use std::collections::HashSet;

/// Set of group identifiers the caller has asked to belong to.
///
/// Only explicit `join`/`leave` calls mutate the set; the session replays it
/// after every reconnect to restore server-side room membership. Replay order
/// is arbitrary.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    groups: HashSet<String>,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record intent to belong to `group`.
    ///
    /// Idempotent on the set; returns `false` when the group was already
    /// registered.
    pub fn join(&mut self, group: impl Into<String>) -> bool {
        self.groups.insert(group.into())
    }

    /// Drop intent to belong to `group`. Returns whether it was registered.
    pub fn leave(&mut self, group: &str) -> bool {
        self.groups.remove(group)
    }

    /// Whether `group` is currently registered.
    #[must_use]
    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    /// Iterate the groups to replay after a reconnect.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }

    /// Number of registered groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when no groups are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_is_idempotent_on_the_set() {
        let mut registry = SubscriptionRegistry::new();
        assert!(registry.join("consultation_1"));
        assert!(!registry.join("consultation_1"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn leave_after_join_cancels_replay() {
        let mut registry = SubscriptionRegistry::new();
        registry.join("consultation_1");
        assert!(registry.leave("consultation_1"));
        assert!(registry.is_empty());

        // Join after leave re-arms it.
        registry.join("consultation_1");
        assert!(registry.contains("consultation_1"));
    }

    #[test]
    fn leave_of_unknown_group_reports_absence() {
        let mut registry = SubscriptionRegistry::new();
        assert!(!registry.leave("consultation_9"));
    }
}
