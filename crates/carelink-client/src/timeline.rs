//! Message timeline for one open conversation.
//!
//! Reconciles four message sources into a single ordered, deduplicated
//! sequence: the initial page load, backward pagination, live push events,
//! and the caller's own optimistic sends. The timeline is discarded and
//! rebuilt when the user navigates to a different conversation.
//!
//! Invariants:
//! - messages are kept in ascending chronological order (oldest first);
//! - no message id appears more than once;
//! - at most one optimistic representation of a given send exists, and its
//!   confirmation replaces it in place (same index) so the row never jumps;
//! - deleted messages remain as tombstones because their position anchors
//!   pagination.

use chrono::{DateTime, Utc};

use crate::{
    error::TimelineError,
    message::{AttachmentRef, ChatMessage, MessageId, Provenance, TempIdGen},
};

/// Ordered, deduplicated message sequence for one conversation.
#[derive(Debug)]
pub struct Timeline {
    conversation_id: i64,
    messages: Vec<ChatMessage>,
    /// Last page fetched (1-based). Backward loads request `page + 1`.
    page: u32,
    has_more: bool,
    /// A backward load is in flight; guards against overlapping loads.
    loading: bool,
    temp_ids: TempIdGen,
}

impl Timeline {
    /// Create an empty timeline for `conversation_id`.
    pub fn new(conversation_id: i64) -> Self {
        Self {
            conversation_id,
            messages: Vec::new(),
            page: 1,
            has_more: true,
            loading: false,
            temp_ids: TempIdGen::new(),
        }
    }

    /// Conversation this timeline belongs to.
    #[must_use]
    pub fn conversation_id(&self) -> i64 {
        self.conversation_id
    }

    /// The current sequence, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of rows, tombstones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when no rows are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether a backward load is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the server has reported further (older) pages.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether a message with `id` is present.
    #[must_use]
    pub fn contains(&self, id: MessageId) -> bool {
        self.messages.iter().any(|message| message.id == id)
    }

    /// Index of the message with `id`, if present.
    #[must_use]
    pub fn position(&self, id: MessageId) -> Option<usize> {
        self.messages.iter().position(|message| message.id == id)
    }

    /// Replace the sequence wholesale with page 1.
    ///
    /// The collaborator API returns pages newest first; the timeline stores
    /// them oldest first.
    pub fn apply_initial_page(&mut self, newest_first: Vec<ChatMessage>, has_more: bool) {
        self.messages = newest_first.into_iter().rev().collect();
        self.page = 1;
        self.has_more = has_more;
        self.loading = false;
    }

    /// Begin a backward load, returning the page to fetch.
    ///
    /// Guarded twice: refuses while a load is in flight and once the server
    /// reported no further pages.
    pub fn request_older_page(&mut self) -> Option<u32> {
        if self.loading || !self.has_more {
            return None;
        }
        self.loading = true;
        self.page += 1;
        Some(self.page)
    }

    /// Merge a fetched older page by prepending it.
    ///
    /// Entries whose id is already present are skipped, so a message can
    /// never be duplicated by overlapping pages. Returns how many rows were
    /// prepended.
    pub fn apply_older_page(&mut self, newest_first: Vec<ChatMessage>, has_more: bool) -> usize {
        self.loading = false;
        self.has_more = has_more;

        let mut older: Vec<ChatMessage> =
            newest_first.into_iter().rev().filter(|message| !self.contains(message.id)).collect();
        let prepended = older.len();
        older.append(&mut self.messages);
        self.messages = older;
        prepended
    }

    /// Roll back a failed backward load so a retry re-requests the same page.
    pub fn older_page_failed(&mut self) {
        self.loading = false;
        self.page = self.page.saturating_sub(1);
    }

    /// Append a live-pushed message at the chronological tail.
    ///
    /// Idempotent: a message id already present is ignored, so a push event
    /// and a later re-fetch of the same message cannot duplicate it. Returns
    /// whether the message was appended.
    pub fn push_live(&mut self, message: ChatMessage) -> bool {
        if self.contains(message.id) {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Append a provisional entry for a send the user just issued.
    ///
    /// Returns the temporary id to reconcile with once the server replies.
    pub fn begin_send(
        &mut self,
        author: i64,
        content: String,
        attachment: Option<AttachmentRef>,
        sent_at: DateTime<Utc>,
    ) -> MessageId {
        let temp_id = self.temp_ids.next_id();
        self.messages.push(ChatMessage {
            id: temp_id,
            author,
            content,
            created_at: sent_at,
            updated_at: None,
            is_edited: false,
            deleted_at: None,
            attachment,
            provenance: Provenance::Optimistic,
        });
        temp_id
    }

    /// Replace the provisional entry with the server-confirmed row.
    ///
    /// The confirmed message takes the exact list position the optimistic
    /// one held, so the row does not visually jump. If the confirmed id
    /// already landed through the push channel, the provisional entry is
    /// removed instead; the id-uniqueness invariant wins.
    pub fn confirm_send(
        &mut self,
        temp_id: MessageId,
        mut confirmed: ChatMessage,
    ) -> Result<(), TimelineError> {
        let Some(index) = self.position(temp_id) else {
            return Err(TimelineError::UnknownTempId { temp_id });
        };
        confirmed.provenance = Provenance::Confirmed;
        if self.messages.iter().any(|m| m.id == confirmed.id && m.id != temp_id) {
            self.messages.remove(index);
        } else {
            self.messages[index] = confirmed;
        }
        Ok(())
    }

    /// Remove the provisional entry after the server rejected the send.
    ///
    /// Returns whether an entry was removed.
    pub fn send_failed(&mut self, temp_id: MessageId) -> bool {
        match self.position(temp_id) {
            Some(index) => {
                self.messages.remove(index);
                true
            },
            None => false,
        }
    }

    /// Project an edit onto a known message in place.
    ///
    /// Returns whether a row was updated; unknown ids are ignored.
    pub fn apply_edit(
        &mut self,
        id: MessageId,
        content: String,
        edited_at: DateTime<Utc>,
    ) -> bool {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            message.content = content;
            message.is_edited = true;
            message.updated_at = Some(edited_at);
            true
        } else {
            false
        }
    }

    /// Project a deletion: clear content and attachment, keep the row.
    ///
    /// Returns whether a row was tombstoned; unknown ids are ignored.
    pub fn apply_delete(&mut self, id: MessageId, deleted_at: DateTime<Utc>) -> bool {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            message.content.clear();
            message.attachment = None;
            message.deleted_at = Some(deleted_at);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn message(id: MessageId, author: i64) -> ChatMessage {
        ChatMessage {
            id,
            author,
            content: format!("message {id}"),
            created_at: Utc.timestamp_opt(1_700_000_000 + id, 0).single().unwrap(),
            updated_at: None,
            is_edited: false,
            deleted_at: None,
            attachment: None,
            provenance: Provenance::Confirmed,
        }
    }

    /// Newest-first page, the way the collaborator API returns them.
    fn page(ids: std::ops::Range<i64>) -> Vec<ChatMessage> {
        ids.rev().map(|id| message(id, 1)).collect()
    }

    fn ids(timeline: &Timeline) -> Vec<MessageId> {
        timeline.messages().iter().map(|m| m.id).collect()
    }

    #[test]
    fn initial_page_is_reversed_to_chronological_order() {
        let mut timeline = Timeline::new(7);
        timeline.apply_initial_page(page(0..20), true);

        assert_eq!(ids(&timeline), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn load_more_prepends_and_keeps_the_original_tail() {
        let mut timeline = Timeline::new(7);
        // Page 1: the 20 newest (ids 20..40), page 2: ids 0..20.
        timeline.apply_initial_page(page(20..40), true);

        assert_eq!(timeline.request_older_page(), Some(2));
        timeline.apply_older_page(page(0..20), false);

        assert_eq!(timeline.len(), 40);
        assert_eq!(ids(&timeline), (0..40).collect::<Vec<_>>());
        assert!(!timeline.has_more());
    }

    #[test]
    fn load_more_is_guarded_while_in_flight_and_at_the_end() {
        let mut timeline = Timeline::new(7);
        timeline.apply_initial_page(page(0..20), true);

        assert_eq!(timeline.request_older_page(), Some(2));
        // In flight: a second request is refused.
        assert_eq!(timeline.request_older_page(), None);

        timeline.apply_older_page(Vec::new(), false);
        // Exhausted: no more pages to request.
        assert_eq!(timeline.request_older_page(), None);
    }

    #[test]
    fn failed_load_retries_the_same_page() {
        let mut timeline = Timeline::new(7);
        timeline.apply_initial_page(page(0..20), true);

        assert_eq!(timeline.request_older_page(), Some(2));
        timeline.older_page_failed();
        assert_eq!(timeline.request_older_page(), Some(2));
    }

    #[test]
    fn overlapping_pages_do_not_duplicate() {
        let mut timeline = Timeline::new(7);
        timeline.apply_initial_page(page(10..30), true);

        timeline.request_older_page();
        // The server page overlaps ids 10..15 already present.
        timeline.apply_older_page(page(5..15), true);

        assert_eq!(ids(&timeline), (5..30).collect::<Vec<_>>());
    }

    #[test]
    fn live_push_is_idempotent() {
        let mut timeline = Timeline::new(7);
        timeline.apply_initial_page(page(0..3), false);

        assert!(timeline.push_live(message(3, 2)));
        assert!(!timeline.push_live(message(3, 2)));

        assert_eq!(ids(&timeline), vec![0, 1, 2, 3]);
    }

    #[test]
    fn optimistic_send_confirms_in_place() {
        let mut timeline = Timeline::new(7);
        timeline.apply_initial_page(page(0..3), false);

        let temp_id = timeline.begin_send(9, "hello".to_string(), None, Utc::now());
        let index = timeline.position(temp_id).unwrap();
        let len_before = timeline.len();

        timeline.confirm_send(temp_id, message(57, 9)).unwrap();

        assert_eq!(timeline.len(), len_before);
        assert_eq!(timeline.messages()[index].id, 57);
        assert!(!timeline.messages()[index].is_optimistic());
        assert!(!timeline.contains(temp_id));
    }

    #[test]
    fn rejected_send_removes_the_provisional_entry() {
        let mut timeline = Timeline::new(7);
        timeline.apply_initial_page(page(0..3), false);

        let temp_id = timeline.begin_send(9, "hello".to_string(), None, Utc::now());
        assert!(timeline.send_failed(temp_id));

        assert_eq!(timeline.len(), 3);
        assert!(!timeline.contains(temp_id));
    }

    #[test]
    fn confirmation_racing_the_push_channel_keeps_one_row() {
        let mut timeline = Timeline::new(7);
        timeline.apply_initial_page(page(0..3), false);

        let temp_id = timeline.begin_send(9, "hello".to_string(), None, Utc::now());
        // The confirmed row arrives over the push channel first.
        assert!(timeline.push_live(message(57, 9)));

        timeline.confirm_send(temp_id, message(57, 9)).unwrap();

        assert_eq!(timeline.messages().iter().filter(|m| m.id == 57).count(), 1);
        assert!(!timeline.contains(temp_id));
    }

    #[test]
    fn confirm_of_unknown_temp_id_is_an_error() {
        let mut timeline = Timeline::new(7);
        let result = timeline.confirm_send(TEMP_ID_BASE_PLUS_ONE, message(57, 9));
        assert!(matches!(result, Err(TimelineError::UnknownTempId { .. })));
    }

    const TEMP_ID_BASE_PLUS_ONE: MessageId = crate::message::TEMP_ID_BASE + 1;

    #[test]
    fn edits_project_in_place() {
        let mut timeline = Timeline::new(7);
        timeline.apply_initial_page(page(0..3), false);
        let edited_at = Utc.timestamp_opt(1_700_000_100, 0).single().unwrap();

        assert!(timeline.apply_edit(1, "fixed".to_string(), edited_at));

        let row = &timeline.messages()[timeline.position(1).unwrap()];
        assert_eq!(row.content, "fixed");
        assert!(row.is_edited);
        assert_eq!(row.updated_at, Some(edited_at));

        assert!(!timeline.apply_edit(999, "nope".to_string(), edited_at));
    }

    #[test]
    fn deletes_leave_a_tombstone_in_position() {
        let mut timeline = Timeline::new(7);
        timeline.apply_initial_page(page(0..3), false);
        let deleted_at = Utc.timestamp_opt(1_700_000_200, 0).single().unwrap();

        assert!(timeline.apply_delete(1, deleted_at));

        assert_eq!(timeline.len(), 3);
        let row = &timeline.messages()[1];
        assert_eq!(row.id, 1);
        assert!(row.content.is_empty());
        assert!(row.attachment.is_none());
        assert!(row.is_deleted());
    }
}
