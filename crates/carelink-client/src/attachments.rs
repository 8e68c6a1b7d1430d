//! Lazy attachment blobs.

use std::collections::{HashMap, HashSet};

use bytes::Bytes;

use crate::{
    error::AttachmentError,
    message::{ChatMessage, MessageId},
};

/// Per-message attachment blob cache with in-flight tracking.
///
/// Retrieval is lazy: nothing is fetched until a message's attachment is
/// actually wanted, and each id is fetched at most once while cached.
#[derive(Debug, Default)]
pub struct AttachmentCache {
    blobs: HashMap<MessageId, Bytes>,
    in_flight: HashSet<MessageId>,
}

impl AttachmentCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached blob for `id`, if present.
    #[must_use]
    pub fn get(&self, id: MessageId) -> Option<&Bytes> {
        self.blobs.get(&id)
    }

    /// Decide whether a fetch should start for `message`.
    ///
    /// Returns `Ok(true)` when the caller should fetch (the id is now marked
    /// in flight), `Ok(false)` when the message has no attachment, the blob
    /// is already cached, or a fetch is already running.
    ///
    /// # Errors
    ///
    /// [`AttachmentError::OptimisticId`] for unconfirmed messages: temporary
    /// ids must never be used against the server.
    pub fn begin_fetch(&mut self, message: &ChatMessage) -> Result<bool, AttachmentError> {
        if message.is_optimistic() {
            return Err(AttachmentError::OptimisticId { id: message.id });
        }
        if message.attachment.is_none()
            || self.blobs.contains_key(&message.id)
            || self.in_flight.contains(&message.id)
        {
            return Ok(false);
        }
        self.in_flight.insert(message.id);
        Ok(true)
    }

    /// Store a fetched blob and clear the in-flight mark.
    pub fn complete(&mut self, id: MessageId, blob: Bytes) {
        self.in_flight.remove(&id);
        self.blobs.insert(id, blob);
    }

    /// Clear the in-flight mark after a failed fetch so a retry can start.
    pub fn fetch_failed(&mut self, id: MessageId) {
        self.in_flight.remove(&id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::message::{AttachmentRef, Provenance};

    fn message_with_attachment(id: MessageId, provenance: Provenance) -> ChatMessage {
        ChatMessage {
            id,
            author: 1,
            content: "scan attached".to_string(),
            created_at: Utc::now(),
            updated_at: None,
            is_edited: false,
            deleted_at: None,
            attachment: Some(AttachmentRef {
                file_name: "scan.pdf".to_string(),
                content_type: Some("application/pdf".to_string()),
            }),
            provenance,
        }
    }

    #[test]
    fn fetches_once_and_serves_from_cache() {
        let mut cache = AttachmentCache::new();
        let message = message_with_attachment(12, Provenance::Confirmed);

        assert!(cache.begin_fetch(&message).unwrap());
        // Already in flight: no second fetch.
        assert!(!cache.begin_fetch(&message).unwrap());

        cache.complete(12, Bytes::from_static(b"%PDF"));
        assert_eq!(cache.get(12), Some(&Bytes::from_static(b"%PDF")));
        // Cached: no refetch.
        assert!(!cache.begin_fetch(&message).unwrap());
    }

    #[test]
    fn optimistic_ids_are_refused() {
        let mut cache = AttachmentCache::new();
        let message = message_with_attachment(crate::message::TEMP_ID_BASE, Provenance::Optimistic);

        assert!(matches!(
            cache.begin_fetch(&message),
            Err(AttachmentError::OptimisticId { .. })
        ));
    }

    #[test]
    fn failed_fetch_allows_a_retry() {
        let mut cache = AttachmentCache::new();
        let message = message_with_attachment(12, Provenance::Confirmed);

        assert!(cache.begin_fetch(&message).unwrap());
        cache.fetch_failed(12);
        assert!(cache.begin_fetch(&message).unwrap());
    }

    #[test]
    fn messages_without_attachments_never_fetch() {
        let mut cache = AttachmentCache::new();
        let mut message = message_with_attachment(12, Provenance::Confirmed);
        message.attachment = None;

        assert!(!cache.begin_fetch(&message).unwrap());
    }
}
