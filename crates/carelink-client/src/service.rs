//! Conversation orchestration over the REST collaborator.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::{
    api::{MessageApi, OutgoingMessage},
    attachments::AttachmentCache,
    error::{ApiError, ServiceError},
    message::{AttachmentRef, ChatMessage, MessageId},
    scroll::ScrollAnchor,
    timeline::Timeline,
};

/// Orchestrates one open conversation: timeline, REST round-trips, and the
/// attachment cache.
///
/// Discarded and rebuilt when the user navigates to a different
/// conversation; the push-channel projections reach the timeline through
/// [`ConversationService::timeline_mut`].
pub struct ConversationService<A> {
    timeline: Timeline,
    cache: AttachmentCache,
    api: Arc<A>,
    self_user: i64,
}

impl<A> std::fmt::Debug for ConversationService<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationService")
            .field("conversation_id", &self.timeline.conversation_id())
            .field("messages", &self.timeline.len())
            .finish()
    }
}

impl<A: MessageApi> ConversationService<A> {
    /// Create a service for `conversation_id` on behalf of `self_user`.
    pub fn new(api: Arc<A>, conversation_id: i64, self_user: i64) -> Self {
        Self {
            timeline: Timeline::new(conversation_id),
            cache: AttachmentCache::new(),
            api,
            self_user,
        }
    }

    /// The timeline, for rendering.
    #[must_use]
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Mutable timeline access for push-channel projections.
    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    /// The user this client acts as.
    #[must_use]
    pub fn self_user(&self) -> i64 {
        self.self_user
    }

    /// Load page 1 and replace the timeline wholesale.
    pub async fn load_initial(&mut self) -> Result<(), ApiError> {
        let page = self.api.fetch_page(self.timeline.conversation_id(), 1).await?;
        self.timeline.apply_initial_page(page.messages, page.has_more);
        Ok(())
    }

    /// Load the next older page and prepend it.
    ///
    /// `height_before` is the scrollable content height measured before this
    /// call; apply the returned anchor's delta once the list re-renders so
    /// the visible content does not jump. Returns `Ok(None)` when a load is
    /// already in flight or no older page exists. On failure the page cursor
    /// rolls back so a retry re-requests the same page.
    pub async fn load_older(&mut self, height_before: f64) -> Result<Option<ScrollAnchor>, ApiError> {
        let Some(page) = self.timeline.request_older_page() else {
            return Ok(None);
        };
        match self.api.fetch_page(self.timeline.conversation_id(), page).await {
            Ok(fetched) => {
                self.timeline.apply_older_page(fetched.messages, fetched.has_more);
                Ok(Some(ScrollAnchor::capture(height_before)))
            },
            Err(error) => {
                self.timeline.older_page_failed();
                Err(error)
            },
        }
    }

    /// Send a message optimistically.
    ///
    /// A provisional entry shows immediately; on success it is confirmed in
    /// place, on failure it is removed and the error surfaced. No automatic
    /// retry.
    pub async fn send(
        &mut self,
        draft: OutgoingMessage,
        sent_at: DateTime<Utc>,
    ) -> Result<MessageId, ApiError> {
        let attachment = draft.attachment.as_ref().map(|upload| AttachmentRef {
            file_name: upload.file_name.clone(),
            content_type: Some(upload.content_type.clone()),
        });
        let temp_id =
            self.timeline.begin_send(self.self_user, draft.content.clone(), attachment, sent_at);

        match self.api.send_message(self.timeline.conversation_id(), draft).await {
            Ok(confirmed) => {
                let id = confirmed.id;
                // A missing provisional entry means the conversation was
                // reloaded underneath the send; nothing left to reconcile.
                let _ = self.timeline.confirm_send(temp_id, confirmed);
                Ok(id)
            },
            Err(error) => {
                self.timeline.send_failed(temp_id);
                Err(error)
            },
        }
    }

    /// Edit a message and project the server's row in place.
    pub async fn edit(&mut self, id: MessageId, content: &str) -> Result<(), ApiError> {
        let updated = self.api.edit_message(self.timeline.conversation_id(), id, content).await?;
        let edited_at = updated.updated_at.unwrap_or(updated.created_at);
        self.timeline.apply_edit(updated.id, updated.content, edited_at);
        Ok(())
    }

    /// Delete a message; the row stays in the timeline as a tombstone.
    pub async fn delete(&mut self, id: MessageId, deleted_at: DateTime<Utc>) -> Result<(), ApiError> {
        self.api.delete_message(self.timeline.conversation_id(), id).await?;
        self.timeline.apply_delete(id, deleted_at);
        Ok(())
    }

    /// Attachment blob for `message`, fetched lazily and cached by id.
    ///
    /// Returns `Ok(None)` when the message has no attachment.
    pub async fn attachment(&mut self, message: &ChatMessage) -> Result<Option<Bytes>, ServiceError> {
        if !self.cache.begin_fetch(message)? {
            return Ok(self.cache.get(message.id).cloned());
        }
        match self.api.fetch_attachment(message.id).await {
            Ok(blob) => {
                self.cache.complete(message.id, blob.clone());
                Ok(Some(blob))
            },
            Err(error) => {
                self.cache.fetch_failed(message.id);
                Err(error.into())
            },
        }
    }
}
