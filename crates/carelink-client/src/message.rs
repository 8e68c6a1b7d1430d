//! Chat message model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned (or client-temporary) message identifier.
pub type MessageId = i64;

/// Base for client-generated temporary ids.
///
/// Far above any plausible server row id, so a temp id can never collide
/// with a confirmed one inside a timeline.
pub const TEMP_ID_BASE: MessageId = 1 << 60;

/// Where a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provenance {
    /// Locally synthesized, awaiting server acknowledgement.
    Optimistic,
    /// Server-confirmed.
    #[default]
    Confirmed,
}

/// Reference to a message's binary attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// File name reported by the server.
    pub file_name: String,
    /// MIME type, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// One chat message in a conversation timeline.
///
/// The serde shape matches the REST and push representations; `provenance`
/// is local-only, so everything deserialized from the wire is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message id (temporary until confirmed).
    pub id: MessageId,
    /// Authoring user id.
    #[serde(rename = "sender")]
    pub author: i64,
    /// Message body. Cleared when the message is deleted.
    pub content: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last edit time, if edited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Whether the body was edited after creation.
    #[serde(default)]
    pub is_edited: bool,
    /// Deletion time; deleted rows stay in the timeline as tombstones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    /// Attachment reference, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentRef>,
    /// Local provenance; never serialized.
    #[serde(skip)]
    pub provenance: Provenance,
}

impl ChatMessage {
    /// True while the message awaits server confirmation.
    #[must_use]
    pub fn is_optimistic(&self) -> bool {
        self.provenance == Provenance::Optimistic
    }

    /// True when the message was deleted (tombstone row).
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Monotonic temp-id source, scoped to one client session.
///
/// Wall-clock temp ids collide under rapid sends and clock skew; a counter
/// cannot.
#[derive(Debug)]
pub struct TempIdGen {
    next: MessageId,
}

impl TempIdGen {
    /// Create a generator starting at [`TEMP_ID_BASE`].
    pub fn new() -> Self {
        Self { next: TEMP_ID_BASE }
    }

    /// Allocate the next temporary id.
    pub fn next_id(&mut self) -> MessageId {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for TempIdGen {
    fn default() -> Self {
        Self::new()
    }
}
