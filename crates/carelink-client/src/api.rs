//! External collaborator interfaces.
//!
//! The REST message API and the credential store are external systems; the
//! conversation layer only knows these seams. Production implementations
//! live in `carelink-app`.

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    error::ApiError,
    message::{ChatMessage, MessageId},
};

/// One fetched page of messages.
#[derive(Debug, Clone)]
pub struct MessagePage {
    /// Messages in server order (newest first).
    pub messages: Vec<ChatMessage>,
    /// Whether an older page exists.
    pub has_more: bool,
}

/// Binary attachment for an outgoing message.
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    /// File name to report to the server.
    pub file_name: String,
    /// MIME type of the payload.
    pub content_type: String,
    /// The raw bytes.
    pub bytes: Bytes,
}

/// Draft of an outgoing message.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    /// Message body.
    pub content: String,
    /// Optional binary attachment.
    pub attachment: Option<AttachmentUpload>,
}

/// REST collaborator for conversation messages.
#[async_trait]
pub trait MessageApi: Send + Sync {
    /// Fetch one page (1-based, newest first) of a conversation's messages.
    async fn fetch_page(&self, conversation_id: i64, page: u32) -> Result<MessagePage, ApiError>;

    /// Create a message; returns the server-confirmed row.
    async fn send_message(
        &self,
        conversation_id: i64,
        draft: OutgoingMessage,
    ) -> Result<ChatMessage, ApiError>;

    /// Update a message body; returns the updated row.
    async fn edit_message(
        &self,
        conversation_id: i64,
        id: MessageId,
        content: &str,
    ) -> Result<ChatMessage, ApiError>;

    /// Delete a message.
    async fn delete_message(&self, conversation_id: i64, id: MessageId) -> Result<(), ApiError>;

    /// Fetch a message's attachment blob.
    async fn fetch_attachment(&self, message_id: MessageId) -> Result<Bytes, ApiError>;
}

/// Credential collaborator.
///
/// Token acquisition and refresh are out of scope; the client only asks for
/// the current token at the moments it needs one (connect, REST calls).
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current access token, or `None` when signed out.
    async fn access_token(&self) -> Option<String>;
}
