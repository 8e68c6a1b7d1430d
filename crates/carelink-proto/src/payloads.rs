//! Typed payloads carried in a frame's `data` object.
//!
//! The envelope keeps `data` as raw JSON so routing never depends on payload
//! shape; these types are what the application layers decode it into.

use serde::{Deserialize, Serialize};

/// Payload for [`crate::kinds::SEND_MESSAGE`] frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessagePayload {
    /// Recipient user id.
    pub target_user_id: i64,
    /// Message body.
    pub message: String,
    /// Optional message category understood by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
}

/// Payload for group membership frames (`join_group`, `leave_group`,
/// `group_joined`, `group_left`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPayload {
    /// Name of the group, e.g. `consultation_17`.
    pub group_name: String,
}

/// Lifecycle discriminator on conversation [`crate::kinds::MESSAGE`] frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageState {
    /// A new message was created.
    Create,
    /// An existing message was edited.
    Update,
    /// An existing message was deleted.
    Delete,
}

/// Payload for conversation-scoped [`crate::kinds::MESSAGE`] frames.
///
/// The message body stays as raw JSON; the conversation layer decodes it into
/// its own model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEventPayload {
    /// What happened to the message.
    pub state: MessageState,
    /// The affected message as the server serialized it.
    pub message: serde_json::Value,
}

/// Call invitation delivered through [`crate::kinds::NOTIFICATION`] frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingCallPayload {
    /// Display name of the caller.
    pub caller_name: String,
    /// Appointment the call belongs to.
    pub appointment_id: i64,
    /// Consultation to open when the call is accepted.
    pub consultation_id: i64,
}

/// Payload for `participant_joined` / `participant_left` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantPayload {
    /// User who joined or left.
    pub user_id: i64,
}

/// Payload for `participants` roster snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantsPayload {
    /// Everyone currently in the conversation.
    pub participants: Vec<i64>,
}

/// Payload for `appointment_updated` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentUpdatedPayload {
    /// Appointment that changed.
    pub appointment_id: i64,
}
