//! Frame type taxonomy and group naming.
//!
//! The server routes on the envelope's `type` string; these constants are the
//! recognized values. Unknown types are legal on the wire and simply find no
//! listeners.

/// Outbound keepalive ping.
pub const PING: &str = "ping";

/// Outbound presence/status poll.
pub const GET_STATUS: &str = "get_status";

/// Outbound direct chat message to another user.
pub const SEND_MESSAGE: &str = "send_message";

/// Outbound request to join a named group.
pub const JOIN_GROUP: &str = "join_group";

/// Outbound request to leave a named group.
pub const LEAVE_GROUP: &str = "leave_group";

/// Inbound reply to `get_status`.
pub const STATUS_RESPONSE: &str = "status_response";

/// Inbound keepalive reply.
pub const PONG: &str = "pong";

/// Inbound direct message from another user.
pub const USER_MESSAGE: &str = "user_message";

/// Inbound out-of-band notification (including call invitations).
pub const NOTIFICATION: &str = "notification";

/// Inbound broadcast addressed to every connected client.
pub const SYSTEM_BROADCAST: &str = "system_broadcast";

/// Inbound acknowledgement of a group join.
pub const GROUP_JOINED: &str = "group_joined";

/// Inbound acknowledgement of a group leave.
pub const GROUP_LEFT: &str = "group_left";

/// Inbound server-side error report.
pub const ERROR: &str = "error";

/// Inbound new-message push on a consultation channel.
pub const CONSULTATION_MESSAGE: &str = "consultation_message";

/// Inbound message lifecycle event (create/update/delete via `state`).
pub const MESSAGE: &str = "message";

/// Inbound notice that a participant joined the conversation.
pub const PARTICIPANT_JOINED: &str = "participant_joined";

/// Inbound notice that a participant left the conversation.
pub const PARTICIPANT_LEFT: &str = "participant_left";

/// Inbound notice that an appointment changed.
pub const APPOINTMENT_UPDATED: &str = "appointment_updated";

/// Inbound roster snapshot for the conversation.
pub const PARTICIPANTS: &str = "participants";

/// Group name for a consultation's chat channel.
pub fn consultation_group(consultation_id: i64) -> String {
    format!("consultation_{consultation_id}")
}
