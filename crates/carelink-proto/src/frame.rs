//! Wire envelope for the realtime channel.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    errors::{ProtocolError, Result},
    kinds,
    payloads::SendMessagePayload,
};

/// One JSON-encoded message exchanged over the realtime connection.
///
/// Layout on the wire:
/// `{"type": <string>, "data"?: <object>, "timestamp"?: <number ms epoch>}`.
///
/// `data` is held as raw JSON so the session can route frames by `type`
/// without knowing every payload shape; typed access goes through
/// [`Frame::data_as`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Frame type discriminator.
    #[serde(rename = "type")]
    pub kind: String,

    /// Optional payload object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Optional timestamp in milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Frame {
    /// Create a frame with no payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), data: None, timestamp: None }
    }

    /// Create a frame carrying an already-built JSON payload.
    pub fn with_value(kind: impl Into<String>, data: serde_json::Value) -> Self {
        Self { kind: kind.into(), data: Some(data), timestamp: None }
    }

    /// Create a frame carrying a typed payload.
    pub fn with_data<T: Serialize>(kind: impl Into<String>, data: &T) -> Result<Self> {
        let value = serde_json::to_value(data).map_err(ProtocolError::Encode)?;
        Ok(Self::with_value(kind, value))
    }

    /// Keepalive ping.
    pub fn ping() -> Self {
        Self::new(kinds::PING)
    }

    /// Presence/status poll.
    pub fn get_status() -> Self {
        Self::new(kinds::GET_STATUS)
    }

    /// Direct chat message to another user.
    pub fn send_message(payload: &SendMessagePayload) -> Self {
        let mut data = serde_json::Map::new();
        data.insert("target_user_id".to_string(), payload.target_user_id.into());
        data.insert("message".to_string(), payload.message.clone().into());
        if let Some(kind) = &payload.message_type {
            data.insert("message_type".to_string(), kind.clone().into());
        }
        Self::with_value(kinds::SEND_MESSAGE, serde_json::Value::Object(data))
    }

    /// Request to join a named group.
    pub fn join_group(group: &str) -> Self {
        Self::with_value(kinds::JOIN_GROUP, serde_json::json!({ "group_name": group }))
    }

    /// Request to leave a named group.
    pub fn leave_group(group: &str) -> Self {
        Self::with_value(kinds::LEAVE_GROUP, serde_json::json!({ "group_name": group }))
    }

    /// Serialize to the JSON text representation.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Parse from the JSON text representation.
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }

    /// Decode the payload into a concrete type.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::MissingData`] when the frame has no `data` object,
    /// [`ProtocolError::Decode`] when the payload does not match `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        let Some(data) = &self.data else {
            return Err(ProtocolError::MissingData { kind: self.kind.clone() });
        };
        serde_json::from_value(data.clone()).map_err(ProtocolError::Decode)
    }
}
