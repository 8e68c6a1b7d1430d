//! Socket endpoint derivation.

use crate::error::EndpointError;

/// Realtime channel selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    /// Per-user presence channel (`/ws/user/`).
    User,
    /// One consultation's chat channel (`/ws/consultation/{id}/`).
    Consultation(i64),
}

/// Derives socket URLs from the REST API base URL.
///
/// The socket scheme is the API scheme rewritten (`http → ws`,
/// `https → wss`); the access credential rides as a query parameter.
#[derive(Debug, Clone)]
pub struct RealtimeEndpoint {
    socket_base: String,
}

impl RealtimeEndpoint {
    /// Build from the REST base URL, e.g. `https://api.clinic.example`.
    pub fn new(api_base: &str) -> Result<Self, EndpointError> {
        let base = api_base.trim_end_matches('/');
        let socket_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            return Err(EndpointError::UnsupportedScheme { base: api_base.to_string() });
        };
        Ok(Self { socket_base })
    }

    /// Socket URL for `channel`, carrying `token` as the access credential.
    pub fn channel_url(&self, channel: &Channel, token: &str) -> String {
        match channel {
            Channel::User => format!("{}/ws/user/?token={token}", self.socket_base),
            Channel::Consultation(id) => {
                format!("{}/ws/consultation/{id}/?token={token}", self.socket_base)
            },
        }
    }
}
