//! Error types for the conversation layer.

use thiserror::Error;

/// Failures from the REST message collaborator.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Server rejected the request.
    #[error("request failed with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Transport-level failure reaching the server.
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The request could not be constructed.
    #[error("invalid request: {0}")]
    Request(String),

    /// No credential was available for an authenticated call.
    #[error("no access token available")]
    Unauthorized,
}

/// Failures reconciling the timeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// Confirmation arrived for a temp id with no provisional entry.
    #[error("unknown temporary id {temp_id}")]
    UnknownTempId {
        /// The temp id that matched nothing.
        temp_id: i64,
    },
}

/// Failures requesting attachments.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttachmentError {
    /// Attachment requested for a message that is not yet confirmed.
    /// Temporary ids are never sent to the server.
    #[error("message {id} is not yet confirmed; cannot fetch its attachment")]
    OptimisticId {
        /// The optimistic message id.
        id: i64,
    },
}

/// Failures surfaced by the conversation service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// REST collaborator failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Attachment request for an unconfirmed message.
    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}
