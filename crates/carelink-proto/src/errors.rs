//! Error types for wire encoding and decoding.

use thiserror::Error;

/// Errors produced while encoding or decoding wire frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame could not be serialized to JSON.
    #[error("frame encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Inbound text was not a valid frame, or a payload did not match the
    /// expected shape.
    #[error("frame decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// Frame carried no `data` object but one was required.
    #[error("frame `{kind}` is missing its data payload")]
    MissingData {
        /// Frame type that lacked data.
        kind: String,
    },
}

/// Convenience alias for protocol results.
pub type Result<T> = std::result::Result<T, ProtocolError>;
