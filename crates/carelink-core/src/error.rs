//! Error types for the session core.
//!
//! Deliberately small: the spec-level failure modes (transport loss, missing
//! credential, malformed frames) are modeled as state transitions and dropped
//! frames, not errors. What remains is configuration mistakes and listener
//! failures surfaced for logging.

use thiserror::Error;

/// Failures deriving socket endpoints from the REST base URL.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EndpointError {
    /// The REST base URL did not start with a supported scheme.
    #[error("unsupported scheme in API base `{base}` (expected http:// or https://)")]
    UnsupportedScheme {
        /// Offending base URL.
        base: String,
    },
}

/// Error type a dispatch listener may return.
///
/// Failures are isolated per listener: the router records them and keeps
/// delivering to the remaining listeners.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;
