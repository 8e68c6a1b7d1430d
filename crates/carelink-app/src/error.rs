//! Error types for the application runtime.

use thiserror::Error;

/// Transport failures on the socket link.
///
/// These never cross into the session as errors; the runtime translates
/// them into `socket_error` events so recovery stays a state transition.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The socket could not be opened.
    #[error("websocket connect failed: {0}")]
    Connect(String),

    /// A frame could not be transmitted; the socket is gone.
    #[error("websocket send failed: {0}")]
    Send(String),

    /// An operation required an open socket.
    #[error("socket is not open")]
    NotOpen,
}
