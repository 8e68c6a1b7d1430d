//! Application runtime for the carelink realtime core.
//!
//! Everything below `carelink-app` is sans-IO; this crate is where the I/O
//! actually happens:
//!
//! - [`WsTransport`]: the WebSocket link (tokio-tungstenite)
//! - [`HttpMessageApi`]: the REST collaborator (reqwest)
//! - [`Realtime`] / [`RealtimeHandle`]: the event loop driving the socket
//!   session, with the connection state exposed as a watch channel
//! - [`attach_conversation`] / [`attach_call_gate`]: router wiring from
//!   inbound frames to the conversation and call state machines
//!
//! The singletons the product needs (one presence connection, one call gate)
//! are constructed explicitly by the application root and torn down with it;
//! nothing here is global state.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod bridge;
mod config;
mod error;
mod http;
mod runtime;
mod telemetry;
mod time;
mod transport;

pub use bridge::{UiEffect, attach_call_gate, attach_conversation, forward_call_actions};
pub use config::AppConfig;
pub use error::TransportError;
pub use http::HttpMessageApi;
pub use runtime::{Realtime, RealtimeHandle};
pub use telemetry::init_tracing;
pub use time::TokioEnv;
pub use transport::{SocketTransport, TransportEvent, WsTransport};
