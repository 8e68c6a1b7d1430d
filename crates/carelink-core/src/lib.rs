//! Session core for the realtime telehealth channel.
//!
//! # Architecture
//!
//! Everything here is sans-IO: state machines consume events plus an explicit
//! `now` instant and return actions for the driver to execute. No module
//! opens sockets, reads the clock, or arms real timers, which keeps the
//! connection lifecycle directly testable with a manual clock.
//!
//! # Components
//!
//! - [`Connection`]: connect / heartbeat / bounded-reconnect state machine
//! - [`OutboundQueue`]: FIFO buffer for frames issued while the link is down
//! - [`SubscriptionRegistry`]: group membership intent, replayed on reconnect
//! - [`SocketSession`]: the three above composed behind one event surface
//! - [`EventRouter`]: fan-out of parsed inbound frames by frame type
//! - [`RealtimeEndpoint`]: socket URL derivation from the REST base URL
//! - [`env::Environment`]: time abstraction for production and tests

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod connection;
pub mod endpoint;
pub mod env;
mod error;
pub mod queue;
pub mod router;
pub mod session;
pub mod subscriptions;

pub use connection::{Connection, ConnectionAction, ConnectionConfig, ConnectionState};
pub use endpoint::{Channel, RealtimeEndpoint};
pub use error::{EndpointError, ListenerError};
pub use queue::OutboundQueue;
pub use router::{DispatchOutcome, EventRouter, ListenerId};
pub use session::{SessionAction, SocketSession};
pub use subscriptions::SubscriptionRegistry;
