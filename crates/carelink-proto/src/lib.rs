//! Wire protocol for the realtime telehealth channel.
//!
//! Everything exchanged over the socket is a JSON text frame with the
//! envelope `{"type": <string>, "data"?: <object>, "timestamp"?: <ms epoch>}`.
//! This crate is a pure data layer: the [`Frame`] envelope, the frame type
//! taxonomy ([`kinds`]), and the typed payloads carried in `data`
//! ([`payloads`]). Session logic lives in `carelink-core`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod errors;
mod frame;
pub mod kinds;
pub mod payloads;

pub use errors::{ProtocolError, Result};
pub use frame::Frame;
