//! Conversation-layer state for the telehealth client.
//!
//! # Architecture
//!
//! Follows the same sans-IO, action-based patterns as `carelink-core`: the
//! [`Timeline`] and [`IncomingCalls`] state machines are pure and directly
//! testable, while the async [`ConversationService`] orchestrates them over
//! the [`MessageApi`] collaborator without owning a runtime.
//!
//! # Components
//!
//! - [`Timeline`]: ordered, deduplicated message sequence for one open
//!   conversation (optimistic sends, backward pagination, edit/delete
//!   projection)
//! - [`ScrollAnchor`]: content-height compensation across prepends
//! - [`AttachmentCache`]: lazy per-message blob cache
//! - [`IncomingCalls`]: single-flight incoming-call prompt gate
//! - [`ParticipantRoster`]: conversation presence projection
//! - [`MessageApi`] / [`TokenProvider`]: external collaborator seams

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod api;
mod attachments;
mod call;
mod error;
mod message;
mod presence;
mod scroll;
mod service;
mod timeline;

pub use api::{AttachmentUpload, MessageApi, MessagePage, OutgoingMessage, TokenProvider};
pub use attachments::AttachmentCache;
pub use call::{CallAction, CallConfig, DEFAULT_RING_TIMEOUT, IncomingCalls};
pub use error::{ApiError, AttachmentError, ServiceError, TimelineError};
pub use message::{AttachmentRef, ChatMessage, MessageId, Provenance, TEMP_ID_BASE, TempIdGen};
pub use presence::ParticipantRoster;
pub use scroll::ScrollAnchor;
pub use service::ConversationService;
pub use timeline::Timeline;
