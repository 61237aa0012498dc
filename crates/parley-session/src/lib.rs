//! Conversation sessions for Parley.
//!
//! A [`SessionController`] owns the one active conversation, binds it to a
//! duplex link or to the assistant's request/reply service, and keeps its
//! append-only history.

/// The session controller and its events.
pub mod controller;
/// A conversation with one target.
pub mod conversation;
/// Append-only message history.
pub mod history;

pub use controller::{
    ControllerOptions, Notice, NoticeKind, SendOutcome, SessionController, SessionEvent,
    SessionState, Transports,
};
pub use conversation::{Conversation, TransportKind};
pub use history::{ConversationHistory, HistoryEntry};
