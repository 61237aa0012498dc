//! Core types and error definitions for Parley.
//!
//! This crate holds everything the conversation engine shares between its
//! transports and its session layer: identities, the structured message
//! model, the wire codec, presentation classification, configuration and
//! errors.
//!
//! # Main types
//!
//! - [`ParleyError`]: Unified error enum; [`AuthError`] for credential failures.
//! - [`Identity`]: Case-insensitive participant name.
//! - [`AppContext`]: The signed-in identity and its bearer credential.
//! - [`Contact`]: A selectable conversation target (human or assistant).
//! - [`Message`]: Text, file or opaque chat message.
//! - [`ConversationId`]: Service-side conversation scope.
//! - [`ClientConfig`]: Service locations and client tunables.

/// Sent/received and markdown/plain hints.
pub mod classify;
/// Wire payload encoding and total decoding.
pub mod codec;
/// Client configuration.
pub mod config;
/// Conversation targets.
pub mod contact;
/// Error types.
pub mod error;
/// Identities, credentials and conversation ids.
pub mod identity;
/// The structured message model.
pub mod message;
/// Logging initialisation.
pub mod telemetry;

pub use classify::{classify, present, rendering, Alignment, Presentation, Rendering};
pub use codec::{decode, encode};
pub use config::{ClientConfig, Endpoints};
pub use contact::{Contact, ContactKind};
pub use error::{AuthError, ParleyError, ParleyResult};
pub use identity::{AppContext, ConversationId, Credential, Identity};
pub use message::Message;
