//! Transports for the Parley conversation engine.
//!
//! Provides the two incompatible channel disciplines the session layer unifies,
//! plus the side services it leans on.
//!
//! # Main types
//!
//! - [`DuplexTransport`] / [`DuplexHandle`]: Persistent peer link with an
//!   ordered event stream; [`WebSocketTransport`] is the chat-service
//!   implementation.
//! - [`AssistantTransport`]: Stateless request/reply with the assistant;
//!   [`HttpAssistant`] talks to the assistant service.
//! - [`AttachmentUploader`]: Out-of-band upload returning a locator.
//! - [`ContactDirectory`]: User listing, turned into a roster by [`roster`].

/// Request/reply transport to the assistant service.
pub mod assistant;
/// Attachment uploads.
pub mod attachment;
/// Contact directory and roster building.
pub mod directory;
/// Duplex link handle and lifecycle.
pub mod duplex;
mod http;
/// WebSocket implementation of the duplex transport.
pub mod websocket;

pub use assistant::{AssistantTransport, AssistantTurn, HttpAssistant, TurnRole};
pub use attachment::{AttachmentUploader, HttpAttachmentUploader};
pub use directory::{load_roster, roster, ContactDirectory, HttpContactDirectory};
pub use duplex::{
    DuplexCommand, DuplexEndpoint, DuplexEvent, DuplexHandle, DuplexTransport, LinkState,
};
pub use websocket::WebSocketTransport;
