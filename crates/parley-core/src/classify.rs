//! Presentation hints derived from a message's sender.

use crate::identity::Identity;
use crate::message::Message;
use serde::{Deserialize, Serialize};

/// Which side of the conversation view a message sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Sent,
    Received,
}

/// How the body should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rendering {
    Markdown,
    Plain,
}

/// Both hints for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub alignment: Alignment,
    pub rendering: Rendering,
}

/// Sent if `me` authored the message, compared case-insensitively.
///
/// Opaque payloads have no parsed sender; they count as sent only when the
/// raw text opens with `me` followed by `:`, whitespace or nothing, which is
/// how the chat service writes notices about a user (`"bob left the chat."`).
pub fn classify(message: &Message, me: &Identity) -> Alignment {
    let mine = match message {
        Message::Opaque { raw } => starts_with_identity(raw, me),
        _ => message.sender() == Some(me),
    };
    if mine {
        Alignment::Sent
    } else {
        Alignment::Received
    }
}

/// Markdown for the assistant's messages, plain text for everyone else.
pub fn rendering(message: &Message, assistant: &Identity) -> Rendering {
    if message.sender() == Some(assistant) {
        Rendering::Markdown
    } else {
        Rendering::Plain
    }
}

/// [`classify`] and [`rendering`] together.
pub fn present(message: &Message, me: &Identity, assistant: &Identity) -> Presentation {
    Presentation {
        alignment: classify(message, me),
        rendering: rendering(message, assistant),
    }
}

fn starts_with_identity(raw: &str, me: &Identity) -> bool {
    let name = me.as_str();
    if name.is_empty() {
        return false;
    }
    let Some(head) = raw.get(..name.len()) else {
        return false;
    };
    if !me.matches(head) {
        return false;
    }
    match raw[name.len()..].chars().next() {
        None => true,
        Some(c) => c == ':' || c.is_whitespace(),
    }
}
