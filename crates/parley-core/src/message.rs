use crate::identity::Identity;
use serde::{Deserialize, Serialize};

/// A structured chat message, whatever shape it arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Message {
    /// Plain text.
    Text { sender: Identity, body: String },
    /// A reference to an uploaded attachment.
    File {
        sender: Identity,
        filename: String,
        media_type: String,
        locator: String,
    },
    /// A received payload that matched no known shape, kept verbatim.
    Opaque { raw: String },
}

impl Message {
    /// Creates a [`Message::Text`].
    pub fn text(sender: impl Into<Identity>, body: impl Into<String>) -> Self {
        Message::Text {
            sender: sender.into(),
            body: body.into(),
        }
    }

    /// Creates a [`Message::File`].
    pub fn file(
        sender: impl Into<Identity>,
        filename: impl Into<String>,
        media_type: impl Into<String>,
        locator: impl Into<String>,
    ) -> Self {
        Message::File {
            sender: sender.into(),
            filename: filename.into(),
            media_type: media_type.into(),
            locator: locator.into(),
        }
    }

    /// Creates a [`Message::Opaque`].
    pub fn opaque(raw: impl Into<String>) -> Self {
        Message::Opaque { raw: raw.into() }
    }

    /// The author, unknown for opaque payloads.
    pub fn sender(&self) -> Option<&Identity> {
        match self {
            Message::Text { sender, .. } | Message::File { sender, .. } => Some(sender),
            Message::Opaque { .. } => None,
        }
    }

    /// Text suitable for a conversation list preview.
    pub fn preview(&self) -> &str {
        match self {
            Message::Text { body, .. } => body,
            Message::File { filename, .. } => filename,
            Message::Opaque { raw } => raw,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_accessor() {
        assert_eq!(
            Message::text("bob", "hi").sender(),
            Some(&Identity::from("bob"))
        );
        assert!(Message::opaque("???").sender().is_none());
    }

    #[test]
    fn test_preview() {
        let file = Message::file("bob", "a.png", "image/png", "/f/1");
        assert_eq!(file.preview(), "a.png");
        assert_eq!(Message::text("bob", "hello").preview(), "hello");
    }
}
