use crate::identity::Identity;
use serde::{Deserialize, Serialize};

/// Who is on the other end of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    /// Another user, reached over a duplex channel.
    Human,
    /// The well-known assistant, reached over request/reply.
    Assistant,
}

/// A selectable conversation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub identity: Identity,
    pub kind: ContactKind,
}

impl Contact {
    /// A human peer.
    pub fn human(identity: impl Into<Identity>) -> Self {
        Self {
            identity: identity.into(),
            kind: ContactKind::Human,
        }
    }

    /// The assistant contact.
    pub fn assistant(identity: impl Into<Identity>) -> Self {
        Self {
            identity: identity.into(),
            kind: ContactKind::Assistant,
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.kind == ContactKind::Assistant
    }
}
