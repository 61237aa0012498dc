use crate::history::ConversationHistory;
use parley_core::{Contact, ConversationId, Message};
use serde::Serialize;
use std::fmt;

/// Which channel discipline a conversation runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Persistent peer link.
    Duplex,
    /// Stateless exchanges with the assistant.
    RequestReply,
}

impl TransportKind {
    /// The discipline used to talk to `contact`.
    pub fn for_contact(contact: &Contact) -> Self {
        if contact.is_assistant() {
            TransportKind::RequestReply
        } else {
            TransportKind::Duplex
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Duplex => f.write_str("duplex"),
            TransportKind::RequestReply => f.write_str("request_reply"),
        }
    }
}

/// A conversation with one target and its message history.
///
/// The same shape serves both transports; only [`TransportKind`] differs.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    id: ConversationId,
    target: Contact,
    transport: TransportKind,
    history: ConversationHistory,
}

impl Conversation {
    /// Start an empty conversation with `target`.
    pub fn new(id: ConversationId, target: Contact) -> Self {
        let transport = TransportKind::for_contact(&target);
        Self {
            id,
            target,
            transport,
            history: ConversationHistory::new(),
        }
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn target(&self) -> &Contact {
        &self.target
    }

    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub(crate) fn append(&mut self, message: Message) {
        let seq = self.history.append(message).seq;
        tracing::trace!(conversation = %self.id, seq, "Message appended");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use parley_core::Identity;

    #[test]
    fn test_transport_follows_contact_kind() {
        let peer = Conversation::new(
            ConversationId::duplex(&"bob".into(), &"alice".into()),
            Contact::human("alice"),
        );
        assert_eq!(peer.transport(), TransportKind::Duplex);

        let assistant = Conversation::new(ConversationId::generate(), Contact::assistant("ToDo AI"));
        assert_eq!(assistant.transport(), TransportKind::RequestReply);
        assert!(assistant.history().is_empty());
    }

    #[test]
    fn test_append_grows_history() {
        let mut conversation = Conversation::new(
            ConversationId::duplex(&"bob".into(), &"alice".into()),
            Contact::human("alice"),
        );
        conversation.append(Message::text("bob", "hi"));
        assert_eq!(conversation.history().len(), 1);
        assert_eq!(
            conversation.history().last().and_then(Message::sender),
            Some(&Identity::from("bob"))
        );
    }
}
