use chrono::{DateTime, Utc};
use parley_core::Message;
use serde::Serialize;

// ---------------------------------------------------------------------------
// HistoryEntry
// ---------------------------------------------------------------------------

/// One appended message with its local arrival metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// Position in the history, starting at 0.
    pub seq: u64,
    pub appended_at: DateTime<Utc>,
    pub message: Message,
}

// ---------------------------------------------------------------------------
// ConversationHistory
// ---------------------------------------------------------------------------

/// Append-only, in-memory message log of one conversation.
///
/// Entries can be read but never edited or removed; the whole history goes
/// away with its conversation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversationHistory {
    entries: Vec<HistoryEntry>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return the stored entry.
    pub fn append(&mut self, message: Message) -> &HistoryEntry {
        let seq = self.entries.len() as u64;
        self.entries.push(HistoryEntry {
            seq,
            appended_at: Utc::now(),
            message,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Messages in append order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> + '_ {
        self.entries.iter().map(|e| &e.message)
    }

    pub fn last(&self) -> Option<&Message> {
        self.entries.last().map(|e| &e.message)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_append_assigns_sequence_numbers() {
        let mut history = ConversationHistory::new();
        assert!(history.is_empty());

        let first = history.append(Message::text("bob", "hi")).seq;
        let second = history.append(Message::text("alice", "hey")).seq;
        assert_eq!((first, second), (0, 1));
        assert_eq!(history.len(), 2);
        assert_eq!(history.last(), Some(&Message::text("alice", "hey")));
    }

    #[test]
    fn test_messages_keep_append_order() {
        let mut history = ConversationHistory::new();
        history.append(Message::text("bob", "one"));
        history.append(Message::opaque("???"));
        history.append(Message::file("bob", "a.png", "image/png", "/f/1"));

        let previews: Vec<&str> = history.messages().map(Message::preview).collect();
        assert_eq!(previews, vec!["one", "???", "a.png"]);
    }

    #[test]
    fn test_timestamps_never_go_backwards() {
        let mut history = ConversationHistory::new();
        for i in 0..5 {
            history.append(Message::text("bob", i.to_string()));
        }
        let entries = history.entries();
        assert!(entries
            .windows(2)
            .all(|w| w[0].appended_at <= w[1].appended_at));
    }

    #[test]
    fn test_serializes_as_entry_list() {
        let mut history = ConversationHistory::new();
        history.append(Message::text("bob", "hi"));
        let json = serde_json::to_value(&history).unwrap();
        assert_eq!(json["entries"][0]["seq"], 0);
        assert_eq!(json["entries"][0]["message"]["kind"], "text");
        assert_eq!(json["entries"][0]["message"]["body"], "hi");
    }
}
