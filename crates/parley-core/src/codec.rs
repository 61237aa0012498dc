//! Wire codec for chat payloads.
//!
//! The chat service has carried three payload shapes over time:
//!
//! - legacy `"<sender>: <text>"` strings (history replay, old clients),
//! - tagged JSON records (`{"type":"text",...}` / `{"type":"file",...}`),
//! - tagged JSON records framed by the service as `"<sender>: {...}"`.
//!
//! [`decode`] accepts all of them and never fails; anything unrecognized
//! becomes [`Message::Opaque`]. [`encode`] always writes the tagged JSON form.

use crate::error::{ParleyError, ParleyResult};
use crate::message::Message;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// `<prefix>: {<json>}` with the JSON object running to the end of input.
#[allow(clippy::expect_used)]
static FRAMED_RECORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A(.+?): (\{.*\})\s*\z").expect("hardcoded regex"));

const LEGACY_DELIMITER: &str = ": ";

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum OutboundRecord<'a> {
    Text {
        sender: &'a str,
        text: &'a str,
    },
    File {
        sender: &'a str,
        filename: &'a str,
        #[serde(rename = "fileType")]
        file_type: &'a str,
        url: &'a str,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum InboundRecord {
    Text {
        #[serde(default)]
        sender: Option<String>,
        #[serde(alias = "body", alias = "message", alias = "content")]
        text: String,
    },
    File {
        #[serde(default)]
        sender: Option<String>,
        filename: String,
        #[serde(rename = "fileType", alias = "mediaType", alias = "media_type")]
        file_type: String,
        #[serde(alias = "locator")]
        url: String,
    },
}

impl InboundRecord {
    /// Builds the message, using `fallback_sender` when the record has none.
    /// A record with no sender at all is not a usable message.
    fn into_message(self, fallback_sender: Option<&str>) -> Option<Message> {
        let pick = |sender: Option<String>| sender.or_else(|| fallback_sender.map(str::to_owned));
        match self {
            InboundRecord::Text { sender, text } => Some(Message::text(pick(sender)?, text)),
            InboundRecord::File {
                sender,
                filename,
                file_type,
                url,
            } => Some(Message::file(pick(sender)?, filename, file_type, url)),
        }
    }
}

// ── Public API ──────────────────────────────────────────────────────────────

/// Serialize a text or file message to its wire form.
///
/// Opaque messages are receive-only and cannot be encoded.
pub fn encode(message: &Message) -> ParleyResult<String> {
    let record = match message {
        Message::Text { sender, body } => OutboundRecord::Text {
            sender: sender.as_str(),
            text: body,
        },
        Message::File {
            sender,
            filename,
            media_type,
            locator,
        } => OutboundRecord::File {
            sender: sender.as_str(),
            filename,
            file_type: media_type,
            url: locator,
        },
        Message::Opaque { .. } => {
            return Err(ParleyError::Codec(
                "opaque messages cannot be encoded".into(),
            ))
        }
    };
    Ok(serde_json::to_string(&record)?)
}

/// Decode a payload of unknown provenance. Total: never fails.
pub fn decode(raw: &str) -> Message {
    decode_framed(raw)
        .or_else(|| decode_record(raw, None))
        .or_else(|| decode_legacy(raw))
        .unwrap_or_else(|| Message::opaque(raw))
}

fn decode_framed(raw: &str) -> Option<Message> {
    let caps = FRAMED_RECORD.captures(raw)?;
    let prefix = caps.get(1)?.as_str();
    if prefix.trim_start().starts_with('{') {
        return None;
    }
    decode_record(caps.get(2)?.as_str(), Some(prefix))
}

fn decode_record(raw: &str, fallback_sender: Option<&str>) -> Option<Message> {
    serde_json::from_str::<InboundRecord>(raw)
        .ok()?
        .into_message(fallback_sender)
}

fn decode_legacy(raw: &str) -> Option<Message> {
    let (sender, body) = raw.split_once(LEGACY_DELIMITER)?;
    Some(Message::text(sender, body))
}
