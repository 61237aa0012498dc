#![allow(clippy::unwrap_used, clippy::expect_used)]

use parley_core::*;

// ---------------------------------------------------------------------------
// 1. Legacy strings decode to text for arbitrary names and bodies
// ---------------------------------------------------------------------------

#[test]
fn test_legacy_form_decodes_for_many_shapes() {
    let names = ["alice", "Bob Smith", "x", "user-42", "émile", "a:b"];
    let bodies = ["hi", "", "two: colons: here", "{ not json", "  padded  "];
    for name in names {
        for body in bodies {
            let raw = format!("{name}: {body}");
            assert_eq!(
                decode(&raw),
                Message::text(name, body),
                "payload {raw:?} should decode as legacy text"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Encoded messages decode back, bare or framed by the service
// ---------------------------------------------------------------------------

#[test]
fn test_encoded_messages_survive_service_framing() {
    let messages = vec![
        Message::text("bob", "hello"),
        Message::text("Bob", "multi\nline: body"),
        Message::text("bob", "{\"type\":\"file\"}"),
        Message::file("alice", "plan.pdf", "application/pdf", "https://cdn/plan.pdf"),
    ];
    for msg in messages {
        let wire = encode(&msg).unwrap();
        assert_eq!(decode(&wire), msg);
        let sender = msg.sender().unwrap().as_str().to_string();
        assert_eq!(decode(&format!("{sender}: {wire}")), msg);
    }
}

// ---------------------------------------------------------------------------
// 3. Classification and rendering of decoded history
// ---------------------------------------------------------------------------

#[test]
fn test_decoded_history_classifies_for_viewer() {
    let me = Identity::from("bob");
    let assistant = Identity::from("ToDo AI");
    let history: Vec<Message> = [
        "alice: hey",
        "BOB: hi alice",
        r#"{"type":"file","sender":"bob","filename":"a.png","fileType":"image/png","url":"/f/1"}"#,
        "bob left the chat.",
        "maintenance window tonight",
    ]
    .iter()
    .map(|raw| decode(raw))
    .collect();

    let alignments: Vec<Alignment> = history.iter().map(|m| classify(m, &me)).collect();
    assert_eq!(
        alignments,
        vec![
            Alignment::Received,
            Alignment::Sent,
            Alignment::Sent,
            Alignment::Sent,
            Alignment::Received,
        ]
    );
    assert!(history
        .iter()
        .all(|m| rendering(m, &assistant) == Rendering::Plain));
}

// ---------------------------------------------------------------------------
// 4. Contacts serialize with lowercase kinds
// ---------------------------------------------------------------------------

#[test]
fn test_contact_serialization() {
    let json = serde_json::to_value(Contact::assistant("ToDo AI")).unwrap();
    assert_eq!(json["kind"], "assistant");
    assert_eq!(json["identity"], "ToDo AI");
    let back: Contact = serde_json::from_value(json).unwrap();
    assert!(back.is_assistant());
}

// ---------------------------------------------------------------------------
// 5. Error display
// ---------------------------------------------------------------------------

#[test]
fn test_error_display_names_the_subsystem() {
    let cases: Vec<(ParleyError, &str)> = vec![
        (ParleyError::Exchange("boom".into()), "Exchange error: boom"),
        (ParleyError::Upload("too big".into()), "Upload error: too big"),
        (ParleyError::NoActiveConversation, "No active conversation"),
        (AuthError::MissingToken.into(), "Auth error: no credential available"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}
