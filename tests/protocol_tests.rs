#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Protocol tests for the group chat client.
//!
//! Decodes JSON fixtures shaped exactly like the server's output, and checks
//! the client frames against the shapes the server reads.

use groupchat_client::{
    decode, ChatEvent, ClientMessage, DecodeFailure, Identity, OutgoingMessage, Presence,
};
use serde_json::json;

// ════════════════════════════════════════════════════════════════════
// Server fixtures
// ════════════════════════════════════════════════════════════════════

#[test]
fn fixture_connected_with_greeting_and_users() {
    let raw = r##"{
        "type": "connected",
        "message": "You joined the chat!",
        "users": [
            {"username": "Ann", "color": "#ff0000"},
            {"username": "Bob", "color": "#00ff00"}
        ]
    }"##;
    assert_eq!(
        decode(raw).unwrap(),
        ChatEvent::Connected {
            presence: Some(vec![
                Presence::new("Ann", "#ff0000"),
                Presence::new("Bob", "#00ff00"),
            ])
        }
    );
}

#[test]
fn fixture_connected_from_older_server() {
    assert_eq!(
        decode(r#"{"type":"connected"}"#).unwrap(),
        ChatEvent::Connected { presence: None }
    );
}

#[test]
fn fixture_empty_user_list() {
    assert_eq!(
        decode(r#"{"type":"user_list","users":[]}"#).unwrap(),
        ChatEvent::PresenceSnapshot { presence: vec![] }
    );
}

#[test]
fn fixture_join_broadcast() {
    let raw = r##"{"type":"join","username":"Bob","color":"#00ff00","message":"Bob joined the chat"}"##;
    assert_eq!(
        decode(raw).unwrap(),
        ChatEvent::JoinNotice {
            text: "Bob joined the chat".into()
        }
    );
}

#[test]
fn fixture_leave_broadcast() {
    let raw = r#"{"type":"leave","username":"Bob","message":"Bob left the chat"}"#;
    assert_eq!(
        decode(raw).unwrap(),
        ChatEvent::LeaveNotice {
            text: "Bob left the chat".into()
        }
    );
}

#[test]
fn fixture_message_with_unicode() {
    let raw = r##"{"type":"message","username":"Zoë","color":"#123abc","message":"héllo 👋"}"##;
    assert_eq!(
        decode(raw).unwrap(),
        ChatEvent::Message {
            display_name: "Zoë".into(),
            color: "#123abc".into(),
            text: "héllo 👋".into(),
        }
    );
}

#[test]
fn extra_fields_are_ignored() {
    let raw = r##"{"type":"user_list","users":[{"username":"Ann","color":"#f00","status":"away"}],"seq":4}"##;
    assert_eq!(
        decode(raw).unwrap(),
        ChatEvent::PresenceSnapshot {
            presence: vec![Presence::new("Ann", "#f00")]
        }
    );
}

// ════════════════════════════════════════════════════════════════════
// Decode failures
// ════════════════════════════════════════════════════════════════════

#[test]
fn failures_are_classified() {
    let cases: &[(&str, fn(&DecodeFailure) -> bool)] = &[
        ("", |f| matches!(f, DecodeFailure::Malformed(_))),
        ("null", |f| matches!(f, DecodeFailure::MissingType)),
        (r#"{"type":null}"#, |f| matches!(f, DecodeFailure::MissingType)),
        (r#"{"type":"CONNECTED"}"#, |f| {
            matches!(f, DecodeFailure::UnknownType(_))
        }),
        (r#"{"type":"message","message":"no author"}"#, |f| {
            matches!(f, DecodeFailure::Malformed(_))
        }),
        (r#"{"type":"user_list","users":"Ann"}"#, |f| {
            matches!(f, DecodeFailure::Malformed(_))
        }),
    ];

    for (raw, check) in cases {
        let failure = decode(raw).unwrap_err();
        assert!(check(&failure), "{raw:?} gave {failure:?}");
    }
}

#[test]
fn failure_messages_are_readable() {
    let failure = decode(r#"{"type":"typing"}"#).unwrap_err();
    assert_eq!(failure.to_string(), r#"unknown frame type "typing""#);
}

// ════════════════════════════════════════════════════════════════════
// Client frames
// ════════════════════════════════════════════════════════════════════

#[test]
fn handshake_frame_shape() {
    let identity = Identity::new(" Ann ", "#ff0000", "#4a90e2").unwrap();
    let value = serde_json::to_value(identity.handshake()).unwrap();
    assert_eq!(value, json!({"username": "Ann", "color": "#ff0000"}));
}

#[test]
fn chat_frame_shape() {
    let frame = OutgoingMessage::new("  hello  ").unwrap().into_frame();
    let value = serde_json::to_value(&frame).unwrap();
    assert_eq!(value, json!({"type": "message", "message": "hello"}));
    assert!(matches!(frame, ClientMessage::Chat(_)));
}
