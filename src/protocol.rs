//! Wire-compatible protocol types for the group chat server.
//!
//! Every frame is one JSON object sent as a WebSocket text frame. The client
//! speaks two shapes:
//!
//! - the handshake `{"username": .., "color": ..}`, sent exactly once, as the
//!   first frame after the connection opens (it carries no `type` field);
//! - chat frames `{"type": "message", "message": ..}`.
//!
//! The server answers with `type`-tagged frames, see [`ServerMessage`].

use serde::{Deserialize, Serialize};

// ── Structs ─────────────────────────────────────────────────────────

/// One connected participant as listed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    /// Display name (`username` on the wire).
    #[serde(rename = "username")]
    pub display_name: String,
    /// Display color, usually a `#rrggbb` string.
    pub color: String,
}

impl Presence {
    /// Create a presence entry.
    pub fn new(display_name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            color: color.into(),
        }
    }
}

// ── Messages ────────────────────────────────────────────────────────

/// Tagged chat frames sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatFrame {
    /// A chat line from this user.
    Message { message: String },
}

/// Message shapes sent from client to server.
///
/// `Chat` is listed first so that untagged deserialization only falls back to
/// `Handshake` when no `type` field is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientMessage {
    /// A `type`-tagged chat frame.
    Chat(ChatFrame),
    /// Identity announcement (MUST be the first frame).
    Handshake { username: String, color: String },
}

impl ClientMessage {
    /// Build the handshake frame for the given identity fields.
    pub fn handshake(username: impl Into<String>, color: impl Into<String>) -> Self {
        Self::Handshake {
            username: username.into(),
            color: color.into(),
        }
    }

    /// Build a chat frame carrying `message`.
    pub fn chat(message: impl Into<String>) -> Self {
        Self::Chat(ChatFrame::Message {
            message: message.into(),
        })
    }
}

/// Message types sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Handshake accepted. Older servers omit `users`.
    Connected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        users: Option<Vec<Presence>>,
        /// Greeting text, informational only.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Full listing of connected participants.
    UserList { users: Vec<Presence> },
    /// A chat line from any participant, including this one.
    Message {
        username: String,
        color: String,
        message: String,
    },
    /// Another participant joined.
    Join {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    /// Another participant left.
    Leave {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
    },
}

impl ServerMessage {
    /// Every `type` tag this client understands.
    pub const KNOWN_TYPES: &'static [&'static str] =
        &["connected", "user_list", "message", "join", "leave"];
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn handshake_has_no_type_field() {
        let value = serde_json::to_value(ClientMessage::handshake("Ann", "#ff0000")).unwrap();
        assert_eq!(value, json!({"username": "Ann", "color": "#ff0000"}));
    }

    #[test]
    fn chat_frame_is_type_tagged() {
        let value = serde_json::to_value(ClientMessage::chat("hello")).unwrap();
        assert_eq!(value, json!({"type": "message", "message": "hello"}));
    }

    #[test]
    fn untagged_client_message_prefers_chat() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"message","message":"hi"}"#).unwrap();
        assert_eq!(msg, ClientMessage::chat("hi"));

        let msg: ClientMessage =
            serde_json::from_str(r##"{"username":"Ann","color":"#fff"}"##).unwrap();
        assert_eq!(msg, ClientMessage::handshake("Ann", "#fff"));
    }

    #[test]
    fn connected_accepts_missing_users() {
        let msg: ServerMessage = serde_json::from_str(r#"{"type":"connected"}"#).unwrap();
        assert_eq!(
            msg,
            ServerMessage::Connected {
                users: None,
                message: None
            }
        );
    }

    #[test]
    fn presence_uses_username_on_the_wire() {
        let value = serde_json::to_value(Presence::new("Bob", "#00ff00")).unwrap();
        assert_eq!(value, json!({"username": "Bob", "color": "#00ff00"}));
    }

    #[test]
    fn known_types_cover_every_variant() {
        let samples = [
            ServerMessage::Connected {
                users: None,
                message: None,
            },
            ServerMessage::UserList { users: vec![] },
            ServerMessage::Message {
                username: "a".into(),
                color: "b".into(),
                message: "c".into(),
            },
            ServerMessage::Join {
                message: "j".into(),
                username: None,
                color: None,
            },
            ServerMessage::Leave {
                message: "l".into(),
                username: None,
            },
        ];
        for sample in samples {
            let value = serde_json::to_value(&sample).unwrap();
            let tag = value["type"].as_str().unwrap();
            assert!(ServerMessage::KNOWN_TYPES.contains(&tag), "missing {tag}");
        }
    }
}
