//! Events surfaced by the client.
//!
//! [`TransportEvent`] is what a [`TransportSession`](crate::session::TransportSession)
//! reports about its connection. [`ChatEvent`] is the decoded, domain-level view
//! of one inbound server frame.

use crate::protocol::{Presence, ServerMessage};

/// Lifecycle events of one transport session, in the order they occur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is established. Fired exactly once, and only on success.
    Opened,
    /// One inbound text frame, in network arrival order.
    Message(String),
    /// Advisory error. Fired at most once; a [`Closed`](Self::Closed) follows.
    Error(String),
    /// Terminal event. Fired exactly once for every close cause.
    Closed,
}

/// A decoded server event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// First server reply after the handshake. `presence` is `None` when the
    /// server did not include a user list.
    Connected { presence: Option<Vec<Presence>> },
    /// Full replacement of the presence set.
    PresenceSnapshot { presence: Vec<Presence> },
    /// A chat line.
    Message {
        display_name: String,
        color: String,
        text: String,
    },
    /// Narrative "X joined" notice.
    JoinNotice { text: String },
    /// Narrative "X left" notice.
    LeaveNotice { text: String },
}

impl ChatEvent {
    /// Returns `true` for events that belong in the transcript.
    pub fn is_transcript_entry(&self) -> bool {
        matches!(
            self,
            Self::Message { .. } | Self::JoinNotice { .. } | Self::LeaveNotice { .. }
        )
    }
}

impl From<ServerMessage> for ChatEvent {
    fn from(msg: ServerMessage) -> Self {
        match msg {
            ServerMessage::Connected { users, .. } => Self::Connected { presence: users },
            ServerMessage::UserList { users } => Self::PresenceSnapshot { presence: users },
            ServerMessage::Message {
                username,
                color,
                message,
            } => Self::Message {
                display_name: username,
                color,
                text: message,
            },
            ServerMessage::Join { message, .. } => Self::JoinNotice { text: message },
            ServerMessage::Leave { message, .. } => Self::LeaveNotice { text: message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_drops_extra_fields() {
        let event = ChatEvent::from(ServerMessage::Join {
            message: "Bob joined the chat".into(),
            username: Some("Bob".into()),
            color: Some("#00ff00".into()),
        });
        assert_eq!(
            event,
            ChatEvent::JoinNotice {
                text: "Bob joined the chat".into()
            }
        );
        assert!(event.is_transcript_entry());
    }

    #[test]
    fn connected_keeps_optional_presence() {
        let event = ChatEvent::from(ServerMessage::Connected {
            users: None,
            message: Some("You joined the chat!".into()),
        });
        assert_eq!(event, ChatEvent::Connected { presence: None });
        assert!(!event.is_transcript_entry());
    }
}
