//! Validated user input: the join identity and outgoing chat text.

use crate::error::{ChatError, Result};
use crate::protocol::ClientMessage;

/// Display identity announced in the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    display_name: String,
    color: String,
}

impl Identity {
    /// Build an identity from raw form input.
    ///
    /// The display name is trimmed and must not be empty. A blank color falls
    /// back to `default_color`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::EmptyDisplayName`] if the trimmed name is empty.
    pub fn new(display_name: &str, color: &str, default_color: &str) -> Result<Self> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(ChatError::EmptyDisplayName);
        }
        let color = match color.trim() {
            "" => default_color,
            color => color,
        };
        Ok(Self {
            display_name: display_name.to_owned(),
            color: color.to_owned(),
        })
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    /// The handshake frame announcing this identity.
    pub fn handshake(&self) -> ClientMessage {
        ClientMessage::handshake(&self.display_name, &self.color)
    }
}

/// One chat line ready to send. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    text: String,
}

impl OutgoingMessage {
    /// Trim `text` and reject it if nothing is left.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::EmptyMessage`] for empty or whitespace-only text.
    pub fn new(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        Ok(Self {
            text: text.to_owned(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_frame(self) -> ClientMessage {
        ClientMessage::chat(self.text)
    }
}
