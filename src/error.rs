//! Error types for the group chat client.

use thiserror::Error;

/// Errors that can occur when using the group chat client.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The display name was empty after trimming.
    #[error("please enter your name")]
    EmptyDisplayName,

    /// The outgoing message was empty after trimming.
    #[error("message is empty")]
    EmptyMessage,

    /// A join was requested while a session is already connecting or active.
    #[error("already joined; leave the chat before joining again")]
    AlreadyJoined,

    /// A frame was sent before the transport opened or after it closed.
    #[error("transport session is not open")]
    InvalidState,

    /// The background session task is gone.
    #[error("not connected to server")]
    NotConnected,

    /// The page origin could not be parsed.
    #[error("invalid page origin: {0}")]
    InvalidOrigin(String),

    /// Failed to send a frame through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a frame from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The transport connection was already closed.
    #[error("transport connection closed")]
    TransportClosed,

    /// Failed to serialize an outgoing protocol message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O error occurred, typically while connecting.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    /// Returns `true` for errors caused by user input rather than the connection.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyDisplayName | Self::EmptyMessage | Self::AlreadyJoined
        )
    }
}

/// A specialized [`Result`] type for group chat client operations.
pub type Result<T> = std::result::Result<T, ChatError>;
