//! The seams between the chat session and the network.
//!
//! A [`Connector`] dials the chat endpoint and yields a [`Transport`]: an
//! ordered, bidirectional channel of JSON text frames. The session task owns
//! both, so a refused connection becomes an `Error` + `Closed` event pair
//! instead of a return value at the call site.
//!
//! The built-in pair is
//! [`WebSocketConnector`](crate::transports::WebSocketConnector) /
//! [`WebSocketTransport`](crate::transports::WebSocketTransport). Anything
//! else (an in-process loopback, a test double, a relay) only needs these two
//! traits.
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use groupchat_client::error::ChatError;
//! use groupchat_client::transport::{Connector, Transport};
//! use tokio::sync::mpsc;
//!
//! /// Frames travel over a pair of in-process channels.
//! struct Loopback {
//!     to_server: mpsc::UnboundedSender<String>,
//!     from_server: mpsc::UnboundedReceiver<String>,
//! }
//!
//! #[async_trait]
//! impl Transport for Loopback {
//!     async fn send(&mut self, frame: String) -> Result<(), ChatError> {
//!         self.to_server
//!             .send(frame)
//!             .map_err(|e| ChatError::TransportSend(e.to_string()))
//!     }
//!
//!     async fn recv(&mut self) -> Option<Result<String, ChatError>> {
//!         // `mpsc::UnboundedReceiver::recv` is cancel-safe.
//!         self.from_server.recv().await.map(Ok)
//!     }
//!
//!     async fn close(&mut self) -> Result<(), ChatError> {
//!         self.from_server.close();
//!         Ok(())
//!     }
//! }
//!
//! struct Refuse;
//!
//! #[async_trait]
//! impl Connector for Refuse {
//!     type Transport = Loopback;
//!
//!     async fn connect(&self, url: &str) -> Result<Loopback, ChatError> {
//!         Err(ChatError::InvalidOrigin(url.to_string()))
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::ChatError;

/// An open connection carrying whole JSON text frames in both directions.
///
/// `recv` is polled inside the session's `tokio::select!` and gets dropped
/// whenever a command wins the race, so it **must** be cancel-safe: a frame
/// that was not returned must still be returned by the next call.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Write one frame.
    ///
    /// # Errors
    ///
    /// [`ChatError::TransportSend`], or [`ChatError::TransportClosed`] after
    /// [`close`](Transport::close). The session treats either as fatal.
    async fn send(&mut self, frame: String) -> Result<(), ChatError>;

    /// Read the next frame.
    ///
    /// `None` means the peer closed the connection cleanly. `Some(Err(_))` is
    /// a broken connection; the session reports it and stops reading.
    async fn recv(&mut self) -> Option<Result<String, ChatError>>;

    /// Start a graceful close. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// A failed close handshake. The connection is considered gone either
    /// way.
    async fn close(&mut self) -> Result<(), ChatError>;
}

/// Dials an endpoint URL (`ws://host/ws`, `wss://host/ws`, ...).
///
/// Shared by reference between sessions, hence `Sync`: every
/// [`join_requested`](crate::controller::SessionController::join_requested)
/// calls `connect` once from a fresh session task.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Transport: Transport;

    /// # Errors
    ///
    /// Any failure to reach or upgrade the endpoint. It is reported as
    /// [`TransportEvent::Error`](crate::event::TransportEvent::Error) and
    /// then [`TransportEvent::Closed`](crate::event::TransportEvent::Closed).
    async fn connect(&self, url: &str) -> Result<Self::Transport, ChatError>;
}
