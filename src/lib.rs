//! # Group Chat Client
//!
//! Transport-agnostic Rust client for a real-time group chat server that
//! speaks JSON text frames over a persistent connection.
//!
//! The client announces a display identity, keeps the live presence list in
//! sync with the server's snapshots, renders chat lines and join/leave
//! notices, and sends chat messages. All of it is driven by
//! [`SessionController`], a two-phase (setup / in-chat) state machine that
//! renders through the [`RenderBoundary`] trait, so it runs and tests without
//! any visual surface.
//!
//! ## Features
//!
//! - **Transport-agnostic**: implement [`Transport`] and [`Connector`] for any backend
//! - **WebSocket built-in**: the default `transport-websocket` feature provides
//!   `WebSocketTransport` and `WebSocketConnector`
//! - **Single recovery path**: every close, for any reason, resets to setup

pub mod config;
#[cfg(feature = "tokio-runtime")]
pub mod controller;
pub mod decoder;
pub mod endpoint;
pub mod error;
pub mod event;
pub mod identity;
pub mod presence;
pub mod protocol;
pub mod render;
#[cfg(feature = "tokio-runtime")]
pub mod session;
pub mod transport;
pub mod transports;

// Re-export primary types for ergonomic imports.
pub use config::ChatConfig;
#[cfg(feature = "tokio-runtime")]
pub use controller::{SessionController, SessionPhase};
pub use decoder::{decode, DecodeFailure};
pub use endpoint::PageOrigin;
pub use error::ChatError;
pub use event::{ChatEvent, TransportEvent};
pub use identity::{Identity, OutgoingMessage};
pub use presence::PresenceRegistry;
pub use protocol::{ClientMessage, Presence, ServerMessage};
pub use render::{RenderBoundary, TerminalRenderer, TranscriptEntry};
#[cfg(feature = "tokio-runtime")]
pub use session::TransportSession;
pub use transport::{Connector, Transport};
#[cfg(feature = "transport-websocket")]
pub use transports::{WebSocketConnector, WebSocketTransport};
