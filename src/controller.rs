//! The session controller: the Setup / InChat state machine.
//!
//! [`SessionController`] owns the only [`TransportSession`], the
//! [`PresenceRegistry`] and the join [`Identity`]. It is driven one event at a
//! time: user actions call [`join_requested`](SessionController::join_requested),
//! [`send_requested`](SessionController::send_requested) and
//! [`leave_requested`](SessionController::leave_requested); transport events are
//! fed through [`pump`](SessionController::pump) (or
//! [`next_event`](SessionController::next_event) plus
//! [`handle_transport_event`](SessionController::handle_transport_event) when
//! the caller multiplexes other inputs).
//!
//! Every close, whether requested, server-initiated or caused by a network
//! failure, converges on the same reset back to [`SessionPhase::Setup`].
//!
//! # Example
//!
//! ```rust,ignore
//! let mut controller = SessionController::new(
//!     WebSocketConnector,
//!     TerminalRenderer::new(std::io::stdout(), true),
//!     ChatConfig::new(PageOrigin::parse("https://chat.example.com")?),
//! );
//! controller.join_requested("Ann", "#ff0000")?;
//! while controller.pump().await {
//!     if controller.phase() == SessionPhase::InChat {
//!         controller.send_requested("hello")?;
//!     }
//! }
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ChatConfig;
use crate::decoder::decode;
use crate::error::{ChatError, Result};
use crate::event::{ChatEvent, TransportEvent};
use crate::identity::{Identity, OutgoingMessage};
use crate::presence::PresenceRegistry;
use crate::protocol::Presence;
use crate::render::{RenderBoundary, TranscriptEntry};
use crate::session::TransportSession;
use crate::transport::Connector;

/// Warning shown when the transport reports an error.
pub const CONNECTION_ERROR_WARNING: &str = "Connection error. Please try again.";

/// Which screen is active and which actions are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Identity form; no confirmed session.
    #[default]
    Setup,
    /// The server confirmed the handshake.
    InChat,
}

/// Drives one chat participant through join, chat and leave.
pub struct SessionController<C: Connector, R: RenderBoundary> {
    connector: Arc<C>,
    render: R,
    config: ChatConfig,
    phase: SessionPhase,
    presence: PresenceRegistry,
    identity: Option<Identity>,
    session: Option<TransportSession>,
}

impl<C: Connector, R: RenderBoundary> SessionController<C, R> {
    /// Create a controller in [`SessionPhase::Setup`]. No connection is made
    /// until [`join_requested`](Self::join_requested).
    pub fn new(connector: C, render: R, config: ChatConfig) -> Self {
        Self {
            connector: Arc::new(connector),
            render,
            config,
            phase: SessionPhase::Setup,
            presence: PresenceRegistry::new(),
            identity: None,
            session: None,
        }
    }

    // ── User actions ────────────────────────────────────────────────

    /// Validate the identity and open a transport session.
    ///
    /// The phase stays [`SessionPhase::Setup`] until the server answers the
    /// handshake with `connected`.
    ///
    /// # Errors
    ///
    /// - [`ChatError::EmptyDisplayName`] if the trimmed name is empty; the
    ///   user is warned and no connection is attempted.
    /// - [`ChatError::AlreadyJoined`] if a session is already connecting or
    ///   active.
    pub fn join_requested(&mut self, display_name: &str, color: &str) -> Result<()> {
        if self.session.is_some() {
            warn!("join requested while a session exists");
            return Err(ChatError::AlreadyJoined);
        }

        let identity = match Identity::new(display_name, color, &self.config.default_color) {
            Ok(identity) => identity,
            Err(e) => {
                self.render.warn(&e.to_string());
                return Err(e);
            }
        };

        let url = self.config.endpoint_url();
        info!(url = %url, name = identity.display_name(), "joining chat");
        self.identity = Some(identity);
        self.session = Some(TransportSession::open(
            Arc::clone(&self.connector),
            url,
            self.config.event_channel_capacity,
            self.config.shutdown_timeout,
        ));
        Ok(())
    }

    /// Send one chat line.
    ///
    /// Returns `Ok(false)` without sending when the trimmed text is empty,
    /// the phase is not [`SessionPhase::InChat`], or the session is not open.
    /// Returns `Ok(true)` once the frame is queued and the input cleared.
    ///
    /// # Errors
    ///
    /// Serialization failures, or a session task that vanished between the
    /// readiness check and the send.
    pub fn send_requested(&mut self, text: &str) -> Result<bool> {
        let Ok(message) = OutgoingMessage::new(text) else {
            return Ok(false);
        };
        if self.phase != SessionPhase::InChat {
            debug!("dropping message sent outside the chat");
            return Ok(false);
        }
        let Some(session) = self.session.as_ref().filter(|s| s.is_open()) else {
            debug!("dropping message, session not open");
            return Ok(false);
        };

        let frame = serde_json::to_string(&message.into_frame())?;
        session.send(frame)?;
        self.render.clear_message_input();
        Ok(true)
    }

    /// Ask the session to close. The reset happens when the `Closed` event is
    /// handled, exactly as for any other close.
    pub fn leave_requested(&mut self) {
        match &self.session {
            Some(session) => {
                info!("leaving chat");
                session.close();
            }
            None => debug!("leave requested without a session"),
        }
    }

    /// Close the session for application exit and apply the close reset.
    pub async fn shutdown(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.shutdown().await;
            self.handle_closed();
        }
    }

    // ── Transport events ────────────────────────────────────────────

    /// Wait for the next event of the active session, or `None` when there
    /// is no session.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        match self.session.as_mut() {
            Some(session) => session.next_event().await,
            None => None,
        }
    }

    /// Wait for and handle one transport event. Returns `false` when there is
    /// no active session to wait on.
    pub async fn pump(&mut self) -> bool {
        match self.next_event().await {
            Some(event) => {
                self.handle_transport_event(event);
                true
            }
            None => false,
        }
    }

    /// Apply one transport event. Runs to completion; never fails.
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => self.handle_opened(),
            TransportEvent::Message(raw) => match decode(&raw) {
                Ok(chat_event) => self.handle_chat_event(chat_event),
                Err(failure) if failure.is_forward_compatible() => {
                    debug!("ignoring frame: {failure}");
                }
                Err(failure) => {
                    warn!("dropping undecodable frame: {failure} (raw: {raw})");
                }
            },
            TransportEvent::Error(reason) => {
                warn!("transport error: {reason}");
                self.render.warn(CONNECTION_ERROR_WARNING);
            }
            TransportEvent::Closed => self.handle_closed(),
        }
    }

    fn handle_opened(&mut self) {
        let (Some(identity), Some(session)) = (&self.identity, &self.session) else {
            debug!("opened without identity or session");
            return;
        };
        let sent = serde_json::to_string(&identity.handshake())
            .map_err(ChatError::from)
            .and_then(|frame| session.send(frame));
        match sent {
            Ok(()) => debug!(name = identity.display_name(), "handshake sent"),
            Err(e) => warn!("handshake failed: {e}"),
        }
    }

    fn handle_chat_event(&mut self, event: ChatEvent) {
        if event.is_transcript_entry() && self.phase == SessionPhase::Setup {
            debug!("transcript event before connected, appending");
        }
        match event {
            ChatEvent::Connected { presence } => {
                if let Some(presence) = presence {
                    self.apply_presence(presence);
                }
                if self.phase == SessionPhase::Setup {
                    info!("joined chat");
                    self.phase = SessionPhase::InChat;
                    self.render.show_chat_screen();
                    self.render.focus_message_input();
                }
            }
            ChatEvent::PresenceSnapshot { presence } => self.apply_presence(presence),
            ChatEvent::Message {
                display_name,
                color,
                text,
            } => self.render.append_message(&TranscriptEntry::Message {
                display_name,
                color,
                text,
            }),
            ChatEvent::JoinNotice { text } => {
                self.render.append_message(&TranscriptEntry::Join { text });
            }
            ChatEvent::LeaveNotice { text } => {
                self.render.append_message(&TranscriptEntry::Leave { text });
            }
        }
    }

    fn apply_presence(&mut self, presence: Vec<Presence>) {
        self.presence.replace(presence);
        debug!(count = self.presence.count(), "presence updated");
        self.render.render_presence(self.presence.entries());
    }

    fn handle_closed(&mut self) {
        info!(phase = ?self.phase, "session closed");
        self.session = None;
        self.identity = None;
        self.phase = SessionPhase::Setup;
        self.presence.clear();
        self.render.render_presence(&[]);
        self.render.clear_transcript();
        self.render.show_setup_screen();
    }

    // ── State accessors ─────────────────────────────────────────────

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    /// The identity of the current session, if any.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Returns `true` while a session exists (connecting, open or closing).
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Returns `true` while the session can carry frames.
    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(TransportSession::is_open)
    }

    pub fn render(&self) -> &R {
        &self.render
    }

    pub fn render_mut(&mut self) -> &mut R {
        &mut self.render
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }
}

impl<C: Connector, R: RenderBoundary> std::fmt::Debug for SessionController<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("phase", &self.phase)
            .field("presence", &self.presence.count())
            .field("identity", &self.identity)
            .field("session", &self.session)
            .finish()
    }
}
