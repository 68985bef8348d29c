//! # Scripted Transport Example
//!
//! Implements [`Transport`] and [`Connector`] with an in-process loopback
//! channel and plays a short conversation against a fake server:
//!
//! 1. The client sends its handshake
//! 2. The server confirms with `connected` and a presence snapshot
//! 3. Another user joins, says hello, and the server hangs up
//!
//! ## Running
//!
//! ```sh
//! cargo run --example scripted_transport
//! ```

use std::sync::Mutex;

use async_trait::async_trait;
use groupchat_client::{
    ChatConfig, ChatError, Connector, SessionController, SessionPhase, TerminalRenderer,
    Transport,
};
use serde_json::json;
use tokio::sync::mpsc;

// ─────────────────────────────────────────────────────────────────────
// Step 1: A channel-based "loopback" transport
// ─────────────────────────────────────────────────────────────────────

/// Client half: implements [`Transport`].
pub struct LoopbackTransport {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

/// Server half: read what the client sent, push frames to the client.
pub struct LoopbackServer {
    pub rx: mpsc::UnboundedReceiver<String>,
    pub tx: mpsc::UnboundedSender<String>,
}

fn loopback_pair() -> (LoopbackTransport, LoopbackServer) {
    let (client_tx, server_rx) = mpsc::unbounded_channel();
    let (server_tx, client_rx) = mpsc::unbounded_channel();
    (
        LoopbackTransport {
            tx: client_tx,
            rx: client_rx,
        },
        LoopbackServer {
            rx: server_rx,
            tx: server_tx,
        },
    )
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&mut self, message: String) -> Result<(), ChatError> {
        self.tx
            .send(message)
            .map_err(|e| ChatError::TransportSend(e.to_string()))
    }

    /// `None` once the server half is dropped: that is the close.
    async fn recv(&mut self) -> Option<Result<String, ChatError>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<(), ChatError> {
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 2: A connector that hands out the prepared transport once
// ─────────────────────────────────────────────────────────────────────

struct LoopbackConnector(Mutex<Option<LoopbackTransport>>);

#[async_trait]
impl Connector for LoopbackConnector {
    type Transport = LoopbackTransport;

    async fn connect(&self, url: &str) -> Result<LoopbackTransport, ChatError> {
        tracing::info!("connecting loopback for {url}");
        self.0
            .lock()
            .map_err(|_| ChatError::NotConnected)?
            .take()
            .ok_or(ChatError::NotConnected)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 3: Wire the controller to a fake server
// ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (transport, mut server) = loopback_pair();

    tokio::spawn(async move {
        let Some(handshake) = server.rx.recv().await else {
            return;
        };
        tracing::info!("server received handshake: {handshake}");

        let me: serde_json::Value = serde_json::from_str(&handshake).unwrap_or_default();
        let frames = [
            json!({"type": "connected", "message": "You joined the chat!", "users": [me.clone()]}),
            json!({"type": "join", "username": "Bob", "color": "#00aa00", "message": "Bob joined the chat"}),
            json!({"type": "user_list", "users": [me, {"username": "Bob", "color": "#00aa00"}]}),
            json!({"type": "message", "username": "Bob", "color": "#00aa00", "message": "hello!"}),
            json!({"type": "typing", "username": "Bob"}),
        ];
        for frame in frames {
            if server.tx.send(frame.to_string()).is_err() {
                return;
            }
        }

        if let Some(reply) = server.rx.recv().await {
            tracing::info!("server received chat frame: {reply}");
        }
        // Dropping `server` closes the connection.
    });

    let connector = LoopbackConnector(Mutex::new(Some(transport)));
    let renderer = TerminalRenderer::new(std::io::stdout(), false);
    let mut controller = SessionController::new(connector, renderer, ChatConfig::default());

    controller.join_requested("Ann", "#ff0000")?;

    let mut replied = false;
    while controller.pump().await {
        if controller.phase() == SessionPhase::InChat
            && controller.presence().count() == 2
            && !replied
        {
            replied = controller.send_requested("hi Bob")?;
        }
    }

    tracing::info!(
        "Done: phase={:?}, presence={}",
        controller.phase(),
        controller.presence().count()
    );
    Ok(())
}
