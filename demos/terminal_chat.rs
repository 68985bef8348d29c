//! # Terminal Chat Example
//!
//! A complete interactive client:
//!
//! 1. Enter a display name (optionally followed by a `#color`)
//! 2. The client connects over WebSocket and sends the handshake
//! 3. Chat lines, join/leave notices and the presence list are printed as
//!    they arrive; typed lines are sent as messages
//! 4. `/leave` returns to the name prompt, `/quit` or Ctrl+C exits
//!
//! ## Running
//!
//! ```sh
//! # Start the chat server on localhost:8000, then:
//! cargo run --example terminal_chat
//!
//! # Point at another page origin (wss is used for https origins):
//! CHAT_ORIGIN=https://chat.example.com cargo run --example terminal_chat
//! ```

use groupchat_client::{
    ChatConfig, PageOrigin, RenderBoundary, SessionController, SessionPhase, TerminalRenderer,
    WebSocketConnector,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Default page origin when `CHAT_ORIGIN` is not set.
const DEFAULT_ORIGIN: &str = "http://localhost:8000";

/// Split `"Ann #ff0000"` into name and color; the color is optional.
fn parse_identity(line: &str) -> (&str, &str) {
    match line.trim().rsplit_once(' ') {
        Some((name, color)) if color.starts_with('#') => (name, color),
        _ => (line, ""),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Set `RUST_LOG=debug` for protocol-level output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let origin = std::env::var("CHAT_ORIGIN").unwrap_or_else(|_| DEFAULT_ORIGIN.to_string());
    let config = ChatConfig::new(PageOrigin::parse(&origin)?);
    tracing::info!("Chat endpoint: {}", config.endpoint_url());

    let renderer = TerminalRenderer::new(std::io::stdout(), true);
    let mut controller = SessionController::new(WebSocketConnector, renderer, config);
    controller.render_mut().show_setup_screen();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // ── Event loop ──────────────────────────────────────────────────
    loop {
        let has_session = controller.has_session();
        tokio::select! {
            // Branch 1: transport event for the active session.
            event = controller.next_event(), if has_session => {
                if let Some(event) = event {
                    controller.handle_transport_event(event);
                }
            }

            // Branch 2: a line typed by the user.
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match line.trim() {
                    "/quit" => break,
                    "/leave" => controller.leave_requested(),
                    _ if controller.phase() == SessionPhase::InChat => {
                        if let Err(e) = controller.send_requested(&line) {
                            tracing::warn!("message not sent: {e}");
                        }
                    }
                    _ if !controller.has_session() => {
                        let (name, color) = parse_identity(&line);
                        match controller.join_requested(name, color) {
                            Ok(()) => {}
                            // Already shown through the renderer's warning.
                            Err(e) if e.is_validation() => tracing::debug!("join rejected: {e}"),
                            Err(e) => tracing::warn!("join failed: {e}"),
                        }
                    }
                    _ => tracing::debug!("still connecting, ignoring input"),
                }
            }

            // Branch 3: Ctrl+C.
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    // ── Cleanup ─────────────────────────────────────────────────────
    controller.shutdown().await;
    Ok(())
}
