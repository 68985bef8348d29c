#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for the group chat client integration tests.
//!
//! Provides a channel-driven [`MockTransport`], a [`MockConnector`] that hands
//! those transports out, a [`RecordingRenderer`], helpers for building server
//! frames, and a small WebSocket chat server for end-to-end tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use groupchat_client::protocol::{Presence, ServerMessage};
use groupchat_client::render::{RenderBoundary, TranscriptEntry};
use groupchat_client::{ChatError, Connector, Transport};
use tokio::sync::mpsc;

pub type Scripted = Option<Result<String, ChatError>>;

// ── MockTransport ───────────────────────────────────────────────────

/// A transport driven by the test: frames pushed through [`ServerHandle`]
/// are returned by `recv()`, frames sent by the client land in
/// [`ServerHandle::sent`].
pub struct MockTransport {
    incoming: mpsc::UnboundedReceiver<Scripted>,
    sent: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

/// The test's side of a [`MockTransport`].
pub struct ServerHandle {
    tx: mpsc::UnboundedSender<Scripted>,
    pub sent: mpsc::UnboundedReceiver<String>,
    pub closed: Arc<AtomicBool>,
}

impl ServerHandle {
    /// Deliver one text frame to the client.
    pub fn push(&self, frame: impl Into<String>) {
        self.tx.send(Some(Ok(frame.into()))).unwrap();
    }

    /// Deliver a receive error.
    pub fn fail(&self, reason: &str) {
        self.tx
            .send(Some(Err(ChatError::TransportReceive(reason.into()))))
            .unwrap();
    }

    /// Close the connection from the server side.
    pub fn hang_up(&self) {
        self.tx.send(None).unwrap();
    }

    /// Next frame the client sent, failing the test after one second.
    pub async fn next_sent(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(1), self.sent.recv())
            .await
            .expect("timed out waiting for a client frame")
            .expect("client transport dropped")
    }

    /// Next frame the client sent, parsed as JSON.
    pub async fn next_sent_json(&mut self) -> serde_json::Value {
        serde_json::from_str(&self.next_sent().await).expect("client frame is JSON")
    }

    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }
}

pub fn mock_pair() -> (MockTransport, ServerHandle) {
    let (tx, incoming) = mpsc::unbounded_channel();
    let (sent_tx, sent) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));
    (
        MockTransport {
            incoming,
            sent: sent_tx,
            closed: Arc::clone(&closed),
        },
        ServerHandle { tx, sent, closed },
    )
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, message: String) -> Result<(), ChatError> {
        self.sent
            .send(message)
            .map_err(|e| ChatError::TransportSend(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, ChatError>> {
        match self.incoming.recv().await {
            Some(item) => item,
            // The test dropped its handle; stay open until closed locally.
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<(), ChatError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

// ── MockConnector ───────────────────────────────────────────────────

/// Hands out prepared transports in order; refuses once they run out.
#[derive(Clone, Default)]
pub struct MockConnector {
    transports: Arc<StdMutex<VecDeque<MockTransport>>>,
    /// Every URL passed to `connect`.
    pub urls: Arc<StdMutex<Vec<String>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a transport for the next connect and return its server side.
    pub fn prepare(&self) -> ServerHandle {
        let (transport, handle) = mock_pair();
        self.transports.lock().unwrap().push_back(transport);
        handle
    }

    pub fn connect_count(&self) -> usize {
        self.urls.lock().unwrap().len()
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Transport = MockTransport;

    async fn connect(&self, url: &str) -> Result<MockTransport, ChatError> {
        self.urls.lock().unwrap().push(url.to_owned());
        self.transports.lock().unwrap().pop_front().ok_or_else(|| {
            ChatError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))
        })
    }
}

/// A connector whose dial never completes; counts attempts.
#[derive(Clone, Default)]
pub struct StalledConnector {
    pub attempts: Arc<AtomicUsize>,
}

#[async_trait]
impl Connector for StalledConnector {
    type Transport = MockTransport;

    async fn connect(&self, _url: &str) -> Result<MockTransport, ChatError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        std::future::pending().await
    }
}

// ── RecordingRenderer ───────────────────────────────────────────────

/// Which screen is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Setup,
    Chat,
}

/// A [`RenderBoundary`] that keeps what a real surface would display.
#[derive(Debug)]
pub struct RecordingRenderer {
    pub screen: Screen,
    pub transcript: Vec<TranscriptEntry>,
    pub presence: Vec<Presence>,
    pub warnings: Vec<String>,
    pub focus_count: usize,
    pub input_clears: usize,
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self {
            screen: Screen::Setup,
            transcript: Vec::new(),
            presence: Vec::new(),
            warnings: Vec::new(),
            focus_count: 0,
            input_clears: 0,
        }
    }
}

impl RecordingRenderer {
    /// The user count label as displayed.
    pub fn user_count(&self) -> String {
        self.presence.len().to_string()
    }
}

impl RenderBoundary for RecordingRenderer {
    fn show_setup_screen(&mut self) {
        self.screen = Screen::Setup;
    }

    fn show_chat_screen(&mut self) {
        self.screen = Screen::Chat;
    }

    fn focus_message_input(&mut self) {
        self.focus_count += 1;
    }

    fn clear_message_input(&mut self) {
        self.input_clears += 1;
    }

    fn append_message(&mut self, entry: &TranscriptEntry) {
        self.transcript.push(entry.clone());
    }

    fn render_presence(&mut self, presence: &[Presence]) {
        self.presence = presence.to_vec();
    }

    fn clear_transcript(&mut self) {
        self.transcript.clear();
    }

    fn warn(&mut self, text: &str) {
        self.warnings.push(text.to_owned());
    }
}

// ── JSON helper functions ───────────────────────────────────────────

pub fn ann() -> Presence {
    Presence::new("Ann", "#ff0000")
}

pub fn bob() -> Presence {
    Presence::new("Bob", "#00ff00")
}

/// `connected` with an optional user list.
pub fn connected_json(users: Option<Vec<Presence>>) -> String {
    serde_json::to_string(&ServerMessage::Connected {
        users,
        message: Some("You joined the chat!".into()),
    })
    .expect("connected_json serialization")
}

pub fn user_list_json(users: Vec<Presence>) -> String {
    serde_json::to_string(&ServerMessage::UserList { users }).expect("user_list_json serialization")
}

pub fn message_json(username: &str, color: &str, message: &str) -> String {
    serde_json::to_string(&ServerMessage::Message {
        username: username.into(),
        color: color.into(),
        message: message.into(),
    })
    .expect("message_json serialization")
}

pub fn join_json(username: &str) -> String {
    serde_json::to_string(&ServerMessage::Join {
        message: format!("{username} joined the chat"),
        username: Some(username.into()),
        color: Some("#00ff00".into()),
    })
    .expect("join_json serialization")
}

pub fn leave_json(username: &str) -> String {
    serde_json::to_string(&ServerMessage::Leave {
        message: format!("{username} left the chat"),
        username: Some(username.into()),
    })
    .expect("leave_json serialization")
}

// ── Mock chat server ────────────────────────────────────────────────

#[cfg(feature = "transport-websocket")]
pub mod chat_server {
    //! A minimal WebSocket chat server speaking the same protocol as the
    //! real one: handshake, `connected` with the user list, `join`/`leave`
    //! broadcasts, `user_list` after every membership change, and chat
    //! relay to everyone including the sender.

    use std::collections::HashMap;
    use std::sync::Arc;

    use futures_util::{SinkExt, StreamExt};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;
    use tokio::sync::{mpsc, Mutex};
    use tokio_tungstenite::tungstenite::Message;

    struct Member {
        username: String,
        color: String,
        tx: mpsc::UnboundedSender<Message>,
    }

    #[derive(Default)]
    struct Room {
        next_id: u64,
        members: HashMap<u64, Member>,
        order: Vec<u64>,
    }

    impl Room {
        fn users(&self) -> Value {
            Value::Array(
                self.order
                    .iter()
                    .filter_map(|id| self.members.get(id))
                    .map(|m| json!({"username": m.username, "color": m.color}))
                    .collect(),
            )
        }

        fn broadcast(&self, frame: &Value, exclude: Option<u64>) {
            for (id, member) in &self.members {
                if Some(*id) != exclude {
                    let _ = member.tx.send(Message::Text(frame.to_string().into()));
                }
            }
        }
    }

    /// Handle used by tests to stop the server side of every connection.
    #[derive(Clone)]
    pub struct ChatServer {
        pub addr: std::net::SocketAddr,
        room: Arc<Mutex<Room>>,
    }

    impl ChatServer {
        /// Page origin serving this server (always plain `http`).
        pub fn origin(&self) -> String {
            format!("http://{}", self.addr)
        }

        /// Close every connection from the server side.
        pub async fn kick_everyone(&self) {
            let room = self.room.lock().await;
            for member in room.members.values() {
                let _ = member.tx.send(Message::Close(None));
            }
        }
    }

    pub async fn start() -> ChatServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let room = Arc::new(Mutex::new(Room::default()));

        let accept_room = Arc::clone(&room);
        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                let room = Arc::clone(&accept_room);
                tokio::spawn(async move {
                    if let Ok(ws) = tokio_tungstenite::accept_async(tcp).await {
                        serve(ws, room).await;
                    }
                });
            }
        });

        ChatServer { addr, room }
    }

    async fn serve(
        ws: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
        room: Arc<Mutex<Room>>,
    ) {
        let (mut sink, mut stream) = ws.split();

        let Some(Ok(Message::Text(handshake))) = stream.next().await else {
            return;
        };
        let info: Value = serde_json::from_str(handshake.as_str()).unwrap_or_default();
        let username = info["username"].as_str().unwrap_or("Anonymous").to_owned();
        let color = info["color"].as_str().unwrap_or("#000000").to_owned();

        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        let id = {
            let mut room = room.lock().await;
            let id = room.next_id;
            room.next_id += 1;
            room.broadcast(
                &json!({"type": "join", "username": username, "color": color,
                        "message": format!("{username} joined the chat")}),
                None,
            );
            room.members.insert(
                id,
                Member {
                    username: username.clone(),
                    color: color.clone(),
                    tx: tx.clone(),
                },
            );
            room.order.push(id);
            let _ = tx.send(Message::Text(
                json!({"type": "connected", "message": "You joined the chat!",
                       "users": room.users()})
                .to_string()
                .into(),
            ));
            room.broadcast(&json!({"type": "user_list", "users": room.users()}), None);
            id
        };

        let writer = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let is_close = matches!(msg, Message::Close(_));
                if sink.send(msg).await.is_err() || is_close {
                    break;
                }
            }
        });

        while let Some(Ok(msg)) = stream.next().await {
            let Message::Text(text) = msg else {
                if matches!(msg, Message::Close(_)) {
                    break;
                }
                continue;
            };
            let Ok(frame) = serde_json::from_str::<Value>(text.as_str()) else {
                continue;
            };
            if frame["type"] == "message" {
                let room = room.lock().await;
                room.broadcast(
                    &json!({"type": "message", "username": username, "color": color,
                            "message": frame["message"].as_str().unwrap_or_default()}),
                    None,
                );
            }
        }

        let mut room = room.lock().await;
        room.members.remove(&id);
        room.order.retain(|other| *other != id);
        room.broadcast(
            &json!({"type": "leave", "username": username,
                    "message": format!("{username} left the chat")}),
            None,
        );
        room.broadcast(&json!({"type": "user_list", "users": room.users()}), None);
        drop(room);
        writer.abort();
    }
}
