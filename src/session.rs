//! One connection to the chat server.
//!
//! [`TransportSession`] is a thin handle around a background task that opens
//! the connection through a [`Connector`] and then multiplexes outgoing frames
//! and incoming frames with `tokio::select!`. The handle talks to the task
//! over an unbounded command channel; the task reports
//! [`TransportEvent`]s over a bounded channel that is drained with
//! [`TransportSession::next_event`].
//!
//! Every session reports exactly one [`TransportEvent::Closed`], whatever the
//! cause, and it is always the last event.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::{ChatError, Result};
use crate::event::TransportEvent;
use crate::transport::{Connector, Transport};

/// Commands from the handle to the session task.
#[derive(Debug)]
enum SessionCommand {
    Send(String),
    Close,
}

// ── Shared state ────────────────────────────────────────────────────

/// Readiness flags shared between the handle and the session task.
struct SessionState {
    /// Set after `Opened` and cleared when the task stops reading.
    open: AtomicBool,
    /// Set once a close has been requested locally.
    closing: AtomicBool,
}

impl SessionState {
    fn new() -> Self {
        Self {
            open: AtomicBool::new(false),
            closing: AtomicBool::new(false),
        }
    }
}

// ── Session handle ──────────────────────────────────────────────────

/// Handle to one transport connection.
///
/// Dropping the handle aborts the background task.
pub struct TransportSession {
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
    event_rx: mpsc::Receiver<TransportEvent>,
    state: Arc<SessionState>,
    task: Option<tokio::task::JoinHandle<()>>,
    shutdown_timeout: Duration,
    /// Set once `Closed` has been handed out.
    finished: bool,
}

impl TransportSession {
    /// Start connecting to `url` in the background.
    ///
    /// Never fails directly: a failed connect is reported as
    /// [`TransportEvent::Error`] followed by [`TransportEvent::Closed`].
    pub fn open<C: Connector>(
        connector: Arc<C>,
        url: impl Into<String>,
        event_channel_capacity: usize,
        shutdown_timeout: Duration,
    ) -> Self {
        let url = url.into();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<SessionCommand>();
        // Clamp capacity to at least 1 (tokio panics on 0).
        let (event_tx, event_rx) = mpsc::channel::<TransportEvent>(event_channel_capacity.max(1));

        let state = Arc::new(SessionState::new());
        let task = tokio::spawn(session_loop(
            connector,
            url,
            cmd_rx,
            event_tx,
            Arc::clone(&state),
        ));

        Self {
            cmd_tx,
            event_rx,
            state,
            task: Some(task),
            shutdown_timeout,
            finished: false,
        }
    }

    /// Returns `true` between `Opened` and the start of the close.
    pub fn is_open(&self) -> bool {
        self.state.open.load(Ordering::Acquire) && !self.state.closing.load(Ordering::Acquire)
    }

    /// Queue one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidState`] before `Opened` or once the session
    /// is closing, and [`ChatError::NotConnected`] if the task has exited.
    pub fn send(&self, payload: String) -> Result<()> {
        if !self.is_open() {
            return Err(ChatError::InvalidState);
        }
        self.cmd_tx
            .send(SessionCommand::Send(payload))
            .map_err(|_| ChatError::NotConnected)
    }

    /// Request a graceful close. Idempotent; completion is reported as
    /// [`TransportEvent::Closed`].
    pub fn close(&self) {
        if self.state.closing.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!("session close requested");
        // The task may already be gone; its Closed event is then queued.
        let _ = self.cmd_tx.send(SessionCommand::Close);
    }

    /// Wait for the next lifecycle event.
    ///
    /// Returns `None` only after `Closed` has been delivered. If the task
    /// disappears without reporting (it was aborted), a `Closed` is
    /// synthesized so callers always see one.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        if self.finished {
            return None;
        }
        let event = self
            .event_rx
            .recv()
            .await
            .unwrap_or(TransportEvent::Closed);
        if event == TransportEvent::Closed {
            self.finished = true;
            self.state.open.store(false, Ordering::Release);
        }
        Some(event)
    }

    /// Close gracefully and wait for the task, aborting it after the
    /// configured shutdown timeout.
    pub async fn shutdown(&mut self) {
        self.close();

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("session task terminated with join error: {join_err}");
                }
                Err(_elapsed) => {
                    warn!("session task did not exit in time, aborting");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("session task aborted: {join_err}");
                    }
                }
            }
        }

        self.state.open.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for TransportSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSession")
            .field("open", &self.is_open())
            .field("finished", &self.finished)
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl Drop for TransportSession {
    fn drop(&mut self) {
        // No executor context for an async close here; abort instead.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Session loop ────────────────────────────────────────────────────

/// Background task: connect, then multiplex send/receive until closed.
///
/// Exits when:
/// - a `Close` command arrives or the handle is dropped, including while the
///   connect is still pending (then no `Opened` is reported)
/// - the transport returns `None` (server closed the connection)
/// - a transport error occurs
async fn session_loop<C: Connector>(
    connector: Arc<C>,
    url: String,
    mut cmd_rx: mpsc::UnboundedReceiver<SessionCommand>,
    event_tx: mpsc::Sender<TransportEvent>,
    state: Arc<SessionState>,
) {
    let connected = tokio::select! {
        result = connector.connect(&url) => result,
        // Sends are refused before `Opened`, so this is a close or a dropped
        // handle. The pending dial is dropped with the select.
        cmd = cmd_rx.recv() => {
            debug!(url = %url, ?cmd, "close requested while connecting");
            emit_closed(&event_tx, &state).await;
            return;
        }
    };

    let mut transport = match connected {
        Ok(transport) => transport,
        Err(e) => {
            warn!(url = %url, "connect failed: {e}");
            emit(&event_tx, TransportEvent::Error(e.to_string())).await;
            emit_closed(&event_tx, &state).await;
            return;
        }
    };

    info!(url = %url, "session opened");
    state.open.store(true, Ordering::Release);
    emit(&event_tx, TransportEvent::Opened).await;

    loop {
        tokio::select! {
            // Outgoing frames are flushed before the next inbound frame is read.
            biased;

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SessionCommand::Send(frame)) => {
                        debug!(len = frame.len(), "sending frame");
                        if let Err(e) = transport.send(frame).await {
                            error!("transport send error: {e}");
                            emit(&event_tx, TransportEvent::Error(e.to_string())).await;
                            let _ = transport.close().await;
                            break;
                        }
                    }
                    Some(SessionCommand::Close) | None => {
                        debug!("closing transport");
                        if let Err(e) = transport.close().await {
                            debug!("close handshake failed: {e}");
                        }
                        break;
                    }
                }
            }

            incoming = transport.recv() => {
                match incoming {
                    Some(Ok(text)) => {
                        emit(&event_tx, TransportEvent::Message(text)).await;
                    }
                    Some(Err(e)) => {
                        error!("transport receive error: {e}");
                        emit(&event_tx, TransportEvent::Error(e.to_string())).await;
                        break;
                    }
                    None => {
                        info!("transport closed by server");
                        break;
                    }
                }
            }
        }
    }

    emit_closed(&event_tx, &state).await;
    debug!("session loop exited");
}

/// Deliver one event, waiting for room so nothing is dropped or reordered.
async fn emit(event_tx: &mpsc::Sender<TransportEvent>, event: TransportEvent) {
    if event_tx.send(event).await.is_err() {
        debug!("event channel closed, receiver dropped");
    }
}

async fn emit_closed(event_tx: &mpsc::Sender<TransportEvent>, state: &SessionState) {
    state.open.store(false, Ordering::Release);
    emit(event_tx, TransportEvent::Closed).await;
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
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    // ── Mock transport ──────────────────────────────────────────────

    /// Transport fed by the test through a channel; sent frames are recorded.
    struct ChannelTransport {
        incoming: mpsc::UnboundedReceiver<Option<std::result::Result<String, ChatError>>>,
        sent: mpsc::UnboundedSender<String>,
        closed: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Transport for ChannelTransport {
        async fn send(&mut self, message: String) -> std::result::Result<(), ChatError> {
            self.sent
                .send(message)
                .map_err(|e| ChatError::TransportSend(e.to_string()))
        }

        async fn recv(&mut self) -> Option<std::result::Result<String, ChatError>> {
            match self.incoming.recv().await {
                Some(item) => item,
                None => std::future::pending().await,
            }
        }

        async fn close(&mut self) -> std::result::Result<(), ChatError> {
            self.closed.store(true, Ordering::Relaxed);
            Ok(())
        }
    }

    struct OneShotConnector {
        transport: StdMutex<Option<ChannelTransport>>,
    }

    #[async_trait]
    impl Connector for OneShotConnector {
        type Transport = ChannelTransport;

        async fn connect(&self, _url: &str) -> std::result::Result<ChannelTransport, ChatError> {
            self.transport.lock().unwrap().take().ok_or_else(|| {
                ChatError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "refused",
                ))
            })
        }
    }

    struct Harness {
        session: TransportSession,
        server_tx: mpsc::UnboundedSender<Option<std::result::Result<String, ChatError>>>,
        sent_rx: mpsc::UnboundedReceiver<String>,
        closed: Arc<AtomicBool>,
    }

    fn open_session() -> Harness {
        let (server_tx, incoming) = mpsc::unbounded_channel();
        let (sent, sent_rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let connector = Arc::new(OneShotConnector {
            transport: StdMutex::new(Some(ChannelTransport {
                incoming,
                sent,
                closed: Arc::clone(&closed),
            })),
        });
        let session = TransportSession::open(connector, "ws://test/ws", 8, Duration::from_secs(1));
        Harness {
            session,
            server_tx,
            sent_rx,
            closed,
        }
    }

    #[tokio::test]
    async fn send_before_open_is_invalid_state() {
        let h = open_session();
        // The task has not run yet on the current-thread runtime.
        assert!(matches!(
            h.session.send("x".into()),
            Err(ChatError::InvalidState)
        ));
    }

    #[tokio::test]
    async fn lifecycle_opened_messages_closed() {
        let mut h = open_session();
        assert_eq!(h.session.next_event().await, Some(TransportEvent::Opened));
        assert!(h.session.is_open());

        h.server_tx.send(Some(Ok("one".into()))).unwrap();
        h.server_tx.send(Some(Ok("two".into()))).unwrap();
        h.server_tx.send(None).unwrap();

        assert_eq!(
            h.session.next_event().await,
            Some(TransportEvent::Message("one".into()))
        );
        assert_eq!(
            h.session.next_event().await,
            Some(TransportEvent::Message("two".into()))
        );
        assert_eq!(h.session.next_event().await, Some(TransportEvent::Closed));
        assert_eq!(h.session.next_event().await, None);
        assert!(!h.session.is_open());
    }

    #[tokio::test]
    async fn send_reaches_transport() {
        let mut h = open_session();
        assert_eq!(h.session.next_event().await, Some(TransportEvent::Opened));
        h.session.send("hello".into()).unwrap();
        assert_eq!(h.sent_rx.recv().await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn local_close_closes_transport_and_reports_closed() {
        let mut h = open_session();
        assert_eq!(h.session.next_event().await, Some(TransportEvent::Opened));
        h.session.close();
        h.session.close();
        assert!(!h.session.is_open());
        assert!(matches!(
            h.session.send("late".into()),
            Err(ChatError::InvalidState)
        ));
        assert_eq!(h.session.next_event().await, Some(TransportEvent::Closed));
        assert!(h.closed.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn receive_error_is_reported_then_closed() {
        let mut h = open_session();
        assert_eq!(h.session.next_event().await, Some(TransportEvent::Opened));
        h.server_tx
            .send(Some(Err(ChatError::TransportReceive("reset".into()))))
            .unwrap();
        assert!(matches!(
            h.session.next_event().await,
            Some(TransportEvent::Error(_))
        ));
        assert_eq!(h.session.next_event().await, Some(TransportEvent::Closed));
    }

    #[tokio::test]
    async fn failed_connect_reports_error_then_closed() {
        let connector = Arc::new(OneShotConnector {
            transport: StdMutex::new(None),
        });
        let mut session =
            TransportSession::open(connector, "ws://test/ws", 8, Duration::from_secs(1));
        assert!(matches!(
            session.next_event().await,
            Some(TransportEvent::Error(_))
        ));
        assert_eq!(session.next_event().await, Some(TransportEvent::Closed));
        assert_eq!(session.next_event().await, None);
    }

    /// A connector whose dial never completes.
    struct StalledConnector;

    #[async_trait]
    impl Connector for StalledConnector {
        type Transport = ChannelTransport;

        async fn connect(&self, _url: &str) -> std::result::Result<ChannelTransport, ChatError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn close_while_connecting_reports_closed_without_opened() {
        let mut session = TransportSession::open(
            Arc::new(StalledConnector),
            "ws://test/ws",
            8,
            Duration::from_secs(1),
        );
        session.close();

        let event = tokio::time::timeout(Duration::from_secs(1), session.next_event())
            .await
            .expect("close must not wait for the dial");
        assert_eq!(event, Some(TransportEvent::Closed));
        assert_eq!(session.next_event().await, None);
        assert!(!session.is_open());
    }

    #[tokio::test]
    async fn shutdown_while_connecting_finishes_in_time() {
        let mut session = TransportSession::open(
            Arc::new(StalledConnector),
            "ws://test/ws",
            8,
            Duration::from_secs(5),
        );
        tokio::time::timeout(Duration::from_secs(1), session.shutdown())
            .await
            .expect("shutdown must not wait for the dial");
        assert_eq!(session.next_event().await, Some(TransportEvent::Closed));
    }

    #[tokio::test]
    async fn shutdown_closes_transport() {
        let mut h = open_session();
        assert_eq!(h.session.next_event().await, Some(TransportEvent::Opened));
        h.session.shutdown().await;
        assert!(h.closed.load(Ordering::Relaxed));
        assert_eq!(h.session.next_event().await, Some(TransportEvent::Closed));
    }
}
