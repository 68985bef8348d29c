//! WebSocket transport over `tokio-tungstenite`.
//!
//! [`WebSocketConnector`] dials the chat endpoint (`ws://` or `wss://`, as
//! derived by [`PageOrigin`](crate::endpoint::PageOrigin)) and hands back a
//! [`WebSocketTransport`]. Only text frames reach the session; everything
//! else is filtered out by [`Inbound::classify`].

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::{self, protocol::Message};
use tracing::{debug, info, trace, warn};

use crate::error::ChatError;
use crate::transport::{Connector, Transport};

/// The stream type produced by [`WebSocketConnector`].
pub type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// What one WebSocket frame means to the chat session.
#[derive(Debug, PartialEq, Eq)]
enum Inbound {
    /// A protocol frame to hand to the decoder.
    Text(String),
    /// The peer sent a close frame.
    End,
    /// Control, binary or raw frame; read the next one.
    Skip,
}

impl Inbound {
    fn classify(msg: Message) -> Self {
        match msg {
            Message::Text(text) => Self::Text(text.as_str().to_owned()),
            Message::Close(frame) => {
                debug!(?frame, "peer sent close frame");
                Self::End
            }
            // tungstenite queues the pong reply itself.
            Message::Ping(_) | Message::Pong(_) => {
                trace!("control frame");
                Self::Skip
            }
            Message::Binary(data) => {
                warn!(len = data.len(), "chat protocol is text-only, skipping binary frame");
                Self::Skip
            }
            Message::Frame(_) => Self::Skip,
        }
    }
}

/// Map a handshake failure to [`ChatError::Io`], keeping the I/O error kind
/// when there is one (e.g. `ConnectionRefused`).
fn connect_error(err: tungstenite::Error) -> ChatError {
    let kind = match &err {
        tungstenite::Error::Io(io) => io.kind(),
        _ => std::io::ErrorKind::Other,
    };
    ChatError::Io(std::io::Error::new(kind, err))
}

/// One open WebSocket connection to the chat server.
///
/// [`recv`](Transport::recv) is cancel-safe: `StreamExt::next` holds no
/// partial frame across an await point.
#[derive(Debug)]
pub struct WebSocketTransport {
    stream: WsStream,
    closed: bool,
}

impl WebSocketTransport {
    /// Dial `url` directly, without going through a [`Connector`].
    ///
    /// # Errors
    ///
    /// [`ChatError::Io`] for a bad URL, a refused connection or a failed
    /// upgrade.
    pub async fn connect(url: &str) -> Result<Self, ChatError> {
        let (stream, response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(connect_error)?;
        info!(url = %url, status = %response.status(), "websocket upgraded");
        Ok(Self::from_stream(stream))
    }

    /// Use a stream the caller upgraded itself (custom TLS, proxies).
    pub fn from_stream(stream: WsStream) -> Self {
        Self {
            stream,
            closed: false,
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, message: String) -> Result<(), ChatError> {
        if self.closed {
            return Err(ChatError::TransportClosed);
        }
        self.stream
            .send(Message::text(message))
            .await
            .map_err(|e| ChatError::TransportSend(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, ChatError>> {
        while let Some(next) = self.stream.next().await {
            let msg = match next {
                Ok(msg) => msg,
                Err(e) => return Some(Err(ChatError::TransportReceive(e.to_string()))),
            };
            match Inbound::classify(msg) {
                Inbound::Text(text) => return Some(Ok(text)),
                Inbound::End => return None,
                Inbound::Skip => {}
            }
        }
        None
    }

    async fn close(&mut self) -> Result<(), ChatError> {
        if std::mem::replace(&mut self.closed, true) {
            return Ok(());
        }
        self.stream
            .close(None)
            .await
            .map_err(|e| ChatError::TransportSend(e.to_string()))
    }
}

/// Dials the chat endpoint for each new session.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    type Transport = WebSocketTransport;

    async fn connect(&self, url: &str) -> Result<WebSocketTransport, ChatError> {
        debug!(url = %url, "dialing chat endpoint");
        WebSocketTransport::connect(url).await
    }
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
    use tokio::net::TcpListener;

    #[test]
    fn classify_text_binary_and_close() {
        assert_eq!(
            Inbound::classify(Message::text(r#"{"type":"user_list","users":[]}"#)),
            Inbound::Text(r#"{"type":"user_list","users":[]}"#.into())
        );
        assert_eq!(
            Inbound::classify(Message::Binary(vec![1, 2].into())),
            Inbound::Skip
        );
        assert_eq!(
            Inbound::classify(Message::Ping(Vec::<u8>::new().into())),
            Inbound::Skip
        );
        assert_eq!(Inbound::classify(Message::Close(None)), Inbound::End);
    }

    #[test]
    fn refused_connection_keeps_io_kind() {
        let io = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        match connect_error(tungstenite::Error::Io(io)) {
            ChatError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::ConnectionRefused),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn connector_rejects_non_websocket_url() {
        let err = WebSocketConnector.connect("localhost:8000").await.unwrap_err();
        assert!(matches!(err, ChatError::Io(_)));
    }

    /// Accept one connection on a loopback port and run `server` on it.
    async fn serve_once<F, Fut>(server: F) -> String
    where
        F: FnOnce(tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> Fut
            + Send
            + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            server(tokio_tungstenite::accept_async(tcp).await.unwrap()).await;
        });
        format!("ws://{addr}/ws")
    }

    #[tokio::test]
    async fn handshake_then_connected_then_server_close() {
        let url = serve_once(|mut ws| async move {
            let Some(Ok(Message::Text(handshake))) = ws.next().await else {
                panic!("expected handshake");
            };
            assert!(handshake.as_str().contains(r#""username":"Ann""#));
            ws.send(Message::Binary(vec![0xff].into())).await.unwrap();
            ws.send(Message::text(r#"{"type":"connected"}"#))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketConnector.connect(&url).await.unwrap();
        transport
            .send(r##"{"username":"Ann","color":"#ff0000"}"##.to_string())
            .await
            .unwrap();
        assert_eq!(
            transport.recv().await.unwrap().unwrap(),
            r#"{"type":"connected"}"#
        );
        assert!(transport.recv().await.is_none());
    }

    #[tokio::test]
    async fn close_is_idempotent_and_blocks_sends() {
        let url = serve_once(|mut ws| async move { while let Some(Ok(_)) = ws.next().await {} })
            .await;

        let mut transport = WebSocketConnector.connect(&url).await.unwrap();
        transport.close().await.unwrap();
        transport.close().await.unwrap();
        assert!(matches!(
            transport.send("late".to_string()).await,
            Err(ChatError::TransportClosed)
        ));
    }
}
