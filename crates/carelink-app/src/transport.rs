//! WebSocket transport.
//!
//! A thin layer that moves text frames across one socket. Everything above
//! it (reconnection, queueing, routing) is the session's job; the transport
//! only reports what happened to the link.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use crate::error::TransportError;

/// Events surfaced by a socket transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text frame arrived.
    Text(String),
    /// The peer closed the socket cleanly.
    Closed,
    /// The socket failed.
    Error(String),
}

/// Socket I/O abstraction so the runtime can run against a scripted link in
/// tests.
#[async_trait]
pub trait SocketTransport: Send {
    /// Open a socket to `url`, replacing any previous one.
    async fn open(&mut self, url: &str) -> Result<(), TransportError>;

    /// Transmit a text frame.
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Wait for the next socket event. Returns `None` when no socket is
    /// open.
    async fn recv(&mut self) -> Option<TransportEvent>;

    /// Close and drop the socket, if any.
    async fn close(&mut self);

    /// Whether a socket is currently open.
    fn is_open(&self) -> bool;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production transport over tokio-tungstenite.
#[derive(Debug, Default)]
pub struct WsTransport {
    stream: Option<WsStream>,
}

impl WsTransport {
    /// Create a transport with no socket.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SocketTransport for WsTransport {
    async fn open(&mut self, url: &str) -> Result<(), TransportError> {
        let (stream, _response) =
            connect_async(url).await.map_err(|error| TransportError::Connect(error.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(TransportError::NotOpen);
        };
        match stream.send(Message::Text(text)).await {
            Ok(()) => Ok(()),
            Err(error) => {
                self.stream = None;
                Err(TransportError::Send(error.to_string()))
            },
        }
    }

    async fn recv(&mut self) -> Option<TransportEvent> {
        loop {
            let stream = self.stream.as_mut()?;
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(TransportEvent::Text(text)),
                Some(Ok(Message::Close(_))) | None => {
                    self.stream = None;
                    return Some(TransportEvent::Closed);
                },
                // Control frames are answered by tungstenite itself.
                Some(Ok(_)) => {},
                Some(Err(error)) => {
                    self.stream = None;
                    return Some(TransportEvent::Error(error.to_string()));
                },
            }
        }
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.close(None).await;
        }
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}
