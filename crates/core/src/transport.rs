//! Transport seam between the session and the websocket.
//!
//! The session never touches the socket directly: it writes text frames
//! through the [`Transport`] half and consumes [`TransportEvent`]s pumped
//! into an unbounded channel by the [`TransportReceiver`] half.
//! [`WebSocketTransport`] is the production implementation over
//! `tokio-tungstenite`; the [`fake`] module provides an in-memory
//! implementation for tests.
//!
//! Inbound events carry raw frames rather than parsed values: frame
//! validation (and the silent discard of frames that fail it) is session
//! policy, not a transport concern.

pub mod fake;

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Inbound event delivered from the read half to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text frame from the server.
    Text(String),
    /// A non-text frame; sessions ignore these.
    Binary(Vec<u8>),
    /// A transport-level error on the established connection.
    Error(String),
    /// The server closed the connection.
    Closed,
}

/// Write half of a transport connection.
pub trait Transport: Send {
    /// Sends a text frame to the server.
    fn send(&mut self, frame: String) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Closes the connection, completing the close handshake when the
    /// transport has one.
    fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Read half of a transport connection.
pub trait TransportReceiver: Send {
    /// Pumps inbound frames into the event channel until the connection
    /// ends. Errors on an established connection are forwarded as
    /// [`TransportEvent::Error`] rather than terminating the pump.
    fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = ()> + Send>>;
}

/// The pieces a session needs to drive one connection.
pub struct TransportParts {
    /// Write half used for control frames.
    pub sender: Box<dyn Transport>,
    /// Read pump; spawn [`TransportReceiver::run`] to start delivery.
    pub receiver: Box<dyn TransportReceiver>,
    /// Events produced by the receiver.
    pub event_rx: mpsc::UnboundedReceiver<TransportEvent>,
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production transport over `tokio-tungstenite`.
pub struct WebSocketTransport {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
}

impl WebSocketTransport {
    /// Connects to `url` (a `ws://` or `wss://` address) and returns the
    /// transport plus the receive half of its event channel.
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<TransportEvent>)> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| Error::Connect(e.to_string()))?;
        debug!(target = "gol.transport", %url, "websocket connected");

        let (sink, stream) = stream.split();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let transport = Self {
            sink,
            stream,
            event_tx,
        };
        Ok((transport, event_rx))
    }

    /// Splits the transport into the parts a session consumes.
    pub fn into_transport_parts(
        self,
        event_rx: mpsc::UnboundedReceiver<TransportEvent>,
    ) -> TransportParts {
        TransportParts {
            sender: Box::new(WebSocketSender { sink: self.sink }),
            receiver: Box::new(WebSocketReceiver {
                stream: self.stream,
                event_tx: self.event_tx,
            }),
            event_rx,
        }
    }
}

struct WebSocketSender {
    sink: SplitSink<WsStream, Message>,
}

impl Transport for WebSocketSender {
    fn send(&mut self, frame: String) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.sink
                .send(Message::Text(frame))
                .await
                .map_err(|e| Error::Send(e.to_string()))
        })
    }

    fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.sink
                .close()
                .await
                .map_err(|e| Error::Send(e.to_string()))
        })
    }
}

struct WebSocketReceiver {
    stream: SplitStream<WsStream>,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
}

impl TransportReceiver for WebSocketReceiver {
    fn run(mut self: Box<Self>) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            while let Some(item) = self.stream.next().await {
                let event = match item {
                    Ok(Message::Text(text)) => TransportEvent::Text(text),
                    Ok(Message::Binary(bytes)) => TransportEvent::Binary(bytes),
                    Ok(Message::Close(_)) => TransportEvent::Closed,
                    // Ping/pong are answered by tungstenite itself.
                    Ok(_) => continue,
                    Err(err) => TransportEvent::Error(err.to_string()),
                };
                if self.event_tx.send(event).is_err() {
                    // Session dropped its receiver; nothing left to deliver to.
                    break;
                }
            }
            trace!(target = "gol.transport", "read pump finished");
        })
    }
}
