//! Session lifecycle and generation assembly for the Game of Life feed.
//!
//! A [`Session`] owns one subscription to a simulation server. Inbound
//! updates are buffered per generation: the server streams each generation
//! as one or more cell batches tagged with the same `generation_index`, and
//! the buffered batch is handed to the host only when a batch with a
//! strictly greater index arrives. Failures never cross the host API as
//! panics or results; they land in the error log and the `on_error`
//! callback.

use std::fmt;
use std::sync::Arc;

use gol_protocol::{Cell, ClientMessage, ServerMessage};
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::transport::{Transport, TransportEvent, TransportParts, WebSocketTransport};

/// Host callback receiving each completed generation.
pub type GenerationCallback = Arc<dyn Fn(Vec<Cell>) + Send + Sync>;

/// Host callback receiving each absorbed error.
pub type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Client handle for one simulation subscription.
///
/// Built through [`Session::builder`]. All methods are infallible at the
/// signature level: connection and subscription failures are delivered
/// through the `on_error` callback and retained in [`Session::errors`].
pub struct Session {
    url: String,
    on_generation_complete: GenerationCallback,
    error_sink: ErrorSink,
    state: Mutex<ConnectionState>,
}

/// Configures callbacks for a [`Session`].
pub struct SessionBuilder {
    url: String,
    on_generation_complete: GenerationCallback,
    on_error: ErrorCallback,
}

impl SessionBuilder {
    /// Called with the full cell batch of a generation once the next
    /// generation begins to arrive.
    pub fn on_generation_complete(
        mut self,
        callback: impl Fn(Vec<Cell>) + Send + Sync + 'static,
    ) -> Self {
        self.on_generation_complete = Arc::new(callback);
        self
    }

    /// Called with a description of every error the session absorbs.
    pub fn on_error(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_error = Arc::new(callback);
        self
    }

    pub fn build(self) -> Session {
        Session {
            url: self.url,
            on_generation_complete: self.on_generation_complete,
            error_sink: ErrorSink {
                errors: Arc::new(Mutex::new(Vec::new())),
                on_error: self.on_error,
            },
            state: Mutex::new(ConnectionState::Disconnected),
        }
    }
}

impl Session {
    /// Starts configuring a session for the server at `url`.
    pub fn builder(url: impl Into<String>) -> SessionBuilder {
        SessionBuilder {
            url: url.into(),
            on_generation_complete: Arc::new(|_cells: Vec<Cell>| {}),
            on_error: Arc::new(|_message: &str| {}),
        }
    }

    /// Dials the server and subscribes to simulation updates.
    ///
    /// On failure the session stays disconnected and the error is reported
    /// through the error callback. Calling this while a connection is live
    /// (or being established) is reported the same way and leaves the
    /// existing connection untouched.
    pub async fn connect(&self) {
        {
            let mut state = self.state.lock();
            if !matches!(*state, ConnectionState::Disconnected) {
                drop(state);
                self.error_sink
                    .report("connect ignored: session already connected or connecting");
                return;
            }
            *state = ConnectionState::Connecting;
        }

        match WebSocketTransport::connect(&self.url).await {
            Ok((transport, event_rx)) => {
                self.attach(transport.into_transport_parts(event_rx)).await;
            }
            Err(err) => {
                *self.state.lock() = ConnectionState::Disconnected;
                self.error_sink.report(&err.to_string());
            }
        }
    }

    /// Wires an established transport into the session: subscribes, spawns
    /// the read pump and the event loop, and stores the live handle.
    async fn attach(&self, parts: TransportParts) {
        let TransportParts {
            sender,
            receiver,
            event_rx,
        } = parts;
        let sender = Arc::new(AsyncMutex::new(sender));

        // A failed subscribe leaves the connection up; the server just never
        // sends updates, which the host learns about through on_error.
        if let Err(err) = send_control(&sender, ClientMessage::Subscribe).await {
            self.error_sink
                .report(&format!("failed to send subscribe message: {err}"));
        }

        let receiver_task = tokio::spawn(receiver.run());
        let dispatcher = Dispatcher {
            buffer: GenerationBuffer::default(),
            on_generation_complete: Arc::clone(&self.on_generation_complete),
            error_sink: self.error_sink.clone(),
        };
        let event_task = tokio::spawn(dispatcher.run(event_rx));

        *self.state.lock() = ConnectionState::Connected(Connected {
            sender,
            receiver_task,
            event_task,
        });
        debug!(target = "gol.session", url = %self.url, "session connected");
    }

    /// Asks the server to start the simulation.
    ///
    /// Does nothing when the session is not connected. A send failure is
    /// logged but not surfaced; the subscription stays up either way.
    pub async fn start_sim(&self) {
        let sender = {
            let state = self.state.lock();
            match &*state {
                ConnectionState::Connected(connected) => Arc::clone(&connected.sender),
                _ => {
                    debug!(target = "gol.session", "start_sim ignored: not connected");
                    return;
                }
            }
        };
        if let Err(err) = send_control(&sender, ClientMessage::StartSim).await {
            warn!(target = "gol.session", error = %err, "failed to send start frame");
        }
    }

    /// Tears down the connection: closes the transport, stops the read pump
    /// and event loop, and clears the live handle. A session that is not
    /// connected is left as is.
    pub async fn destroy(&self) {
        let connected = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, ConnectionState::Disconnected) {
                ConnectionState::Connected(connected) => connected,
                other => {
                    *state = other;
                    return;
                }
            }
        };
        let Connected {
            sender,
            receiver_task,
            event_task,
        } = connected;

        if let Err(err) = sender.lock().await.close().await {
            debug!(target = "gol.session", error = %err, "close failed during destroy");
        }
        receiver_task.abort();
        event_task.abort();
        let _ = receiver_task.await;
        let _ = event_task.await;
        debug!(target = "gol.session", url = %self.url, "session destroyed");
    }

    /// Whether a connection is currently live.
    pub fn is_connected(&self) -> bool {
        matches!(*self.state.lock(), ConnectionState::Connected(_))
    }

    /// Every error absorbed so far, oldest first.
    pub fn errors(&self) -> Vec<String> {
        self.error_sink.errors.lock().clone()
    }

    /// The server address this session dials.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("url", &self.url)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

enum ConnectionState {
    Disconnected,
    Connecting,
    Connected(Connected),
}

/// Live-connection resources owned by the session.
struct Connected {
    sender: Arc<AsyncMutex<Box<dyn Transport>>>,
    receiver_task: JoinHandle<()>,
    event_task: JoinHandle<()>,
}

/// Append-only error log plus the host's error callback.
///
/// Shared between the session handle and the event loop so both report
/// through the same path.
#[derive(Clone)]
struct ErrorSink {
    errors: Arc<Mutex<Vec<String>>>,
    on_error: ErrorCallback,
}

impl ErrorSink {
    fn report(&self, message: &str) {
        warn!(target = "gol.session", %message, "session error");
        self.errors.lock().push(message.to_owned());
        (self.on_error)(message);
    }
}

async fn send_control(
    sender: &Arc<AsyncMutex<Box<dyn Transport>>>,
    message: ClientMessage,
) -> Result<()> {
    let frame = message.to_frame()?;
    sender.lock().await.send(frame).await
}

/// Event loop state: consumes transport events, assembles generations.
struct Dispatcher {
    buffer: GenerationBuffer,
    on_generation_complete: GenerationCallback,
    error_sink: ErrorSink,
}

impl Dispatcher {
    async fn run(mut self, mut event_rx: mpsc::UnboundedReceiver<TransportEvent>) {
        while let Some(event) = event_rx.recv().await {
            self.dispatch(event);
        }
        trace!(target = "gol.session", "event loop finished");
    }

    fn dispatch(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Text(frame) => self.dispatch_frame(&frame),
            TransportEvent::Binary(_) => {
                trace!(target = "gol.session", "ignoring binary frame");
            }
            TransportEvent::Error(message) => {
                self.error_sink
                    .report(&format!("subscription error: {message}"));
            }
            TransportEvent::Closed => {
                debug!(target = "gol.session", "server closed the connection");
            }
        }
    }

    fn dispatch_frame(&mut self, frame: &str) {
        let message = match ServerMessage::parse_frame(frame) {
            Ok(message) => message,
            Err(err) => {
                trace!(target = "gol.session", error = %err, "discarding malformed frame");
                return;
            }
        };
        if let Some(generation) = self.buffer.absorb(message) {
            (self.on_generation_complete)(generation);
        }
    }
}

/// Accumulates cell batches until the next generation begins.
#[derive(Default)]
struct GenerationBuffer {
    cells: Vec<Cell>,
    generation_index: u64,
}

impl GenerationBuffer {
    /// Folds one server message into the buffer. Returns the completed
    /// generation when `message` opens a new one, i.e. when its index is
    /// strictly greater than the buffered index and cells are buffered.
    /// The index never moves backwards, so stale batches can only append.
    fn absorb(&mut self, message: ServerMessage) -> Option<Vec<Cell>> {
        let completed = if message.generation_index > self.generation_index
            && !self.cells.is_empty()
        {
            Some(std::mem::take(&mut self.cells))
        } else {
            None
        };
        self.cells.extend(message.cells);
        self.generation_index = self.generation_index.max(message.generation_index);
        completed
    }
}
