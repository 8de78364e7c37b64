//! Rust client SDK for the Game of Life simulation server.
//!
//! The entry point is [`Session`]: configure callbacks for completed
//! generations and for errors, connect, and the server streams cell batches
//! over a websocket. Generations may arrive fragmented across several
//! frames; the session assembles them and hands each complete generation to
//! the host once the next one begins.
//!
//! ```no_run
//! use gol::Session;
//!
//! # async fn run() {
//! let session = Session::builder("ws://127.0.0.1:4000/ws")
//!     .on_generation_complete(|cells| println!("generation of {} cells", cells.len()))
//!     .on_error(|message| eprintln!("session error: {message}"))
//!     .build();
//!
//! session.connect().await;
//! session.start_sim().await;
//! # }
//! ```
//!
//! Nothing in the API returns an error to the host: failures are absorbed
//! into the `on_error` callback and the session's error log, and the
//! session never retries on its own.

pub mod error;
pub mod session;
pub mod transport;

pub use error::{Error, Result};
pub use session::{ErrorCallback, GenerationCallback, Session, SessionBuilder};
pub use transport::{
    Transport, TransportEvent, TransportParts, TransportReceiver, WebSocketTransport,
};

pub use gol_protocol as protocol;
pub use gol_protocol::{Cell, ClientMessage, ServerMessage};
