//! Error types for the Game of Life client.

use thiserror::Error;

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised below the session boundary.
///
/// These never cross the host API as return values: every recoverable
/// failure is absorbed by the session, formatted into the `on_error`
/// callback and the append-only error log.
#[derive(Debug, Error)]
pub enum Error {
    /// Establishing the websocket connection failed.
    #[error("websocket connection failed: {0}")]
    Connect(String),

    /// Sending a frame over an established connection failed.
    #[error("failed to send frame: {0}")]
    Send(String),

    /// The transport was closed while the session still needed it.
    #[error("transport closed")]
    TransportClosed,

    /// A control message could not be encoded as JSON.
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` for connection-establishment failures.
    pub fn is_connect(&self) -> bool {
        matches!(self, Error::Connect(_))
    }

    /// Returns `true` for frame send failures.
    pub fn is_send(&self) -> bool {
        matches!(self, Error::Send(_))
    }
}
