//! Control and update messages exchanged with the simulation server.

use serde::{Deserialize, Serialize};

use crate::cell::Cell;

/// Client-to-server control message, tagged on the wire with a `type` field.
///
/// Wire shapes: `{"type":"Subscribe"}` and `{"type":"StartSim"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Ask the server to stream generation updates over this connection.
    Subscribe,
    /// Ask the server to begin stepping the simulation.
    StartSim,
}

impl ClientMessage {
    /// Encodes the message as a JSON text frame.
    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Server-to-client generation update.
///
/// One generation may arrive fragmented across several messages carrying
/// the same `generation_index`: the server chunks large generations into
/// fixed-size cell batches. A `type` tag may be present on the wire and is
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMessage {
    /// Cell updates belonging to `generation_index`.
    pub cells: Vec<Cell>,
    /// Index of the generation these cells belong to.
    pub generation_index: u64,
}

impl ServerMessage {
    /// Parses and shape-validates a text frame.
    ///
    /// Fails when either field is missing or carries the wrong type;
    /// unknown fields are ignored.
    pub fn parse_frame(frame: &str) -> serde_json::Result<Self> {
        serde_json::from_str(frame)
    }
}
