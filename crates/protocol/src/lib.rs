//! Wire types for the Game of Life subscription protocol.
//!
//! This crate contains the serde-serializable types exchanged with the
//! simulation server as JSON text frames. These types represent the
//! "protocol layer" - the shapes of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization
//! * 1:1 with protocol: Match the server's message vocabulary
//! * Stable: Changes only when the wire protocol changes
//!
//! Higher-level session logic is built on top of these types in `gol-rs`.

pub mod cell;
pub mod message;

pub use cell::*;
pub use message::*;
