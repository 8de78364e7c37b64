//! Grid cell as it appears on the wire.

use serde::{Deserialize, Serialize};

/// A single automaton cell: grid position plus alive/dead state.
///
/// Wire shape: `{"row": 3, "col": 7, "alive": true}`. Cells are immutable
/// values; the server owns every state transition and clients only ever
/// observe them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Grid row.
    pub row: i32,
    /// Grid column.
    pub col: i32,
    /// Whether the cell is alive in its generation.
    pub alive: bool,
}

impl Cell {
    /// Creates a cell at `(row, col)` with the given liveness.
    pub fn new(row: i32, col: i32, alive: bool) -> Self {
        Self { row, col, alive }
    }
}
