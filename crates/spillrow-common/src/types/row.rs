//! Rows and row keys.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Cell;

/// The unique identifying key of a row.
///
/// Keys are produced by the caller and never interpreted by the buffer;
/// uniqueness is the caller's responsibility.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowKey(String);

impl RowKey {
    /// Creates a new row key from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowKey({:?})", self.0)
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RowKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RowKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// An immutable row: a key plus an ordered sequence of cells.
///
/// Rows are constructed once by the producing side and never mutated;
/// the buffer moves them around but does not inspect cell contents.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    key: RowKey,
    cells: Vec<Cell>,
}

impl Row {
    /// Creates a row from a key and its cells in column order.
    #[must_use]
    pub fn new(key: impl Into<RowKey>, cells: Vec<Cell>) -> Self {
        Self {
            key: key.into(),
            cells,
        }
    }

    /// Returns the row key.
    #[must_use]
    pub fn key(&self) -> &RowKey {
        &self.key
    }

    /// Returns the cells in column order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Returns the cell at the given column index.
    #[must_use]
    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Returns the number of cells.
    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }
}
