//! Column schemas.
//!
//! A [`TableSchema`] describes the columns of a buffered table. It is
//! attached to a buffer at close time and consumed again when rows are
//! reconstructed from disk; it is never validated against the rows that
//! were actually written (the producing side is trusted).

use serde::{Deserialize, Serialize};

use super::CellType;

/// A single column descriptor: name plus expected cell type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    name: String,
    cell_type: CellType,
}

impl ColumnSpec {
    /// Creates a column descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, cell_type: CellType) -> Self {
        Self {
            name: name.into(),
            cell_type,
        }
    }

    /// Returns the column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the expected cell type.
    #[must_use]
    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }
}

/// An ordered list of column descriptors.
///
/// The only property the buffering kernel relies on is
/// [`column_count`](Self::column_count): a file-backed cursor reads exactly
/// that many cells per row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// Creates a schema from its columns in order.
    #[must_use]
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the column descriptors in order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }
}
