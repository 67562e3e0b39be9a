//! # spillrow-common
//!
//! Foundation layer for Spillrow: cell values, rows, schemas, and errors.
//!
//! This crate provides the data model consumed by `spillrow-core`. It has
//! no internal dependencies and should be kept minimal.
//!
//! ## Modules
//!
//! - [`types`] - Core type definitions ([`Cell`], [`Row`], [`TableSchema`], etc.)
//! - [`error`] - Error types ([`Error`], [`Result`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use types::{Cell, CellType, ColumnSpec, Row, RowKey, TableSchema};
