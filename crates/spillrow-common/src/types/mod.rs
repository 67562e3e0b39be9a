//! Core type definitions for Spillrow.
//!
//! This module contains the data model the buffering kernel operates on:
//! - Cell values and their type tags ([`Cell`], [`CellType`])
//! - Rows and row keys ([`Row`], [`RowKey`])
//! - Column schemas ([`TableSchema`], [`ColumnSpec`])

mod row;
mod schema;
mod value;

pub use row::{Row, RowKey};
pub use schema::{ColumnSpec, TableSchema};
pub use value::{Cell, CellType};
