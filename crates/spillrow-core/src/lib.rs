//! # spillrow-core
//!
//! The buffering kernel for Spillrow: a row buffer that transparently
//! spills to a compressed temp file, the framed binary codec the spill
//! format is built on, and forward-only cursors for reading rows back.
//!
//! ## Modules
//!
//! - [`codec`] - Framed byte stream codec and the per-record object codec
//! - [`container`] - The spillable row buffer, cursors, and cursor registry
//!
//! ## Overview
//!
//! Rows are pushed one at a time into a [`RowBuffer`]. Up to a configured
//! threshold they stay in an in-memory FIFO queue; past it, the oldest
//! queued row is streamed through the record codec into a gzip-compressed
//! temp file. Closing the buffer yields a [`ClosedBuffer`] from which any
//! number of independent [`RowCursor`]s can be obtained; rows come back in
//! exactly the order they were added, regardless of where they were stored.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod codec;
pub mod container;

// Re-export commonly used types
pub use codec::{CellRead, CellSerializer, CellWrite, FrameReader, FrameWriter, RecordReader, RecordWriter};
pub use container::{BufferConfig, ClosedBuffer, RowBuffer, RowCursor};
