//! The spill-file codec stack.
//!
//! Two layers, bottom up:
//!
//! - [`frame`] - escapes two reserved byte values and marks block
//!   boundaries, so a reader can recover "read until the end of this
//!   logical block" without any length prefix.
//! - [`record`] - gives each logical record (a row key or one cell) a pair
//!   of serialization strategies: a generic, self-delimiting path and a
//!   custom per-type path bounded by exactly one frame.
//!
//! [`cells`] holds the built-in custom serializers for the cell types that
//! have a dedicated fast path.

pub mod cells;
pub mod frame;
pub mod record;

pub use frame::{ESCAPE, FrameReader, FrameWriter, TERMINATE};
pub use record::{CellRead, CellSerializer, CellWrite, RecordReader, RecordWriter};
