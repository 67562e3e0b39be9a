//! The spillable row buffer and its read cursors.
//!
//! - [`buffer`] - [`RowBuffer`] (fill phase) and [`ClosedBuffer`] (read
//!   phase), with transparent spilling to a compressed temp file
//! - [`cursor`] - [`RowCursor`], a forward-only row iterator over either
//!   the in-memory store or one open spill-file stream
//! - [`reaper`] - process-wide diagnostic registry of file-backed cursors

pub mod buffer;
pub mod cursor;
pub mod reaper;

pub use buffer::{BufferConfig, ClosedBuffer, RowBuffer};
pub use cursor::RowCursor;
pub use reaper::{CursorTicket, open_cursors, sweep};
