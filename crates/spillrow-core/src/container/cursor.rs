//! Forward-only row cursors.
//!
//! A [`RowCursor`] walks one [`ClosedBuffer`](super::buffer::ClosedBuffer)
//! from start to end. In-memory buffers are walked by index with no I/O;
//! spilled buffers are read through a fresh decompressing stream owned by
//! the cursor alone.
//!
//! Exhaustion is decided by the buffer's declared row count, never by
//! physical end-of-file: the moment the count is reached the cursor closes
//! its stream proactively rather than waiting for a read to fail. Drop
//! closes the stream too, so an abandoned cursor releases its file handle
//! deterministically.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use spillrow_common::{Error, Result, Row};

use super::buffer::{Store, TableStore};
use super::reaper::CursorTicket;
use crate::codec::RecordReader;

/// A single-use, stateful, forward-only reader of one buffer's rows.
///
/// Yields `Result<Row>`: a read failure names the failing row's ordinal
/// and the spill file, and fuses the cursor. Sibling cursors on the same
/// buffer are unaffected; each owns its own stream and position.
pub struct RowCursor {
    shared: Arc<TableStore>,
    yielded: u64,
    state: CursorState,
}

enum CursorState {
    /// Walking the frozen in-memory rows by index.
    Memory,
    /// Reading from an open spill-file stream.
    Disk(Box<DiskCursor>),
    /// Exhausted, failed, or proactively closed.
    Done,
}

struct DiskCursor {
    reader: RecordReader<BufReader<GzDecoder<File>>>,
    ticket: Arc<CursorTicket>,
    store: Arc<TableStore>,
}

impl DiskCursor {
    fn read_row(&mut self, column_count: usize) -> Result<Row> {
        let key = self.reader.read_row_key()?;
        let mut cells = Vec::with_capacity(column_count);
        for _ in 0..column_count {
            cells.push(self.reader.read_cell()?);
        }
        Ok(Row::new(key, cells))
    }

    fn close(&mut self) {
        if self.ticket.mark_closed() {
            if let Store::Disk(disk) = &self.store.store {
                disk.open_cursors.fetch_sub(1, Ordering::AcqRel);
            }
        }
    }
}

impl Drop for DiskCursor {
    fn drop(&mut self) {
        if self.ticket.is_open() {
            tracing::debug!(
                path = %self.ticket.path().display(),
                "file cursor dropped before exhaustion"
            );
        }
        self.close();
    }
}

impl RowCursor {
    pub(super) fn open(shared: Arc<TableStore>) -> Result<Self> {
        let state = match &shared.store {
            Store::Memory(_) => CursorState::Memory,
            Store::Disk(disk) => {
                let file = File::open(&disk.path).map_err(|source| Error::Spill {
                    path: disk.path.to_path_buf(),
                    source,
                })?;
                let reader = RecordReader::new(BufReader::new(GzDecoder::new(file)));
                let ticket = CursorTicket::new(disk.path.to_path_buf());
                disk.open_cursors.fetch_add(1, Ordering::AcqRel);
                CursorState::Disk(Box::new(DiskCursor {
                    reader,
                    ticket,
                    store: Arc::clone(&shared),
                }))
            }
        };
        Ok(Self {
            shared,
            yielded: 0,
            state,
        })
    }

    /// Returns how many rows this cursor has yielded so far.
    #[must_use]
    pub fn rows_yielded(&self) -> u64 {
        self.yielded
    }

    /// Returns true if more rows remain.
    ///
    /// Compares the yielded count against the buffer's total row count;
    /// the declared count, not physical EOF, is the authoritative
    /// terminator.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.yielded < self.shared.row_count && !matches!(self.state, CursorState::Done)
    }

    fn finish(&mut self) {
        if let CursorState::Disk(disk) = &mut self.state {
            disk.close();
        }
        self.state = CursorState::Done;
    }
}

impl Iterator for RowCursor {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.yielded >= self.shared.row_count {
            self.finish();
            return None;
        }
        match &mut self.state {
            CursorState::Done => None,
            CursorState::Memory => {
                let Store::Memory(rows) = &self.shared.store else {
                    return None;
                };
                let row = rows.get(self.yielded as usize)?.clone();
                self.yielded += 1;
                Some(Ok(row))
            }
            CursorState::Disk(disk) => {
                let column_count = self.shared.schema.column_count();
                match disk.read_row(column_count) {
                    Ok(row) => {
                        self.yielded += 1;
                        if self.yielded >= self.shared.row_count {
                            // Close the stream the moment the declared row
                            // count is reached.
                            self.finish();
                        }
                        Some(Ok(row))
                    }
                    Err(source) => {
                        let row_index = self.yielded;
                        let path = disk.ticket.path().to_path_buf();
                        self.finish();
                        Some(Err(Error::RowRead {
                            row_index,
                            path,
                            source: Box::new(source),
                        }))
                    }
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.shared.row_count - self.yielded) as usize;
        match self.state {
            CursorState::Done => (0, Some(0)),
            // A disk read can fail, so only the upper bound is certain.
            CursorState::Disk(_) => (0, Some(remaining)),
            CursorState::Memory => (remaining, Some(remaining)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::buffer::RowBuffer;
    use spillrow_common::{Cell, CellType, ColumnSpec, TableSchema};

    fn build(threshold: usize, rows: i64) -> crate::container::ClosedBuffer {
        let mut buffer = RowBuffer::new(threshold);
        for i in 0..rows {
            buffer
                .add_row(Row::new(format!("R{i}"), vec![Cell::from(i)]))
                .unwrap();
        }
        buffer
            .close(TableSchema::new(vec![ColumnSpec::new("v", CellType::Int)]))
            .unwrap()
    }

    #[test]
    fn test_memory_cursor_yields_in_order() {
        let closed = build(10, 3);
        let values: Vec<i64> = closed
            .iter()
            .unwrap()
            .map(|r| r.unwrap().cell(0).unwrap().as_int().unwrap())
            .collect();
        assert_eq!(values, vec![0, 1, 2]);
    }

    #[test]
    fn test_disk_cursor_yields_in_order() {
        let closed = build(2, 5);
        assert!(closed.uses_temp_file());
        let keys: Vec<String> = closed
            .iter()
            .unwrap()
            .map(|r| r.unwrap().key().to_string())
            .collect();
        assert_eq!(keys, vec!["R0", "R1", "R2", "R3", "R4"]);
    }

    #[test]
    fn test_has_next_tracks_declared_count() {
        let closed = build(1, 2);
        let mut cursor = closed.iter().unwrap();
        assert!(cursor.has_next());
        cursor.next().unwrap().unwrap();
        assert!(cursor.has_next());
        cursor.next().unwrap().unwrap();
        assert!(!cursor.has_next());
        assert!(cursor.next().is_none());
        assert_eq!(cursor.rows_yielded(), 2);
    }

    #[test]
    fn test_exhaustion_closes_stream_proactively() {
        let closed = build(0, 3);
        let mut cursor = closed.iter().unwrap();
        assert_eq!(closed.open_cursor_count(), 1);
        for row in cursor.by_ref() {
            row.unwrap();
        }
        // Exhausted: the stream was closed without waiting for the cursor
        // to be dropped.
        assert_eq!(closed.open_cursor_count(), 0);
        drop(cursor);
        assert_eq!(closed.open_cursor_count(), 0);
    }

    #[test]
    fn test_dropping_unexhausted_cursor_releases_stream() {
        let closed = build(0, 5);
        let mut cursor = closed.iter().unwrap();
        cursor.next().unwrap().unwrap();
        assert_eq!(closed.open_cursor_count(), 1);
        drop(cursor);
        assert_eq!(closed.open_cursor_count(), 0);
    }
}
