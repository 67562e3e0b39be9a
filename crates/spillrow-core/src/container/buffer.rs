//! The spillable row buffer.
//!
//! A [`RowBuffer`] accepts rows one at a time and keeps them in a bounded
//! in-memory FIFO queue. The first time a row would push the queue past
//! its configured capacity, the buffer opens a gzip-compressed temp file
//! and from then on evicts the oldest queued row to disk on every
//! overflow; once spilling starts it continues for the life of the buffer.
//!
//! Closing the buffer consumes it and returns a [`ClosedBuffer`], the
//! read-only half: either the frozen queue (never spilled) or the
//! finalized spill file (all rows drained to disk). The state machine
//!
//! ```text
//! OPEN-MEMORY --(queue overflow)--> OPEN-SPILLING --(close)--> CLOSED-SPILLED
//! OPEN-MEMORY --(close)--> CLOSED-MEMORY
//! ```
//!
//! is enforced by the types: no operation leads out of a closed state.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tempfile::TempPath;

use spillrow_common::{Error, Result, Row, TableSchema};

use super::cursor::RowCursor;
use crate::codec::RecordWriter;

/// Default number of rows kept in memory before spilling starts.
pub const DEFAULT_MAX_ROWS_IN_MEMORY: usize = 10_000;

/// Configuration for a [`RowBuffer`].
#[derive(Debug, Clone)]
pub struct BufferConfig {
    /// Rows held in memory before the buffer spills to disk.
    pub max_rows_in_memory: usize,
    /// Directory for spill files; the system temp dir when `None`.
    pub spill_dir: Option<PathBuf>,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_rows_in_memory: DEFAULT_MAX_ROWS_IN_MEMORY,
            spill_dir: None,
        }
    }
}

/// Write stream onto the spill file, plus the file's self-deleting path.
struct SpillWriter {
    path: TempPath,
    writer: RecordWriter<GzEncoder<BufWriter<File>>>,
}

impl SpillWriter {
    fn create(config: &BufferConfig) -> Result<Self> {
        let dir = config
            .spill_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let stamp = chrono::Local::now().format("%Y%m%d");
        let file = tempfile::Builder::new()
            .prefix(&format!("spillrow_{stamp}_"))
            .suffix(".bin.gz")
            .tempfile_in(&dir)
            .map_err(|source| Error::Spill {
                path: dir.clone(),
                source,
            })?;
        let (file, path) = file.into_parts();
        tracing::debug!(path = %path.display(), "creating spill file");
        let writer = RecordWriter::new(GzEncoder::new(
            BufWriter::new(file),
            Compression::default(),
        ));
        Ok(Self { path, writer })
    }

    /// Writes one row: key first, then each cell in column order, then a
    /// flush so no more than one row's worth of encoding sits buffered.
    fn write_row(&mut self, row: &Row) -> Result<()> {
        self.encode_row(row)
            .map_err(|e| e.with_spill_path(&self.path))
    }

    fn encode_row(&mut self, row: &Row) -> Result<()> {
        self.writer.write_row_key(row.key())?;
        for cell in row.cells() {
            self.writer.write_cell(cell)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Finishes the gzip stream and returns the path plus final file size.
    fn finish(self) -> Result<(TempPath, u64)> {
        let path = self.path;
        let finish = || -> std::io::Result<u64> {
            let encoder = self.writer.into_inner();
            let mut file_writer = encoder.finish()?;
            file_writer.flush()?;
            Ok(std::fs::metadata(&path)?.len())
        };
        match finish() {
            Ok(size) => Ok((path, size)),
            Err(source) => Err(Error::Spill {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// The fill-phase half of the buffer: accepts rows, spills past the
/// threshold, and turns into a [`ClosedBuffer`] on close.
pub struct RowBuffer {
    config: BufferConfig,
    queue: VecDeque<Row>,
    row_count: u64,
    spill: Option<SpillWriter>,
}

impl RowBuffer {
    /// Creates a buffer that holds at most `max_rows_in_memory` rows
    /// before spilling.
    #[must_use]
    pub fn new(max_rows_in_memory: usize) -> Self {
        Self::with_config(BufferConfig {
            max_rows_in_memory,
            ..BufferConfig::default()
        })
    }

    /// Creates a buffer from a full configuration.
    #[must_use]
    pub fn with_config(config: BufferConfig) -> Self {
        let capacity = config.max_rows_in_memory.min(1024);
        Self {
            config,
            queue: VecDeque::with_capacity(capacity),
            row_count: 0,
            spill: None,
        }
    }

    /// Appends one row.
    ///
    /// Row shape is not validated; the caller is trusted. On the first
    /// queue overflow the spill file is created lazily; from then on the
    /// oldest queued row is written out whenever the queue would exceed
    /// its capacity, preserving global FIFO order. An I/O failure here is
    /// fatal for the buffer: no partial row ever counts as written.
    pub fn add_row(&mut self, row: Row) -> Result<()> {
        self.queue.push_back(row);
        if self.queue.len() > self.config.max_rows_in_memory {
            if self.spill.is_none() {
                self.spill = Some(SpillWriter::create(&self.config)?);
            }
            if let Some(oldest) = self.queue.pop_front() {
                if let Some(spill) = self.spill.as_mut() {
                    spill.write_row(&oldest)?;
                }
            }
        }
        self.row_count += 1;
        Ok(())
    }

    /// Returns the number of rows added so far, independent of where they
    /// are stored.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.row_count
    }

    /// Returns true once the buffer has started spilling to disk.
    ///
    /// Never reverts: a buffer that spilled keeps its temp file even if
    /// the remaining rows would have fit in memory.
    #[must_use]
    pub fn uses_temp_file(&self) -> bool {
        self.spill.is_some()
    }

    /// Closes the buffer, attaching the column schema for read-back.
    ///
    /// If the buffer never spilled, the queue is frozen as the permanent
    /// read source. If it spilled, all residual queued rows are drained to
    /// the file and the write stream is finalized. Either way the result
    /// is immutable and any number of cursors can be opened on it.
    pub fn close(mut self, schema: TableSchema) -> Result<ClosedBuffer> {
        let store = match self.spill.take() {
            Some(mut spill) => {
                while let Some(row) = self.queue.pop_front() {
                    spill.write_row(&row)?;
                }
                let (path, bytes) = spill.finish()?;
                tracing::debug!(
                    path = %path.display(),
                    bytes,
                    rows = self.row_count,
                    "spill file finalized"
                );
                Store::Disk(DiskStore {
                    path,
                    open_cursors: AtomicUsize::new(0),
                })
            }
            None => Store::Memory(Vec::from(self.queue)),
        };
        Ok(ClosedBuffer {
            shared: Arc::new(TableStore {
                schema,
                row_count: self.row_count,
                store,
            }),
        })
    }
}

pub(super) struct DiskStore {
    pub(super) path: TempPath,
    pub(super) open_cursors: AtomicUsize,
}

pub(super) enum Store {
    Memory(Vec<Row>),
    Disk(DiskStore),
}

pub(super) struct TableStore {
    pub(super) schema: TableSchema,
    pub(super) row_count: u64,
    pub(super) store: Store,
}

/// The read-phase half of the buffer: an immutable, shareable handle over
/// either the frozen in-memory rows or the finalized spill file.
///
/// Clones share the same storage. The spill file lives as long as any
/// handle or cursor on it does and is removed when the last one drops.
#[derive(Clone)]
pub struct ClosedBuffer {
    shared: Arc<TableStore>,
}

impl ClosedBuffer {
    /// Returns the total number of rows.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.shared.row_count
    }

    /// Returns true if the buffer holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.row_count == 0
    }

    /// Returns the column schema attached at close time.
    #[must_use]
    pub fn schema(&self) -> &TableSchema {
        &self.shared.schema
    }

    /// Returns true if the rows live in a spill file.
    #[must_use]
    pub fn uses_temp_file(&self) -> bool {
        matches!(self.shared.store, Store::Disk(_))
    }

    /// Returns the spill file path, if the buffer spilled.
    #[must_use]
    pub fn spill_path(&self) -> Option<&std::path::Path> {
        match &self.shared.store {
            Store::Disk(disk) => Some(&disk.path),
            Store::Memory(_) => None,
        }
    }

    /// Returns the number of currently-open read streams on the spill
    /// file. Always zero for in-memory buffers.
    #[must_use]
    pub fn open_cursor_count(&self) -> usize {
        match &self.shared.store {
            Store::Disk(disk) => disk.open_cursors.load(std::sync::atomic::Ordering::Acquire),
            Store::Memory(_) => 0,
        }
    }

    /// Opens a fresh, independent cursor over the rows.
    ///
    /// Cursors never share read position; any number may be active at
    /// once, each yielding the complete sequence in insertion order. For
    /// spilled buffers this opens a new read stream on the temp file.
    pub fn iter(&self) -> Result<RowCursor> {
        RowCursor::open(Arc::clone(&self.shared))
    }
}
