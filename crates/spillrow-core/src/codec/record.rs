//! Per-record object codec.
//!
//! Sits on top of the framed stream and gives each logical record (a row
//! key or one cell) a pair of serialization strategies:
//!
//! - **Generic path**: bincode through the escaping writer. bincode's own
//!   encoding is self-delimiting on read, so no block terminator is
//!   needed.
//! - **Custom path**: a cell type's dedicated [`CellSerializer`] writes
//!   primitive values through the framed stream, and the codec terminates
//!   the block afterwards — bounding exactly the bytes that serializer
//!   wrote, whatever their number or internal structure.
//!
//! The central guarantee: after any [`RecordReader::read_cell`] return,
//! success or failure, the stream position is aligned to the start of the
//! next record. A custom deserializer that under- or over-reads its block
//! cannot corrupt subsequent reads.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{self, Read, Write};

use spillrow_common::{Cell, CellType, Error, Result, RowKey};

use super::cells;
use super::frame::{FrameReader, FrameWriter};

/// Cell tag: the distinguished missing marker, no payload follows.
const TAG_MISSING: u8 = 0;
/// Cell tag: a bincode-encoded cell follows (self-delimiting).
const TAG_GENERIC: u8 = 1;
/// Cell tag: a cell-type byte and one terminated block follow.
const TAG_CUSTOM: u8 = 2;

/// Primitive write operations exposed to custom cell serializers.
///
/// Everything written lands inside the current frame and is escaped as
/// needed; serializers never see the reserved control bytes.
pub trait CellWrite {
    /// Writes one byte.
    fn put_u8(&mut self, v: u8) -> io::Result<()>;
    /// Writes a little-endian u32.
    fn put_u32(&mut self, v: u32) -> io::Result<()>;
    /// Writes a little-endian i64.
    fn put_i64(&mut self, v: i64) -> io::Result<()>;
    /// Writes a little-endian f64.
    fn put_f64(&mut self, v: f64) -> io::Result<()>;
    /// Writes raw bytes.
    fn put_bytes(&mut self, buf: &[u8]) -> io::Result<()>;
    /// Writes a string as a u32 length followed by its UTF-8 bytes.
    fn put_str(&mut self, s: &str) -> io::Result<()>;
}

impl<W: Write + ?Sized> CellWrite for W {
    fn put_u8(&mut self, v: u8) -> io::Result<()> {
        WriteBytesExt::write_u8(self, v)
    }

    fn put_u32(&mut self, v: u32) -> io::Result<()> {
        self.write_u32::<LittleEndian>(v)
    }

    fn put_i64(&mut self, v: i64) -> io::Result<()> {
        self.write_i64::<LittleEndian>(v)
    }

    fn put_f64(&mut self, v: f64) -> io::Result<()> {
        self.write_f64::<LittleEndian>(v)
    }

    fn put_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_all(buf)
    }

    fn put_str(&mut self, s: &str) -> io::Result<()> {
        self.put_u32(s.len() as u32)?;
        self.write_all(s.as_bytes())
    }
}

/// Primitive read operations exposed to custom cell deserializers.
///
/// Reads are bounded by the current frame: once the block terminator is
/// reached, further reads fail with [`io::ErrorKind::UnexpectedEof`].
pub trait CellRead {
    /// Reads one byte.
    fn get_u8(&mut self) -> io::Result<u8>;
    /// Reads a little-endian u32.
    fn get_u32(&mut self) -> io::Result<u32>;
    /// Reads a little-endian i64.
    fn get_i64(&mut self) -> io::Result<i64>;
    /// Reads a little-endian f64.
    fn get_f64(&mut self) -> io::Result<f64>;
    /// Fills the buffer with raw bytes.
    fn get_bytes(&mut self, buf: &mut [u8]) -> io::Result<()>;
    /// Reads a string written by [`CellWrite::put_str`].
    fn get_str(&mut self) -> io::Result<String>;
}

impl<R: Read + ?Sized> CellRead for R {
    fn get_u8(&mut self) -> io::Result<u8> {
        ReadBytesExt::read_u8(self)
    }

    fn get_u32(&mut self) -> io::Result<u32> {
        self.read_u32::<LittleEndian>()
    }

    fn get_i64(&mut self) -> io::Result<i64> {
        self.read_i64::<LittleEndian>()
    }

    fn get_f64(&mut self) -> io::Result<f64> {
        self.read_f64::<LittleEndian>()
    }

    fn get_bytes(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.read_exact(buf)
    }

    fn get_str(&mut self) -> io::Result<String> {
        let len = self.get_u32()? as usize;
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        String::from_utf8(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// A type-specific cell serializer bound to exactly one frame.
///
/// Implementations write and read through the primitive views only; the
/// record codec takes care of the block terminator on both sides, so a
/// serializer that mis-counts its bytes cannot shift the record boundary.
pub trait CellSerializer: Sync {
    /// Writes the cell's payload into the current frame.
    fn write_cell(&self, cell: &Cell, out: &mut dyn CellWrite) -> io::Result<()>;

    /// Reads one cell's payload from the current frame.
    fn read_cell(&self, input: &mut dyn CellRead) -> io::Result<Cell>;
}

/// Write side of the per-record codec.
pub struct RecordWriter<W: Write> {
    frame: FrameWriter<W>,
}

impl<W: Write> RecordWriter<W> {
    /// Wraps the given sink in the full codec stack.
    pub fn new(inner: W) -> Self {
        Self {
            frame: FrameWriter::new(inner),
        }
    }

    /// Serializes a value through the generic, self-delimiting path.
    pub fn write_generic<T: Serialize>(&mut self, value: &T) -> Result<()> {
        bincode::serde::encode_into_std_write(value, &mut self.frame, bincode::config::standard())
            .map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(())
    }

    /// Writes a row key (generic path).
    pub fn write_row_key(&mut self, key: &RowKey) -> Result<()> {
        self.write_generic(key)
    }

    /// Writes one cell, choosing the custom path when the cell's type has
    /// a dedicated serializer and falling back to the generic path
    /// otherwise.
    pub fn write_cell(&mut self, cell: &Cell) -> Result<()> {
        let Some(ty) = cell.cell_type() else {
            self.frame.write_all(&[TAG_MISSING])?;
            return Ok(());
        };
        match cells::custom_serializer(ty) {
            Some(serializer) => {
                self.frame.write_all(&[TAG_CUSTOM, ty as u8])?;
                self.write_block(|out| serializer.write_cell(cell, out))
            }
            None => {
                self.frame.write_all(&[TAG_GENERIC])?;
                self.write_generic(cell)
            }
        }
    }

    /// Runs a closure against the primitive view, then terminates the
    /// block it wrote into.
    pub fn write_block(
        &mut self,
        write: impl FnOnce(&mut dyn CellWrite) -> io::Result<()>,
    ) -> Result<()> {
        write(&mut self.frame)?;
        self.frame.end_block()?;
        Ok(())
    }

    /// Flushes the codec stack down to the underlying sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.frame.flush()
    }

    /// Unwraps the codec, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.frame.into_inner()
    }
}

/// Read side of the per-record codec.
pub struct RecordReader<R: Read> {
    frame: FrameReader<R>,
}

impl<R: Read> RecordReader<R> {
    /// Wraps the given source in the full codec stack.
    pub fn new(inner: R) -> Self {
        Self {
            frame: FrameReader::new(inner),
        }
    }

    /// Deserializes a value written through the generic path.
    pub fn read_generic<T: DeserializeOwned>(&mut self) -> Result<T> {
        bincode::serde::decode_from_std_read(&mut self.frame, bincode::config::standard())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Reads a row key (generic path).
    pub fn read_row_key(&mut self) -> Result<RowKey> {
        self.read_generic()
    }

    /// Reads one cell written by [`RecordWriter::write_cell`].
    pub fn read_cell(&mut self) -> Result<Cell> {
        let mut tag = [0u8; 1];
        self.frame.read_exact(&mut tag)?;
        match tag[0] {
            TAG_MISSING => Ok(Cell::Missing),
            TAG_GENERIC => self.read_generic(),
            TAG_CUSTOM => {
                let mut ty_byte = [0u8; 1];
                self.frame.read_exact(&mut ty_byte)?;
                let ty = CellType::from_u8(ty_byte[0]).ok_or_else(|| {
                    Error::Serialization(format!("unknown cell type byte {}", ty_byte[0]))
                })?;
                let serializer = cells::custom_serializer(ty).ok_or_else(|| {
                    Error::Serialization(format!("cell type {ty} has no dedicated serializer"))
                })?;
                self.read_block(|input| serializer.read_cell(input))
            }
            other => Err(Error::Serialization(format!("unknown cell tag {other}"))),
        }
    }

    /// Runs a closure against the block-limited primitive view, then
    /// unconditionally realigns to the end of the block.
    ///
    /// The realignment happens whether the closure succeeded, under-read,
    /// over-read, or failed outright; its result is returned only after
    /// the stream sits at the next record's start.
    pub fn read_block<T>(
        &mut self,
        read: impl FnOnce(&mut dyn CellRead) -> io::Result<T>,
    ) -> Result<T> {
        let result = read(&mut self.frame);
        self.frame.skip_to_block_end()?;
        self.frame.next_block();
        result.map_err(Error::from)
    }

    /// Unwraps the codec, returning the underlying source.
    pub fn into_inner(self) -> R {
        self.frame.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip_cells(cells_in: &[Cell]) -> Vec<Cell> {
        let mut writer = RecordWriter::new(Vec::new());
        for cell in cells_in {
            writer.write_cell(cell).unwrap();
        }
        let wire = writer.into_inner();

        let mut reader = RecordReader::new(&wire[..]);
        (0..cells_in.len())
            .map(|_| reader.read_cell().unwrap())
            .collect()
    }

    #[test]
    fn test_cell_round_trip_all_paths() {
        let cells_in = vec![
            Cell::Missing,
            Cell::from(true),
            Cell::from(-42i64),
            Cell::from(2.75f64),
            Cell::from("hello block"),
            Cell::Blob(vec![0x61, 0x62, 0x00, 0xff]),
            Cell::List(vec![Cell::from(1i64), Cell::Missing]),
        ];
        assert_eq!(round_trip_cells(&cells_in), cells_in);
    }

    #[test]
    fn test_row_key_round_trip() {
        let mut writer = RecordWriter::new(Vec::new());
        writer.write_row_key(&RowKey::from("R123")).unwrap();
        writer.write_cell(&Cell::from(7i64)).unwrap();
        let wire = writer.into_inner();

        let mut reader = RecordReader::new(&wire[..]);
        assert_eq!(reader.read_row_key().unwrap().as_str(), "R123");
        assert_eq!(reader.read_cell().unwrap().as_int(), Some(7));
    }

    #[test]
    fn test_payloads_containing_reserved_bytes() {
        // A string made of the protocol's own control bytes must survive.
        let tricky = String::from_utf8(vec![0x61, 0x62, 0x61, 0x62]).unwrap();
        let cells_in = vec![Cell::from(tricky.clone()), Cell::from(1i64)];
        let cells_out = round_trip_cells(&cells_in);
        assert_eq!(cells_out[0].as_str(), Some(tricky.as_str()));
        assert_eq!(cells_out[1].as_int(), Some(1));
    }

    #[test]
    fn test_under_reading_deserializer_does_not_shift_boundary() {
        let mut writer = RecordWriter::new(Vec::new());
        writer
            .write_block(|out| {
                out.put_i64(99)?;
                out.put_str("trailing payload")
            })
            .unwrap();
        writer.write_cell(&Cell::from(5i64)).unwrap();
        let wire = writer.into_inner();

        let mut reader = RecordReader::new(&wire[..]);
        // Consume only the integer, leaving the string unread.
        let v = reader.read_block(|input| input.get_i64()).unwrap();
        assert_eq!(v, 99);
        // The next record still starts at the right offset.
        assert_eq!(reader.read_cell().unwrap().as_int(), Some(5));
    }

    #[test]
    fn test_over_reading_deserializer_sees_bounded_eof() {
        let mut writer = RecordWriter::new(Vec::new());
        writer.write_block(|out| out.put_u8(1)).unwrap();
        writer.write_cell(&Cell::from("after")).unwrap();
        let wire = writer.into_inner();

        let mut reader = RecordReader::new(&wire[..]);
        let err = reader
            .read_block(|input| {
                input.get_u8()?;
                // One byte past what was written: the frame reports EOF
                // rather than leaking the next record's bytes.
                input.get_u8()
            })
            .unwrap_err();
        assert!(matches!(err, Error::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof));
        // The failing record is realigned; the next one reads cleanly.
        assert_eq!(reader.read_cell().unwrap().as_str(), Some("after"));
    }

    #[test]
    fn test_failing_deserializer_leaves_stream_aligned() {
        let mut writer = RecordWriter::new(Vec::new());
        writer.write_block(|out| out.put_i64(3)).unwrap();
        writer.write_cell(&Cell::from(11i64)).unwrap();
        let wire = writer.into_inner();

        let mut reader = RecordReader::new(&wire[..]);
        let err = reader
            .read_block(|_| -> io::Result<Cell> {
                Err(io::Error::new(io::ErrorKind::InvalidData, "bad payload"))
            })
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(reader.read_cell().unwrap().as_int(), Some(11));
    }

    #[test]
    fn test_generic_path_is_self_delimiting() {
        let mut writer = RecordWriter::new(Vec::new());
        writer.write_generic(&vec![1u64, 2, 3]).unwrap();
        writer.write_generic(&"tail".to_string()).unwrap();
        let wire = writer.into_inner();

        let mut reader = RecordReader::new(&wire[..]);
        let nums: Vec<u64> = reader.read_generic().unwrap();
        let tail: String = reader.read_generic().unwrap();
        assert_eq!(nums, vec![1, 2, 3]);
        assert_eq!(tail, "tail");
    }
}
