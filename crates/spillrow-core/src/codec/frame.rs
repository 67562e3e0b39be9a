//! Framed byte stream codec.
//!
//! Escapes two reserved byte values inside an arbitrary payload and marks
//! block boundaries with a literal terminator, so a downstream reader can
//! recover "read until the end of this logical block" semantics over a
//! stream that carries no length prefixes.
//!
//! On the wire, a literal [`TERMINATE`] byte never appears un-escaped
//! except at a genuine block boundary; every payload occurrence of either
//! reserved value is preceded by one [`ESCAPE`] byte (byte stuffing).

use std::io::{self, Read, Write};

/// Marks the end of a block when it appears un-escaped on the wire.
pub const TERMINATE: u8 = 0x61;

/// Precedes a payload byte that would otherwise be misread as a control
/// byte.
pub const ESCAPE: u8 = 0x62;

/// Escaping writer over an arbitrary byte sink.
///
/// Single-writer: the 2-byte scratch buffer used during escaping is reused
/// across calls, so a `FrameWriter` must not be shared between threads.
pub struct FrameWriter<W: Write> {
    inner: W,
    scratch: [u8; 2],
}

impl<W: Write> FrameWriter<W> {
    /// Wraps the given sink.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            scratch: [ESCAPE, 0],
        }
    }

    /// Emits one literal (non-escaped) [`TERMINATE`] byte.
    ///
    /// This is the only way a genuine block boundary reaches the wire.
    pub fn end_block(&mut self) -> io::Result<()> {
        self.inner.write_all(&[TERMINATE])
    }

    /// Unwraps the codec, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Returns a reference to the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}

impl<W: Write> Write for FrameWriter<W> {
    /// Writes the payload, stuffing an [`ESCAPE`] before every occurrence
    /// of a reserved byte. Runs of non-reserved bytes are forwarded in the
    /// largest contiguous chunk possible.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut start = 0;
        for (i, &b) in buf.iter().enumerate() {
            if b == TERMINATE || b == ESCAPE {
                if start < i {
                    self.inner.write_all(&buf[start..i])?;
                }
                self.scratch[1] = b;
                self.inner.write_all(&self.scratch)?;
                start = i + 1;
            }
        }
        if start < buf.len() {
            self.inner.write_all(&buf[start..])?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Unescaping reader over an arbitrary byte source.
///
/// An un-escaped [`TERMINATE`] marks the end of the current block: reads
/// return `Ok(0)` from that point until [`next_block`](Self::next_block)
/// clears the boundary. An [`ESCAPE`] is dropped and the byte after it is
/// treated as literal data regardless of its value.
pub struct FrameReader<R: Read> {
    inner: R,
    at_block_end: bool,
}

impl<R: Read> FrameReader<R> {
    /// Wraps the given source.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            at_block_end: false,
        }
    }

    /// Returns true if the reader is parked at a block boundary.
    pub fn at_block_end(&self) -> bool {
        self.at_block_end
    }

    /// Clears a block boundary so reads can continue into the next block.
    pub fn next_block(&mut self) {
        self.at_block_end = false;
    }

    /// Consumes bytes up to and including the next un-escaped
    /// [`TERMINATE`], then parks at the boundary.
    ///
    /// No-op if the reader is already at a boundary. Errors with
    /// [`io::ErrorKind::UnexpectedEof`] if the underlying stream ends
    /// before a terminator is seen.
    pub fn skip_to_block_end(&mut self) -> io::Result<()> {
        while !self.at_block_end {
            match self.read_raw_byte()? {
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stream ended inside a block",
                    ));
                }
                Some(TERMINATE) => self.at_block_end = true,
                Some(ESCAPE) => {
                    if self.read_raw_byte()?.is_none() {
                        return Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "stream ended after escape byte",
                        ));
                    }
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Unwraps the codec, returning the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_raw_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}

impl<R: Read> Read for FrameReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.at_block_end || buf.is_empty() {
            return Ok(0);
        }
        let mut n = 0;
        while n < buf.len() {
            match self.read_raw_byte()? {
                None => break,
                Some(TERMINATE) => {
                    self.at_block_end = true;
                    break;
                }
                Some(ESCAPE) => {
                    let literal = self.read_raw_byte()?.ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "stream ended after escape byte",
                        )
                    })?;
                    buf[n] = literal;
                    n += 1;
                }
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
            }
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn escape(payload: &[u8]) -> Vec<u8> {
        let mut writer = FrameWriter::new(Vec::new());
        writer.write_all(payload).unwrap();
        writer.into_inner()
    }

    fn unescape_block(wire: &[u8]) -> Vec<u8> {
        let mut reader = FrameReader::new(wire);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_plain_bytes_pass_through() {
        assert_eq!(escape(b"hello"), b"hello");
    }

    #[test]
    fn test_reserved_bytes_are_stuffed() {
        let wire = escape(&[0x10, TERMINATE, ESCAPE, 0x20]);
        assert_eq!(wire, vec![0x10, ESCAPE, TERMINATE, ESCAPE, ESCAPE, 0x20]);
    }

    #[test]
    fn test_end_block_is_literal_terminator() {
        let mut writer = FrameWriter::new(Vec::new());
        writer.write_all(&[TERMINATE]).unwrap();
        writer.end_block().unwrap();
        let wire = writer.into_inner();
        assert_eq!(wire, vec![ESCAPE, TERMINATE, TERMINATE]);
    }

    #[test]
    fn test_reader_stops_at_boundary() {
        let mut writer = FrameWriter::new(Vec::new());
        writer.write_all(b"abc").unwrap();
        writer.end_block().unwrap();
        writer.write_all(b"def").unwrap();
        writer.end_block().unwrap();
        let wire = writer.into_inner();

        let mut reader = FrameReader::new(&wire[..]);
        let mut first = Vec::new();
        reader.read_to_end(&mut first).unwrap();
        assert_eq!(first, b"abc");
        assert!(reader.at_block_end());

        reader.next_block();
        let mut second = Vec::new();
        reader.read_to_end(&mut second).unwrap();
        assert_eq!(second, b"def");
    }

    #[test]
    fn test_skip_to_block_end_consumes_remainder() {
        let mut writer = FrameWriter::new(Vec::new());
        writer.write_all(&[1, 2, TERMINATE, ESCAPE, 5]).unwrap();
        writer.end_block().unwrap();
        writer.write_all(b"next").unwrap();
        let wire = writer.into_inner();

        let mut reader = FrameReader::new(&wire[..]);
        let mut partial = [0u8; 1];
        reader.read_exact(&mut partial).unwrap();
        assert_eq!(partial[0], 1);

        reader.skip_to_block_end().unwrap();
        assert!(reader.at_block_end());
        // Already parked: a second skip is a no-op.
        reader.skip_to_block_end().unwrap();

        reader.next_block();
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"next");
    }

    #[test]
    fn test_skip_errors_on_truncated_block() {
        let wire = escape(&[1, 2, 3]);
        let mut reader = FrameReader::new(&wire[..]);
        let err = reader.skip_to_block_end().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    proptest! {
        #[test]
        fn prop_escape_round_trip(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
            let wire = escape(&payload);
            prop_assert_eq!(unescape_block(&wire), payload);
        }

        #[test]
        fn prop_boundary_survives_arbitrary_payloads(
            first in proptest::collection::vec(any::<u8>(), 0..256),
            second in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            let mut writer = FrameWriter::new(Vec::new());
            writer.write_all(&first).unwrap();
            writer.end_block().unwrap();
            writer.write_all(&second).unwrap();
            writer.end_block().unwrap();
            let wire = writer.into_inner();

            let mut reader = FrameReader::new(&wire[..]);
            let mut got_first = Vec::new();
            reader.read_to_end(&mut got_first).unwrap();
            prop_assert!(reader.at_block_end());
            reader.next_block();
            let mut got_second = Vec::new();
            reader.read_to_end(&mut got_second).unwrap();

            prop_assert_eq!(got_first, first);
            prop_assert_eq!(got_second, second);
        }

        #[test]
        fn prop_runs_of_reserved_bytes(count in 0usize..64) {
            let payload = vec![TERMINATE; count]
                .into_iter()
                .chain(vec![ESCAPE; count])
                .collect::<Vec<_>>();
            let wire = escape(&payload);
            prop_assert_eq!(unescape_block(&wire), payload);
        }
    }
}
