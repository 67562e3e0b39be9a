//! Error types used throughout Spillrow.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results with a Spillrow [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while buffering, spilling, or reading rows back.
///
/// I/O failures during the fill phase are fatal for the buffer that raised
/// them: a partial row write cannot be resumed, so callers should treat the
/// whole table-build operation as failed. Read failures carry the ordinal of
/// the row that could not be reconstructed and poison only the cursor that
/// hit them.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O failure on a spill file during writing or finalization.
    #[error("spill file {path}: {source}")]
    Spill {
        /// Path of the spill file involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A row could not be reconstructed from a spill file.
    #[error("failed to read row {row_index} from spill file {path}: {source}")]
    RowRead {
        /// Zero-based ordinal of the row that failed to deserialize.
        row_index: u64,
        /// Path of the spill file involved.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// Encoding or decoding a record failed for a non-I/O reason.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// An I/O error with no more specific context.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Attaches a spill-file path to a bare I/O error, leaving richer errors
    /// untouched.
    #[must_use]
    pub fn with_spill_path(self, path: &std::path::Path) -> Self {
        match self {
            Self::Io(source) => Self::Spill {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spill_error_names_file() {
        let err = Error::Spill {
            path: PathBuf::from("/tmp/spillrow_x.bin.gz"),
            source: io::Error::other("disk full"),
        };
        let msg = err.to_string();
        assert!(msg.contains("spillrow_x.bin.gz"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_row_read_error_names_ordinal() {
        let err = Error::RowRead {
            row_index: 17,
            path: PathBuf::from("/tmp/spill.bin.gz"),
            source: Box::new(Error::Serialization("bad tag".into())),
        };
        assert!(err.to_string().contains("row 17"));
    }

    #[test]
    fn test_with_spill_path_wraps_io_only() {
        let io_err = Error::Io(io::Error::other("boom"));
        let wrapped = io_err.with_spill_path(std::path::Path::new("/tmp/f"));
        assert!(matches!(wrapped, Error::Spill { .. }));

        let ser = Error::Serialization("x".into());
        let kept = ser.with_spill_path(std::path::Path::new("/tmp/f"));
        assert!(matches!(kept, Error::Serialization(_)));
    }
}
