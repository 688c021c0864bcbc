//! Error types for the blob decoder.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors that abort a decode.
///
/// Per-row problems that only drop one entry are not errors; they are
/// recorded as [`SkipReason`](crate::SkipReason)s on the catalog.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] asmstore_common::Error),

    /// The file does not start with the store magic.
    #[error("not an AssemblyStore file: expected magic {expected:#010x}, got {actual:#010x}")]
    InvalidMagic { expected: u32, actual: u32 },

    /// The header declares an empty descriptor table.
    #[error("received a non-valid entry count")]
    InvalidEntryCount,

    /// The header declares empty hash tables.
    #[error("received a non-valid index entry count")]
    InvalidIndexEntryCount,

    /// The index tables reach past the end of the file.
    #[error("index tables end at {tables_end:#x} but the file is {file_len:#x} bytes")]
    TruncatedTables { tables_end: u64, file_len: u64 },

    /// A payload did not decompress to its declared size.
    #[error("LZ4 decompression failed for row {row}: {reason}")]
    Decompression { row: usize, reason: String },

    /// Writing an extracted payload failed.
    #[error("failed writing {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of fatal errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Not a store file, or a malformed header.
    Format,
    /// Short reads on headers or tables, failed reads or writes.
    Io,
    /// The arena budget was exhausted.
    Allocation,
    /// A payload failed to decompress.
    Decompression,
}

impl Error {
    /// Classify this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::InvalidMagic { .. } | Error::InvalidEntryCount | Error::InvalidIndexEntryCount => {
                ErrorClass::Format
            }
            Error::Decompression { .. } => ErrorClass::Decompression,
            Error::Common(e) if e.is_allocation() => ErrorClass::Allocation,
            Error::Common(asmstore_common::Error::InvalidMagic { .. }) => ErrorClass::Format,
            Error::Common(_) | Error::Io(_) | Error::TruncatedTables { .. } | Error::Write { .. } => {
                ErrorClass::Io
            }
        }
    }
}

/// Result type for blob operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(
            Error::InvalidMagic {
                expected: 1,
                actual: 2
            }
            .class(),
            ErrorClass::Format
        );
        assert_eq!(Error::InvalidIndexEntryCount.class(), ErrorClass::Format);
        assert_eq!(
            Error::from(asmstore_common::Error::ZeroCapacity).class(),
            ErrorClass::Allocation
        );
        assert_eq!(
            Error::from(std::io::Error::from(std::io::ErrorKind::UnexpectedEof)).class(),
            ErrorClass::Io
        );
        assert_eq!(
            Error::TruncatedTables {
                tables_end: 0x100,
                file_len: 0x14
            }
            .class(),
            ErrorClass::Io
        );
        assert_eq!(
            Error::from(asmstore_common::Error::AllocationFailed { requested: 1 }).class(),
            ErrorClass::Allocation
        );
        assert_eq!(
            Error::Decompression {
                row: 0,
                reason: String::new()
            }
            .class(),
            ErrorClass::Decompression
        );
    }
}
