//! Error types for asmstore-common.

use thiserror::Error;

/// Common error type for asmstore operations.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// Invalid magic value encountered.
    #[error("invalid magic: expected {expected:#010x}, got {actual:#010x}")]
    InvalidMagic { expected: u32, actual: u32 },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Arena capacity would be exceeded by an allocation.
    #[error("arena out of memory: requested {requested:#x} bytes, {available:#x} of {capacity:#x} available")]
    ArenaExhausted {
        requested: usize,
        available: usize,
        capacity: usize,
    },

    /// The backing allocator could not provide memory within the budget.
    #[error("arena allocation of {requested:#x} bytes failed")]
    AllocationFailed { requested: usize },

    /// An arena was requested with zero capacity.
    #[error("arena capacity must be non-zero")]
    ZeroCapacity,

    /// A size computation overflowed `usize`.
    #[error("size computation overflowed")]
    CapacityOverflow,
}

impl Error {
    /// Whether this error means the arena could not satisfy an allocation.
    pub fn is_allocation(&self) -> bool {
        matches!(
            self,
            Error::ArenaExhausted { .. }
                | Error::AllocationFailed { .. }
                | Error::ZeroCapacity
                | Error::CapacityOverflow
        )
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
