//! Error types for the sieve engine

use std::fmt;
use std::io;

/// Result type alias for sieve operations
pub type Result<T> = std::result::Result<T, SieveError>;

/// Errors that abort a sieve run
///
/// Every variant is fatal. An empty segment is not an error and never shows up here.
#[derive(Debug)]
pub enum SieveError {
    /// A fallible reservation failed (composite bitset, result slots or a segment buffer)
    Allocation { what: &'static str, bytes: usize },

    /// Segment length is zero or not a multiple of the 32-bit word width
    SegmentLength(usize),

    /// Invalid configuration
    InvalidConfig(String),

    /// A worker thread panicked
    WorkerPanicked(String),

    /// `sieve` was called on an engine that already ran
    AlreadySieved,

    /// Sink write or thread spawn failure
    Io(io::Error),
}

impl fmt::Display for SieveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SieveError::Allocation { what, bytes } => {
                write!(f, "Out of memory allocating {} ({} bytes)", what, bytes)
            }
            SieveError::SegmentLength(len) => write!(
                f,
                "Segment length {} must be a non-zero multiple of {}",
                len,
                crate::bitset::WORD_BITS
            ),
            SieveError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            SieveError::WorkerPanicked(msg) => write!(f, "Worker panicked: {}", msg),
            SieveError::AlreadySieved => write!(f, "Sieve engine has already run"),
            SieveError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for SieveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SieveError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SieveError {
    fn from(err: io::Error) -> Self {
        SieveError::Io(err)
    }
}
