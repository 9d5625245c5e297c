//! Run configuration for the sieve engine

use crate::bitset::WORD_BITS;
use crate::error::{Result, SieveError};

/// Default segment length: large enough to keep the number of sink writes low,
/// small enough that a segment's words stay cache resident
pub const DEFAULT_SEGMENT_LEN: usize = 1_000_000;

/// Default number of worker threads
pub const DEFAULT_NUM_THREADS: usize = 4;

/// Sieve configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SieveConfig {
    /// Smallest number that may be emitted
    pub lower_lim: usize,

    /// Largest number that may be emitted
    pub upper_lim: usize,

    /// Number of worker threads (1 = sequential)
    pub num_threads: usize,

    /// Numbers per segment, a multiple of 32
    pub segment_len: usize,
}

impl Default for SieveConfig {
    fn default() -> Self {
        Self {
            lower_lim: 0,
            upper_lim: 0,
            num_threads: DEFAULT_NUM_THREADS,
            segment_len: DEFAULT_SEGMENT_LEN,
        }
    }
}

impl SieveConfig {
    /// Create a configuration for `[lower_lim, upper_lim]` with default threads and segment length
    pub fn new(lower_lim: usize, upper_lim: usize) -> Self {
        Self {
            lower_lim,
            upper_lim,
            ..Self::default()
        }
    }

    /// Set the number of worker threads
    pub fn with_num_threads(mut self, num: usize) -> Self {
        self.num_threads = num;
        self
    }

    /// Run with a single worker
    pub fn sequential(self) -> Self {
        self.with_num_threads(1)
    }

    /// Set the segment length
    pub fn with_segment_len(mut self, len: usize) -> Self {
        self.segment_len = len;
        self
    }

    /// Number of segments covering `[0, upper_lim]`
    pub fn segment_count(&self) -> usize {
        (self.upper_lim / self.segment_len) + 1
    }

    /// Check the structural invariants of the algorithm.
    ///
    /// The range ordering (`lower_lim <= upper_lim`) is the caller's contract and is
    /// not checked here.
    pub fn validate(&self) -> Result<()> {
        if self.segment_len == 0 || self.segment_len % WORD_BITS != 0 {
            return Err(SieveError::SegmentLength(self.segment_len));
        }
        if self.num_threads == 0 {
            return Err(SieveError::InvalidConfig(
                "num_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
