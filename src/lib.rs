//! Segmented, multi-worker prime sieve
//!
//! Computes every prime in `[lower_lim, upper_lim]` and writes them, ascending and one
//! per line, to an output sink.
//!
//! ```text
//!   BasePrimes (≤ √upper) ──► CompositeBitset (pre-seeded)
//!                                   │
//!                       SegmentPartitioner::claim_next
//!                ┌──────────────┬───┴──────────┐
//!                ▼              ▼              ▼
//!          SieveWorker    SieveWorker    SieveWorker   mark → serialize
//!                └──────────────┼──────────────┘
//!                               ▼
//!                  ResultSlots ──► collate ──► OutputSink
//! ```
//!
//! ```no_run
//! use segsieve::{SieveConfig, SieveEngine};
//!
//! let mut engine = SieveEngine::new(SieveConfig::new(0, 100).with_num_threads(4))?;
//! let mut out: Vec<u8> = Vec::new();
//! engine.get_primes(&mut out)?;
//! assert_eq!(engine.prime_count(), 25);
//! # Ok::<(), segsieve::SieveError>(())
//! ```

pub mod base_primes;
pub mod bitset;
pub mod collate;
pub mod config;
pub mod engine;
pub mod error;
pub mod partition;
pub mod reference;
pub mod sink;
pub mod storage;
pub mod worker;

pub use base_primes::BasePrimes;
pub use bitset::{CompositeBitset, SegmentBits, WORD_BITS};
pub use config::{DEFAULT_NUM_THREADS, DEFAULT_SEGMENT_LEN, SieveConfig};
pub use engine::SieveEngine;
pub use error::{Result, SieveError};
pub use partition::{Segment, SegmentPartitioner};
pub use sink::{OutputSink, file_sink};
pub use worker::{ResultSlots, SieveWorker, WorkerState};
