//! The segmented sieve engine
//!
//! `SieveEngine::new` builds the base prime table and the pre-seeded composite
//! bitset on the calling thread. `get_primes` then runs the worker pool over every
//! segment and collates the per-segment buffers into the sink.

use std::thread;

use tracing::debug;

use crate::base_primes::BasePrimes;
use crate::bitset::CompositeBitset;
use crate::collate;
use crate::config::SieveConfig;
use crate::error::{Result, SieveError};
use crate::partition::SegmentPartitioner;
use crate::sink::OutputSink;
use crate::worker::{ResultSlots, SieveWorker};

pub struct SieveEngine {
    config: SieveConfig,
    base: BasePrimes,
    bitset: CompositeBitset,
    /// Taken by the first `sieve` call
    slots: Option<ResultSlots>,
    worker_counts: Vec<u64>,
}

impl SieveEngine {
    /// Validate the configuration and run the sequential setup
    pub fn new(config: SieveConfig) -> Result<Self> {
        config.validate()?;

        let base = BasePrimes::new(config.upper_lim);
        let bitset = CompositeBitset::with_upper_limit(config.upper_lim, &base)?;
        let slots = ResultSlots::try_new(config.segment_count())?;
        debug!(
            lower_lim = config.lower_lim,
            upper_lim = config.upper_lim,
            base_primes = base.len(),
            bitset_words = bitset.word_count(),
            segments = config.segment_count(),
            "sieve engine initialized"
        );

        Ok(Self {
            worker_counts: vec![0; config.num_threads],
            config,
            base,
            bitset,
            slots: Some(slots),
        })
    }

    pub fn bitset(&self) -> &CompositeBitset {
        &self.bitset
    }

    /// Whether 2 is emitted ahead of the segment output
    fn emits_two(&self) -> bool {
        self.config.lower_lim <= 2 && self.config.upper_lim >= 2
    }

    /// Sieve every segment with the worker pool and return the per-segment buffers,
    /// indexed by segment number. An engine sieves once.
    pub fn sieve(&mut self) -> Result<Vec<Vec<u8>>> {
        let slots = self.slots.take().ok_or(SieveError::AlreadySieved)?;
        let SieveConfig {
            lower_lim,
            num_threads,
            segment_len,
            ..
        } = self.config;

        let base = &self.base;
        let partitioner = SegmentPartitioner::new(&mut self.bitset, segment_len);
        debug_assert_eq!(slots.len(), partitioner.segment_count());

        let outcomes: Vec<Result<u64>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..num_threads)
                .map(|worker_id| {
                    let partitioner = &partitioner;
                    let slots = &slots;
                    thread::Builder::new()
                        .name(format!("sieve-worker-{}", worker_id))
                        .spawn_scoped(scope, move || {
                            SieveWorker::new(worker_id, lower_lim, base, partitioner, slots).run()
                        })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| match handle {
                    Ok(handle) => handle.join().unwrap_or_else(|panic| {
                        Err(SieveError::WorkerPanicked(panic_message(panic.as_ref())))
                    }),
                    Err(e) => Err(SieveError::from(e)),
                })
                .collect()
        });

        debug!(segments = partitioner.claimed(), "all workers joined");

        for (worker_id, outcome) in outcomes.into_iter().enumerate() {
            self.worker_counts[worker_id] = outcome?;
        }

        Ok(slots.into_buffers())
    }

    /// Compute every prime in `[lower_lim, upper_lim]` and write them, ascending, to `sink`
    pub fn get_primes<S>(&mut self, sink: &mut S) -> Result<()>
    where
        S: OutputSink + ?Sized,
    {
        let buffers = self.sieve()?;
        collate::collate(buffers, self.emits_two(), sink)?;
        debug!(primes = self.prime_count(), "collation finished");
        Ok(())
    }

    /// Primes found by each worker, excluding the separately emitted 2
    pub fn worker_counts(&self) -> &[u64] {
        &self.worker_counts
    }

    /// Total number of primes written by `get_primes`
    pub fn prime_count(&self) -> u64 {
        self.worker_counts.iter().sum::<u64>() + u64::from(self.emits_two())
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
