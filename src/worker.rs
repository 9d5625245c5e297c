//! Segment sieving workers
//!
//! Each worker loops claim → sieve → serialize until the partitioner runs dry.
//! Serialized segments are handed to `ResultSlots`, one slot per segment.

use std::mem;
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::base_primes::BasePrimes;
use crate::bitset::SegmentBits;
use crate::error::{Result, SieveError};
use crate::partition::{Segment, SegmentPartitioner};

/// Worker lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Claiming,
    Sieving,
    Serializing,
    Done,
}

/// Per-segment text buffers, indexed by segment number
pub struct ResultSlots {
    slots: Mutex<Vec<Vec<u8>>>,
}

impl ResultSlots {
    /// One empty slot per segment, reserved up front
    pub fn try_new(segment_count: usize) -> Result<Self> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(segment_count)
            .map_err(|_| SieveError::Allocation {
                what: "result slots",
                bytes: segment_count.saturating_mul(mem::size_of::<Vec<u8>>()),
            })?;
        slots.resize_with(segment_count, Vec::new);

        Ok(Self {
            slots: Mutex::new(slots),
        })
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a finished segment buffer. Only the owner of segment `index` calls this.
    pub fn install(&self, index: usize, buffer: Vec<u8>) {
        let mut slots = self.slots.lock();
        debug_assert!(slots[index].is_empty());
        slots[index] = buffer;
    }

    pub fn into_buffers(self) -> Vec<Vec<u8>> {
        self.slots.into_inner()
    }
}

/// Number of decimal digits of `n`
pub fn decimal_width(n: usize) -> usize {
    n.checked_ilog10().map_or(1, |log| log as usize + 1)
}

/// Monotonic digit-width tracker for an ascending scan
#[derive(Debug, Clone, Copy)]
pub struct DigitWidth {
    width: usize,
    next_boundary: Option<usize>,
}

impl DigitWidth {
    pub fn starting_at(n: usize) -> Self {
        let width = decimal_width(n);
        Self {
            width,
            next_boundary: 10_usize.checked_pow(width as u32),
        }
    }

    /// Width of `n`, which must not be below any number seen before
    pub fn advance_to(&mut self, n: usize) -> usize {
        while let Some(boundary) = self.next_boundary {
            if n < boundary {
                break;
            }
            self.width += 1;
            self.next_boundary = boundary.checked_mul(10);
        }
        self.width
    }
}

/// Reserve room for every odd candidate of the segment at its widest digit count
fn allocate_segment_buffer(bits: &SegmentBits<'_>) -> Result<Vec<u8>> {
    let span = bits.end() - bits.left();
    let candidates = span / 2 + 1;
    let bytes = candidates * (decimal_width(bits.end().saturating_sub(1)) + 1);

    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(bytes)
        .map_err(|_| SieveError::Allocation {
            what: "segment buffer",
            bytes,
        })?;
    Ok(buffer)
}

/// Write every surviving number `>= lower_lim` of the segment as decimal text, one
/// per line. Returns the buffer, trimmed to its length, and the number of primes.
pub fn serialize_segment(bits: &SegmentBits<'_>, lower_lim: usize) -> Result<(Vec<u8>, u64)> {
    let mut buffer = allocate_segment_buffer(bits)?;
    let mut digits = DigitWidth::starting_at(bits.left());
    let mut itoa_buf = itoa::Buffer::new();
    let mut count = 0;

    for num in bits.survivors().filter(|&n| n >= lower_lim) {
        let width = digits.advance_to(num);
        if buffer.capacity() - buffer.len() < width + 1 {
            buffer
                .try_reserve(width + 1)
                .map_err(|_| SieveError::Allocation {
                    what: "segment buffer",
                    bytes: buffer.len() + width + 1,
                })?;
        }

        let text = itoa_buf.format(num);
        debug_assert_eq!(text.len(), width);
        buffer.extend_from_slice(text.as_bytes());
        buffer.push(b'\n');
        count += 1;
    }

    buffer.shrink_to_fit();
    Ok((buffer, count))
}

/// One sieving thread's state
pub struct SieveWorker<'a, 'b> {
    id: usize,
    state: WorkerState,
    primes_found: u64,
    lower_lim: usize,
    base: &'b BasePrimes,
    partitioner: &'b SegmentPartitioner<'a>,
    slots: &'b ResultSlots,
}

impl<'a, 'b> SieveWorker<'a, 'b> {
    pub fn new(
        id: usize,
        lower_lim: usize,
        base: &'b BasePrimes,
        partitioner: &'b SegmentPartitioner<'a>,
        slots: &'b ResultSlots,
    ) -> Self {
        Self {
            id,
            state: WorkerState::Idle,
            primes_found: 0,
            lower_lim,
            base,
            partitioner,
            slots,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn primes_found(&self) -> u64 {
        self.primes_found
    }

    fn transition(&mut self, next: WorkerState) {
        trace!(worker = self.id, from = ?self.state, to = ?next, "worker transition");
        self.state = next;
    }

    /// Process segments until none are left. Returns this worker's prime count.
    ///
    /// A failing or panicking worker abandons the partitioner, so the other workers
    /// stop at their next claim.
    pub fn run(&mut self) -> Result<u64> {
        let _unwind = AbandonOnUnwind(self.partitioner);
        loop {
            self.transition(WorkerState::Claiming);
            let Some(segment) = self.partitioner.claim_next() else {
                self.transition(WorkerState::Done);
                return Ok(self.primes_found);
            };
            if let Err(e) = self.process(segment) {
                debug!(worker = self.id, error = %e, "worker failed, abandoning run");
                self.partitioner.abandon();
                self.transition(WorkerState::Done);
                return Err(e);
            }
        }
    }

    fn process(&mut self, mut segment: Segment<'a>) -> Result<()> {
        if segment.end() <= self.lower_lim {
            trace!(worker = self.id, segment = segment.index, "segment below lower limit");
            return Ok(());
        }

        self.transition(WorkerState::Sieving);
        segment.bits.mark_composites(self.base);

        self.transition(WorkerState::Serializing);
        let (buffer, count) = serialize_segment(&segment.bits, self.lower_lim)?;
        self.primes_found += count;
        trace!(
            worker = self.id,
            segment = segment.index,
            left = segment.left(),
            primes = count,
            "segment done"
        );
        self.slots.install(segment.index, buffer);
        Ok(())
    }
}

struct AbandonOnUnwind<'p, 'a>(&'p SegmentPartitioner<'a>);

impl Drop for AbandonOnUnwind<'_, '_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.abandon();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::CompositeBitset;

    #[test]
    fn test_decimal_width() {
        assert_eq!(decimal_width(0), 1);
        assert_eq!(decimal_width(9), 1);
        assert_eq!(decimal_width(10), 2);
        assert_eq!(decimal_width(999_999_999), 9);
        assert_eq!(decimal_width(1_000_000_000), 10);
        assert_eq!(decimal_width(usize::MAX), usize::MAX.to_string().len());
    }

    #[test]
    fn test_digit_width_crosses_power_of_ten() {
        let mut digits = DigitWidth::starting_at(960);
        assert_eq!(digits.advance_to(997), 3);
        assert_eq!(digits.advance_to(1009), 4);
        assert_eq!(digits.advance_to(1013), 4);
        assert_eq!(digits.advance_to(100_003), 6);

        let mut digits = DigitWidth::starting_at(usize::MAX - 10);
        assert_eq!(digits.advance_to(usize::MAX), decimal_width(usize::MAX));
    }

    #[test]
    fn test_serialize_segment_across_digit_boundary() {
        let upper = 1_100;
        let base = BasePrimes::new(upper);
        let mut bitset = CompositeBitset::with_upper_limit(upper, &base).unwrap();
        let words = bitset.segments_mut(128).nth(7).unwrap();

        let mut bits = SegmentBits::new(896, 1_024, words);
        bits.mark_composites(&base);
        let (buffer, count) = serialize_segment(&bits, 0).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let numbers: Vec<usize> = text.lines().map(|l| l.parse().unwrap()).collect();
        let expected: Vec<usize> = crate::reference::primes_in_range(896, 1_023);
        assert_eq!(numbers, expected);
        assert_eq!(count as usize, expected.len());
        assert!(text.contains("997\n1009\n"));
        assert!(text.ends_with("1021\n"));
    }

    #[test]
    fn test_serialize_respects_lower_limit() {
        let upper = 127;
        let base = BasePrimes::new(upper);
        let mut bitset = CompositeBitset::with_upper_limit(upper, &base).unwrap();
        let words = bitset.segments_mut(128).next().unwrap();

        let mut bits = SegmentBits::new(0, 128, words);
        bits.mark_composites(&base);
        let (buffer, count) = serialize_segment(&bits, 100).unwrap();

        assert_eq!(buffer, b"101\n103\n107\n109\n113\n127\n");
        assert_eq!(count, 6);
    }

    #[test]
    fn test_empty_segment_yields_empty_buffer() {
        let mut words = vec![u32::MAX; 1];
        let bits = SegmentBits::new(96, 128, &mut words);
        let (buffer, count) = serialize_segment(&bits, 0).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(count, 0);
    }

    #[test]
    fn test_worker_runs_until_exhausted() {
        let upper = 1_000;
        let base = BasePrimes::new(upper);
        let mut bitset = CompositeBitset::with_upper_limit(upper, &base).unwrap();
        let partitioner = SegmentPartitioner::new(&mut bitset, 64);
        let slots = ResultSlots::try_new(partitioner.segment_count()).unwrap();

        let mut worker = SieveWorker::new(0, 0, &base, &partitioner, &slots);
        assert_eq!(worker.state(), WorkerState::Idle);
        let found = worker.run().unwrap();

        assert_eq!(worker.state(), WorkerState::Done);
        // 168 primes up to 1000, minus 2 which is emitted separately
        assert_eq!(found, 167);
        assert_eq!(worker.primes_found(), 167);

        let buffers = slots.into_buffers();
        assert_eq!(buffers.len(), 16);
        assert!(buffers[0].starts_with(b"3\n5\n7\n11\n"));
    }

    #[test]
    fn test_result_slots_reserve_one_per_segment() {
        let slots = ResultSlots::try_new(16).unwrap();
        assert_eq!(slots.len(), 16);
        slots.install(3, b"7\n".to_vec());

        let buffers = slots.into_buffers();
        assert_eq!(buffers.len(), 16);
        assert_eq!(buffers[3], b"7\n");
        assert!(buffers.iter().enumerate().all(|(i, b)| i == 3 || b.is_empty()));
    }

    #[test]
    fn test_result_slots_report_allocation_failure() {
        let result = ResultSlots::try_new(usize::MAX);
        assert!(matches!(
            result,
            Err(SieveError::Allocation {
                what: "result slots",
                ..
            })
        ));
    }

    #[test]
    fn test_worker_stops_on_abandoned_partitioner() {
        let upper = 1_000;
        let base = BasePrimes::new(upper);
        let mut bitset = CompositeBitset::with_upper_limit(upper, &base).unwrap();
        let partitioner = SegmentPartitioner::new(&mut bitset, 64);
        let slots = ResultSlots::try_new(partitioner.segment_count()).unwrap();

        assert!(partitioner.claim_next().is_some());
        partitioner.abandon();

        let mut worker = SieveWorker::new(1, 0, &base, &partitioner, &slots);
        assert_eq!(worker.run().unwrap(), 0);
        assert_eq!(worker.state(), WorkerState::Done);
        assert_eq!(partitioner.claimed(), 1);
        assert!(slots.into_buffers().iter().all(Vec::is_empty));
    }

    #[test]
    fn test_panicking_worker_abandons_partitioner() {
        let upper = 1_000;
        let base = BasePrimes::new(upper);
        let mut bitset = CompositeBitset::with_upper_limit(upper, &base).unwrap();
        let partitioner = SegmentPartitioner::new(&mut bitset, 64);

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _unwind = AbandonOnUnwind(&partitioner);
            panic!("segment blew up");
        }));

        assert!(outcome.is_err());
        assert!(partitioner.claim_next().is_none());
        assert_eq!(partitioner.claimed(), 0);
    }
}
