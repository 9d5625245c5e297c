//! Bit-packed composite marks over `[0, upper_lim]`
//!
//! One bit per integer, packed into 32-bit words: bit `n % 32` of word `n / 32`
//! is set once `n` is known composite. Bits are never cleared.
//!
//! Segments start at multiples of the segment length, which is itself a multiple
//! of 32, so a segment always owns whole words and every word starts at an even
//! number. Odd numbers therefore sit at the odd bit offsets 1, 3, ..., 31 of every
//! word, at every segment boundary.

use std::slice::ChunksMut;

use crate::base_primes::BasePrimes;
use crate::error::{Result, SieveError};

/// Bits per bitset word
pub const WORD_BITS: usize = 32;

#[inline]
fn locate(n: usize) -> (usize, u32) {
    (n / WORD_BITS, 1_u32 << (n % WORD_BITS))
}

/// Composite bitset shared by all segments of a run
#[derive(Debug)]
pub struct CompositeBitset {
    words: Vec<u32>,
    upper_lim: usize,
}

impl CompositeBitset {
    /// Allocate the bitset and pre-seed it from the base prime table.
    ///
    /// 0 and 1 are marked, and so is every integer below isqrt(upper_lim) that is
    /// not a base prime. The remaining marks are made segment by segment.
    pub fn with_upper_limit(upper_lim: usize, base: &BasePrimes) -> Result<Self> {
        let word_count = upper_lim / WORD_BITS + 1;

        let mut words = Vec::new();
        words
            .try_reserve_exact(word_count)
            .map_err(|_| SieveError::Allocation {
                what: "composite bitset",
                bytes: word_count * std::mem::size_of::<u32>(),
            })?;
        words.resize(word_count, 0);

        let mut bitset = Self { words, upper_lim };

        // Neither zero nor one is prime
        bitset.words[0] |= 0b11;

        for n in 0..base.sqrt_limit() {
            if !base.contains(n) {
                bitset.mark(n);
            }
        }

        Ok(bitset)
    }

    #[inline]
    fn mark(&mut self, n: usize) {
        let (word, mask) = locate(n);
        self.words[word] |= mask;
    }

    pub fn is_composite(&self, n: usize) -> bool {
        let (word, mask) = locate(n);
        self.words[word] & mask != 0
    }

    pub fn upper_limit(&self) -> usize {
        self.upper_lim
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Split the words into disjoint per-segment views, lowest segment first.
    ///
    /// `segment_len` must already be validated as a non-zero multiple of `WORD_BITS`.
    pub fn segments_mut(&mut self, segment_len: usize) -> ChunksMut<'_, u32> {
        self.words.chunks_mut(segment_len / WORD_BITS)
    }
}

/// Exclusive view of one segment's words, covering `[left, end)`
#[derive(Debug)]
pub struct SegmentBits<'a> {
    left: usize,
    end: usize,
    words: &'a mut [u32],
}

impl<'a> SegmentBits<'a> {
    pub fn new(left: usize, end: usize, words: &'a mut [u32]) -> Self {
        debug_assert_eq!(left % WORD_BITS, 0);
        debug_assert!(end - left <= words.len() * WORD_BITS);
        Self { left, end, words }
    }

    pub fn left(&self) -> usize {
        self.left
    }

    /// One past the last number of the segment (already clamped to `upper_lim + 1`)
    pub fn end(&self) -> usize {
        self.end
    }

    #[inline]
    fn mark(&mut self, n: usize) {
        let (word, mask) = locate(n - self.left);
        self.words[word] |= mask;
    }

    pub fn is_marked(&self, n: usize) -> bool {
        let (word, mask) = locate(n - self.left);
        self.words[word] & mask != 0
    }

    /// Mark every odd multiple of every odd base prime inside the segment.
    ///
    /// Marking for `p` starts at `max(p * p, first odd multiple >= left)`: smaller
    /// multiples have a smaller prime factor that already marks them, and `p`
    /// itself is never marked.
    pub fn mark_composites(&mut self, base: &BasePrimes) {
        let (left, end) = (self.left, self.end);

        // Index 0 is 2; evens are never candidates
        for (&p, &stride) in base.primes().iter().zip(base.doubled()).skip(1) {
            let square = p * p;
            if square >= end {
                // Base primes are ascending, so no later prime reaches this segment either
                break;
            }

            let remainder = left % p;
            let mut loc = if remainder == 0 {
                left
            } else {
                left + (p - remainder)
            };
            if loc % 2 == 0 {
                loc += p;
            }
            loc = loc.max(square);

            while loc < end {
                self.mark(loc);
                loc += stride;
            }
        }
    }

    /// Unmarked odd numbers of the segment, ascending
    pub fn survivors(&self) -> impl Iterator<Item = usize> + '_ {
        let left = self.left;
        let end = self.end;
        self.words
            .iter()
            .enumerate()
            .flat_map(move |(word_idx, &word)| {
                let base = left + word_idx * WORD_BITS;
                (1..WORD_BITS)
                    .step_by(2)
                    .filter(move |&bit| word & (1_u32 << bit) == 0)
                    .map(move |bit| base + bit)
            })
            .take_while(move |&n| n < end)
    }
}
