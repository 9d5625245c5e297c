//! Segment partitioning and claiming
//!
//! `[0, upper_lim]` is cut into fixed-length segments. Workers claim them one at a
//! time through `SegmentPartitioner::claim_next`; each claim hands out the segment's
//! bounds together with exclusive access to its words of the composite bitset.

use std::iter::Enumerate;
use std::slice::ChunksMut;

use parking_lot::Mutex;

use crate::bitset::{CompositeBitset, SegmentBits};

/// A claimed segment, owned by exactly one worker
#[derive(Debug)]
pub struct Segment<'a> {
    /// Position of the segment in `[0, upper_lim]`, used to index its result slot
    pub index: usize,
    pub bits: SegmentBits<'a>,
}

impl Segment<'_> {
    pub fn left(&self) -> usize {
        self.bits.left()
    }

    pub fn end(&self) -> usize {
        self.bits.end()
    }
}

struct Cursor<'a> {
    next_left: usize,
    chunks: Enumerate<ChunksMut<'a, u32>>,
    abandoned: bool,
}

/// Hands out segments in strictly increasing order, each exactly once
pub struct SegmentPartitioner<'a> {
    cursor: Mutex<Cursor<'a>>,
    segment_len: usize,
    segment_count: usize,
    upper_lim: usize,
}

impl<'a> SegmentPartitioner<'a> {
    /// `segment_len` must be a validated multiple of the bitset word width
    pub fn new(bitset: &'a mut CompositeBitset, segment_len: usize) -> Self {
        let upper_lim = bitset.upper_limit();
        Self {
            cursor: Mutex::new(Cursor {
                next_left: 0,
                chunks: bitset.segments_mut(segment_len).enumerate(),
                abandoned: false,
            }),
            segment_len,
            segment_count: upper_lim / segment_len + 1,
            upper_lim,
        }
    }

    /// Claim the next unprocessed segment.
    ///
    /// The lock is held only to read and advance the cursor. Once every segment has
    /// been handed out, or the run was abandoned, this returns `None` and changes
    /// nothing.
    pub fn claim_next(&self) -> Option<Segment<'a>> {
        let (index, left, words) = {
            let mut cursor = self.cursor.lock();
            if cursor.abandoned {
                return None;
            }
            let (index, words) = cursor.chunks.next()?;
            let left = cursor.next_left;
            cursor.next_left += self.segment_len;
            (index, left, words)
        };

        debug_assert_eq!(left, index * self.segment_len);
        let end = left
            .saturating_add(self.segment_len)
            .min(self.upper_lim.saturating_add(1));

        Some(Segment {
            index,
            bits: SegmentBits::new(left, end, words),
        })
    }

    /// Stop handing out segments. Segments already claimed are unaffected.
    pub fn abandon(&self) {
        self.cursor.lock().abandoned = true;
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Number of segments handed out so far
    pub fn claimed(&self) -> usize {
        let cursor = self.cursor.lock();
        cursor.next_left / self.segment_len
    }
}
