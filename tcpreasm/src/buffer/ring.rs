//! Sequence-addressed ring buffer.
//!
//! The byte with sequence number `s` lives at index
//! `(s - base_offset) mod N`. `write_offset` is one past the highest
//! sequence number ever copied in; everything from there on is the implicit
//! trailing hole.

use crate::core::seq;

/// A fixed-size byte ring addressed by sequence number.
#[derive(Debug)]
pub struct RingBuffer<const N: usize> {
    /// The underlying storage.
    buffer: [u8; N],

    /// Sequence number mapped to index 0.
    base_offset: u32,

    /// First sequence number not yet buffered.
    write_offset: u32,
}

impl<const N: usize> RingBuffer<N> {
    /// Creates a zeroed ring buffer.
    pub const fn new() -> Self {
        Self {
            buffer: [0u8; N],
            base_offset: 0,
            write_offset: 0,
        }
    }

    /// Returns the buffer capacity.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Sequence number mapped to index 0.
    #[inline]
    pub const fn base_offset(&self) -> u32 {
        self.base_offset
    }

    /// First sequence number not yet buffered.
    #[inline]
    pub const fn write_offset(&self) -> u32 {
        self.write_offset
    }

    /// Anchors the buffer at `base` with nothing written yet.
    ///
    /// Byte contents are left as they are.
    pub fn rebase(&mut self, base: u32) {
        self.base_offset = base;
        self.write_offset = base;
    }

    pub fn set_write_offset(&mut self, offset: u32) {
        self.write_offset = offset;
    }

    /// Moves `base_offset` forward in steps of `N` until `next` maps to an
    /// index below `N` without wrapping.
    ///
    /// Called after the window has advanced to `next` so offsets stay
    /// within `2 * N` of the base.
    pub fn advance_base(&mut self, next: u32) {
        let lag = next.wrapping_sub(self.base_offset) as usize;
        if lag >= N {
            let steps = (lag / N) * N;
            self.base_offset = self.base_offset.wrapping_add(steps as u32);
        }
    }

    /// Buffer index of sequence number `offset`.
    #[inline]
    pub fn index_of(&self, offset: u32) -> usize {
        offset.wrapping_sub(self.base_offset) as usize % N
    }

    /// Copies `src` into the sequence range `start..=end`.
    ///
    /// `src` must hold exactly the bytes of that range.
    pub fn copy_into(&mut self, start: u32, end: u32, src: &[u8]) {
        let len = seq::span(start, end);
        debug_assert_eq!(len, src.len());
        debug_assert!(len <= N);

        let start_index = self.index_of(start);

        // Calculate how much we can write before wrapping
        let first_chunk = core::cmp::min(len, N - start_index);
        self.buffer[start_index..start_index + first_chunk].copy_from_slice(&src[..first_chunk]);

        // Handle wrap-around
        if len > first_chunk {
            let second_chunk = len - first_chunk;
            self.buffer[..second_chunk].copy_from_slice(&src[first_chunk..len]);
        }
    }

    /// Copies the sequence range `start..=end` into `dst`.
    ///
    /// Returns the number of bytes copied.
    pub fn copy_out(&self, start: u32, end: u32, dst: &mut [u8]) -> usize {
        let (first, second) = self.slices(start, end);
        let len = first.len() + second.len();
        debug_assert!(dst.len() >= len);

        dst[..first.len()].copy_from_slice(first);
        dst[first.len()..len].copy_from_slice(second);
        len
    }

    /// Returns the sequence range `start..=end` as at most two slices.
    ///
    /// The second slice is empty unless the range straddles index `N - 1`.
    pub fn slices(&self, start: u32, end: u32) -> (&[u8], &[u8]) {
        let len = seq::span(start, end);
        debug_assert!(len <= N);

        let start_index = self.index_of(start);
        if start_index + len <= N {
            // Data is contiguous
            (&self.buffer[start_index..start_index + len], &[])
        } else {
            // Data wraps around
            let first_len = N - start_index;
            (&self.buffer[start_index..], &self.buffer[..len - first_len])
        }
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
