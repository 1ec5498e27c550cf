//! Pool of reassembly slots.
//!
//! A slot is one ring buffer plus its hole list. At most one connection owns
//! a slot at a time:
//!
//! ```text
//!  FREE --acquire--> IN_USE --release (no holes left)--> FREE
//!                      |
//!                      +------reset (teardown)---------> FREE
//! ```

use super::holes::{Hole, HoleList};
use super::ring::RingBuffer;
use crate::error::{Error, ErrorKind, Result};

/// Handle to a slot of a [`RingBufferPool`].
///
/// Only the pool hands these out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotIndex(u16);

impl SlotIndex {
    /// Position of the slot inside the pool.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One ring buffer together with its hole bookkeeping.
#[derive(Debug)]
pub struct Slot<const N: usize, const M: usize> {
    /// Buffered bytes.
    pub ring: RingBuffer<N>,

    /// Explicit holes below `ring.write_offset()`.
    pub holes: HoleList<M>,

    /// Whether a connection holds this slot.
    owned: bool,
}

impl<const N: usize, const M: usize> Slot<N, M> {
    fn new() -> Self {
        Self {
            ring: RingBuffer::new(),
            holes: HoleList::new(),
            owned: false,
        }
    }

    /// Returns true if a connection holds this slot.
    #[inline]
    pub const fn is_owned(&self) -> bool {
        self.owned
    }
}

/// Fixed set of `S` slots of `N` bytes and `M` hole records each.
#[derive(Debug)]
pub struct RingBufferPool<const S: usize, const N: usize, const M: usize> {
    slots: [Slot<N, M>; S],
}

impl<const S: usize, const N: usize, const M: usize> RingBufferPool<S, N, M> {
    const CAPACITY_OK: () = assert!(
        S > 0 && S <= u16::MAX as usize && N > 0 && N <= u16::MAX as usize
    );

    /// Creates a pool with every slot free.
    pub fn new() -> Self {
        let () = Self::CAPACITY_OK;

        Self {
            slots: core::array::from_fn(|_| Slot::new()),
        }
    }

    /// Frees every slot and clears all hole lists.
    pub fn init(&mut self) {
        for slot in &mut self.slots {
            slot.holes.reset();
            slot.owned = false;
        }
    }

    /// Number of slots in the pool.
    #[inline]
    pub const fn slot_count(&self) -> usize {
        S
    }

    /// Number of slots currently owned.
    pub fn in_use(&self) -> usize {
        self.slots.iter().filter(|s| s.owned).count()
    }

    /// Takes the first free slot, scanning in index order.
    ///
    /// A free slot never has holes; the caller seeds it.
    pub fn acquire(&mut self) -> Option<SlotIndex> {
        let (i, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, s)| !s.owned && s.holes.is_empty())?;

        slot.owned = true;
        log::debug!("Acquired reassembly slot {}", i);
        Some(SlotIndex(i as u16))
    }

    /// Returns a slot whose hole list is empty.
    pub fn release(&mut self, index: SlotIndex) -> Result<()> {
        let slot = &mut self.slots[index.index()];
        if !slot.owned {
            return Err(Error::new(ErrorKind::SlotNotOwned));
        }
        if !slot.holes.is_empty() {
            return Err(Error::new(ErrorKind::HolesOutstanding));
        }

        slot.owned = false;
        log::debug!("Released reassembly slot {}", index.index());
        Ok(())
    }

    /// Drops all hole state of a slot and frees it.
    ///
    /// Buffered bytes are not erased.
    pub fn reset(&mut self, index: SlotIndex) {
        let slot = &mut self.slots[index.index()];
        slot.holes.reset();
        slot.owned = false;
        log::debug!("Reset reassembly slot {}", index.index());
    }

    /// Returns true if the slot is held by a connection.
    pub fn is_owned(&self, index: SlotIndex) -> bool {
        self.slots[index.index()].owned
    }

    /// Sequence number mapped to index 0 of the slot's ring.
    pub fn base_offset(&self, index: SlotIndex) -> u32 {
        self.slots[index.index()].ring.base_offset()
    }

    /// First sequence number the slot has not buffered.
    pub fn write_offset(&self, index: SlotIndex) -> u32 {
        self.slots[index.index()].ring.write_offset()
    }

    /// Tracked holes of the slot, lowest first.
    pub fn holes(&self, index: SlotIndex) -> heapless::Vec<Hole, M> {
        self.slots[index.index()].holes.snapshot()
    }

    pub(crate) fn slot(&self, index: SlotIndex) -> &Slot<N, M> {
        &self.slots[index.index()]
    }

    pub(crate) fn slot_mut(&mut self, index: SlotIndex) -> &mut Slot<N, M> {
        &mut self.slots[index.index()]
    }
}

impl<const S: usize, const N: usize, const M: usize> Default for RingBufferPool<S, N, M> {
    fn default() -> Self {
        Self::new()
    }
}
