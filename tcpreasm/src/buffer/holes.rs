//! Fixed-capacity hole list.
//!
//! A hole is a range of sequence numbers inside the buffered window that has
//! not been received yet. Each slot keeps its holes in an array of `M`
//! records threaded into two singly-linked lists by index:
//!
//! ```text
//!  entries: [ 0 ][ 1 ][ 2 ][ 3 ][ 4 ]
//!  used:  head -> 3 -> 0 -> 4 -> None    start descending, tail = lowest hole
//!  free:  head -> 1 -> 2 -> None
//! ```
//!
//! Nothing is allocated after construction. When the free list runs dry,
//! [`HoleList::add`] fails and the caller leaves the range unbuffered.

use crate::core::seq;
use crate::error::{Error, ErrorKind, Result};

/// Index of a record inside a [`HoleList`].
pub type HoleIndex = u8;

/// An inclusive range of missing sequence numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hole {
    /// First missing sequence number.
    pub start: u32,

    /// Last missing sequence number (inclusive).
    pub end: u32,
}

impl Hole {
    /// Number of missing bytes.
    pub const fn len(&self) -> usize {
        seq::span(self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy)]
struct HoleEntry {
    hole: Hole,
    next: Option<HoleIndex>,
}

/// Arena of `M` hole records with a free list and a used list.
#[derive(Debug)]
pub struct HoleList<const M: usize> {
    entries: [HoleEntry; M],
    free_head: Option<HoleIndex>,
    used_head: Option<HoleIndex>,
}

impl<const M: usize> HoleList<M> {
    const CAPACITY_OK: () = assert!(M > 0 && M <= HoleIndex::MAX as usize + 1);

    /// Creates a list with every record on the free list.
    pub fn new() -> Self {
        let () = Self::CAPACITY_OK;

        let mut list = Self {
            entries: [HoleEntry {
                hole: Hole { start: 0, end: 0 },
                next: None,
            }; M],
            free_head: None,
            used_head: None,
        };
        list.reset();
        list
    }

    /// Returns every record to the free list.
    pub fn reset(&mut self) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.next = if i + 1 < M {
                Some((i + 1) as HoleIndex)
            } else {
                None
            };
        }
        self.free_head = Some(0);
        self.used_head = None;
    }

    /// Returns the record capacity.
    #[inline]
    pub const fn capacity(&self) -> usize {
        M
    }

    /// Returns true if no hole is tracked.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.used_head.is_none()
    }

    /// Returns true if every record is in use.
    #[inline]
    pub const fn is_full(&self) -> bool {
        self.free_head.is_none()
    }

    /// Number of tracked holes.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Head of the used list (the highest hole).
    #[inline]
    pub fn head(&self) -> Option<HoleIndex> {
        self.used_head
    }

    /// Successor of `index` in whichever list it is linked into.
    #[inline]
    pub fn next(&self, index: HoleIndex) -> Option<HoleIndex> {
        self.entries[index as usize].next
    }

    /// The hole stored at `index`.
    #[inline]
    pub fn get(&self, index: HoleIndex) -> Hole {
        self.entries[index as usize].hole
    }

    /// Moves the start of the hole at `index` up.
    #[inline]
    pub fn set_start(&mut self, index: HoleIndex, start: u32) {
        self.entries[index as usize].hole.start = start;
    }

    /// Moves the end of the hole at `index` down.
    #[inline]
    pub fn set_end(&mut self, index: HoleIndex, end: u32) {
        self.entries[index as usize].hole.end = end;
    }

    /// The lowest hole, i.e. the tail of the used list.
    pub fn lowest(&self) -> Option<Hole> {
        self.iter().last()
    }

    /// Records the hole `start..=end`.
    ///
    /// The caller guarantees it neither overlaps nor touches a tracked hole.
    pub fn add(&mut self, start: u32, end: u32) -> Result<()> {
        let Some(index) = self.free_head else {
            return Err(Error::new(ErrorKind::HoleListFull));
        };
        self.free_head = self.entries[index as usize].next;
        self.entries[index as usize].hole = Hole { start, end };

        // Walk past every hole that starts above the new one.
        let mut predecessor = None;
        let mut successor = self.used_head;
        while let Some(i) = successor {
            if !seq::is_greater(self.entries[i as usize].hole.start, start) {
                break;
            }
            predecessor = Some(i);
            successor = self.entries[i as usize].next;
        }

        match predecessor {
            None => self.used_head = Some(index),
            Some(p) => self.entries[p as usize].next = Some(index),
        }
        self.entries[index as usize].next = successor;

        Ok(())
    }

    /// Unlinks `index` from the used list and frees its record.
    ///
    /// `predecessor` is the entry linking to `index`, `None` if `index` is
    /// the head.
    pub fn remove(&mut self, index: HoleIndex, predecessor: Option<HoleIndex>) {
        debug_assert!((index as usize) < M);

        let next = self.entries[index as usize].next;
        match predecessor {
            None => {
                debug_assert_eq!(self.used_head, Some(index));
                self.used_head = next;
            }
            Some(p) => {
                debug_assert_eq!(self.entries[p as usize].next, Some(index));
                self.entries[p as usize].next = next;
            }
        }

        self.entries[index as usize].next = self.free_head;
        self.free_head = Some(index);
    }

    /// Iterates the used holes, highest first.
    pub fn iter(&self) -> Iter<'_, M> {
        Iter {
            list: self,
            cursor: self.used_head,
        }
    }

    /// Copies the used holes into a vector, lowest first.
    pub fn snapshot(&self) -> heapless::Vec<Hole, M> {
        let mut holes: heapless::Vec<Hole, M> = self.iter().collect();
        holes.reverse();
        holes
    }
}

impl<const M: usize> Default for HoleList<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the used holes in descending order.
pub struct Iter<'a, const M: usize> {
    list: &'a HoleList<M>,
    cursor: Option<HoleIndex>,
}

impl<'a, const M: usize> Iterator for Iter<'a, M> {
    type Item = Hole;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        self.cursor = self.list.next(index);
        Some(self.list.get(index))
    }
}
