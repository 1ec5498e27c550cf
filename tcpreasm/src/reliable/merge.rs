//! Merging a segment into a slot's buffered region.
//!
//! Bytes at or past `write_offset` extend the buffered region (opening a new
//! hole if they do not start right at it). Bytes below `write_offset` are
//! only copied where they fill a tracked hole; everything else there is
//! already buffered.

use crate::buffer::{Hole, HoleIndex, Slot};
use crate::core::{seq, Segment};

/// How a segment `start..=end` intersects a hole it overlaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    /// The segment covers the whole hole.
    Covers,

    /// The segment lies strictly inside the hole and cuts it in two.
    Splits,

    /// The segment covers the upper part of the hole.
    ShrinksEnd,

    /// The segment covers the lower part of the hole.
    ShrinksStart,
}

impl Overlap {
    /// Classifies an overlapping segment against `hole`.
    ///
    /// The caller guarantees `start <= hole.end` and `end >= hole.start`.
    pub fn classify(hole: Hole, start: u32, end: u32) -> Self {
        let covers_start = seq::is_lower_or_equal(start, hole.start);
        let covers_end = seq::is_greater_or_equal(end, hole.end);

        match (covers_start, covers_end) {
            (true, true) => Overlap::Covers,
            (false, false) => Overlap::Splits,
            (false, true) => Overlap::ShrinksEnd,
            (true, false) => Overlap::ShrinksStart,
        }
    }
}

/// What a merge did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    /// Bytes copied into the ring.
    pub copied: usize,

    /// A hole record was needed but none was free.
    pub exhausted: bool,
}

/// Merges `segment` into `slot`.
///
/// The segment is non-empty, starts at or after `recv_nxt` and has already
/// been truncated to the window and buffer.
pub fn merge<const N: usize, const M: usize>(
    slot: &mut Slot<N, M>,
    segment: &Segment<'_>,
) -> MergeReport {
    debug_assert!(!segment.is_empty());

    let start = segment.seq;
    let end = segment.end();
    let mut report = MergeReport::default();

    // Implicit trailing hole
    let write_offset = slot.ring.write_offset();
    if seq::is_greater_or_equal(end, write_offset) {
        if seq::is_greater(start, write_offset)
            && slot.holes.add(write_offset, start.wrapping_sub(1)).is_err()
        {
            log::warn!(
                "Hole list full, not buffering {}..={} (gap from {})",
                start,
                end,
                write_offset
            );
            report.exhausted = true;
            return report;
        }

        let copy_start = seq::max(start, write_offset);
        copy(slot, segment, copy_start, end, &mut report);
        slot.ring.set_write_offset(end.wrapping_add(1));
    }

    // Explicit holes, highest first. Stop at the first one ending below the
    // segment: all later ones do too.
    let mut prev: Option<HoleIndex> = None;
    let mut link = slot.holes.head();
    while let Some(index) = link {
        let hole = slot.holes.get(index);
        if seq::is_lower(hole.end, start) {
            break;
        }
        let next = slot.holes.next(index);

        if seq::is_lower(end, hole.start) {
            prev = Some(index);
            link = next;
            continue;
        }

        match Overlap::classify(hole, start, end) {
            Overlap::Covers => {
                slot.holes.remove(index, prev);
                link = next;
                copy(slot, segment, hole.start, hole.end, &mut report);
                // `prev` still links to `next`.
                continue;
            }
            Overlap::Splits => {
                if slot.holes.add(end.wrapping_add(1), hole.end).is_err() {
                    log::warn!(
                        "Hole list full, not splitting hole {}..={} at {}..={}",
                        hole.start,
                        hole.end,
                        start,
                        end
                    );
                    report.exhausted = true;
                    break;
                }
                slot.holes.set_end(index, start.wrapping_sub(1));
            }
            Overlap::ShrinksEnd => slot.holes.set_end(index, start.wrapping_sub(1)),
            Overlap::ShrinksStart => slot.holes.set_start(index, end.wrapping_add(1)),
        }

        let copy_start = seq::max(start, hole.start);
        let copy_end = seq::min(end, hole.end);
        copy(slot, segment, copy_start, copy_end, &mut report);

        prev = Some(index);
        link = next;
    }

    log::trace!(
        "Merged {}..={}: {} bytes copied, {} holes left",
        start,
        end,
        report.copied,
        slot.holes.len()
    );
    report
}

/// Copies the part `from..=to` of `segment` into the ring.
fn copy<const N: usize, const M: usize>(
    slot: &mut Slot<N, M>,
    segment: &Segment<'_>,
    from: u32,
    to: u32,
    report: &mut MergeReport,
) {
    let offset = from.wrapping_sub(segment.seq) as usize;
    let len = seq::span(from, to);
    slot.ring
        .copy_into(from, to, &segment.payload[offset..offset + len]);
    report.copied += len;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{RingBufferPool, SlotIndex};

    fn hole(start: u32, end: u32) -> Hole {
        Hole { start, end }
    }

    /// Slot anchored at `base` with bytes up to `write_offset - 1` seen.
    fn seeded(base: u32, write_offset: u32) -> (RingBufferPool<1, 32, 4>, SlotIndex) {
        let mut pool = RingBufferPool::new();
        let index = pool.acquire().unwrap();
        let slot = pool.slot_mut(index);
        slot.ring.rebase(base);
        slot.ring.set_write_offset(write_offset);
        (pool, index)
    }

    fn bytes(slot: &Slot<32, 4>, start: u32, end: u32) -> [u8; 32] {
        let mut out = [0u8; 32];
        slot.ring.copy_out(start, end, &mut out);
        out
    }

    #[test]
    fn test_classify() {
        let h = hole(10, 19);

        assert_eq!(Overlap::classify(h, 10, 19), Overlap::Covers);
        assert_eq!(Overlap::classify(h, 5, 25), Overlap::Covers);
        assert_eq!(Overlap::classify(h, 12, 15), Overlap::Splits);
        assert_eq!(Overlap::classify(h, 15, 25), Overlap::ShrinksEnd);
        assert_eq!(Overlap::classify(h, 11, 19), Overlap::ShrinksEnd);
        assert_eq!(Overlap::classify(h, 5, 12), Overlap::ShrinksStart);
        assert_eq!(Overlap::classify(h, 10, 18), Overlap::ShrinksStart);
    }

    #[test]
    fn test_classify_across_wrap() {
        let h = hole(0xFFFF_FFFC, 0x0000_0003);

        assert_eq!(Overlap::classify(h, 0xFFFF_FFFE, 0x0000_0001), Overlap::Splits);
        assert_eq!(Overlap::classify(h, 0xFFFF_FFF0, 0x0000_0001), Overlap::ShrinksStart);
    }

    #[test]
    fn test_extend_adjacent() {
        let (mut pool, index) = seeded(100, 104);
        let slot = pool.slot_mut(index);

        let report = merge(slot, &Segment::new(104, b"XYZ"));

        assert_eq!(report.copied, 3);
        assert_eq!(slot.ring.write_offset(), 107);
        assert!(slot.holes.is_empty());
        assert_eq!(&bytes(slot, 104, 106)[..3], b"XYZ");
    }

    #[test]
    fn test_extend_with_gap_adds_hole() {
        let (mut pool, index) = seeded(100, 104);
        let slot = pool.slot_mut(index);

        merge(slot, &Segment::new(110, b"AB"));

        assert_eq!(slot.ring.write_offset(), 112);
        assert_eq!(&slot.holes.snapshot()[..], &[hole(104, 109)]);
    }

    #[test]
    fn test_overlap_with_buffered_data_is_noop() {
        let (mut pool, index) = seeded(100, 110);
        let slot = pool.slot_mut(index);
        slot.holes.add(100, 101).unwrap();

        let report = merge(slot, &Segment::new(103, b"QQQ"));

        assert_eq!(report.copied, 0);
        assert_eq!(slot.ring.write_offset(), 110);
        assert_eq!(&slot.holes.snapshot()[..], &[hole(100, 101)]);
    }

    #[test]
    fn test_fill_removes_hole() {
        let (mut pool, index) = seeded(100, 120);
        let slot = pool.slot_mut(index);
        slot.holes.add(100, 102).unwrap();
        slot.holes.add(110, 111).unwrap();

        let report = merge(slot, &Segment::new(108, b"..AB.."));

        // Only the hole bytes are written.
        assert_eq!(report.copied, 2);
        assert_eq!(&slot.holes.snapshot()[..], &[hole(100, 102)]);
        assert_eq!(&bytes(slot, 110, 111)[..2], b"AB");
    }

    #[test]
    fn test_one_segment_fills_several_holes() {
        let (mut pool, index) = seeded(100, 120);
        let slot = pool.slot_mut(index);
        slot.holes.add(100, 101).unwrap();
        slot.holes.add(105, 106).unwrap();
        slot.holes.add(110, 111).unwrap();

        let report = merge(slot, &Segment::new(104, b"abcdefgh"));

        assert_eq!(report.copied, 4);
        assert_eq!(&slot.holes.snapshot()[..], &[hole(100, 101)]);
        assert_eq!(&bytes(slot, 105, 106)[..2], b"bc");
        assert_eq!(&bytes(slot, 110, 111)[..2], b"gh");
    }

    #[test]
    fn test_split() {
        let (mut pool, index) = seeded(100, 120);
        let slot = pool.slot_mut(index);
        slot.holes.add(100, 109).unwrap();

        merge(slot, &Segment::new(103, b"MID"));

        assert_eq!(&slot.holes.snapshot()[..], &[hole(100, 102), hole(106, 109)]);
        assert_eq!(&bytes(slot, 103, 105)[..3], b"MID");
    }

    #[test]
    fn test_shrink_end_and_start() {
        let (mut pool, index) = seeded(100, 130);
        let slot = pool.slot_mut(index);
        slot.holes.add(100, 104).unwrap();
        slot.holes.add(110, 114).unwrap();

        // Tail of the upper hole
        merge(slot, &Segment::new(113, b"TT"));
        // Head of the upper hole
        merge(slot, &Segment::new(108, b"HHH"));

        assert_eq!(&slot.holes.snapshot()[..], &[hole(100, 104), hole(111, 112)]);
        assert_eq!(&bytes(slot, 110, 110)[..1], b"H");
        assert_eq!(&bytes(slot, 113, 114)[..2], b"TT");
    }

    #[test]
    fn test_trailing_gap_without_free_record() {
        let mut pool: RingBufferPool<1, 32, 1> = RingBufferPool::new();
        let index = pool.acquire().unwrap();
        let slot = pool.slot_mut(index);
        slot.ring.rebase(100);
        slot.ring.set_write_offset(104);
        slot.holes.add(100, 101).unwrap();

        let report = merge(slot, &Segment::new(110, b"LOST"));

        assert!(report.exhausted);
        assert_eq!(report.copied, 0);
        assert_eq!(slot.ring.write_offset(), 104);
        assert_eq!(&slot.holes.snapshot()[..], &[hole(100, 101)]);
    }

    #[test]
    fn test_split_without_free_record() {
        let mut pool: RingBufferPool<1, 32, 1> = RingBufferPool::new();
        let index = pool.acquire().unwrap();
        let slot = pool.slot_mut(index);
        slot.ring.rebase(100);
        slot.ring.set_write_offset(120);
        slot.holes.add(100, 109).unwrap();

        let report = merge(slot, &Segment::new(103, b"MID"));

        assert!(report.exhausted);
        assert_eq!(report.copied, 0);
        assert_eq!(&slot.holes.snapshot()[..], &[hole(100, 109)]);
    }

    #[test]
    fn test_trailing_extension_and_hole_fill_together() {
        let (mut pool, index) = seeded(100, 106);
        let slot = pool.slot_mut(index);
        slot.holes.add(103, 104).unwrap();

        let report = merge(slot, &Segment::new(102, b"xABxyz"));

        assert_eq!(report.copied, 4);
        assert_eq!(slot.ring.write_offset(), 108);
        assert!(slot.holes.is_empty());
        assert_eq!(&bytes(slot, 103, 104)[..2], b"AB");
        assert_eq!(&bytes(slot, 106, 107)[..2], b"yz");
    }
}
