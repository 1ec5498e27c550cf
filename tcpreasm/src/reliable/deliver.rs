//! Handing the contiguous prefix to the upper layer.

use crate::buffer::RingBufferPool;
use crate::core::{seq, Segment};
use crate::engine::RecvCtrlBlock;
use crate::upper::UpperLayer;

/// What a prefix delivery handed up.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Bytes taken from the ring buffer.
    pub buffered: usize,

    /// Bytes taken straight from the triggering segment.
    pub direct: usize,

    /// Number of upper-layer calls.
    pub calls: usize,

    /// The connection's slot went back to the pool.
    pub released: bool,
}

impl Delivery {
    /// Total bytes handed up.
    pub const fn total(&self) -> usize {
        self.buffered + self.direct
    }
}

/// Delivers everything contiguous from `tcb.recv_nxt` on.
///
/// `direct` is the segment that was just merged and starts exactly at
/// `recv_nxt`. Its bytes beyond the buffered region (cut off by the buffer
/// size) are delivered from the segment itself. Never delivers more than
/// `recv_wnd` bytes. The slot is released once no hole is left and all
/// buffered bytes went up.
pub fn deliver<const S: usize, const N: usize, const M: usize, U: UpperLayer>(
    pool: &mut RingBufferPool<S, N, M>,
    tcb: &mut RecvCtrlBlock,
    direct: &Segment<'_>,
    upper: &mut U,
) -> Delivery {
    let Some(index) = tcb.slot else {
        return Delivery::default();
    };
    debug_assert_eq!(direct.seq, tcb.recv_nxt);

    let start = tcb.recv_nxt;
    let window = tcb.recv_wnd as usize;
    let slot = pool.slot_mut(index);

    let (end, beyond) = match slot.holes.lowest() {
        None => {
            let end = slot.ring.write_offset().wrapping_sub(1);
            let beyond = if !direct.is_empty() && seq::is_greater(direct.end(), end) {
                direct.end().wrapping_sub(end) as usize
            } else {
                0
            };
            (end, beyond)
        }
        Some(lowest) => (lowest.start.wrapping_sub(1), 0),
    };

    let available = if seq::is_lower(end, start) {
        0
    } else {
        seq::span(start, end)
    };
    let mut delivery = Delivery {
        buffered: core::cmp::min(available, window),
        ..Delivery::default()
    };
    if delivery.buffered == available {
        delivery.direct = core::cmp::min(beyond, window - delivery.buffered);
    }
    delivery.released = slot.holes.is_empty() && delivery.buffered == available;

    if delivery.buffered > 0 {
        let last = start.wrapping_add(delivery.buffered as u32).wrapping_sub(1);
        let (first, second) = slot.ring.slices(start, last);
        upper.deliver(tcb.socket_id, &tcb.remote, first);
        delivery.calls += 1;
        if !second.is_empty() {
            upper.deliver(tcb.socket_id, &tcb.remote, second);
            delivery.calls += 1;
        }
    }

    if delivery.direct > 0 {
        // The direct segment starts at `start`, so the first byte past the
        // buffered region sits at `available`.
        let from = available;
        upper.deliver(
            tcb.socket_id,
            &tcb.remote,
            &direct.payload[from..from + delivery.direct],
        );
        delivery.calls += 1;
    }

    tcb.advance(delivery.total());
    log::trace!(
        "Delivered {} buffered + {} direct bytes on socket {}, recv_nxt now {}",
        delivery.buffered,
        delivery.direct,
        tcb.socket_id,
        tcb.recv_nxt
    );

    if delivery.released {
        tcb.slot = None;
        if let Err(e) = pool.release(index) {
            log::warn!("Could not release slot {}: {}", index.index(), e);
        }
    } else {
        slot.ring.advance_base(tcb.recv_nxt);
    }

    delivery
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SlotIndex;
    use crate::upper::CollectingUpperLayer;

    fn tcb(recv_nxt: u32, recv_wnd: u16) -> RecvCtrlBlock {
        RecvCtrlBlock::new(1, "198.51.100.1:443".parse().unwrap(), recv_nxt, recv_wnd)
    }

    /// Acquires a slot anchored at `base` and hands it to `tcb`.
    fn attach(pool: &mut RingBufferPool<1, 8, 4>, tcb: &mut RecvCtrlBlock) -> SlotIndex {
        let index = pool.acquire().unwrap();
        pool.slot_mut(index).ring.rebase(tcb.recv_nxt);
        tcb.slot = Some(index);
        index
    }

    #[test]
    fn test_no_slot_is_noop() {
        let mut pool: RingBufferPool<1, 8, 4> = RingBufferPool::new();
        let mut tcb = tcb(10, 100);
        let mut upper: CollectingUpperLayer<16> = CollectingUpperLayer::new();

        let d = deliver(&mut pool, &mut tcb, &Segment::new(10, b"x"), &mut upper);

        assert_eq!(d, Delivery::default());
        assert_eq!(upper.calls(), 0);
    }

    #[test]
    fn test_up_to_lowest_hole() {
        let mut pool: RingBufferPool<1, 8, 4> = RingBufferPool::new();
        let mut tcb = tcb(10, 100);
        let index = attach(&mut pool, &mut tcb);
        {
            let slot = pool.slot_mut(index);
            slot.ring.copy_into(10, 14, b"abcde");
            slot.ring.set_write_offset(17);
            slot.holes.add(13, 14).unwrap();
        }
        let mut upper: CollectingUpperLayer<16> = CollectingUpperLayer::new();

        let d = deliver(&mut pool, &mut tcb, &Segment::new(10, b"abc"), &mut upper);

        assert_eq!(d.buffered, 3);
        assert_eq!(d.direct, 0);
        assert!(!d.released);
        assert_eq!(upper.data(), b"abc");
        assert_eq!(tcb.recv_nxt, 13);
        assert_eq!(tcb.recv_wnd, 97);
        assert_eq!(tcb.num_unack, 3);
        assert_eq!(tcb.ringbuffer_slot(), Some(index));
    }

    #[test]
    fn test_everything_with_direct_suffix() {
        let mut pool: RingBufferPool<1, 8, 4> = RingBufferPool::new();
        let mut tcb = tcb(10, 100);
        let index = attach(&mut pool, &mut tcb);
        {
            // The merge truncated the segment at the buffer end (17).
            let slot = pool.slot_mut(index);
            slot.ring.copy_into(10, 17, b"01234567");
            slot.ring.set_write_offset(18);
        }
        let mut upper: CollectingUpperLayer<16> = CollectingUpperLayer::new();

        let d = deliver(&mut pool, &mut tcb, &Segment::new(10, b"0123456789"), &mut upper);

        assert_eq!(d.buffered, 8);
        assert_eq!(d.direct, 2);
        assert!(d.released);
        assert_eq!(upper.data(), b"0123456789");
        assert_eq!(upper.calls(), 2);
        assert_eq!(tcb.recv_nxt, 20);
        assert_eq!(tcb.ringbuffer_slot(), None);
        assert!(!pool.is_owned(index));
    }

    #[test]
    fn test_split_at_ring_end() {
        let mut pool: RingBufferPool<1, 8, 4> = RingBufferPool::new();
        let mut tcb = tcb(10, 100);
        let index = attach(&mut pool, &mut tcb);
        {
            let slot = pool.slot_mut(index);
            slot.ring.rebase(4);
            slot.ring.copy_into(10, 14, b"VWXYZ");
            slot.ring.set_write_offset(15);
        }
        let mut upper: CollectingUpperLayer<16> = CollectingUpperLayer::new();

        let d = deliver(&mut pool, &mut tcb, &Segment::new(10, b"VW"), &mut upper);

        // Indices 6, 7 then 0, 1, 2
        assert_eq!(d.calls, 2);
        assert_eq!(upper.data(), b"VWXYZ");
        assert!(d.released);
    }

    #[test]
    fn test_clipped_to_window_keeps_slot() {
        let mut pool: RingBufferPool<1, 8, 4> = RingBufferPool::new();
        let mut tcb = tcb(10, 3);
        let index = attach(&mut pool, &mut tcb);
        {
            let slot = pool.slot_mut(index);
            slot.ring.copy_into(10, 14, b"abcde");
            slot.ring.set_write_offset(15);
        }
        let mut upper: CollectingUpperLayer<16> = CollectingUpperLayer::new();

        let d = deliver(&mut pool, &mut tcb, &Segment::new(10, b"abcdefg"), &mut upper);

        assert_eq!(d.total(), 3);
        assert!(!d.released);
        assert_eq!(upper.data(), b"abc");
        assert_eq!(tcb.recv_nxt, 13);
        assert_eq!(tcb.recv_wnd, 0);
        assert!(pool.is_owned(index));

        // Window reopens: the rest is still buffered.
        tcb.recv_wnd = 10;
        let d = deliver(&mut pool, &mut tcb, &Segment::new(13, b"de"), &mut upper);
        assert_eq!(d.total(), 2);
        assert!(d.released);
        assert_eq!(upper.data(), b"abcde");
    }

    #[test]
    fn test_base_advances_after_wrap() {
        let mut pool: RingBufferPool<1, 8, 4> = RingBufferPool::new();
        let mut tcb = tcb(10, 100);
        let index = attach(&mut pool, &mut tcb);
        {
            let slot = pool.slot_mut(index);
            slot.ring.copy_into(10, 17, b"ABCDEFGH");
            slot.ring.set_write_offset(20);
            slot.holes.add(18, 19).unwrap();
        }
        let mut upper: CollectingUpperLayer<16> = CollectingUpperLayer::new();

        deliver(&mut pool, &mut tcb, &Segment::new(10, b"A"), &mut upper);

        assert_eq!(tcb.recv_nxt, 18);
        assert_eq!(pool.base_offset(index), 18);
        assert_eq!(pool.slot(index).ring.index_of(18), 0);
    }
}
