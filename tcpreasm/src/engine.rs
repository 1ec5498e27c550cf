//! Reassembly engine and main API.
//!
//! This module provides [`ReassemblyEngine`], which routes every data segment
//! of an established connection through the in-order fast path or the
//! out-of-order buffer and keeps the connection's receive state in step.

use core::net::SocketAddr;

use crate::buffer::{RingBufferPool, SlotIndex};
use crate::config::ReassemblyConfig;
use crate::core::{seq, Segment};
use crate::reliable::{deliver, merge};
use crate::upper::{SocketId, UpperLayer};

/// Receive-side fields of a TCP control block.
///
/// Owned by the connection; the engine reads and advances them.
#[derive(Debug, Clone)]
pub struct RecvCtrlBlock {
    /// Socket handed through to the upper layer.
    pub socket_id: SocketId,

    /// Peer address handed through to the upper layer.
    pub remote: SocketAddr,

    /// Next sequence number expected from the peer.
    pub recv_nxt: u32,

    /// Bytes the connection can still accept.
    pub recv_wnd: u16,

    /// Bytes received since the last acknowledgment.
    pub num_unack: u32,

    /// Reassembly slot held by this connection.
    pub(crate) slot: Option<SlotIndex>,
}

impl RecvCtrlBlock {
    /// Creates the receive state of a freshly established connection.
    pub fn new(socket_id: SocketId, remote: SocketAddr, recv_nxt: u32, recv_wnd: u16) -> Self {
        Self {
            socket_id,
            remote,
            recv_nxt,
            recv_wnd,
            num_unack: 0,
            slot: None,
        }
    }

    /// Reassembly slot currently held, if any.
    pub fn ringbuffer_slot(&self) -> Option<SlotIndex> {
        self.slot
    }

    /// Accounts for `len` bytes handed to the upper layer.
    pub(crate) fn advance(&mut self, len: usize) {
        debug_assert!(len <= self.recv_wnd as usize);
        self.recv_nxt = self.recv_nxt.wrapping_add(len as u32);
        self.recv_wnd -= len as u16;
        self.num_unack = self.num_unack.wrapping_add(len as u32);
    }
}

/// Why a segment was not used at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The receive window is closed.
    ZeroWindow,

    /// The segment starts past the window or buffer.
    OutsideWindow,

    /// No free slot for the first out-of-order segment.
    PoolExhausted,

    /// A hole record was needed and none was free.
    HoleListFull,

    /// Out-of-order reception is switched off.
    OutOfOrderDisabled,
}

/// Result of feeding one segment to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentOutcome {
    /// Bytes went to the upper layer.
    Delivered {
        /// Number of bytes delivered.
        bytes: usize,
    },

    /// New bytes were buffered; nothing is contiguous yet.
    Buffered,

    /// Nothing new in the segment.
    Duplicate,

    /// The segment was discarded.
    Dropped(DropReason),
}

/// Statistics about engine operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReassemblyStats {
    /// Segments passed to `receive_segment`.
    pub segments_received: u64,

    /// Segments taken by the in-order fast path.
    pub in_order_segments: u64,

    /// Segments that added bytes to a ring buffer.
    pub segments_buffered: u64,

    /// Segments carrying nothing new.
    pub duplicates: u64,

    /// Bytes handed to the upper layer.
    pub bytes_delivered: u64,

    /// Upper-layer calls.
    pub deliveries: u64,

    /// Bytes cut off at the window or buffer edge.
    pub bytes_truncated: u64,

    /// First out-of-order segments dropped for lack of a slot.
    pub pool_exhausted: u64,

    /// Merges that needed a hole record and found none.
    pub hole_list_exhausted: u64,

    /// Segments dropped outside the window.
    pub outside_window: u64,

    /// Segments dropped because out-of-order reception is off.
    pub out_of_order_dropped: u64,
}

/// Out-of-order reassembly engine.
///
/// Owns a pool of `S` slots of `N` bytes and `M` hole records each, shared
/// by all connections of one stack instance. Calls for one connection must
/// be serialized by the caller; `&mut self` confines the pool to one thread
/// at a time.
///
/// # Example
///
/// ```rust
/// use tcpreasm::engine::{RecvCtrlBlock, ReassemblyEngine, SegmentOutcome};
/// use tcpreasm::upper::CollectingUpperLayer;
/// use tcpreasm::{ReassemblyConfig, Segment};
///
/// let mut engine: ReassemblyEngine<2, 64, 4> = ReassemblyEngine::new(ReassemblyConfig::default());
/// let mut tcb = RecvCtrlBlock::new(1, "10.0.0.2:5000".parse().unwrap(), 100, 1024);
/// let mut upper: CollectingUpperLayer<64> = CollectingUpperLayer::new();
///
/// let outcome = engine.receive_segment(&mut tcb, Segment::new(103, b"DATA"), &mut upper);
/// assert_eq!(outcome, SegmentOutcome::Buffered);
///
/// engine.receive_segment(&mut tcb, Segment::new(100, b"ABC"), &mut upper);
/// assert_eq!(upper.data(), b"ABCDATA");
/// assert_eq!(tcb.recv_nxt, 107);
/// ```
#[derive(Debug)]
pub struct ReassemblyEngine<const S: usize, const N: usize, const M: usize> {
    /// Configuration.
    config: ReassemblyConfig,

    /// Ring buffers and hole lists.
    pool: RingBufferPool<S, N, M>,

    /// Engine statistics.
    stats: ReassemblyStats,
}

impl<const S: usize, const N: usize, const M: usize> ReassemblyEngine<S, N, M> {
    /// Creates an engine with every slot free.
    pub fn new(config: ReassemblyConfig) -> Self {
        Self {
            config,
            pool: RingBufferPool::new(),
            stats: ReassemblyStats::default(),
        }
    }

    /// Creates an engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ReassemblyConfig::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ReassemblyConfig {
        &self.config
    }

    /// Returns engine statistics.
    pub fn stats(&self) -> &ReassemblyStats {
        &self.stats
    }

    /// Returns the slot pool for inspection.
    pub fn pool(&self) -> &RingBufferPool<S, N, M> {
        &self.pool
    }

    /// Frees every slot and clears the statistics.
    ///
    /// Only valid while no connection holds a slot, i.e. at stack start.
    pub fn init(&mut self) {
        self.pool.init();
        self.stats = ReassemblyStats::default();
    }

    /// Drops the out-of-order state of a connection being torn down.
    ///
    /// Must run before the slot can serve another connection.
    pub fn reset(&mut self, tcb: &mut RecvCtrlBlock) {
        if let Some(index) = tcb.slot.take() {
            self.pool.reset(index);
        }
    }

    /// Processes the payload of a received segment.
    ///
    /// Never fails: data that cannot be kept is left to the peer's
    /// retransmission.
    pub fn receive_segment<U: UpperLayer>(
        &mut self,
        tcb: &mut RecvCtrlBlock,
        segment: Segment<'_>,
        upper: &mut U,
    ) -> SegmentOutcome {
        self.stats.segments_received += 1;

        if segment.is_empty() {
            self.stats.duplicates += 1;
            return SegmentOutcome::Duplicate;
        }
        if tcb.recv_wnd == 0 {
            self.stats.outside_window += 1;
            return SegmentOutcome::Dropped(DropReason::ZeroWindow);
        }

        if tcb.slot.is_none() && seq::is_lower_or_equal(segment.seq, tcb.recv_nxt) {
            return self.receive_in_order(tcb, &segment, upper);
        }

        if !self.config.out_of_order {
            self.stats.out_of_order_dropped += 1;
            log::trace!(
                "Out-of-order reception off, dropping {} on socket {}",
                segment.seq,
                tcb.socket_id
            );
            return SegmentOutcome::Dropped(DropReason::OutOfOrderDisabled);
        }

        // Only consider data not already passed to the upper layer
        let fresh = segment.trim_front(tcb.recv_nxt);
        if fresh.is_empty() {
            self.stats.duplicates += 1;
            return SegmentOutcome::Duplicate;
        }

        let limit = core::cmp::min(tcb.recv_wnd as usize, N);
        let limit_end = tcb.recv_nxt.wrapping_add(limit as u32).wrapping_sub(1);
        if seq::is_greater(fresh.seq, limit_end) {
            self.stats.outside_window += 1;
            log::trace!(
                "Segment {} beyond {} on socket {}, dropping",
                fresh.seq,
                limit_end,
                tcb.socket_id
            );
            return SegmentOutcome::Dropped(DropReason::OutsideWindow);
        }

        let (to_buffer, truncated) = fresh.truncate_back(limit_end);
        self.stats.bytes_truncated += truncated as u64;

        match tcb.slot {
            None => self.receive_first(tcb, &to_buffer),
            Some(index) => self.receive_buffered(tcb, index, &to_buffer, &fresh, upper),
        }
    }

    /// Delivers a segment that starts at or before `recv_nxt` while nothing
    /// is buffered.
    fn receive_in_order<U: UpperLayer>(
        &mut self,
        tcb: &mut RecvCtrlBlock,
        segment: &Segment<'_>,
        upper: &mut U,
    ) -> SegmentOutcome {
        let fresh = segment.trim_front(tcb.recv_nxt);
        if fresh.is_empty() {
            self.stats.duplicates += 1;
            return SegmentOutcome::Duplicate;
        }

        // Only accept as much as the window allows
        let len = core::cmp::min(fresh.len(), tcb.recv_wnd as usize);
        self.stats.bytes_truncated += (fresh.len() - len) as u64;

        upper.deliver(tcb.socket_id, &tcb.remote, &fresh.payload[..len]);
        tcb.advance(len);

        self.stats.in_order_segments += 1;
        self.stats.deliveries += 1;
        self.stats.bytes_delivered += len as u64;

        SegmentOutcome::Delivered { bytes: len }
    }

    /// Buffers the first out-of-order segment of a connection.
    fn receive_first(&mut self, tcb: &mut RecvCtrlBlock, segment: &Segment<'_>) -> SegmentOutcome {
        let Some(index) = self.pool.acquire() else {
            self.stats.pool_exhausted += 1;
            log::debug!(
                "No free reassembly slot, dropping {}..={} on socket {}",
                segment.seq,
                segment.end(),
                tcb.socket_id
            );
            return SegmentOutcome::Dropped(DropReason::PoolExhausted);
        };

        let slot = self.pool.slot_mut(index);
        slot.ring.rebase(tcb.recv_nxt);

        let seeded = slot.holes.add(tcb.recv_nxt, segment.seq.wrapping_sub(1));
        debug_assert!(seeded.is_ok(), "fresh hole list rejected its first hole");

        slot.ring.copy_into(segment.seq, segment.end(), segment.payload);
        slot.ring.set_write_offset(segment.end().wrapping_add(1));
        tcb.slot = Some(index);

        log::debug!(
            "Socket {} buffering from {} in slot {}, gap {}..={}",
            tcb.socket_id,
            segment.seq,
            index.index(),
            tcb.recv_nxt,
            segment.seq.wrapping_sub(1)
        );
        self.stats.segments_buffered += 1;
        SegmentOutcome::Buffered
    }

    /// Merges a segment into an existing slot and delivers what became
    /// contiguous.
    ///
    /// `to_buffer` is `fresh` truncated to the buffer; `fresh` keeps the
    /// bytes past it for direct delivery.
    fn receive_buffered<U: UpperLayer>(
        &mut self,
        tcb: &mut RecvCtrlBlock,
        index: SlotIndex,
        to_buffer: &Segment<'_>,
        fresh: &Segment<'_>,
        upper: &mut U,
    ) -> SegmentOutcome {
        let report = merge(self.pool.slot_mut(index), to_buffer);
        if report.exhausted {
            self.stats.hole_list_exhausted += 1;
        }
        if report.copied > 0 {
            self.stats.segments_buffered += 1;
        }

        // If the first byte of the lowest hole was filled
        if fresh.seq == tcb.recv_nxt {
            let delivery = deliver(&mut self.pool, tcb, fresh, upper);
            self.stats.deliveries += delivery.calls as u64;
            self.stats.bytes_delivered += delivery.total() as u64;

            if delivery.total() > 0 {
                return SegmentOutcome::Delivered {
                    bytes: delivery.total(),
                };
            }
        }

        if report.copied > 0 {
            SegmentOutcome::Buffered
        } else if report.exhausted {
            SegmentOutcome::Dropped(DropReason::HoleListFull)
        } else {
            self.stats.duplicates += 1;
            SegmentOutcome::Duplicate
        }
    }
}

impl<const S: usize, const N: usize, const M: usize> Default for ReassemblyEngine<S, N, M> {
    fn default() -> Self {
        Self::with_defaults()
    }
}
