//! Upper-layer delivery abstraction.
//!
//! The engine hands every newly contiguous byte range to an [`UpperLayer`].
//! Per received segment it calls `deliver` at most three times, always with
//! non-overlapping, sequence-increasing ranges that were never handed up
//! before.
//!
//! # Implementations
//!
//! - Any `FnMut(SocketId, &SocketAddr, &[u8])` closure
//! - `NullUpperLayer`: Discards all data
//! - `CollectingUpperLayer`: Appends into a fixed-capacity buffer (testing)
//!
//! # Example
//!
//! ```rust
//! use core::net::SocketAddr;
//! use tcpreasm::upper::{SocketId, UpperLayer};
//!
//! let mut total = 0;
//! let mut upper = |_: SocketId, _: &SocketAddr, data: &[u8]| total += data.len();
//! upper.deliver(1, &"10.0.0.1:80".parse().unwrap(), b"abc");
//! assert_eq!(total, 3);
//! ```

use core::net::SocketAddr;

/// Opaque socket identifier passed through to the upper layer.
pub type SocketId = u16;

/// Receiver of reassembled stream bytes.
pub trait UpperLayer {
    /// Accepts the next contiguous bytes of `socket`'s stream.
    fn deliver(&mut self, socket: SocketId, remote: &SocketAddr, data: &[u8]);
}

impl<F> UpperLayer for F
where
    F: FnMut(SocketId, &SocketAddr, &[u8]),
{
    fn deliver(&mut self, socket: SocketId, remote: &SocketAddr, data: &[u8]) {
        self(socket, remote, data)
    }
}

/// Upper layer that drops everything.
#[derive(Debug, Default)]
pub struct NullUpperLayer;

impl UpperLayer for NullUpperLayer {
    fn deliver(&mut self, _socket: SocketId, _remote: &SocketAddr, _data: &[u8]) {}
}

/// Upper layer that appends delivered bytes to a buffer of `C` bytes.
///
/// Bytes past the capacity are counted but not stored.
#[derive(Debug, Default)]
pub struct CollectingUpperLayer<const C: usize> {
    data: heapless::Vec<u8, C>,
    calls: usize,
    overflow: usize,
}

impl<const C: usize> CollectingUpperLayer<C> {
    /// Creates an empty collector.
    pub const fn new() -> Self {
        Self {
            data: heapless::Vec::new(),
            calls: 0,
            overflow: 0,
        }
    }

    /// Bytes collected so far.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of `deliver` calls.
    pub const fn calls(&self) -> usize {
        self.calls
    }

    /// Bytes that did not fit.
    pub const fn overflow(&self) -> usize {
        self.overflow
    }

    /// Forgets everything collected.
    pub fn clear(&mut self) {
        self.data.clear();
        self.calls = 0;
        self.overflow = 0;
    }
}

impl<const C: usize> UpperLayer for CollectingUpperLayer<C> {
    fn deliver(&mut self, _socket: SocketId, _remote: &SocketAddr, data: &[u8]) {
        self.calls += 1;

        let room = C - self.data.len();
        let take = core::cmp::min(room, data.len());
        // Cannot fail: `take` fits.
        let _ = self.data.extend_from_slice(&data[..take]);
        self.overflow += data.len() - take;
    }
}
