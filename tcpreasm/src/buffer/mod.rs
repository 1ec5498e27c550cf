//! Buffer management for out-of-order data.
//!
//! This module provides the fixed-capacity storage:
//! - RingBuffer: Sequence-addressed circular byte buffer
//! - HoleList: Index-linked free/used lists of missing ranges
//! - RingBufferPool: Slots handed out to connections

mod holes;
mod pool;
mod ring;

pub use holes::{Hole, HoleIndex, HoleList, Iter as HoleIter};
pub use pool::{RingBufferPool, Slot, SlotIndex};
pub use ring::RingBuffer;
