//! # tcpreasm - TCP Out-of-Order Reassembly
//!
//! tcpreasm is a `no_std` receive-side reassembly engine for a small TCP/IP
//! stack. It provides:
//!
//! - **In-order fast path**: Segments at `recv_nxt` go straight to the upper layer
//! - **Out-of-order buffering**: Early segments are kept in a sequence-addressed ring buffer
//! - **Hole tracking**: Fixed-capacity lists of missing ranges per connection
//! - **Shared slot pool**: A bounded set of ring buffers shared by all connections
//! - **Sequence wraparound**: All comparisons are modulo 2^32
//!
//! No heap allocation takes place; every capacity is a const generic.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Upper Layer (Application)                │
//! ├─────────────────────────────────────────────────────────┤
//! │                   Reassembly Engine                      │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────┐   │
//! │  │  In-order   │ │   Merger    │ │ Prefix delivery │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────┘   │
//! ├─────────────────────────────────────────────────────────┤
//! │                    Slot Pool                             │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────┐   │
//! │  │ Ring buffer │ │  Hole list  │ │   Ownership     │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────┘   │
//! ├─────────────────────────────────────────────────────────┤
//! │              Sequence arithmetic (mod 2^32)              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use core::net::SocketAddr;
//! use tcpreasm::{DefaultEngine, RecvCtrlBlock, Segment, SocketId};
//!
//! let mut engine = DefaultEngine::with_defaults();
//! let mut tcb = RecvCtrlBlock::new(7, "192.0.2.1:443".parse().unwrap(), 1000, 8192);
//! let mut received = 0;
//! let mut upper = |_: SocketId, _: &SocketAddr, data: &[u8]| received += data.len();
//!
//! engine.receive_segment(&mut tcb, Segment::new(1005, b"world"), &mut upper);
//! engine.receive_segment(&mut tcb, Segment::new(1000, b"hello"), &mut upper);
//! assert_eq!(tcb.recv_nxt, 1010);
//! assert_eq!(received, 10);
//! ```

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod core;
pub mod buffer;
pub mod reliable;
pub mod engine;
pub mod upper;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use self::core::Segment;
pub use buffer::{Hole, RingBufferPool, SlotIndex};
pub use config::ReassemblyConfig;
pub use engine::{
    DropReason, ReassemblyEngine, ReassemblyStats, RecvCtrlBlock, SegmentOutcome,
};
pub use error::{Error, ErrorKind, Result};
pub use upper::{SocketId, UpperLayer};

/// Default number of ring buffers in the pool
pub const DEFAULT_RINGBUFFER_COUNT: usize = 4;

/// Default size of each ring buffer in bytes
pub const DEFAULT_RINGBUFFER_SIZE: usize = 4096;

/// Default number of hole records per ring buffer
pub const DEFAULT_HOLE_LIST_SIZE: usize = 8;

/// Engine with the default capacities
pub type DefaultEngine =
    ReassemblyEngine<DEFAULT_RINGBUFFER_COUNT, DEFAULT_RINGBUFFER_SIZE, DEFAULT_HOLE_LIST_SIZE>;
