//! Out-of-order reassembly mechanisms.
//!
//! This module provides the two steps run for every buffered segment:
//! - merge: Fill, split or shrink holes and copy the new bytes in
//! - deliver: Hand the contiguous prefix to the upper layer

mod deliver;
mod merge;

pub use deliver::{deliver, Delivery};
pub use merge::{merge, MergeReport, Overlap};
