//! Core data structures for the reassembly engine.
//!
//! This module contains the building blocks every other part depends on:
//! - seq: Modular comparison of 32-bit sequence numbers
//! - Segment: Borrowed view of an incoming segment payload

pub mod seq;
mod segment;

pub use segment::Segment;
