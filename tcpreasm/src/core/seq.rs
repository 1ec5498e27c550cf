//! Modular comparison of 32-bit TCP sequence numbers.
//!
//! Sequence numbers live in a cyclic space of period 2^32. Two numbers are
//! ordered by the sign of their wrapping difference, so `0x0000_0002` is
//! greater than `0xFFFF_FFF0`.
//!
//! # Example
//!
//! ```rust
//! use tcpreasm::core::seq;
//!
//! assert!(seq::is_greater(0x0000_0002, 0xFFFF_FFF0));
//! assert!(seq::is_lower(0xFFFF_FFF0, 0x0000_0002));
//! assert!(seq::is_lower_or_equal(7, 7));
//! ```
//!
//! Every comparison of sequence numbers in this crate goes through these
//! functions. Native `<`/`>` on sequence numbers is a bug.

/// Signed distance from `b` to `a`.
#[inline]
const fn diff(a: u32, b: u32) -> i32 {
    a.wrapping_sub(b) as i32
}

/// Returns true if `a` comes before `b`.
#[inline]
pub const fn is_lower(a: u32, b: u32) -> bool {
    diff(b, a) > 0
}

/// Returns true if `a` comes after `b`.
#[inline]
pub const fn is_greater(a: u32, b: u32) -> bool {
    diff(a, b) > 0
}

/// Returns true if `a` equals `b` or comes after it.
#[inline]
pub const fn is_greater_or_equal(a: u32, b: u32) -> bool {
    diff(a, b) >= 0
}

/// Returns true if `a` equals `b` or comes before it.
#[inline]
pub const fn is_lower_or_equal(a: u32, b: u32) -> bool {
    diff(b, a) >= 0
}

/// The later of two sequence numbers.
#[inline]
pub const fn max(a: u32, b: u32) -> u32 {
    if is_greater(a, b) { a } else { b }
}

/// The earlier of two sequence numbers.
#[inline]
pub const fn min(a: u32, b: u32) -> u32 {
    if is_lower(a, b) { a } else { b }
}

/// Number of sequence numbers in the inclusive range `start..=end`.
///
/// The caller guarantees `start <= end` in sequence space.
#[inline]
pub const fn span(start: u32, end: u32) -> usize {
    end.wrapping_sub(start) as usize + 1
}
