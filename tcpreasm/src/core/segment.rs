//! Borrowed view of an incoming TCP segment payload.

use super::seq;

/// Payload bytes of a received segment together with the sequence number
/// of the first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Sequence number of `payload[0]`.
    pub seq: u32,

    /// Payload bytes (TCP header already stripped).
    pub payload: &'a [u8],
}

impl<'a> Segment<'a> {
    /// Creates a segment view.
    pub const fn new(seq: u32, payload: &'a [u8]) -> Self {
        Self { seq, payload }
    }

    /// Returns the payload length.
    #[inline]
    pub const fn len(&self) -> usize {
        self.payload.len()
    }

    /// Returns true if the segment carries no payload.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Sequence number of the last payload byte.
    ///
    /// Only meaningful for non-empty segments.
    #[inline]
    pub const fn end(&self) -> u32 {
        self.seq.wrapping_add(self.payload.len() as u32).wrapping_sub(1)
    }

    /// Drops every byte before `from`.
    ///
    /// Returns an empty segment at `from` if nothing is left.
    pub fn trim_front(&self, from: u32) -> Segment<'a> {
        if seq::is_lower_or_equal(from, self.seq) {
            return *self;
        }

        let skip = from.wrapping_sub(self.seq) as usize;
        if skip >= self.payload.len() {
            Segment::new(from, &[])
        } else {
            Segment::new(from, &self.payload[skip..])
        }
    }

    /// Drops every byte after `limit_end`.
    ///
    /// Returns the shortened segment and the number of bytes cut off.
    pub fn truncate_back(&self, limit_end: u32) -> (Segment<'a>, usize) {
        if self.is_empty() || seq::is_lower_or_equal(self.end(), limit_end) {
            return (*self, 0);
        }
        if seq::is_lower(limit_end, self.seq) {
            return (Segment::new(self.seq, &[]), self.payload.len());
        }

        let keep = seq::span(self.seq, limit_end);
        (
            Segment::new(self.seq, &self.payload[..keep]),
            self.payload.len() - keep,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_wraps() {
        let seg = Segment::new(0xFFFF_FFFE, b"ABCD");
        assert_eq!(seg.end(), 1);
    }

    #[test]
    fn test_trim_front() {
        let seg = Segment::new(100, b"ABCDEF");

        assert_eq!(seg.trim_front(90), seg);
        assert_eq!(seg.trim_front(103), Segment::new(103, b"DEF"));
        assert!(seg.trim_front(106).is_empty());
        assert!(seg.trim_front(200).is_empty());
    }

    #[test]
    fn test_truncate_back() {
        let seg = Segment::new(100, b"ABCDEF");

        assert_eq!(seg.truncate_back(105), (seg, 0));
        assert_eq!(seg.truncate_back(102), (Segment::new(100, b"ABC"), 3));

        let (cut, dropped) = seg.truncate_back(50);
        assert!(cut.is_empty());
        assert_eq!(dropped, 6);
    }

    #[test]
    fn test_truncate_back_across_wrap() {
        let seg = Segment::new(0xFFFF_FFFE, b"ABCDEF");
        let (cut, dropped) = seg.truncate_back(0);
        assert_eq!(cut.payload, b"ABC");
        assert_eq!(dropped, 3);
    }
}
