//! Byte ranges into the input text, used to point diagnostics at the source.

use std::ops::Range;

/// A half-open byte range `start..end` into the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Create a new span from a byte range
    pub fn new(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end.max(range.start),
        }
    }

    /// Get the start offset of the span
    pub fn start(&self) -> usize {
        self.start
    }

    /// Get the end offset of the span
    pub fn end(&self) -> usize {
        self.end
    }

    /// Get the length of the span
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Create a union of two spans (encompassing both)
    pub fn union(&self, other: Span) -> Span {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Shift the span right by `offset` bytes.
    pub fn offset_by(&self, offset: usize) -> Span {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_accessors() {
        let span = Span::new(3..10);
        assert_eq!(span.start(), 3);
        assert_eq!(span.end(), 10);
        assert_eq!(span.len(), 7);
        assert!(!span.is_empty());
        assert!(Span::default().is_empty());
    }

    #[test]
    fn test_span_union() {
        let union = Span::new(10..20).union(Span::new(5..12));
        assert_eq!(union, Span::new(5..20));
    }

    #[test]
    fn test_span_offset_by() {
        assert_eq!(Span::new(1..4).offset_by(10), Span::new(11..14));
    }

    #[test]
    fn test_inverted_range_is_clamped() {
        #[allow(clippy::reversed_empty_ranges)]
        let span = Span::new(8..2);
        assert!(span.is_empty());
        assert_eq!(span.start(), 8);
    }
}
