//! Character-level scanner for the weft transpiler.
//!
//! The scanner is a byte cursor over template source with primitives for
//! breakpoint search ([`Scanner::find`]), balanced-enclosure skipping
//! ([`Scanner::skip_enclosed`]), and policy-controlled skipping of
//! whitespace, comments, strings, and regex literals inside a scan.
//!
//! A scanner instance is created per top-level input and per nested
//! sub-parse (attribute values, interpolations, tag-clause re-parses).
//! Nested scanners are built with [`Scanner::nested`] and share absolute
//! byte offsets with their parent, so every error position refers to the
//! original template text.
//!
//! Positions are never cached: [`Position::of`] recomputes line/column
//! from an absolute offset on demand.

mod error;
mod position;
mod scanner;

pub use error::{ScanError, ScanErrorKind};
pub use position::Position;
pub use scanner::{Found, Scanner, SkipPolicy};

/// Source location span in absolute byte offsets.
///
/// Layout: 8 bytes total; `end` is exclusive.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Create a new span.
    #[inline]
    pub fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// A zero-length span at `offset`.
    #[inline]
    pub fn at(offset: u32) -> Self {
        Span {
            start: offset,
            end: offset,
        }
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers zero bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

impl std::fmt::Debug for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
mod tests {
    use super::Span;
    use pretty_assertions::assert_eq;

    #[test]
    fn span_len_and_empty() {
        assert_eq!(Span::new(3, 9).len(), 6);
        assert!(Span::at(5).is_empty());
        assert!(!Span::new(5, 6).is_empty());
    }

    #[test]
    fn span_debug_is_range() {
        assert_eq!(format!("{:?}", Span::new(1, 4)), "1..4");
    }
}
