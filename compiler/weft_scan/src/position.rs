//! Line/column positions recomputed from absolute byte offsets.

use memchr::memchr_iter;

/// A resolved source position.
///
/// Always recomputed from an absolute offset against the original
/// template text, never cached, which keeps positions correct when
/// nested scanners operate on resliced substrings.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Position {
    /// Absolute byte offset into the original source.
    pub offset: u32,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column (bytes from the last newline).
    pub column: u32,
}

impl Position {
    /// Resolve `offset` against `source`.
    ///
    /// Offsets past the end of `source` clamp to the end. Columns count
    /// bytes, which matches how the scanner addresses the input.
    pub fn of(source: &str, offset: u32) -> Position {
        let clamped = (offset as usize).min(source.len());
        let mut line = 1u32;
        let mut line_start = 0usize;
        for nl in memchr_iter(b'\n', source.as_bytes()) {
            if nl >= clamped {
                break;
            }
            line += 1;
            line_start = nl + 1;
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "scanner input is bounded to u32 offsets"
        )]
        Position {
            offset,
            line,
            column: (clamped - line_start) as u32 + 1,
        }
    }

    /// The full text of the line containing this position.
    pub fn line_text<'a>(&self, source: &'a str) -> &'a str {
        let clamped = (self.offset as usize).min(source.len());
        let start = source[..clamped].rfind('\n').map_or(0, |i| i + 1);
        let end = source[clamped..]
            .find('\n')
            .map_or(source.len(), |i| clamped + i);
        &source[start..end]
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
mod tests {
    use super::Position;
    use pretty_assertions::assert_eq;

    #[test]
    fn start_of_input() {
        let p = Position::of("hello", 0);
        assert_eq!((p.line, p.column), (1, 1));
    }

    #[test]
    fn middle_of_first_line() {
        let p = Position::of("hello", 3);
        assert_eq!((p.line, p.column), (1, 4));
    }

    #[test]
    fn after_newlines() {
        let src = "ab\ncd\nef";
        let p = Position::of(src, 7);
        assert_eq!((p.line, p.column), (3, 2));
    }

    #[test]
    fn at_newline_byte() {
        // The newline byte itself belongs to the line it terminates.
        let p = Position::of("ab\ncd", 2);
        assert_eq!((p.line, p.column), (1, 3));
    }

    #[test]
    fn offset_past_end_clamps() {
        let p = Position::of("ab\nc", 99);
        assert_eq!((p.line, p.column), (2, 2));
    }

    #[test]
    fn line_text_extracts_full_line() {
        let src = "one\ntwo three\nfour";
        let p = Position::of(src, 8);
        assert_eq!(p.line_text(src), "two three");
    }

    #[test]
    fn line_text_first_and_last_line() {
        let src = "one\ntwo";
        assert_eq!(Position::of(src, 1).line_text(src), "one");
        assert_eq!(Position::of(src, 5).line_text(src), "two");
    }

    #[test]
    fn display_is_line_colon_column() {
        let p = Position::of("a\nbc", 3);
        assert_eq!(p.to_string(), "2:2");
    }
}
