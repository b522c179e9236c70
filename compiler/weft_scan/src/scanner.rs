//! The scanner: a byte cursor with mode-aware skipping primitives.
//!
//! The main dispatch surface is [`Scanner::find`], which scans forward to
//! a breakpoint byte while treating strings, comments, and regex literals
//! as opaque units per the active [`SkipPolicy`], and
//! [`Scanner::skip_enclosed`], which performs a balanced `{`/`[`/`(` skip.
//!
//! The index only advances, with two exceptions: bounded lookbehind into
//! already-scanned text ([`Scanner::could_start_regexp`]) and backtracking
//! within a single speculative match attempt (a non-forced `find` that
//! reaches end-of-input restores its start position).

use bitflags::bitflags;

use crate::{ScanError, ScanErrorKind, Span};

bitflags! {
    /// Which constructs a scan treats as opaque.
    ///
    /// `WHITESPACE` trims leading spaces/tabs off the returned prefix;
    /// the other flags prevent breakpoints from matching inside the
    /// named construct.
    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    pub struct SkipPolicy: u8 {
        const WHITESPACE = 1 << 0;
        const COMMENTS = 1 << 1;
        const STRINGS = 1 << 2;
        const REGEX = 1 << 3;

        /// Everything host-language code needs skipped.
        const CODE = Self::COMMENTS.bits() | Self::STRINGS.bits() | Self::REGEX.bits();
        /// `CODE` plus leading-whitespace trimming.
        const CODE_WS = Self::CODE.bits() | Self::WHITESPACE.bits();
    }
}

/// Result of a successful [`Scanner::find`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Found<'a> {
    /// Everything consumed before the breakpoint (leading whitespace
    /// trimmed when the policy requests it). Skipped strings, comments,
    /// and regex bodies remain part of the prefix.
    pub prefix: &'a str,
    /// The breakpoint byte. The scanner is positioned ON this byte.
    pub stop: u8,
}

/// Identifier-ish byte: letter, digit, `_`, or `$`.
#[inline]
pub(crate) fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// A byte cursor over one input region.
///
/// Created per top-level input ([`Scanner::new`]) and per nested
/// sub-parse ([`Scanner::nested`]). All reported spans are absolute:
/// `base + relative position`.
#[derive(Clone, Debug)]
pub struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    base: u32,
}

impl<'a> Scanner<'a> {
    /// Scanner over a top-level input.
    pub fn new(src: &'a str) -> Self {
        Scanner { src, pos: 0, base: 0 }
    }

    /// Scanner over a reslice of the original input.
    ///
    /// `base` is the absolute byte offset of `src[0]` in the original
    /// template, so error spans stay correct across sub-parses.
    pub fn nested(src: &'a str, base: u32) -> Self {
        Scanner { src, pos: 0, base }
    }

    /// Absolute byte offset of the current position.
    #[inline]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "scanner inputs are bounded to u32 offsets"
    )]
    pub fn abs(&self) -> u32 {
        self.base + self.pos as u32
    }

    /// Zero-length span at the current position.
    #[inline]
    pub fn here(&self) -> Span {
        Span::at(self.abs())
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// The byte at the current position, or `0` at end-of-input.
    #[inline]
    pub fn current(&self) -> u8 {
        self.src.as_bytes().get(self.pos).copied().unwrap_or(0)
    }

    /// The byte `n` positions ahead, or `0` past end-of-input.
    #[inline]
    pub fn peek_at(&self, n: usize) -> u8 {
        self.src.as_bytes().get(self.pos + n).copied().unwrap_or(0)
    }

    /// The byte one position ahead.
    #[inline]
    pub fn peek(&self) -> u8 {
        self.peek_at(1)
    }

    /// Consume and return the current byte; `0` at end-of-input.
    #[inline]
    pub fn read(&mut self) -> u8 {
        let b = self.current();
        if b != 0 || self.pos < self.src.len() {
            self.pos += 1;
        }
        b
    }

    /// Advance by `n` bytes (clamped to end-of-input).
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.src.len());
    }

    /// Everything from the current position to end-of-input.
    #[inline]
    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Whether the input continues with `needle` at the current position.
    #[inline]
    pub fn starts_with(&self, needle: &str) -> bool {
        self.src[self.pos..].starts_with(needle)
    }

    /// Require `expected` at the current position and consume it.
    pub fn expect(&mut self, expected: u8) -> Result<(), ScanError> {
        let found = self.current();
        if found == expected {
            self.pos += 1;
            Ok(())
        } else {
            Err(ScanError::new(
                ScanErrorKind::UnexpectedChar { expected, found },
                self.here(),
            ))
        }
    }

    /// Consume horizontal whitespace (spaces and tabs).
    pub fn skip_ws(&mut self) {
        while matches!(self.current(), b' ' | b'\t') {
            self.pos += 1;
        }
    }

    /// Consume whitespace including newlines.
    pub fn skip_ws_and_newlines(&mut self) {
        while matches!(self.current(), b' ' | b'\t' | b'\n' | b'\r') {
            self.pos += 1;
        }
    }

    /// Consume bytes while `pred` holds, returning the consumed slice.
    pub fn read_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while !self.is_eof() && pred(self.current()) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// Consume an identifier (`[A-Za-z_$][A-Za-z0-9_$]*`), empty if the
    /// current byte cannot start one.
    pub fn read_ident(&mut self) -> &'a str {
        if self.current().is_ascii_digit() {
            return "";
        }
        self.read_while(is_ident_byte)
    }

    /// Consume a name, allowing `extra` bytes after the first character
    /// (tag and attribute names permit `-`).
    pub fn read_name(&mut self, extra: &[u8]) -> &'a str {
        let start = self.pos;
        if !is_ident_byte(self.current()) || self.current().is_ascii_digit() {
            return "";
        }
        self.pos += 1;
        while is_ident_byte(self.current()) || extra.contains(&self.current()) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// Scan forward to the nearest breakpoint byte.
    ///
    /// Constructs named by `policy` are skipped as opaque units: a
    /// breakpoint inside a string, comment, or regex literal does not
    /// stop the scan. On a match the scanner rests ON the breakpoint
    /// byte and the prefix covers everything consumed before it.
    ///
    /// With `force`, reaching end-of-input is a fatal
    /// [`ScanErrorKind::UnexpectedEof`]; without it the position is
    /// restored and `Ok(None)` is returned.
    pub fn find(
        &mut self,
        breakpoints: &[u8],
        force: bool,
        policy: SkipPolicy,
    ) -> Result<Option<Found<'a>>, ScanError> {
        let start = self.pos;
        if policy.contains(SkipPolicy::WHITESPACE) {
            self.skip_ws();
        }
        let content_start = self.pos;
        loop {
            if self.is_eof() {
                if force {
                    return Err(ScanError::new(ScanErrorKind::UnexpectedEof, self.here()));
                }
                self.pos = start;
                return Ok(None);
            }
            let c = self.current();
            if c == b'/' && policy.contains(SkipPolicy::COMMENTS) && matches!(self.peek(), b'/' | b'*') {
                self.skip_comment()?;
                continue;
            }
            if policy.contains(SkipPolicy::STRINGS) && matches!(c, b'"' | b'\'' | b'`') {
                self.skip_string()?;
                continue;
            }
            if c == b'/'
                && policy.contains(SkipPolicy::REGEX)
                && !breakpoints.contains(&b'/')
                && self.could_start_regexp()
            {
                self.skip_regex()?;
                continue;
            }
            if breakpoints.contains(&c) {
                return Ok(Some(Found {
                    prefix: &self.src[content_start..self.pos],
                    stop: c,
                }));
            }
            self.pos += 1;
        }
    }

    /// Skip a string literal. The current byte must be `"`, `'`, or
    /// a backtick. Single- and double-quoted strings may not span lines;
    /// backtick strings may, and their `${ }` interpolations are skipped
    /// with full balance tracking.
    ///
    /// An unterminated string is fatal at the opening quote.
    pub fn skip_string(&mut self) -> Result<(), ScanError> {
        let open = self.abs();
        let quote = self.current();
        debug_assert!(matches!(quote, b'"' | b'\'' | b'`'));
        self.pos += 1;
        loop {
            match self.current() {
                0 if self.is_eof() => {
                    return Err(ScanError::new(
                        ScanErrorKind::UnterminatedString,
                        Span::new(open, open + 1),
                    ));
                }
                c if c == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                b'\\' => {
                    self.pos += 1;
                    if !self.is_eof() {
                        self.pos += 1;
                    }
                }
                b'\n' | b'\r' if quote != b'`' => {
                    return Err(ScanError::new(
                        ScanErrorKind::UnterminatedString,
                        Span::new(open, open + 1),
                    ));
                }
                b'$' if quote == b'`' && self.peek() == b'{' => {
                    self.pos += 1;
                    self.skip_enclosed(false)?;
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Skip a `//` or `/* */` comment. The current byte must be `/` with
    /// a `/` or `*` following. A line comment stops BEFORE the newline
    /// so that newline breakpoints remain visible to the caller.
    ///
    /// An unterminated block comment is fatal at its `/*`.
    pub fn skip_comment(&mut self) -> Result<(), ScanError> {
        let open = self.abs();
        debug_assert_eq!(self.current(), b'/');
        let block = self.peek() == b'*';
        self.pos += 2;
        if block {
            let hay = &self.src.as_bytes()[self.pos..];
            match memchr::memmem::find(hay, b"*/") {
                Some(i) => {
                    self.pos += i + 2;
                    Ok(())
                }
                None => Err(ScanError::new(
                    ScanErrorKind::UnterminatedComment,
                    Span::new(open, open + 2),
                )),
            }
        } else {
            let hay = &self.src.as_bytes()[self.pos..];
            match memchr::memchr(b'\n', hay) {
                Some(i) => self.pos += i,
                None => self.pos = self.src.len(),
            }
            Ok(())
        }
    }

    /// Skip a regex literal, honoring escapes and character classes
    /// (`/` inside `[...]` does not close the literal). Trailing flag
    /// letters are consumed. The current byte must be `/`.
    ///
    /// A newline or end-of-input inside the body is fatal at the
    /// opening `/`.
    pub fn skip_regex(&mut self) -> Result<(), ScanError> {
        let open = self.abs();
        debug_assert_eq!(self.current(), b'/');
        self.pos += 1;
        let mut in_class = false;
        loop {
            match self.current() {
                0 if self.is_eof() => {
                    return Err(ScanError::new(
                        ScanErrorKind::UnterminatedRegex,
                        Span::new(open, open + 1),
                    ));
                }
                b'\n' | b'\r' => {
                    return Err(ScanError::new(
                        ScanErrorKind::UnterminatedRegex,
                        Span::new(open, open + 1),
                    ));
                }
                b'\\' => {
                    self.pos += 1;
                    if !self.is_eof() {
                        self.pos += 1;
                    }
                }
                b'[' => {
                    in_class = true;
                    self.pos += 1;
                }
                b']' => {
                    in_class = false;
                    self.pos += 1;
                }
                b'/' if !in_class => {
                    self.pos += 1;
                    while is_ident_byte(self.current()) {
                        self.pos += 1;
                    }
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Heuristic: does a `/` at the current position open a regex
    /// literal (vs. division/modulo)?
    ///
    /// True when the previous significant token is undefined, is not an
    /// identifier/number/closing-bracket/string-terminator, is one of a
    /// fixed keyword set, or follows a `)` whose matching `(` belongs to
    /// an `if`/`while`/`for`/`with` head. Misclassification here corrupts
    /// everything downstream, so the lookbehind walks real token text
    /// rather than guessing from the single previous byte.
    pub fn could_start_regexp(&self) -> bool {
        let b = self.src.as_bytes();
        let mut i = self.pos;
        while i > 0 && matches!(b[i - 1], b' ' | b'\t' | b'\n' | b'\r') {
            i -= 1;
        }
        if i == 0 {
            return true;
        }
        let c = b[i - 1];
        if c == b')' {
            // Walk back to the matching `(`, then inspect the word
            // before it. `if (x) /re/` is a regex; `f(x) / 2` is not.
            let mut depth = 1u32;
            let mut j = i - 1;
            while j > 0 && depth > 0 {
                j -= 1;
                match b[j] {
                    b')' => depth += 1,
                    b'(' => depth -= 1,
                    _ => {}
                }
            }
            if depth != 0 {
                return false;
            }
            let mut k = j;
            while k > 0 && matches!(b[k - 1], b' ' | b'\t') {
                k -= 1;
            }
            let end = k;
            while k > 0 && is_ident_byte(b[k - 1]) {
                k -= 1;
            }
            return matches!(&self.src[k..end], "if" | "while" | "for" | "with");
        }
        if c == b']' || c == b'"' || c == b'\'' || c == b'`' {
            return false;
        }
        if is_ident_byte(c) {
            let end = i;
            let mut k = i;
            while k > 0 && is_ident_byte(b[k - 1]) {
                k -= 1;
            }
            let word = &self.src[k..end];
            if word.as_bytes()[0].is_ascii_digit() {
                return false; // number: division
            }
            return matches!(
                word,
                "return" | "throw" | "typeof" | "instanceof" | "new" | "delete" | "in" | "else"
            );
        }
        true
    }

    /// Balanced skip of a `{`/`[`/`(` enclosure, ignoring delimiters
    /// found inside strings, comments, and regex literals. Returns the
    /// consumed span, with the outer brackets trimmed when `trim` is set.
    ///
    /// Running out of input is fatal at the opening bracket; a closing
    /// bracket of the wrong kind is fatal at its own position.
    pub fn skip_enclosed(&mut self, trim: bool) -> Result<&'a str, ScanError> {
        let open_abs = self.abs();
        let open = self.current();
        let close = match open {
            b'{' => b'}',
            b'[' => b']',
            b'(' => b')',
            found => {
                return Err(ScanError::new(
                    ScanErrorKind::UnexpectedChar {
                        expected: b'{',
                        found,
                    },
                    self.here(),
                ));
            }
        };
        let start = self.pos;
        self.pos += 1;
        let mut stack: Vec<u8> = Vec::new();
        loop {
            if self.is_eof() {
                return Err(ScanError::new(
                    ScanErrorKind::UnterminatedEnclosure,
                    Span::new(open_abs, open_abs + 1),
                ));
            }
            match self.current() {
                b'"' | b'\'' | b'`' => self.skip_string()?,
                b'/' if matches!(self.peek(), b'/' | b'*') => self.skip_comment()?,
                b'/' if self.could_start_regexp() => self.skip_regex()?,
                c @ (b'{' | b'[' | b'(') => {
                    stack.push(match c {
                        b'{' => b'}',
                        b'[' => b']',
                        _ => b')',
                    });
                    self.pos += 1;
                }
                c @ (b'}' | b']' | b')') => {
                    if let Some(expected) = stack.pop() {
                        if expected != c {
                            return Err(ScanError::new(
                                ScanErrorKind::MismatchedBracket { expected, found: c },
                                self.here(),
                            ));
                        }
                        self.pos += 1;
                    } else if c == close {
                        self.pos += 1;
                        break;
                    } else {
                        return Err(ScanError::new(
                            ScanErrorKind::MismatchedBracket {
                                expected: close,
                                found: c,
                            },
                            self.here(),
                        ));
                    }
                }
                _ => self.pos += 1,
            }
        }
        let full = &self.src[start..self.pos];
        Ok(if trim { &full[1..full.len() - 1] } else { full })
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan(src: &str) -> Scanner<'_> {
        Scanner::new(src)
    }

    // === Basic navigation ===

    #[test]
    fn read_advances_and_returns() {
        let mut s = scan("ab");
        assert_eq!(s.read(), b'a');
        assert_eq!(s.read(), b'b');
        assert_eq!(s.read(), 0);
        assert!(s.is_eof());
    }

    #[test]
    fn peek_does_not_advance() {
        let s = scan("ab");
        assert_eq!(s.peek(), b'b');
        assert_eq!(s.current(), b'a');
    }

    #[test]
    fn expect_matches_and_consumes() {
        let mut s = scan("<x");
        s.expect(b'<').map_err(|e| e.to_string()).ok();
        assert_eq!(s.current(), b'x');
    }

    #[test]
    fn expect_mismatch_reports_position() {
        let mut s = scan("ab");
        s.advance(1);
        let err = s.expect(b'>').err();
        let err = err.expect("must fail");
        assert_eq!(err.span.start, 1);
        assert_eq!(
            err.kind,
            ScanErrorKind::UnexpectedChar {
                expected: b'>',
                found: b'b'
            }
        );
    }

    #[test]
    fn nested_scanner_reports_absolute_offsets() {
        let src = "aaa{bbb";
        let mut inner = Scanner::nested(&src[3..], 3);
        let err = inner.skip_enclosed(false).err().expect("unterminated");
        assert_eq!(err.kind, ScanErrorKind::UnterminatedEnclosure);
        assert_eq!(err.span.start, 3);
    }

    // === Identity scanning (all skips disabled) ===

    #[test]
    fn raw_read_is_identity() {
        let src = "a \"str\" // not a comment\n{x}";
        let mut s = scan(src);
        let mut out = Vec::new();
        while !s.is_eof() {
            out.push(s.read());
        }
        assert_eq!(out, src.as_bytes());
    }

    #[test]
    fn find_without_skips_stops_inside_string() {
        // With skips disabled, breakpoints match raw characters.
        let mut s = scan("\"a}b\"");
        let found = s
            .find(&[b'}'], false, SkipPolicy::empty())
            .map_err(|e| e.to_string());
        let found = found.ok().flatten().expect("breakpoint");
        assert_eq!(found.prefix, "\"a");
        assert_eq!(found.stop, b'}');
    }

    // === find with policies ===

    #[test]
    fn find_skips_strings() {
        let mut s = scan("a\"}x\"b}c");
        let found = s.find(&[b'}'], false, SkipPolicy::STRINGS);
        let found = found.ok().flatten().expect("breakpoint");
        assert_eq!(found.prefix, "a\"}x\"b");
        assert_eq!(found.stop, b'}');
        assert_eq!(s.current(), b'}');
    }

    #[test]
    fn find_skips_line_comment_but_not_newline() {
        let mut s = scan("x // a } comment\n}");
        let found = s.find(&[b'}', b'\n'], false, SkipPolicy::COMMENTS);
        let found = found.ok().flatten().expect("breakpoint");
        assert_eq!(found.stop, b'\n');
    }

    #[test]
    fn find_skips_block_comment() {
        let mut s = scan("x /* } */ }");
        let found = s.find(&[b'}'], false, SkipPolicy::COMMENTS);
        let found = found.ok().flatten().expect("breakpoint");
        assert_eq!(found.prefix, "x /* } */ ");
    }

    #[test]
    fn find_skips_regex_body() {
        let mut s = scan("a = /}+/g }");
        let found = s.find(&[b'}'], false, SkipPolicy::CODE);
        let found = found.ok().flatten().expect("breakpoint");
        assert_eq!(found.prefix, "a = /}+/g ");
    }

    #[test]
    fn find_division_is_not_skipped_as_regex() {
        let mut s = scan("a / b }");
        let found = s.find(&[b'}'], false, SkipPolicy::CODE);
        let found = found.ok().flatten().expect("breakpoint");
        assert_eq!(found.prefix, "a / b ");
    }

    #[test]
    fn find_whitespace_policy_trims_prefix() {
        let mut s = scan("   name=");
        let found = s.find(&[b'='], false, SkipPolicy::WHITESPACE);
        let found = found.ok().flatten().expect("breakpoint");
        assert_eq!(found.prefix, "name");
    }

    #[test]
    fn find_miss_restores_position() {
        let mut s = scan("abc");
        s.advance(1);
        let got = s.find(&[b'}'], false, SkipPolicy::empty());
        assert_eq!(got.ok().flatten(), None);
        assert_eq!(s.abs(), 1);
    }

    #[test]
    fn find_forced_miss_is_fatal() {
        let mut s = scan("abc");
        let err = s.find(&[b'}'], true, SkipPolicy::empty()).err();
        let err = err.expect("must fail");
        assert_eq!(err.kind, ScanErrorKind::UnexpectedEof);
    }

    #[test]
    fn find_breakpoint_slash_beats_regex_skip() {
        // When `/` itself is the breakpoint, the regex heuristic must
        // not swallow it.
        let mut s = scan("x = /tail");
        let found = s.find(&[b'/'], false, SkipPolicy::CODE);
        let found = found.ok().flatten().expect("breakpoint");
        assert_eq!(found.stop, b'/');
        assert_eq!(found.prefix, "x = ");
    }

    // === String skipping ===

    #[test]
    fn unterminated_string_points_at_open_quote() {
        let mut s = scan("ab\"cde");
        s.advance(2);
        let err = s.skip_string().err().expect("unterminated");
        assert_eq!(err.kind, ScanErrorKind::UnterminatedString);
        assert_eq!(err.span.start, 2);
    }

    #[test]
    fn string_with_escaped_quote() {
        let mut s = scan(r#""a\"b"x"#);
        assert!(s.skip_string().is_ok());
        assert_eq!(s.current(), b'x');
    }

    #[test]
    fn single_quoted_string_stops_at_newline() {
        let mut s = scan("'abc\ndef'");
        let err = s.skip_string().err().expect("unterminated");
        assert_eq!(err.kind, ScanErrorKind::UnterminatedString);
        assert_eq!(err.span.start, 0);
    }

    #[test]
    fn backtick_string_spans_lines_and_interpolations() {
        let mut s = scan("`a\n${ {b: '}'} }c`x");
        assert!(s.skip_string().is_ok());
        assert_eq!(s.current(), b'x');
    }

    // === Enclosure skipping ===

    #[test]
    fn skip_enclosed_balanced_braces() {
        let mut s = scan("{a{b}c}rest");
        let inner = s.skip_enclosed(false);
        assert_eq!(inner.ok(), Some("{a{b}c}"));
        assert_eq!(s.rest(), "rest");
    }

    #[test]
    fn skip_enclosed_trim_drops_outer_brackets() {
        let mut s = scan("(a(b))x");
        let inner = s.skip_enclosed(true);
        assert_eq!(inner.ok(), Some("a(b)"));
        assert_eq!(s.current(), b'x');
    }

    #[test]
    fn skip_enclosed_ignores_delimiters_in_strings() {
        let mut s = scan("{'}'}/");
        let inner = s.skip_enclosed(true);
        assert_eq!(inner.ok(), Some("'}'"));
        assert_eq!(s.current(), b'/');
    }

    #[test]
    fn skip_enclosed_ignores_delimiters_in_comments() {
        let mut s = scan("{/* } */}x");
        assert!(s.skip_enclosed(false).is_ok());
        assert_eq!(s.current(), b'x');
    }

    #[test]
    fn skip_enclosed_ignores_delimiters_in_regex() {
        let mut s = scan("{ a = /}/ }x");
        assert!(s.skip_enclosed(false).is_ok());
        assert_eq!(s.current(), b'x');
    }

    #[test]
    fn skip_enclosed_unterminated_points_at_open() {
        let mut s = scan("xx{ab(c)");
        s.advance(2);
        let err = s.skip_enclosed(false).err().expect("unterminated");
        assert_eq!(err.kind, ScanErrorKind::UnterminatedEnclosure);
        assert_eq!(err.span.start, 2);
    }

    #[test]
    fn skip_enclosed_mismatched_bracket_is_fatal() {
        let mut s = scan("{a(b}c)}");
        let err = s.skip_enclosed(false).err().expect("mismatch");
        assert_eq!(
            err.kind,
            ScanErrorKind::MismatchedBracket {
                expected: b')',
                found: b'}'
            }
        );
    }

    #[test]
    fn skip_enclosed_requires_opening_bracket() {
        let mut s = scan("abc");
        let err = s.skip_enclosed(false).err().expect("not a bracket");
        assert!(matches!(err.kind, ScanErrorKind::UnexpectedChar { .. }));
    }

    // === could_start_regexp boundary ===

    #[test]
    fn regex_at_start_of_input() {
        let s = scan("/re/");
        assert!(s.could_start_regexp());
    }

    #[test]
    fn division_after_identifier() {
        let mut s = scan("count /");
        s.advance(6);
        assert!(!s.could_start_regexp());
    }

    #[test]
    fn division_after_number() {
        let mut s = scan("12 /");
        s.advance(3);
        assert!(!s.could_start_regexp());
    }

    #[test]
    fn division_after_close_paren() {
        let mut s = scan("f(x) /");
        s.advance(5);
        assert!(!s.could_start_regexp());
    }

    #[test]
    fn division_after_close_bracket() {
        let mut s = scan("a[0] /");
        s.advance(5);
        assert!(!s.could_start_regexp());
    }

    #[test]
    fn division_after_string_terminator() {
        let mut s = scan("'s' /");
        s.advance(4);
        assert!(!s.could_start_regexp());
    }

    #[test]
    fn regex_after_keywords() {
        for head in ["return ", "typeof ", "in ", "new ", "else ", "throw "] {
            let src = format!("{head}/");
            let mut s = Scanner::new(&src);
            s.advance(head.len());
            assert!(s.could_start_regexp(), "after `{head}`");
        }
    }

    #[test]
    fn regex_after_punctuation() {
        for head in ["a = ", "f(", "{ ", "a, ", "a + "] {
            let src = format!("{head}/");
            let mut s = Scanner::new(&src);
            s.advance(head.len());
            assert!(s.could_start_regexp(), "after `{head}`");
        }
    }

    #[test]
    fn regex_after_if_while_for_with_paren() {
        for kw in ["if", "while", "for", "with"] {
            let src = format!("{kw} (x > 1) /");
            let mut s = Scanner::new(&src);
            s.advance(src.len() - 1);
            assert!(s.could_start_regexp(), "after `{kw} (...)`");
        }
    }

    // === Regex skipping ===

    #[test]
    fn regex_character_class_hides_slash() {
        let mut s = scan("/[/]/gx ");
        assert!(s.skip_regex().is_ok());
        // flags consumed
        assert_eq!(s.current(), b' ');
    }

    #[test]
    fn unterminated_regex_points_at_open_slash() {
        let mut s = scan("x /ab\n");
        s.advance(2);
        let err = s.skip_regex().err().expect("unterminated");
        assert_eq!(err.kind, ScanErrorKind::UnterminatedRegex);
        assert_eq!(err.span.start, 2);
    }

    // === Names ===

    #[test]
    fn read_ident_basic() {
        let mut s = scan("foo_bar1 rest");
        assert_eq!(s.read_ident(), "foo_bar1");
        assert_eq!(s.current(), b' ');
    }

    #[test]
    fn read_ident_rejects_leading_digit() {
        let mut s = scan("1abc");
        assert_eq!(s.read_ident(), "");
    }

    #[test]
    fn read_name_allows_dashes() {
        let mut s = scan("my-el>");
        assert_eq!(s.read_name(&[b'-']), "my-el");
        assert_eq!(s.current(), b'>');
    }

    // === Property tests ===

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// With all skip options disabled, scanning is the identity
            /// function over raw bytes.
            #[test]
            fn raw_scan_is_identity(src in "[ -~\n]{0,200}") {
                let mut s = Scanner::new(&src);
                let mut out = Vec::new();
                while !s.is_eof() {
                    out.push(s.read());
                }
                prop_assert_eq!(out, src.as_bytes().to_vec());
            }

            /// A non-forced find either stops exactly on a breakpoint
            /// byte or restores the starting position.
            #[test]
            fn find_stops_on_breakpoint_or_restores(src in "[a-z\"'{}/ ]{0,80}") {
                let mut s = Scanner::new(&src);
                let start = s.abs();
                match s.find(&[b'}'], false, SkipPolicy::empty()) {
                    Ok(Some(found)) => prop_assert_eq!(found.stop, s.current()),
                    Ok(None) => prop_assert_eq!(s.abs(), start),
                    Err(_) => {}
                }
            }

            /// For input with balanced double-quoted strings, a
            /// string-skipping find never stops between quotes.
            #[test]
            fn find_never_stops_inside_string(
                parts in proptest::collection::vec("[a-y ]{0,10}", 1..6),
            ) {
                // Build `p0 "p1" p2 "p3" ...`; quotes always balanced.
                let mut src = String::new();
                for (i, p) in parts.iter().enumerate() {
                    if i % 2 == 1 {
                        src.push('"');
                        src.push_str(p);
                        src.push('"');
                    } else {
                        src.push_str(p);
                    }
                }
                src.push('z');
                let mut s = Scanner::new(&src);
                if let Ok(Some(_)) = s.find(&[b'z'], false, SkipPolicy::STRINGS) {
                    // Count quotes before the stop position: must be even,
                    // i.e. the scan cannot rest inside a string literal.
                    let consumed = &src[..s.abs() as usize];
                    let quotes = consumed.bytes().filter(|&b| b == b'"').count();
                    prop_assert_eq!(quotes % 2, 0);
                }
            }
        }
    }
}
