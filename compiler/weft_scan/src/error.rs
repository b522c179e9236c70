//! Scanner error type.
//!
//! Every error carries an absolute byte span into the original template
//! text. Unterminated constructs point at their *opening* delimiter, not
//! at end-of-input, so the caret in rendered diagnostics lands where the
//! construct began.

use crate::Span;

/// What went wrong during a scan.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ScanErrorKind {
    /// A string literal reached end-of-line or end-of-input unclosed.
    UnterminatedString,
    /// A block comment reached end-of-input unclosed.
    UnterminatedComment,
    /// A regex literal reached end-of-line or end-of-input unclosed.
    UnterminatedRegex,
    /// A `{`/`[`/`(` enclosure reached end-of-input unclosed.
    UnterminatedEnclosure,
    /// A specific character was required and something else was found.
    UnexpectedChar { expected: u8, found: u8 },
    /// A forced breakpoint search ran out of input.
    UnexpectedEof,
    /// A closing bracket did not match the innermost open bracket.
    MismatchedBracket { expected: u8, found: u8 },
}

/// A fatal lexical error with its absolute source span.
#[derive(Copy, Clone, Eq, PartialEq, Debug, thiserror::Error)]
#[error("{}", self.message())]
pub struct ScanError {
    pub kind: ScanErrorKind,
    pub span: Span,
}

impl ScanError {
    pub fn new(kind: ScanErrorKind, span: Span) -> Self {
        ScanError { kind, span }
    }

    /// Human-readable message for this error.
    pub fn message(&self) -> String {
        match self.kind {
            ScanErrorKind::UnterminatedString => "unterminated string literal".into(),
            ScanErrorKind::UnterminatedComment => "unterminated block comment".into(),
            ScanErrorKind::UnterminatedRegex => "unterminated regex literal".into(),
            ScanErrorKind::UnterminatedEnclosure => "unterminated enclosure".into(),
            ScanErrorKind::UnexpectedChar { expected, found } => format!(
                "expected `{}`, found `{}`",
                printable(expected),
                printable(found)
            ),
            ScanErrorKind::UnexpectedEof => "unexpected end of input".into(),
            ScanErrorKind::MismatchedBracket { expected, found } => format!(
                "mismatched bracket: expected `{}`, found `{}`",
                printable(expected),
                printable(found)
            ),
        }
    }
}

/// Render a byte for inclusion in an error message.
fn printable(b: u8) -> String {
    match b {
        0 => "<eof>".into(),
        b'\n' => "\\n".into(),
        b'\t' => "\\t".into(),
        b'\r' => "\\r".into(),
        _ => (b as char).to_string(),
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

    #[test]
    fn unexpected_char_message_is_readable() {
        let e = ScanError::new(
            ScanErrorKind::UnexpectedChar {
                expected: b'>',
                found: b'\n',
            },
            Span::at(4),
        );
        assert_eq!(e.message(), "expected `>`, found `\\n`");
    }

    #[test]
    fn eof_renders_as_marker() {
        let e = ScanError::new(
            ScanErrorKind::UnexpectedChar {
                expected: b'}',
                found: 0,
            },
            Span::at(0),
        );
        assert_eq!(e.message(), "expected `}`, found `<eof>`");
    }

    #[test]
    fn error_display_matches_message() {
        let e = ScanError::new(ScanErrorKind::UnterminatedString, Span::at(7));
        assert_eq!(e.to_string(), "unterminated string literal");
    }
}
