//! Fatal compile errors.
//!
//! A fatal error aborts the single pass immediately; the partial output
//! is discarded. Warnings never take this path; they accumulate on the
//! driver and come back on [`Output`](crate::Output).

use weft_diagnostic::{Diagnostic, ErrorCode};
use weft_scan::{ScanError, ScanErrorKind, Span};

/// A fatal error produced while transpiling.
#[derive(Debug, thiserror::Error)]
#[error("{}", diagnostic.message)]
pub struct CompileError {
    pub diagnostic: Diagnostic,
}

impl CompileError {
    pub fn new(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        CompileError {
            diagnostic: Diagnostic::error(code, message, span),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.diagnostic = self.diagnostic.with_note(note);
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.diagnostic.code
    }

    pub fn span(&self) -> Span {
        self.diagnostic.span
    }
}

impl From<ScanError> for CompileError {
    fn from(err: ScanError) -> Self {
        let code = match err.kind {
            ScanErrorKind::UnterminatedString => ErrorCode::UnterminatedString,
            ScanErrorKind::UnterminatedComment => ErrorCode::UnterminatedComment,
            ScanErrorKind::UnterminatedRegex => ErrorCode::UnterminatedRegex,
            ScanErrorKind::UnterminatedEnclosure => ErrorCode::UnterminatedEnclosure,
            ScanErrorKind::UnexpectedChar { .. } => ErrorCode::UnexpectedChar,
            ScanErrorKind::UnexpectedEof => ErrorCode::UnexpectedEof,
            ScanErrorKind::MismatchedBracket { .. } => ErrorCode::MismatchedBracket,
        };
        let span = err.span;
        let message = err.message();
        CompileError::new(code, message, span)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
mod tests {
    use super::CompileError;
    use pretty_assertions::assert_eq;
    use weft_diagnostic::ErrorCode;
    use weft_scan::{ScanError, ScanErrorKind, Span};

    #[test]
    fn scan_errors_map_to_lexical_codes() {
        let scan = ScanError {
            kind: ScanErrorKind::UnterminatedString,
            span: Span::at(4),
        };
        let err = CompileError::from(scan);
        assert_eq!(err.code(), ErrorCode::UnterminatedString);
        assert_eq!(err.span(), Span::at(4));
    }

    #[test]
    fn notes_attach_to_the_diagnostic() {
        let err = CompileError::new(ErrorCode::UnclosedTag, "tag never closed", Span::new(0, 3))
            .with_note("opened here");
        assert_eq!(err.diagnostic.notes.len(), 1);
    }
}
