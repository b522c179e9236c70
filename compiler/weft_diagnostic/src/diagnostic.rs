//! Core diagnostic types.

use std::fmt;

use weft_scan::{Position, Span};

use crate::{render_excerpt, ErrorCode};

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A structured diagnostic with code, message, and absolute span.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
    /// Secondary notes appended below the excerpt.
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// A fatal error diagnostic.
    pub fn error(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code,
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    /// A non-fatal warning diagnostic.
    pub fn warning(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            code,
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    /// Attach a secondary note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Render against the original template text: header, location,
    /// caret-annotated excerpt, notes.
    pub fn render(&self, source: &str) -> String {
        let pos = Position::of(source, self.span.start);
        let mut out = format!(
            "{}[{}]: {}\n --> {pos}\n",
            self.severity, self.code, self.message
        );
        out.push_str(&render_excerpt(source, self.span));
        for note in &self.notes {
            out.push_str(&format!("  = note: {note}\n"));
        }
        out
    }
}

/// A non-fatal condition accumulated during compilation and returned
/// alongside the successful result.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Warning {
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
}

impl Warning {
    pub fn new(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Warning {
            code,
            message: message.into(),
            span,
        }
    }

    /// View as a renderable diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::warning(self.code, self.message.clone(), self.span)
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
    fn render_includes_header_location_and_caret() {
        let src = "<div>\n<span foo=\"bar\n</div>";
        // span points at the opening quote on line 2
        let d = Diagnostic::error(
            ErrorCode::UnterminatedString,
            "unterminated string literal",
            Span::new(16, 17),
        );
        let rendered = d.render(src);
        assert!(rendered.starts_with("error[E0001]: unterminated string literal\n"));
        assert!(rendered.contains(" --> 2:11\n"));
        assert!(rendered.contains("<span foo=\"bar"));
        assert!(rendered.contains('^'));
    }

    #[test]
    fn notes_are_appended() {
        let d = Diagnostic::error(ErrorCode::UnclosedTag, "unclosed tag", Span::at(0))
            .with_note("opened here");
        let rendered = d.render("<div>");
        assert!(rendered.contains("= note: opened here"));
    }

    #[test]
    fn warning_converts_to_diagnostic() {
        let w = Warning::new(ErrorCode::ClosingTagMismatch, "mismatch", Span::at(3));
        let d = w.to_diagnostic();
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.code, ErrorCode::ClosingTagMismatch);
    }
}
