//! Stable error codes.
//!
//! Codes group by phase: `E0xxx` lexical, `E1xxx` syntax, `W2xxx`
//! semantic warnings. Lexical and syntax errors are always fatal;
//! warnings accumulate and are returned with the result.

use std::fmt;

/// A stable, searchable diagnostic code.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Lexical
    UnterminatedString,
    UnterminatedComment,
    UnterminatedRegex,
    UnterminatedEnclosure,
    UnexpectedChar,
    UnexpectedEof,
    MismatchedBracket,
    // Syntax
    UnterminatedTag,
    UnknownDirective,
    UnknownMode,
    MissingAttributeValue,
    MalformedAttribute,
    UnknownShorthand,
    UnclosedStatement,
    UnclosedTag,
    MalformedStatement,
    // Warnings
    ClosingTagMismatch,
    DeprecatedSyntax,
}

impl ErrorCode {
    /// The rendered code string, e.g. `E0001`.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::UnterminatedString => "E0001",
            ErrorCode::UnterminatedComment => "E0002",
            ErrorCode::UnterminatedRegex => "E0003",
            ErrorCode::UnterminatedEnclosure => "E0004",
            ErrorCode::UnexpectedChar => "E0005",
            ErrorCode::UnexpectedEof => "E0006",
            ErrorCode::MismatchedBracket => "E0007",
            ErrorCode::UnterminatedTag => "E1001",
            ErrorCode::UnknownDirective => "E1002",
            ErrorCode::UnknownMode => "E1003",
            ErrorCode::MissingAttributeValue => "E1004",
            ErrorCode::MalformedAttribute => "E1005",
            ErrorCode::UnknownShorthand => "E1006",
            ErrorCode::UnclosedStatement => "E1007",
            ErrorCode::UnclosedTag => "E1008",
            ErrorCode::MalformedStatement => "E1009",
            ErrorCode::ClosingTagMismatch => "W2001",
            ErrorCode::DeprecatedSyntax => "W2002",
        }
    }

    /// Whether this code is fatal (errors) or accumulating (warnings).
    pub fn is_fatal(self) -> bool {
        !matches!(
            self,
            ErrorCode::ClosingTagMismatch | ErrorCode::DeprecatedSyntax
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
mod tests {
    use super::ErrorCode;
    use pretty_assertions::assert_eq;

    #[test]
    fn codes_render_stably() {
        assert_eq!(ErrorCode::UnterminatedString.as_str(), "E0001");
        assert_eq!(ErrorCode::UnterminatedTag.as_str(), "E1001");
        assert_eq!(ErrorCode::ClosingTagMismatch.as_str(), "W2001");
    }

    #[test]
    fn warnings_are_not_fatal() {
        assert!(ErrorCode::UnterminatedString.is_fatal());
        assert!(ErrorCode::UnknownDirective.is_fatal());
        assert!(!ErrorCode::ClosingTagMismatch.is_fatal());
        assert!(!ErrorCode::DeprecatedSyntax.is_fatal());
    }
}
