//! Terminal emitter: human-readable diagnostic output with optional
//! ANSI color support.

use std::io::Write;

use crate::{Diagnostic, Severity};

/// ANSI color codes for terminal output.
mod colors {
    pub const ERROR: &str = "\x1b[1;31m"; // Bold red
    pub const WARNING: &str = "\x1b[1;33m"; // Bold yellow
    pub const NOTE: &str = "\x1b[1;36m"; // Bold cyan
    pub const BOLD: &str = "\x1b[1m";
    pub const RESET: &str = "\x1b[0m";
}

/// Color output mode for the terminal emitter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Automatically detect based on terminal capabilities.
    #[default]
    Auto,
    /// Always use colors.
    Always,
    /// Never use colors.
    Never,
}

impl ColorMode {
    /// Resolve to a boolean; `is_tty` decides `Auto`.
    pub fn should_use_colors(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// Terminal emitter with optional color support.
pub struct TerminalEmitter<W: Write> {
    writer: W,
    colors: bool,
}

impl<W: Write> TerminalEmitter<W> {
    /// Create a terminal emitter with an explicit color mode.
    pub fn with_color_mode(writer: W, mode: ColorMode, is_tty: bool) -> Self {
        TerminalEmitter {
            writer,
            colors: mode.should_use_colors(is_tty),
        }
    }

    fn severity_color(severity: Severity) -> &'static str {
        match severity {
            Severity::Error => colors::ERROR,
            Severity::Warning => colors::WARNING,
            Severity::Note => colors::NOTE,
        }
    }

    /// Emit one diagnostic, rendered against `source`.
    pub fn emit(&mut self, diagnostic: &Diagnostic, source: &str) {
        if self.colors {
            let color = Self::severity_color(diagnostic.severity);
            let _ = write!(
                self.writer,
                "{color}{}{}{}[{}]{}",
                diagnostic.severity,
                colors::RESET,
                colors::BOLD,
                diagnostic.code,
                colors::RESET
            );
            let _ = writeln!(self.writer, ": {}", diagnostic.message);
            // The span/excerpt body is never colored; it must stay
            // copy-pasteable.
            let rendered = diagnostic.render(source);
            let body = rendered.splitn(2, '\n').nth(1).unwrap_or("");
            let _ = write!(self.writer, "{body}");
        } else {
            let _ = write!(self.writer, "{}", diagnostic.render(source));
        }
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
    use crate::ErrorCode;
    use pretty_assertions::assert_eq;
    use weft_scan::Span;

    #[test]
    fn plain_emit_matches_render() {
        let d = Diagnostic::error(ErrorCode::UnexpectedChar, "expected `>`", Span::at(2));
        let src = "<dx";
        let mut buf = Vec::new();
        let mut em = TerminalEmitter::with_color_mode(&mut buf, ColorMode::Never, false);
        em.emit(&d, src);
        assert_eq!(String::from_utf8(buf).unwrap(), d.render(src));
    }

    #[test]
    fn colored_emit_keeps_excerpt_uncolored() {
        let d = Diagnostic::error(ErrorCode::UnexpectedChar, "expected `>`", Span::at(2));
        let src = "<dx";
        let mut buf = Vec::new();
        let mut em = TerminalEmitter::with_color_mode(&mut buf, ColorMode::Always, false);
        em.emit(&d, src);
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("\x1b[1;31m"));
        assert!(out.contains(" --> 1:3"));
        let excerpt = out.split(" --> ").nth(1).unwrap();
        assert!(!excerpt.contains("\x1b["));
    }

    #[test]
    fn auto_mode_respects_tty() {
        assert!(ColorMode::Auto.should_use_colors(true));
        assert!(!ColorMode::Auto.should_use_colors(false));
        assert!(ColorMode::Always.should_use_colors(false));
        assert!(!ColorMode::Never.should_use_colors(true));
    }
}
