//! Caret-annotated source excerpts.

use weft_scan::{Position, Span};

/// Render the line containing `span.start` with a caret underline:
///
/// ```text
///   |
/// 3 | <span foo="bar
///   |           ^
///   |
/// ```
///
/// The caret widens to the span length, clipped to the end of the line.
/// Excerpts always come from the original template text; offsets into
/// generated code never reach this function.
pub fn render_excerpt(source: &str, span: Span) -> String {
    let pos = Position::of(source, span.start);
    let line_text = pos.line_text(source);
    let gutter_width = digits(pos.line);
    let gutter = " ".repeat(gutter_width);

    let col = (pos.column as usize).saturating_sub(1);
    let width = (span.len() as usize).max(1);
    let clipped = width.min(line_text.len().saturating_sub(col).max(1));
    let underline = format!("{}{}", " ".repeat(col), "^".repeat(clipped));

    format!(
        "{gutter} |\n{} | {line_text}\n{gutter} | {underline}\n",
        pos.line
    )
}

fn digits(mut n: u32) -> usize {
    let mut d = 1;
    while n >= 10 {
        n /= 10;
        d += 1;
    }
    d
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
    fn caret_lands_under_the_offending_byte() {
        let src = "abc\ndef ghi";
        let out = render_excerpt(src, Span::new(8, 9));
        assert_eq!(out, "  |\n2 | def ghi\n  |     ^\n");
    }

    #[test]
    fn caret_widens_to_span_length() {
        let src = "let foo = 1";
        let out = render_excerpt(src, Span::new(4, 7));
        assert_eq!(out, "  |\n1 | let foo = 1\n  |     ^^^\n");
    }

    #[test]
    fn caret_clips_at_line_end() {
        let src = "ab";
        let out = render_excerpt(src, Span::new(1, 40));
        assert_eq!(out, "  |\n1 | ab\n  |  ^\n");
    }

    #[test]
    fn offset_at_eof_still_renders() {
        let src = "line one";
        let out = render_excerpt(src, Span::at(8));
        assert!(out.contains("line one"));
        assert!(out.contains('^'));
    }

    #[test]
    fn wide_gutter_for_multidigit_lines() {
        let src = "a\n".repeat(12);
        let out = render_excerpt(&src, Span::at(20));
        assert!(out.contains("11 | a\n"));
    }
}
