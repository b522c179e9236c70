//! Small JavaScript emission helpers.

/// Render `s` as a double-quoted JS string literal.
pub(crate) fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Whether `s` is a valid JS identifier (object-literal keys without
/// quoting, dotted member access).
pub(crate) fn is_js_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Render an object-literal key, quoting only when needed.
pub(crate) fn js_key(s: &str) -> String {
    if is_js_ident(s) {
        s.to_string()
    } else {
        js_string(s)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
mod tests {
    use super::{is_js_ident, js_key, js_string};
    use pretty_assertions::assert_eq;

    #[test]
    fn strings_escape_quotes_and_control() {
        assert_eq!(js_string("a\"b\n"), "\"a\\\"b\\n\"");
        assert_eq!(js_string("back\\slash"), "\"back\\\\slash\"");
    }

    #[test]
    fn ident_check() {
        assert!(is_js_ident("foo_1"));
        assert!(is_js_ident("$x"));
        assert!(!is_js_ident("1x"));
        assert!(!is_js_ident("a-b"));
        assert!(!is_js_ident(""));
    }

    #[test]
    fn keys_quote_only_when_needed() {
        assert_eq!(js_key("title"), "title");
        assert_eq!(js_key("data-id"), "\"data-id\"");
    }
}
