//! Code mode: raw host-language regions.
//!
//! The body of a `<#code>` region passes through with two transforms:
//! reactive sigils rewrite exactly as in expressions, and every `{`
//! that opens a *function body* reserves a slot directly after it for
//! the dialect's argument-capture preamble. The Es5 dialect fills
//! those slots with `var $args = arguments;` so generated closures
//! nested inside user functions can still reach the function's
//! arguments; Es6 leaves them empty.

use weft_scan::{Scanner, SkipPolicy};

use crate::config::Dialect;
use crate::driver::Driver;
use crate::error::CompileError;

impl<'s> Driver<'s> {
    pub(crate) fn run_code(&mut self, raw: &str, base: u32) -> Result<(), CompileError> {
        self.flush_all();
        let mut sc = Scanner::nested(raw, base);
        let mut emitted = String::new();
        let mut fn_slots = Vec::new();

        loop {
            let seg_base = sc.abs();
            let Some(found) = sc.find(&[b'{', b'}'], false, SkipPolicy::CODE)? else {
                let r = self.rewrite(sc.rest(), sc.abs())?;
                emitted.push_str(&r.code);
                break;
            };
            let r = self.rewrite(found.prefix, seg_base)?;
            emitted.push_str(&r.code);
            if found.stop == b'{' {
                let is_fn = opens_function_body(&emitted);
                emitted.push('{');
                if is_fn {
                    self.buf.push(std::mem::take(&mut emitted));
                    fn_slots.push(self.buf.reserve("args-capture"));
                }
            } else {
                emitted.push('}');
            }
            sc.advance(1);
        }
        self.buf.push(emitted);
        self.buf.push(" ");

        let preamble = match self.dialect() {
            Dialect::Es5 => " var $args = arguments;",
            Dialect::Es6 => "",
        };
        for slot in fn_slots {
            self.buf.fill(slot, preamble);
        }
        Ok(())
    }
}

/// Whether a `{` after `emitted` opens a function body rather than a
/// block or object literal: the text ends with `=>`, or with a `)`
/// whose call head is an identifier or the `function` keyword rather
/// than a control keyword.
fn opens_function_body(emitted: &str) -> bool {
    let t = emitted.trim_end();
    if t.ends_with("=>") {
        return true;
    }
    if !t.ends_with(')') {
        return false;
    }
    let b = t.as_bytes();
    let mut depth = 0usize;
    let mut open = None;
    for i in (0..b.len()).rev() {
        match b[i] {
            b')' => depth += 1,
            b'(' => {
                depth -= 1;
                if depth == 0 {
                    open = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    let Some(open) = open else {
        return false;
    };
    let head = t[..open].trim_end();
    let end = head.len();
    let mut start = end;
    let hb = head.as_bytes();
    while start > 0 && (hb[start - 1].is_ascii_alphanumeric() || matches!(hb[start - 1], b'_' | b'$'))
    {
        start -= 1;
    }
    let word = &head[start..end];
    if word.is_empty() {
        return false;
    }
    !matches!(word, "if" | "while" | "for" | "switch" | "with" | "catch")
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
mod tests {
    use super::opens_function_body;

    #[test]
    fn function_heads_open_function_bodies() {
        assert!(opens_function_body("function () "));
        assert!(opens_function_body("function handle(a, b) "));
        assert!(opens_function_body("const f = (x) => "));
    }

    #[test]
    fn control_heads_open_blocks() {
        assert!(!opens_function_body("if (ready) "));
        assert!(!opens_function_body("while (i < n)"));
        assert!(!opens_function_body("switch (kind) "));
    }

    #[test]
    fn bare_braces_are_blocks() {
        assert!(!opens_function_body("const obj = "));
        assert!(!opens_function_body(""));
        assert!(!opens_function_body("return "));
    }
}
