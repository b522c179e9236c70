//! Text mode: literal content with interpolation.
//!
//! Everything in a `<#text>` region is literal except `{expr}`
//! interpolations. Tags, statements, and braces are plain characters.

use weft_scan::{Scanner, SkipPolicy};

use crate::driver::Driver;
use crate::error::CompileError;
use crate::statement::expr_closure;

impl<'s> Driver<'s> {
    pub(crate) fn run_text(&mut self, raw: &str, base: u32) -> Result<(), CompileError> {
        let mut sc = Scanner::nested(raw, base);
        loop {
            let Some(found) = sc.find(&[b'{'], false, SkipPolicy::empty())? else {
                self.text.push_str(sc.rest());
                return Ok(());
            };
            self.text.push_str(found.prefix);
            let inner_base = sc.abs() + 1;
            let inner = sc.skip_enclosed(true)?;
            let r = self.rewrite(inner, inner_base)?;
            self.flush_text();
            self.chain_op(format!(
                ".exp({}, {})",
                expr_closure(&r.code, self.dialect()),
                r.deps.emit_array()
            ));
        }
    }
}
