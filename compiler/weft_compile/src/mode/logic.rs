//! Logic mode: the template default.
//!
//! One streaming loop over the region: literal text accumulates into
//! the current text run, `{expr}` interpolations become chain ops,
//! line-start keywords open logic statements, `<` opens tags or ends
//! the region. Statement bodies are parsed by the same loop; the open
//! stack plus the region's `stmt_mark` keep brace and newline closing
//! honest across nested tag bodies.

use tracing::trace;
use weft_diagnostic::ErrorCode;
use weft_scan::{Scanner, SkipPolicy, Span};

use crate::deps::DepSet;
use crate::driver::{Driver, OpenKind, OpenStmt};
use crate::error::CompileError;
use crate::statement::{expr_closure, Clause, ForeachForm, Statement, StmtKind};
use crate::table::{Closer, Region};

impl<'s> Driver<'s> {
    pub(crate) fn run_logic(&mut self, region: &Region) -> Result<(), CompileError> {
        let mut at_line_start = true;
        loop {
            if at_line_start {
                let before = self.sc.rest();
                self.sc.skip_ws();
                let ws_len = before.len() - self.sc.rest().len();
                if self.try_statement()? {
                    continue;
                }
                // No statement here: the skipped whitespace is ordinary
                // text after all.
                self.text.push_str(&before[..ws_len]);
                at_line_start = false;
            }

            let Some(found) = self
                .sc
                .find(&[b'<', b'{', b'}', b'\n'], false, SkipPolicy::empty())?
            else {
                let rest = self.sc.rest();
                self.text.push_str(rest);
                self.sc.advance(rest.len());
                return self.end_region_at_eof(region);
            };
            self.text.push_str(found.prefix);

            match found.stop {
                b'\n' => {
                    self.sc.advance(1);
                    self.text.push_str("\n");
                    self.close_implicit(region)?;
                    at_line_start = true;
                }
                b'{' => self.interpolate()?,
                b'}' => {
                    self.sc.advance(1);
                    if self.open.len() > region.stmt_mark {
                        self.close_brace(region)?;
                        at_line_start = true;
                    } else {
                        // No statement to close: literal text.
                        self.text.push_str("}");
                    }
                }
                _ => match self.sc.peek() {
                    b'/' => {
                        let (name, span) = self.parse_close_tag()?;
                        if self.end_region_on_close(region, &name, span)? {
                            return Ok(());
                        }
                    }
                    n if is_tag_start(n) => {
                        self.handle_tag()?;
                        at_line_start = true;
                    }
                    _ => {
                        self.sc.advance(1);
                        self.text.push_str("<");
                    }
                },
            }
        }
    }

    /// `{expr}` at the current position (scanner ON the `{`).
    pub(crate) fn interpolate(&mut self) -> Result<(), CompileError> {
        let base = self.sc.abs() + 1;
        let raw = self.sc.skip_enclosed(true)?;
        let r = self.rewrite(raw, base)?;
        self.flush_text();
        self.chain_op(format!(
            ".exp({}, {})",
            expr_closure(&r.code, self.dialect()),
            r.deps.emit_array()
        ));
        Ok(())
    }

    // === region closing ===

    /// Parse `</name>` (scanner ON the `<`). Empty name for `</>`.
    fn parse_close_tag(&mut self) -> Result<(String, Span), CompileError> {
        let start = self.sc.abs();
        self.sc.advance(2);
        let mut name = String::new();
        if self.sc.current() == b'#' {
            name.push('#');
            self.sc.advance(1);
        }
        name.push_str(self.sc.read_name(b"-"));
        self.sc.skip_ws();
        self.sc.expect(b'>')?;
        Ok((name, Span::new(start, self.sc.abs())))
    }

    /// Whether this closing tag ends the region. A closing tag always
    /// closes the innermost open region exactly once; a name mismatch
    /// is a warning, not a second close.
    fn end_region_on_close(
        &mut self,
        region: &Region,
        name: &str,
        span: Span,
    ) -> Result<bool, CompileError> {
        match &region.closer {
            Closer::Root => {
                self.warn(
                    ErrorCode::ClosingTagMismatch,
                    format!("closing tag `</{name}>` has no open tag"),
                    span,
                );
                Ok(false)
            }
            Closer::Any => {
                self.end_region(region)?;
                Ok(true)
            }
            Closer::Name(expected) => {
                if !name.is_empty() && name != expected {
                    self.warn(
                        ErrorCode::ClosingTagMismatch,
                        format!("closing tag `</{name}>` does not match `<{expected}>`"),
                        span,
                    );
                }
                self.end_region(region)?;
                Ok(true)
            }
        }
    }

    fn end_region(&mut self, region: &Region) -> Result<(), CompileError> {
        while self.open.len() > region.stmt_mark {
            let implicit = self.open.last().is_some_and(|s| s.implicit);
            if !implicit {
                break;
            }
            self.finish_stmt()?;
        }
        self.check_statements_closed(region)?;
        self.flush_all();
        Ok(())
    }

    fn end_region_at_eof(&mut self, region: &Region) -> Result<(), CompileError> {
        if region.closer != Closer::Root {
            return Err(CompileError::new(
                ErrorCode::UnclosedTag,
                "tag is never closed",
                region.open_span,
            ));
        }
        self.end_region(region)
    }

    // === statement bodies ===

    /// Close implicit statements terminated by this newline.
    fn close_implicit(&mut self, region: &Region) -> Result<(), CompileError> {
        while self.open.len() > region.stmt_mark {
            let top = &self.open[self.open.len() - 1];
            if !top.implicit {
                break;
            }
            trace!(seq = top.seq, "newline closes implicit statement");
            self.finish_stmt()?;
        }
        Ok(())
    }

    /// A `}` already consumed; close the innermost braced statement,
    /// chaining into `else` when one follows an `if`. A `}` with no
    /// braced statement open is literal text, even when an implicit
    /// statement is open: only a newline ends those.
    fn close_brace(&mut self, region: &Region) -> Result<(), CompileError> {
        let has_braced = self.open[region.stmt_mark..].iter().any(|s| !s.implicit);
        if !has_braced {
            self.text.push_str("}");
            return Ok(());
        }
        // Implicit statements stacked inside the braced body end with it.
        self.close_implicit(region)?;
        let top_is_if = matches!(
            self.open.last().map(|s| &s.kind),
            Some(OpenKind::If { .. })
        );
        if top_is_if && self.try_else()? {
            return Ok(());
        }
        self.finish_stmt()
    }

    /// After `}` of an `if` clause: consume `else` / `else if (...)`
    /// and open the next clause. Returns false when no `else` follows.
    fn try_else(&mut self) -> Result<bool, CompileError> {
        let mut probe = self.sc.clone();
        probe.skip_ws_and_newlines();
        if probe.read_ident() != "else" {
            return Ok(false);
        }
        self.sc = probe;
        self.flush_all();
        self.sc.skip_ws();

        let mut probe = self.sc.clone();
        let clause = if probe.read_ident() == "if" {
            self.sc = probe;
            self.sc.skip_ws();
            if self.sc.current() != b'(' {
                return Err(CompileError::new(
                    ErrorCode::MalformedStatement,
                    "`else if` requires a parenthesized condition",
                    self.sc.here(),
                ));
            }
            let base = self.sc.abs() + 1;
            let raw = self.sc.skip_enclosed(true)?;
            let r = self.rewrite(raw, base)?;
            let head = self.buf.reserve("clause-head");
            Clause {
                head,
                cond: Some(r.code),
                deps: r.deps,
            }
        } else {
            Clause {
                head: self.buf.reserve("clause-head"),
                cond: None,
                deps: DepSet::new(),
            }
        };
        self.buf.push(" ");

        self.sc.skip_ws();
        let implicit = if self.sc.current() == b'{' {
            self.sc.advance(1);
            false
        } else {
            true
        };

        let Some(top) = self.open.last_mut() else {
            return Err(CompileError::new(
                ErrorCode::MalformedStatement,
                "`else` without a matching `if`",
                self.sc.here(),
            ));
        };
        top.deps.merge(&clause.deps);
        top.implicit = implicit;
        match &mut top.kind {
            OpenKind::If { clauses } => clauses.push(clause),
            _ => unreachable!("caller checked the statement kind"),
        }
        Ok(true)
    }

    // === statement opening ===

    /// Try to open a logic statement at the current position. The
    /// scanner only moves when a statement actually parses; a keyword
    /// that turns out to be prose stays literal text.
    fn try_statement(&mut self) -> Result<bool, CompileError> {
        let mut probe = self.sc.clone();
        let word = probe.read_ident();
        match word {
            "let" | "var" => self.try_decl(word, probe),
            "if" | "for" | "foreach" | "while" | "switch" => self.try_control(word, probe),
            _ => Ok(false),
        }
    }

    fn try_decl(
        &mut self,
        keyword: &str,
        mut probe: Scanner<'s>,
    ) -> Result<bool, CompileError> {
        probe.skip_ws();
        let name = probe.read_ident();
        if name.is_empty() {
            return Ok(false);
        }
        probe.skip_ws();
        if probe.current() != b'=' || probe.peek() == b'=' {
            return Ok(false);
        }
        probe.advance(1);
        probe.skip_ws();
        self.sc = probe;

        let base = self.sc.abs();
        let raw = match self.sc.find(&[b'\n'], false, SkipPolicy::CODE)? {
            Some(f) => f.prefix,
            None => {
                let r = self.sc.rest();
                self.sc.advance(r.len());
                r
            }
        };
        let r = self.rewrite(raw, base)?;
        self.flush_all();
        let head = self.buf.reserve("decl");
        self.buf.push(" ");
        let seq = self.seq();
        self.closed.push(Statement {
            seq,
            kind: StmtKind::Decl {
                keyword: keyword.to_string(),
                name: name.to_string(),
                init: r.code,
                head,
            },
            deps: r.deps,
            tail: None,
        });
        Ok(true)
    }

    fn try_control(
        &mut self,
        word: &str,
        mut probe: Scanner<'s>,
    ) -> Result<bool, CompileError> {
        let start = self.sc.abs();
        probe.skip_ws();
        if probe.current() != b'(' {
            return Ok(false);
        }
        self.sc = probe;

        let base = self.sc.abs() + 1;
        let raw = self.sc.skip_enclosed(true)?;
        let span = Span::new(start, self.sc.abs());
        self.flush_all();

        if word == "switch" {
            return self.open_switch(raw, base, span);
        }

        let (kind, deps) = match word {
            "if" => {
                let r = self.rewrite(raw, base)?;
                let head = self.buf.reserve("clause-head");
                let deps = r.deps.clone();
                (
                    OpenKind::If {
                        clauses: vec![Clause {
                            head,
                            cond: Some(r.code),
                            deps: r.deps,
                        }],
                    },
                    deps,
                )
            }
            "while" => {
                let r = self.rewrite(raw, base)?;
                let head = self.buf.reserve("stmt-head");
                (
                    OpenKind::While {
                        head,
                        cond: r.code,
                    },
                    r.deps,
                )
            }
            "for" => {
                let r = self.rewrite(raw, base)?;
                let head = self.buf.reserve("stmt-head");
                (
                    OpenKind::For {
                        head,
                        header: r.code,
                    },
                    r.deps,
                )
            }
            _ => {
                let (form, deps) = self.parse_foreach_form(raw, base, span)?;
                let head = self.buf.reserve("each-head");
                (OpenKind::Foreach { head, form }, deps)
            }
        };
        self.buf.push(" ");

        self.sc.skip_ws();
        let implicit = if self.sc.current() == b'{' {
            self.sc.advance(1);
            false
        } else {
            true
        };
        let seq = self.seq();
        self.open.push(OpenStmt {
            seq,
            span,
            implicit,
            deps,
            kind,
        });
        Ok(true)
    }

    /// A switch body is host-language code through and through, so it
    /// is consumed in one balanced skip rather than parsed as template
    /// content.
    fn open_switch(&mut self, disc_raw: &str, base: u32, span: Span) -> Result<bool, CompileError> {
        let disc = self.rewrite(disc_raw, base)?;
        self.sc.skip_ws();
        if self.sc.current() != b'{' {
            return Err(CompileError::new(
                ErrorCode::MalformedStatement,
                "`switch` requires a braced body",
                span,
            ));
        }
        let body_base = self.sc.abs() + 1;
        let body_raw = self.sc.skip_enclosed(true)?;
        let body = self.rewrite(body_raw, body_base)?;

        let head = self.buf.reserve("stmt-head");
        self.buf.push(" ");
        self.buf.push(body.code);
        let tail = self.buf.reserve("stmt-tail");
        self.buf.push(" ");

        let mut deps = disc.deps.clone();
        deps.merge(&body.deps);
        let seq = self.seq();
        self.closed.push(Statement {
            seq,
            kind: StmtKind::Switch {
                head,
                disc: disc.code,
            },
            deps,
            tail: Some(tail),
        });
        Ok(true)
    }

    /// `EXPR as ITEM` | `EXPR as KEY : VALUE` | `from A to B as I`.
    fn parse_foreach_form(
        &mut self,
        raw: &str,
        base: u32,
        span: Span,
    ) -> Result<(ForeachForm, DepSet), CompileError> {
        let malformed = |msg: &str| {
            CompileError::new(ErrorCode::MalformedStatement, msg.to_string(), span)
        };
        let Some(as_at) = raw.rfind(" as ") else {
            return Err(malformed("`foreach` head requires `as`"));
        };
        let binder = raw[as_at + 4..].trim();
        let left = &raw[..as_at];

        if let Some(range) = left.trim_start().strip_prefix("from ") {
            let offset = base + (left.len() - range.len()) as u32;
            let Some(to_at) = range.find(" to ") else {
                return Err(malformed("range `foreach` requires `to`"));
            };
            let from = self.rewrite(&range[..to_at], offset)?;
            let to = self.rewrite(&range[to_at + 4..], offset + to_at as u32 + 4)?;
            if binder.is_empty() {
                return Err(malformed("range `foreach` requires an index name"));
            }
            let mut deps = from.deps.clone();
            deps.merge(&to.deps);
            return Ok((
                ForeachForm::Range {
                    var: binder.to_string(),
                    from: from.code,
                    to: to.code,
                },
                deps,
            ));
        }

        let expr = self.rewrite(left, base)?;
        let form = if let Some((key, value)) = binder.split_once(':') {
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                return Err(malformed("object `foreach` requires `key : value`"));
            }
            ForeachForm::Object {
                key: key.to_string(),
                value: value.to_string(),
                expr: expr.code,
            }
        } else {
            if binder.is_empty() {
                return Err(malformed("`foreach` requires an item name"));
            }
            ForeachForm::Array {
                item: binder.to_string(),
                expr: expr.code,
            }
        };
        Ok((form, expr.deps))
    }
}

/// Bytes that may follow `<` to start a tag.
fn is_tag_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || matches!(b, b'?' | b'#' | b':' | b'&' | b'{' | b'_')
}
