//! Logic statements and their retroactive rendering.
//!
//! A statement's head cannot be emitted when its keyword is parsed: a
//! `if` whose condition reads a reactive reference must become a
//! `wf.cond` call, and whether it does is only known once the condition
//! expression has been rewritten. So each statement reserves slots in
//! the buffer (one per clause head, one tail) and is queued when it
//! closes. At end of the mode the queue is replayed in *open* order and
//! every slot is filled exactly once, either with plain JS or with the
//! reactive form.

use crate::buffer::{GenBuffer, SlotRef};
use crate::config::Dialect;
use crate::deps::DepSet;

/// One `if`/`else if`/`else` arm.
#[derive(Debug)]
pub(crate) struct Clause {
    pub head: SlotRef,
    /// Rewritten condition; `None` for a bare `else`.
    pub cond: Option<String>,
    pub deps: DepSet,
}

/// The three `foreach` head shapes.
#[derive(Debug)]
pub(crate) enum ForeachForm {
    /// `foreach (EXPR as item)`
    Array { item: String, expr: String },
    /// `foreach (EXPR as key : value)`
    Object {
        key: String,
        value: String,
        expr: String,
    },
    /// `foreach (from A to B as i)`
    Range {
        var: String,
        from: String,
        to: String,
    },
}

#[derive(Debug)]
pub(crate) enum StmtKind {
    /// `let x = EXPR` / `var x = EXPR`. Fully known at parse time,
    /// so the head slot carries the whole rendering.
    Decl {
        keyword: String,
        name: String,
        init: String,
        head: SlotRef,
    },
    If {
        clauses: Vec<Clause>,
    },
    While {
        head: SlotRef,
        cond: String,
    },
    /// Classic `for (init; cond; step)`. The raw head is kept verbatim
    /// after expression rewriting.
    For {
        head: SlotRef,
        header: String,
    },
    Foreach {
        head: SlotRef,
        form: ForeachForm,
    },
    Switch {
        head: SlotRef,
        disc: String,
    },
}

/// A logic statement with reserved slots, queued once closed.
#[derive(Debug)]
pub(crate) struct Statement {
    /// Open-order sequence number; the finalize pass replays in this
    /// order regardless of close order.
    pub seq: u32,
    pub kind: StmtKind,
    /// Union of every clause's dependencies. Non-empty means the
    /// reactive rendering is used.
    pub deps: DepSet,
    /// Reserved when the statement closes. `None` only for `Decl`,
    /// which has no body.
    pub tail: Option<SlotRef>,
}

/// Open-brace for a generated closure.
pub(crate) fn closure_open(params: &str, dialect: Dialect) -> String {
    match (dialect, params.is_empty()) {
        (Dialect::Es6, true) => "() => {".to_string(),
        (Dialect::Es6, false) => format!("({params}) => {{"),
        (Dialect::Es5, true) => "function () {".to_string(),
        (Dialect::Es5, false) => format!("function ({params}) {{"),
    }
}

/// A closure whose whole body is a single expression.
pub(crate) fn expr_closure(expr: &str, dialect: Dialect) -> String {
    match dialect {
        Dialect::Es6 => format!("() => ({expr})"),
        Dialect::Es5 => format!("function () {{ return ({expr}); }}"),
    }
}

impl Statement {
    /// Whether this statement must use the reactive rendering.
    pub fn is_reactive(&self) -> bool {
        !self.deps.is_empty()
    }

    /// Fill every reserved slot with final text.
    pub fn finalize(&self, buf: &mut GenBuffer, dialect: Dialect) {
        if self.is_reactive() {
            self.fill_reactive(buf, dialect);
        } else {
            self.fill_plain(buf, dialect);
        }
    }

    fn fill_plain(&self, buf: &mut GenBuffer, dialect: Dialect) {
        let decl_kw = plain_binding(dialect);
        match &self.kind {
            StmtKind::Decl {
                keyword,
                name,
                init,
                head,
            } => {
                let kw = decl_keyword(keyword, dialect);
                buf.fill(*head, format!("{kw} {name} = {init};"));
            }
            StmtKind::If { clauses } => {
                for (i, clause) in clauses.iter().enumerate() {
                    let text = match (&clause.cond, i) {
                        (Some(c), 0) => format!("if ({c}) {{"),
                        (Some(c), _) => format!("}} else if ({c}) {{"),
                        (None, _) => "} else {".to_string(),
                    };
                    buf.fill(clause.head, text);
                }
            }
            StmtKind::While { head, cond } => {
                buf.fill(*head, format!("while ({cond}) {{"));
            }
            StmtKind::For { head, header } => {
                buf.fill(*head, format!("for ({header}) {{"));
            }
            StmtKind::Foreach { head, form } => {
                buf.fill(*head, plain_foreach_head(form, dialect, decl_kw));
            }
            StmtKind::Switch { head, disc } => {
                buf.fill(*head, format!("switch ({disc}) {{"));
            }
        }
        if let Some(tail) = self.tail {
            buf.fill(tail, "}");
        }
    }

    fn fill_reactive(&self, buf: &mut GenBuffer, dialect: Dialect) {
        match &self.kind {
            StmtKind::Decl {
                keyword,
                name,
                init,
                head,
            } => {
                let kw = decl_keyword(keyword, dialect);
                buf.fill(
                    *head,
                    format!(
                        "{kw} {name}; wf.watch(ctx, {}, {} {name} = {init}; }});",
                        self.deps.emit_array(),
                        closure_open("", dialect),
                    ),
                );
            }
            StmtKind::If { clauses } => {
                let pairs: Vec<String> = clauses
                    .iter()
                    .map(|c| match &c.cond {
                        Some(cond) => {
                            format!("[{}, {}]", expr_closure(cond, dialect), c.deps.emit_array())
                        }
                        None => "[null, []]".to_string(),
                    })
                    .collect();
                for (i, clause) in clauses.iter().enumerate() {
                    let text = if i == 0 {
                        format!(
                            "wf.cond(ctx, [{}], [{}",
                            pairs.join(", "),
                            closure_open("", dialect)
                        )
                    } else {
                        format!("}}, {}", closure_open("", dialect))
                    };
                    buf.fill(clause.head, text);
                }
                if let Some(tail) = self.tail {
                    buf.fill(tail, "}]);");
                }
            }
            StmtKind::While { head, cond } => {
                self.fill_watch_wrapped(buf, dialect, *head, &format!("while ({cond}) {{"));
            }
            StmtKind::For { head, header } => {
                self.fill_watch_wrapped(buf, dialect, *head, &format!("for ({header}) {{"));
            }
            StmtKind::Foreach { head, form } => {
                let key = self
                    .deps
                    .first()
                    .map(crate::js::js_string)
                    .unwrap_or_else(|| "null".to_string());
                let text = match form {
                    ForeachForm::Array { item, expr } => format!(
                        "wf.eachA(ctx, {key}, {}, {}",
                        expr_closure(expr, dialect),
                        closure_open(item, dialect),
                    ),
                    ForeachForm::Object { key: k, value, expr } => format!(
                        "wf.eachO(ctx, {key}, {}, {}",
                        expr_closure(expr, dialect),
                        closure_open(&format!("{k}, {value}"), dialect),
                    ),
                    ForeachForm::Range { var, from, to } => format!(
                        "wf.eachR(ctx, {key}, {}, {}",
                        expr_closure(&format!("[({from}), ({to})]"), dialect),
                        closure_open(var, dialect),
                    ),
                };
                buf.fill(*head, text);
                if let Some(tail) = self.tail {
                    buf.fill(tail, "});");
                }
            }
            StmtKind::Switch { head, disc } => {
                self.fill_watch_wrapped(buf, dialect, *head, &format!("switch ({disc}) {{"));
            }
        }
    }

    /// Statements with no dedicated reactive helper rerun whole under
    /// `wf.watch`.
    fn fill_watch_wrapped(
        &self,
        buf: &mut GenBuffer,
        dialect: Dialect,
        head: SlotRef,
        opening: &str,
    ) {
        buf.fill(
            head,
            format!(
                "wf.watch(ctx, {}, {} {opening}",
                self.deps.emit_array(),
                closure_open("", dialect),
            ),
        );
        if let Some(tail) = self.tail {
            buf.fill(tail, "} });");
        }
    }
}

/// `let` has no ES5 rendering; every other keyword passes through.
fn decl_keyword<'k>(keyword: &'k str, dialect: Dialect) -> &'k str {
    if keyword == "let" && dialect == Dialect::Es5 {
        "var"
    } else {
        keyword
    }
}

fn plain_binding(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Es6 => "const",
        Dialect::Es5 => "var",
    }
}

fn plain_foreach_head(form: &ForeachForm, dialect: Dialect, kw: &'static str) -> String {
    match form {
        ForeachForm::Array { item, expr } => match dialect {
            Dialect::Es6 => format!("for (const {item} of ({expr})) {{"),
            Dialect::Es5 => format!(
                "for (var {item}_i = 0; {item}_i < ({expr}).length; {item}_i++) \
                 {{ var {item} = ({expr})[{item}_i];"
            ),
        },
        ForeachForm::Object { key, value, expr } => {
            format!("for ({kw} {key} in ({expr})) {{ {kw} {value} = ({expr})[{key}];")
        }
        ForeachForm::Range { var, from, to } => {
            let binding = match dialect {
                Dialect::Es6 => "let",
                Dialect::Es5 => "var",
            };
            format!("for ({binding} {var} = ({from}); {var} <= ({to}); {var}++) {{")
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
    use pretty_assertions::assert_eq;

    fn deps(paths: &[&str]) -> DepSet {
        let mut d = DepSet::new();
        for p in paths {
            d.push(*p);
        }
        d
    }

    // === plain renderings ===

    #[test]
    fn plain_if_else_chain() {
        let mut buf = GenBuffer::new();
        let h0 = buf.reserve("clause-head");
        buf.push(" a(); ");
        let h1 = buf.reserve("clause-head");
        buf.push(" b(); ");
        let tail = buf.reserve("stmt-tail");
        let stmt = Statement {
            seq: 0,
            kind: StmtKind::If {
                clauses: vec![
                    Clause {
                        head: h0,
                        cond: Some("x > 1".into()),
                        deps: DepSet::new(),
                    },
                    Clause {
                        head: h1,
                        cond: None,
                        deps: DepSet::new(),
                    },
                ],
            },
            deps: DepSet::new(),
            tail: Some(tail),
        };
        stmt.finalize(&mut buf, Dialect::Es6);
        assert_eq!(buf.assemble(), "if (x > 1) { a(); } else { b(); }");
    }

    #[test]
    fn plain_foreach_array_es6() {
        let mut buf = GenBuffer::new();
        let head = buf.reserve("each-head");
        buf.push(" use(item); ");
        let tail = buf.reserve("stmt-tail");
        let stmt = Statement {
            seq: 0,
            kind: StmtKind::Foreach {
                head,
                form: ForeachForm::Array {
                    item: "item".into(),
                    expr: "list".into(),
                },
            },
            deps: DepSet::new(),
            tail: Some(tail),
        };
        stmt.finalize(&mut buf, Dialect::Es6);
        assert_eq!(buf.assemble(), "for (const item of (list)) { use(item); }");
    }

    #[test]
    fn plain_decl_has_no_tail() {
        let mut buf = GenBuffer::new();
        let head = buf.reserve("decl");
        let stmt = Statement {
            seq: 0,
            kind: StmtKind::Decl {
                keyword: "let".into(),
                name: "n".into(),
                init: "1 + 2".into(),
                head,
            },
            deps: DepSet::new(),
            tail: None,
        };
        stmt.finalize(&mut buf, Dialect::Es6);
        assert_eq!(buf.assemble(), "let n = 1 + 2;");
    }

    #[test]
    fn plain_let_downgrades_to_var_for_es5() {
        let mut buf = GenBuffer::new();
        let head = buf.reserve("decl");
        let stmt = Statement {
            seq: 0,
            kind: StmtKind::Decl {
                keyword: "let".into(),
                name: "n".into(),
                init: "1 + 2".into(),
                head,
            },
            deps: DepSet::new(),
            tail: None,
        };
        stmt.finalize(&mut buf, Dialect::Es5);
        assert_eq!(buf.assemble(), "var n = 1 + 2;");
    }

    // === reactive renderings ===

    #[test]
    fn reactive_if_becomes_cond_call() {
        let mut buf = GenBuffer::new();
        let h0 = buf.reserve("clause-head");
        buf.push(" a(); ");
        let h1 = buf.reserve("clause-head");
        buf.push(" b(); ");
        let tail = buf.reserve("stmt-tail");
        let c0 = deps(&["flag"]);
        let mut all = DepSet::new();
        all.merge(&c0);
        let stmt = Statement {
            seq: 0,
            kind: StmtKind::If {
                clauses: vec![
                    Clause {
                        head: h0,
                        cond: Some("wf.get(ctx, \"flag\")".into()),
                        deps: c0,
                    },
                    Clause {
                        head: h1,
                        cond: None,
                        deps: DepSet::new(),
                    },
                ],
            },
            deps: all,
            tail: Some(tail),
        };
        stmt.finalize(&mut buf, Dialect::Es6);
        assert_eq!(
            buf.assemble(),
            "wf.cond(ctx, [[() => (wf.get(ctx, \"flag\")), [\"flag\"]], [null, []]], \
             [() => { a(); }, () => { b(); }]);"
        );
    }

    #[test]
    fn reactive_foreach_array_uses_each_helper() {
        let mut buf = GenBuffer::new();
        let head = buf.reserve("each-head");
        buf.push(" row(item); ");
        let tail = buf.reserve("stmt-tail");
        let stmt = Statement {
            seq: 0,
            kind: StmtKind::Foreach {
                head,
                form: ForeachForm::Array {
                    item: "item".into(),
                    expr: "wf.get(ctx, \"items\")".into(),
                },
            },
            deps: deps(&["items"]),
            tail: Some(tail),
        };
        stmt.finalize(&mut buf, Dialect::Es6);
        assert_eq!(
            buf.assemble(),
            "wf.eachA(ctx, \"items\", () => (wf.get(ctx, \"items\")), (item) => { row(item); });"
        );
    }

    #[test]
    fn reactive_while_is_watch_wrapped() {
        let mut buf = GenBuffer::new();
        let head = buf.reserve("stmt-head");
        buf.push(" tick(); ");
        let tail = buf.reserve("stmt-tail");
        let stmt = Statement {
            seq: 0,
            kind: StmtKind::While {
                head,
                cond: "wf.get(ctx, \"busy\")".into(),
            },
            deps: deps(&["busy"]),
            tail: Some(tail),
        };
        stmt.finalize(&mut buf, Dialect::Es6);
        assert_eq!(
            buf.assemble(),
            "wf.watch(ctx, [\"busy\"], () => { while (wf.get(ctx, \"busy\")) { tick(); } });"
        );
    }

    #[test]
    fn es5_closures_use_function_syntax() {
        let mut buf = GenBuffer::new();
        let head = buf.reserve("decl");
        let stmt = Statement {
            seq: 0,
            kind: StmtKind::Decl {
                keyword: "let".into(),
                name: "x".into(),
                init: "wf.get(ctx, \"a\")".into(),
                head,
            },
            deps: deps(&["a"]),
            tail: None,
        };
        stmt.finalize(&mut buf, Dialect::Es5);
        assert_eq!(
            buf.assemble(),
            "var x; wf.watch(ctx, [\"a\"], function () { x = wf.get(ctx, \"a\"); });"
        );
    }
}
