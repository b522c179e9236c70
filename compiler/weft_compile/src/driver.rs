//! The compile driver.
//!
//! Owns the scanner, the generated buffer, the open-statement stack,
//! and the op-chain stack for one compile call. Mode runners live in
//! `mode/` as further `impl Driver` blocks; this file holds the shared
//! state, the element/tag handling, and the end-of-compile rewrite
//! pass that fills every reserved slot.

use std::time::Instant;

use tracing::debug;
use weft_diagnostic::{ErrorCode, Warning};
use weft_scan::{Scanner, Span};

use crate::buffer::{GenBuffer, SlotRef};
use crate::config::{Dialect, ModuleKind, Options};
use crate::deps::DepSet;
use crate::error::CompileError;
use crate::features::FeatureSet;
use crate::idgen::IdGen;
use crate::js::{js_key, js_string};
use crate::mode::expr::{rewrite_expr, Rewritten};
use crate::mode::state::{Chain, TextRun};
use crate::mode::style::flatten_css;
use crate::statement::{closure_open, expr_closure, Clause, ForeachForm, Statement, StmtKind};
use crate::table::{Closer, ModeKind, ModeTable, Region};
use crate::tag::{
    Attr, AttrClass, AttrName, AttrValue, Inherit, Tag, TagName, TagSigil,
};
use crate::Output;

/// HTML elements that never take a body.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// A statement whose body is still being parsed.
#[derive(Debug)]
pub(crate) struct OpenStmt {
    pub seq: u32,
    pub span: Span,
    /// Current clause body is newline-terminated instead of braced.
    pub implicit: bool,
    pub deps: DepSet,
    pub kind: OpenKind,
}

#[derive(Debug)]
pub(crate) enum OpenKind {
    If { clauses: Vec<Clause> },
    While { head: SlotRef, cond: String },
    For { head: SlotRef, header: String },
    Foreach { head: SlotRef, form: ForeachForm },
}

pub(crate) struct Driver<'s> {
    pub sc: Scanner<'s>,
    pub buf: GenBuffer,
    pub opts: &'s Options,
    pub table: &'s ModeTable,
    pub ids: &'s mut IdGen,
    pub features: FeatureSet,
    pub warnings: Vec<Warning>,
    /// Statement stack; `Region::stmt_mark` fences it per region.
    pub open: Vec<OpenStmt>,
    /// Closed statements awaiting the rewrite pass.
    pub closed: Vec<Statement>,
    pub next_seq: u32,
    /// One op chain per nested tag body, innermost last.
    pub chains: Vec<Chain>,
    pub text: TextRun,
}

/// Run one compile over `source`.
pub(crate) fn run(
    opts: &Options,
    table: &ModeTable,
    source: &str,
    ids: &mut IdGen,
) -> Result<Output, CompileError> {
    let started = Instant::now();
    let entry = table.lookup(&opts.entry_mode).ok_or_else(|| {
        CompileError::new(
            ErrorCode::UnknownMode,
            format!("unknown entry mode `{}`", opts.entry_mode),
            Span::at(0),
        )
    })?;

    let mut drv = Driver {
        sc: Scanner::new(source),
        buf: GenBuffer::new(),
        opts,
        table,
        ids,
        features: FeatureSet::empty(),
        warnings: Vec::new(),
        open: Vec::new(),
        closed: Vec::new(),
        next_seq: 0,
        chains: Vec::new(),
        text: TextRun::default(),
    };

    let root = drv.ids.node_var();
    drv.chains.push(Chain::new(root.clone()));
    drv.buf
        .push(closure_open(&format!("ctx, {root}"), opts.dialect));
    drv.buf.push(" ");
    if opts.version_check {
        drv.features |= FeatureSet::CHECK;
        drv.buf.push("wf.check(\"1\"); ");
    }

    let region = Region {
        closer: Closer::Root,
        open_span: Span::at(0),
        stmt_mark: 0,
    };
    match entry.kind {
        ModeKind::Logic => drv.run_logic(&region)?,
        ModeKind::Code => drv.run_code(source, 0)?,
        ModeKind::Text => drv.run_text(source, 0)?,
        ModeKind::Style => {
            let css = flatten_css(source, 0)?;
            drv.emit_style(&css);
        }
    }
    drv.flush_all();
    drv.check_statements_closed(&region)?;
    drv.finalize();
    drv.buf.push(" }");

    let factory = drv.buf.assemble();
    let code = assemble_output(&factory, opts);
    debug!(
        features = %drv.features.entry_points().join(","),
        warnings = drv.warnings.len(),
        "compile finished"
    );
    Ok(Output {
        code,
        features: drv.features,
        warnings: drv.warnings,
        elapsed: started.elapsed(),
    })
}

fn assemble_output(factory: &str, opts: &Options) -> String {
    let wrapped = match opts.module {
        ModuleKind::None => factory.to_string(),
        ModuleKind::CommonJs => format!("module.exports = {factory};"),
        ModuleKind::Esm => format!("export default {factory};"),
        ModuleKind::Iife => format!(
            "(function (global) {{ global.{} = {factory}; }})\
             (typeof self !== \"undefined\" ? self : this);",
            opts.namespace
        ),
    };
    let mut out = String::new();
    if !opts.prepend.is_empty() {
        out.push_str(&opts.prepend);
        out.push('\n');
    }
    out.push_str(&wrapped);
    if !opts.append.is_empty() {
        out.push('\n');
        out.push_str(&opts.append);
    }
    out
}

impl<'s> Driver<'s> {
    pub(crate) fn dialect(&self) -> Dialect {
        self.opts.dialect
    }

    pub(crate) fn seq(&mut self) -> u32 {
        let s = self.next_seq;
        self.next_seq += 1;
        s
    }

    pub(crate) fn warn(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        self.warnings.push(Warning::new(code, message, span));
    }

    /// Rewrite an expression and mark the `GET` feature when it reads
    /// reactive state.
    pub(crate) fn rewrite(&mut self, raw: &str, base: u32) -> Result<Rewritten, CompileError> {
        let r = rewrite_expr(raw, base)?;
        if !r.deps.is_empty() {
            self.features |= FeatureSet::GET;
        }
        Ok(r)
    }

    pub(crate) fn chain_op(&mut self, op: String) {
        self.features |= FeatureSet::CHAIN;
        if let Some(chain) = self.chains.last_mut() {
            chain.push_op(op);
        }
    }

    pub(crate) fn flush_text(&mut self) {
        if let Some(t) = self.text.take() {
            self.chain_op(format!(".txt({})", js_string(&t)));
        }
    }

    pub(crate) fn flush_all(&mut self) {
        self.flush_text();
        if let Some(chain) = self.chains.last_mut() {
            chain.flush(&mut self.buf);
        }
    }

    pub(crate) fn emit_style(&mut self, css: &str) {
        self.flush_all();
        self.features |= FeatureSet::STYLE;
        self.buf.push(format!("wf.style({}); ", js_string(css)));
    }

    // === statement lifecycle ===

    /// Pop the innermost open statement, reserve its tail slot, and
    /// queue it for the rewrite pass.
    pub(crate) fn finish_stmt(&mut self) -> Result<(), CompileError> {
        self.flush_all();
        let Some(top) = self.open.pop() else {
            return Ok(());
        };
        let tail = self.buf.reserve("stmt-tail");
        self.buf.push(" ");
        let kind = match top.kind {
            OpenKind::If { clauses } => StmtKind::If { clauses },
            OpenKind::While { head, cond } => StmtKind::While { head, cond },
            OpenKind::For { head, header } => StmtKind::For { head, header },
            OpenKind::Foreach { head, form } => StmtKind::Foreach { head, form },
        };
        self.closed.push(Statement {
            seq: top.seq,
            kind,
            deps: top.deps,
            tail: Some(tail),
        });
        Ok(())
    }

    pub(crate) fn check_statements_closed(
        &mut self,
        region: &Region,
    ) -> Result<(), CompileError> {
        if self.open.len() > region.stmt_mark {
            let top = &self.open[self.open.len() - 1];
            return Err(CompileError::new(
                ErrorCode::UnclosedStatement,
                "statement body is never closed",
                top.span,
            ));
        }
        Ok(())
    }

    /// The end-of-compile rewrite pass: replay closed statements in
    /// open order, choose plain or reactive rendering, fill slots.
    pub(crate) fn finalize(&mut self) {
        let mut closed = std::mem::take(&mut self.closed);
        closed.sort_by_key(|s| s.seq);
        let dialect = self.dialect();
        for stmt in &closed {
            if stmt.is_reactive() {
                self.features |= match stmt.kind {
                    StmtKind::If { .. } => FeatureSet::COND,
                    StmtKind::Foreach { .. } => FeatureSet::EACH,
                    _ => FeatureSet::WATCH,
                };
                debug!(seq = stmt.seq, deps = stmt.deps.len(), "reactive statement");
            }
            stmt.finalize(&mut self.buf, dialect);
        }
    }

    // === tags ===

    /// Handle a tag. The scanner rests ON the `<`.
    pub(crate) fn handle_tag(&mut self) -> Result<(), CompileError> {
        self.sc.advance(1);
        let mut rewriter = |raw: &str, base: u32| {
            rewrite_expr(raw, base).map(|r| (r.code, r.deps))
        };
        let tag = crate::tag::parse_tag(&mut self.sc, &mut rewriter)?;
        if !tag.deps.is_empty() {
            self.features |= FeatureSet::GET;
        }
        match tag.sigil {
            TagSigil::ModeSwitch => self.handle_mode_tag(&tag),
            TagSigil::Directive => self.handle_directive_tag(&tag),
            _ => self.handle_element(&tag),
        }
    }

    fn handle_mode_tag(&mut self, tag: &Tag) -> Result<(), CompileError> {
        let Some(name) = tag.name.literal() else {
            return Err(CompileError::new(
                ErrorCode::UnknownMode,
                "mode name must be literal",
                tag.span,
            ));
        };
        let Some(entry) = self.table.lookup(name) else {
            return Err(CompileError::new(
                ErrorCode::UnknownMode,
                format!("unknown mode `{name}`"),
                tag.span,
            ));
        };
        if entry.deprecated {
            self.warn(
                ErrorCode::DeprecatedSyntax,
                format!("`<#{name}>` is deprecated; use `<#code>`"),
                tag.span,
            );
        }
        debug!(mode = name, "mode switch");
        if tag.self_closing {
            return Ok(());
        }
        if entry.kind == ModeKind::Logic {
            let region = Region {
                closer: Closer::Name(format!("#{name}")),
                open_span: tag.span,
                stmt_mark: self.open.len(),
            };
            return self.run_logic(&region);
        }
        // Non-logic regions are captured as raw text up to the literal
        // closing tag; the inner grammar owns everything in between.
        let close_pat = format!("</#{name}>");
        let rest = self.sc.rest();
        let Some(end) = rest.find(&close_pat) else {
            return Err(CompileError::new(
                ErrorCode::UnclosedTag,
                format!("`<#{name}>` region is never closed"),
                tag.span,
            ));
        };
        let raw = &rest[..end];
        let base = self.sc.abs();
        self.sc.advance(end + close_pat.len());
        match entry.kind {
            ModeKind::Code => self.run_code(raw, base),
            ModeKind::Text => self.run_text(raw, base),
            ModeKind::Style => {
                let css = flatten_css(raw, base)?;
                self.emit_style(&css);
                Ok(())
            }
            ModeKind::Logic => unreachable!("handled above"),
        }
    }

    fn handle_directive_tag(&mut self, tag: &Tag) -> Result<(), CompileError> {
        let name = tag.name.literal().unwrap_or_default();
        match name {
            "slot" => {
                let slot = slot_name(tag).ok_or_else(|| {
                    CompileError::new(
                        ErrorCode::MissingAttributeValue,
                        "`<:slot>` requires a slot name",
                        tag.span,
                    )
                })?;
                self.flush_text();
                self.chain_op(format!(".reg({})", js_string(&slot)));
                Ok(())
            }
            other => Err(CompileError::new(
                ErrorCode::UnknownDirective,
                format!("unknown directive tag `<:{other}>`"),
                tag.span,
            )),
        }
    }

    fn handle_element(&mut self, tag: &Tag) -> Result<(), CompileError> {
        self.flush_all();
        if tag.writes_state {
            self.features |= FeatureSet::SET;
        }

        let id = self.element_id(tag)?;
        let opts = self.render_options(tag);
        let call = if tag.widget {
            self.features |= FeatureSet::WIDGET;
            let name = tag.name.literal().unwrap_or_default();
            format!("wf.widget(ctx, {}", js_string(name))
        } else {
            self.features |= FeatureSet::EL;
            let name = match &tag.name {
                TagName::Literal(n) => js_string(n),
                TagName::Computed(code) => format!("({code})"),
            };
            format!("wf.el(ctx, {name}, {}", js_string(&id))
        };
        debug!(id = %id, widget = tag.widget, "open element");

        let has_body = !tag.self_closing && !is_void(tag);
        // A `:slot` directive registers the node even without a body,
        // so it still needs the node closure.
        let needs_node = has_body || tag.directives.slot.is_some();
        if !needs_node {
            if opts.is_empty() {
                self.buf.push(format!("{call}); "));
            } else {
                self.buf.push(format!("{call}, {opts}); "));
            }
        } else {
            let node = self.ids.node_var();
            let opts_arg = if opts.is_empty() { "0" } else { opts.as_str() };
            self.buf.push(format!(
                "{call}, {opts_arg}, {} ",
                closure_open(&node, self.dialect())
            ));
            self.chains.push(Chain::new(node));
            if let Some(slot) = &tag.directives.slot {
                let op = format!(".reg({})", js_string(slot));
                self.chain_op(op);
            }
            if has_body {
                self.run_body(tag)?;
            }
            self.flush_all();
            self.chains.pop();
            self.buf.push("}); ");
        }

        if tag.directives.debug {
            self.features |= FeatureSet::DBG;
            self.buf.push(format!("wf.dbg(ctx, {}); ", js_string(&id)));
        }
        Ok(())
    }

    /// Run a tag body in the mode its `:mode` directive selects; the
    /// logic mode when none is named.
    fn run_body(&mut self, tag: &Tag) -> Result<(), CompileError> {
        let entry = match &tag.directives.mode {
            Some(mode) => {
                let Some(entry) = self.table.lookup(mode) else {
                    return Err(CompileError::new(
                        ErrorCode::UnknownMode,
                        format!("unknown mode `{mode}`"),
                        tag.span,
                    ));
                };
                if entry.deprecated {
                    self.warn(
                        ErrorCode::DeprecatedSyntax,
                        format!("mode `{mode}` is deprecated; use `code`"),
                        tag.span,
                    );
                }
                Some(entry)
            }
            None => None,
        };
        match entry.map(|e| e.kind) {
            None | Some(ModeKind::Logic) => {
                let region = Region {
                    closer: match &tag.name {
                        TagName::Literal(n) => Closer::Name(n.clone()),
                        TagName::Computed(_) => Closer::Any,
                    },
                    open_span: tag.span,
                    stmt_mark: self.open.len(),
                };
                self.run_logic(&region)
            }
            Some(kind) => {
                // Raw capture needs a literal closing tag to stop at.
                let Some(name) = tag.name.literal() else {
                    return Err(CompileError::new(
                        ErrorCode::MalformedAttribute,
                        "`:mode` on a computed tag name requires the logic mode",
                        tag.span,
                    ));
                };
                let close_pat = format!("</{name}>");
                let rest = self.sc.rest();
                let Some(end) = rest.find(&close_pat) else {
                    return Err(CompileError::new(
                        ErrorCode::UnclosedTag,
                        format!("`<{name}>` region is never closed"),
                        tag.span,
                    ));
                };
                let raw = &rest[..end];
                let base = self.sc.abs();
                self.sc.advance(end + close_pat.len());
                match kind {
                    ModeKind::Code => self.run_code(raw, base),
                    ModeKind::Text => self.run_text(raw, base),
                    ModeKind::Style => {
                        let css = flatten_css(raw, base)?;
                        self.emit_style(&css);
                        Ok(())
                    }
                    ModeKind::Logic => unreachable!("handled above"),
                }
            }
        }
    }

    /// Compute the element id descriptor: `?` optional-update, `&`
    /// reference re-query, `+` adopt, `=` clone.
    fn element_id(&mut self, tag: &Tag) -> Result<String, CompileError> {
        if tag.sigil == TagSigil::Reference {
            let target = match (&tag.directives.query, tag.name.literal()) {
                (Some(q), _) => q.clone(),
                (None, Some(n)) => n.to_string(),
                (None, None) => {
                    return Err(CompileError::new(
                        ErrorCode::MalformedAttribute,
                        "reference tag requires a literal name",
                        tag.span,
                    ));
                }
            };
            return Ok(format!("&{target}"));
        }
        let fresh = self.ids.element_id();
        Ok(if tag.sigil == TagSigil::Optional {
            format!("?{fresh}")
        } else if tag.directives.adopt.is_some() {
            format!("+{fresh}")
        } else if tag.directives.clone {
            format!("={fresh}")
        } else {
            fresh
        })
    }

    /// Render the positional options array: `[attrs, groups, spreads,
    /// transitions, visibility, widget, ns, inherited, adopt]`.
    /// Trailing empties are trimmed, interior empties become `0`.
    /// Empty overall renders as the empty string.
    pub(crate) fn render_options(&mut self, tag: &Tag) -> String {
        let dialect = self.dialect();
        let mut attrs: Vec<String> = Vec::new();
        let mut groups: Vec<String> = Vec::new();
        let mut spreads: Vec<String> = Vec::new();
        let mut construct: Vec<String> = Vec::new();
        let mut extend: Vec<String> = Vec::new();

        if !tag.classes.is_empty() {
            attrs.push(format!("class: {}", js_string(&tag.classes.join(" "))));
        }

        for attr in &tag.attrs {
            let value = render_attr_value(attr, dialect);
            if attr.class == AttrClass::Spread {
                if let AttrValue::Expr { code, .. } = &attr.value {
                    spreads.push(format!("({code})"));
                }
                continue;
            }
            match &attr.name {
                AttrName::Literal(n) => {
                    let n = self
                        .opts
                        .attr_overrides
                        .get(n)
                        .map_or(n.as_str(), String::as_str);
                    match attr.class {
                        AttrClass::WidgetArg => {
                            construct.push(format!("{}: {value}", js_key(n)));
                        }
                        AttrClass::WidgetExtend => {
                            extend.push(format!("{}: {value}", js_key(n)));
                        }
                        _ => {
                            let mut key = format!("{}{n}", class_prefix(attr.class));
                            if attr.optional {
                                key.insert(0, '?');
                            }
                            attrs.push(format!("{}: {value}", js_key(&key)));
                        }
                    }
                }
                AttrName::Group(names) => {
                    let list: Vec<String> = names.iter().map(|n| js_string(n)).collect();
                    groups.push(format!("[[{}], {value}]", list.join(", ")));
                }
                AttrName::Computed(code) => {
                    groups.push(format!("[[({code})], {value}]"));
                }
            }
        }

        let transitions = if tag.transitions.is_empty() {
            None
        } else {
            let entries: Vec<String> = tag
                .transitions
                .iter()
                .map(|(name, v)| {
                    format!("{}: {}", js_key(name), render_value(v, false, false, dialect))
                })
                .collect();
            Some(format!("{{ {} }}", entries.join(", ")))
        };

        let widget = if construct.is_empty() && extend.is_empty() {
            None
        } else if extend.is_empty() {
            Some(format!("[{{ {} }}]", construct.join(", ")))
        } else {
            Some(format!(
                "[{{ {} }}, {{ {} }}]",
                construct.join(", "),
                extend.join(", ")
            ))
        };

        let slots: [Option<String>; 9] = [
            (!attrs.is_empty()).then(|| format!("{{ {} }}", attrs.join(", "))),
            (!groups.is_empty()).then(|| format!("[{}]", groups.join(", "))),
            (!spreads.is_empty()).then(|| format!("[{}]", spreads.join(", "))),
            transitions,
            tag.visibility
                .as_ref()
                .map(|v| render_value(v, false, false, dialect)),
            widget,
            tag.directives.ns.as_ref().map(|ns| js_string(ns)),
            tag.directives.inherit.as_ref().map(render_inherit),
            tag.directives.adopt.as_ref().map(|c| format!("({c})")),
        ];

        let last = slots.iter().rposition(Option::is_some);
        let Some(last) = last else {
            return String::new();
        };
        let rendered: Vec<String> = slots[..=last]
            .iter()
            .map(|s| s.clone().unwrap_or_else(|| "0".to_string()))
            .collect();
        format!("[{}]", rendered.join(", "))
    }
}

fn is_void(tag: &Tag) -> bool {
    tag.name
        .literal()
        .is_some_and(|n| VOID_ELEMENTS.contains(&n))
}

fn slot_name(tag: &Tag) -> Option<String> {
    for attr in &tag.attrs {
        if let AttrName::Literal(n) = &attr.name {
            match &attr.value {
                AttrValue::Literal(v) if n == "name" => return Some(v.clone()),
                AttrValue::None => return Some(n.clone()),
                _ => {}
            }
        }
    }
    None
}

fn class_prefix(class: AttrClass) -> &'static str {
    match class {
        AttrClass::Plain => "",
        AttrClass::Property => "@",
        AttrClass::StyleDecl => "&",
        AttrClass::Event => "+",
        AttrClass::WidgetArg => "$",
        AttrClass::WidgetExtend => "$$",
        AttrClass::Spread => "~",
    }
}

fn render_attr_value(attr: &Attr, dialect: Dialect) -> String {
    render_value(
        &attr.value,
        attr.negated,
        attr.class == AttrClass::Event,
        dialect,
    )
}

fn render_value(value: &AttrValue, negated: bool, event: bool, dialect: Dialect) -> String {
    match value {
        AttrValue::None => if negated { "false" } else { "true" }.to_string(),
        AttrValue::Literal(s) => js_string(s),
        AttrValue::Expr { code, deps } => {
            let code = if negated {
                format!("!({code})")
            } else {
                code.clone()
            };
            if event {
                format!("{} {code}; }}", closure_open("$args", dialect))
            } else if deps.is_empty() {
                format!("({code})")
            } else {
                format!("[{}, {}]", expr_closure(&code, dialect), deps.emit_array())
            }
        }
    }
}

fn render_inherit(inherit: &Inherit) -> String {
    match inherit {
        Inherit::Level(n) => n.to_string(),
        Inherit::All => "\"*\"".to_string(),
        Inherit::Whitelist(names) => {
            let list: Vec<String> = names.iter().map(|n| js_string(n)).collect();
            format!("[{}]", list.join(", "))
        }
    }
}
