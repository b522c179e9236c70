//! Tag and attribute grammar.
//!
//! Tags are parsed structurally here; what the driver does with the
//! parsed tag (element id allocation, options assembly, child mode
//! spawning) lives in `driver.rs`. Attribute values written as `{expr}`
//! are re-parsed by the caller-supplied rewriter so reactive references
//! inside them collect dependencies exactly like body expressions.

use smallvec::SmallVec;
use weft_diagnostic::ErrorCode;
use weft_scan::{Scanner, Span};

use crate::deps::DepSet;
use crate::error::CompileError;

/// Rewrites a raw `{expr}` body: returns generated JS plus collected
/// dependencies. The second argument is the absolute offset of the
/// expression text for error spans.
pub(crate) type ExprRewriter<'r> =
    dyn FnMut(&str, u32) -> Result<(String, DepSet), CompileError> + 'r;

/// Leading tag sigil, directly after `<`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum TagSigil {
    /// Ordinary element.
    None,
    /// `<?name>`: update the element only when it already exists.
    Optional,
    /// `<#name>`: switch the body into another mode.
    ModeSwitch,
    /// `<:name>`: compile-time directive tag.
    Directive,
    /// `<&name>`: re-query a previously registered element.
    Reference,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) enum TagName {
    Literal(String),
    /// `<{expr}>`: name computed at runtime; already rewritten.
    Computed(String),
}

impl TagName {
    pub fn literal(&self) -> Option<&str> {
        match self {
            TagName::Literal(s) => Some(s),
            TagName::Computed(_) => None,
        }
    }
}

/// Attribute classification by prefix.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum AttrClass {
    /// No prefix: plain markup attribute.
    Plain,
    /// `@`: element property.
    Property,
    /// `&`: style declaration.
    StyleDecl,
    /// `+`: event handler.
    Event,
    /// `$`: widget construct argument.
    WidgetArg,
    /// `$$`: widget extend argument.
    WidgetExtend,
    /// `~`: spread.
    Spread,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) enum AttrName {
    Literal(String),
    /// Rewritten `{expr}` name.
    Computed(String),
    /// `[a b c]`: several names sharing one value.
    Group(Vec<String>),
}

#[derive(Clone, Debug)]
pub(crate) enum AttrValue {
    /// Flag attribute, no `=`.
    None,
    /// `"..."` string literal, raw content without quotes.
    Literal(String),
    /// `{expr}`, rewritten; dependencies propagate to the tag.
    Expr { code: String, deps: DepSet },
}

impl AttrValue {
    pub fn deps(&self) -> Option<&DepSet> {
        match self {
            AttrValue::Expr { deps, .. } => Some(deps),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Attr {
    pub class: AttrClass,
    pub name: AttrName,
    pub value: AttrValue,
    /// `?` flag: only apply when the value is set.
    pub optional: bool,
    /// `!` flag: apply the negation of the value.
    pub negated: bool,
    pub span: Span,
}

/// How `:inherit` selects ancestor attributes.
#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) enum Inherit {
    /// Inherit from N levels of ancestors, nearest first.
    Level(u32),
    /// Inherit everything the ancestors carry.
    All,
    /// Inherit only the named attributes.
    Whitelist(Vec<String>),
}

/// Compile-time directives collected off the attribute list.
#[derive(Clone, Default, Debug)]
pub(crate) struct Directives {
    pub ns: Option<String>,
    pub inherit: Option<Inherit>,
    pub debug: bool,
    /// `:adopt={expr}`: adopt an existing node instead of creating.
    pub adopt: Option<String>,
    pub clone: bool,
    /// `:query={expr}`: selector override for the reference query.
    pub query: Option<String>,
    pub slot: Option<String>,
    pub mode: Option<String>,
}

/// A fully parsed opening tag.
#[derive(Debug)]
pub(crate) struct Tag {
    pub sigil: TagSigil,
    pub name: TagName,
    /// `.class` suffixes on the tag name.
    pub classes: SmallVec<[String; 2]>,
    /// Capitalized literal names denote widgets.
    pub widget: bool,
    pub attrs: Vec<Attr>,
    pub directives: Directives,
    /// `*show` visibility toggle, extracted from shorthand expansion.
    pub visibility: Option<AttrValue>,
    /// Transition entries such as `*fade`, `(name, config)`.
    pub transitions: Vec<(String, AttrValue)>,
    pub self_closing: bool,
    /// Union of every tag-level expression's dependencies: attribute
    /// values, computed names, directive expressions.
    pub deps: DepSet,
    /// A shorthand expanded into a `wf.set` write.
    pub writes_state: bool,
    pub span: Span,
}

/// Parse an opening tag. The scanner must rest on the byte after `<`.
pub(crate) fn parse_tag(
    sc: &mut Scanner<'_>,
    rewrite: &mut ExprRewriter<'_>,
) -> Result<Tag, CompileError> {
    let open = sc.abs() - 1;

    let sigil = match sc.current() {
        b'?' => TagSigil::Optional,
        b'#' => TagSigil::ModeSwitch,
        b':' => TagSigil::Directive,
        b'&' => TagSigil::Reference,
        _ => TagSigil::None,
    };
    if sigil != TagSigil::None {
        sc.advance(1);
    }

    let mut deps = DepSet::new();
    let (name, widget) = parse_tag_name(sc, rewrite, open, &mut deps)?;
    let mut classes = SmallVec::new();
    while sc.current() == b'.' {
        sc.advance(1);
        let class = sc.read_name(b"-");
        if class.is_empty() {
            return Err(CompileError::new(
                ErrorCode::UnterminatedTag,
                "expected class name after `.`",
                sc.here(),
            ));
        }
        classes.push(class.to_string());
    }

    let mut attrs = Vec::new();
    let mut directives = Directives::default();
    let self_closing = loop {
        sc.skip_ws_and_newlines();
        match sc.current() {
            b'>' => {
                sc.advance(1);
                break false;
            }
            b'/' => {
                sc.advance(1);
                sc.expect(b'>').map_err(CompileError::from)?;
                break true;
            }
            0 if sc.is_eof() => {
                return Err(CompileError::new(
                    ErrorCode::UnterminatedTag,
                    "tag is never closed with `>`",
                    Span::new(open, open + 1),
                ));
            }
            b':' => {
                sc.advance(1);
                parse_directive(sc, rewrite, &mut directives, &mut deps)?;
            }
            _ => {
                let attr = parse_attr(sc, rewrite, &mut deps)?;
                if let Some(d) = attr.value.deps() {
                    deps.merge(d);
                }
                attrs.push(attr);
            }
        }
    };

    let mut tag = Tag {
        sigil,
        name,
        classes,
        widget,
        attrs,
        directives,
        visibility: None,
        transitions: Vec::new(),
        self_closing,
        deps,
        writes_state: false,
        span: Span::new(open, sc.abs()),
    };
    expand_shorthands(&mut tag)?;
    Ok(tag)
}

fn parse_tag_name(
    sc: &mut Scanner<'_>,
    rewrite: &mut ExprRewriter<'_>,
    open: u32,
    deps: &mut DepSet,
) -> Result<(TagName, bool), CompileError> {
    if sc.current() == b'{' {
        let inner_base = sc.abs() + 1;
        let raw = sc.skip_enclosed(true).map_err(CompileError::from)?;
        let (code, name_deps) = rewrite(raw, inner_base)?;
        deps.merge(&name_deps);
        return Ok((TagName::Computed(code), false));
    }
    let name = sc.read_name(b"-");
    if name.is_empty() {
        return Err(CompileError::new(
            ErrorCode::UnterminatedTag,
            "expected tag name after `<`",
            Span::new(open, open + 1),
        ));
    }
    let widget = name.as_bytes()[0].is_ascii_uppercase();
    Ok((TagName::Literal(name.to_string()), widget))
}

/// Parse one `:directive` (the `:` is already consumed).
fn parse_directive(
    sc: &mut Scanner<'_>,
    rewrite: &mut ExprRewriter<'_>,
    out: &mut Directives,
    deps: &mut DepSet,
) -> Result<(), CompileError> {
    let start = sc.abs() - 1;
    let name = sc.read_name(&[]);
    let span = Span::new(start, sc.abs());
    let value = parse_value(sc, rewrite)?;
    if let Some(d) = value.deps() {
        deps.merge(d);
    }

    let require = |value: &AttrValue| -> Result<String, CompileError> {
        match value {
            AttrValue::Literal(s) => Ok(s.clone()),
            AttrValue::Expr { code, .. } => Ok(code.clone()),
            AttrValue::None => Err(CompileError::new(
                ErrorCode::MissingAttributeValue,
                format!("directive `:{name}` requires a value"),
                span,
            )),
        }
    };

    match name {
        "ns" => out.ns = Some(require(&value)?),
        "inherit" => out.inherit = Some(parse_inherit(&value)),
        "debug" => out.debug = true,
        "adopt" => out.adopt = Some(require(&value)?),
        "clone" => out.clone = true,
        "query" => out.query = Some(require(&value)?),
        "slot" => out.slot = Some(require(&value)?),
        "mode" => out.mode = Some(require(&value)?),
        _ => {
            return Err(CompileError::new(
                ErrorCode::UnknownDirective,
                format!("unknown directive `:{name}`"),
                span,
            ));
        }
    }
    Ok(())
}

fn parse_inherit(value: &AttrValue) -> Inherit {
    match value {
        AttrValue::None => Inherit::Level(1),
        AttrValue::Literal(s) | AttrValue::Expr { code: s, .. } => {
            let s = s.trim();
            if s == "*" {
                Inherit::All
            } else if let Ok(n) = s.parse::<u32>() {
                Inherit::Level(n)
            } else {
                Inherit::Whitelist(s.split_whitespace().map(str::to_string).collect())
            }
        }
    }
}

fn parse_attr(
    sc: &mut Scanner<'_>,
    rewrite: &mut ExprRewriter<'_>,
    deps: &mut DepSet,
) -> Result<Attr, CompileError> {
    let start = sc.abs();

    let mut optional = false;
    let mut negated = false;
    loop {
        match sc.current() {
            b'?' if !optional => {
                optional = true;
                sc.advance(1);
            }
            b'!' if !negated => {
                negated = true;
                sc.advance(1);
            }
            _ => break,
        }
    }

    let (class, shorthand) = match sc.current() {
        b'@' => {
            sc.advance(1);
            (AttrClass::Property, false)
        }
        b'&' => {
            sc.advance(1);
            (AttrClass::StyleDecl, false)
        }
        b'+' => {
            sc.advance(1);
            (AttrClass::Event, false)
        }
        b'~' => {
            sc.advance(1);
            (AttrClass::Spread, false)
        }
        b'*' => {
            sc.advance(1);
            (AttrClass::Plain, true)
        }
        b'$' if sc.peek() == b'$' => {
            sc.advance(2);
            (AttrClass::WidgetExtend, false)
        }
        b'$' => {
            sc.advance(1);
            (AttrClass::WidgetArg, false)
        }
        _ => (AttrClass::Plain, false),
    };

    let name = parse_attr_name(sc, rewrite, deps)?;
    let span = Span::new(start, sc.abs());
    let value = parse_value(sc, rewrite)?;

    // A computed name with no value has nothing to emit.
    if matches!(name, AttrName::Computed(_)) && matches!(value, AttrValue::None) {
        return Err(CompileError::new(
            ErrorCode::MissingAttributeValue,
            "computed attribute name requires a value",
            span,
        ));
    }

    if shorthand {
        // Shorthands are parked under a marker name and expanded once
        // the whole tag is parsed.
        let AttrName::Literal(sh) = name else {
            return Err(CompileError::new(
                ErrorCode::MalformedAttribute,
                "shorthand name must be literal",
                span,
            ));
        };
        return Ok(Attr {
            class: AttrClass::Plain,
            name: AttrName::Literal(format!("*{sh}")),
            value,
            optional,
            negated,
            span,
        });
    }

    Ok(Attr {
        class,
        name,
        value,
        optional,
        negated,
        span,
    })
}

fn parse_attr_name(
    sc: &mut Scanner<'_>,
    rewrite: &mut ExprRewriter<'_>,
    deps: &mut DepSet,
) -> Result<AttrName, CompileError> {
    match sc.current() {
        b'{' => {
            let inner_base = sc.abs() + 1;
            let raw = sc.skip_enclosed(true).map_err(CompileError::from)?;
            let (code, name_deps) = rewrite(raw, inner_base)?;
            deps.merge(&name_deps);
            Ok(AttrName::Computed(code))
        }
        b'[' => {
            let raw = sc.skip_enclosed(true).map_err(CompileError::from)?;
            let names: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
            if names.is_empty() {
                return Err(CompileError::new(
                    ErrorCode::MalformedAttribute,
                    "empty attribute name group",
                    sc.here(),
                ));
            }
            Ok(AttrName::Group(names))
        }
        _ => {
            let name = sc.read_name(b"-");
            if name.is_empty() {
                return Err(CompileError::new(
                    ErrorCode::MalformedAttribute,
                    "expected attribute name",
                    sc.here(),
                ));
            }
            Ok(AttrName::Literal(name.to_string()))
        }
    }
}

/// Parse an optional `= VALUE`. Values are `"..."`/`'...'` string
/// literals or `{expr}` sub-scans.
fn parse_value(
    sc: &mut Scanner<'_>,
    rewrite: &mut ExprRewriter<'_>,
) -> Result<AttrValue, CompileError> {
    if sc.current() != b'=' {
        return Ok(AttrValue::None);
    }
    sc.advance(1);
    match sc.current() {
        b'"' | b'\'' => {
            let before = sc.rest();
            sc.skip_string().map_err(CompileError::from)?;
            let consumed = before.len() - sc.rest().len();
            Ok(AttrValue::Literal(before[1..consumed - 1].to_string()))
        }
        b'{' => {
            let inner_base = sc.abs() + 1;
            let raw = sc.skip_enclosed(true).map_err(CompileError::from)?;
            let (code, deps) = rewrite(raw, inner_base)?;
            Ok(AttrValue::Expr { code, deps })
        }
        _ => Err(CompileError::new(
            ErrorCode::MalformedAttribute,
            "attribute value must be a string literal or `{expr}`",
            sc.here(),
        )),
    }
}

/// Expand `*` shorthands into their concrete forms.
fn expand_shorthands(tag: &mut Tag) -> Result<(), CompileError> {
    let mut kept = Vec::with_capacity(tag.attrs.len());
    for attr in tag.attrs.drain(..) {
        let AttrName::Literal(name) = &attr.name else {
            kept.push(attr);
            continue;
        };
        let Some(sh) = name.strip_prefix('*') else {
            kept.push(attr);
            continue;
        };
        match sh {
            "show" => tag.visibility = Some(attr.value),
            "fade" => tag.transitions.push(("fade".to_string(), attr.value)),
            "model" => {
                let (code, deps) = match &attr.value {
                    AttrValue::Expr { code, deps } => (code.clone(), deps.clone()),
                    _ => {
                        return Err(CompileError::new(
                            ErrorCode::MissingAttributeValue,
                            "`*model` requires an `{expr}` value",
                            attr.span,
                        ));
                    }
                };
                let setter = match deps.first() {
                    Some(path) => {
                        tag.writes_state = true;
                        format!("wf.set(ctx, {}, $args)", crate::js::js_string(path))
                    }
                    None => format!("({code}) = $args"),
                };
                kept.push(Attr {
                    class: AttrClass::Property,
                    name: AttrName::Literal("value".to_string()),
                    value: attr.value.clone(),
                    optional: attr.optional,
                    negated: false,
                    span: attr.span,
                });
                kept.push(Attr {
                    class: AttrClass::Event,
                    name: AttrName::Literal("input".to_string()),
                    value: AttrValue::Expr {
                        code: setter,
                        deps,
                    },
                    optional: false,
                    negated: false,
                    span: attr.span,
                });
            }
            _ => {
                return Err(CompileError::new(
                    ErrorCode::UnknownShorthand,
                    format!("unknown shorthand `*{sh}`"),
                    attr.span,
                ));
            }
        }
    }
    tag.attrs = kept;
    Ok(())
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
    use weft_scan::Scanner;

    /// Rewriter standing in for plain-code sub-scans: wraps the raw
    /// text and records a dependency for every `^name` it contains.
    fn rewrite_stub(raw: &str, _base: u32) -> Result<(String, DepSet), CompileError> {
        let mut deps = DepSet::new();
        let mut code = String::new();
        let mut rest = raw;
        while let Some(i) = rest.find('^') {
            code.push_str(&rest[..i]);
            rest = &rest[i + 1..];
            let end = rest
                .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
                .unwrap_or(rest.len());
            let name = &rest[..end];
            deps.push(name);
            code.push_str(&format!("wf.get(ctx, \"{name}\")"));
            rest = &rest[end..];
        }
        code.push_str(rest);
        Ok((code, deps))
    }

    fn parse(src: &str) -> Tag {
        // Callers position the scanner after `<`.
        let mut sc = Scanner::new(src);
        sc.advance(1);
        parse_tag(&mut sc, &mut rewrite_stub).expect("tag parses")
    }

    fn parse_err(src: &str) -> CompileError {
        let mut sc = Scanner::new(src);
        sc.advance(1);
        match parse_tag(&mut sc, &mut rewrite_stub) {
            Err(e) => e,
            Ok(t) => panic!("expected error, got {t:?}"),
        }
    }

    // === names and sigils ===

    #[test]
    fn plain_tag_with_classes() {
        let tag = parse("<div.card.wide>");
        assert_eq!(tag.sigil, TagSigil::None);
        assert_eq!(tag.name.literal(), Some("div"));
        assert_eq!(tag.classes.as_slice(), ["card", "wide"]);
        assert!(!tag.widget);
        assert!(!tag.self_closing);
    }

    #[test]
    fn capitalized_name_is_widget() {
        let tag = parse("<Dialog title=\"hi\"/>");
        assert!(tag.widget);
        assert!(tag.self_closing);
    }

    #[test]
    fn sigils_are_recognized() {
        assert_eq!(parse("<?div>").sigil, TagSigil::Optional);
        assert_eq!(parse("<#style>").sigil, TagSigil::ModeSwitch);
        assert_eq!(parse("<:slot name=\"body\">").sigil, TagSigil::Directive);
        assert_eq!(parse("<&anchor>").sigil, TagSigil::Reference);
    }

    #[test]
    fn computed_name_is_rewritten() {
        let tag = parse("<{^kind}>");
        assert_eq!(
            tag.name,
            TagName::Computed("wf.get(ctx, \"kind\")".to_string())
        );
        assert_eq!(tag.deps.first(), Some("kind"));
    }

    // === attributes ===

    #[test]
    fn attribute_classes_by_prefix() {
        let tag = parse("<div title=\"t\" @value={x} &color=\"red\" +click={go()} ~rest={r}>");
        let classes: Vec<AttrClass> = tag.attrs.iter().map(|a| a.class).collect();
        assert_eq!(
            classes,
            [
                AttrClass::Plain,
                AttrClass::Property,
                AttrClass::StyleDecl,
                AttrClass::Event,
                AttrClass::Spread,
            ]
        );
    }

    #[test]
    fn widget_args_single_and_double_dollar() {
        let tag = parse("<Pane $width={10} $$theme={t}>");
        assert_eq!(tag.attrs[0].class, AttrClass::WidgetArg);
        assert_eq!(tag.attrs[1].class, AttrClass::WidgetExtend);
    }

    #[test]
    fn flags_mark_optional_and_negated() {
        let tag = parse("<div ?active !hidden>");
        assert!(tag.attrs[0].optional);
        assert!(tag.attrs[1].negated);
    }

    #[test]
    fn group_name_shares_value() {
        let tag = parse("<div [width height]={size}>");
        assert_eq!(
            tag.attrs[0].name,
            AttrName::Group(vec!["width".to_string(), "height".to_string()])
        );
    }

    #[test]
    fn expression_value_deps_reach_the_tag() {
        let tag = parse("<div title={doc.^title}>");
        assert_eq!(tag.deps.first(), Some("title"));
    }

    #[test]
    fn computed_attr_name_deps_reach_the_tag() {
        let tag = parse("<div {^key}=\"v\">");
        assert_eq!(tag.deps.first(), Some("key"));
    }

    #[test]
    fn directive_expr_deps_reach_the_tag() {
        let tag = parse("<div :adopt={^node}>");
        assert_eq!(tag.deps.first(), Some("node"));
    }

    // === directives ===

    #[test]
    fn directives_leave_the_attr_list() {
        let tag = parse("<svg :ns=\"http://www.w3.org/2000/svg\" :debug x=\"1\">");
        assert_eq!(tag.attrs.len(), 1);
        assert_eq!(
            tag.directives.ns.as_deref(),
            Some("http://www.w3.org/2000/svg")
        );
        assert!(tag.directives.debug);
    }

    #[test]
    fn inherit_forms() {
        assert_eq!(
            parse("<div :inherit>").directives.inherit,
            Some(Inherit::Level(1))
        );
        assert_eq!(
            parse("<div :inherit=\"2\">").directives.inherit,
            Some(Inherit::Level(2))
        );
        assert_eq!(
            parse("<div :inherit=\"*\">").directives.inherit,
            Some(Inherit::All)
        );
        assert_eq!(
            parse("<div :inherit=\"color size\">").directives.inherit,
            Some(Inherit::Whitelist(vec![
                "color".to_string(),
                "size".to_string()
            ]))
        );
    }

    #[test]
    fn unknown_directive_is_fatal() {
        let err = parse_err("<div :frob>");
        assert_eq!(err.code(), ErrorCode::UnknownDirective);
    }

    #[test]
    fn ns_without_value_is_fatal() {
        let err = parse_err("<svg :ns>");
        assert_eq!(err.code(), ErrorCode::MissingAttributeValue);
    }

    // === shorthands ===

    #[test]
    fn show_becomes_visibility() {
        let tag = parse("<div *show={^open}>");
        assert!(tag.attrs.is_empty());
        assert!(matches!(tag.visibility, Some(AttrValue::Expr { .. })));
    }

    #[test]
    fn model_expands_to_value_and_input() {
        let tag = parse("<input *model={doc.^title}>");
        assert_eq!(tag.attrs.len(), 2);
        assert_eq!(tag.attrs[0].class, AttrClass::Property);
        assert_eq!(tag.attrs[0].name, AttrName::Literal("value".to_string()));
        assert_eq!(tag.attrs[1].class, AttrClass::Event);
        match &tag.attrs[1].value {
            AttrValue::Expr { code, .. } => {
                assert_eq!(code, "wf.set(ctx, \"title\", $args)");
            }
            other => panic!("unexpected value {other:?}"),
        }
        assert!(tag.writes_state);
    }

    #[test]
    fn unknown_shorthand_is_fatal() {
        let err = parse_err("<div *blink={x}>");
        assert_eq!(err.code(), ErrorCode::UnknownShorthand);
    }

    // === errors ===

    #[test]
    fn unterminated_tag_points_at_the_open_angle() {
        let err = parse_err("<div title=\"t\" ");
        assert_eq!(err.code(), ErrorCode::UnterminatedTag);
        assert_eq!(err.span(), Span::new(0, 1));
    }

    #[test]
    fn value_must_be_string_or_expr() {
        let err = parse_err("<div title=bare>");
        assert_eq!(err.code(), ErrorCode::MalformedAttribute);
    }
}
