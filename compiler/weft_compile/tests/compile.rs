//! End-to-end compiles over the public API.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]

use pretty_assertions::assert_eq;
use weft_compile::{
    CompileError, Dialect, Engine, ErrorCode, FeatureSet, IdGen, ModuleKind, Options, Output,
};

fn compile(src: &str) -> Output {
    compile_with(src, Options::default())
}

fn compile_with(src: &str, options: Options) -> Output {
    let engine = Engine::new(options);
    let mut ids = IdGen::new("t");
    engine.compile(src, &mut ids).expect("template compiles")
}

fn compile_err(src: &str) -> CompileError {
    let engine = Engine::new(Options::default());
    let mut ids = IdGen::new("t");
    match engine.compile(src, &mut ids) {
        Err(e) => e,
        Ok(out) => panic!("expected error, got:\n{}", out.code),
    }
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

// === elements and text ===

#[test]
fn static_element_with_text() {
    let out = compile("<div> hello </div>");
    assert!(out.code.contains("wf.el(ctx, \"div\", "));
    assert!(out.code.contains(".txt(\" hello \")"));
    assert!(out.features.contains(FeatureSet::EL | FeatureSet::CHAIN));
    assert!(out.warnings.is_empty());
}

// Same body under a different tag name must produce a different
// create call.
#[test]
fn element_call_carries_the_tag_name() {
    let div = compile("<div> x </div>");
    let span = compile("<span> x </span>");
    assert_ne!(div.code, span.code);
    assert!(span.code.contains("wf.el(ctx, \"span\", "));
}

#[test]
fn computed_tag_name_is_emitted_with_its_deps() {
    let out = compile("<{^kind}> x </>");
    assert!(out.code.contains("wf.el(ctx, (wf.get(ctx, \"kind\")), "));
    assert!(out.features.contains(FeatureSet::GET));
}

#[test]
fn element_ids_carry_the_namespace_hash() {
    let out = compile("<div></div><span></span>");
    let short = IdGen::new("t").short().to_string();
    assert!(out.code.contains(&format!("\"{short}e1\"")));
    assert!(out.code.contains(&format!("\"{short}e2\"")));
}

#[test]
fn interpolation_becomes_a_reactive_text_op() {
    let out = compile("<p> {greeting} and {user.^name} </p>");
    assert!(out.code.contains(".exp(() => (greeting), [])"));
    assert!(out
        .code
        .contains(".exp(() => (wf.get(ctx, \"user.name\")), [\"user.name\"])"));
    assert!(out.features.contains(FeatureSet::GET));
}

#[test]
fn consecutive_ops_share_one_chain() {
    let out = compile("<p> a {x} b </p>");
    assert_eq!(count(&out.code, "wf.at("), 1);
    assert!(out.code.contains(".txt(\" a \").exp("));
}

#[test]
fn indentation_between_tags_produces_no_text_op() {
    let out = compile("<div>\n    <span> x </span>\n</div>");
    assert_eq!(count(&out.code, ".txt("), 1);
}

#[test]
fn optional_update_tag_gets_a_query_descriptor() {
    let out = compile("<?div> x </div>");
    let short = IdGen::new("t").short().to_string();
    assert!(out.code.contains(&format!("\"?{short}e1\"")));
}

#[test]
fn reference_tag_requeries_by_name() {
    let out = compile("<&anchor/>");
    assert!(out.code.contains("wf.el(ctx, \"anchor\", \"&anchor\");"));
}

#[test]
fn void_elements_take_no_body() {
    let out = compile("<br>");
    assert!(out.code.contains("wf.el(ctx, \"br\", "));
    assert!(!out.code.contains("=> {})"));
}

#[test]
fn adopt_directive_lands_in_the_options() {
    let out = compile("<div :adopt={existingNode}></div>");
    let short = IdGen::new("t").short().to_string();
    assert!(out.code.contains(&format!("\"+{short}e1\"")));
    assert!(out.code.contains("(existingNode)"));
}

// === attributes and options ===

#[test]
fn attribute_classes_render_with_prefixed_keys() {
    let out = compile("<div title=\"t\" @value={v} +click={go()}></div>");
    assert!(out.code.contains("title: \"t\""));
    assert!(out.code.contains("\"@value\": (v)"));
    assert!(out.code.contains("\"+click\": ($args) => { go(); }"));
}

#[test]
fn reactive_attribute_value_becomes_a_pair() {
    let out = compile("<div title={doc.^title}></div>");
    assert!(out
        .code
        .contains("title: [() => (wf.get(ctx, \"doc.title\")), [\"doc.title\"]]"));
}

#[test]
fn class_shorthand_lands_in_attrs() {
    let out = compile("<div.card.wide></div>");
    assert!(out.code.contains("class: \"card wide\""));
}

#[test]
fn trailing_empty_option_slots_are_trimmed() {
    let out = compile("<div title=\"t\"></div>");
    assert!(out.code.contains("[{ title: \"t\" }], "));
    assert!(!out.code.contains("}, 0]"));
}

#[test]
fn interior_empty_option_slots_are_zero() {
    // Spread with no plain attrs leaves slot 2 filled and 1 empty.
    let out = compile("<div ~rest={extras}></div>");
    assert!(out.code.contains("[0, 0, [(extras)]]"));
}

// Two attributes can share one computed-name expression; each keeps
// its own entry. Option entries are never de-duplicated.
#[test]
fn computed_name_attributes_stay_independent() {
    let out = compile("<div {key}={a} {key}={b}></div>");
    assert!(out.code.contains("[[(key)], (a)]"));
    assert!(out.code.contains("[[(key)], (b)]"));
    assert_eq!(count(&out.code, "[[(key)]"), 2);
}

#[test]
fn model_shorthand_expands_to_value_and_input() {
    let out = compile("<input *model={doc.^title}>");
    assert!(out.code.contains("\"@value\": [() => (wf.get(ctx, \"doc.title\")), [\"doc.title\"]]"));
    assert!(out
        .code
        .contains("\"+input\": ($args) => { wf.set(ctx, \"doc.title\", $args); }"));
    assert!(out.features.contains(FeatureSet::SET));
    assert!(out.features.entry_points().contains(&"set"));
}

#[test]
fn slot_directive_registers_on_the_chain() {
    let out = compile("<div> <:slot name=\"body\"> </div>");
    assert!(out.code.contains(".reg(\"body\")"));
}

// `:slot` on the element itself registers its node, even without a
// body.
#[test]
fn slot_attribute_registers_the_element() {
    let out = compile("<aside :slot=\"side\"/>");
    assert!(out.code.contains(".reg(\"side\")"));
}

#[test]
fn computed_attr_name_deps_mark_the_read_feature() {
    let out = compile("<div {^key}={v}></div>");
    assert!(out.code.contains("[[(wf.get(ctx, \"key\"))], (v)]"));
    assert!(out.features.contains(FeatureSet::GET));
}

#[test]
fn widget_tags_use_the_widget_call() {
    let out = compile("<Dialog $width={10} title=\"hi\"/>");
    assert!(out.code.contains("wf.widget(ctx, \"Dialog\""));
    assert!(out.code.contains("width: (10)"));
    assert!(out.features.contains(FeatureSet::WIDGET));
}

// === statements ===

#[test]
fn plain_declaration_passes_through() {
    let out = compile("let greeting = \"hi\"\n<p> {greeting} </p>");
    assert!(out.code.contains("let greeting = \"hi\";"));
}

#[test]
fn reactive_declaration_is_watch_wrapped() {
    let out = compile("let label = ^title\n");
    assert!(out
        .code
        .contains("let label; wf.watch(ctx, [\"title\"], () => { label = wf.get(ctx, \"title\"); });"));
    assert!(out.features.contains(FeatureSet::WATCH));
}

// Scenario: a conditional wrapping a tag, condition reading exactly one
// reactive value, becomes one rebuild call with one pair.
#[test]
fn reactive_conditional_becomes_cond() {
    let out = compile("if (^ready) {\n<div> ok </div>\n}");
    assert!(out
        .code
        .contains("wf.cond(ctx, [[() => (wf.get(ctx, \"ready\")), [\"ready\"]]], [() => {"));
    assert_eq!(count(&out.code, "() => (wf.get"), 1);
    assert!(out.code.contains("}]);"));
    assert!(out.features.contains(FeatureSet::COND));
}

#[test]
fn else_chain_renders_every_clause() {
    let out = compile("if (^n > 3) {\n<b> lots </b>\n} else {\n<i> few </i>\n}");
    assert!(out.code.contains("[null, []]"));
    assert_eq!(count(&out.code, "() => {"), 2);
}

#[test]
fn non_reactive_conditional_stays_plain() {
    let out = compile("if (debug) {\n<div> d </div>\n}");
    assert!(out.code.contains("if (debug) {"));
    assert!(!out.code.contains("wf.cond"));
}

// Scenario: reactive array iteration uses the array helper, not the
// range helper.
#[test]
fn reactive_foreach_uses_the_array_helper() {
    let out = compile("foreach (^items as item) {\n<li> {item} </li>\n}");
    assert!(out
        .code
        .contains("wf.eachA(ctx, \"items\", () => (wf.get(ctx, \"items\")), (item) => {"));
    assert!(!out.code.contains("wf.eachR"));
    assert!(!out.code.contains("wf.eachO"));
    assert!(out.features.contains(FeatureSet::EACH));
}

#[test]
fn object_foreach_uses_the_object_helper() {
    let out = compile("foreach (^fields as key : value) {\n<li> {key} </li>\n}");
    assert!(out.code.contains("wf.eachO(ctx, \"fields\""));
    assert!(out.code.contains("(key, value) => {"));
}

#[test]
fn plain_range_foreach_is_an_ordinary_loop() {
    let out = compile("foreach (from 1 to 5 as i) {\n<li> {i} </li>\n}");
    assert!(out.code.contains("for (let i = (1); i <= (5); i++) {"));
}

#[test]
fn implicit_body_closes_at_the_newline() {
    let out = compile("if (debug) <b> on </b>\n<p> after </p>");
    let if_at = out.code.find("if (debug) {").expect("if present");
    let close = out.code[if_at..].find('}').expect("closed") + if_at;
    let after = out.code.find("after").expect("tail present");
    assert!(close < after, "implicit body must close before the next line");
}

#[test]
fn reactive_while_is_watch_wrapped() {
    let out = compile("while (^busy) {\n<p> w </p>\n}");
    assert!(out.code.contains("wf.watch(ctx, [\"busy\"], () => { while (wf.get(ctx, \"busy\")) {"));
    assert!(out.code.contains("} });"));
}

#[test]
fn stray_close_brace_is_literal_text() {
    let out = compile("<p> a } b </p>");
    assert!(out.code.contains(".txt(\" a } b \")"));
}

// === dependency lists ===

#[test]
fn duplicate_reads_emit_one_array_entry() {
    let out = compile("if (^n > 0 && ^n < 9) {\n<b> x </b>\n}");
    assert!(out.code.contains("[\"n\"]"));
    assert!(!out.code.contains("\"n\", \"n\""));
}

#[test]
fn dependency_order_is_first_appearance() {
    let out = compile("if (^b + ^a > 0) {\n<b> x </b>\n}");
    assert!(out.code.contains("[\"b\", \"a\"]"));
}

// === modes ===

#[test]
fn style_region_flattens_and_emits_one_call() {
    let out = compile("<#style>\n.card { color: red; &:hover { color: blue } }\n</#style>");
    assert!(out
        .code
        .contains("wf.style(\".card { color: red } .card:hover { color: blue }\");"));
    assert!(out.features.contains(FeatureSet::STYLE));
}

#[test]
fn code_region_passes_through_with_sigil_rewrite() {
    let out = compile("<#code>\nconst total = ^count * 2;\n</#code>");
    assert!(out.code.contains("const total = wf.get(ctx, \"count\") * 2;"));
}

#[test]
fn script_mode_is_a_deprecated_alias() {
    let out = compile("<#script>\nlet x = 1;\n</#script>");
    assert!(out.code.contains("let x = 1;"));
    assert_eq!(out.warnings.len(), 1);
    assert_eq!(out.warnings[0].code, ErrorCode::DeprecatedSyntax);
}

// `:mode` selects the body grammar of an ordinary element.
#[test]
fn mode_directive_routes_the_tag_body() {
    let out = compile("<div :mode=\"text\"> <b> t </b> </div>");
    assert_eq!(count(&out.code, "wf.el("), 1);
    assert!(out.code.contains(".txt(\" <b> t </b> \")"));
}

#[test]
fn mode_directive_style_body_flattens() {
    let out = compile("<div :mode=\"style\">.x { color: red }</div>");
    assert!(out.code.contains("wf.style(\".x { color: red }\");"));
}

#[test]
fn unknown_mode_directive_is_fatal() {
    let err = compile_err("<div :mode=\"markdown\"> x </div>");
    assert_eq!(err.code(), ErrorCode::UnknownMode);
}

#[test]
fn text_region_keeps_tags_literal() {
    let out = compile("<#text>\n<div> is text, {name} is not\n</#text>");
    assert!(out.code.contains("<div> is text,"));
    assert!(out.code.contains(".exp(() => (name), [])"));
    assert!(!out.code.contains("wf.el"));
}

// === region closing ===

#[test]
fn mismatched_close_warns_and_closes_once() {
    let out = compile("<div> x </span>");
    assert_eq!(out.warnings.len(), 1);
    assert_eq!(out.warnings[0].code, ErrorCode::ClosingTagMismatch);
    assert_eq!(count(&out.code, "}); "), 1);
}

#[test]
fn stray_close_at_root_warns_and_continues() {
    let out = compile("</div>\n<p> x </p>");
    assert_eq!(out.warnings.len(), 1);
    assert!(out.code.contains(".txt(\" x \")"));
}

// === fatal errors ===

// Scenario: an unterminated attribute string reports the opening
// quote, not end-of-input.
#[test]
fn unterminated_attr_string_points_at_the_open_quote() {
    let src = "<div title=\"oops>";
    let err = compile_err(src);
    assert_eq!(err.code(), ErrorCode::UnterminatedString);
    assert_eq!(err.span().start, src.find('"').expect("quote") as u32);
}

#[test]
fn unclosed_tag_points_at_its_opening() {
    let err = compile_err("<div>\n<span> dangling\n");
    assert_eq!(err.code(), ErrorCode::UnclosedTag);
    assert_eq!(err.span().start, 6);
}

#[test]
fn statement_must_close_inside_its_region() {
    let err = compile_err("<div> if (x) { </div>");
    assert_eq!(err.code(), ErrorCode::UnclosedStatement);
}

#[test]
fn unknown_mode_is_fatal() {
    let err = compile_err("<#markdown> x </#markdown>");
    assert_eq!(err.code(), ErrorCode::UnknownMode);
}

#[test]
fn unknown_entry_mode_is_fatal() {
    let engine = Engine::new(Options {
        entry_mode: "markdown".to_string(),
        ..Options::default()
    });
    let mut ids = IdGen::new("t");
    let err = engine.compile("x", &mut ids).expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::UnknownMode);
}

// === dialects and wrapping ===

#[test]
fn es5_uses_function_closures() {
    let out = compile_with(
        "if (^ready) {\n<div> ok </div>\n}",
        Options {
            dialect: Dialect::Es5,
            ..Options::default()
        },
    );
    assert!(out.code.contains("function () { return (wf.get(ctx, \"ready\")); }"));
    assert!(out.code.starts_with("function (ctx, _n1) {"));
    assert!(!out.code.contains("=>"));
}

#[test]
fn es5_downgrades_plain_let_declarations() {
    let out = compile_with(
        "let greeting = \"hi\"\n<p> {greeting} </p>",
        Options {
            dialect: Dialect::Es5,
            ..Options::default()
        },
    );
    assert!(out.code.contains("var greeting = \"hi\";"));
    assert!(!out.code.contains("let "));
}

#[test]
fn es5_code_regions_capture_arguments() {
    let out = compile_with(
        "<#code>\nfunction render(item) { use(item); }\n</#code>",
        Options {
            dialect: Dialect::Es5,
            ..Options::default()
        },
    );
    assert!(out
        .code
        .contains("function render(item) { var $args = arguments; use(item); }"));
}

#[test]
fn es6_code_regions_leave_function_bodies_alone() {
    let out = compile("<#code>\nfunction render(item) { use(item); }\n</#code>");
    assert!(out.code.contains("function render(item) { use(item); }"));
}

#[test]
fn module_wrappers() {
    let cjs = compile_with(
        "<p> x </p>",
        Options {
            module: ModuleKind::CommonJs,
            ..Options::default()
        },
    );
    assert!(cjs.code.starts_with("module.exports = "));

    let esm = compile_with(
        "<p> x </p>",
        Options {
            module: ModuleKind::Esm,
            ..Options::default()
        },
    );
    assert!(esm.code.starts_with("export default "));

    let iife = compile_with(
        "<p> x </p>",
        Options {
            module: ModuleKind::Iife,
            namespace: "app".to_string(),
            ..Options::default()
        },
    );
    assert!(iife.code.contains("global.app = "));
}

#[test]
fn prepend_append_and_version_check() {
    let out = compile_with(
        "<p> x </p>",
        Options {
            prepend: "// banner".to_string(),
            append: "// done".to_string(),
            version_check: true,
            ..Options::default()
        },
    );
    assert!(out.code.starts_with("// banner\n"));
    assert!(out.code.ends_with("// done"));
    assert!(out.code.contains("wf.check(\"1\");"));
    assert!(out.features.contains(FeatureSet::CHECK));
    assert!(out.features.entry_points().contains(&"check"));
}

#[test]
fn attr_overrides_rename_keys() {
    let mut options = Options::default();
    options
        .attr_overrides
        .insert("class".to_string(), "className".to_string());
    let out = compile_with("<div class=\"x\"></div>", options);
    assert!(out.code.contains("className: \"x\""));
}

// === id generation across calls ===

#[test]
fn caller_owned_ids_continue_and_reset_explicitly() {
    let engine = Engine::new(Options::default());
    let mut ids = IdGen::new("t");
    let short = ids.short().to_string();

    let first = engine.compile("<div></div>", &mut ids).expect("compiles");
    let second = engine.compile("<div></div>", &mut ids).expect("compiles");
    assert!(first.code.contains(&format!("\"{short}e1\"")));
    assert!(second.code.contains(&format!("\"{short}e2\"")));

    ids.reset_all();
    let third = engine.compile("<div></div>", &mut ids).expect("compiles");
    assert!(third.code.contains(&format!("\"{short}e1\"")));
}
