//! Style mode: declarative CSS blocks.
//!
//! The body of a `<#style>` region is a nested rule tree. Nesting
//! flattens into plain CSS: a child selector is joined to its parent
//! with a space, or spliced at `&`. Strings and comments are opaque to
//! the structural scan, so `{`/`}`/`;` inside them never split rules.

use weft_scan::{Scanner, SkipPolicy};

use crate::error::CompileError;

#[derive(Debug)]
struct Rule {
    selector: String,
    decls: Vec<String>,
}

/// Flatten a nested style region into plain CSS text.
pub(crate) fn flatten_css(raw: &str, base: u32) -> Result<String, CompileError> {
    let mut sc = Scanner::nested(raw, base);
    let mut rules: Vec<Rule> = Vec::new();
    // Declarations before any selector apply to the document root.
    parse_block(&mut sc, ":root", &mut rules, true)?;

    let mut out = String::new();
    for rule in rules.iter().filter(|r| !r.decls.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&rule.selector);
        out.push_str(" { ");
        out.push_str(&rule.decls.join("; "));
        out.push_str(" }");
    }
    Ok(out)
}

fn parse_block(
    sc: &mut Scanner<'_>,
    selector: &str,
    rules: &mut Vec<Rule>,
    top: bool,
) -> Result<(), CompileError> {
    let idx = rules.len();
    rules.push(Rule {
        selector: selector.to_string(),
        decls: Vec::new(),
    });

    loop {
        // No regex skipping: CSS slash is always division-like text.
        let found = sc.find(
            &[b'{', b'}', b';'],
            false,
            SkipPolicy::COMMENTS | SkipPolicy::STRINGS,
        )?;
        let Some(found) = found else {
            let last = sc.rest().trim().to_string();
            sc.advance(sc.rest().len());
            if !last.is_empty() {
                rules[idx].decls.push(last);
            }
            return Ok(());
        };
        match found.stop {
            b';' => {
                let decl = found.prefix.trim();
                if !decl.is_empty() {
                    rules[idx].decls.push(decl.to_string());
                }
                sc.advance(1);
            }
            b'{' => {
                let child = found.prefix.trim();
                let joined = join_selectors(selector, child, top);
                sc.advance(1);
                parse_block(sc, &joined, rules, false)?;
            }
            _ => {
                let decl = found.prefix.trim();
                if !decl.is_empty() {
                    rules[idx].decls.push(decl.to_string());
                }
                sc.advance(1);
                return Ok(());
            }
        }
    }
}

fn join_selectors(parent: &str, child: &str, top: bool) -> String {
    if child.contains('&') {
        child.replace('&', parent)
    } else if top {
        child.to_string()
    } else {
        format!("{parent} {child}")
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
mod tests {
    use super::flatten_css;
    use pretty_assertions::assert_eq;

    fn flat(src: &str) -> String {
        flatten_css(src, 0).expect("style region flattens")
    }

    #[test]
    fn single_rule_passes_through() {
        assert_eq!(flat(".card { color: red }"), ".card { color: red }");
    }

    #[test]
    fn nested_rule_joins_with_space() {
        assert_eq!(
            flat(".card { color: red; .title { font-weight: bold } }"),
            ".card { color: red } .card .title { font-weight: bold }"
        );
    }

    #[test]
    fn ampersand_splices_the_parent() {
        assert_eq!(
            flat(".card { &:hover { color: blue } }"),
            ".card:hover { color: blue }"
        );
    }

    #[test]
    fn braces_inside_strings_are_opaque() {
        assert_eq!(
            flat(".x { content: \"{\" }"),
            ".x { content: \"{\" }"
        );
    }

    #[test]
    fn root_declarations_get_a_root_selector() {
        assert_eq!(
            flat("--gap: 4px; .a { top: 0 }"),
            ":root { --gap: 4px } .a { top: 0 }"
        );
    }
}
