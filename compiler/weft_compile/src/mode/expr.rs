//! Plain-code expression rewriting.
//!
//! Rewrites reactive access sigils inside a host-language expression
//! and collects the referenced paths. The input is a raw slice of the
//! template; `base` is its absolute offset so error spans land on the
//! original text. Strings, comments, and regex literals are opaque: a
//! `^` inside them is never a sigil.

use weft_scan::{Scanner, SkipPolicy};

use crate::deps::DepSet;
use crate::error::CompileError;
use crate::js::js_string;

#[derive(Debug)]
pub(crate) struct Rewritten {
    pub code: String,
    pub deps: DepSet,
}

#[inline]
fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Rewrite every sigil in `raw`.
pub(crate) fn rewrite_expr(raw: &str, base: u32) -> Result<Rewritten, CompileError> {
    let mut sc = Scanner::nested(raw, base);
    let mut out = String::new();
    let mut deps = DepSet::new();

    loop {
        let Some(found) = sc.find(&[b'^'], false, SkipPolicy::CODE)? else {
            out.push_str(sc.rest());
            break;
        };
        out.push_str(found.prefix);
        sc.advance(1);

        if sc.current() == b'(' {
            // Computed reference: the expression text itself is the
            // dependency key.
            let inner_base = sc.abs() + 1;
            let inner_raw = sc.skip_enclosed(true)?;
            let inner = rewrite_expr(inner_raw, inner_base)?;
            deps.merge(&inner.deps);
            deps.push(inner_raw.trim());
            out.push_str(&format!("wf.get(ctx, ({}))", inner.code));
            continue;
        }

        let name = sc.read_name(&[]);
        if name.is_empty() {
            // Not a sigil (e.g. the xor operator); keep the byte.
            out.push('^');
            continue;
        }

        // `a.b.^c`: the dotted prefix was already emitted as plain
        // text; pull it back and fold it into the reference path.
        let prefix = take_dotted_prefix(&mut out);
        let maybe = sc.current() == b'?';
        if maybe {
            sc.advance(1);
        }
        let path = format!("{prefix}{name}");
        let call = if maybe { "wf.maybe" } else { "wf.get" };
        out.push_str(&format!("{call}(ctx, {})", js_string(&path)));
        deps.push(path);
    }

    Ok(Rewritten { code: out, deps })
}

/// Remove a trailing `ident.(ident.)*` run from `out` and return it.
fn take_dotted_prefix(out: &mut String) -> String {
    let b = out.as_bytes();
    let mut i = out.len();
    while i > 0 && b[i - 1] == b'.' {
        let dot = i - 1;
        let mut k = dot;
        while k > 0 && is_ident(b[k - 1]) {
            k -= 1;
        }
        if k == dot {
            // A bare dot with no identifier before it stays put.
            break;
        }
        i = k;
    }
    let prefix = out[i..].to_string();
    out.truncate(i);
    prefix
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
mod tests {
    use super::rewrite_expr;
    use pretty_assertions::assert_eq;

    fn rewrite(raw: &str) -> (String, Vec<String>) {
        let r = rewrite_expr(raw, 0).expect("expression rewrites");
        (r.code, r.deps.paths().to_vec())
    }

    // === sigil forms ===

    #[test]
    fn definite_read() {
        let (code, deps) = rewrite("^count > 3");
        assert_eq!(code, "wf.get(ctx, \"count\") > 3");
        assert_eq!(deps, ["count"]);
    }

    #[test]
    fn maybe_read() {
        let (code, deps) = rewrite("^title? || \"untitled\"");
        assert_eq!(code, "wf.maybe(ctx, \"title\") || \"untitled\"");
        assert_eq!(deps, ["title"]);
    }

    #[test]
    fn computed_reference() {
        let (code, deps) = rewrite("^(key + 1)");
        assert_eq!(code, "wf.get(ctx, (key + 1))");
        assert_eq!(deps, ["key + 1"]);
    }

    #[test]
    fn computed_reference_can_nest_sigils() {
        let (code, deps) = rewrite("^(prefix + ^part)");
        assert_eq!(code, "wf.get(ctx, (prefix + wf.get(ctx, \"part\")))");
        assert_eq!(deps, ["part", "prefix + ^part"]);
    }

    // === backward dotted-path recovery ===

    #[test]
    fn dotted_prefix_is_recovered() {
        let (code, deps) = rewrite("user.profile.^name");
        assert_eq!(code, "wf.get(ctx, \"user.profile.name\")");
        assert_eq!(deps, ["user.profile.name"]);
    }

    #[test]
    fn recovery_stops_at_non_path_text() {
        let (code, deps) = rewrite("fn(a) + doc.^title");
        assert_eq!(code, "fn(a) + wf.get(ctx, \"doc.title\")");
        assert_eq!(deps, ["doc.title"]);
    }

    // === opacity and non-sigils ===

    #[test]
    fn caret_inside_string_is_literal() {
        let (code, deps) = rewrite("\"a ^not\" + ^real");
        assert_eq!(code, "\"a ^not\" + wf.get(ctx, \"real\")");
        assert_eq!(deps, ["real"]);
    }

    #[test]
    fn xor_operator_survives() {
        let (code, deps) = rewrite("a ^ 2");
        assert_eq!(code, "a ^ 2");
        assert!(deps.is_empty());
    }

    #[test]
    fn duplicate_reads_collect_once_in_output_array() {
        let r = rewrite_expr("^n + ^n", 0).expect("rewrites");
        assert_eq!(r.deps.len(), 2);
        assert_eq!(r.deps.emit_array(), "[\"n\"]");
    }
}
