//! Reactive dependency collection.
//!
//! Sigil-marked references accumulate here as expressions are rewritten.
//! Definite and maybe reads both record their dotted path; the access
//! class lives in the emitted accessor call, not in the collected list.
//! Order of first appearance is observable in generated arrays and must
//! stay stable; duplicates are kept in the raw list (callers can merge
//! sets repeatedly without tracking seen-ness) and dropped only when the
//! array is printed.

use crate::js::js_string;

/// Ordered multiset of dependency paths for one expression or statement.
#[derive(Clone, Default, Debug)]
pub(crate) struct DepSet {
    paths: Vec<String>,
}

impl DepSet {
    pub fn new() -> Self {
        DepSet { paths: Vec::new() }
    }

    pub fn push(&mut self, path: impl Into<String>) {
        self.paths.push(path.into());
    }

    /// Append everything from `other`, preserving its order. Duplicates
    /// are intentionally kept.
    pub fn merge(&mut self, other: &DepSet) {
        self.paths.extend(other.paths.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// First collected dependency path, if any.
    pub fn first(&self) -> Option<&str> {
        self.paths.first().map(String::as_str)
    }

    #[cfg(test)]
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Render as a JS array literal, deduplicated by path with first
    /// occurrence winning. Merging the same set twice therefore prints
    /// the same array as merging it once.
    pub fn emit_array(&self) -> String {
        let mut out = String::from("[");
        let mut seen: Vec<&str> = Vec::new();
        for path in &self.paths {
            if seen.contains(&path.as_str()) {
                continue;
            }
            seen.push(path);
            if seen.len() > 1 {
                out.push_str(", ");
            }
            out.push_str(&js_string(path));
        }
        out.push(']');
        out
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
mod tests {
    use super::DepSet;
    use pretty_assertions::assert_eq;

    #[test]
    fn array_preserves_first_seen_order() {
        let mut d = DepSet::new();
        d.push("b");
        d.push("a");
        d.push("b");
        assert_eq!(d.emit_array(), r#"["b", "a"]"#);
    }

    #[test]
    fn merge_is_idempotent_in_output() {
        let mut d = DepSet::new();
        d.push("x");
        let mut whole = DepSet::new();
        whole.merge(&d);
        whole.merge(&d);
        assert_eq!(whole.len(), 2);
        assert_eq!(whole.emit_array(), r#"["x"]"#);
    }

    #[test]
    fn first_returns_earliest_path() {
        let mut d = DepSet::new();
        d.push("items");
        d.push("filter");
        assert_eq!(d.first(), Some("items"));
    }

    #[test]
    fn empty_set_prints_empty_array() {
        assert_eq!(DepSet::new().emit_array(), "[]");
    }
}
