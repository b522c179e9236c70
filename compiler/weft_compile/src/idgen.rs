//! Unique identifier generation.
//!
//! Counters are an explicit value owned by the caller and passed into
//! each compile call, never ambient process state. Each namespace seeds
//! a short hashed prefix so identifiers from different namespaces cannot
//! collide in shared output, and `reset` is an explicit method.

use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};

/// Per-namespace monotonic counters for generated identifiers.
#[derive(Clone, Debug)]
pub struct IdGen {
    namespace: String,
    short: String,
    counters: FxHashMap<&'static str, u32>,
}

impl IdGen {
    /// Create a generator seeded by `namespace`.
    pub fn new(namespace: &str) -> Self {
        IdGen {
            namespace: namespace.to_string(),
            short: short_hash(namespace),
            counters: FxHashMap::default(),
        }
    }

    /// The namespace string this generator was seeded with.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The hashed short prefix derived from the namespace.
    pub fn short(&self) -> &str {
        &self.short
    }

    /// Next counter value for `kind` (1-based).
    pub fn next(&mut self, kind: &'static str) -> u32 {
        let c = self.counters.entry(kind).or_insert(0);
        *c += 1;
        *c
    }

    /// Explicitly reset the counter for `kind`.
    pub fn reset(&mut self, kind: &'static str) {
        self.counters.remove(kind);
    }

    /// Reset every counter in this namespace.
    pub fn reset_all(&mut self) {
        self.counters.clear();
    }

    /// A stable element identity key, e.g. `q3ze1`.
    pub fn element_id(&mut self) -> String {
        let n = self.next("e");
        format!("{}e{n}", self.short)
    }

    /// A generated local variable for an element node, e.g. `_n2`.
    pub fn node_var(&mut self) -> String {
        let n = self.next("n");
        format!("_n{n}")
    }
}

/// Three base-36 digits of the namespace hash.
fn short_hash(namespace: &str) -> String {
    let mut h = FxHasher::default();
    namespace.hash(&mut h);
    let mut v = h.finish();
    let mut out = String::with_capacity(3);
    for _ in 0..3 {
        let d = (v % 36) as u32;
        v /= 36;
        let c = char::from_digit(d, 36).unwrap_or('0');
        out.push(c);
    }
    out
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
mod tests {
    use super::IdGen;
    use pretty_assertions::assert_eq;

    #[test]
    fn counters_are_monotonic_per_kind() {
        let mut ids = IdGen::new("app");
        assert_eq!(ids.next("e"), 1);
        assert_eq!(ids.next("e"), 2);
        assert_eq!(ids.next("n"), 1);
        assert_eq!(ids.next("e"), 3);
    }

    #[test]
    fn reset_is_explicit_and_per_kind() {
        let mut ids = IdGen::new("app");
        ids.next("e");
        ids.next("n");
        ids.reset("e");
        assert_eq!(ids.next("e"), 1);
        assert_eq!(ids.next("n"), 2);
    }

    #[test]
    fn same_namespace_yields_same_ids() {
        let mut a = IdGen::new("shop");
        let mut b = IdGen::new("shop");
        assert_eq!(a.element_id(), b.element_id());
    }

    #[test]
    fn different_namespaces_get_different_prefixes() {
        let a = IdGen::new("shop");
        let b = IdGen::new("admin");
        assert_ne!(a.short(), b.short());
    }

    #[test]
    fn element_ids_embed_the_prefix() {
        let mut ids = IdGen::new("x");
        let id = ids.element_id();
        assert!(id.starts_with(ids.short()));
        assert!(id.ends_with("e1"));
    }
}
